//! Daily price and volume history for a single ticker.

use crate::{error::Error, heatmap::drawing_error, source::PageSource, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use derive_deref::Deref;
use plotters::prelude::*;
use polars::prelude::*;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_TICKER: &str = "GOOGL";

#[derive(Debug, Clone)]
pub struct StockQuery {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub base_url: String,
}

impl StockQuery {
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.to_string(),
            start,
            end,
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn url(&self) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url.trim_end_matches('/'),
            self.ticker,
            unix_midnight(self.start),
            unix_midnight(self.end),
        )
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Columns: `Date`, `Open`, `High`, `Low`, `Close`, `Volume`.
#[derive(Clone, Debug, Deref)]
pub struct PriceHistory(DataFrame);

impl PriceHistory {
    /// Parses a chart API payload. Bars with any missing field are dropped.
    pub fn parse(ticker: &str, body: &str) -> Result<Self> {
        let resp: ChartResponse = serde_json::from_str(body)?;
        let payload_error = |message: String| Error::ChartPayload {
            ticker: ticker.to_string(),
            message,
        };

        if let Some(err) = resp.chart.error {
            return Err(payload_error(format!("{}: {}", err.code, err.description)));
        }
        let result = resp
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| payload_error("empty result".to_string()))?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let mut dates = Vec::new();
        let (mut open, mut high, mut low, mut close, mut volume) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let bar = (|| {
                Some((
                    DateTime::from_timestamp(*ts, 0)?.date_naive(),
                    (*quote.open.get(i)?)?,
                    (*quote.high.get(i)?)?,
                    (*quote.low.get(i)?)?,
                    (*quote.close.get(i)?)?,
                    (*quote.volume.get(i)?)?,
                ))
            })();
            let Some((date, o, h, l, c, v)) = bar else {
                continue;
            };
            dates.push(date.format("%Y-%m-%d").to_string());
            open.push(o);
            high.push(h);
            low.push(l);
            close.push(c);
            volume.push(v.round() as i64);
        }
        log::debug!("{} daily bars for {}", dates.len(), ticker);

        let df = DataFrame::new(vec![
            Series::new("Date", dates),
            Series::new("Open", open),
            Series::new("High", high),
            Series::new("Low", low),
            Series::new("Close", close),
            Series::new("Volume", volume),
        ])?;
        Ok(PriceHistory(df))
    }

    pub fn dates(&self) -> Result<Vec<String>> {
        Ok(self
            .column("Date")?
            .str()?
            .into_iter()
            .map(|d| d.unwrap_or_default().to_string())
            .collect())
    }

    /// One column as floats, nulls skipped.
    pub fn values(&self, column: &str) -> Result<Vec<f64>> {
        let series = self.column(column)?.cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().flatten().collect())
    }
}

pub fn fetch_history(pages: &dyn PageSource, query: &StockQuery) -> Result<PriceHistory> {
    log::trace!("stock::fetch_history");
    let body = pages.fetch(&query.url())?;
    PriceHistory::parse(&query.ticker, &body)
}

/// Line chart of one column against the trading days.
pub fn render_line_chart<P: AsRef<Path>>(
    history: &PriceHistory,
    title: &str,
    column: &str,
    path: P,
) -> Result<()> {
    let dates = history.dates()?;
    let values = history.values(column)?;
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if values.is_empty() {
        return Err(Error::Drawing(format!("no {} values to plot", column)));
    }
    let pad = ((hi - lo) * 0.05).max(1.0);

    let root = BitMapBackend::new(path.as_ref(), (1000, 450)).into_drawing_area();
    root.fill(&WHITE).map_err(drawing_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0usize..values.len(), (lo - pad)..(hi + pad))
        .map_err(drawing_error)?;
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|i: &usize| dates.get(*i).cloned().unwrap_or_default())
        .y_desc(column)
        .draw()
        .map_err(drawing_error)?;
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i, *v)),
            &BLUE,
        ))
        .map_err(drawing_error)?;
    root.present().map_err(drawing_error)?;
    log::info!("wrote {} chart to {}", column, path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"chart":{"result":[{
        "meta":{"symbol":"GOOGL"},
        "timestamp":[1590969600,1591056000,1591142400],
        "indicators":{"quote":[{
            "open":[71.2,71.9,null],
            "high":[71.9,72.4,72.9],
            "low":[70.4,71.2,71.8],
            "close":[71.6,72.0,72.1],
            "volume":[30712000,28498000,29976000]
        }]}
    }],"error":null}}"#;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn url_uses_unix_midnights() {
        let query = StockQuery::new("GOOGL", date("2020-06-01"), date("2020-06-02"))
            .with_base_url("http://localhost/");
        assert_eq!(
            query.url(),
            "http://localhost/v8/finance/chart/GOOGL?period1=1590969600&period2=1591056000&interval=1d"
        );
    }

    #[test]
    fn parses_bars_and_drops_incomplete() {
        let history = PriceHistory::parse("GOOGL", BODY).unwrap();
        assert_eq!(history.shape(), (2, 6));
        assert_eq!(history.dates().unwrap(), vec!["2020-06-01", "2020-06-02"]);
        assert_eq!(history.values("Close").unwrap(), vec![71.6, 72.0]);
        assert_eq!(history.column("Volume").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn error_payload() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = PriceHistory::parse("NOPE", body).unwrap_err();
        assert!(matches!(err, Error::ChartPayload { ref ticker, .. } if ticker == "NOPE"));
    }

    #[test]
    fn empty_result() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(
            PriceHistory::parse("GOOGL", body),
            Err(Error::ChartPayload { .. })
        ));
    }

    #[test]
    fn fetch_goes_through_page_source() {
        struct Canned;
        impl PageSource for Canned {
            fn fetch(&self, url: &str) -> Result<String> {
                assert!(url.contains("/v8/finance/chart/GOOGL?"));
                Ok(BODY.to_string())
            }
        }
        let query = StockQuery::new("GOOGL", date("2020-05-31"), date("2025-01-31"));
        assert_eq!(fetch_history(&Canned, &query).unwrap().height(), 2);
    }
}
