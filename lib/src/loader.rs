use crate::{
    error::Error,
    html,
    source::PageSource,
    table::RawTable,
    Result,
};
use derive_deref::Deref;
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub const FIRST_YEAR: u16 = 1990;
pub const LAST_YEAR: u16 = 2019;

/// Newer pages label the team column `Team`, older ones `Tm`.
pub const TEAM_COLUMNS: [&str; 2] = ["Team", "Tm"];
pub const POSITION_COLUMN: &str = "Pos";

/// Supported seasons, most recent first.
pub fn supported_years() -> impl Iterator<Item = u16> {
    (FIRST_YEAR..=LAST_YEAR).rev()
}

/// Where the rushing table lives and how it is laid out.
#[derive(Debug, Clone)]
pub struct RushingSource {
    pub base_url: String,
    /// Index of the header row; rows above it are over-headers.
    pub header_row: usize,
    /// Column whose own name marks a repeated header row.
    pub marker_column: String,
    pub index_column: String,
}

impl Default for RushingSource {
    fn default() -> Self {
        Self {
            base_url: "https://www.pro-football-reference.com".to_string(),
            header_row: 1,
            marker_column: "Age".to_string(),
            index_column: "Rk".to_string(),
        }
    }
}

impl RushingSource {
    pub fn url(&self, year: u16) -> String {
        format!("{}/years/{}/rushing.htm", self.base_url.trim_end_matches('/'), year)
    }

    /// Parses a rushing page into the normalized table.
    pub fn parse_page(&self, url: &str, page: &str) -> Result<PlayerStats> {
        log::trace!("loader::parse_page");
        let rows = html::first_table_rows(page).ok_or_else(|| Error::TableNotFound(url.to_string()))?;
        let table = RawTable::from_rows(rows, self.header_row)?
            .normalize(&self.marker_column, &self.index_column);
        let stats = PlayerStats::new(table.into_frame()?)?;
        log::debug!("{} players, {} columns from {}", stats.height(), stats.width(), url);
        Ok(stats)
    }
}

/// The normalized rushing table for one season.
#[derive(Clone, Debug, Deref)]
pub struct PlayerStats(DataFrame);

impl PlayerStats {
    /// Wraps a frame, checking it has team and position columns.
    pub fn new(df: DataFrame) -> Result<Self> {
        let stats = PlayerStats(df);
        stats.team_column()?;
        if stats.column(POSITION_COLUMN).is_err() {
            return Err(Error::MissingColumn(vec![POSITION_COLUMN.to_string()]));
        }
        Ok(stats)
    }

    pub fn team_column(&self) -> Result<&'static str> {
        TEAM_COLUMNS
            .into_iter()
            .find(|name| self.column(name).is_ok())
            .ok_or_else(|| Error::MissingColumn(TEAM_COLUMNS.iter().map(|s| s.to_string()).collect()))
    }

    /// Distinct teams, sorted by their text form.
    pub fn teams(&self) -> Result<Vec<String>> {
        let teams = self.column(self.team_column()?)?.cast(&DataType::String)?;
        let teams = teams
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .unique()
            .sorted()
            .collect();
        Ok(teams)
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }
}

/// Per-year memo in front of a [`PageSource`]. Each year is fetched at most
/// once; entries never expire.
pub struct StatsCache {
    source: RushingSource,
    pages: Box<dyn PageSource>,
    entries: Mutex<HashMap<u16, Arc<PlayerStats>>>,
}

impl StatsCache {
    pub fn new(source: RushingSource, pages: impl PageSource + 'static) -> Self {
        Self {
            source,
            pages: Box::new(pages),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &RushingSource {
        &self.source
    }

    pub fn load(&self, year: u16) -> Result<Arc<PlayerStats>> {
        if let Some(hit) = self.lock().get(&year) {
            log::trace!("cache hit for {}", year);
            return Ok(Arc::clone(hit));
        }

        let url = self.source.url(year);
        let page = self.pages.fetch(&url)?;
        let stats = Arc::new(self.source.parse_page(&url, &page)?);

        // First writer wins if two loads of the same year raced.
        let mut entries = self.lock();
        Ok(Arc::clone(entries.entry(year).or_insert(stats)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u16, Arc<PlayerStats>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const PAGE: &str = r#"
        <table id="rushing">
          <thead>
            <tr><th colspan="5"></th><th colspan="3">Rushing</th></tr>
            <tr><th>Rk</th><th>Player</th><th>Tm</th><th>Age</th><th>Pos</th><th>Att</th><th>Yds</th><th>Y/A</th></tr>
          </thead>
          <tbody>
            <tr><th>1</th><td>Derrick Henry</td><td>TEN</td><td>25</td><td>RB</td><td>303</td><td>1,540</td><td>5.1</td></tr>
            <tr><th>2</th><td>Damien Williams</td><td>KAN</td><td>27</td><td>RB</td><td>111</td><td>498</td><td>4.5</td></tr>
            <tr><th>3</th><td>Patrick Mahomes</td><td>KAN</td><td>24</td><td>QB</td><td>43</td><td>218</td><td>5.1</td></tr>
            <tr class="thead"><th>Rk</th><th>Player</th><th>Tm</th><th>Age</th><th>Pos</th><th>Att</th><th>Yds</th><th>Y/A</th></tr>
            <tr><th>4</th><td>LeSean McCoy</td><td>KAN</td><td>31</td><td>RB</td><td>101</td><td>465</td><td>4.6</td></tr>
            <tr><th>5</th><td>Darwin Thompson</td><td>KAN</td><td>22</td><td></td><td>37</td><td>128</td><td>3.5</td></tr>
            <tr><th>6</th><td>Tyreek Hill</td><td>KAN</td><td>25</td><td>WR</td><td>8</td><td>23</td><td>2.9</td></tr>
            <tr><th>7</th><td>Lamar Jackson</td><td>BAL</td><td>22</td><td>QB</td><td>176</td><td>1,206</td><td>6.9</td></tr>
          </tbody>
        </table>
    "#;

    pub(crate) struct FixtureSource {
        pub(crate) page: String,
        pub(crate) hits: Arc<AtomicUsize>,
    }

    impl FixtureSource {
        pub(crate) fn new(page: &str) -> (Self, Arc<AtomicUsize>) {
            let hits = Arc::new(AtomicUsize::new(0));
            let source = FixtureSource {
                page: page.to_string(),
                hits: Arc::clone(&hits),
            };
            (source, hits)
        }
    }

    impl PageSource for FixtureSource {
        fn fetch(&self, _url: &str) -> Result<String> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(self.page.clone())
        }
    }

    pub(crate) fn fixture_stats() -> PlayerStats {
        RushingSource::default().parse_page("fixture", PAGE).unwrap()
    }

    #[test]
    fn url_for_year() {
        let source = RushingSource {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(source.url(2019), "http://localhost:8080/years/2019/rushing.htm");
    }

    #[test]
    fn years_most_recent_first() {
        let years: Vec<u16> = supported_years().collect();
        assert_eq!(years.first(), Some(&2019));
        assert_eq!(years.last(), Some(&1990));
        assert_eq!(years.len(), 30);
    }

    #[test]
    fn parses_and_normalizes() {
        let stats = fixture_stats();
        assert_eq!(stats.height(), 7);
        assert_eq!(
            stats.get_column_names(),
            vec!["Player", "Tm", "Age", "Pos", "Att", "Yds", "Y/A"]
        );
        assert_eq!(stats.team_column().unwrap(), "Tm");
        assert_eq!(stats.column("Yds").unwrap().dtype(), &DataType::Int64);
        assert_eq!(stats.column("Y/A").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn teams_sorted_unique() {
        assert_eq!(fixture_stats().teams().unwrap(), vec!["BAL", "KAN", "TEN"]);
    }

    #[test]
    fn memoizes_per_year() {
        let (pages, hits) = FixtureSource::new(PAGE);
        let cache = StatsCache::new(RushingSource::default(), pages);
        let first = cache.load(2019).unwrap();
        let second = cache.load(2019).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cache.load(2018).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn page_without_table() {
        let (pages, _) = FixtureSource::new("<html><p>moved</p></html>");
        let cache = StatsCache::new(RushingSource::default(), pages);
        assert!(matches!(cache.load(2019), Err(Error::TableNotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn table_without_team_column() {
        let page = "<table><tr><th>x</th></tr><tr><th>Rk</th><th>Pos</th></tr><tr><td>1</td><td>RB</td></tr></table>";
        let err = RushingSource::default().parse_page("u", page).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(_)));
    }
}
