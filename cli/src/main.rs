use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use gridiron::{
    export, heatmap,
    loader::{RushingSource, FIRST_YEAR, LAST_YEAR},
    render::HeatmapOutcome,
    stock::{self, StockQuery, DEFAULT_TICKER},
    ExplorerState, HttpSource, Position, StatsCache,
};
use itertools::Itertools;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// NFL rushing stats for one season
    Rushing(RushingArgs),
    /// Closing price and volume charts for one ticker
    Stock(StockArgs),
}

#[derive(ClapArgs, Debug)]
struct RushingArgs {
    #[arg(short = 'y', long = "year", default_value_t = LAST_YEAR, value_parser = clap::value_parser!(u16).range(FIRST_YEAR as i64..=LAST_YEAR as i64))]
    year: u16,

    /// Team abbreviation, repeatable. Defaults to every team that year.
    #[arg(short = 't', long = "team")]
    teams: Vec<String>,

    /// Position, repeatable. Defaults to RB, QB, WR, FB and TE.
    #[arg(short = 'p', long = "pos")]
    positions: Vec<Position>,

    /// Write the intercorrelation heatmap to this PNG.
    #[arg(long, value_name = "PNG")]
    heatmap: Option<PathBuf>,

    /// Write the selected rows as CSV.
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Print the base64 CSV download link.
    #[arg(long)]
    link: bool,

    #[arg(long)]
    base_url: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct StockArgs {
    #[arg(long, default_value = DEFAULT_TICKER)]
    ticker: String,

    #[arg(long, default_value = "2020-05-31", value_parser = parse_date)]
    start: NaiveDate,

    #[arg(long, default_value = "2025-01-31", value_parser = parse_date)]
    end: NaiveDate,

    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    #[arg(long)]
    base_url: Option<String>,
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new()
        .add_filter_allow_str("gridiron")
        .build();

    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("failed to initialize logger")?;

    log::trace!("Args {:#?}", args);

    match args.command {
        Command::Rushing(rushing) => run_rushing(rushing),
        Command::Stock(stock) => run_stock(stock),
    }
}

fn run_rushing(args: RushingArgs) -> Result<()> {
    let mut source = RushingSource::default();
    if let Some(base_url) = args.base_url {
        source.base_url = base_url;
    }
    let cache = StatsCache::new(source, HttpSource::new());

    let mut state = ExplorerState::new(args.year);
    if !args.teams.is_empty() {
        state = state.teams(args.teams);
    }
    if !args.positions.is_empty() {
        state = state.positions(args.positions.iter().map(|p| p.to_string()));
    }
    if args.heatmap.is_some() {
        state = state.with_heatmap();
    }

    let view = gridiron::render(&cache, &state)
        .with_context(|| format!("failed to load {} rushing stats", args.year))?;

    println!("NFL Football Stats (Rushing) Explorer: {}", view.year);
    println!(
        "Teams: {}",
        view.selection.selected_teams().iter().join(", ")
    );
    println!(
        "Positions: {}",
        view.selection.selected_positions().iter().join(", ")
    );
    println!("{}", view.summary());
    println!("{}", view.table);

    if let Some(path) = &args.csv {
        export::write_csv(&view.table, path)?;
        log::info!("wrote {}", path.display());
    }
    if args.link {
        println!("{}", view.download_link);
    }

    match (view.heatmap, args.heatmap) {
        (Some(HeatmapOutcome::Matrix(matrix)), Some(path)) => {
            heatmap::render_png(&matrix, &path)?;
            println!("Intercorrelation Matrix Heatmap written to {}", path.display());
        }
        (Some(HeatmapOutcome::Warning(warning)), _) => eprintln!("warning: {}", warning),
        _ => {}
    }
    Ok(())
}

fn run_stock(args: StockArgs) -> Result<()> {
    if args.end <= args.start {
        bail!("--end must be after --start");
    }
    let mut query = StockQuery::new(&args.ticker, args.start, args.end);
    if let Some(base_url) = &args.base_url {
        query = query.with_base_url(base_url);
    }

    let history = stock::fetch_history(&HttpSource::new(), &query)
        .with_context(|| format!("failed to fetch history for {}", args.ticker))?;
    log::info!("Loaded {} trading days", history.height());

    std::fs::create_dir_all(&args.out_dir)?;
    let close_path = args.out_dir.join(format!("{}_close.png", args.ticker));
    let volume_path = args.out_dir.join(format!("{}_volume.png", args.ticker));
    stock::render_line_chart(&history, &format!("{} Closing Price", args.ticker), "Close", &close_path)?;
    stock::render_line_chart(&history, &format!("{} Volume", args.ticker), "Volume", &volume_path)?;

    println!("{}", *history);
    println!("Closing price: {}", close_path.display());
    println!("Volume: {}", volume_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn rushing_defaults() {
        let args = Args::try_parse_from(["gridiron", "rushing"]).unwrap();
        let Command::Rushing(rushing) = args.command else {
            panic!("expected rushing");
        };
        assert_eq!(rushing.year, LAST_YEAR);
        assert!(rushing.teams.is_empty());
        assert!(rushing.heatmap.is_none());
    }

    #[test]
    fn rejects_unsupported_year() {
        assert!(Args::try_parse_from(["gridiron", "rushing", "--year", "1989"]).is_err());
        assert!(Args::try_parse_from(["gridiron", "rushing", "--year", "2020"]).is_err());
    }

    #[test]
    fn repeated_team_and_position() {
        let args = Args::try_parse_from([
            "gridiron", "-vv", "rushing", "-t", "KAN", "-t", "BAL", "--pos", "RB",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        let Command::Rushing(rushing) = args.command else {
            panic!("expected rushing");
        };
        assert_eq!(rushing.teams, vec!["KAN", "BAL"]);
        assert_eq!(rushing.positions, vec![Position::Rb]);
    }

    #[test]
    fn stock_dates() {
        let args = Args::try_parse_from(["gridiron", "stock", "--start", "2021-01-04"]).unwrap();
        let Command::Stock(stock) = args.command else {
            panic!("expected stock");
        };
        assert_eq!(stock.ticker, "GOOGL");
        assert_eq!(stock.start, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    }
}
