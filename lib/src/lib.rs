use parse_display::{Display, FromStr};

mod error;
pub mod correlation;
pub mod export;
pub mod filter;
pub mod heatmap;
pub mod html;
pub mod loader;
pub mod render;
pub mod source;
pub mod stock;
pub mod table;

pub use error::Error;
pub use filter::Selection;
pub use loader::{PlayerStats, RushingSource, StatsCache};
pub use render::{render, ExplorerState, View};
pub use source::{HttpSource, PageSource};

pub type Result<T> = std::result::Result<T, error::Error>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, FromStr)]
#[display(style = "UPPERCASE")]
pub enum Position {
    Rb,
    Qb,
    Wr,
    Fb,
    Te,
}

impl Position {
    /// Positions selected when the user picks none.
    pub const DEFAULTS: [Position; 5] = [
        Position::Rb,
        Position::Qb,
        Position::Wr,
        Position::Fb,
        Position::Te,
    ];
}
