//! One pass of the explorer: state in, view out.

use crate::{
    correlation::{CorrelationMatrix, NO_NUMERIC_DATA},
    export,
    filter::Selection,
    loader::StatsCache,
    Position, Result,
};
use polars::prelude::*;

/// Everything the user can choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerState {
    pub year: u16,
    /// `None` selects every team of the year.
    pub teams: Option<Vec<String>>,
    pub positions: Vec<String>,
    pub heatmap: bool,
}

impl ExplorerState {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            teams: None,
            positions: Position::DEFAULTS.iter().map(|p| p.to_string()).collect(),
            heatmap: false,
        }
    }

    pub fn teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = Some(teams.into_iter().map(Into::into).collect());
        self
    }

    pub fn positions<I, S>(mut self, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positions = positions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_heatmap(mut self) -> Self {
        self.heatmap = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum HeatmapOutcome {
    Warning(String),
    Matrix(CorrelationMatrix),
}

#[derive(Debug, Clone)]
pub struct View {
    pub year: u16,
    pub selection: Selection,
    pub table: DataFrame,
    pub download_link: String,
    /// Only set when the heatmap was requested.
    pub heatmap: Option<HeatmapOutcome>,
}

impl View {
    pub fn summary(&self) -> String {
        format!(
            "Data Dimension: {} rows and {} columns.",
            self.table.height(),
            self.table.width()
        )
    }
}

pub fn render(cache: &StatsCache, state: &ExplorerState) -> Result<View> {
    log::trace!("render::render {:?}", state);
    let stats = cache.load(state.year)?;

    let selection = match &state.teams {
        Some(teams) => Selection::new().teams(teams.iter().cloned()),
        None => Selection::new().teams(stats.teams()?),
    }
    .positions(state.positions.iter().cloned());

    let table = stats.filter(&selection)?;
    let download_link = export::download_link(&table)?;

    let heatmap = if state.heatmap {
        Some(match CorrelationMatrix::compute(&table)? {
            Some(matrix) => HeatmapOutcome::Matrix(matrix),
            None => {
                log::warn!("{}", NO_NUMERIC_DATA);
                HeatmapOutcome::Warning(NO_NUMERIC_DATA.to_string())
            }
        })
    } else {
        None
    };

    Ok(View {
        year: state.year,
        selection,
        table,
        download_link,
        heatmap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{tests::FixtureSource, tests::PAGE, RushingSource};

    fn cache() -> StatsCache {
        let (pages, _) = FixtureSource::new(PAGE);
        StatsCache::new(RushingSource::default(), pages)
    }

    #[test]
    fn defaults_select_all_teams() {
        let view = render(&cache(), &ExplorerState::new(2019)).unwrap();
        assert_eq!(view.selection.selected_teams(), ["BAL", "KAN", "TEN"]);
        assert_eq!(view.summary(), "Data Dimension: 6 rows and 7 columns.");
        assert!(view.heatmap.is_none());
    }

    #[test]
    fn heatmap_only_on_request() {
        let state = ExplorerState::new(2019).teams(["KAN"]).with_heatmap();
        let view = render(&cache(), &state).unwrap();
        match view.heatmap {
            Some(HeatmapOutcome::Matrix(m)) => assert_eq!(m.columns, ["Age", "Att", "Yds", "Y/A"]),
            other => panic!("expected a matrix, got {:?}", other),
        }
    }

    #[test]
    fn heatmap_warns_on_empty_selection() {
        let state = ExplorerState::new(2019)
            .teams(["KAN"])
            .positions(Vec::<String>::new())
            .with_heatmap();
        let view = render(&cache(), &state).unwrap();
        assert_eq!(view.table.height(), 0);
        assert!(matches!(
            view.heatmap,
            Some(HeatmapOutcome::Warning(ref w)) if w == NO_NUMERIC_DATA
        ));
    }
}
