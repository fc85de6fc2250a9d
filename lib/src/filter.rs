use crate::{
    loader::{PlayerStats, POSITION_COLUMN},
    Position, Result,
};
use polars::prelude::*;

/// Team and position multi-selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    teams: Vec<String>,
    positions: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every team present in `stats` plus the default positions.
    pub fn all_teams(stats: &PlayerStats) -> Result<Self> {
        Ok(Self::new()
            .teams(stats.teams()?)
            .positions(Position::DEFAULTS.iter().map(|p| p.to_string())))
    }

    pub fn team(mut self, team: &str) -> Self {
        self.teams.push(team.to_string());
        self
    }

    pub fn teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams.extend(teams.into_iter().map(Into::into));
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.positions.push(position.to_string());
        self
    }

    pub fn positions<I, S>(mut self, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positions.extend(positions.into_iter().map(Into::into));
        self
    }

    pub fn selected_teams(&self) -> &[String] {
        &self.teams
    }

    pub fn selected_positions(&self) -> &[String] {
        &self.positions
    }

    // An empty selection matches nothing.
    pub fn build(&self, team_column: &str) -> Expr {
        if self.teams.is_empty() || self.positions.is_empty() {
            return lit(false);
        }
        member_of(team_column, &self.teams).and(member_of(POSITION_COLUMN, &self.positions))
    }
}

fn member_of(column: &str, values: &[String]) -> Expr {
    col(column)
        .cast(DataType::String)
        .is_in(lit(Series::new(column, values)))
}

impl PlayerStats {
    /// Rows whose team and position are both selected, in source order.
    pub fn filter(&self, selection: &Selection) -> Result<DataFrame> {
        log::trace!("filter::filter");
        let expr = selection.build(self.team_column()?);
        let df = (**self).clone().lazy().filter(expr).collect()?;
        log::debug!("{} of {} rows selected", df.height(), self.height());
        Ok(df)
    }
}
