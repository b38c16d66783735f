use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller policy describing what an import may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportIntent {
    /// Create athletes; existing ones are left alone.
    #[default]
    RosterOnly,
    /// Create athletes and record scores, merging into existing records.
    RosterAndScores,
    /// Attach scores to athletes that already exist.
    ScoresOnly,
}

impl ImportIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RosterOnly => "roster_only",
            Self::RosterAndScores => "roster_and_scores",
            Self::ScoresOnly => "scores_only",
        }
    }

    pub fn writes_scores(&self) -> bool {
        !matches!(self, Self::RosterOnly)
    }

    pub fn writes_roster(&self) -> bool {
        !matches!(self, Self::ScoresOnly)
    }

    pub fn allows_create(&self) -> bool {
        !matches!(self, Self::ScoresOnly)
    }
}

impl fmt::Display for ImportIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "roster_only" | "roster" => Ok(Self::RosterOnly),
            "roster_and_scores" | "create_or_update" => Ok(Self::RosterAndScores),
            "scores_only" | "scores" => Ok(Self::ScoresOnly),
            other => Err(format!("unknown import intent: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashed_and_snake_forms() {
        assert_eq!("scores-only".parse(), Ok(ImportIntent::ScoresOnly));
        assert_eq!("Roster_And_Scores".parse(), Ok(ImportIntent::RosterAndScores));
        assert!("everything".parse::<ImportIntent>().is_err());
    }

    #[test]
    fn policy_flags() {
        assert!(!ImportIntent::RosterOnly.writes_scores());
        assert!(!ImportIntent::ScoresOnly.allows_create());
        assert!(ImportIntent::RosterAndScores.writes_roster());
    }
}
