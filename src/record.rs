use chrono::NaiveDate;
use serde::Serialize;

/// One row of canonical match data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub league: String,
    pub season: i64,
    pub team1: String,
    pub team2: String,
    pub spi1: f64,
    pub spi2: f64,
    pub prob1: f64,
    pub prob2: f64,
    pub probtie: f64,
    pub proj_score1: f64,
    pub proj_score2: f64,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
}

impl MatchRecord {
    pub fn is_finished(&self) -> bool {
        self.score1.is_some() && self.score2.is_some()
    }

    /// 'H', 'A' or 'D' for a finished match.
    pub fn outcome(&self) -> Option<char> {
        let (Some(home_goals), Some(away_goals)) = (self.score1, self.score2) else {
            return None;
        };
        if home_goals > away_goals {
            Some('H')
        } else if home_goals < away_goals {
            Some('A')
        } else {
            Some('D')
        }
    }
}
