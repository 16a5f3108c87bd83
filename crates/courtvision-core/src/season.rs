// Season identifiers in the "YYYY-YY" form used by every endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeasonError {
    #[error("invalid season format '{0}': expected e.g. '2023-24'")]
    Format(String),

    #[error("invalid season '{0}': years must be consecutive")]
    NonConsecutive(String),
}

/// A validated season such as `2023-24`.
///
/// Ordering is chronological because the canonical string sorts the same
/// way as its start year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season(String);

impl Season {
    pub fn parse(s: &str) -> Result<Self, SeasonError> {
        let s = s.trim();
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| SeasonError::Format(s.to_string()))?;
        let digits =
            |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(start, 4) || !digits(end, 2) {
            return Err(SeasonError::Format(s.to_string()));
        }
        let start_year: u32 = start
            .parse()
            .map_err(|_| SeasonError::Format(s.to_string()))?;
        let end_short: u32 = end.parse().map_err(|_| SeasonError::Format(s.to_string()))?;
        if (start_year + 1) % 100 != end_short {
            return Err(SeasonError::NonConsecutive(s.to_string()));
        }
        Ok(Season(s.to_string()))
    }

    /// Build a season from the year it ends in (`2024` -> `2023-24`).
    pub fn from_end_year(year: u32) -> Result<Self, SeasonError> {
        Season::parse(&format!("{}-{:02}", year.saturating_sub(1), year % 100))
    }

    pub fn start_year(&self) -> u32 {
        // Validated in `parse`, so the prefix is always four digits.
        self.0[..4].parse().unwrap_or_default()
    }

    /// The year the season ends in, which is how Torvik-style sources key it.
    pub fn end_year(&self) -> u32 {
        self.start_year() + 1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The latest season the bundled data covers.
impl Default for Season {
    fn default() -> Self {
        Season("2024-25".to_string())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Season::parse(&value)
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.0
    }
}

impl std::str::FromStr for Season {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Season::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_season() {
        let season = Season::parse("2023-24").unwrap();
        assert_eq!(season.as_str(), "2023-24");
        assert_eq!(season.start_year(), 2023);
        assert_eq!(season.end_year(), 2024);
    }

    #[test]
    fn century_rollover_is_consecutive() {
        assert!(Season::parse("1999-00").is_ok());
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["2023", "2023-2024", "23-24", "abcd-ef", "", "+202-03", "2023-+4", " 202-03"] {
            assert!(
                matches!(Season::parse(bad), Err(SeasonError::Format(_))),
                "expected format error for {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_non_consecutive_years() {
        assert_eq!(
            Season::parse("2023-25"),
            Err(SeasonError::NonConsecutive("2023-25".into()))
        );
    }

    #[test]
    fn from_end_year_round_trips() {
        assert_eq!(Season::from_end_year(2024).unwrap().as_str(), "2023-24");
        assert_eq!(Season::from_end_year(2000).unwrap().as_str(), "1999-00");
    }

    #[test]
    fn from_end_year_rejects_years_without_four_digit_start() {
        assert!(matches!(Season::from_end_year(0), Err(SeasonError::Format(_))));
        assert!(matches!(Season::from_end_year(999), Err(SeasonError::Format(_))));
    }

    #[test]
    fn default_is_a_valid_season() {
        let season = Season::default();
        assert_eq!(Season::parse(season.as_str()), Ok(season));
    }

    #[test]
    fn orders_chronologically() {
        let mut seasons = vec![
            Season::parse("2024-25").unwrap(),
            Season::parse("2022-23").unwrap(),
            Season::parse("2023-24").unwrap(),
        ];
        seasons.sort();
        let names: Vec<&str> = seasons.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["2022-23", "2023-24", "2024-25"]);
    }
}
