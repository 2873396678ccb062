//! Scene genre.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Genre of the scene. Drives voice selection and tone downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Genre {
    #[default]
    Drama,
    Comedy,
    Horror,
    Action,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Noir,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Drama,
        Genre::Comedy,
        Genre::Horror,
        Genre::Action,
        Genre::SciFi,
        Genre::Noir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Drama => "Drama",
            Genre::Comedy => "Comedy",
            Genre::Horror => "Horror",
            Genre::Action => "Action",
            Genre::SciFi => "Sci-Fi",
            Genre::Noir => "Noir",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a genre name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown genre '{0}' (expected one of: Drama, Comedy, Horror, Action, Sci-Fi, Noir)")]
pub struct ParseGenreError(pub String);

impl FromStr for Genre {
    type Err = ParseGenreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "drama" => Ok(Genre::Drama),
            "comedy" => Ok(Genre::Comedy),
            "horror" => Ok(Genre::Horror),
            "action" => Ok(Genre::Action),
            "scifi" => Ok(Genre::SciFi),
            "noir" => Ok(Genre::Noir),
            _ => Err(ParseGenreError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_lenient_about_case_and_punctuation() {
        assert_eq!("sci-fi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert_eq!("SciFi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert_eq!(" NOIR ".parse::<Genre>().unwrap(), Genre::Noir);
        assert!("western".parse::<Genre>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&Genre::SciFi).unwrap(), "\"Sci-Fi\"");
        let g: Genre = serde_json::from_str("\"Horror\"").unwrap();
        assert_eq!(g, Genre::Horror);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for genre in Genre::ALL {
            assert_eq!(genre.to_string().parse::<Genre>().unwrap(), genre);
        }
    }
}
