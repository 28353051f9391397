//! Phase-encoding direction tokens (`i`, `j-`, ...).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{DwiprepError, Result};

static PEDIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ijk])(-?)$").unwrap());

/// Voxel axis along which phase encoding was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseAxis {
    I,
    J,
    K,
}

/// Which side of a reverse phase-encoding pair a series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Plus,
    Minus,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Plus => "plus",
            Polarity::Minus => "minus",
        }
    }
}

/// A parsed phase-encoding direction: axis plus reversal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEncodingDirection {
    pub axis: PhaseAxis,
    pub reversed: bool,
}

impl PhaseEncodingDirection {
    pub fn polarity(&self) -> Polarity {
        if self.reversed {
            Polarity::Minus
        } else {
            Polarity::Plus
        }
    }
}

impl FromStr for PhaseEncodingDirection {
    type Err = DwiprepError;

    fn from_str(token: &str) -> Result<Self> {
        let caps = PEDIR_PATTERN.captures(token.trim()).ok_or_else(|| {
            DwiprepError::Config(format!(
                "dwi_series_pedir '{token}' is not a phase-encoding direction; expected one of i, i-, j, j-, k, k-"
            ))
        })?;
        let axis = match &caps[1] {
            "i" => PhaseAxis::I,
            "j" => PhaseAxis::J,
            _ => PhaseAxis::K,
        };
        Ok(Self {
            axis,
            reversed: !caps[2].is_empty(),
        })
    }
}

impl fmt::Display for PhaseEncodingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            PhaseAxis::I => "i",
            PhaseAxis::J => "j",
            PhaseAxis::K => "k",
        };
        write!(f, "{axis}{}", if self.reversed { "-" } else { "" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_bids_token() {
        for (token, axis, reversed) in [
            ("i", PhaseAxis::I, false),
            ("i-", PhaseAxis::I, true),
            ("j", PhaseAxis::J, false),
            ("j-", PhaseAxis::J, true),
            ("k", PhaseAxis::K, false),
            ("k-", PhaseAxis::K, true),
        ] {
            let pedir: PhaseEncodingDirection = token.parse().unwrap();
            assert_eq!(pedir.axis, axis);
            assert_eq!(pedir.reversed, reversed);
            assert_eq!(pedir.to_string(), token);
        }
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        let pedir: PhaseEncodingDirection = " j- ".parse().unwrap();
        assert_eq!(pedir.polarity(), Polarity::Minus);
    }

    #[test]
    fn malformed_tokens_rejected() {
        for token in ["", "x", "j+", "jj", "-j", "J"] {
            let err = token.parse::<PhaseEncodingDirection>().unwrap_err();
            assert!(err.to_string().contains("dwi_series_pedir"), "{token}");
        }
    }
}
