use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Score of an active mode with nothing to score.
pub const EMPTY_SCORE: f64 = -1.0;
/// Decimal places kept in rendered scores.
pub const SCORE_PRECISION: i32 = 4;

/// How token confidences of a field combine into one score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    EnumIter,
    Deserialize,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceMode {
    #[default]
    Off,
    Min,
    Prod,
    AMean,
    GMean,
}

impl ConfidenceMode {
    pub fn is_active(&self) -> bool {
        *self != ConfidenceMode::Off
    }

    /// `None` when scoring is off, [`EMPTY_SCORE`] for no values.
    pub fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return self.is_active().then_some(EMPTY_SCORE);
        }
        let count = values.len() as f64;
        let product = || values.iter().product::<f64>();
        Some(match self {
            ConfidenceMode::Off => return None,
            ConfidenceMode::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            ConfidenceMode::Prod => product(),
            ConfidenceMode::AMean => values.iter().sum::<f64>() / count,
            ConfidenceMode::GMean => product().powf(1.0 / count),
        })
    }
}

pub fn round_score(score: f64) -> f64 {
    let scale = 10f64.powi(SCORE_PRECISION);
    (score * scale).round() / scale
}

/// Rounds and renders a score, always with a fractional part (`1.0`, `0.25`).
pub fn format_score(score: f64) -> String {
    let rendered = round_score(score).to_string();
    if rendered.contains('.') || !score.is_finite() {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(ConfidenceMode::from_str("amean").unwrap(), ConfidenceMode::AMean);
        assert_eq!(ConfidenceMode::from_str("off").unwrap(), ConfidenceMode::Off);
        assert!(ConfidenceMode::from_str("median").is_err());
        for mode in ConfidenceMode::iter() {
            assert_eq!(ConfidenceMode::from_str(&mode.to_string()).unwrap(), mode);
        }
    }

    #[test]
    fn test_aggregate() {
        let values = [0.5, 0.8, 1.0];
        assert_eq!(ConfidenceMode::Off.aggregate(&values), None);
        assert_eq!(ConfidenceMode::Min.aggregate(&values), Some(0.5));
        assert_eq!(ConfidenceMode::Prod.aggregate(&values), Some(0.4));
        let mean = ConfidenceMode::AMean.aggregate(&values).unwrap();
        assert!((mean - 0.7667).abs() < 1e-4);
        let geometric = ConfidenceMode::GMean.aggregate(&[0.25, 1.0]).unwrap();
        assert!((geometric - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_values_score_sentinel() {
        assert_eq!(ConfidenceMode::Min.aggregate(&[]), Some(EMPTY_SCORE));
        assert_eq!(ConfidenceMode::Off.aggregate(&[]), None);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(1.0), "1.0");
        assert_eq!(format_score(-1.0), "-1.0");
        assert_eq!(format_score(0.123456), "0.1235");
        assert_eq!(format_score(0.5), "0.5");
    }
}
