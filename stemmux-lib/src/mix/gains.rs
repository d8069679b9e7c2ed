use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StemError};

/// Gain applied to stems the map does not mention.
pub const DEFAULT_GAIN: f32 = 1.0;

/// Per-stem linear gain multipliers.
///
/// A gain of `0.0` mutes the stem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GainMap {
    gains: BTreeMap<String, f32>,
}

impl GainMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, stem: impl Into<String>, gain: f32) -> Result<()> {
        let stem = stem.into();
        check_gain(&stem, gain)?;
        self.gains.insert(stem, gain);
        Ok(())
    }

    /// Gain for `stem`, defaulting to unity.
    pub fn gain_for(&self, stem: &str) -> f32 {
        self.gains.get(stem).copied().unwrap_or(DEFAULT_GAIN)
    }

    pub fn is_muted(&self, stem: &str) -> bool {
        self.gain_for(stem) == 0.0
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.gains.keys().map(String::as_str)
    }

    /// Reject negative or non-finite gains.
    pub fn validate(&self) -> Result<()> {
        self.gains
            .iter()
            .try_for_each(|(stem, gain)| check_gain(stem, *gain))
    }

    /// Parse a JSON object of `{"stem": gain}` pairs.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Parse a `name=value` assignment.
    pub fn parse_assignment(assignment: &str) -> Result<(String, f32)> {
        let (stem, value) = assignment.split_once('=').ok_or_else(|| {
            StemError::InvalidInput(format!("expected stem=gain, got {:?}", assignment))
        })?;
        let stem = stem.trim();
        if stem.is_empty() {
            return Err(StemError::InvalidInput(format!(
                "missing stem name in {:?}",
                assignment
            )));
        }
        let gain: f32 = value.trim().parse().map_err(|_| {
            StemError::InvalidInput(format!("gain {:?} is not a number", value.trim()))
        })?;
        check_gain(stem, gain)?;
        Ok((stem.to_string(), gain))
    }
}

fn check_gain(stem: &str, gain: f32) -> Result<()> {
    if gain.is_finite() && gain >= 0.0 {
        Ok(())
    } else {
        Err(StemError::InvalidGain {
            stem: stem.to_string(),
            gain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_stems_default_to_unity() {
        let mut gains = GainMap::new();
        gains.set("bass", 0.0).expect("set");
        assert_eq!(gains.gain_for("bass"), 0.0);
        assert!(gains.is_muted("bass"));
        assert_eq!(gains.gain_for("vocals"), 1.0);
        assert!(!gains.is_muted("vocals"));
    }

    #[test]
    fn negative_and_non_finite_gains_are_rejected() {
        let mut gains = GainMap::new();
        for bad in [-0.5, f32::NAN, f32::INFINITY] {
            let err = gains.set("drums", bad).err().expect("should fail");
            assert!(matches!(err, StemError::InvalidGain { .. }));
        }
        assert!(GainMap::from_json_str(r#"{"vocals": -1.0}"#).is_err());
    }

    #[test]
    fn json_objects_parse() {
        let gains = GainMap::from_json_str(r#"{"vocals": 1.0, "bass": 0, "other": 0.5}"#).expect("parse");
        assert_eq!(gains.gain_for("other"), 0.5);
        assert_eq!(gains.stems().collect::<Vec<_>>(), vec!["bass", "other", "vocals"]);
    }

    #[test]
    fn assignments_parse() {
        assert_eq!(
            GainMap::parse_assignment("vocals=0.75").expect("parse"),
            ("vocals".to_string(), 0.75)
        );
        assert!(GainMap::parse_assignment("vocals").is_err());
        assert!(GainMap::parse_assignment("=1").is_err());
        assert!(GainMap::parse_assignment("bass=loud").is_err());
        assert!(matches!(
            GainMap::parse_assignment("bass=-2"),
            Err(StemError::InvalidGain { .. })
        ));
    }
}
