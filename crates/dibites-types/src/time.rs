//! The simulated clock.
//!
//! Each archive carries the simulation's own elapsed time. Every population
//! and pellet row derived from an archive is stamped with that value. When
//! the scene file cannot supply it, rows are stamped [`SimulatedTime::Unknown`]
//! instead, which is persisted as a null `update_time` and therefore sorts
//! apart from every real time value.

/// Logical clock value attached to time-series rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SimulatedTime {
    /// Simulated seconds reported by the archive's scene.
    Known(f64),
    /// The scene did not report a usable time.
    #[default]
    Unknown,
}

impl SimulatedTime {
    /// Return the numeric value, or `None` for the sentinel.
    pub const fn seconds(self) -> Option<f64> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown => None,
        }
    }

    /// Whether the archive reported a usable time.
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<Option<f64>> for SimulatedTime {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

impl core::fmt::Display for SimulatedTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Known(value) => write!(f, "{value}"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_has_no_seconds() {
        assert_eq!(SimulatedTime::Unknown.seconds(), None);
        assert_eq!(SimulatedTime::from(None), SimulatedTime::Unknown);
        assert_eq!(SimulatedTime::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn known_round_trips_through_option() {
        let time = SimulatedTime::from(Some(3600.5));
        assert!(time.is_known());
        assert_eq!(time.seconds(), Some(3600.5));
    }
}
