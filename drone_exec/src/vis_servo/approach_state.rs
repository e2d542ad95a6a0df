//! Approach state label

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which correction currently dominates the vehicle's motion.
///
/// Diagnostic only, the label never feeds back into the control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproachState {
    /// Autonomous approach is disabled (or the vehicle is grounded).
    Off,

    /// The operator is flying the vehicle.
    Manual,

    /// No marker is visible.
    NoMarker,

    /// The vehicle is turning to face the marker.
    Facing,

    /// The vehicle is centring the marker in the frame.
    Centering,

    /// The vehicle is closing on the marker.
    Approach,

    /// The vehicle is aligned and at the target distance.
    Hold,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ApproachState {
    /// Classify a marker-present cycle.
    ///
    /// Priority order is facing, centring, approaching then holding. The label does not gate
    /// which corrections were applied, every correction is computed independently.
    pub fn classify(facing_active: bool, lateral_active: bool, fb: i32) -> Self {
        if facing_active {
            ApproachState::Facing
        }
        else if lateral_active {
            ApproachState::Centering
        }
        else if fb > 0 {
            ApproachState::Approach
        }
        else {
            ApproachState::Hold
        }
    }
}

impl Default for ApproachState {
    fn default() -> Self {
        ApproachState::Off
    }
}

impl std::fmt::Display for ApproachState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApproachState::Off => "OFF",
            ApproachState::Manual => "MANUAL",
            ApproachState::NoMarker => "NO_MARKER",
            ApproachState::Facing => "FACING",
            ApproachState::Centering => "CENTERING",
            ApproachState::Approach => "APPROACH",
            ApproachState::Hold => "HOLD",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_priority() {
        assert_eq!(ApproachState::classify(true, true, 20), ApproachState::Facing);
        assert_eq!(ApproachState::classify(false, true, 20), ApproachState::Centering);
        assert_eq!(ApproachState::classify(false, false, 20), ApproachState::Approach);
        assert_eq!(ApproachState::classify(false, false, 0), ApproachState::Hold);
        assert_eq!(ApproachState::classify(false, false, -10), ApproachState::Hold);
    }

    #[test]
    fn test_display() {
        assert_eq!(ApproachState::NoMarker.to_string(), "NO_MARKER");
        assert_eq!(
            serde_json::to_string(&ApproachState::NoMarker).unwrap(),
            "\"NO_MARKER\""
        );
    }
}
