//! # Operator command module
//!
//! Discrete commands issued by the operator. Unlike velocity commands these are one-shot actions,
//! processed once in the cycle they arrive in.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCmd {
    /// Take off, subject to the battery guard.
    Takeoff,

    /// Land the vehicle.
    Land,

    /// Enable autonomous marker approach if it is disabled, disable it otherwise.
    ToggleApproach,

    /// End the session after the current cycle.
    Quit,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let cmds: Vec<OperatorCmd> = serde_json::from_str(
            r#"["takeoff", "toggle_approach", "land", "quit"]"#
        ).unwrap();

        assert_eq!(cmds, vec![
            OperatorCmd::Takeoff,
            OperatorCmd::ToggleApproach,
            OperatorCmd::Land,
            OperatorCmd::Quit
        ]);
    }
}
