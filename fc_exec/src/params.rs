//! # Flight Controller Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ctrl_lib::fc::sim::SimParams;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FcExecParams {
    /// The simulated vehicle
    pub sim: SimParams,
}

#[cfg(test)]
mod test {
    use super::*;
    use util::params::from_toml_str;

    #[test]
    fn test_load() {
        let params: FcExecParams = from_toml_str(
            r#"
            [sim]
            has_compass = false
            command_latency_ms = 5
            "#,
        )
        .unwrap();

        assert!(!params.sim.has_compass);
        assert!(params.sim.ultrasonic_in_use);
        assert_eq!(params.sim.command_latency_ms, 5);
    }
}
