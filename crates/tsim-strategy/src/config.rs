//! Strategy tuning knobs.

use crate::{StrategyError, StrategyResult};

/// How far back an evacuation vehicle returns after unloading at the shelter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BackwardTruncation {
    /// Walk back from the shelter and turn around just before the first
    /// pickup stop whose demand is exhausted.
    FirstExhausted,
    /// Walk back past exhausted stops to the farthest pickup stop that still
    /// has demand.
    #[default]
    FarthestDemand,
}

/// What a vehicle does when its route has no demand left and no other route
/// can take it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ExhaustedRoute {
    /// Keep running the current route.
    #[default]
    Repeat,
    /// Stop after the current trip.
    Retire,
}

/// Parameters shared by the reference strategies.
///
/// Typically loaded from the `strategy` section of the host's JSON config.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrategyConfig {
    /// Gap between successive departures on the same route.  Default: 120.
    pub departure_gap: f64,

    /// Time an evacuation vehicle stands at a pickup stop.  Default: 0.5.
    pub stop_standing_time: f64,

    /// Time to load or unload evacuees at a stop.  Default: 1.0.
    pub shelter_evacuation_time: f64,

    /// Dwell time of a transit vehicle at every stop.  Default: 120.
    pub dwell_time: f64,

    pub backward_truncation: BackwardTruncation,

    /// Evacuation vehicles always stop at the route terminal to unload, even
    /// if the terminal has no demand of its own.  Default: `true`.
    pub terminal_discharge: bool,

    pub exhausted_route: ExhaustedRoute,

    /// Seed for randomized rerouting.
    pub seed: u64,
}

impl StrategyConfig {
    /// Wait at a stop where an evacuation vehicle boards or unloads.
    pub fn evacuation_stop_time(&self) -> f64 {
        self.stop_standing_time + self.shelter_evacuation_time
    }

    pub fn validate(&self) -> StrategyResult<()> {
        let durations = [
            ("departure_gap", self.departure_gap),
            ("stop_standing_time", self.stop_standing_time),
            ("shelter_evacuation_time", self.shelter_evacuation_time),
            ("dwell_time", self.dwell_time),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(StrategyError::Config(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            departure_gap:           120.0,
            stop_standing_time:      0.5,
            shelter_evacuation_time: 1.0,
            dwell_time:              120.0,
            backward_truncation:     BackwardTruncation::default(),
            terminal_discharge:      true,
            exhausted_route:         ExhaustedRoute::default(),
            seed:                    0,
        }
    }
}
