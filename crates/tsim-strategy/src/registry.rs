//! Name-based lookup of the reference strategies, for hosts that pick a
//! policy from a command-line flag or config file.

use std::fmt;
use std::str::FromStr;

use tsim_network::Vehicle;

use crate::{
    DemandProportionalDispatch, DispatchStrategy, EvacuationVehicle, RoundRobinDispatch, StrategyConfig,
    StrategyError, StrategyResult, TransitVehicle, VehicleStrategy,
};

/// Builds one vehicle strategy per vehicle.
pub type VehicleFactory = Box<dyn Fn(&Vehicle) -> Box<dyn VehicleStrategy>>;

// ── DispatchKind ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DispatchKind {
    RoundRobin,
    #[default]
    DemandProportional,
}

impl DispatchKind {
    const EXPECTED: &'static str = "round-robin, demand-proportional";

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchKind::RoundRobin => "round-robin",
            DispatchKind::DemandProportional => "demand-proportional",
        }
    }

    pub fn build(self, config: &StrategyConfig) -> StrategyResult<Box<dyn DispatchStrategy>> {
        config.validate()?;
        Ok(match self {
            DispatchKind::RoundRobin => Box::new(RoundRobinDispatch),
            DispatchKind::DemandProportional => Box::new(DemandProportionalDispatch::new(
                config.departure_gap,
                config.exhausted_route,
                config.seed,
            )),
        })
    }
}

impl FromStr for DispatchKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" => Ok(DispatchKind::RoundRobin),
            "demand-proportional" => Ok(DispatchKind::DemandProportional),
            _ => Err(StrategyError::UnknownStrategy {
                kind:     "dispatch",
                name:     s.to_owned(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── VehicleKind ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VehicleKind {
    Transit,
    #[default]
    Evacuation,
}

impl VehicleKind {
    const EXPECTED: &'static str = "transit, evacuation";

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleKind::Transit => "transit",
            VehicleKind::Evacuation => "evacuation",
        }
    }

    pub fn factory(self, config: &StrategyConfig) -> StrategyResult<VehicleFactory> {
        config.validate()?;
        Ok(match self {
            VehicleKind::Transit => {
                let dwell = config.dwell_time;
                Box::new(move |_: &Vehicle| Box::new(TransitVehicle::new(dwell)) as Box<dyn VehicleStrategy>)
            }
            VehicleKind::Evacuation => {
                let config = config.clone();
                Box::new(move |_: &Vehicle| {
                    Box::new(EvacuationVehicle::new(&config)) as Box<dyn VehicleStrategy>
                })
            }
        })
    }
}

impl FromStr for VehicleKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transit" => Ok(VehicleKind::Transit),
            "evacuation" => Ok(VehicleKind::Evacuation),
            _ => Err(StrategyError::UnknownStrategy {
                kind:     "vehicle",
                name:     s.to_owned(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
