//! Domain-level building blocks shared by the HTTP API and the PHREEQC engine
//! crate: environment configuration, the brine/buffer chemistry model, PHREEQC
//! deck rendering and result parsing, and the simulator seam that keeps the
//! engine swappable.

pub mod config;
pub mod model;
pub mod phreeqc;
pub mod services;
pub mod simulator;

pub use model::*;
pub use phreeqc::{InputDeck, OutputError, Row, SelectedOutput, TitrationPoint, Value};
pub use simulator::{
    DatabaseReport, EngineDiagnostics, SimulationError, SimulationResult, Simulator,
};
