//! Brine chemistry shared by the recipe and titration routes: water mass,
//! ion molalities, the salt split and the weigh-out recipe.

pub mod constants;
mod params;
mod recipe;
mod request;
mod solution;

use thiserror::Error;

pub use params::TitrationParams;
pub use recipe::{HydrationChoices, HydrationForm, Recipe, RecipeLine, SaltAmounts, SulfatePath};
pub use request::{BufferRequest, NumericField};
pub use solution::{
    round_to, to_mmol_kgw, water_mass, IonConcentrations, IonMolalities, IonReport, TdsUnit,
};

/// Errors emitted when a request cannot be turned into a valid calculation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{field}` must be greater than zero")]
    NonPositive { field: &'static str },
    #[error("field `{field}` must not be negative")]
    Negative { field: &'static str },
    #[error("unknown TDS unit `{0}` (expected `g/L` or `g/kgs`)")]
    UnknownTdsUnit(String),
    #[error("unknown hydration form `{value}` in `{field}`")]
    UnknownHydration { field: &'static str, value: String },
    #[error("density and TDS leave no water in the brine (water mass {0} kg/L)")]
    NonPositiveWaterMass(f64),
}
