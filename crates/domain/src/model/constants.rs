//! Molar masses and fixed parameters of the buffer recipe.

/// Atomic and molecular weights in g/mol.
pub mod weight {
    pub const NA: f64 = 22.989769;
    pub const K: f64 = 39.0983;
    pub const LI: f64 = 6.941;
    pub const MG: f64 = 24.305;
    pub const CA: f64 = 40.078;
    /// Sulfate concentrations are reported as mg S/L.
    pub const S: f64 = 32.02;
    pub const CL: f64 = 35.453;
    pub const H2O: f64 = 18.01528;
    pub const H: f64 = 1.0;
    pub const B: f64 = 10.811;
    pub const BR: f64 = 79.904;
}

/// Salt molar masses in g/mol.
pub mod salt {
    use super::weight::H2O;

    pub const MGCL2: f64 = 95.211;
    pub const MGCL2_6H2O: f64 = MGCL2 + 6.0 * H2O;
    pub const CACL2: f64 = 110.984;
    pub const CACL2_2H2O: f64 = CACL2 + 2.0 * H2O;
    pub const MGSO4: f64 = 120.366;
    pub const MGSO4_7H2O: f64 = MGSO4 + 7.0 * H2O;
    pub const NA2SO4: f64 = 142.04;
    pub const NA2SO4_10H2O: f64 = 322.2;
    pub const LICL: f64 = 42.394;
    pub const NACL: f64 = 58.44;
    pub const KCL: f64 = 74.55;
}

/// Atmospheric CO2 partial pressure used to equilibrate the starting water.
pub const CO2_PARTIAL_PRESSURE: f64 = 0.000426;

/// Divisor applied to the salt amounts of the dissolution reaction, which is
/// then scaled back up by reacting this many millimoles.
pub const REACTION_SCALE: f64 = 200.0;

/// Moles of water per kilogram, used for the water carried by titrant.
pub const WATER_MOLALITY: f64 = 55.5556;

/// Number of equal NaOH additions in the titration.
pub const TITRATION_STEPS: u32 = 20;

/// Grams of water in the reference kilogram the recipe is expressed for.
pub const RECIPE_WATER_GRAMS: f64 = 1000.0;

pub fn co2_log_partial_pressure() -> f64 {
    CO2_PARTIAL_PRESSURE.log10()
}
