use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::constants::weight;
use super::ModelError;

/// Unit the total dissolved solids figure is expressed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum TdsUnit {
    #[default]
    #[serde(rename = "g/L")]
    #[strum(serialize = "g/L")]
    GramsPerLitre,
    #[serde(rename = "g/kgs")]
    #[strum(serialize = "g/kgs")]
    GramsPerKgSolution,
}

/// Kilograms of water in one litre of brine.
pub fn water_mass(density: f64, tds: f64, unit: TdsUnit) -> Result<f64, ModelError> {
    let mass = match unit {
        TdsUnit::GramsPerLitre => (1000.0 * density - tds) / 1000.0,
        TdsUnit::GramsPerKgSolution => (1000.0 * density - tds * density) / 1000.0,
    };
    if mass.is_finite() && mass > 0.0 {
        Ok(mass)
    } else {
        Err(ModelError::NonPositiveWaterMass(mass))
    }
}

/// Converts a mg/L concentration into mmol per kg of water.
pub fn to_mmol_kgw(mg_per_l: f64, molar_mass: f64, water_mass: f64) -> f64 {
    mg_per_l / water_mass / molar_mass
}

/// Brine composition as measured, in mg/L.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IonConcentrations {
    pub na: f64,
    pub k: f64,
    pub li: f64,
    pub mg: f64,
    pub ca: f64,
    /// Sulfate as mg S/L.
    pub so4: f64,
    pub b: f64,
    pub br: f64,
}

impl IonConcentrations {
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields = [
            ("Na", self.na),
            ("K", self.k),
            ("Li", self.li),
            ("Mg", self.mg),
            ("Ca", self.ca),
            ("SO4", self.so4),
            ("B", self.b),
            ("Br", self.br),
        ];
        for (field, value) in fields {
            finite(field, value)?;
            if value < 0.0 {
                return Err(ModelError::Negative { field });
            }
        }
        Ok(())
    }
}

/// NaN and infinities are malformed input, not out-of-range values.
pub(crate) fn finite(field: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }
}

/// Major ion molalities in mmol/kgw; these drive the salt recipe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IonMolalities {
    #[serde(rename = "Na")]
    pub na: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "Li")]
    pub li: f64,
    #[serde(rename = "Mg")]
    pub mg: f64,
    #[serde(rename = "Ca")]
    pub ca: f64,
    #[serde(rename = "SO4")]
    pub so4: f64,
}

impl IonMolalities {
    pub fn from_concentrations(ions: &IonConcentrations, water_mass: f64) -> Self {
        Self {
            na: to_mmol_kgw(ions.na, weight::NA, water_mass),
            k: to_mmol_kgw(ions.k, weight::K, water_mass),
            li: to_mmol_kgw(ions.li, weight::LI, water_mass),
            mg: to_mmol_kgw(ions.mg, weight::MG, water_mass),
            ca: to_mmol_kgw(ions.ca, weight::CA, water_mass),
            so4: to_mmol_kgw(ions.so4, weight::S, water_mass),
        }
    }
}

/// Molalities reported back to the caller, including the minor ions that do
/// not take part in the recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonReport {
    #[serde(rename = "Na")]
    pub na: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "Li")]
    pub li: f64,
    #[serde(rename = "Mg")]
    pub mg: f64,
    #[serde(rename = "Ca")]
    pub ca: f64,
    #[serde(rename = "SO4")]
    pub so4: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "Br")]
    pub br: f64,
}

impl IonReport {
    pub fn new(major: &IonMolalities, ions: &IonConcentrations, water_mass: f64) -> Self {
        Self {
            na: round_to(major.na, 5),
            k: round_to(major.k, 5),
            li: round_to(major.li, 5),
            mg: round_to(major.mg, 5),
            ca: round_to(major.ca, 5),
            so4: round_to(major.so4, 5),
            b: round_to(to_mmol_kgw(ions.b, weight::B, water_mass), 5),
            br: round_to(to_mmol_kgw(ions.br, weight::BR, water_mass), 5),
        }
    }
}

/// Rounds half away from zero to `places` decimals. Exact binary ties go up
/// in magnitude, not to even: `0.125` becomes `0.13`, never `0.12`.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_mass_per_litre() {
        let mass = water_mass(1.3, 350.0, TdsUnit::GramsPerLitre).unwrap();
        assert!((mass - 0.95).abs() < 1e-12);
    }

    #[test]
    fn water_mass_per_kg_solution_scales_tds_by_density() {
        let mass = water_mass(1.2, 300.0, TdsUnit::GramsPerKgSolution).unwrap();
        assert!((mass - 0.84).abs() < 1e-12);
    }

    #[test]
    fn impossible_water_mass_is_rejected() {
        let err = water_mass(1.0, 1000.0, TdsUnit::GramsPerLitre).unwrap_err();
        assert!(matches!(err, ModelError::NonPositiveWaterMass(_)));
        assert!(water_mass(f64::NAN, 1.0, TdsUnit::GramsPerLitre).is_err());
    }

    #[test]
    fn tds_unit_labels() {
        assert_eq!("g/L".parse::<TdsUnit>().unwrap(), TdsUnit::GramsPerLitre);
        assert_eq!(
            "g/kgs".parse::<TdsUnit>().unwrap(),
            TdsUnit::GramsPerKgSolution
        );
        assert!("mg/L".parse::<TdsUnit>().is_err());
        assert_eq!(TdsUnit::GramsPerKgSolution.as_ref(), "g/kgs");
    }

    #[test]
    fn molalities_divide_by_water_then_weight() {
        let ions = IonConcentrations {
            na: 2000.0,
            mg: 20.0,
            so4: 50.0,
            ..Default::default()
        };
        let molal = IonMolalities::from_concentrations(&ions, 0.95);
        assert!((molal.na - 2000.0 / 0.95 / 22.989769).abs() < 1e-9);
        assert!((molal.mg - 20.0 / 0.95 / 24.305).abs() < 1e-9);
        assert!((molal.so4 - 50.0 / 0.95 / 32.02).abs() < 1e-9);
        assert_eq!(molal.k, 0.0);
    }

    #[test]
    fn negative_concentration_names_the_field() {
        let ions = IonConcentrations {
            ca: -1.0,
            ..Default::default()
        };
        assert_eq!(
            ions.validate().unwrap_err(),
            ModelError::Negative { field: "Ca" }
        );
    }

    #[test]
    fn non_finite_concentration_is_not_a_number() {
        let ions = IonConcentrations {
            mg: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            ions.validate().unwrap_err(),
            ModelError::InvalidNumber {
                field: "Mg",
                value: "NaN".to_string()
            }
        );
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(0.0, 3), 0.0);
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(0.5, 0), 1.0);
    }
}
