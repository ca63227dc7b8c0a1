use super::{solution::finite, ModelError};

/// Laboratory titration setup: boric acid spike followed by stepwise NaOH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitrationParams {
    /// H3BO3 stock concentration, mol/L.
    pub h3bo3_conc: f64,
    /// H3BO3 stock volume added, mL.
    pub h3bo3_vol: f64,
    /// Brine sample volume, mL.
    pub sample_vol: f64,
    /// NaOH titrant concentration, mol/L.
    pub naoh_conc: f64,
    /// Total NaOH volume over the titration, mL.
    pub naoh_vol: f64,
    /// Target pH; echoed, the titration curve itself is not cut off at it.
    pub ph: f64,
}

impl TitrationParams {
    pub const DEFAULT_PH: f64 = 8.5;

    pub fn validate(&self) -> Result<(), ModelError> {
        for (field, value) in [
            ("H3BO3_conc", self.h3bo3_conc),
            ("sample_vol", self.sample_vol),
            ("NaOH_conc", self.naoh_conc),
        ] {
            finite(field, value)?;
            if value <= 0.0 {
                return Err(ModelError::NonPositive { field });
            }
        }
        for (field, value) in [("H3BO3_vol", self.h3bo3_vol), ("NaOH_vol", self.naoh_vol)] {
            finite(field, value)?;
            if value < 0.0 {
                return Err(ModelError::Negative { field });
            }
        }
        Ok(())
    }

    /// Kilograms of water in the titrated aliquot.
    pub fn sample_water_kg(&self, water_mass: f64) -> f64 {
        self.sample_vol * water_mass / 1000.0
    }

    /// Boric acid dose in mmol per kg of sample water.
    pub fn boric_acid_mmol_kgw(&self, water_mass: f64) -> f64 {
        self.h3bo3_conc * self.h3bo3_vol / self.sample_water_kg(water_mass)
    }

    /// Total NaOH dose in mmol per kg of sample water.
    pub fn hydroxide_mmol_kgw(&self, water_mass: f64) -> f64 {
        self.naoh_conc * self.naoh_vol / self.sample_water_kg(water_mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TitrationParams {
        TitrationParams {
            h3bo3_conc: 0.4,
            h3bo3_vol: 4.0,
            sample_vol: 50.0,
            naoh_conc: 1.0,
            naoh_vol: 2.0,
            ph: TitrationParams::DEFAULT_PH,
        }
    }

    #[test]
    fn doses_are_normalised_to_sample_water() {
        let p = params();
        let kg = p.sample_water_kg(0.95);
        assert!((kg - 0.0475).abs() < 1e-12);
        assert!((p.boric_acid_mmol_kgw(0.95) - 1.6 / 0.0475).abs() < 1e-9);
        assert!((p.hydroxide_mmol_kgw(0.95) - 2.0 / 0.0475).abs() < 1e-9);
    }

    #[test]
    fn zero_concentration_is_rejected() {
        let mut p = params();
        p.naoh_conc = 0.0;
        assert_eq!(
            p.validate().unwrap_err(),
            ModelError::NonPositive { field: "NaOH_conc" }
        );
    }

    #[test]
    fn zero_volumes_are_allowed() {
        let mut p = params();
        p.h3bo3_vol = 0.0;
        p.naoh_vol = 0.0;
        assert!(p.validate().is_ok());
        p.naoh_vol = -1.0;
        assert_eq!(
            p.validate().unwrap_err(),
            ModelError::Negative { field: "NaOH_vol" }
        );
    }

    #[test]
    fn infinite_volume_is_not_a_number() {
        let mut p = params();
        p.h3bo3_vol = f64::INFINITY;
        assert_eq!(
            p.validate().unwrap_err(),
            ModelError::InvalidNumber {
                field: "H3BO3_vol",
                value: "inf".to_string()
            }
        );
    }
}
