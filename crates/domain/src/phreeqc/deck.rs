use std::fmt::Write as _;
use std::path::Path;

use hex::encode as hex_encode;
use sha3::{Digest, Sha3_256};

use crate::model::constants::{
    co2_log_partial_pressure, REACTION_SCALE, TITRATION_STEPS, WATER_MOLALITY,
};
use crate::model::{ModelError, SaltAmounts, TitrationParams};

const SELECTED_OUTPUT_HEADER: &str = "SELECTED_OUTPUT 1\n";

/// PHREEQC input for one buffer titration: dissolve the salts into CO2
/// equilibrated water, spike boric acid, then titrate with NaOH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeck {
    text: String,
    steps: u32,
}

impl InputDeck {
    pub fn build(
        salts: &SaltAmounts,
        params: &TitrationParams,
        water_mass: f64,
    ) -> Result<Self, ModelError> {
        if !water_mass.is_finite() || water_mass <= 0.0 {
            return Err(ModelError::NonPositiveWaterMass(water_mass));
        }
        params.validate()?;

        let boric_acid = params.boric_acid_mmol_kgw(water_mass);
        let hydroxide = params.hydroxide_mmol_kgw(water_mass);
        let boric_acid_water = WATER_MOLALITY / params.h3bo3_conc;
        let hydroxide_water = WATER_MOLALITY / params.naoh_conc;
        let steps = TITRATION_STEPS;

        let mut text = String::with_capacity(1024);
        text.push_str(SELECTED_OUTPUT_HEADER);
        text.push_str("-molalities\tB(OH)3  B(OH)4- \n");
        text.push_str("\tB3O3(OH)4-  B4O5(OH)4-2  MgB(OH)4+  CaB(OH)4+\n");
        text.push_str("-ionic_strength       \ttrue\n");
        text.push_str("-pH\ttrue\n");
        text.push_str("-user_punch\ttrue\n");
        text.push_str("-water\ttrue\n");
        text.push_str("-alkalinity\ttrue\n");
        text.push_str("USER_PUNCH \t1\n");
        text.push_str("-headings \tVolume Density\n");
        text.push_str("-start\n");
        text.push_str("10\tPUNCH SOLN_VOL\n");
        text.push_str("20\tPUNCH RHO\n");
        text.push_str("30\tEND\n");

        text.push_str("SOLUTION\t1\n");
        text.push_str("\ttemp\t20\n");
        text.push_str("\tpH\t7\n");
        text.push_str("\tpe\t4\n");
        text.push_str("\tredox\tpe\n");
        text.push_str("\tunits\tmol/l\n");
        let _ = writeln!(text, "\tC(4)\t1\tCO2(g)\t{:.9}", co2_log_partial_pressure());
        text.push_str("\t-water\t1\t#\tkg\n");
        text.push('\n');

        text.push_str("REACTION\t1\n");
        for (name, mmol) in salts.reactants() {
            let _ = writeln!(text, "\t{name}\t{:.9}", mmol / REACTION_SCALE);
        }
        text.push('\n');
        let _ = writeln!(text, "\t{REACTION_SCALE}\tmillimoles\tin \t1\tsteps");
        text.push_str("SAVE\tSolution\t1\n");
        text.push_str("END\n");
        text.push_str("USE\tSolution\t1\n");
        text.push('\n');

        text.push_str("REACTION\t2\n");
        text.push_str("\tH3BO3\t1\n");
        let _ = writeln!(text, "\tH2O\t{boric_acid_water:.3}");
        let _ = writeln!(text, "\t{boric_acid:.8}\tmillimoles\tin \t1\tsteps");
        text.push('\n');
        text.push_str("SAVE\tSolution\t1\n");
        text.push_str("END\n");
        text.push_str("USE\tSolution\t1\n");
        text.push('\n');

        text.push_str("REACTION\t2\n");
        text.push_str("\tNaOH\t1\n");
        let _ = writeln!(text, "\tH2O\t{hydroxide_water:.4}");
        let _ = writeln!(text, "\t{hydroxide:.8}\tmillimoles\tin \t{steps}\tsteps");
        text.push('\n');

        Ok(Self { text, steps })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of NaOH additions the deck titrates in.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// SHA3-256 of the deck text; identical decks produce identical results.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update(self.text.as_bytes());
        hex_encode(hasher.finalize())
    }

    /// The deck with its selected output redirected to `path`, for engines
    /// that write results to disk instead of keeping them in memory.
    pub fn with_selected_output_file(&self, path: &Path) -> String {
        let directive = format!("-file\t{}\n", path.display());
        match self.text.strip_prefix(SELECTED_OUTPUT_HEADER) {
            Some(rest) => format!("{SELECTED_OUTPUT_HEADER}{directive}{rest}"),
            None => self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IonMolalities, SaltAmounts, SulfatePath};

    fn salts() -> SaltAmounts {
        SaltAmounts::from_ions(&IonMolalities {
            na: 91.56,
            k: 134.61,
            li: 75.83,
            mg: 0.866,
            ca: 6.566,
            so4: 1.644,
        })
    }

    fn params() -> TitrationParams {
        TitrationParams {
            h3bo3_conc: 0.4,
            h3bo3_vol: 4.0,
            sample_vol: 50.0,
            naoh_conc: 1.0,
            naoh_vol: 2.0,
            ph: 8.5,
        }
    }

    #[test]
    fn renders_reactions_in_order() {
        let deck = InputDeck::build(&salts(), &params(), 0.95).unwrap();
        let text = deck.text();
        assert!(text.starts_with("SELECTED_OUTPUT 1\n-molalities\tB(OH)3  B(OH)4- \n"));
        assert!(text.contains("\tC(4)\t1\tCO2(g)\t-3.370590401\n"));

        let order = ["\tMgCl2\t", "\tCaCl2\t", "\tLiCl\t", "\tMgSO4\t", "\tNaCl\t", "\tKCl\t", "\tNa2SO4\t"];
        let positions: Vec<usize> = order.iter().map(|n| text.find(n).unwrap()).collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));

        assert!(text.contains("\t200\tmillimoles\tin \t1\tsteps\n"));
        assert!(text.contains("\tH2O\t138.889\n"));
        assert!(text.contains("\tH2O\t55.5556\n"));
        assert!(text.contains(&format!("\t{:.8}\tmillimoles\tin \t1\tsteps\n", 1.6 / 0.0475)));
        assert!(text.contains(&format!("\t{:.8}\tmillimoles\tin \t20\tsteps\n", 2.0 / 0.0475)));
        assert_eq!(text.matches("REACTION\t2\n").count(), 2);
        assert_eq!(deck.steps(), 20);
    }

    #[test]
    fn renders_complete_deck() {
        let salts = SaltAmounts {
            path: SulfatePath::SodiumSulfate,
            mg_cl2: 1.0,
            ca_cl2: 6.5,
            li_cl: 75.0,
            mg_so4: 0.0,
            na_cl: 90.0,
            k_cl: 134.0,
            na2_so4: 1.5,
        };
        let deck = InputDeck::build(&salts, &params(), 0.95).unwrap();
        let expected = "SELECTED_OUTPUT 1\n\
-molalities\tB(OH)3  B(OH)4- \n\
\tB3O3(OH)4-  B4O5(OH)4-2  MgB(OH)4+  CaB(OH)4+\n\
-ionic_strength       \ttrue\n\
-pH\ttrue\n\
-user_punch\ttrue\n\
-water\ttrue\n\
-alkalinity\ttrue\n\
USER_PUNCH \t1\n\
-headings \tVolume Density\n\
-start\n\
10\tPUNCH SOLN_VOL\n\
20\tPUNCH RHO\n\
30\tEND\n\
SOLUTION\t1\n\
\ttemp\t20\n\
\tpH\t7\n\
\tpe\t4\n\
\tredox\tpe\n\
\tunits\tmol/l\n\
\tC(4)\t1\tCO2(g)\t-3.370590401\n\
\t-water\t1\t#\tkg\n\
\n\
REACTION\t1\n\
\tMgCl2\t0.005000000\n\
\tCaCl2\t0.032500000\n\
\tLiCl\t0.375000000\n\
\tMgSO4\t0.000000000\n\
\tNaCl\t0.450000000\n\
\tKCl\t0.670000000\n\
\tNa2SO4\t0.007500000\n\
\n\
\t200\tmillimoles\tin \t1\tsteps\n\
SAVE\tSolution\t1\n\
END\n\
USE\tSolution\t1\n\
\n\
REACTION\t2\n\
\tH3BO3\t1\n\
\tH2O\t138.889\n\
\t33.68421053\tmillimoles\tin \t1\tsteps\n\
\n\
SAVE\tSolution\t1\n\
END\n\
USE\tSolution\t1\n\
\n\
REACTION\t2\n\
\tNaOH\t1\n\
\tH2O\t55.5556\n\
\t42.10526316\tmillimoles\tin \t20\tsteps\n\
\n";
        assert_eq!(deck.text(), expected);
    }

    #[test]
    fn salt_coefficients_are_scaled_down() {
        let s = salts();
        let deck = InputDeck::build(&s, &params(), 0.95).unwrap();
        assert!(deck
            .text()
            .contains(&format!("\tKCl\t{:.9}\n", s.k_cl / 200.0)));
        // Excess sulfate over magnesium routes it through sodium sulfate.
        assert!(deck.text().contains("\tMgSO4\t0.000000000\n"));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = InputDeck::build(&salts(), &params(), 0.95).unwrap();
        let b = InputDeck::build(&salts(), &params(), 0.95).unwrap();
        let mut other = params();
        other.naoh_vol = 3.0;
        let c = InputDeck::build(&salts(), &other, 0.95).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn output_file_directive_follows_header() {
        let deck = InputDeck::build(&salts(), &params(), 0.95).unwrap();
        let text = deck.with_selected_output_file(Path::new("/tmp/run/selected.sel"));
        assert!(text.starts_with("SELECTED_OUTPUT 1\n-file\t/tmp/run/selected.sel\n-molalities"));
        assert_eq!(text.len(), deck.text().len() + "-file\t/tmp/run/selected.sel\n".len());
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(matches!(
            InputDeck::build(&salts(), &params(), 0.0),
            Err(ModelError::NonPositiveWaterMass(_))
        ));
        let mut p = params();
        p.sample_vol = 0.0;
        assert_eq!(
            InputDeck::build(&salts(), &p, 0.95).unwrap_err(),
            ModelError::NonPositive { field: "sample_vol" }
        );
    }
}
