use serde::{Deserialize, Serialize};

use super::output::{Row, SelectedOutput};
use crate::model::constants::TITRATION_STEPS;
use crate::model::round_to;

pub const BORIC_ACID: &str = "m_B(OH)3(mol/kgw)";
pub const BORATE: &str = "m_B(OH)4-(mol/kgw)";
pub const TRIBORATE: &str = "m_B3O3(OH)4-(mol/kgw)";
pub const TETRABORATE: &str = "m_B4O5(OH)4-2(mol/kgw)";
pub const MAGNESIUM_BORATE: &str = "m_MgB(OH)4+(mol/kgw)";
pub const CALCIUM_BORATE: &str = "m_CaB(OH)4+(mol/kgw)";

const REACTION: &str = "react";

/// Reaction rows that precede the titration: salt dissolution and boric
/// acid addition.
const SETUP_REACTIONS: usize = 2;

/// One NaOH addition of the titration curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitrationPoint {
    pub state: String,
    #[serde(rename = "V_NaOH")]
    pub v_naoh: f64,
    #[serde(rename = "pH")]
    pub ph: Option<f64>,
    #[serde(rename = "B4B3")]
    pub b4b3: f64,
}

/// Ratio of tetrahedral to trigonal boron. Polyborates count once per boron
/// in each coordination.
pub fn borate_ratio(row: &Row) -> f64 {
    let molality = |heading: &str| row.number(heading).unwrap_or(0.0);
    let trigonal = molality(BORIC_ACID);
    let tetrahedral = molality(BORATE);
    let triborate = molality(TRIBORATE);
    let tetraborate = molality(TETRABORATE);
    let mg_borate = molality(MAGNESIUM_BORATE);
    let ca_borate = molality(CALCIUM_BORATE);

    let numerator = tetrahedral + mg_borate + ca_borate + triborate + 2.0 * tetraborate;
    let denominator = trigonal + 2.0 * triborate + 2.0 * tetraborate;
    if denominator > 1e-30 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Maps the engine rows onto NaOH additions. The initial solution and the
/// two setup reactions are skipped; every further reaction row is one step.
pub fn titration_curve(output: &SelectedOutput, naoh_vol: f64) -> Vec<TitrationPoint> {
    let step_ml = naoh_vol / f64::from(TITRATION_STEPS);
    let mut added = 0.0;

    output
        .rows()
        .filter(|row| row.text("state") == Some(REACTION))
        .skip(SETUP_REACTIONS)
        .map(|row| {
            added = round_to(added + step_ml, 8);
            TitrationPoint {
                state: REACTION.to_string(),
                v_naoh: added,
                ph: row.number("pH").map(|ph| round_to(ph, 5)),
                b4b3: round_to(borate_ratio(&row), 7),
            }
        })
        .collect()
}
