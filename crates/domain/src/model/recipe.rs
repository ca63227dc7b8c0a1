use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::constants::{salt, weight, RECIPE_WATER_GRAMS};
use super::solution::{round_to, IonMolalities};

/// Crystal form a salt is weighed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum HydrationForm {
    Anhydrous,
    Dihydrate,
    Hexahydrate,
    Heptahydrate,
    Decahydrate,
}

impl HydrationForm {
    pub fn is_anhydrous(self) -> bool {
        matches!(self, HydrationForm::Anhydrous)
    }
}

/// Hydration choices for the four salts that come in more than one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationChoices {
    pub mg_cl2: HydrationForm,
    pub ca_cl2: HydrationForm,
    pub mg_so4: HydrationForm,
    pub na2_so4: HydrationForm,
}

impl Default for HydrationChoices {
    fn default() -> Self {
        Self {
            mg_cl2: HydrationForm::Hexahydrate,
            ca_cl2: HydrationForm::Anhydrous,
            mg_so4: HydrationForm::Heptahydrate,
            na2_so4: HydrationForm::Anhydrous,
        }
    }
}

/// Which salt carries the sulfate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SulfatePath {
    MagnesiumSulfate,
    SodiumSulfate,
}

/// Salt amounts in mmol/kgw that reproduce the major ion composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaltAmounts {
    pub path: SulfatePath,
    pub mg_cl2: f64,
    pub ca_cl2: f64,
    pub li_cl: f64,
    pub mg_so4: f64,
    pub na_cl: f64,
    pub k_cl: f64,
    pub na2_so4: f64,
}

impl SaltAmounts {
    /// Sulfate goes with magnesium unless there is more sulfate than
    /// magnesium, in which case it is supplied as sodium sulfate and the
    /// sodium it brings is taken out of the NaCl.
    pub fn from_ions(ions: &IonMolalities) -> Self {
        let path = if ions.so4 > ions.mg {
            SulfatePath::SodiumSulfate
        } else {
            SulfatePath::MagnesiumSulfate
        };
        let sulfate = ions.so4.max(0.0);

        match path {
            SulfatePath::MagnesiumSulfate => Self {
                path,
                mg_cl2: (ions.mg - ions.so4).max(0.0),
                ca_cl2: ions.ca.max(0.0),
                li_cl: ions.li.max(0.0),
                mg_so4: sulfate,
                na_cl: ions.na.max(0.0),
                k_cl: ions.k.max(0.0),
                na2_so4: 0.0,
            },
            SulfatePath::SodiumSulfate => Self {
                path,
                mg_cl2: ions.mg.max(0.0),
                ca_cl2: ions.ca.max(0.0),
                li_cl: ions.li.max(0.0),
                mg_so4: 0.0,
                na_cl: (ions.na - 2.0 * ions.so4).max(0.0),
                k_cl: ions.k.max(0.0),
                na2_so4: sulfate,
            },
        }
    }

    /// Amounts in the order the dissolution reaction lists them.
    pub fn reactants(&self) -> [(&'static str, f64); 7] {
        [
            ("MgCl2", self.mg_cl2),
            ("CaCl2", self.ca_cl2),
            ("LiCl", self.li_cl),
            ("MgSO4", self.mg_so4),
            ("NaCl", self.na_cl),
            ("KCl", self.k_cl),
            ("Na2SO4", self.na2_so4),
        ]
    }
}

/// One weighed component of the recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub mmol: f64,
    pub g: f64,
    pub mw: f64,
    pub form: String,
}

impl RecipeLine {
    fn salt(mmol: f64, molar_mass: f64, form: &str) -> Self {
        Self {
            mmol: round_to(mmol, 4),
            g: round_to(molar_mass * mmol / 1000.0, 4),
            mw: round_to(molar_mass, 3),
            form: form.to_string(),
        }
    }
}

/// Weigh-out sheet for one kilogram of synthetic brine water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "MgCl₂")]
    pub mg_cl2: RecipeLine,
    #[serde(rename = "CaCl₂")]
    pub ca_cl2: RecipeLine,
    #[serde(rename = "LiCl")]
    pub li_cl: RecipeLine,
    #[serde(rename = "MgSO₄")]
    pub mg_so4: RecipeLine,
    #[serde(rename = "NaCl")]
    pub na_cl: RecipeLine,
    #[serde(rename = "KCl")]
    pub k_cl: RecipeLine,
    #[serde(rename = "Na₂SO₄")]
    pub na2_so4: RecipeLine,
    #[serde(rename = "H₂O")]
    pub water: RecipeLine,
}

impl Recipe {
    pub fn build(salts: &SaltAmounts, hydration: &HydrationChoices) -> Self {
        let mg_cl2_mw = pick(hydration.mg_cl2, salt::MGCL2, salt::MGCL2_6H2O);
        let ca_cl2_mw = pick(hydration.ca_cl2, salt::CACL2, salt::CACL2_2H2O);
        let mg_so4_mw = pick(hydration.mg_so4, salt::MGSO4, salt::MGSO4_7H2O);
        let na2_so4_mw = pick(hydration.na2_so4, salt::NA2SO4, salt::NA2SO4_10H2O);

        // Crystal water arrives with the hydrated salts and is withheld from
        // the free water.
        let crystal_water = [
            (hydration.mg_cl2, salts.mg_cl2, 6.0),
            (hydration.ca_cl2, salts.ca_cl2, 2.0),
            (hydration.mg_so4, salts.mg_so4, 7.0),
            (hydration.na2_so4, salts.na2_so4, 10.0),
        ]
        .into_iter()
        .filter(|(form, _, _)| !form.is_anhydrous())
        .map(|(_, mmol, waters)| mmol * waters * weight::H2O / 1000.0)
        .sum::<f64>();
        let water_g = (RECIPE_WATER_GRAMS - crystal_water).max(0.0);

        let anhydrous = HydrationForm::Anhydrous.as_ref();
        Self {
            mg_cl2: RecipeLine::salt(salts.mg_cl2, mg_cl2_mw, hydration.mg_cl2.as_ref()),
            ca_cl2: RecipeLine::salt(salts.ca_cl2, ca_cl2_mw, hydration.ca_cl2.as_ref()),
            li_cl: RecipeLine::salt(salts.li_cl, salt::LICL, anhydrous),
            mg_so4: RecipeLine::salt(salts.mg_so4, mg_so4_mw, hydration.mg_so4.as_ref()),
            na_cl: RecipeLine::salt(salts.na_cl, salt::NACL, anhydrous),
            k_cl: RecipeLine::salt(salts.k_cl, salt::KCL, anhydrous),
            na2_so4: RecipeLine::salt(salts.na2_so4, na2_so4_mw, hydration.na2_so4.as_ref()),
            water: RecipeLine {
                mmol: round_to(water_g / weight::H2O, 2),
                g: round_to(water_g, 2),
                mw: round_to(weight::H2O, 3),
                form: "liquid".to_string(),
            },
        }
    }
}

fn pick(form: HydrationForm, anhydrous: f64, hydrated: f64) -> f64 {
    if form.is_anhydrous() {
        anhydrous
    } else {
        hydrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ions(mg: f64, so4: f64) -> IonMolalities {
        IonMolalities {
            na: 100.0,
            k: 20.0,
            li: 5.0,
            mg,
            ca: 3.0,
            so4,
        }
    }

    #[test]
    fn sulfate_goes_with_magnesium_when_magnesium_covers_it() {
        let salts = SaltAmounts::from_ions(&ions(10.0, 4.0));
        assert_eq!(salts.path, SulfatePath::MagnesiumSulfate);
        assert_eq!(salts.mg_cl2, 6.0);
        assert_eq!(salts.mg_so4, 4.0);
        assert_eq!(salts.na_cl, 100.0);
        assert_eq!(salts.na2_so4, 0.0);
    }

    #[test]
    fn excess_sulfate_switches_to_sodium_sulfate() {
        let salts = SaltAmounts::from_ions(&ions(1.0, 4.0));
        assert_eq!(salts.path, SulfatePath::SodiumSulfate);
        assert_eq!(salts.mg_cl2, 1.0);
        assert_eq!(salts.mg_so4, 0.0);
        assert_eq!(salts.na2_so4, 4.0);
        assert_eq!(salts.na_cl, 92.0);
    }

    #[test]
    fn equal_sulfate_and_magnesium_stays_on_magnesium_path() {
        let salts = SaltAmounts::from_ions(&ions(4.0, 4.0));
        assert_eq!(salts.path, SulfatePath::MagnesiumSulfate);
        assert_eq!(salts.mg_cl2, 0.0);
    }

    #[test]
    fn sodium_chloride_never_goes_negative() {
        let mut molal = ions(0.0, 80.0);
        molal.na = 10.0;
        let salts = SaltAmounts::from_ions(&molal);
        assert_eq!(salts.na_cl, 0.0);
    }

    #[test]
    fn hydrated_salts_withhold_crystal_water() {
        let salts = SaltAmounts::from_ions(&ions(10.0, 4.0));
        let recipe = Recipe::build(&salts, &HydrationChoices::default());

        assert_eq!(recipe.mg_cl2.mw, 203.303);
        assert_eq!(recipe.mg_cl2.form, "Hexahydrate");
        assert_eq!(recipe.mg_so4.mw, 246.473);
        assert_eq!(recipe.ca_cl2.mw, 110.984);
        assert_eq!(recipe.li_cl.form, "Anhydrous");

        let expected_water = 1000.0 - (6.0 * 6.0 + 4.0 * 7.0) * 18.01528 / 1000.0;
        assert_eq!(recipe.water.g, round_to(expected_water, 2));
        assert_eq!(recipe.water.form, "liquid");
        assert_eq!(recipe.water.mw, 18.015);
    }

    #[test]
    fn anhydrous_choices_keep_full_kilogram_of_water() {
        let salts = SaltAmounts::from_ions(&ions(10.0, 4.0));
        let hydration = HydrationChoices {
            mg_cl2: HydrationForm::Anhydrous,
            ca_cl2: HydrationForm::Anhydrous,
            mg_so4: HydrationForm::Anhydrous,
            na2_so4: HydrationForm::Anhydrous,
        };
        let recipe = Recipe::build(&salts, &hydration);
        assert_eq!(recipe.water.g, 1000.0);
        assert_eq!(recipe.water.mmol, round_to(1000.0 / 18.01528, 2));
        assert_eq!(recipe.na_cl.g, round_to(58.44 * 100.0 / 1000.0, 4));
    }

    #[test]
    fn recipe_serializes_with_formula_keys_in_order() {
        let salts = SaltAmounts::from_ions(&ions(10.0, 4.0));
        let recipe = Recipe::build(&salts, &HydrationChoices::default());
        let json = serde_json::to_string(&recipe).unwrap();
        let order = ["MgCl₂", "CaCl₂", "LiCl", "MgSO₄", "NaCl", "KCl", "Na₂SO₄", "H₂O"];
        let positions: Vec<usize> = order
            .iter()
            .map(|key| json.find(&format!("\"{key}\"")).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn hydration_labels_parse() {
        assert_eq!(
            "Heptahydrate".parse::<HydrationForm>().unwrap(),
            HydrationForm::Heptahydrate
        );
        assert!("Monohydrate".parse::<HydrationForm>().is_err());
    }
}
