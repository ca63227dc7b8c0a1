//! Wire shape of calculation requests. The web form posts every field as a
//! string, scripted clients post numbers; both are accepted and validated here
//! so the handlers only ever see typed model values.

use serde::{Deserialize, Serialize};

use super::params::TitrationParams;
use super::recipe::{HydrationChoices, HydrationForm};
use super::solution::{water_mass, IonConcentrations, TdsUnit};
use super::ModelError;

/// A numeric field as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn parse(&self, field: &'static str) -> Result<Option<f64>, ModelError> {
        match self {
            NumericField::Number(value) => Ok(Some(*value)),
            NumericField::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                match trimmed.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(Some(value)),
                    _ => Err(ModelError::InvalidNumber {
                        field,
                        value: trimmed.to_string(),
                    }),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferRequest {
    #[serde(rename = "Na", default)]
    pub na: Option<NumericField>,
    #[serde(rename = "K", default)]
    pub k: Option<NumericField>,
    #[serde(rename = "Li", default)]
    pub li: Option<NumericField>,
    #[serde(rename = "Mg", default)]
    pub mg: Option<NumericField>,
    #[serde(rename = "Ca", default)]
    pub ca: Option<NumericField>,
    #[serde(rename = "SO4", default)]
    pub so4: Option<NumericField>,
    #[serde(rename = "B", default)]
    pub b: Option<NumericField>,
    #[serde(rename = "Br", default)]
    pub br: Option<NumericField>,
    #[serde(default)]
    pub density: Option<NumericField>,
    #[serde(default)]
    pub tds: Option<NumericField>,
    #[serde(default)]
    pub tds_unit: Option<String>,
    #[serde(rename = "H3BO3_conc", default)]
    pub h3bo3_conc: Option<NumericField>,
    #[serde(rename = "H3BO3_vol", default)]
    pub h3bo3_vol: Option<NumericField>,
    #[serde(default)]
    pub sample_vol: Option<NumericField>,
    #[serde(rename = "NaOH_conc", default)]
    pub naoh_conc: Option<NumericField>,
    #[serde(rename = "NaOH_vol", default)]
    pub naoh_vol: Option<NumericField>,
    #[serde(rename = "pH", default)]
    pub ph: Option<NumericField>,
    #[serde(rename = "hyd_MgCl2", default)]
    pub hyd_mg_cl2: Option<String>,
    #[serde(rename = "hyd_CaCl2", default)]
    pub hyd_ca_cl2: Option<String>,
    #[serde(rename = "hyd_MgSO4", default)]
    pub hyd_mg_so4: Option<String>,
    #[serde(rename = "hyd_Na2SO4", default)]
    pub hyd_na2_so4: Option<String>,
}

impl BufferRequest {
    /// The reference brine used by the preview routes.
    pub fn sample() -> Self {
        Self {
            na: number(2000.0),
            k: number(5000.0),
            li: number(500.0),
            mg: number(20.0),
            ca: number(250.0),
            so4: number(50.0),
            b: None,
            br: None,
            density: number(1.3),
            tds: number(350.0),
            tds_unit: Some(TdsUnit::GramsPerLitre.to_string()),
            h3bo3_conc: number(0.4),
            h3bo3_vol: number(4.0),
            sample_vol: number(50.0),
            naoh_conc: number(1.0),
            naoh_vol: number(2.0),
            ph: None,
            hyd_mg_cl2: Some(HydrationForm::Hexahydrate.to_string()),
            hyd_ca_cl2: Some(HydrationForm::Anhydrous.to_string()),
            hyd_mg_so4: Some(HydrationForm::Heptahydrate.to_string()),
            hyd_na2_so4: Some(HydrationForm::Anhydrous.to_string()),
        }
    }

    /// Fills every field the caller left out with the sample brine's value.
    pub fn or_sample(self) -> Self {
        let sample = Self::sample();
        Self {
            na: self.na.or(sample.na),
            k: self.k.or(sample.k),
            li: self.li.or(sample.li),
            mg: self.mg.or(sample.mg),
            ca: self.ca.or(sample.ca),
            so4: self.so4.or(sample.so4),
            b: self.b.or(sample.b),
            br: self.br.or(sample.br),
            density: self.density.or(sample.density),
            tds: self.tds.or(sample.tds),
            tds_unit: self.tds_unit.or(sample.tds_unit),
            h3bo3_conc: self.h3bo3_conc.or(sample.h3bo3_conc),
            h3bo3_vol: self.h3bo3_vol.or(sample.h3bo3_vol),
            sample_vol: self.sample_vol.or(sample.sample_vol),
            naoh_conc: self.naoh_conc.or(sample.naoh_conc),
            naoh_vol: self.naoh_vol.or(sample.naoh_vol),
            ph: self.ph.or(sample.ph),
            hyd_mg_cl2: self.hyd_mg_cl2.or(sample.hyd_mg_cl2),
            hyd_ca_cl2: self.hyd_ca_cl2.or(sample.hyd_ca_cl2),
            hyd_mg_so4: self.hyd_mg_so4.or(sample.hyd_mg_so4),
            hyd_na2_so4: self.hyd_na2_so4.or(sample.hyd_na2_so4),
        }
    }

    pub fn water_mass(&self) -> Result<f64, ModelError> {
        let density = required("density", &self.density)?;
        let tds = required("tds", &self.tds)?;
        let unit = self
            .tds_unit
            .as_deref()
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .ok_or(ModelError::MissingField("tds_unit"))?;
        let unit = unit
            .parse::<TdsUnit>()
            .map_err(|_| ModelError::UnknownTdsUnit(unit.to_string()))?;
        water_mass(density, tds, unit)
    }

    pub fn ions(&self) -> Result<IonConcentrations, ModelError> {
        let ions = IonConcentrations {
            na: required("Na", &self.na)?,
            k: required("K", &self.k)?,
            li: required("Li", &self.li)?,
            mg: required("Mg", &self.mg)?,
            ca: required("Ca", &self.ca)?,
            so4: required("SO4", &self.so4)?,
            b: optional("B", &self.b)?.unwrap_or(0.0),
            br: optional("Br", &self.br)?.unwrap_or(0.0),
        };
        ions.validate()?;
        Ok(ions)
    }

    pub fn hydration(&self) -> Result<HydrationChoices, ModelError> {
        let defaults = HydrationChoices::default();
        Ok(HydrationChoices {
            mg_cl2: hydration("hyd_MgCl2", &self.hyd_mg_cl2, defaults.mg_cl2)?,
            ca_cl2: hydration("hyd_CaCl2", &self.hyd_ca_cl2, defaults.ca_cl2)?,
            mg_so4: hydration("hyd_MgSO4", &self.hyd_mg_so4, defaults.mg_so4)?,
            na2_so4: hydration("hyd_Na2SO4", &self.hyd_na2_so4, defaults.na2_so4)?,
        })
    }

    pub fn titration(&self) -> Result<TitrationParams, ModelError> {
        let params = TitrationParams {
            h3bo3_conc: required("H3BO3_conc", &self.h3bo3_conc)?,
            h3bo3_vol: required("H3BO3_vol", &self.h3bo3_vol)?,
            sample_vol: required("sample_vol", &self.sample_vol)?,
            naoh_conc: required("NaOH_conc", &self.naoh_conc)?,
            naoh_vol: required("NaOH_vol", &self.naoh_vol)?,
            ph: optional("pH", &self.ph)?.unwrap_or(TitrationParams::DEFAULT_PH),
        };
        params.validate()?;
        Ok(params)
    }
}

fn number(value: f64) -> Option<NumericField> {
    Some(NumericField::Number(value))
}

fn optional(field: &'static str, raw: &Option<NumericField>) -> Result<Option<f64>, ModelError> {
    match raw {
        Some(value) => value.parse(field),
        None => Ok(None),
    }
}

fn required(field: &'static str, raw: &Option<NumericField>) -> Result<f64, ModelError> {
    optional(field, raw)?.ok_or(ModelError::MissingField(field))
}

fn hydration(
    field: &'static str,
    raw: &Option<String>,
    default: HydrationForm,
) -> Result<HydrationForm, ModelError> {
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(label) => label
            .parse::<HydrationForm>()
            .map_err(|_| ModelError::UnknownHydration {
                field,
                value: label.to_string(),
            }),
        None => Ok(default),
    }
}
