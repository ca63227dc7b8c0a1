use actix_web::{web, HttpResponse};
use buffer_calc_domain::model::round_to;
use buffer_calc_domain::phreeqc::titration_curve;
use buffer_calc_domain::{
    BufferRequest, InputDeck, IonConcentrations, IonMolalities, IonReport, ModelError, Recipe,
    SaltAmounts, TitrationParams, TitrationPoint,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

use super::{record_request, ApiError, Endpoint};

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub recipe: Recipe,
    pub water_mass: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub titration: Vec<TitrationPoint>,
    pub recipe: Recipe,
    pub water_mass: f64,
    pub ion_mmol_kgw: IonReport,
    pub n_steps: u32,
}

/// A request resolved into model values, shared by every route that needs a
/// recipe or a deck.
pub(crate) struct Brine {
    pub water_mass: f64,
    pub ions: IonConcentrations,
    pub molalities: IonMolalities,
    pub salts: SaltAmounts,
    pub recipe: Recipe,
}

impl Brine {
    pub fn resolve(request: &BufferRequest) -> Result<Self, ModelError> {
        let water_mass = request.water_mass()?;
        let ions = request.ions()?;
        let hydration = request.hydration()?;
        let molalities = IonMolalities::from_concentrations(&ions, water_mass);
        let salts = SaltAmounts::from_ions(&molalities);
        let recipe = Recipe::build(&salts, &hydration);
        Ok(Self {
            water_mass,
            ions,
            molalities,
            salts,
            recipe,
        })
    }

    pub fn deck(&self, params: &TitrationParams) -> Result<InputDeck, ModelError> {
        InputDeck::build(&self.salts, params, self.water_mass)
    }
}

/// Weigh-out sheet only; never touches the engine.
pub async fn recipe_handler(
    payload: web::Json<BufferRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = Brine::resolve(&payload).map_err(ApiError::from);
    record_request(Endpoint::Recipe, &result);
    let brine = result?;

    Ok(HttpResponse::Ok().json(RecipeResponse {
        recipe: brine.recipe,
        water_mass: round_to(brine.water_mass, 6),
    }))
}

pub async fn calculate_handler(
    state: web::Data<AppState>,
    payload: web::Json<BufferRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = calculate(&state, &payload).await;
    record_request(Endpoint::Calculate, &result);
    Ok(HttpResponse::Ok().json(result?))
}

async fn calculate(
    state: &AppState,
    request: &BufferRequest,
) -> Result<CalculateResponse, ApiError> {
    let brine = Brine::resolve(request)?;
    let params = request.titration()?;
    let deck = brine.deck(&params)?;

    let output = state.simulate(&deck).await?;
    let titration = titration_curve(&output, params.naoh_vol);
    info!(
        water_mass = brine.water_mass,
        points = titration.len(),
        "buffer titration calculated"
    );

    Ok(CalculateResponse {
        titration,
        ion_mmol_kgw: IonReport::new(&brine.molalities, &brine.ions, brine.water_mass),
        recipe: brine.recipe,
        water_mass: round_to(brine.water_mass, 6),
        n_steps: deck.steps(),
    })
}
