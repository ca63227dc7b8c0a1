//! Validation aids: the deck the engine would receive and the raw table it
//! returns, for the sample brine unless the query overrides fields.

use actix_web::{web, HttpResponse};
use buffer_calc_domain::{BufferRequest, InputDeck, Value};
use serde::Serialize;

use crate::state::AppState;

use super::{calculate::Brine, record_request, ApiError, Endpoint};

#[derive(Debug, Serialize)]
pub struct RawOutput<'a> {
    pub headers: &'a [String],
    pub rows: &'a [Vec<Value>],
}

fn sample_deck(query: BufferRequest) -> Result<(f64, InputDeck), ApiError> {
    let request = query.or_sample();
    let brine = Brine::resolve(&request)?;
    let deck = brine.deck(&request.titration()?)?;
    Ok((brine.water_mass, deck))
}

pub async fn show_input_handler(
    query: web::Query<BufferRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = sample_deck(query.into_inner());
    record_request(Endpoint::ShowInput, &result);
    let (water_mass, deck) = result?;

    let body = format!(
        "# water_mass = {water_mass:.6} kgw/L\n# n_steps = {}\n{}",
        deck.steps(),
        deck.text()
    );
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(body))
}

pub async fn show_output_handler(
    state: web::Data<AppState>,
    query: web::Query<BufferRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = match sample_deck(query.into_inner()) {
        Ok((_, deck)) => state.simulate(&deck).await.map_err(ApiError::from),
        Err(err) => Err(err),
    };
    record_request(Endpoint::ShowOutput, &result);
    let output = result?;

    Ok(HttpResponse::Ok().json(RawOutput {
        headers: output.headers(),
        rows: output.cells(),
    }))
}
