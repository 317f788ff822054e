//! Event information and RSVP handlers.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::request::request_id;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::registry::Rsvp;

pub const MAX_FULL_NAME_LEN: usize = 120;

#[derive(Debug, Serialize)]
pub struct EventInfo {
    pub title: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub map_url: String,
    /// Suggested contribution amounts in BRL.
    pub pix_presets: Vec<u64>,
    pub pix_max_amount_cents: u64,
}

pub async fn get_event(State(state): State<AppState>) -> Json<EventInfo> {
    let config = state.config();
    let event = &config.event;
    Json(EventInfo {
        title: event.title.clone(),
        date: event.date.clone(),
        time: event.time.clone(),
        address: event.address.clone(),
        map_url: event.map_url.clone(),
        pix_presets: config.pix.presets.clone(),
        pix_max_amount_cents: config.pix.max_amount_cents,
    })
}

#[derive(Debug, Deserialize)]
pub struct RsvpBody {
    pub full_name: String,
}

pub async fn create_rsvp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RsvpBody>,
) -> ApiResult<StatusCode> {
    let full_name = body.full_name.split_whitespace().collect::<Vec<_>>().join(" ");
    if full_name.is_empty() {
        return Err(ApiError::Unprocessable("Full name is required".into()));
    }
    if full_name.chars().count() > MAX_FULL_NAME_LEN {
        return Err(ApiError::Unprocessable(format!("Full name is limited to {} characters", MAX_FULL_NAME_LEN)));
    }

    state.backend.record_rsvp(&Rsvp { full_name }).await?;
    tracing::info!(request_id = %request_id(&headers), "RSVP recorded");
    Ok(StatusCode::CREATED)
}
