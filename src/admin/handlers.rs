//! Admin API handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::request::request_id;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::registry::{
    select, DonationStatus, Gift, GiftId, GiftStatusUpdate, GiftUpsert, PixDonation, PriceFilter,
    SortOrder,
};
use crate::registry::types::DonationId;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub backend: &'static str,
    pub gifts: usize,
    pub units_reserved: u64,
    pub units_available: u64,
    pub donations_pending: usize,
    pub donations_confirmed: usize,
    /// Sum of confirmed contributions, in cents.
    pub confirmed_total_cents: u64,
}

#[derive(Serialize)]
pub struct Applied {
    pub success: bool,
}

fn admin_secret(state: &AppState) -> String {
    state.config().backend.admin_secret.clone()
}

pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<SystemStatus>> {
    let gifts = state.backend.list_gifts().await?;
    let donations = state.backend.admin_get_pix_donations(&admin_secret(&state)).await?;

    let confirmed: Vec<&PixDonation> = donations
        .iter()
        .filter(|d| d.status == DonationStatus::Confirmed)
        .collect();
    let confirmed_cents = confirmed.iter().fold(0u64, |total, d| total.saturating_add(d.amount.cents()));

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        backend: state.backend.name(),
        gifts: gifts.len(),
        units_reserved: gifts.iter().map(|g| u64::from(g.current_quantity)).sum(),
        units_available: gifts.iter().map(|g| u64::from(g.remaining())).sum(),
        donations_pending: donations.iter().filter(|d| d.status == DonationStatus::Pending).count(),
        donations_confirmed: confirmed.len(),
        confirmed_total_cents: confirmed_cents,
    }))
}

pub async fn list_gifts(State(state): State<AppState>) -> ApiResult<Json<Vec<Gift>>> {
    let gifts = state.backend.list_gifts().await?;
    Ok(Json(select(gifts, PriceFilter::All, SortOrder::Id)))
}

pub async fn upsert_gift(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GiftUpsert>,
) -> ApiResult<(StatusCode, Json<Applied>)> {
    let gift = body.normalized()?;
    let creating = gift.id.is_none();

    if !state.backend.admin_upsert_gift(&gift, &admin_secret(&state)).await? {
        return Err(match gift.id {
            Some(id) => ApiError::NotFound(format!("Gift {} not found", id)),
            None => ApiError::Conflict("Gift could not be created".into()),
        });
    }

    tracing::info!(request_id = %request_id(&headers), gift_id = ?gift.id, name = %gift.name, "Gift saved");
    let status = if creating { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(Applied { success: true })))
}

pub async fn delete_gift(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let gift = state.backend.get_gift(id).await?;
    if gift.current_quantity > 0 {
        return Err(ApiError::Conflict(
            "Gift is reserved; clear the reservation before deleting it".into(),
        ));
    }

    if !state.backend.admin_delete_gift(id, &admin_secret(&state)).await? {
        return Err(ApiError::Conflict("Gift could not be deleted".into()));
    }
    tracing::info!(request_id = %request_id(&headers), gift_id = id, "Gift deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_reservation(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
    headers: HeaderMap,
) -> ApiResult<Json<Applied>> {
    if !state.backend.admin_clear_reservation(id, &admin_secret(&state)).await? {
        return Err(ApiError::NotFound(format!("Gift {} not found", id)));
    }
    tracing::info!(request_id = %request_id(&headers), gift_id = id, "Reservation cleared");
    Ok(Json(Applied { success: true }))
}

pub async fn update_gift_status(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
    Json(mut body): Json<GiftStatusUpdate>,
) -> ApiResult<Json<Applied>> {
    let gift = state.backend.get_gift(id).await?;
    if body.current_quantity > gift.max_quantity {
        return Err(ApiError::Unprocessable(format!(
            "current_quantity {} exceeds max_quantity {}",
            body.current_quantity, gift.max_quantity
        )));
    }
    body.reserved_by = body
        .reserved_by
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty() && body.current_quantity > 0);

    if !state.backend.admin_update_gift_status(id, &body, &admin_secret(&state)).await? {
        return Err(ApiError::Conflict(format!("Gift {} status was not updated", id)));
    }
    Ok(Json(Applied { success: true }))
}

pub async fn list_donations(State(state): State<AppState>) -> ApiResult<Json<Vec<PixDonation>>> {
    let donations = state.backend.admin_get_pix_donations(&admin_secret(&state)).await?;
    Ok(Json(donations))
}

#[derive(Debug, Deserialize)]
pub struct DonationStatusBody {
    pub status: DonationStatus,
}

pub async fn update_donation_status(
    State(state): State<AppState>,
    Path(id): Path<DonationId>,
    headers: HeaderMap,
    Json(body): Json<DonationStatusBody>,
) -> ApiResult<Json<Applied>> {
    if !state
        .backend
        .admin_update_pix_status(id, body.status, &admin_secret(&state))
        .await?
    {
        return Err(ApiError::NotFound(format!("Donation {} not found", id)));
    }
    tracing::info!(request_id = %request_id(&headers), donation_id = id, status = %body.status, "Donation status updated");
    Ok(Json(Applied { success: true }))
}
