//! Guest catalog and reservation handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::request::request_id;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::registry::types::CATEGORIES;
use crate::registry::{
    select, DeliveryMethod, GiftId, PriceFilter, PublicGift, ReservationRequest, SortOrder,
};

/// Longest first or last name accepted on a reservation.
pub const MAX_NAME_PART_LEN: usize = 60;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: PriceFilter,
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn list_gifts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<PublicGift>>> {
    let gifts = state.backend.list_gifts().await?;
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let listed = select(gifts, query.filter, SortOrder::Name)
        .iter()
        .filter(|g| category.is_none() || g.category.as_deref() == category)
        .map(PublicGift::from)
        .collect();
    Ok(Json(listed))
}

pub async fn get_gift(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
) -> ApiResult<Json<PublicGift>> {
    let gift = state.backend.get_gift(id).await?;
    Ok(Json(PublicGift::from(&gift)))
}

pub async fn list_categories() -> Json<&'static [&'static str]> {
    Json(CATEGORIES)
}

#[derive(Debug, Deserialize)]
pub struct ReservationBody {
    pub first_name: String,
    pub last_name: String,
    pub delivery_method: DeliveryMethod,
    /// Required when the gift carries a warning.
    #[serde(default)]
    pub acknowledge_warning: bool,
}

impl ReservationBody {
    /// `"{first} {last}"` after trimming both parts.
    pub fn guest_name(&self) -> ApiResult<String> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            return Err(ApiError::Unprocessable("First and last name are required".into()));
        }
        if first.chars().count() > MAX_NAME_PART_LEN || last.chars().count() > MAX_NAME_PART_LEN {
            return Err(ApiError::Unprocessable(format!(
                "Names are limited to {} characters",
                MAX_NAME_PART_LEN
            )));
        }
        Ok(format!("{} {}", first, last))
    }
}

/// What the guest keeps after reserving.
#[derive(Debug, Serialize)]
pub struct ReservationReceipt {
    pub gift_id: GiftId,
    pub gift_name: String,
    pub guest_name: String,
    /// Needed to cancel this reservation later.
    pub pin: String,
    pub delivery_method: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
}

/// Six random digits.
pub fn generate_pin() -> String {
    format!("{:06}", fastrand::u32(0..1_000_000))
}

pub async fn reserve_gift(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
    headers: HeaderMap,
    Json(body): Json<ReservationBody>,
) -> ApiResult<(StatusCode, Json<ReservationReceipt>)> {
    let guest_name = body.guest_name()?;
    let gift = state.backend.get_gift(id).await?;

    if gift.has_warning() && !body.acknowledge_warning {
        let title = gift.warning_title.as_deref().unwrap_or_default();
        return Err(ApiError::Unprocessable(format!(
            "This gift has a warning that must be acknowledged: {}",
            title
        )));
    }
    if gift.is_sold_out() {
        metrics::record_reservation("taken");
        return Err(ApiError::Conflict("This gift is no longer available".into()));
    }

    let request = ReservationRequest {
        gift_id: id,
        guest_name: guest_name.clone(),
        pin: generate_pin(),
        delivery_method: body.delivery_method,
    };

    let applied = match state.backend.reserve_gift(&request).await {
        Ok(applied) => applied,
        Err(e) => {
            metrics::record_reservation("error");
            return Err(e.into());
        }
    };
    if !applied {
        metrics::record_reservation("taken");
        return Err(ApiError::Conflict("Someone just reserved this gift".into()));
    }

    metrics::record_reservation("reserved");
    tracing::info!(
        request_id = %request_id(&headers),
        gift_id = id,
        delivery = body.delivery_method.as_str(),
        "Gift reserved"
    );

    let shipping_address = match body.delivery_method {
        DeliveryMethod::Ship => Some(state.config().event.shipping_address.clone()).filter(|a| !a.is_empty()),
        DeliveryMethod::Hand => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(ReservationReceipt {
            gift_id: id,
            gift_name: gift.name,
            guest_name,
            pin: request.pin,
            delivery_method: body.delivery_method,
            shipping_address,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub pin: String,
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<GiftId>,
    headers: HeaderMap,
    Json(body): Json<CancelBody>,
) -> ApiResult<StatusCode> {
    let pin = body.pin.trim();
    if pin.is_empty() {
        return Err(ApiError::Unprocessable("PIN is required".into()));
    }

    if state.backend.cancel_reservation(id, pin).await? {
        metrics::record_reservation("cancelled");
        tracing::info!(request_id = %request_id(&headers), gift_id = id, "Reservation cancelled");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("No reservation matches this PIN".into()))
    }
}
