//! Payment code and contribution handlers.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::PixConfig;
use crate::http::request::request_id;
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pix::{self, qr, Amount, DecodedPayload, PaymentRequest, QrOptions};
use crate::registry::{NewDonation, PixDonation};

pub const MAX_DONOR_NAME_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 500;

/// A payment code plus its QR rendering.
#[derive(Debug, Serialize)]
pub struct PixCode {
    pub payload: String,
    pub qr_svg: String,
    pub amount: Option<Amount>,
}

/// Build the code for `amount` from the payee config.
pub fn build_code(pix: &PixConfig, amount: Option<Amount>, txid: Option<&str>) -> ApiResult<PixCode> {
    let mut request = PaymentRequest::new(pix.key.clone(), pix.merchant_name.clone(), pix.merchant_city.clone())
        .with_transaction_id(txid.unwrap_or(&pix.transaction_id));
    request.amount = amount;

    let payload = pix::generate(&request)?;
    let options = QrOptions {
        size: pix.qr_size,
        fg_color: pix.qr_foreground.clone(),
        bg_color: pix.qr_background.clone(),
    };
    let qr_svg = qr::render_svg(&payload, &options)?;

    Ok(PixCode {
        payload,
        qr_svg,
        amount: amount.filter(|a| !a.is_zero()),
    })
}

fn check_cap(amount: Amount, pix: &PixConfig) -> ApiResult<()> {
    if amount.cents() > pix.max_amount_cents {
        let max = Amount::from_cents(pix.max_amount_cents)?;
        return Err(ApiError::Unprocessable(format!("Amount exceeds the maximum of R$ {}", max)));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct PayloadQuery {
    /// Decimal BRL, e.g. `150.50`. Omitted lets the payer choose.
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
}

pub async fn get_payload(
    State(state): State<AppState>,
    Query(query): Query<PayloadQuery>,
) -> ApiResult<Json<PixCode>> {
    let config = state.config();

    let amount = match query.amount.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(raw) => Some(raw.parse::<Amount>()?),
        None => None,
    };
    if let Some(amount) = amount {
        check_cap(amount, &config.pix)?;
    }

    let code = build_code(&config.pix, amount, query.txid.as_deref())?;
    metrics::record_pix_payload("payload");
    Ok(Json(code))
}

#[derive(Debug, Deserialize)]
pub struct ContributionBody {
    pub donor_name: String,
    #[serde(default)]
    pub message: Option<String>,
    pub amount: Amount,
}

#[derive(Debug, Serialize)]
pub struct ContributionReceipt {
    pub donation: PixDonation,
    #[serde(flatten)]
    pub code: PixCode,
}

pub async fn create_contribution(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ContributionBody>,
) -> ApiResult<(StatusCode, Json<ContributionReceipt>)> {
    let config = state.config();

    let donor_name = body.donor_name.trim().to_string();
    if donor_name.is_empty() {
        return Err(ApiError::Unprocessable("Donor name is required".into()));
    }
    if donor_name.chars().count() > MAX_DONOR_NAME_LEN {
        return Err(ApiError::Unprocessable(format!(
            "Donor name is limited to {} characters",
            MAX_DONOR_NAME_LEN
        )));
    }
    let message = body.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
    if message.as_ref().is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN) {
        return Err(ApiError::Unprocessable(format!("Message is limited to {} characters", MAX_MESSAGE_LEN)));
    }
    if body.amount.is_zero() {
        return Err(ApiError::Unprocessable("Amount must be greater than zero".into()));
    }
    check_cap(body.amount, &config.pix)?;

    // Build the code first so a donation is never recorded without one.
    let code = build_code(&config.pix, Some(body.amount), None)?;

    let donation = state
        .backend
        .record_pix_donation(&NewDonation {
            donor_name,
            message,
            amount: body.amount,
        })
        .await?;

    metrics::record_pix_payload("contribution");
    tracing::info!(
        request_id = %request_id(&headers),
        donation_id = donation.id,
        amount = %donation.amount,
        "Contribution recorded"
    );

    Ok((StatusCode::CREATED, Json(ContributionReceipt { donation, code })))
}

#[derive(Debug, Deserialize)]
pub struct DecodeBody {
    pub payload: String,
}

pub async fn decode_payload(Json(body): Json<DecodeBody>) -> ApiResult<Json<DecodedPayload>> {
    Ok(Json(pix::decode(body.payload.trim())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pix_config() -> PixConfig {
        PixConfig {
            key: "casal@example.com".into(),
            merchant_name: "Davi e Larissa".into(),
            merchant_city: "Rio de Janeiro".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_code_uses_config() {
        let code = build_code(&pix_config(), Some(Amount::from_cents(15050).unwrap()), None).unwrap();
        let decoded = pix::decode(&code.payload).unwrap();
        assert_eq!(decoded.key, "casal@example.com");
        assert_eq!(decoded.transaction_id, "CHADECASA2025");
        assert_eq!(decoded.amount.unwrap().cents(), 15050);
        assert!(code.qr_svg.contains("#ea580c"));
    }

    #[test]
    fn test_zero_amount_is_open() {
        let code = build_code(&pix_config(), Some(Amount::from_cents(0).unwrap()), Some("X1")).unwrap();
        assert!(code.amount.is_none());
        let decoded = pix::decode(&code.payload).unwrap();
        assert!(decoded.amount.is_none());
        assert_eq!(decoded.transaction_id, "X1");
    }

    #[test]
    fn test_cap() {
        let config = pix_config();
        assert!(check_cap(Amount::from_cents(100_000_000).unwrap(), &config).is_ok());
        let err = check_cap(Amount::from_cents(100_000_001).unwrap(), &config).unwrap_err();
        assert_eq!(err.to_string(), "Amount exceeds the maximum of R$ 1000000.00");
    }
}
