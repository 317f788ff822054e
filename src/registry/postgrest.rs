//! Registry backend on the hosted database's PostgREST endpoint.
//!
//! # Responsibilities
//! - Read the `gifts` table and insert into `pix_donations` / `rsvps`
//! - Invoke the stored procedures under `/rest/v1/rpc/{name}`
//! - Map HTTP failures onto `RegistryError` and loose rows onto typed records
//!
//! # Design Decisions
//! - Every call runs under `backend.request_timeout_secs`
//! - Table reads and the donation listing are retried on transient errors;
//!   procedures and inserts run exactly once
//! - The stored procedures own reservation atomicity; a `false` answer means
//!   the procedure did not apply

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Instant;
use url::Url;

use crate::config::{BackendConfig, RetryConfig};
use crate::observability::metrics;
use crate::registry::backend::RegistryBackend;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::types::*;
use crate::resilience::retries::retry_read;
use crate::resilience::timeouts::with_deadline;

/// Registry backend talking to PostgREST over HTTP.
#[derive(Clone)]
pub struct PostgrestBackend {
    client: Client,
    rest_url: String,
    anon_key: String,
    timeout_secs: u64,
    retries: RetryConfig,
}

impl PostgrestBackend {
    pub fn new(config: &BackendConfig) -> RegistryResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| RegistryError::Validation(format!("backend url '{}': {}", config.url, e)))?;

        Ok(Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", base.as_str().trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            timeout_secs: config.request_timeout_secs,
            retries: config.retries.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Send one request under the deadline and decode its JSON body.
    /// Empty bodies decode to `Value::Null`.
    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> RegistryResult<Value> {
        let start = Instant::now();
        let result = with_deadline(self.timeout_secs, async {
            let response = builder
                .send()
                .await
                .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
            decode_response(operation, status, &body)
        })
        .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_transient() => "unavailable",
            Err(_) => "error",
        };
        metrics::record_backend_call(operation, outcome, start);
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Backend call failed");
        }
        result
    }

    async fn rpc(&self, name: &'static str, args: Value) -> RegistryResult<Value> {
        let builder = self.request(Method::POST, &format!("rpc/{}", name)).json(&args);
        self.send(name, builder).await
    }

    async fn procedure(&self, name: &'static str, args: Value) -> RegistryResult<bool> {
        let value = self.rpc(name, args).await?;
        procedure_outcome(value)
    }

    /// Call a procedure whose answer is a boolean; anything else did not apply.
    async fn boolean_procedure(&self, name: &'static str, args: Value) -> RegistryResult<bool> {
        let value = self.rpc(name, args).await?;
        boolean_outcome(name, value)
    }

    /// Read `gifts` rows matching `filter`, retrying transient failures.
    async fn fetch_gifts(&self, operation: &'static str, filter: &[(&str, String)]) -> RegistryResult<Value> {
        retry_read(&self.retries, operation, || {
            let builder = self
                .request(Method::GET, "gifts")
                .query(&[("select", "*")])
                .query(filter);
            self.send(operation, builder)
        })
        .await
    }
}

fn decode_response(operation: &'static str, status: StatusCode, body: &str) -> RegistryResult<Value> {
    if status.is_server_error() {
        return Err(RegistryError::Unavailable(format!("{} answered {}", operation, status)));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RegistryError::Unauthorized);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RegistryError::Unavailable(format!("{} throttled", operation)));
    }
    if !status.is_success() {
        return Err(RegistryError::Rejected(error_message(body).unwrap_or_else(|| status.to_string())));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| RegistryError::InvalidRecord {
        entity: "response",
        reason: format!("{} returned invalid JSON: {}", operation, e),
    })
}

/// PostgREST error bodies carry `message`, sometimes with `details`/`hint`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Interpret a procedure's return value.
///
/// Booleans are the answer. `null` (void procedures) means applied. A
/// non-empty string is an error message. Objects may carry `success` and
/// `error`.
fn procedure_outcome(value: Value) -> RegistryResult<bool> {
    match value {
        Value::Bool(applied) => Ok(applied),
        Value::Null => Ok(true),
        Value::String(message) if message.trim().is_empty() => Ok(true),
        Value::String(message) => Err(RegistryError::Rejected(message)),
        Value::Object(map) => {
            let error = map.get("error").and_then(Value::as_str).filter(|e| !e.is_empty());
            match (map.get("success").and_then(Value::as_bool), error) {
                (Some(false), Some(message)) | (None, Some(message)) => {
                    Err(RegistryError::Rejected(message.to_string()))
                }
                (Some(applied), _) => Ok(applied),
                (None, None) => Ok(true),
            }
        }
        other => Err(RegistryError::InvalidRecord {
            entity: "response",
            reason: format!("unexpected procedure result {}", other),
        }),
    }
}

/// Interpret the answer of `reserve_gift` or `cancel_reservation`.
///
/// Only `true` (or `{"success": true}`) means applied. `null`, empty
/// strings and other shapes mean the procedure did not apply.
fn boolean_outcome(name: &'static str, value: Value) -> RegistryResult<bool> {
    match value {
        Value::Bool(applied) => Ok(applied),
        Value::String(message) if !message.trim().is_empty() => Err(RegistryError::Rejected(message)),
        Value::Object(map) => {
            if let Some(message) = map.get("error").and_then(Value::as_str).filter(|e| !e.is_empty()) {
                return Err(RegistryError::Rejected(message.to_string()));
            }
            Ok(map.get("success").and_then(Value::as_bool).unwrap_or(false))
        }
        other => {
            tracing::warn!(procedure = name, result = %other, "Procedure gave no boolean answer, treating as not applied");
            Ok(false)
        }
    }
}

/// Decode an array of rows, dropping the ones that fail conversion.
fn decode_rows<R, T>(value: Value, entity: &'static str) -> RegistryResult<Vec<T>>
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = RegistryError>,
{
    let rows: Vec<R> = match value {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other).map_err(|e| RegistryError::InvalidRecord {
            entity,
            reason: format!("expected an array of rows: {}", e),
        })?,
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match T::try_from(row) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(entity, error = %e, "Skipping malformed row"),
        }
    }
    Ok(records)
}

#[async_trait]
impl RegistryBackend for PostgrestBackend {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn list_gifts(&self) -> RegistryResult<Vec<Gift>> {
        let value = self.fetch_gifts("list_gifts", &[]).await?;
        decode_rows::<GiftRow, _>(value, "gift")
    }

    async fn get_gift(&self, id: GiftId) -> RegistryResult<Gift> {
        let value = self.fetch_gifts("get_gift", &[("id", format!("eq.{}", id))]).await?;
        let rows: Vec<GiftRow> = serde_json::from_value(value).map_err(|e| RegistryError::InvalidRecord {
            entity: "gift",
            reason: e.to_string(),
        })?;
        match rows.into_iter().next() {
            Some(row) => Gift::try_from(row),
            None => Err(RegistryError::NotFound { entity: "gift", id }),
        }
    }

    async fn reserve_gift(&self, request: &ReservationRequest) -> RegistryResult<bool> {
        self.boolean_procedure(
            "reserve_gift",
            json!({
                "p_gift_id": request.gift_id,
                "p_guest_name": request.guest_name,
                "p_pin": request.pin,
                "p_delivery_method": request.delivery_method.as_str(),
            }),
        )
        .await
    }

    async fn cancel_reservation(&self, gift_id: GiftId, pin: &str) -> RegistryResult<bool> {
        self.boolean_procedure("cancel_reservation", json!({ "p_gift_id": gift_id, "p_pin": pin }))
            .await
    }

    async fn record_pix_donation(&self, donation: &NewDonation) -> RegistryResult<PixDonation> {
        let builder = self
            .request(Method::POST, "pix_donations")
            .header("Prefer", "return=representation")
            .json(&json!({
                "donor_name": donation.donor_name,
                "message": donation.message,
                "amount": donation.amount.as_decimal(),
                "status": DonationStatus::Pending.as_str(),
            }));
        let value = self.send("record_pix_donation", builder).await?;
        let rows: Vec<DonationRow> = match value {
            Value::Array(_) => serde_json::from_value(value).map_err(|e| RegistryError::InvalidRecord {
                entity: "donation",
                reason: e.to_string(),
            })?,
            Value::Object(_) => vec![serde_json::from_value(value).map_err(|e| RegistryError::InvalidRecord {
                entity: "donation",
                reason: e.to_string(),
            })?],
            _ => Vec::new(),
        };
        let row = rows.into_iter().next().ok_or_else(|| RegistryError::InvalidRecord {
            entity: "donation",
            reason: "insert returned no row".into(),
        })?;
        PixDonation::try_from(row)
    }

    async fn record_rsvp(&self, rsvp: &Rsvp) -> RegistryResult<()> {
        let builder = self
            .request(Method::POST, "rsvps")
            .header("Prefer", "return=minimal")
            .json(&json!({ "full_name": rsvp.full_name, "confirmed": true }));
        self.send("record_rsvp", builder).await.map(|_| ())
    }

    async fn admin_clear_reservation(&self, id: GiftId, secret: &str) -> RegistryResult<bool> {
        self.procedure("admin_clear_reservation", json!({ "p_id": id, "p_secret_key": secret }))
            .await
    }

    async fn admin_upsert_gift(&self, gift: &GiftUpsert, secret: &str) -> RegistryResult<bool> {
        self.procedure(
            "admin_upsert_gift",
            json!({
                "p_id": gift.id,
                "p_name": gift.name,
                "p_description": gift.description,
                "p_price": gift.price,
                "p_image_url": gift.image_url,
                "p_product_link": gift.product_link,
                "p_warning_title": gift.warning_title,
                "p_warning_message": gift.warning_message,
                "p_category": gift.category,
                "p_secret_key": secret,
            }),
        )
        .await
    }

    async fn admin_delete_gift(&self, id: GiftId, secret: &str) -> RegistryResult<bool> {
        self.procedure("admin_delete_gift", json!({ "p_id": id, "p_secret_key": secret }))
            .await
    }

    async fn admin_update_gift_status(
        &self,
        id: GiftId,
        update: &GiftStatusUpdate,
        secret: &str,
    ) -> RegistryResult<bool> {
        self.procedure(
            "admin_update_gift_status",
            json!({
                "p_id": id,
                "p_current_quantity": update.current_quantity,
                "p_reserved_by": update.reserved_by,
                "p_secret_key": secret,
            }),
        )
        .await
    }

    async fn admin_get_pix_donations(&self, secret: &str) -> RegistryResult<Vec<PixDonation>> {
        let args = json!({ "p_secret_key": secret });
        let value = retry_read(&self.retries, "admin_get_pix_donations", || {
            self.rpc("admin_get_pix_donations", args.clone())
        })
        .await?;
        if let Value::String(message) = value {
            return Err(RegistryError::Rejected(message));
        }
        let mut donations: Vec<PixDonation> = decode_rows::<DonationRow, _>(value, "donation")?;
        donations.sort_by_key(|d| d.id);
        Ok(donations)
    }

    async fn admin_update_pix_status(
        &self,
        id: DonationId,
        status: DonationStatus,
        secret: &str,
    ) -> RegistryResult<bool> {
        self.procedure(
            "admin_update_pix_status",
            json!({ "p_id": id, "p_status": status.as_str(), "p_secret_key": secret }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_outcomes() {
        assert!(procedure_outcome(json!(true)).unwrap());
        assert!(!procedure_outcome(json!(false)).unwrap());
        assert!(procedure_outcome(Value::Null).unwrap());
        assert!(procedure_outcome(json!({"success": true})).unwrap());
        assert!(!procedure_outcome(json!({"success": false})).unwrap());

        let err = procedure_outcome(json!("Presente reservado, libere antes de excluir")).unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(m) if m.starts_with("Presente")));

        let err = procedure_outcome(json!({"success": false, "error": "invalid secret"})).unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(m) if m == "invalid secret"));

        assert!(procedure_outcome(json!(3)).is_err());
    }

    #[test]
    fn test_boolean_outcomes_require_true() {
        assert!(boolean_outcome("reserve_gift", json!(true)).unwrap());
        assert!(!boolean_outcome("reserve_gift", json!(false)).unwrap());
        assert!(!boolean_outcome("reserve_gift", Value::Null).unwrap());
        assert!(!boolean_outcome("cancel_reservation", json!("")).unwrap());
        assert!(!boolean_outcome("cancel_reservation", json!(1)).unwrap());
        assert!(!boolean_outcome("reserve_gift", json!({})).unwrap());
        assert!(boolean_outcome("reserve_gift", json!({"success": true})).unwrap());

        let err = boolean_outcome("reserve_gift", json!("Presente esgotado")).unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(m) if m == "Presente esgotado"));
    }

    #[test]
    fn test_decode_response_status_mapping() {
        assert!(matches!(
            decode_response("list_gifts", StatusCode::SERVICE_UNAVAILABLE, ""),
            Err(RegistryError::Unavailable(_))
        ));
        assert!(matches!(
            decode_response("list_gifts", StatusCode::UNAUTHORIZED, "{}"),
            Err(RegistryError::Unauthorized)
        ));

        let err = decode_response(
            "reserve_gift",
            StatusCode::BAD_REQUEST,
            r#"{"code":"P0001","message":"gift not found"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(m) if m == "gift not found"));

        assert_eq!(decode_response("record_rsvp", StatusCode::CREATED, "").unwrap(), Value::Null);
        assert_eq!(decode_response("x", StatusCode::OK, "[1]").unwrap(), json!([1]));
        assert!(decode_response("x", StatusCode::OK, "<html>").is_err());
    }

    #[test]
    fn test_decode_rows_skips_malformed() {
        let value = json!([
            {"id": 1, "name": "Panela", "price": 100},
            {"id": 2, "name": ""},
            {"name": "no id"}
        ]);
        let gifts: Vec<Gift> = decode_rows::<GiftRow, _>(value, "gift").unwrap();
        assert_eq!(gifts.len(), 1);
        assert_eq!(gifts[0].name, "Panela");

        assert!(decode_rows::<GiftRow, Gift>(json!({"id": 1}), "gift").is_err());
        assert!(decode_rows::<GiftRow, Gift>(Value::Null, "gift").unwrap().is_empty());
    }

    #[test]
    fn test_rest_url_normalization() {
        let config = BackendConfig {
            url: "https://abc.supabase.co/".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        let backend = PostgrestBackend::new(&config).unwrap();
        assert_eq!(backend.rest_url, "https://abc.supabase.co/rest/v1");

        let bad = BackendConfig { url: "not a url".into(), ..Default::default() };
        assert!(PostgrestBackend::new(&bad).is_err());
    }
}
