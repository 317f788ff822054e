//! Client for the gift registry HTTP API.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with an error body.
    #[error("{status}: {message} ({code})")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
}

pub type SdkResult<T> = Result<T, SdkError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub product_link: Option<String>,
    pub warning_title: Option<String>,
    pub warning_message: Option<String>,
    pub category: Option<String>,
    pub max_quantity: u32,
    pub current_quantity: u32,
    #[serde(default)]
    pub remaining: u32,
    #[serde(default)]
    pub sold_out: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub first_name: String,
    pub last_name: String,
    /// `"hand"` or `"ship"`.
    pub delivery_method: String,
    pub acknowledge_warning: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationReceipt {
    pub gift_id: i64,
    pub gift_name: String,
    pub guest_name: String,
    pub pin: String,
    pub delivery_method: String,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PixCode {
    pub payload: String,
    pub qr_svg: String,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Donation {
    pub id: i64,
    pub donor_name: String,
    pub message: Option<String>,
    pub amount: f64,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionReceipt {
    pub donation: Donation,
    pub payload: String,
    pub qr_svg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInfo {
    pub title: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub map_url: String,
    pub pix_presets: Vec<u64>,
    pub pix_max_amount_cents: u64,
}

pub struct RegistryClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    /// Attach the admin bearer token used by the `admin_*` calls.
    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    fn admin(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.request(method, path);
        match &self.admin_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    pub async fn list_gifts(&self, filter: Option<&str>) -> SdkResult<Vec<Gift>> {
        let mut builder = self.request(Method::GET, "/api/v1/gifts");
        if let Some(filter) = filter {
            builder = builder.query(&[("filter", filter)]);
        }
        send_json(builder).await
    }

    pub async fn get_gift(&self, id: i64) -> SdkResult<Gift> {
        send_json(self.request(Method::GET, &format!("/api/v1/gifts/{}", id))).await
    }

    pub async fn reserve(&self, gift_id: i64, reservation: &Reservation) -> SdkResult<ReservationReceipt> {
        let builder = self
            .request(Method::POST, &format!("/api/v1/gifts/{}/reservations", gift_id))
            .json(reservation);
        send_json(builder).await
    }

    pub async fn cancel_reservation(&self, gift_id: i64, pin: &str) -> SdkResult<()> {
        let builder = self
            .request(Method::DELETE, &format!("/api/v1/gifts/{}/reservations", gift_id))
            .json(&serde_json::json!({ "pin": pin }));
        send_empty(builder).await
    }

    /// Payment code for `amount` in BRL, or an open amount when `None`.
    pub async fn pix_code(&self, amount: Option<f64>) -> SdkResult<PixCode> {
        let mut builder = self.request(Method::GET, "/api/v1/pix/payload");
        if let Some(amount) = amount {
            builder = builder.query(&[("amount", format!("{:.2}", amount))]);
        }
        send_json(builder).await
    }

    pub async fn contribute(
        &self,
        donor_name: &str,
        message: Option<&str>,
        amount: f64,
    ) -> SdkResult<ContributionReceipt> {
        let builder = self.request(Method::POST, "/api/v1/pix/contributions").json(&serde_json::json!({
            "donor_name": donor_name,
            "message": message,
            "amount": amount,
        }));
        send_json(builder).await
    }

    pub async fn event(&self) -> SdkResult<EventInfo> {
        send_json(self.request(Method::GET, "/api/v1/event")).await
    }

    pub async fn rsvp(&self, full_name: &str) -> SdkResult<()> {
        let builder = self
            .request(Method::POST, "/api/v1/rsvps")
            .json(&serde_json::json!({ "full_name": full_name }));
        send_empty(builder).await
    }

    pub async fn admin_status(&self) -> SdkResult<Value> {
        send_json(self.admin(Method::GET, "/admin/status")).await
    }

    pub async fn admin_donations(&self) -> SdkResult<Vec<Donation>> {
        send_json(self.admin(Method::GET, "/admin/pix-donations")).await
    }

    pub async fn admin_set_donation_status(&self, id: i64, status: &str) -> SdkResult<()> {
        let builder = self
            .admin(Method::PUT, &format!("/admin/pix-donations/{}/status", id))
            .json(&serde_json::json!({ "status": status }));
        send_empty(builder).await
    }
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> SdkResult<T> {
    let resp = check(builder.send().await?).await?;
    Ok(resp.json().await?)
}

async fn send_empty(builder: RequestBuilder) -> SdkResult<()> {
    check(builder.send().await?).await.map(|_| ())
}

async fn check(resp: reqwest::Response) -> SdkResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
    Err(SdkError::Api {
        status,
        code: body["code"].as_str().unwrap_or("unknown").to_string(),
        message: body["error"].as_str().map(str::to_string).unwrap_or(text),
    })
}
