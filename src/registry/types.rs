//! Registry record types.
//!
//! Rows arrive from the database as loosely typed JSON. They are decoded into
//! `*Row` structs that accept every shape the tables have produced, then
//! converted into the strict types below. Conversion is where malformed rows
//! are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::pix::Amount;
use crate::registry::error::RegistryError;

pub type GiftId = i64;
pub type DonationId = i64;

/// Categories offered by the admin form.
pub const CATEGORIES: &[&str] = &[
    "Cozinha",
    "Banheiro",
    "Quarto",
    "Sala",
    "Lavanderia",
    "Decoração",
    "Eletros",
];

/// How the guest intends to hand over the gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Brought in person on the day of the party.
    Hand,
    /// Shipped to the hosts' address.
    Ship,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hand => "hand",
            Self::Ship => "ship",
        }
    }
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub name: String,
    pub description: Option<String>,
    /// Reference price in BRL. Missing prices count as zero when filtering.
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub product_link: Option<String>,
    pub warning_title: Option<String>,
    pub warning_message: Option<String>,
    pub category: Option<String>,
    pub max_quantity: u32,
    pub current_quantity: u32,
    pub reserved_by: Option<String>,
    pub delivery_method: Option<DeliveryMethod>,
}

impl Gift {
    /// Units still available.
    pub fn remaining(&self) -> u32 {
        self.max_quantity.saturating_sub(self.current_quantity)
    }

    pub fn is_sold_out(&self) -> bool {
        self.current_quantity >= self.max_quantity
    }

    /// Gifts with a warning need the guest to acknowledge it before reserving.
    pub fn has_warning(&self) -> bool {
        self.warning_title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Gift as shown to guests: no reserver name, plus availability.
#[derive(Debug, Clone, Serialize)]
pub struct PublicGift {
    pub id: GiftId,
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
    pub remaining: u32,
    pub sold_out: bool,
}

impl From<&Gift> for PublicGift {
    fn from(gift: &Gift) -> Self {
        Self {
            id: gift.id,
            name: gift.name.clone(),
            description: gift.description.clone(),
            price: gift.price,
            image_url: gift.image_url.clone(),
            product_link: gift.product_link.clone(),
            warning_title: gift.warning_title.clone(),
            warning_message: gift.warning_message.clone(),
            category: gift.category.clone(),
            max_quantity: gift.max_quantity,
            current_quantity: gift.current_quantity,
            remaining: gift.remaining(),
            sold_out: gift.is_sold_out(),
        }
    }
}

/// Raw `gifts` row as returned by the database.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiftRow {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub image_url: Option<String>,
    pub product_link: Option<String>,
    pub warning_title: Option<String>,
    pub warning_message: Option<String>,
    pub category: Option<String>,
    pub max_quantity: Option<i64>,
    pub current_quantity: Option<i64>,
    pub reserved_by: Option<String>,
    pub delivery_method: Option<String>,
}

impl TryFrom<GiftRow> for Gift {
    type Error = RegistryError;

    fn try_from(row: GiftRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| RegistryError::InvalidRecord { entity: "gift", reason };

        let id = row
            .id
            .as_ref()
            .and_then(value_as_i64)
            .ok_or_else(|| invalid("missing or non-integer id".into()))?;
        let name = row
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid(format!("gift {} has no name", id)))?;

        let price = match row.price {
            None | Some(Value::Null) => None,
            Some(ref v) => Some(parse_price(v).ok_or_else(|| invalid(format!("gift {} has price {}", id, v)))?),
        };

        let max_quantity = row.max_quantity.unwrap_or(1).max(1);
        let current_quantity = row.current_quantity.unwrap_or(0);
        if current_quantity < 0 {
            return Err(invalid(format!("gift {} has negative quantity", id)));
        }

        let delivery_method = match row.delivery_method.as_deref() {
            None | Some("") => None,
            Some("hand") => Some(DeliveryMethod::Hand),
            Some("ship") => Some(DeliveryMethod::Ship),
            Some(other) => return Err(invalid(format!("gift {} has delivery method '{}'", id, other))),
        };

        Ok(Gift {
            id,
            name,
            description: non_empty(row.description),
            price,
            image_url: non_empty(row.image_url),
            product_link: non_empty(row.product_link),
            warning_title: non_empty(row.warning_title),
            warning_message: non_empty(row.warning_message),
            category: non_empty(row.category),
            max_quantity: u32::try_from(max_quantity).unwrap_or(u32::MAX),
            current_quantity: u32::try_from(current_quantity).unwrap_or(u32::MAX),
            reserved_by: non_empty(row.reserved_by),
            delivery_method,
        })
    }
}

/// Status of a Pix contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Guest announced the transfer; not yet seen in the bank statement.
    Pending,
    Confirmed,
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(RegistryError::Validation(format!("unknown donation status '{}'", other))),
        }
    }
}

/// A recorded Pix contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixDonation {
    pub id: DonationId,
    pub donor_name: String,
    pub message: Option<String>,
    pub amount: Amount,
    pub status: DonationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw `pix_donations` row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationRow {
    pub id: Option<Value>,
    pub donor_name: Option<String>,
    pub message: Option<String>,
    pub amount: Option<Value>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<DonationRow> for PixDonation {
    type Error = RegistryError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| RegistryError::InvalidRecord { entity: "donation", reason };

        let id = row
            .id
            .as_ref()
            .and_then(value_as_i64)
            .ok_or_else(|| invalid("missing or non-integer id".into()))?;
        let amount = row
            .amount
            .as_ref()
            .and_then(parse_price)
            .and_then(|v| Amount::from_decimal(v).ok())
            .ok_or_else(|| invalid(format!("donation {} has no valid amount", id)))?;
        let status = match row.status.as_deref() {
            None => DonationStatus::Pending,
            Some(s) => s.parse().map_err(|_| invalid(format!("donation {} has status '{}'", id, s)))?,
        };

        Ok(PixDonation {
            id,
            donor_name: row.donor_name.unwrap_or_default(),
            message: non_empty(row.message),
            amount,
            status,
            created_at: row.created_at,
        })
    }
}

/// A contribution to record before showing the payment code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonation {
    pub donor_name: String,
    pub message: Option<String>,
    pub amount: Amount,
}

/// Attendance confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rsvp {
    pub full_name: String,
}

/// Arguments of the `reserve_gift` procedure.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRequest {
    pub gift_id: GiftId,
    pub guest_name: String,
    pub pin: String,
    pub delivery_method: DeliveryMethod,
}

/// Admin create/update of a catalog item. `id = None` creates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GiftUpsert {
    pub id: Option<GiftId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub warning_title: Option<String>,
    #[serde(default)]
    pub warning_message: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl GiftUpsert {
    /// Trim optional strings to `None` and check name, price and category.
    pub fn normalized(mut self) -> Result<Self, RegistryError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(RegistryError::Validation("name is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(RegistryError::Validation(format!("price {} is invalid", self.price)));
        }
        self.description = non_empty(self.description);
        self.image_url = non_empty(self.image_url);
        self.product_link = non_empty(self.product_link);
        self.warning_title = non_empty(self.warning_title);
        self.warning_message = non_empty(self.warning_message);
        self.category = non_empty(self.category);
        if let Some(category) = &self.category {
            if !CATEGORIES.contains(&category.as_str()) {
                return Err(RegistryError::Validation(format!("unknown category '{}'", category)));
            }
        }
        Ok(self)
    }
}

/// Admin override of a gift's reservation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftStatusUpdate {
    pub current_quantity: u32,
    #[serde(default)]
    pub reserved_by: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accept `129.9`, `"129.90"`, `"R$ 1.234,56"` and `"129,90"`.
pub fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            if s.trim_start().starts_with('-') {
                return None;
            }
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
            let normalized = if cleaned.contains(',') {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned
            };
            normalized.parse().ok()?
        }
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> GiftRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_gift_row_defaults() {
        let gift = Gift::try_from(row(json!({"id": 3, "name": " Air fryer ", "price": 399.9}))).unwrap();
        assert_eq!(gift.name, "Air fryer");
        assert_eq!(gift.max_quantity, 1);
        assert_eq!(gift.current_quantity, 0);
        assert_eq!(gift.remaining(), 1);
        assert!(!gift.is_sold_out());
    }

    #[test]
    fn test_gift_row_quantities() {
        let gift = Gift::try_from(row(json!({
            "id": "4", "name": "Taças", "max_quantity": 6, "current_quantity": 6,
            "reserved_by": "Ana Souza", "delivery_method": "ship"
        })))
        .unwrap();
        assert_eq!(gift.id, 4);
        assert!(gift.is_sold_out());
        assert_eq!(gift.remaining(), 0);
        assert_eq!(gift.delivery_method, Some(DeliveryMethod::Ship));
    }

    #[test]
    fn test_gift_row_rejects_bad_shapes() {
        assert!(Gift::try_from(row(json!({"name": "no id"}))).is_err());
        assert!(Gift::try_from(row(json!({"id": 1, "name": "  "}))).is_err());
        assert!(Gift::try_from(row(json!({"id": 1, "name": "x", "price": "abc"}))).is_err());
        assert!(Gift::try_from(row(json!({"id": 1, "name": "x", "current_quantity": -1}))).is_err());
        assert!(Gift::try_from(row(json!({"id": 1, "name": "x", "delivery_method": "drone"}))).is_err());
    }

    #[test]
    fn test_warning_detection() {
        let mut gift = Gift::try_from(row(json!({"id": 1, "name": "Micro-ondas", "warning_title": "110v"}))).unwrap();
        assert!(gift.has_warning());
        gift.warning_title = None;
        assert!(!gift.has_warning());
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price(&json!(129.9)), Some(129.9));
        assert_eq!(parse_price(&json!("129.90")), Some(129.9));
        assert_eq!(parse_price(&json!("R$ 1.234,56")), Some(1234.56));
        assert_eq!(parse_price(&json!("-5")), None);
        assert_eq!(parse_price(&json!(-5)), None);
        assert_eq!(parse_price(&json!(true)), None);
    }

    #[test]
    fn test_donation_row() {
        let row: DonationRow = serde_json::from_value(json!({
            "id": 9, "donor_name": "Tio João", "amount": "50.00", "status": "confirmed",
            "created_at": "2025-03-01T12:00:00Z"
        }))
        .unwrap();
        let donation = PixDonation::try_from(row).unwrap();
        assert_eq!(donation.amount.cents(), 5000);
        assert_eq!(donation.status, DonationStatus::Confirmed);
        assert!(donation.created_at.is_some());
    }

    #[test]
    fn test_upsert_normalization() {
        let upsert = GiftUpsert {
            name: "  Jogo de panelas ".into(),
            price: 250.0,
            category: Some("".into()),
            warning_title: Some("  ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(upsert.name, "Jogo de panelas");
        assert_eq!(upsert.category, None);
        assert_eq!(upsert.warning_title, None);

        let bad = GiftUpsert { name: "x".into(), category: Some("Garagem".into()), ..Default::default() };
        assert!(bad.normalized().is_err());
        let bad = GiftUpsert { name: "x".into(), price: -1.0, ..Default::default() };
        assert!(bad.normalized().is_err());
    }
}
