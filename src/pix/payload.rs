//! Static Pix payload ("copia e cola") generation.
//!
//! # Layout
//! ```text
//! 00 payload format indicator   "01"
//! 01 point of initiation        "11" (reusable)
//! 26 merchant account info      { 00 "br.gov.bcb.pix", 01 key }
//! 52 merchant category code     "0000"
//! 53 transaction currency       "986" (BRL)
//! 54 transaction amount         omitted when the payer picks the amount
//! 58 country code               "BR"
//! 59 merchant name              <= 25 chars
//! 60 merchant city              <= 15 chars
//! 62 additional data            { 05 transaction id }
//! 63 CRC16                      4 uppercase hex digits
//! ```

use serde::{Deserialize, Serialize};

use crate::pix::amount::Amount;
use crate::pix::crc::{crc16_ccitt_false, format_checksum};
use crate::pix::error::{PixError, PixResult};
use crate::pix::sanitize::{
    sanitize_text, sanitize_transaction_id, MERCHANT_CITY_MAX, MERCHANT_NAME_MAX,
};
use crate::pix::tlv::{push_field, MAX_VALUE_LEN};

pub const TAG_PAYLOAD_FORMAT: u8 = 0;
pub const TAG_POINT_OF_INITIATION: u8 = 1;
pub const TAG_MERCHANT_ACCOUNT: u8 = 26;
pub const TAG_MERCHANT_CATEGORY: u8 = 52;
pub const TAG_CURRENCY: u8 = 53;
pub const TAG_AMOUNT: u8 = 54;
pub const TAG_COUNTRY: u8 = 58;
pub const TAG_MERCHANT_NAME: u8 = 59;
pub const TAG_MERCHANT_CITY: u8 = 60;
pub const TAG_ADDITIONAL_DATA: u8 = 62;
pub const TAG_CRC: u8 = 63;

pub const SUB_TAG_GUI: u8 = 0;
pub const SUB_TAG_KEY: u8 = 1;
pub const SUB_TAG_TXID: u8 = 5;

pub const PAYLOAD_FORMAT: &str = "01";
pub const POINT_OF_INITIATION_STATIC: &str = "11";
pub const PIX_GUI: &str = "br.gov.bcb.pix";
pub const MERCHANT_CATEGORY_CODE: &str = "0000";
pub const CURRENCY_BRL: &str = "986";
pub const COUNTRY_CODE: &str = "BR";

/// CRC tag and its fixed declared length, appended before checksumming.
pub const CRC_HEADER: &str = "6304";

/// Longest key that still fits the merchant account template.
pub const MAX_KEY_LEN: usize = MAX_VALUE_LEN - (4 + PIX_GUI.len()) - 4;

/// Input to the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Payee's registered Pix key (e-mail, phone, CPF/CNPJ or random key).
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    /// `None` lets the payer type the amount in their banking app.
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentRequest {
    pub fn new(
        key: impl Into<String>,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            amount: None,
            transaction_id: None,
        }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_transaction_id(mut self, txid: impl Into<String>) -> Self {
        self.transaction_id = Some(txid.into());
        self
    }

    /// Encode this request. See [`generate`].
    pub fn generate(&self) -> PixResult<String> {
        generate(self)
    }
}

/// Build the payload string for `request`.
///
/// A zero amount is treated like a missing one: the field is omitted and the
/// payer chooses the value.
pub fn generate(request: &PaymentRequest) -> PixResult<String> {
    let key_len = request.key.chars().count();
    if request.key.trim().is_empty() {
        return Err(PixError::InvalidKey("key is empty".to_string()));
    }
    if key_len > MAX_KEY_LEN {
        return Err(PixError::InvalidKey(format!(
            "key is {} characters, maximum is {}",
            key_len, MAX_KEY_LEN
        )));
    }

    let name = sanitize_text(&request.merchant_name, MERCHANT_NAME_MAX);
    let city = sanitize_text(&request.merchant_city, MERCHANT_CITY_MAX);
    let txid = sanitize_transaction_id(request.transaction_id.as_deref());

    let mut account = String::new();
    push_field(&mut account, SUB_TAG_GUI, PIX_GUI);
    push_field(&mut account, SUB_TAG_KEY, &request.key);

    let mut additional = String::new();
    push_field(&mut additional, SUB_TAG_TXID, &txid);

    let mut payload = String::with_capacity(160);
    push_field(&mut payload, TAG_PAYLOAD_FORMAT, PAYLOAD_FORMAT);
    push_field(&mut payload, TAG_POINT_OF_INITIATION, POINT_OF_INITIATION_STATIC);
    push_field(&mut payload, TAG_MERCHANT_ACCOUNT, &account);
    push_field(&mut payload, TAG_MERCHANT_CATEGORY, MERCHANT_CATEGORY_CODE);
    push_field(&mut payload, TAG_CURRENCY, CURRENCY_BRL);
    if let Some(amount) = request.amount.filter(|a| !a.is_zero()) {
        push_field(&mut payload, TAG_AMOUNT, &amount.to_string());
    }
    push_field(&mut payload, TAG_COUNTRY, COUNTRY_CODE);
    push_field(&mut payload, TAG_MERCHANT_NAME, &name);
    push_field(&mut payload, TAG_MERCHANT_CITY, &city);
    push_field(&mut payload, TAG_ADDITIONAL_DATA, &additional);

    payload.push_str(CRC_HEADER);
    let crc = crc16_ccitt_false(payload.as_bytes());
    payload.push_str(&format_checksum(crc));

    Ok(payload)
}
