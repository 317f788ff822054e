//! Payload parsing and checksum verification.

use serde::Serialize;

use crate::pix::amount::Amount;
use crate::pix::crc::{crc16_ccitt_false, format_checksum};
use crate::pix::error::DecodeError;
use crate::pix::payload::*;
use crate::pix::tlv::{find, parse_fields, TlvField};

/// Fields recovered from a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPayload {
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    pub amount: Option<Amount>,
    pub transaction_id: String,
    /// `true` for reusable (`"11"`) codes, `false` for single-use (`"12"`).
    pub reusable: bool,
    pub checksum: String,
}

/// Parse `payload`, verifying the trailing CRC before anything else.
pub fn decode(payload: &str) -> Result<DecodedPayload, DecodeError> {
    let payload = payload.trim();
    let checksum = verify_checksum(payload)?;

    let fields = parse_fields(payload)?;
    let account = required(&fields, TAG_MERCHANT_ACCOUNT, "26 merchant account")?.children()?;
    let key = required(&account, SUB_TAG_KEY, "26.01 pix key")?.value.clone();

    let amount = match find(&fields, TAG_AMOUNT) {
        Some(field) => Some(
            field
                .value
                .parse::<Amount>()
                .map_err(|_| DecodeError::InvalidAmount(field.value.clone()))?,
        ),
        None => None,
    };

    let transaction_id = match find(&fields, TAG_ADDITIONAL_DATA) {
        Some(field) => find(&field.children()?, SUB_TAG_TXID)
            .map(|f| f.value.clone())
            .unwrap_or_default(),
        None => String::new(),
    };

    let reusable = find(&fields, TAG_POINT_OF_INITIATION)
        .map(|f| f.value != "12")
        .unwrap_or(true);

    Ok(DecodedPayload {
        key,
        merchant_name: required(&fields, TAG_MERCHANT_NAME, "59 merchant name")?.value.clone(),
        merchant_city: required(&fields, TAG_MERCHANT_CITY, "60 merchant city")?.value.clone(),
        amount,
        transaction_id,
        reusable,
        checksum,
    })
}

/// Check the trailing `6304XXXX` and return the checksum digits.
pub fn verify_checksum(payload: &str) -> Result<String, DecodeError> {
    let char_count = payload.chars().count();
    if char_count < CRC_HEADER.len() + 4 {
        return Err(DecodeError::Truncated(char_count));
    }
    let split = payload.len() - 8;
    if !payload.is_char_boundary(split) {
        return Err(DecodeError::MissingField("63 crc"));
    }
    let tail = &payload[split..];
    if !tail.is_ascii() || !tail.starts_with(CRC_HEADER) {
        return Err(DecodeError::MissingField("63 crc"));
    }

    let (body, actual) = payload.split_at(payload.len() - 4);
    let expected = format_checksum(crc16_ccitt_false(body.as_bytes()));
    if !actual.eq_ignore_ascii_case(&expected) {
        return Err(DecodeError::ChecksumMismatch {
            expected,
            actual: actual.to_string(),
        });
    }
    Ok(actual.to_ascii_uppercase())
}

fn required<'a>(fields: &'a [TlvField], tag: u8, name: &'static str) -> Result<&'a TlvField, DecodeError> {
    find(fields, tag).ok_or(DecodeError::MissingField(name))
}
