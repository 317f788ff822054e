//! Tag-Length-Value framing for EMV-style payloads.
//!
//! Each field is `TT LL V...`: a two-digit tag, a two-digit value length
//! counted in characters, then the value. Templates (tags 26 and 62) hold a
//! concatenation of inner fields as their value.

use crate::pix::error::DecodeError;

/// Largest value a two-digit length header can declare.
pub const MAX_VALUE_LEN: usize = 99;

/// A single decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvField {
    pub tag: u8,
    pub value: String,
}

impl TlvField {
    /// Decode this field's value as a nested template.
    pub fn children(&self) -> Result<Vec<TlvField>, DecodeError> {
        parse_fields(&self.value)
    }
}

/// Append one field to `out`.
///
/// Callers are responsible for keeping `value` within [`MAX_VALUE_LEN`]
/// characters; the encoder truncates every variable field before it gets here.
pub fn push_field(out: &mut String, tag: u8, value: &str) {
    let len = value.chars().count();
    debug_assert!(tag < 100, "tag {} does not fit two digits", tag);
    debug_assert!(len <= MAX_VALUE_LEN, "value for tag {} is {} chars", tag, len);
    out.push_str(&format!("{:02}{:02}", tag, len));
    out.push_str(value);
}

/// Encode one field as a standalone string.
pub fn encode_field(tag: u8, value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    push_field(&mut out, tag, value);
    out
}

/// Split a flat run of fields into its parts.
pub fn parse_fields(input: &str) -> Result<Vec<TlvField>, DecodeError> {
    let chars: Vec<char> = input.chars().collect();
    let mut fields = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        if pos + 4 > chars.len() {
            return Err(DecodeError::Truncated(pos));
        }
        let tag = two_digits(&chars[pos..pos + 2]).ok_or(DecodeError::InvalidHeader(pos))?;
        let len = two_digits(&chars[pos + 2..pos + 4]).ok_or(DecodeError::InvalidHeader(pos + 2))?;
        let start = pos + 4;
        let end = start + len as usize;
        if end > chars.len() {
            return Err(DecodeError::Truncated(start));
        }
        fields.push(TlvField {
            tag,
            value: chars[start..end].iter().collect(),
        });
        pos = end;
    }

    Ok(fields)
}

/// Find the first field with `tag`.
pub fn find(fields: &[TlvField], tag: u8) -> Option<&TlvField> {
    fields.iter().find(|f| f.tag == tag)
}

fn two_digits(chars: &[char]) -> Option<u8> {
    let hi = chars.first()?.to_digit(10)?;
    let lo = chars.get(1)?.to_digit(10)?;
    Some((hi * 10 + lo) as u8)
}
