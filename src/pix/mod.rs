//! Pix payload subsystem.
//!
//! # Data Flow
//! ```text
//! PaymentRequest
//!     → sanitize.rs (fold/strip/truncate free text, default txid)
//!     → tlv.rs (frame fields, nest templates 26 and 62)
//!     → crc.rs (CRC16/CCITT-FALSE over everything up to "6304")
//!     → payload string ("copia e cola")
//!     → qr.rs (SVG / terminal rendering)
//!
//! decode.rs reverses the framing and verifies the checksum.
//! ```
//!
//! # Design Decisions
//! - Generation is a pure function: no I/O, no clock, no randomness
//! - Over-long names and cities are truncated, never rejected
//! - Amounts are integer cents; a zero amount is encoded like a missing one

pub mod amount;
pub mod crc;
pub mod decode;
pub mod error;
pub mod payload;
pub mod qr;
pub mod sanitize;
pub mod tlv;

pub use amount::Amount;
pub use decode::{decode, DecodedPayload};
pub use error::{DecodeError, PixError, PixResult};
pub use payload::{generate, PaymentRequest};
pub use qr::QrOptions;
