//! Gift catalog, reservations, contributions and RSVPs.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → filter.rs (price band + ordering for listings)
//!     → backend.rs (RegistryBackend trait)
//!         → postgrest.rs (hosted database, stored procedures)
//!         → memory.rs (in-process, same procedure semantics)
//!     → types.rs (rows decoded into typed records)
//! ```
//!
//! # Design Decisions
//! - The backend is chosen once at startup and shared as `Arc<dyn RegistryBackend>`
//! - Guest-facing types never carry the reserver's name
//! - Admin procedures take the backend secret explicitly; the HTTP layer
//!   supplies it from config after checking the admin bearer token

pub mod backend;
pub mod error;
pub mod filter;
pub mod memory;
pub mod postgrest;
pub mod types;

pub use backend::RegistryBackend;
pub use error::{RegistryError, RegistryResult};
pub use filter::{select, PriceFilter, SortOrder};
pub use memory::InMemoryBackend;
pub use postgrest::PostgrestBackend;
pub use types::{
    DeliveryMethod, DonationStatus, Gift, GiftId, GiftStatusUpdate, GiftUpsert, NewDonation,
    PixDonation, PublicGift, ReservationRequest, Rsvp,
};
