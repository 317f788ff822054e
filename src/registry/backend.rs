//! Backend abstraction over the registry's remote procedures.
//!
//! Production runs against the hosted database's PostgREST endpoint
//! ([`PostgrestBackend`](crate::registry::postgrest::PostgrestBackend)).
//! Local runs and tests use [`InMemoryBackend`](crate::registry::memory::InMemoryBackend),
//! which implements the same procedure semantics in process.
//!
//! Procedures answer `true` when they applied and `false` when they did not
//! (item already taken, wrong PIN, unknown id). A `false` never implies a
//! partial effect.

use async_trait::async_trait;

use crate::registry::error::RegistryResult;
use crate::registry::types::*;

#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Whole catalog, unordered.
    async fn list_gifts(&self) -> RegistryResult<Vec<Gift>>;

    async fn get_gift(&self, id: GiftId) -> RegistryResult<Gift>;

    /// `reserve_gift`: take one unit if any is left.
    async fn reserve_gift(&self, request: &ReservationRequest) -> RegistryResult<bool>;

    /// `cancel_reservation`: release the unit held under `pin`.
    async fn cancel_reservation(&self, gift_id: GiftId, pin: &str) -> RegistryResult<bool>;

    /// Insert a `pending` contribution.
    async fn record_pix_donation(&self, donation: &NewDonation) -> RegistryResult<PixDonation>;

    async fn record_rsvp(&self, rsvp: &Rsvp) -> RegistryResult<()>;

    /// `admin_clear_reservation`: release every unit of a gift.
    async fn admin_clear_reservation(&self, id: GiftId, secret: &str) -> RegistryResult<bool>;

    /// `admin_upsert_gift`: create when `gift.id` is `None`, else update.
    async fn admin_upsert_gift(&self, gift: &GiftUpsert, secret: &str) -> RegistryResult<bool>;

    /// `admin_delete_gift`
    async fn admin_delete_gift(&self, id: GiftId, secret: &str) -> RegistryResult<bool>;

    /// `admin_update_gift_status`: overwrite quantity and reserver.
    async fn admin_update_gift_status(
        &self,
        id: GiftId,
        update: &GiftStatusUpdate,
        secret: &str,
    ) -> RegistryResult<bool>;

    /// `admin_get_pix_donations`
    async fn admin_get_pix_donations(&self, secret: &str) -> RegistryResult<Vec<PixDonation>>;

    /// `admin_update_pix_status`
    async fn admin_update_pix_status(
        &self,
        id: DonationId,
        status: DonationStatus,
        secret: &str,
    ) -> RegistryResult<bool>;
}
