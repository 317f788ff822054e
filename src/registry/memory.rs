//! In-process registry backend.
//!
//! Each gift lives in its own `DashMap` entry. Every procedure that changes a
//! gift does its check and its update while holding that entry's write guard,
//! so `reserve_gift` is a compare-and-set on the quantity: concurrent guests
//! can never push `current_quantity` past `max_quantity`.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::registry::backend::RegistryBackend;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::types::*;
use crate::security::credentials::secret_matches;

/// One unit held by a guest.
#[derive(Debug, Clone)]
struct Hold {
    pin: String,
    guest_name: String,
    delivery_method: DeliveryMethod,
}

/// A gift plus what occupies its units.
///
/// Units set by an admin (or present in the seed) carry no PIN and are kept
/// apart from guest holds, so `current_quantity` is always their sum.
#[derive(Debug, Clone)]
struct Entry {
    gift: Gift,
    holds: Vec<Hold>,
    admin_units: u32,
    admin_reserver: Option<String>,
    admin_delivery: Option<DeliveryMethod>,
}

impl Entry {
    fn new(gift: Gift) -> Self {
        Self {
            admin_units: gift.current_quantity,
            admin_reserver: gift.reserved_by.clone(),
            admin_delivery: gift.delivery_method,
            holds: Vec::new(),
            gift,
        }
    }

    fn sync_reserver(&mut self) {
        self.gift.current_quantity = self.admin_units + self.holds.len() as u32;
        match self.holds.last() {
            Some(hold) => {
                self.gift.reserved_by = Some(hold.guest_name.clone());
                self.gift.delivery_method = Some(hold.delivery_method);
            }
            None if self.admin_units > 0 => {
                self.gift.reserved_by = self.admin_reserver.clone();
                self.gift.delivery_method = self.admin_delivery;
            }
            None => {
                self.gift.reserved_by = None;
                self.gift.delivery_method = None;
            }
        }
    }

    /// Force the reserved quantity, keeping the earliest guest holds.
    fn override_quantity(&mut self, quantity: u32, reserved_by: Option<String>) {
        self.holds.truncate(quantity as usize);
        self.admin_units = quantity - self.holds.len() as u32;
        if self.admin_units == 0 {
            self.admin_reserver = None;
            self.admin_delivery = None;
        } else if reserved_by.is_some() {
            self.admin_reserver = reserved_by.clone();
        }
        self.sync_reserver();
        if quantity > 0 && reserved_by.is_some() {
            self.gift.reserved_by = reserved_by;
        }
    }
}

/// Registry backend kept entirely in memory.
#[derive(Clone)]
pub struct InMemoryBackend {
    admin_secret: String,
    gifts: Arc<DashMap<GiftId, Entry>>,
    donations: Arc<DashMap<DonationId, PixDonation>>,
    rsvps: Arc<DashMap<i64, Rsvp>>,
    next_gift_id: Arc<AtomicI64>,
    next_donation_id: Arc<AtomicI64>,
    next_rsvp_id: Arc<AtomicI64>,
}

impl InMemoryBackend {
    /// Create an empty backend accepting `admin_secret` on admin procedures.
    pub fn new(admin_secret: impl Into<String>) -> Self {
        Self {
            admin_secret: admin_secret.into(),
            gifts: Arc::new(DashMap::new()),
            donations: Arc::new(DashMap::new()),
            rsvps: Arc::new(DashMap::new()),
            next_gift_id: Arc::new(AtomicI64::new(1)),
            next_donation_id: Arc::new(AtomicI64::new(1)),
            next_rsvp_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Create a backend pre-loaded with `gifts`. Ids are kept as given.
    pub fn with_gifts(admin_secret: impl Into<String>, gifts: Vec<Gift>) -> Self {
        let backend = Self::new(admin_secret);
        let mut max_id = 0;
        for gift in gifts {
            max_id = max_id.max(gift.id);
            backend.gifts.insert(gift.id, Entry::new(gift));
        }
        backend.next_gift_id.store(max_id + 1, Ordering::SeqCst);
        tracing::info!(count = backend.gifts.len(), "In-memory catalog seeded");
        backend
    }

    /// Number of RSVPs recorded so far.
    pub fn rsvp_count(&self) -> usize {
        self.rsvps.len()
    }

    /// Current state of one gift, reservers included.
    pub fn get_gift_snapshot(&self, id: GiftId) -> Option<Gift> {
        self.gifts.get(&id).map(|entry| entry.gift.clone())
    }

    fn authorize(&self, secret: &str) -> RegistryResult<()> {
        if secret_matches(secret, &self.admin_secret) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized)
        }
    }
}

#[async_trait]
impl RegistryBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_gifts(&self) -> RegistryResult<Vec<Gift>> {
        Ok(self.gifts.iter().map(|e| e.value().gift.clone()).collect())
    }

    async fn get_gift(&self, id: GiftId) -> RegistryResult<Gift> {
        self.gifts
            .get(&id)
            .map(|e| e.value().gift.clone())
            .ok_or(RegistryError::NotFound { entity: "gift", id })
    }

    async fn reserve_gift(&self, request: &ReservationRequest) -> RegistryResult<bool> {
        let Some(mut entry) = self.gifts.get_mut(&request.gift_id) else {
            return Ok(false);
        };
        if entry.gift.is_sold_out() {
            return Ok(false);
        }
        entry.holds.push(Hold {
            pin: request.pin.clone(),
            guest_name: request.guest_name.clone(),
            delivery_method: request.delivery_method,
        });
        entry.sync_reserver();
        Ok(true)
    }

    async fn cancel_reservation(&self, gift_id: GiftId, pin: &str) -> RegistryResult<bool> {
        let Some(mut entry) = self.gifts.get_mut(&gift_id) else {
            return Ok(false);
        };
        let Some(index) = entry.holds.iter().position(|h| secret_matches(pin, &h.pin)) else {
            return Ok(false);
        };
        entry.holds.remove(index);
        entry.sync_reserver();
        Ok(true)
    }

    async fn record_pix_donation(&self, donation: &NewDonation) -> RegistryResult<PixDonation> {
        let id = self.next_donation_id.fetch_add(1, Ordering::SeqCst);
        let record = PixDonation {
            id,
            donor_name: donation.donor_name.clone(),
            message: donation.message.clone(),
            amount: donation.amount,
            status: DonationStatus::Pending,
            created_at: Some(Utc::now()),
        };
        self.donations.insert(id, record.clone());
        Ok(record)
    }

    async fn record_rsvp(&self, rsvp: &Rsvp) -> RegistryResult<()> {
        let id = self.next_rsvp_id.fetch_add(1, Ordering::SeqCst);
        self.rsvps.insert(id, rsvp.clone());
        Ok(())
    }

    async fn admin_clear_reservation(&self, id: GiftId, secret: &str) -> RegistryResult<bool> {
        self.authorize(secret)?;
        let Some(mut entry) = self.gifts.get_mut(&id) else {
            return Ok(false);
        };
        entry.holds.clear();
        entry.admin_units = 0;
        entry.admin_reserver = None;
        entry.admin_delivery = None;
        entry.sync_reserver();
        Ok(true)
    }

    async fn admin_upsert_gift(&self, gift: &GiftUpsert, secret: &str) -> RegistryResult<bool> {
        self.authorize(secret)?;
        match gift.id {
            Some(id) => {
                let Some(mut entry) = self.gifts.get_mut(&id) else {
                    return Ok(false);
                };
                let current = &mut entry.gift;
                current.name = gift.name.clone();
                current.description = gift.description.clone();
                current.price = Some(gift.price);
                current.image_url = gift.image_url.clone();
                current.product_link = gift.product_link.clone();
                current.warning_title = gift.warning_title.clone();
                current.warning_message = gift.warning_message.clone();
                current.category = gift.category.clone();
                Ok(true)
            }
            None => {
                let id = self.next_gift_id.fetch_add(1, Ordering::SeqCst);
                let created = Gift {
                    id,
                    name: gift.name.clone(),
                    description: gift.description.clone(),
                    price: Some(gift.price),
                    image_url: gift.image_url.clone(),
                    product_link: gift.product_link.clone(),
                    warning_title: gift.warning_title.clone(),
                    warning_message: gift.warning_message.clone(),
                    category: gift.category.clone(),
                    max_quantity: 1,
                    current_quantity: 0,
                    reserved_by: None,
                    delivery_method: None,
                };
                self.gifts.insert(id, Entry::new(created));
                Ok(true)
            }
        }
    }

    async fn admin_delete_gift(&self, id: GiftId, secret: &str) -> RegistryResult<bool> {
        self.authorize(secret)?;
        // Reserved gifts must be cleared first.
        Ok(self
            .gifts
            .remove_if(&id, |_, entry| {
                entry.holds.is_empty() && entry.admin_units == 0 && entry.gift.current_quantity == 0
            })
            .is_some())
    }

    async fn admin_update_gift_status(
        &self,
        id: GiftId,
        update: &GiftStatusUpdate,
        secret: &str,
    ) -> RegistryResult<bool> {
        self.authorize(secret)?;
        let Some(mut entry) = self.gifts.get_mut(&id) else {
            return Ok(false);
        };
        if update.current_quantity > entry.gift.max_quantity {
            return Ok(false);
        }
        entry.override_quantity(update.current_quantity, update.reserved_by.clone());
        Ok(true)
    }

    async fn admin_get_pix_donations(&self, secret: &str) -> RegistryResult<Vec<PixDonation>> {
        self.authorize(secret)?;
        let mut donations: Vec<PixDonation> = self.donations.iter().map(|d| d.value().clone()).collect();
        donations.sort_by_key(|d| d.id);
        Ok(donations)
    }

    async fn admin_update_pix_status(
        &self,
        id: DonationId,
        status: DonationStatus,
        secret: &str,
    ) -> RegistryResult<bool> {
        self.authorize(secret)?;
        match self.donations.get_mut(&id) {
            Some(mut donation) => {
                donation.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
