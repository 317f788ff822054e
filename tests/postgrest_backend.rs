//! The PostgREST backend against a scripted stand-in for the database API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use gift_registry::config::{BackendConfig, BackendKind, RetryConfig};
use gift_registry::pix::Amount;
use gift_registry::registry::{
    DeliveryMethod, DonationStatus, NewDonation, PostgrestBackend, RegistryBackend, RegistryError,
    ReservationRequest,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;
use common::{start_programmable_backend, test_config, MockRequest, ADMIN_KEY, BACKEND_SECRET};

const ANON_KEY: &str = "anon-test-key";

fn backend_config(addr: std::net::SocketAddr) -> BackendConfig {
    BackendConfig {
        kind: BackendKind::Postgrest,
        url: format!("http://{}", addr),
        anon_key: ANON_KEY.into(),
        admin_secret: BACKEND_SECRET.into(),
        request_timeout_secs: 5,
        retries: RetryConfig {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 5,
            max_delay_ms: 20,
        },
        ..Default::default()
    }
}

fn gift_rows() -> String {
    json!([
        { "id": 1, "name": "Air fryer", "price": "R$ 399,90", "max_quantity": 1, "current_quantity": 0 },
        { "id": 2, "name": "Jogo de toalhas", "price": 89.9, "max_quantity": 3, "current_quantity": 1,
          "reserved_by": "Ana Souza", "delivery_method": "hand" },
        { "id": "broken", "name": "Sem id" }
    ])
    .to_string()
}

#[tokio::test]
async fn test_lists_gifts_and_skips_malformed_rows() {
    let seen: Arc<Mutex<Vec<MockRequest>>> = Arc::default();
    let log = seen.clone();
    let addr = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async { (200, gift_rows()) }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    let gifts = backend.list_gifts().await.unwrap();
    assert_eq!(gifts.len(), 2);
    assert!((gifts[0].price.unwrap() - 399.9).abs() < 1e-9);
    assert_eq!(gifts[1].reserved_by.as_deref(), Some("Ana Souza"));
    assert_eq!(gifts[1].delivery_method, Some(DeliveryMethod::Hand));

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert!(requests[0].path.starts_with("/rest/v1/gifts?select="));
    assert_eq!(requests[0].header("apikey"), Some(ANON_KEY));
    assert_eq!(requests[0].header("authorization"), Some("Bearer anon-test-key"));
}

#[tokio::test]
async fn test_get_gift_not_found() {
    let addr = start_programmable_backend(|_| async { (200, "[]".to_string()) }).await;
    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();

    let err = backend.get_gift(42).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { entity: "gift", id: 42 }));
}

#[tokio::test]
async fn test_reads_retry_transient_failures() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = start_programmable_backend(move |_| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt < 2 {
                (503, "{}".to_string())
            } else {
                (200, gift_rows())
            }
        }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    assert_eq!(backend.list_gifts().await.unwrap().len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_mutations_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = start_programmable_backend(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { (503, "{}".to_string()) }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    let request = ReservationRequest {
        gift_id: 1,
        guest_name: "Ana Souza".into(),
        pin: "123456".into(),
        delivery_method: DeliveryMethod::Hand,
    };
    let err = backend.reserve_gift(&request).await.unwrap_err();
    assert!(matches!(err, RegistryError::Unavailable(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reservation_procedure_arguments() {
    let seen: Arc<Mutex<Vec<MockRequest>>> = Arc::default();
    let log = seen.clone();
    let addr = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async { (200, "true".to_string()) }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    let request = ReservationRequest {
        gift_id: 7,
        guest_name: "Bia Lima".into(),
        pin: "654321".into(),
        delivery_method: DeliveryMethod::Ship,
    };
    assert!(backend.reserve_gift(&request).await.unwrap());

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/rest/v1/rpc/reserve_gift");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["p_gift_id"], 7);
    assert_eq!(body["p_guest_name"], "Bia Lima");
    assert_eq!(body["p_pin"], "654321");
    assert_eq!(body["p_delivery_method"], "ship");
}

#[tokio::test]
async fn test_procedure_error_strings_are_rejections() {
    let addr = start_programmable_backend(|_| async { (200, "\"Invalid secret key\"".to_string()) }).await;
    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();

    let err = backend.admin_delete_gift(3, "nope").await.unwrap_err();
    assert!(matches!(err, RegistryError::Rejected(ref m) if m == "Invalid secret key"));
}

#[tokio::test]
async fn test_record_donation_returns_created_row() {
    let seen: Arc<Mutex<Vec<MockRequest>>> = Arc::default();
    let log = seen.clone();
    let addr = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async {
            (
                201,
                json!([{ "id": 12, "donor_name": "Tia Marta", "amount": 150.5, "status": "pending",
                         "created_at": "2025-03-01T12:00:00Z" }])
                .to_string(),
            )
        }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    let donation = backend
        .record_pix_donation(&NewDonation {
            donor_name: "Tia Marta".into(),
            message: None,
            amount: Amount::from_cents(15050).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(donation.id, 12);
    assert_eq!(donation.status, DonationStatus::Pending);
    assert_eq!(donation.amount.cents(), 15050);

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].path, "/rest/v1/pix_donations");
    assert_eq!(requests[0].header("prefer"), Some("return=representation"));
}

#[tokio::test]
async fn test_service_maps_backend_outage_to_503() {
    let addr = start_programmable_backend(|_| async { (503, "{}".to_string()) }).await;

    let mut config = test_config();
    config.backend = backend_config(addr);
    config.backend.retries.max_attempts = 1;
    let backend = Arc::new(PostgrestBackend::new(&config.backend).unwrap());
    let (base_url, _shutdown, _config_tx) = common::spawn_with_backend(config, backend).await;

    let res = reqwest::get(format!("{}/api/v1/gifts", base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "backend_unavailable");
}

#[tokio::test]
async fn test_service_admin_passes_backend_secret() {
    let seen: Arc<Mutex<Vec<MockRequest>>> = Arc::default();
    let log = seen.clone();
    let addr = start_programmable_backend(move |req| {
        log.lock().unwrap().push(req);
        async { (200, "null".to_string()) }
    })
    .await;

    let mut config = test_config();
    config.backend = backend_config(addr);
    let backend = Arc::new(PostgrestBackend::new(&config.backend).unwrap());
    let (base_url, _shutdown, _config_tx) = common::spawn_with_backend(config, backend).await;

    let res = reqwest::Client::new()
        .post(format!("{}/admin/gifts/5/clear-reservation", base_url))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0].path, "/rest/v1/rpc/admin_clear_reservation");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "p_id": 5, "p_secret_key": BACKEND_SECRET }));
}

#[tokio::test]
async fn test_reservation_without_boolean_answer_is_not_applied() {
    let addr = start_programmable_backend(|req| async move {
        if req.path.starts_with("/rest/v1/rpc/") {
            (200, "null".to_string())
        } else {
            (200, json!([{ "id": 1, "name": "Air fryer", "max_quantity": 1, "current_quantity": 0 }]).to_string())
        }
    })
    .await;

    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();
    let request = ReservationRequest {
        gift_id: 1,
        guest_name: "Ana Souza".into(),
        pin: "123456".into(),
        delivery_method: DeliveryMethod::Hand,
    };
    assert!(!backend.reserve_gift(&request).await.unwrap());

    let mut config = test_config();
    config.backend = backend_config(addr);
    let backend = Arc::new(PostgrestBackend::new(&config.backend).unwrap());
    let (base_url, _shutdown, _config_tx) = common::spawn_with_backend(config, backend).await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/v1/gifts/1/reservations", base_url))
        .json(&json!({ "first_name": "Ana", "last_name": "Souza", "delivery_method": "hand" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_with_empty_answer_is_not_applied() {
    let addr = start_programmable_backend(|_| async { (200, "\"\"".to_string()) }).await;
    let backend = PostgrestBackend::new(&backend_config(addr)).unwrap();

    assert!(!backend.cancel_reservation(1, "123456").await.unwrap());
}
