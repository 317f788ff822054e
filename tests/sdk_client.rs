//! The Rust SDK against a running service.

use registry_sdk::{RegistryClient, Reservation, SdkError};
use reqwest::StatusCode;

mod common;
use common::{default_seeds, spawn_server, test_config, ADMIN_KEY};

#[tokio::test]
async fn test_guest_flow_through_sdk() {
    let server = spawn_server(test_config(), &default_seeds()).await;
    let client = RegistryClient::new(&server.base_url);

    let gifts = client.list_gifts(Some("above200")).await.unwrap();
    assert_eq!(gifts.len(), 1);
    assert_eq!(gifts[0].name, "Air fryer");

    let reservation = Reservation {
        first_name: "Ana".into(),
        last_name: "Souza".into(),
        delivery_method: "hand".into(),
        acknowledge_warning: false,
    };
    let receipt = client.reserve(gifts[0].id, &reservation).await.unwrap();
    assert!(receipt.shipping_address.is_none());

    match client.reserve(gifts[0].id, &reservation).await {
        Err(SdkError::Api { status, code, .. }) => {
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(code, "conflict");
        }
        other => panic!("expected conflict, got {:?}", other.map(|r| r.pin)),
    }

    client.cancel_reservation(gifts[0].id, &receipt.pin).await.unwrap();
    assert!(!client.get_gift(gifts[0].id).await.unwrap().sold_out);

    let code = client.pix_code(Some(75.0)).await.unwrap();
    assert_eq!(code.amount, Some(75.0));

    client.rsvp("Joana Prado").await.unwrap();
    assert_eq!(client.event().await.unwrap().pix_presets, vec![50, 100, 200]);
}

#[tokio::test]
async fn test_admin_flow_through_sdk() {
    let server = spawn_server(test_config(), &default_seeds()).await;

    let anonymous = RegistryClient::new(&server.base_url);
    assert!(matches!(
        anonymous.admin_status().await,
        Err(SdkError::Api { status: StatusCode::UNAUTHORIZED, .. })
    ));

    let client = RegistryClient::new(&server.base_url).with_admin_key(ADMIN_KEY);
    let receipt = client.contribute("Tio Beto", None, 120.0).await.unwrap();
    client
        .admin_set_donation_status(receipt.donation.id, "cancelled")
        .await
        .unwrap();

    let donations = client.admin_donations().await.unwrap();
    assert_eq!(donations.len(), 1);
    assert_eq!(donations[0].status, "cancelled");
}
