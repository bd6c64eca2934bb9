//! End-to-end flow through the composition root, with the backend mocked and
//! the gateway left unconfigured so the simulated variant is selected.

mod common;

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{init_tracing, sample_cart, valid_shipping};
use storefront_checkout::{
    AppConfig, CartAccess, CheckoutApp, CheckoutStep, ConfirmationOutcome, Event, GatewayConfig,
    InMemoryCart, OrderApiConfig, ShippingMethod, StoreSettings,
};

fn config_without_gateway_credentials(server: &MockServer) -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        store: StoreSettings::default(),
        order_api: OrderApiConfig {
            base_url: server.uri(),
            timeout_secs: 2,
            auth_token: None,
        },
        gateway: GatewayConfig {
            base_url: "https://gateway.example.com".to_string(),
            publishable_key: None,
            timeout_secs: 2,
        },
    }
}

#[tokio::test]
async fn full_simulated_checkout_creates_one_order_and_clears_the_cart() {
    init_tracing();
    let server = MockServer::start().await;
    let order_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": order_id })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/orders/.+/confirm-payment$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let cart = Arc::new(InMemoryCart::new(sample_cart()));
    let (app, mut events) =
        CheckoutApp::from_config(&config_without_gateway_credentials(&server), cart.clone())
            .unwrap();

    let mut session = app.flow.begin().await.unwrap();
    app.flow
        .update_shipping(&mut session, valid_shipping(), ShippingMethod::Standard)
        .unwrap();
    app.flow.proceed_to_payment(&mut session).await.unwrap();

    assert_eq!(session.step, CheckoutStep::Payment);
    assert_eq!(session.order_id(), Some(order_id));
    // the simulated gateway still issues a secret in the hosted shape
    assert!(session
        .client_secret
        .as_deref()
        .unwrap()
        .contains("_secret_"));

    // the widget "completes"; the simulated gateway reports success and the
    // backend confirmation runs for real against the mock
    let outcome = app.complete_payment(&mut session).await.unwrap();

    assert_eq!(outcome, ConfirmationOutcome::Completed { order_id });
    assert_eq!(session.step, CheckoutStep::Complete);
    assert!(cart.snapshot().await.is_empty());

    // the lifecycle was announced in order
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen[0], Event::CheckoutStarted { .. }));
    assert!(seen
        .iter()
        .any(|e| matches!(e, Event::OrderCreated(id) if *id == order_id)));
    assert!(seen
        .iter()
        .any(|e| matches!(e, Event::PaymentConfirmed { order_id: id } if *id == order_id)));
    assert!(seen.iter().any(|e| matches!(e, Event::CartCleared)));
}
