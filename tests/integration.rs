use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use courier_dispatch::api::rest::router;
use courier_dispatch::config::Config;
use courier_dispatch::engine::routing::RouteDirectory;
use courier_dispatch::notify::Notification;
use courier_dispatch::state::AppState;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

type Headers<'a> = &'a [(&'static str, &'a str)];

const CUSTOMER: Headers<'static> = &[("x-user-id", "1"), ("x-user-role", "customer")];
const MOMBASA_CASHIER: Headers<'static> = &[
    ("x-user-id", "2"),
    ("x-user-role", "cashier"),
    ("x-county", "Mombasa"),
    ("x-user-email", "cashier@mombasa.example.com"),
];
const NAIROBI_CASHIER: Headers<'static> = &[
    ("x-user-id", "3"),
    ("x-user-role", "order_manager"),
    ("x-county", "Nairobi"),
    ("x-user-email", "cashier@nairobi.example.com"),
];
const MOMBASA_DRIVER: Headers<'static> = &[
    ("x-user-id", "10"),
    ("x-user-role", "driver"),
    ("x-driver-type", "county"),
    ("x-county", "Mombasa"),
];
const OTHER_MOMBASA_DRIVER: Headers<'static> = &[
    ("x-user-id", "11"),
    ("x-user-role", "county_driver"),
    ("x-county", "Mombasa"),
];
const NAIROBI_DRIVER: Headers<'static> = &[
    ("x-user-id", "30"),
    ("x-user-role", "county_driver"),
    ("x-county", "Nairobi"),
];
const TRANSIT_DRIVER: Headers<'static> = &[
    ("x-user-id", "20"),
    ("x-user-role", "driver"),
    ("x-driver-type", "transit"),
    ("x-route-id", "1"),
    ("x-direction", "forward"),
];

fn setup() -> (axum::Router, mpsc::Receiver<Notification>) {
    let (state, rx) = AppState::new(RouteDirectory::builtin(), &Config::default());
    (router(Arc::new(state)), rx)
}

fn json_request(method: &str, uri: &str, headers: Headers<'_>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str, headers: Headers<'_>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

fn get_request(uri: &str, headers: Headers<'_>) -> Request<Body> {
    empty_request("GET", uri, headers)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn party(county: &str) -> Value {
    json!({
        "name": "Achieng Otieno",
        "email": "achieng@example.com",
        "phone": "0711222333",
        "county": county,
        "building": "Bima Towers",
        "street": "Digo Road",
        "landmark": "Municipal Market"
    })
}

fn draft(from: &str, to: &str) -> Value {
    json!({
        "sender": party(from),
        "receiver": party(to),
        "parcels": [
            { "content": "documents", "weight": "0.5", "pieces": 1 },
            { "content": "shoes", "weight": "1.2", "pieces": 2 }
        ]
    })
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Creates, prices and confirms a Mombasa order, returning its id.
async fn confirmed_order(app: &axum::Router, to: &str, payment_time: &str) -> String {
    let (status, order) = send(app, json_request("POST", "/orders", CUSTOMER, draft("Mombasa", to))).await;
    assert_eq!(status, StatusCode::OK);
    let id = order["order_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        json_request(
            "POST",
            &format!("/cashier/orders/{id}/price"),
            MOMBASA_CASHIER,
            json!({ "costs": ["300", "200"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            CUSTOMER,
            json!({ "payment_time": payment_time }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    id
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _rx) = setup();
    let response = app.oneshot(get_request("/health", &[])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["routes"], 6);
    assert_eq!(body["drivers"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _rx) = setup();
    let response = app.oneshot(get_request("/metrics", &[])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("notifications_in_queue"));
}

#[tokio::test]
async fn online_order_starts_pending_cost_calculation() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Nairobi")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Pending Cost Calculation");
    assert_eq!(body["route_id"], 1);
    assert_eq!(body["direction"], "forward");
    assert_eq!(body["current_county_office"], "Mombasa");
    assert_eq!(body["customer_type"], "online");
    assert!(body["tracking_number"].is_null());
    assert!(body["total_cost"].is_null());
}

#[tokio::test]
async fn reverse_order_is_assigned_the_reverse_route() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Nakuru", "Mombasa")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route_id"], 2);
    assert_eq!(body["direction"], "reverse");
}

#[tokio::test]
async fn same_county_order_is_rejected() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Nairobi", "Nairobi")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["field"], "receiver.county");
}

#[tokio::test]
async fn unrouted_counties_are_a_routing_configuration_error() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Turkana")),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "routing_configuration");
}

#[tokio::test]
async fn invalid_receiver_phone_is_reported_by_field() {
    let (app, _rx) = setup();
    let mut body = draft("Mombasa", "Nairobi");
    body["receiver"]["phone"] = json!("07112");

    let (status, body) = send(&app, json_request("POST", "/orders", CUSTOMER, body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "receiver.phone");
}

#[tokio::test]
async fn routes_can_be_listed_and_resolved() {
    let (app, _rx) = setup();
    let (status, routes) = send(&app, get_request("/routes", &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(routes.as_array().unwrap().len(), 6);

    let (status, resolved) = send(
        &app,
        json_request(
            "POST",
            "/routes/resolve",
            &[],
            json!({ "sender_county": "Kitui", "receiver_county": "Nairobi" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["route_id"], 6);
    assert_eq!(resolved["direction"], "reverse");
    assert_eq!(resolved["hops"], 2);
}

#[tokio::test]
async fn pricing_and_confirmation_issue_a_tracking_number() {
    let (app, mut rx) = setup();
    let (_, order) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Nairobi")),
    )
    .await;
    let id = order["order_id"].as_str().unwrap();

    let (status, pending) = send(&app, get_request("/cashier/pending", MOMBASA_CASHIER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, priced) = send(
        &app,
        json_request(
            "POST",
            &format!("/cashier/orders/{id}/price"),
            MOMBASA_CASHIER,
            json!({ "costs": ["300", "200"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(priced["status"], "Awaiting Confirmation");
    assert_eq!(priced["total_cost"], "500");

    let (_, polled) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(polled["total_cost"], "500");

    let (status, confirmed) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            CUSTOMER,
            json!({ "payment_time": "on-delivery" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "To Be Collected");
    assert_eq!(confirmed["payment_time"], "on-delivery");
    let tracking_number = confirmed["tracking_number"].as_str().unwrap();
    assert!(tracking_number.starts_with("MC"));
    assert!(!confirmed["estimated_delivery"].is_null());

    let notification = rx.try_recv().unwrap();
    assert!(notification.body.contains(tracking_number));

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            CUSTOMER,
            json!({ "payment_time": "on-pickup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_parcel_cost_fails_pricing() {
    let (app, _rx) = setup();
    let (_, order) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Nairobi")),
    )
    .await;
    let id = order["order_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/cashier/orders/{id}/price"),
            MOMBASA_CASHIER,
            json!({ "costs": ["300", null] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "costs[1]");

    let (_, polled) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(polled["status"], "Pending Cost Calculation");
}

#[tokio::test]
async fn confirming_an_unpriced_order_conflicts() {
    let (app, _rx) = setup();
    let (_, order) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Nairobi")),
    )
    .await;
    let id = order["order_id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            CUSTOMER,
            json!({ "payment_time": "on-pickup" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state_conflict");
}

#[tokio::test]
async fn walk_in_order_is_priced_at_the_counter() {
    let (app, _rx) = setup();
    let (status, order) = send(
        &app,
        json_request(
            "POST",
            "/cashier/walk-in",
            NAIROBI_CASHIER,
            json!({
                "sender": {
                    "name": "Kamau Njoroge",
                    "email": "kamau@example.com",
                    "phone": "0733444555"
                },
                "receiver": party("Mombasa"),
                "parcels": [{ "content": "tools", "weight": "4", "pieces": 1, "cost": "750" }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "Awaiting Confirmation");
    assert_eq!(order["customer_type"], "walk-in");
    assert_eq!(order["total_cost"], "750");
    assert_eq!(order["sender"]["county"], "Nairobi");
    assert_eq!(order["served_by"], "cashier@nairobi.example.com");
    assert_eq!(order["route_id"], 2);
}

#[tokio::test]
async fn role_and_identity_are_enforced() {
    let (app, _rx) = setup();

    let (status, _) = send(&app, get_request("/county/pickups", &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get_request("/county/pickups", TRANSIT_DRIVER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/transit/check-in",
            MOMBASA_DRIVER,
            json!({ "county": "Mombasa" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn pickup_payment_requires_a_mode() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-pickup").await;

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/collect"), MOMBASA_DRIVER),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "payment_mode_required");

    let (_, still) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(still["status"], "To Be Collected");

    let (status, collected) = send(
        &app,
        json_request(
            "POST",
            &format!("/county/orders/{id}/collect"),
            MOMBASA_DRIVER,
            json!({ "payment_mode": "mpesa" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collected["status"], "Collected");
    assert_eq!(collected["payment_mode"], "mpesa");
    assert!(!collected["paid_at"].is_null());
    assert_eq!(collected["assigned_county_driver_id"], 10);
}

#[tokio::test]
async fn concurrent_collection_has_exactly_one_winner() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-delivery").await;
    let uri = format!("/county/orders/{id}/collect");

    let (first, second) = tokio::join!(
        app.clone().oneshot(empty_request("POST", &uri, MOMBASA_DRIVER)),
        app.clone().oneshot(empty_request("POST", &uri, OTHER_MOMBASA_DRIVER)),
    );
    let mut statuses = vec![
        first.unwrap().status().as_u16(),
        second.unwrap().status().as_u16(),
    ];
    statuses.sort();

    assert_eq!(statuses, vec![200, 409]);
}

#[tokio::test]
async fn office_dropoff_reports_partial_success() {
    let (app, _rx) = setup();
    let mine = confirmed_order(&app, "Nairobi", "on-delivery").await;
    let theirs = confirmed_order(&app, "Nakuru", "on-delivery").await;

    send(
        &app,
        empty_request("POST", &format!("/county/orders/{mine}/collect"), MOMBASA_DRIVER),
    )
    .await;
    send(
        &app,
        empty_request("POST", &format!("/county/orders/{theirs}/collect"), OTHER_MOMBASA_DRIVER),
    )
    .await;

    let (status, outcome) = send(
        &app,
        json_request(
            "POST",
            "/county/dropoff",
            MOMBASA_DRIVER,
            json!({ "order_ids": [mine, theirs] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["message"], "1 of 2 orders updated");
    assert_eq!(outcome["updated"], json!([mine]));
    assert_eq!(outcome["skipped"][0]["order_id"], json!(theirs));

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/county/dropoff",
            MOMBASA_DRIVER,
            json!({ "order_ids": [theirs] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state_conflict");
    assert_eq!(body["outcome"]["message"], "0 of 1 orders updated");
}

#[tokio::test]
async fn empty_batch_is_a_validation_error() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        empty_request("POST", "/county/dropoff", MOMBASA_DRIVER),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "order_ids");
}

#[tokio::test]
async fn order_travels_from_sender_to_receiver() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-pickup").await;

    let (_, pickups) = send(&app, get_request("/county/pickups", MOMBASA_DRIVER)).await;
    assert_eq!(pickups.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/county/orders/{id}/collect"),
            MOMBASA_DRIVER,
            json!({ "payment_mode": "cash" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, staged) = send(
        &app,
        empty_request("PUT", &format!("/worklists/office_dropoff/{id}"), MOMBASA_DRIVER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(staged["order_ids"], json!([id]));

    let (status, outcome) = send(&app, empty_request("POST", "/county/dropoff", MOMBASA_DRIVER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["message"], "1 of 1 orders updated");

    let (_, staged) = send(&app, get_request("/worklists/office_dropoff", MOMBASA_DRIVER)).await;
    assert_eq!(staged["order_ids"], json!([]));

    let (_, transfers) = send(&app, get_request("/transit/transfers", TRANSIT_DRIVER)).await;
    assert_eq!(transfers.as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Mombasa" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, transfers) = send(&app, get_request("/transit/transfers", TRANSIT_DRIVER)).await;
    assert_eq!(transfers.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request("POST", "/transit/pickups", TRANSIT_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, in_transit) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(in_transit["status"], "In Transit");
    assert_eq!(in_transit["assigned_transit_driver_id"], 20);
    assert!(!in_transit["transit_start_time"].is_null());

    let (status, _) = send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Nairobi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, dropoffs) = send(&app, get_request("/transit/dropoffs", TRANSIT_DRIVER)).await;
    assert_eq!(dropoffs.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request("POST", "/transit/dropoffs", TRANSIT_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, arrived) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(arrived["status"], "To Be Delivered");
    assert_eq!(arrived["current_county_office"], "Nairobi");
    assert_eq!(arrived["transfers"][0]["from_county"], "Mombasa");
    assert_eq!(arrived["transfers"][0]["to_county"], "Nairobi");

    let (status, _) = send(
        &app,
        empty_request("PUT", &format!("/worklists/delivery_dispatch/{id}"), NAIROBI_DRIVER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request("POST", "/county/dispatch", NAIROBI_DRIVER)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, out) = send(&app, get_request("/county/in-delivery", NAIROBI_DRIVER)).await;
    assert_eq!(out[0]["status"], "in delivery");

    let (status, delivered) = send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/deliver"), NAIROBI_DRIVER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "Delivered");
    assert!(!delivered["delivery_time"].is_null());

    let tracking_number = delivered["tracking_number"].as_str().unwrap();
    let (status, tracked) = send(&app, get_request(&format!("/track/{tracking_number}"), &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["status"], "Delivered");
    assert_eq!(tracked["destination_county"], "Nairobi");
}

#[tokio::test]
async fn delivery_payment_is_taken_on_delivery() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Voi", "on-delivery").await;

    send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/collect"), MOMBASA_DRIVER),
    )
    .await;
    send(
        &app,
        json_request("POST", "/county/dropoff", MOMBASA_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;
    send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Mombasa" })),
    )
    .await;
    send(
        &app,
        json_request("POST", "/transit/pickups", TRANSIT_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;
    send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Voi" })),
    )
    .await;
    let (status, _) = send(
        &app,
        json_request("POST", "/transit/dropoffs", TRANSIT_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let voi_driver: Headers<'_> = &[
        ("x-user-id", "31"),
        ("x-user-role", "county_driver"),
        ("x-county", "Voi"),
    ];

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/deliver"), voi_driver),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "payment_mode_required");

    let (status, delivered) = send(
        &app,
        json_request(
            "POST",
            &format!("/county/orders/{id}/deliver"),
            voi_driver,
            json!({ "payment_mode": "card" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "Delivered");
    assert_eq!(delivered["payment_mode"], "card");
}

#[tokio::test]
async fn checking_in_at_the_terminus_reverses_the_driver() {
    let (app, _rx) = setup();

    let (status, route) = send(&app, get_request("/transit/route", TRANSIT_DRIVER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route["current_location"], "Mombasa");
    assert_eq!(route["destination"], "Kisumu");

    let (status, outcome) = send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Kisumu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["reversed"], true);
    assert_eq!(outcome["route"]["route_id"], 2);
    assert_eq!(outcome["route"]["direction"], "reverse");
    assert_eq!(outcome["route"]["current_location"], "Kisumu");
    assert_eq!(outcome["route"]["destination"], "Mombasa");

    let (_, history) = send(&app, get_request("/transit/check-ins", TRANSIT_DRIVER)).await;
    assert_eq!(history[0]["county"], "Kisumu");
}

#[tokio::test]
async fn off_route_check_in_is_rejected() {
    let (app, _rx) = setup();
    let (status, body) = send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Meru" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "county");
}

#[tokio::test]
async fn unknown_tracking_number_returns_404() {
    let (app, _rx) = setup();
    let response = app
        .oneshot(get_request("/track/MC0000000000000000", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _rx) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/orders/{fake_id}"), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_batch_body_never_falls_back_to_the_worklist() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-delivery").await;
    send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/collect"), MOMBASA_DRIVER),
    )
    .await;
    send(
        &app,
        empty_request("PUT", &format!("/worklists/office_dropoff/{id}"), MOMBASA_DRIVER),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/county/dropoff",
            MOMBASA_DRIVER,
            json!({ "order_ids": ["not-a-uuid"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["field"], "body");

    let (_, order) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(order["status"], "Collected");

    let (_, staged) = send(&app, get_request("/worklists/office_dropoff", MOMBASA_DRIVER)).await;
    assert_eq!(staged["order_ids"], json!([id]));
}

#[tokio::test]
async fn unknown_payment_mode_is_a_validation_error() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-pickup").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/county/orders/{id}/collect"),
            MOMBASA_DRIVER,
            json!({ "payment_mode": "bitcoin" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "payment_mode");

    let (_, order) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(order["status"], "To Be Collected");
}

#[tokio::test]
async fn rejected_confirm_keeps_the_staged_worklist() {
    let (app, _rx) = setup();
    let id = confirmed_order(&app, "Nairobi", "on-delivery").await;
    send(
        &app,
        empty_request("POST", &format!("/county/orders/{id}/collect"), MOMBASA_DRIVER),
    )
    .await;
    send(
        &app,
        json_request("POST", "/county/dropoff", MOMBASA_DRIVER, json!({ "order_ids": [id] })),
    )
    .await;

    let (status, _) = send(
        &app,
        empty_request("PUT", &format!("/worklists/transit_pickup/{id}"), TRANSIT_DRIVER),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, empty_request("POST", "/transit/pickups", TRANSIT_DRIVER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "check_in");

    let (_, staged) = send(&app, get_request("/worklists/transit_pickup", TRANSIT_DRIVER)).await;
    assert_eq!(staged["order_ids"], json!([id]));

    send(
        &app,
        json_request("POST", "/transit/check-in", TRANSIT_DRIVER, json!({ "county": "Mombasa" })),
    )
    .await;
    let (status, _) = send(&app, empty_request("POST", "/transit/pickups", TRANSIT_DRIVER)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, staged) = send(&app, get_request("/worklists/transit_pickup", TRANSIT_DRIVER)).await;
    assert_eq!(staged["order_ids"], json!([]));
}

#[tokio::test]
async fn unresolvable_identity_cannot_confirm() {
    let (app, _rx) = setup();
    let (_, order) = send(
        &app,
        json_request("POST", "/orders", CUSTOMER, draft("Mombasa", "Nairobi")),
    )
    .await;
    let id = order["order_id"].as_str().unwrap();
    send(
        &app,
        json_request(
            "POST",
            &format!("/cashier/orders/{id}/price"),
            MOMBASA_CASHIER,
            json!({ "costs": ["300", "200"] }),
        ),
    )
    .await;

    let untyped_driver: Headers<'_> = &[("x-user-id", "10"), ("x-user-role", "driver")];
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            untyped_driver,
            json!({ "payment_time": "on-pickup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/orders/{id}/confirm"),
            &[("x-user-id", "ten"), ("x-user-role", "customer")],
            json!({ "payment_time": "on-pickup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, polled) = send(&app, get_request(&format!("/orders/{id}"), &[])).await;
    assert_eq!(polled["status"], "Awaiting Confirmation");
}
