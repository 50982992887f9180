use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use tourcab::auth;
use tourcab::config::AppConfig;
use tourcab::db::{self, queries};
use tourcab::handlers;
use tourcab::models::{Role, Taxi, Tour, User};
use tourcab::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiry_hours: 1,
        admin_email: String::new(),
        admin_password: String::new(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
    })
}

fn app(state: &Arc<AppState>) -> Router {
    handlers::router(state.clone())
}

/// Insert a user directly and hand back a valid token for them. The password
/// hash is left empty; only the login test exercises real hashing.
fn seed_user(state: &Arc<AppState>, name: &str, email: &str, role: Role) -> (User, String) {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: "9999999999".to_string(),
        password_hash: String::new(),
        role,
        profile_picture: None,
        created_at: Utc::now().naive_utc(),
    };
    {
        let db = state.db.lock().unwrap();
        queries::create_user(&db, &user).unwrap();
    }
    let token = auth::issue_token(&user, &state.config).unwrap();
    (user, token)
}

fn seed_taxi(state: &Arc<AppState>, owner: &str, name: &str, category: &str) -> Taxi {
    let now = Utc::now().naive_utc();
    let taxi = Taxi {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: "City sedan".to_string(),
        taxi_type: "Sedan".to_string(),
        category: category.to_string(),
        base_price: 0.0,
        price_per_km: 10.0,
        price_per_hour: 0.0,
        minimum_fare: 0.0,
        capacity: 4,
        features: vec!["Driver".to_string()],
        available_areas: vec![],
        fuel_type: "Petrol".to_string(),
        transmission: "Manual".to_string(),
        ac: true,
        driver_included: true,
        image: "/images/default-taxi.jpg".to_string(),
        is_active: true,
        created_by: owner.to_string(),
        created_at: now,
        updated_at: now,
    };
    let db = state.db.lock().unwrap();
    queries::create_taxi(&db, &taxi).unwrap();
    taxi
}

fn seed_tour(state: &Arc<AppState>, owner: &str, name: &str) -> Tour {
    let now = Utc::now().naive_utc();
    let tour = Tour {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: "Two-day hill circuit".to_string(),
        tour_type: "Hill Station".to_string(),
        duration: "2 Days / 1 Night".to_string(),
        price: "₹4999".to_string(),
        category: "hill".to_string(),
        features: vec![],
        inclusions: vec!["Hotel".to_string()],
        places: vec!["Mussoorie".to_string()],
        image: "/images/default-tour.jpg".to_string(),
        max_capacity: 20,
        min_capacity: 2,
        is_active: true,
        created_by: owner.to_string(),
        created_at: now,
        updated_at: now,
    };
    let db = state.db.lock().unwrap();
    queries::create_tour(&db, &tour).unwrap();
    tour
}

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_payload(taxi: &Taxi, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "customerName": "Asha",
        "customerPhone": phone,
        "pickupLocation": "Airport",
        "serviceType": "taxi",
        "serviceId": taxi.id,
    })
}

async fn create_booking(
    state: &Arc<AppState>,
    payload: serde_json::Value,
    token: Option<&str>,
) -> serde_json::Value {
    let res = app(state)
        .oneshot(request("POST", "/api/bookings", token, Some(payload)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["data"].clone()
}

// ── Tests ──

#[tokio::test]
async fn health_check_works() {
    let state = test_state();
    let res = app(&state)
        .oneshot(request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login() {
    let state = test_state();

    let payload = serde_json::json!({
        "name": "Asha",
        "email": "Asha@Example.com",
        "phone": "9900112233",
        "password": "hunter2",
    });
    let res = app(&state)
        .oneshot(request("POST", "/api/auth/register", None, Some(payload.clone())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert!(body["data"]["token"].as_str().is_some());
    // email is normalized and the hash never leaves the server
    assert_eq!(body["data"]["user"]["email"], "asha@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    // duplicate email is rejected
    let res = app(&state)
        .oneshot(request("POST", "/api/auth/register", None, Some(payload)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": "asha@example.com", "password": "hunter2"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": "asha@example.com", "password": "wrong"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_snapshot_survives_service_rename() {
    let state = test_state();
    let (admin, token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let booking = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["serviceDetails"]["name"], "City Cab");

    let res = app(&state)
        .oneshot(request(
            "PUT",
            &format!("/api/taxi/{}", taxi.id),
            Some(&token),
            Some(serde_json::json!({"name": "Metro Cab"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app(&state)
        .oneshot(request(
            "GET",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["serviceDetails"]["name"], "City Cab");
    assert_eq!(body["data"]["serviceName"], "City Cab");
}

#[tokio::test]
async fn booking_numbers_are_unique() {
    let state = test_state();
    let (admin, _) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let mut seen = std::collections::HashSet::new();
    for _ in 0..3 {
        let booking = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
        let number = booking["bookingNumber"].as_str().unwrap().to_string();
        assert!(number.starts_with("JT"));
        assert!(seen.insert(number));
    }
}

#[tokio::test]
async fn cancellation_requires_matching_phone() {
    let state = test_state();
    let (admin, token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let booking = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // no phone at all
    let res = app(&state)
        .oneshot(request("DELETE", &format!("/api/bookings/{booking_id}"), None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // wrong phone looks like a missing booking and changes nothing
    let res = app(&state)
        .oneshot(request(
            "DELETE",
            &format!("/api/bookings/{booking_id}?phone=%2B912222222222"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app(&state)
        .oneshot(request(
            "GET",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["data"]["status"], "pending");

    // matching phone cancels and returns the updated booking
    let res = app(&state)
        .oneshot(request(
            "DELETE",
            &format!("/api/bookings/{booking_id}?phone=%2B911111111111"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn fare_calculation_applies_minimum() {
    let state = test_state();
    let (admin, _) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");
    let mut floor_taxi = seed_taxi(&state, &admin.id, "Floor Cab", "city");
    floor_taxi.minimum_fare = 40.0;
    {
        let db = state.db.lock().unwrap();
        queries::update_taxi(&db, &floor_taxi).unwrap();
    }

    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/taxi/calculate-fare",
            None,
            Some(serde_json::json!({"taxiId": taxi.id, "distance": 5.0})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["totalFare"], "₹50");
    assert_eq!(body["data"]["breakdown"]["totalFare"], 50.0);

    // 2 km at ₹10/km is under the ₹40 floor
    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/taxi/calculate-fare",
            None,
            Some(serde_json::json!({"taxiId": floor_taxi.id, "distance": 2.0})),
        ))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["data"]["totalFare"], "₹40");

    // missing inputs are named
    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/taxi/calculate-fare",
            None,
            Some(serde_json::json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["missing"], serde_json::json!(["taxiId", "distance"]));
}

#[tokio::test]
async fn soft_deleted_taxi_is_hidden_but_bookings_survive() {
    let state = test_state();
    let (admin, token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let booking = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let res = app(&state)
        .oneshot(request(
            "DELETE",
            &format!("/api/taxi/{}", taxi.id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // gone from the public catalog
    let res = app(&state)
        .oneshot(request("GET", "/api/taxi", None, None))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let res = app(&state)
        .oneshot(request("GET", &format!("/api/taxi/{}", taxi.id), None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // still visible to the owner and still attached to the booking
    let res = app(&state)
        .oneshot(request("GET", "/api/taxi/admin/mine", Some(&token), None))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let res = app(&state)
        .oneshot(request(
            "GET",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_owner_or_superadmin_can_modify() {
    let state = test_state();
    let (owner, _) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let (_, other_token) = seed_user(&state, "Other", "other@example.com", Role::Admin);
    let (_, super_token) = seed_user(&state, "Root", "root@example.com", Role::Superadmin);
    let taxi = seed_taxi(&state, &owner.id, "City Cab", "city");

    let res = app(&state)
        .oneshot(request(
            "PUT",
            &format!("/api/taxi/{}", taxi.id),
            Some(&other_token),
            Some(serde_json::json!({"name": "Hijacked Cab"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    {
        let db = state.db.lock().unwrap();
        let unchanged = queries::get_taxi_by_id(&db, &taxi.id).unwrap().unwrap();
        assert_eq!(unchanged.name, "City Cab");
    }

    let res = app(&state)
        .oneshot(request(
            "PUT",
            &format!("/api/taxi/{}", taxi.id),
            Some(&super_token),
            Some(serde_json::json!({"name": "Renamed Cab"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_resolves_service_by_name_fallback() {
    let state = test_state();
    let (admin, _) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    seed_tour(&state, &admin.id, "Hill Circuit");

    let booking = create_booking(
        &state,
        serde_json::json!({
            "customerName": "Asha",
            "customerPhone": "+911111111111",
            "serviceType": "tour",
            "serviceName": "Hill Circuit",
        }),
        None,
    )
    .await;

    assert_eq!(booking["serviceName"], "Hill Circuit");
    assert_eq!(booking["serviceDetails"]["duration"], "2 Days / 1 Night");
    assert_eq!(booking["serviceDetails"]["capacity"], 20);
}

#[tokio::test]
async fn booking_missing_fields_are_listed() {
    let state = test_state();
    let res = app(&state)
        .oneshot(request("POST", "/api/bookings", None, Some(serde_json::json!({}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["missing"],
        serde_json::json!(["customerName", "customerPhone", "serviceType", "serviceId|serviceName"])
    );
}

#[tokio::test]
async fn status_updates_follow_the_transition_graph() {
    let state = test_state();
    let (admin, token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let booking = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let res = app(&state)
        .oneshot(request(
            "PATCH",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            Some(serde_json::json!({"status": "confirmed"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // confirmed cannot go back to pending
    let res = app(&state)
        .oneshot(request(
            "PATCH",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            Some(serde_json::json!({"status": "pending"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // unknown values are rejected outright
    let res = app(&state)
        .oneshot(request(
            "PATCH",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            Some(serde_json::json!({"status": "reopened"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // same-status update is a harmless no-op
    let res = app(&state)
        .oneshot(request(
            "PATCH",
            &format!("/api/bookings/{booking_id}"),
            Some(&token),
            Some(serde_json::json!({"status": "confirmed", "totalAmount": 500.0})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["totalAmount"], 500.0);
}

#[tokio::test]
async fn admin_routes_reject_missing_or_non_admin_tokens() {
    let state = test_state();
    let (_, user_token) = seed_user(&state, "Plain", "plain@example.com", Role::User);

    let res = app(&state)
        .oneshot(request("GET", "/api/bookings", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app(&state)
        .oneshot(request("GET", "/api/bookings", Some(&user_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app(&state)
        .oneshot(request("POST", "/api/taxi", Some("garbage-token"), Some(serde_json::json!({}))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_by_reflects_the_caller() {
    let state = test_state();
    let (admin, admin_token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    let taxi = seed_taxi(&state, &admin.id, "City Cab", "city");

    let anonymous = create_booking(&state, booking_payload(&taxi, "+911111111111"), None).await;
    assert_eq!(anonymous["createdBy"], "user");
    assert!(anonymous["createdByUserId"].is_null());

    let by_admin = create_booking(
        &state,
        booking_payload(&taxi, "+911111111111"),
        Some(&admin_token),
    )
    .await;
    assert_eq!(by_admin["createdBy"], "admin");
    assert_eq!(by_admin["createdByUserId"], admin.id);
}

#[tokio::test]
async fn category_listing_filters_and_normalizes() {
    let state = test_state();
    let (admin, _) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);
    seed_taxi(&state, &admin.id, "City Cab", "city");
    seed_taxi(&state, &admin.id, "Hill Cab", "hill");

    let res = app(&state)
        .oneshot(request("GET", "/api/taxi/category/City", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "City Cab");
}

#[tokio::test]
async fn taxi_creation_validates_and_fills_defaults() {
    let state = test_state();
    let (_, token) = seed_user(&state, "Owner", "owner@example.com", Role::Admin);

    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/taxi",
            Some(&token),
            Some(serde_json::json!({"name": "City Cab"})),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    let missing = body["missing"].as_array().unwrap();
    assert!(missing.contains(&serde_json::json!("pricePerKm")));
    assert!(missing.contains(&serde_json::json!("capacity")));

    let res = app(&state)
        .oneshot(request(
            "POST",
            "/api/taxi",
            Some(&token),
            Some(serde_json::json!({
                "name": "City Cab",
                "description": "City sedan",
                "type": "Sedan",
                "category": "City",
                "pricePerKm": 12.0,
                "capacity": 4,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["data"]["category"], "city");
    assert_eq!(body["data"]["fuelType"], "Petrol");
    assert_eq!(
        body["data"]["features"],
        serde_json::json!(["Driver", "Fuel", "Water", "Parking", "Toll-Tax"])
    );
}
