#![allow(dead_code)]

use axum_test::TestServer;
use std::sync::Arc;
use trip_server::core::{AppState, EngineOptions};
use trip_server::engine::ManualClock;
use trip_server::entities::TripRole;
use trip_server::notifications::Notifier;
use trip_server::repositories::MemoryStore;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Istante iniziale dell'orologio dei test
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub state: Arc<AppState<MemoryStore>>,
    pub clock: Arc<ManualClock>,
}

/// Store con alice(1), bob(2), carol(3), dave(4) e il viaggio 100 amministrato da alice
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol"), (4, "dave")] {
        store
            .insert_user(id, &format!("{name}@example.com"), name)
            .await;
    }
    store.insert_trip(100, "Lisbon", 1).await;
    store.insert_member(100, 3, TripRole::Staff).await;
    store
}

/// Crea un AppState per i test, con orologio manuale e notifier opzionale
pub async fn create_test_app(notifier: Option<Arc<dyn Notifier>>) -> TestApp {
    let store = seeded_store().await;
    let clock = Arc::new(ManualClock::at_millis(START_MILLIS));
    let state = Arc::new(AppState::with_options(
        store.clone(),
        JWT_SECRET.to_string(),
        EngineOptions {
            clock: clock.clone(),
            notifier,
            ..EngineOptions::default()
        },
    ));
    let server = create_test_server(state.clone());
    TestApp {
        server,
        store,
        state,
        clock,
    }
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState<MemoryStore>>) -> TestServer {
    let app = trip_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing, valido per 24 ore
pub fn create_test_jwt(user_id: i32, username: &str, jwt_secret: &str) -> String {
    trip_server::core::encode_jwt(username.to_string(), user_id, jwt_secret)
        .expect("Failed to create JWT token")
}

/// Valore dell'header `authorization` per l'utente indicato
pub fn bearer(user_id: i32, username: &str) -> String {
    format!("Bearer {}", create_test_jwt(user_id, username, JWT_SECRET))
}
