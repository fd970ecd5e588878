//! Integration tests per viaggi, membri e inviti ai viaggi

mod common;

#[cfg(test)]
mod trip_tests {
    use super::common::{JWT_SECRET, bearer, create_test_app, create_test_server};
    use axum::http::StatusCode;
    use axum_test::http::HeaderName;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use trip_server::core::{AppState, DevUser};
    use trip_server::notifications::{Notification, Notifier, NotifyError};
    use trip_server::repositories::MemoryStore;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _: i32, _: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Unavailable)
        }
    }

    // ============================================================
    // Test per GET / e autenticazione
    // ============================================================

    #[tokio::test]
    async fn test_root_is_public() {
        let app = create_test_app(None).await;
        let response = app.server.get("/").await;
        response.assert_status_ok();
        response.assert_text("Server is running!");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = create_test_app(None).await;
        let response = app.server.get("/trips/100/members").await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_dev_user_can_use_empty_memory_store() {
        let store = MemoryStore::new();
        store
            .seed_dev_users(&[DevUser {
                user_id: 7,
                username: "erin".to_string(),
                email: "erin@example.com".to_string(),
            }])
            .await;
        let state = Arc::new(AppState::new(store, JWT_SECRET.to_string()));
        let server = create_test_server(state);

        let response = server
            .post("/trips")
            .add_header(authorization(), bearer(7, "erin"))
            .json(&json!({ "title": "Porto" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .post("/trips")
            .add_header(authorization(), bearer(8, "frank"))
            .json(&json!({ "title": "Porto" }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .get("/trips/100/members")
            .add_header(authorization(), "Bearer invalid_token_here")
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_token_of_unknown_user_is_unauthorized() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .get("/trips/100/members")
            .add_header(authorization(), bearer(99, "ghost"))
            .await;
        response.assert_status_unauthorized();
    }

    // ============================================================
    // Test per POST /trips e membri
    // ============================================================

    #[tokio::test]
    async fn test_create_trip_and_list_members() {
        let app = create_test_app(None).await;

        let response = app
            .server
            .post("/trips")
            .add_header(authorization(), bearer(2, "bob"))
            .json(&json!({ "title": "Porto" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let trip: Value = response.json();
        assert_eq!(trip["title"], "Porto");
        assert_eq!(trip["status"], "not_started");
        let trip_id = trip["trip_id"].as_i64().unwrap();

        let response = app
            .server
            .get(&format!("/trips/{}/members", trip_id))
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_ok();
        let members: Vec<Value> = response.json();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["user_id"], 2);
        assert_eq!(members[0]["role"], "administrator");
    }

    #[tokio::test]
    async fn test_create_trip_with_empty_title() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .post("/trips")
            .add_header(authorization(), bearer(2, "bob"))
            .json(&json!({ "title": "" }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_list_members_of_foreign_trip_is_forbidden() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .get("/trips/100/members")
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_forbidden();
        let body: Value = response.json();
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_admin_removes_member() {
        let app = create_test_app(None).await;

        let response = app
            .server
            .delete("/trips/100/members/3")
            .add_header(authorization(), bearer(1, "alice"))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let tables = app.store.snapshot().await;
        assert_eq!(tables.live_members(100).len(), 1);
    }

    #[tokio::test]
    async fn test_staff_cannot_remove_admin() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .delete("/trips/100/members/1")
            .add_header(authorization(), bearer(3, "carol"))
            .await;
        response.assert_status_forbidden();
    }

    // ============================================================
    // Test per POST /trips/{trip_id}/invitations
    // ============================================================

    #[tokio::test]
    async fn test_invite_accept_and_accept_again() {
        let app = create_test_app(None).await;

        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 2 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let invitation: Value = response.json();
        assert_eq!(invitation["status"], "pending");
        assert_eq!(invitation["receiver_id"], 2);
        assert!(invitation.get("notification_error").is_none());
        let invitation_id = invitation["invitation_id"].as_i64().unwrap();

        let response = app
            .server
            .get("/trip-invitations/pending")
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_ok();
        let pending: Vec<Value> = response.json();
        assert_eq!(pending.len(), 1);

        let response = app
            .server
            .post(&format!("/trip-invitations/{}/accept", invitation_id))
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_ok();
        let resolution: Value = response.json();
        assert_eq!(resolution["status"], "accepted");

        let response = app
            .server
            .post(&format!("/trip-invitations/{}/accept", invitation_id))
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_forbidden();

        let tables = app.store.snapshot().await;
        assert!(tables.trip_invitations.is_empty());
        assert_eq!(
            tables
                .live_members(100)
                .iter()
                .filter(|m| m.user_id == 2)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_invitation_conflict() {
        let app = create_test_app(None).await;

        app.server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 2 }))
            .await
            .assert_status(StatusCode::CREATED);

        // un altro membro prova a invitare lo stesso utente
        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(3, "carol"))
            .json(&json!({ "receiver_id": 2 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "TRIP_INVITATION_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_invite_from_non_member_is_forbidden() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(2, "bob"))
            .json(&json!({ "receiver_id": 4 }))
            .await;
        response.assert_status_forbidden();
        assert!(app.store.snapshot().await.trip_invitations.is_empty());
    }

    #[tokio::test]
    async fn test_invite_unknown_receiver() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 42 }))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invite_with_invalid_body() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 0 }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_notification_failure_still_creates_invitation() {
        let app = create_test_app(Some(Arc::new(FailingNotifier))).await;

        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 2 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let invitation: Value = response.json();
        assert_eq!(invitation["notification_error"], "NOTIFICATION_FAILED");
        assert_eq!(app.store.snapshot().await.trip_invitations.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_no_rows() {
        let app = create_test_app(None).await;
        app.store.fail_next_commit();

        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 2 }))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "INTERNAL_SERVER_ERROR");
        assert!(app.store.snapshot().await.trip_invitations.is_empty());
    }

    #[tokio::test]
    async fn test_database_down_maps_to_service_unavailable() {
        let app = create_test_app(None).await;
        app.store.fail_next_begin();

        let response = app
            .server
            .post("/trips/100/invitations")
            .add_header(authorization(), bearer(1, "alice"))
            .json(&json!({ "receiver_id": 2 }))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["error"], "DB_DOWN");
    }

    // ============================================================
    // Test per POST /trip-invitations/{invitation_id}/{action}
    // ============================================================

    #[tokio::test]
    async fn test_withdraw_by_sender_and_deny_by_receiver() {
        let app = create_test_app(None).await;

        let send = |receiver_id: i32| {
            app.server
                .post("/trips/100/invitations")
                .add_header(authorization(), bearer(1, "alice"))
                .json(&json!({ "receiver_id": receiver_id }))
        };
        let first: Value = send(2).await.json();
        let second: Value = send(4).await.json();

        // il destinatario non può ritirare
        app.server
            .post(&format!("/trip-invitations/{}/withdraw", first["invitation_id"]))
            .add_header(authorization(), bearer(2, "bob"))
            .await
            .assert_status_forbidden();

        let response = app
            .server
            .post(&format!("/trip-invitations/{}/withdraw", first["invitation_id"]))
            .add_header(authorization(), bearer(1, "alice"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "withdrawn");

        let response = app
            .server
            .post(&format!("/trip-invitations/{}/deny", second["invitation_id"]))
            .add_header(authorization(), bearer(4, "dave"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "denied");

        let tables = app.store.snapshot().await;
        assert!(tables.trip_invitations.is_empty());
        assert_eq!(tables.live_members(100).len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let app = create_test_app(None).await;
        let response = app
            .server
            .post("/trip-invitations/1/maybe")
            .add_header(authorization(), bearer(2, "bob"))
            .await;
        response.assert_status_bad_request();
    }
}
