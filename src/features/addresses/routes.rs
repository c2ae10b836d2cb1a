use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::addresses::handlers;
use crate::features::addresses::services::AddressService;

/// Create routes for the addresses feature
///
/// Every route requires the `x-user-id` header.
pub fn routes(service: Arc<AddressService>) -> Router {
    Router::new()
        .route(
            "/api/addresses",
            get(handlers::list_addresses).post(handlers::create_address),
        )
        .route(
            "/api/addresses/{id}",
            get(handlers::get_address)
                .patch(handlers::update_address)
                .delete(handlers::delete_address),
        )
        .route(
            "/api/addresses/{id}/default",
            post(handlers::set_default_address),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::features::addresses::repositories::memory::InMemoryAddressRepository;
    use crate::shared::constants::USER_ID_HEADER;

    fn server() -> TestServer {
        let repo = Arc::new(InMemoryAddressRepository::new());
        TestServer::new(routes(Arc::new(AddressService::new(repo)))).unwrap()
    }

    fn caller(user_id: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static(user_id),
        )
    }

    fn body(label: &str) -> Value {
        json!({
            "label": label,
            "recipient_name": "Jane Doe",
            "line1": "1 Main St",
            "city": "Springfield",
            "postal_code": "62704",
            "country": "US"
        })
    }

    #[tokio::test]
    async fn test_requires_user_header() {
        let server = server();

        server
            .get("/api/addresses")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post(&format!("/api/addresses/{}/default", uuid::Uuid::now_v7()))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_default_flow_and_isolation_over_http() {
        let server = server();
        let (name, alice) = caller("alice");
        let (_, bob) = caller("bob");

        let home: Value = server
            .post("/api/addresses")
            .add_header(name.clone(), alice.clone())
            .json(&body("home"))
            .await
            .json();
        assert_eq!(home["data"]["is_default"], true);
        let home_id = home["data"]["id"].as_str().unwrap().to_string();

        let work: Value = server
            .post("/api/addresses")
            .add_header(name.clone(), alice.clone())
            .json(&body("work"))
            .await
            .json();
        assert_eq!(work["data"]["is_default"], false);
        let work_id = work["data"]["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/addresses/{}/default", work_id))
            .add_header(name.clone(), alice.clone())
            .await
            .assert_status_ok();

        let listed: Value = server
            .get("/api/addresses")
            .add_header(name.clone(), alice.clone())
            .await
            .json();
        assert_eq!(listed["meta"]["total"], 2);
        assert_eq!(listed["data"][0]["id"], work_id.as_str());
        assert_eq!(listed["data"][1]["is_default"], false);

        server
            .get(&format!("/api/addresses/{}", home_id))
            .add_header(name.clone(), bob.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/addresses/{}", home_id))
            .add_header(name.clone(), bob)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let cleared: Value = server
            .patch(&format!("/api/addresses/{}", home_id))
            .add_header(name, alice)
            .json(&json!({ "label": null }))
            .await
            .json();
        assert_eq!(cleared["data"]["label"], Value::Null);
        assert_eq!(cleared["data"]["city"], "Springfield");
    }
}
