//! Integration test harness for storesync.
//!
//! [`TestContext`] wires the real router to an in-memory store and a mock
//! remote shop, so the HTTP API can be exercised end to end without a
//! database or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = TestContext::new().await;
//! let tenant = ctx.register_tenant(OWNER, "Demo").await;
//! ctx.mount_shop(json!([]), json!([]), json!([])).await;
//! let (status, body) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::SecretString;
use serde_json::Value;
use storesync_core::UserId;
use storesync_server::config::RemoteConfig;
use storesync_server::db::{MemoryStore, SyncStore};
use storesync_server::middleware::Claims;
use storesync_server::models::{NewTenant, Tenant};
use storesync_server::remote::ShopifyRestClient;
use storesync_server::state::AppState;
use storesync_server::sync::SyncOptions;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signing key shared by the router and [`bearer`].
pub const JWT_SECRET: &str = "kQ8#vN2$xL5!pR9@tW3^zB7&mC4*hF6%";

/// Access token accepted by the mock shop.
pub const SHOP_TOKEN: &str = "shpat_integration";

/// Sync options with a short retry backoff.
#[must_use]
pub fn test_sync_options() -> SyncOptions {
    SyncOptions {
        retry_backoff: Duration::from_millis(5),
        timeout: Duration::from_secs(10),
        ..SyncOptions::default()
    }
}

/// Mint a valid bearer token for `user`, good for one hour.
#[must_use]
pub fn bearer(user: UserId) -> String {
    let claims = Claims {
        user_id: user,
        exp: jsonwebtoken::get_current_timestamp() + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token");
    format!("Bearer {token}")
}

/// Router, store and mock shop for one test.
pub struct TestContext {
    pub shop: MockServer,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestContext {
    /// Context over a fresh [`MemoryStore`].
    pub async fn new() -> Self {
        Self::with_store(|memory| memory).await
    }

    /// Context whose router uses `wrap(memory)` as its store.
    ///
    /// The unwrapped [`MemoryStore`] stays reachable through `store` so tests
    /// can inspect what was written.
    pub async fn with_store<F, S>(wrap: F) -> Self
    where
        F: FnOnce(Arc<MemoryStore>) -> Arc<S>,
        S: SyncStore + 'static,
    {
        let shop = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let remote = ShopifyRestClient::new(&RemoteConfig::default())
            .expect("Failed to build remote client");

        let state = AppState::new(
            wrap(store.clone()),
            Arc::new(remote),
            test_sync_options(),
            &SecretString::from(JWT_SECRET),
        );

        Self {
            shop,
            store,
            router: storesync_server::app(state),
        }
    }

    /// Register a tenant pointing at the mock shop.
    pub async fn register_tenant(&self, owner: UserId, name: &str) -> Tenant {
        self.store
            .create_tenant(
                owner,
                NewTenant {
                    name: name.to_string(),
                    store_url: self.shop.uri(),
                    api_token: SecretString::from(SHOP_TOKEN),
                },
            )
            .await
            .expect("Failed to register tenant")
    }

    /// Serve `records` as the `resource` collection of the mock shop.
    pub async fn mount_collection(&self, resource: &str, records: Value) {
        let mut body = serde_json::Map::new();
        body.insert(resource.to_string(), records);

        Mock::given(method("GET"))
            .and(path(collection_path(resource)))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Object(body)))
            .mount(&self.shop)
            .await;
    }

    /// Serve all three collections of the mock shop.
    pub async fn mount_shop(&self, customers: Value, products: Value, orders: Value) {
        self.mount_collection("customers", customers).await;
        self.mount_collection("products", products).await;
        self.mount_collection("orders", orders).await;
    }

    /// `GET uri`, authenticated as `user` when given.
    pub async fn get(&self, uri: &str, user: Option<UserId>) -> (StatusCode, Value) {
        let mut request = Request::get(uri);
        if let Some(user) = user {
            request = request.header(header::AUTHORIZATION, bearer(user));
        }
        self.send(request.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    /// `POST uri` with a JSON body, authenticated as `user`.
    pub async fn post_json(&self, uri: &str, user: UserId, body: &Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::AUTHORIZATION, bearer(user))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Send a request through the router; non-JSON bodies come back as a
    /// JSON string.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }
}

/// Request path of a remote collection for the default API version.
#[must_use]
pub fn collection_path(resource: &str) -> String {
    format!(
        "/admin/api/{}/{resource}.json",
        RemoteConfig::default().api_version
    )
}
