//! Shopify Admin REST implementation of [`RemoteStore`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{RemoteCustomer, RemoteError, RemoteOrder, RemoteProduct, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::Tenant;

/// Header carrying the tenant's access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Admin REST client shared by every tenant.
///
/// The client holds no tenant state: the base URL and token come from the
/// [`Tenant`] passed to each call.
#[derive(Clone)]
pub struct ShopifyRestClient {
    inner: Arc<ShopifyRestClientInner>,
}

struct ShopifyRestClientInner {
    client: reqwest::Client,
    api_version: String,
}

impl ShopifyRestClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Protocol` if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Protocol(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ShopifyRestClientInner {
                client,
                api_version: config.api_version.clone(),
            }),
        })
    }

    /// The Admin API version requested.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// Build `<store_url>/admin/api/<version>/<resource>.json`.
    fn resource_url(&self, store_url: &str, resource: &str) -> Result<Url, RemoteError> {
        let raw = format!(
            "{}/admin/api/{}/{resource}.json",
            store_url.trim_end_matches('/'),
            self.inner.api_version
        );
        Url::parse(&raw).map_err(|e| RemoteError::Protocol(format!("invalid store URL: {e}")))
    }

    /// Fetch one collection page and decode the array under `key`.
    async fn get_collection<T: DeserializeOwned>(
        &self,
        tenant: &Tenant,
        url: Url,
        key: &str,
    ) -> Result<Vec<T>, RemoteError> {
        let response = self
            .inner
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, tenant.api_token.expose_secret())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(classify_transport_error)?;

        decode_collection(&body, key)
    }
}

#[async_trait]
impl RemoteStore for ShopifyRestClient {
    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id))]
    async fn fetch_customers(&self, tenant: &Tenant) -> Result<Vec<RemoteCustomer>, RemoteError> {
        let url = self.resource_url(&tenant.store_url, "customers")?;
        let customers: Vec<RemoteCustomer> = self.get_collection(tenant, url, "customers").await?;
        tracing::debug!(count = customers.len(), "Fetched remote customers");
        Ok(customers)
    }

    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id))]
    async fn fetch_products(&self, tenant: &Tenant) -> Result<Vec<RemoteProduct>, RemoteError> {
        let url = self.resource_url(&tenant.store_url, "products")?;
        let products: Vec<RemoteProduct> = self.get_collection(tenant, url, "products").await?;
        tracing::debug!(count = products.len(), "Fetched remote products");
        Ok(products)
    }

    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id))]
    async fn fetch_orders(&self, tenant: &Tenant) -> Result<Vec<RemoteOrder>, RemoteError> {
        let mut url = self.resource_url(&tenant.store_url, "orders")?;
        // Closed and archived orders are excluded unless asked for
        url.query_pairs_mut().append_pair("status", "any");
        let orders: Vec<RemoteOrder> = self.get_collection(tenant, url, "orders").await?;
        tracing::debug!(count = orders.len(), "Fetched remote orders");
        Ok(orders)
    }
}

fn classify_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_builder() {
        RemoteError::Protocol(err.to_string())
    } else {
        RemoteError::Unavailable(err.to_string())
    }
}

fn classify_status(status: StatusCode) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth(status.as_u16()),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Unavailable("rate limited (HTTP 429)".into()),
        s if s.is_server_error() => RemoteError::Unavailable(format!("HTTP {}", s.as_u16())),
        s => RemoteError::Protocol(format!("unexpected HTTP status {}", s.as_u16())),
    }
}

fn decode_collection<T: DeserializeOwned>(body: &[u8], key: &str) -> Result<Vec<T>, RemoteError> {
    let mut envelope: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RemoteError::Protocol(format!("malformed JSON: {e}")))?;

    let collection = envelope
        .get_mut(key)
        .map(serde_json::Value::take)
        .filter(serde_json::Value::is_array)
        .ok_or_else(|| RemoteError::Protocol(format!("missing `{key}` collection")))?;

    serde_json::from_value(collection)
        .map_err(|e| RemoteError::Protocol(format!("invalid `{key}` record: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use secrecy::SecretString;
    use serde_json::json;
    use storesync_core::{TenantId, UserId};
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> ShopifyRestClient {
        ShopifyRestClient::new(&RemoteConfig {
            api_version: "2025-01".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn tenant(store_url: &str) -> Tenant {
        Tenant {
            id: TenantId::new(1),
            user_id: UserId::new(1),
            name: "Demo".to_string(),
            store_url: store_url.to_string(),
            api_token: SecretString::from("shpat_test"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fetch_customers_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-01/customers.json"))
            .and(header("X-Shopify-Access-Token", "shpat_test"))
            .and(query_param_is_missing("status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customers": [
                    {"id": 1, "first_name": "Ada", "email": "ada@example.com"},
                    {"id": 2, "first_name": null, "email": null}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let customers = client()
            .fetch_customers(&tenant(&server.uri()))
            .await
            .unwrap();

        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].id.as_str(), "1");
        assert!(customers[1].first_name.is_none());
    }

    #[tokio::test]
    async fn test_fetch_orders_requests_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-01/orders.json"))
            .and(query_param("status", "any"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [{"id": 10, "total_price": "30.00", "created_at": "2024-01-02T00:00:00Z"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store_url = format!("{}/", server.uri());
        let orders = client().fetch_orders(&tenant(&store_url)).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].customer_ref().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client()
            .fetch_products(&tenant(&server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Auth(401)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client()
            .fetch_products(&tenant(&server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_collection_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": "nope"})))
            .mount(&server)
            .await;

        let err = client()
            .fetch_customers(&tenant(&server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_invalid_store_url_is_protocol_error() {
        let err = client()
            .fetch_customers(&tenant("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            RemoteError::Auth(403)
        ));
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            RemoteError::Protocol(_)
        ));
    }

    #[test]
    fn test_decode_collection_rejects_bad_json() {
        let err = decode_collection::<RemoteCustomer>(b"<html>", "customers").unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }
}
