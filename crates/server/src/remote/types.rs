//! Wire types for the remote store's REST collections.
//!
//! Only the fields the reconciler consumes are modelled; everything else in
//! the payload is ignored. Remote identities may arrive as JSON numbers or
//! strings and are normalized into [`RemoteId`].

use serde::{Deserialize, Deserializer};
use storesync_core::{RawAmount, RemoteId};

/// A customer as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCustomer {
    #[serde(deserialize_with = "remote_id")]
    pub id: RemoteId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A product as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteProduct {
    #[serde(deserialize_with = "remote_id")]
    pub id: RemoteId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variants: Vec<RemoteVariant>,
}

/// A product variant; only its price is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteVariant {
    #[serde(default)]
    pub price: Option<RawAmount>,
}

/// An order as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrder {
    #[serde(deserialize_with = "remote_id")]
    pub id: RemoteId,
    #[serde(default)]
    pub total_price: Option<RawAmount>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub customer: Option<RemoteOrderCustomer>,
}

impl RemoteOrder {
    /// The remote customer identity this order references, if any.
    #[must_use]
    pub fn customer_ref(&self) -> Option<&RemoteId> {
        self.customer.as_ref().and_then(|c| c.id.as_ref())
    }
}

/// The customer stub embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrderCustomer {
    #[serde(default, deserialize_with = "optional_remote_id")]
    pub id: Option<RemoteId>,
}

/// JSON representations of a remote identity.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl From<RawId> for RemoteId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self::new(n.to_string()),
            RawId::Text(s) => Self::new(s),
        }
    }
}

fn remote_id<'de, D>(deserializer: D) -> Result<RemoteId, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RemoteId::from)
}

fn optional_remote_id<'de, D>(deserializer: D) -> Result<Option<RemoteId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(RemoteId::from))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
