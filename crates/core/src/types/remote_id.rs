//! Remote identity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix used for synthetic guest-customer identities.
const GUEST_PREFIX: &str = "guest-";

/// The external platform's primary key for a record.
///
/// Remote identities are the idempotency key for local upserts: a record with
/// the same `RemoteId` always maps onto the same local row. The platform may
/// report them as JSON numbers or strings; both are normalized to their
/// decimal string form.
///
/// ## Guest identities
///
/// Orders placed without a customer are attached to a synthetic guest
/// customer whose identity is derived from the order, so repeated syncs of the
/// same order resolve to the same guest:
///
/// ```
/// use storesync_core::RemoteId;
///
/// let order = RemoteId::new("450789469");
/// let guest = RemoteId::guest_for_order(&order);
///
/// assert_eq!(guest.as_str(), "guest-450789469");
/// assert!(guest.is_guest());
/// assert!(!order.is_guest());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a remote identity from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the guest-customer identity for an order without a customer.
    #[must_use]
    pub fn guest_for_order(order: &Self) -> Self {
        Self(format!("{GUEST_PREFIX}{}", order.0))
    }

    /// Whether this identity was synthesized for a guest customer.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `RemoteId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RemoteId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RemoteId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RemoteId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
