//! Customer model and upsert inputs.

use rust_decimal::Decimal;
use serde::Serialize;
use storesync_core::{CustomerId, RemoteId, TenantId};

/// Name given to customers the remote store reports without a first name.
pub const UNKNOWN_CUSTOMER_NAME: &str = "Unknown";
/// Email given to customers the remote store reports without an email.
pub const PLACEHOLDER_EMAIL: &str = "dummy@gmail.com";
/// Name of synthesized guest customers.
pub const GUEST_NAME: &str = "Guest";
/// Email of synthesized guest customers.
pub const GUEST_EMAIL: &str = "guest@example.com";

/// A reconciled customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub remote_id: RemoteId,
    pub name: String,
    pub email: String,
}

/// Values written when a customer row is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerFields {
    pub name: String,
    pub email: String,
}

/// Values written when a customer row already exists.
///
/// `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Create-or-update a customer keyed by remote identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerUpsert {
    pub remote_id: RemoteId,
    pub create: CustomerFields,
    pub update: CustomerChanges,
}

impl CustomerUpsert {
    /// Upsert for a customer reported by the remote store.
    ///
    /// Missing values fall back to placeholders on create and leave the
    /// stored value untouched on update.
    #[must_use]
    pub fn from_remote(remote_id: RemoteId, name: Option<String>, email: Option<String>) -> Self {
        Self {
            remote_id,
            create: CustomerFields {
                name: name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_CUSTOMER_NAME.to_string()),
                email: email
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_EMAIL.to_string()),
            },
            update: CustomerChanges { name, email },
        }
    }

    /// Upsert for the guest customer of an order placed without a customer.
    ///
    /// An existing guest is never modified.
    #[must_use]
    pub fn guest_for_order(order_remote_id: &RemoteId) -> Self {
        Self {
            remote_id: RemoteId::guest_for_order(order_remote_id),
            create: CustomerFields {
                name: GUEST_NAME.to_string(),
                email: GUEST_EMAIL.to_string(),
            },
            update: CustomerChanges::default(),
        }
    }
}

/// A customer together with the summed totals of their orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSpend {
    pub customer_id: CustomerId,
    pub name: String,
    pub spend: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote_defaults_on_create_only() {
        let upsert = CustomerUpsert::from_remote(RemoteId::new("1"), None, None);
        assert_eq!(upsert.create.name, UNKNOWN_CUSTOMER_NAME);
        assert_eq!(upsert.create.email, PLACEHOLDER_EMAIL);
        assert_eq!(upsert.update, CustomerChanges::default());
    }

    #[test]
    fn test_from_remote_carries_values() {
        let upsert = CustomerUpsert::from_remote(
            RemoteId::new("1"),
            Some("Ada".to_string()),
            Some("ada@example.com".to_string()),
        );
        assert_eq!(upsert.create.name, "Ada");
        assert_eq!(upsert.update.name.as_deref(), Some("Ada"));
        assert_eq!(upsert.update.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_guest_upsert() {
        let upsert = CustomerUpsert::guest_for_order(&RemoteId::new("77"));
        assert_eq!(upsert.remote_id.as_str(), "guest-77");
        assert_eq!(upsert.create.name, GUEST_NAME);
        assert_eq!(upsert.create.email, GUEST_EMAIL);
        assert_eq!(upsert.update, CustomerChanges::default());
    }
}
