//! Local entity models.
//!
//! These are the reconciled, tenant-owned records held by the store, plus the
//! upsert inputs the reconciler hands to it. Remote wire shapes live in
//! [`crate::remote::types`].

pub mod customer;
pub mod order;
pub mod product;
pub mod tenant;

pub use customer::{
    Customer, CustomerChanges, CustomerFields, CustomerSpend, CustomerUpsert, GUEST_EMAIL,
    GUEST_NAME, PLACEHOLDER_EMAIL, UNKNOWN_CUSTOMER_NAME,
};
pub use order::{Order, OrderUpsert};
pub use product::{Product, ProductUpsert};
pub use tenant::{NewTenant, Tenant};
