//! Database entities.

pub mod audit_log;
pub mod fraud_flag;
pub mod property;
pub mod property_alert;
pub mod property_unlock;
pub mod user;

pub use audit_log::Entity as AuditLog;
pub use fraud_flag::Entity as FraudFlag;
pub use property::Entity as Property;
pub use property_alert::Entity as PropertyAlert;
pub use property_unlock::Entity as PropertyUnlock;
pub use user::Entity as User;
