//! Database repositories.

pub mod alert;
pub mod audit;
pub mod property;
pub mod unlock;
pub mod user;

pub use alert::AlertRepository;
pub use audit::AuditRepository;
pub use property::PropertyRepository;
pub use unlock::UnlockRepository;
pub use user::UserRepository;
