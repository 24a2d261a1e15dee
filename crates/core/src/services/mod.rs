//! Business-logic services.

pub mod access_gate;
pub mod alert;
pub mod audit;
pub mod contact;
pub mod email;
pub mod listing;
pub mod payment;
pub mod policy;
pub mod unlock;
pub mod verification;
pub mod whatsapp;

pub use access_gate::{AccessDecision, AccessGate};
pub use alert::{AlertService, DispatchSummary, RegisterAlertInput, alert_matches};
pub use audit::AuditService;
pub use contact::ContactVerificationService;
pub use email::{EmailSender, email_sender_from_config};
pub use listing::{ListingService, SubmitListingInput};
pub use payment::{ChargeSession, ChargeStatus, PaymentProvider, RestPaymentClient};
pub use unlock::{InitializeOutcome, UnlockService, VerifyOutcome};
pub use verification::{SubmitDocumentsInput, VerificationService, VerificationState};
pub use whatsapp::{WhatsAppSender, normalize_phone, whatsapp_sender_from_config};
