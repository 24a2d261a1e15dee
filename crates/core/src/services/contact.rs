//! Contact-channel verification.
//!
//! Both channels must be confirmed before an identity submission enters the
//! review queue. Codes live in Redis with a bounded TTL and are consumed
//! exactly once.

use proplet_common::{AppError, AppResult, CodeKind, CodeStore};
use proplet_db::entities::user;
use proplet_db::repositories::UserRepository;
use std::sync::Arc;
use tracing::info;

use super::email::EmailSender;
use super::whatsapp::WhatsAppSender;

/// Service for email and phone verification codes.
#[derive(Clone)]
pub struct ContactVerificationService {
    codes: CodeStore,
    user_repo: UserRepository,
    email: Arc<dyn EmailSender>,
    whatsapp: Arc<dyn WhatsAppSender>,
}

impl ContactVerificationService {
    /// Create a new contact verification service.
    #[must_use]
    pub fn new(
        codes: CodeStore,
        user_repo: UserRepository,
        email: Arc<dyn EmailSender>,
        whatsapp: Arc<dyn WhatsAppSender>,
    ) -> Self {
        Self {
            codes,
            user_repo,
            email,
            whatsapp,
        }
    }

    /// Issue and deliver a verification code for one channel.
    ///
    /// Re-requesting replaces any outstanding code for the same channel.
    pub async fn request_code(&self, user: &user::Model, kind: CodeKind) -> AppResult<()> {
        let code = self.codes.issue(kind, &user.id).await?;

        match kind {
            CodeKind::Email => {
                let body = format!(
                    "Your verification code is {code}. It expires in 10 minutes."
                );
                self.email
                    .send(&user.email, "Verify your email address", &body)
                    .await?;
            }
            CodeKind::Phone => {
                let phone = user.phone.as_deref().ok_or_else(|| {
                    AppError::BadRequest("No phone number on the account".to_string())
                })?;
                let body = format!(
                    "Your verification code is {code}. It expires in 10 minutes."
                );
                self.whatsapp.send_text(phone, &body).await?;
            }
        }

        Ok(())
    }

    /// Confirm a code and mark the channel verified.
    ///
    /// A wrong or expired code is a `BadRequest`; the stored code survives
    /// failed attempts until its TTL lapses.
    pub async fn confirm_code(
        &self,
        user: &user::Model,
        kind: CodeKind,
        code: &str,
    ) -> AppResult<()> {
        if !self.codes.consume(kind, &user.id, code).await? {
            return Err(AppError::BadRequest(
                "Invalid or expired verification code".to_string(),
            ));
        }

        self.user_repo
            .set_contact_verified(&user.id, kind == CodeKind::Email)
            .await?;

        info!(user_id = %user.id, "Contact channel verified");
        Ok(())
    }
}
