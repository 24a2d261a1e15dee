//! Role policy.
//!
//! The admin-vs-super-admin asymmetry is decided here, once, and consulted by
//! every mutating operation. Handlers never compare role strings directly.

use proplet_common::{AppError, AppResult};
use proplet_db::entities::user::{self, UserRole};

/// Whether the actor holds any moderation role.
#[must_use]
pub const fn is_staff(role: UserRole) -> bool {
    matches!(role, UserRole::Admin | UserRole::SuperAdmin)
}

/// Whether `actor` may act on an identity held by `target`.
///
/// A plain admin may act on tenants and landlords only. A super-admin may act
/// on anyone, other admins included.
#[must_use]
pub const fn can_moderate_identity(actor: UserRole, target: UserRole) -> bool {
    match actor {
        UserRole::SuperAdmin => true,
        UserRole::Admin => matches!(target, UserRole::Tenant | UserRole::Landlord),
        UserRole::Tenant | UserRole::Landlord => false,
    }
}

/// Whether `actor` may moderate property listings.
#[must_use]
pub const fn can_moderate_listings(actor: UserRole) -> bool {
    is_staff(actor)
}

/// Whether `actor` may read the audit trail and fraud flags.
#[must_use]
pub const fn can_view_audit(actor: UserRole) -> bool {
    matches!(actor, UserRole::SuperAdmin)
}

/// Require that the actor may act on the target identity.
pub fn require_identity_moderation(
    actor: &user::Model,
    target: &user::Model,
) -> AppResult<()> {
    if can_moderate_identity(actor.user_type, target.user_type) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Insufficient role for this identity".to_string(),
        ))
    }
}

/// Require a listing-moderation role.
pub fn require_listing_moderation(actor: &user::Model) -> AppResult<()> {
    if can_moderate_listings(actor.user_type) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only admins can moderate listings".to_string(),
        ))
    }
}

/// Require super-admin access to the audit surface.
pub fn require_audit_access(actor: &user::Model) -> AppResult<()> {
    if can_view_audit(actor.user_type) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only super-admins can view the audit trail".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_cannot_touch_super_admin() {
        assert!(can_moderate_identity(UserRole::Admin, UserRole::Tenant));
        assert!(can_moderate_identity(UserRole::Admin, UserRole::Landlord));
        assert!(!can_moderate_identity(UserRole::Admin, UserRole::Admin));
        assert!(!can_moderate_identity(UserRole::Admin, UserRole::SuperAdmin));
    }

    #[test]
    fn test_super_admin_can_touch_anyone() {
        for target in [
            UserRole::Tenant,
            UserRole::Landlord,
            UserRole::Admin,
            UserRole::SuperAdmin,
        ] {
            assert!(can_moderate_identity(UserRole::SuperAdmin, target));
        }
    }

    #[test]
    fn test_non_staff_cannot_moderate() {
        assert!(!can_moderate_identity(UserRole::Tenant, UserRole::Tenant));
        assert!(!can_moderate_identity(UserRole::Landlord, UserRole::Tenant));
        assert!(!can_moderate_listings(UserRole::Tenant));
    }

    #[test]
    fn test_audit_is_super_admin_only() {
        assert!(can_view_audit(UserRole::SuperAdmin));
        assert!(!can_view_audit(UserRole::Admin));
    }
}
