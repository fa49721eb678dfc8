/// Request authentication context and role guards
///
/// After the API's JWT middleware validates a bearer token, it inserts an
/// [`AuthContext`] into the request extensions. Handlers extract it with
/// Axum's `Extension` extractor and use the typed role guards instead of
/// comparing role strings inline.
///
/// # Example
///
/// ```
/// use smarthelper_shared::auth::middleware::AuthContext;
/// use smarthelper_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Family);
/// assert!(auth.require_family().is_ok());
/// assert!(auth.require_helper().is_err());
/// ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Error type for role authorization failures
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    /// Caller does not have the required role
    #[error("Only {required} accounts may perform this operation")]
    WrongRole {
        /// Role the operation requires ("family" or "helper")
        required: &'static str,
    },
}

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Marketplace role carried by the token
    pub role: UserRole,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Requires the caller to be a family account
    ///
    /// # Errors
    ///
    /// Returns `RoleError::WrongRole` for helper callers
    pub fn require_family(&self) -> Result<(), RoleError> {
        match self.role {
            UserRole::Family => Ok(()),
            UserRole::Helper => Err(RoleError::WrongRole { required: "family" }),
        }
    }

    /// Requires the caller to be a helper account
    ///
    /// # Errors
    ///
    /// Returns `RoleError::WrongRole` for family callers
    pub fn require_helper(&self) -> Result<(), RoleError> {
        match self.role {
            UserRole::Helper => Ok(()),
            UserRole::Family => Err(RoleError::WrongRole { required: "helper" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_guards() {
        let family = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Family);
        assert!(family.require_family().is_ok());
        assert!(family.require_helper().is_err());

        let helper = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Helper);
        assert!(helper.require_helper().is_ok());
        assert!(helper.require_family().is_err());
    }
}
