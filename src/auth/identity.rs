use uuid::Uuid;

use super::token::Claims;
use crate::error::ApiError;
use crate::types::Role;

/// Verified caller identity, attached to the request by the authentication gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_self(&self, target: Uuid) -> bool {
        self.user_id == target
    }

    pub fn is_self_or_admin(&self, target: Uuid) -> bool {
        self.is_self(target) || self.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require(Access::Admin)
    }

    pub fn require_self(&self, target: Uuid) -> Result<(), ApiError> {
        self.require(Access::SelfOnly(target))
    }

    pub fn require_self_or_admin(&self, target: Uuid) -> Result<(), ApiError> {
        self.require(Access::SelfOrAdmin(target))
    }

    /// Single role gate; every route-level and handler-level check funnels through here.
    pub fn require(&self, access: Access) -> Result<(), ApiError> {
        let allowed = match access {
            Access::Admin => self.is_admin(),
            Access::SelfOnly(target) => self.is_self(target),
            Access::SelfOrAdmin(target) => self.is_self_or_admin(target),
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = %self.role, ?access, "access denied");
            Err(ApiError::forbidden(access.denial_message()))
        }
    }
}

/// What a caller must be to pass the authorization gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Admin,
    SelfOnly(Uuid),
    SelfOrAdmin(Uuid),
}

impl Access {
    fn denial_message(&self) -> &'static str {
        match self {
            Access::Admin => "Admin privileges required",
            Access::SelfOnly(_) => "Only the account owner may do this",
            Access::SelfOrAdmin(_) => "Not allowed",
        }
    }
}
