//! Operation Context
//!
//! Carries the caller's identity and tracing metadata into every core
//! operation. The core reads identity only from here, never from transport
//! state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::DomainError;

/// Role of a storefront user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Authenticated storefront user acting on this request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Context for an operation, used for authorization and tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// API key ID of the calling presentation layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<Uuid>,

    /// Current user, resolved from X-Request-User-Id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty (anonymous) context
    pub fn new() -> Self {
        Self {
            api_key_id: None,
            identity: None,
            correlation_id: None,
        }
    }

    /// Create context with API key
    pub fn with_api_key(mut self, api_key_id: Uuid) -> Self {
        self.api_key_id = Some(api_key_id);
        self
    }

    /// Create context acting as the given user
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.identity.map(|identity| identity.user_id)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.identity, Some(Identity { role: Role::Admin, .. }))
    }

    /// User ID of the caller, or `Unauthorized` for anonymous requests
    pub fn require_user(&self) -> Result<i64, DomainError> {
        self.current_user_id()
            .ok_or_else(|| DomainError::Unauthorized("login required".to_string()))
    }

    /// User ID of an admin caller
    pub fn require_admin(&self) -> Result<i64, DomainError> {
        let user_id = self.require_user()?;
        if !self.is_admin() {
            return Err(DomainError::Unauthorized("admin role required".to_string()));
        }
        Ok(user_id)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
