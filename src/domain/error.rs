//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Storefront failure taxonomy
///
/// These errors represent business rule violations and invariant failures of
/// the commerce core. They are independent of the web/infrastructure layer and
/// never carry store error text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced game, category or cart entry is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// A purchase already exists for this game
    #[error("Game {game_id} is already owned")]
    AlreadyOwned { game_id: i64 },

    /// The game is already in the cart
    #[error("Game {game_id} is already in the cart")]
    AlreadyInCart { game_id: i64 },

    /// Uniqueness or reference conflict outside the cart
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Out-of-range rating, non-positive identifier, malformed value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation requires an authenticated or privileged user
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Reviewing requires owning the game
    #[error("Game {game_id} must be owned to be reviewed")]
    NotOwned { game_id: i64 },

    /// Checkout on an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Multi-row write rolled back
    #[error("Transaction failed, no changes were applied")]
    TransactionFailed,

    /// Store did not answer in time; the whole operation may be retried
    #[error("Store timed out, please retry")]
    Timeout,
}

impl DomainError {
    /// Create a not-found error for a game
    pub fn game_not_found(game_id: i64) -> Self {
        Self::NotFound(format!("game {}", game_id))
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::AlreadyOwned { .. }
                | Self::AlreadyInCart { .. }
                | Self::Conflict(_)
                | Self::InvalidInput(_)
                | Self::Unauthorized(_)
                | Self::NotOwned { .. }
                | Self::EmptyCart
        )
    }

    /// Check if retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_conflicts_are_client_errors() {
        let err = DomainError::AlreadyInCart { game_id: 7 };
        assert!(err.is_client_error());
        assert!(err.to_string().contains('7'));

        let err = DomainError::AlreadyOwned { game_id: 7 };
        assert!(err.is_client_error());
    }

    #[test]
    fn test_transaction_failed_hides_details() {
        let err = DomainError::TransactionFailed;
        assert!(!err.is_client_error());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Transaction failed, no changes were applied");
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = DomainError::Timeout;
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_game_not_found() {
        let err = DomainError::game_not_found(42);
        assert_eq!(err, DomainError::NotFound("game 42".to_string()));
    }
}
