//! Money type
//!
//! Domain primitive for catalog prices and charged amounts.
//! Values are validated at construction time, so a negative price or a
//! price with sub-cent precision cannot exist in the system.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value a `NUMERIC(10, 2)` column can hold
const MAX_MONEY: &str = "99999999.99";

/// Fractional digits for every monetary value
const SCALE: u32 = 2;

/// Money represents a validated, non-negative monetary value.
///
/// # Invariants
/// - Value is zero or positive
/// - At most 2 decimal places (always rendered with exactly 2)
/// - Fits in `NUMERIC(10, 2)`
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use game_store::domain::Money;
///
/// let price = Money::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(price.to_string(), "19.99");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

/// Errors that can occur when creating Money or Pricing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_MONEY})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),

    #[error("Discount price {discount} must be lower than price {price}")]
    DiscountNotBelowPrice { price: Decimal, discount: Decimal },
}

fn max_money() -> Decimal {
    Decimal::new(9_999_999_999, SCALE)
}

impl Money {
    /// Create a new Money value with validation.
    ///
    /// # Errors
    /// - `MoneyError::Negative` if value < 0
    /// - `MoneyError::TooManyDecimals` if more than 2 significant decimal places
    /// - `MoneyError::Overflow` if value does not fit the store column
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::Negative(value));
        }

        // "15.500" is fine, "15.505" is not
        let normalized = value.normalize();
        if normalized.scale() > SCALE {
            return Err(MoneyError::TooManyDecimals(normalized.scale()));
        }

        if value > max_money() {
            return Err(MoneyError::Overflow);
        }

        let mut value = normalized;
        value.rescale(SCALE);
        Ok(Self(value))
    }

    /// Zero amount
    pub fn zero() -> Self {
        Self(Decimal::new(0, SCALE))
    }

    /// Build from a value read back from a `NUMERIC(10, 2)` column.
    ///
    /// The column constraints already guarantee the invariants; the value is
    /// only rounded to the canonical scale.
    pub fn from_store(value: Decimal) -> Self {
        Self(value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add two amounts, failing if the sum leaves the representable range.
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        Money::new(self.0 + other.0)
    }

    /// Difference `self - other`, floored at zero.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        if other.0 >= self.0 {
            Money::zero()
        } else {
            Money(self.0 - other.0)
        }
    }

    /// Sum a sequence of amounts.
    pub fn sum<'a, I>(amounts: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| MoneyError::ParseError(e.to_string()))?;
        Money::new(decimal)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Money::from_str(&value)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

/// Price of a catalog entry: list price plus optional discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub price: Money,
    pub discount_price: Option<Money>,
}

impl Pricing {
    /// Validated pricing: a discount must be strictly lower than the list price.
    pub fn new(price: Money, discount_price: Option<Money>) -> Result<Self, MoneyError> {
        if let Some(discount) = discount_price {
            if discount >= price {
                return Err(MoneyError::DiscountNotBelowPrice {
                    price: price.value(),
                    discount: discount.value(),
                });
            }
        }

        Ok(Self {
            price,
            discount_price,
        })
    }

    /// Pricing read from the store, where the CHECK constraint already holds
    pub fn from_store(price: Decimal, discount_price: Option<Decimal>) -> Self {
        Self {
            price: Money::from_store(price),
            discount_price: discount_price.map(Money::from_store),
        }
    }

    /// Discount price if set and lower than the list price, else the list price.
    pub fn effective(&self) -> Money {
        match self.discount_price {
            Some(discount) if discount < self.price => discount,
            _ => self.price,
        }
    }

    pub fn has_discount(&self) -> bool {
        self.effective() < self.price
    }

    /// Rounded discount percentage shown next to discounted prices
    pub fn discount_percent(&self) -> u32 {
        if !self.has_discount() || self.price.is_zero() {
            return 0;
        }
        let saved = self.price.value() - self.effective().value();
        let percent = (saved * Decimal::ONE_HUNDRED / self.price.value())
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        percent.to_u32().unwrap_or(0)
    }
}
