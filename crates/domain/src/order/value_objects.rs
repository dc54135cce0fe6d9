//! Value objects for the order domain.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser};
use serde_json::{Number, Value};

/// Identifier of the customer an order or transaction belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a customer ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the customer ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ID is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Money amount as an exact decimal.
///
/// Serialized as a bare JSON number so stored records and event payloads carry
/// `"amount": 100` or `"amount": 12.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from whole units.
    pub fn new(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates a money amount from a decimal.
    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the amount as a decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Subtracts `rhs`, returning `None` on overflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    fn to_number(self) -> Option<Number> {
        if self.0.fract().is_zero()
            && let Some(units) = self.0.to_i64()
        {
            return Some(Number::from(units));
        }
        self.0.to_f64().and_then(Number::from_f64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Money> for Value {
    fn from(money: Money) -> Self {
        money
            .to_number()
            .map_or_else(|| Value::String(money.to_string()), Value::Number)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_number() {
            Some(number) => number.serialize(serializer),
            None => Err(ser::Error::custom(format!(
                "amount {self} is not representable as a number"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a finite number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Decimal::from_f64(v)
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Money::new(100)).unwrap(), "100");
        let money: Money = serde_json::from_str("250").unwrap();
        assert_eq!(money, Money::new(250));
    }

    #[test]
    fn fractional_amounts_are_exact() {
        let money: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(money.amount(), Decimal::new(125, 1));
        assert_eq!(serde_json::to_string(&money).unwrap(), "12.5");
        assert_eq!(money.to_string(), "12.5");

        let cents: Money = serde_json::from_str("0.1").unwrap();
        assert_eq!(cents.amount(), Decimal::new(1, 1));
    }

    #[test]
    fn rejects_non_numbers() {
        assert!(serde_json::from_str::<Money>("\"12\"").is_err());
        assert!(serde_json::from_str::<Money>("null").is_err());
    }

    #[test]
    fn money_arithmetic_is_checked() {
        assert_eq!(
            Money::new(100).checked_sub(Money::new(30)),
            Some(Money::new(70))
        );
        assert_eq!(Money::new(1).checked_add(Money::new(2)), Some(Money::new(3)));
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max.checked_add(Money::new(1)), None);
        let min = Money::from_decimal(Decimal::MIN);
        assert_eq!(min.checked_sub(Money::new(1)), None);
    }

    #[test]
    fn positivity() {
        assert!(Money::new(1).is_positive());
        assert!(Money::from_decimal(Decimal::new(1, 2)).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::new(-5).is_positive());
        assert!(!Money::new(i64::MIN).is_positive());
    }

    #[test]
    fn blank_customer_id() {
        assert!(CustomerId::new("  ").is_blank());
        assert!(!CustomerId::new("c1").is_blank());
    }
}
