//! Movement quantities: the raw request value and the validated positive amount.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::movement::MovementError;

/// Largest stock level, and largest single movement, the system will hold.
///
/// Matches the signed 64-bit column the ledger is persisted in.
pub const MAX_STOCK: u64 = i64::MAX as u64;

/// A strictly positive number of units, at most [`MAX_STOCK`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Quantity(u64);

impl Quantity {
    /// Returns `None` for zero or anything above [`MAX_STOCK`].
    pub fn new(units: u64) -> Option<Self> {
        (1..=MAX_STOCK).contains(&units).then_some(Self(units))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Quantity {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Err("quantity must be greater than zero".to_string()),
            v => Self::new(v).ok_or_else(|| "quantity is too large".to_string()),
        }
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The `quantity` field exactly as a client sent it.
///
/// `None` means the field was absent. JSON `null` is treated the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuantity(Option<Value>);

impl RawQuantity {
    pub fn missing() -> Self {
        Self(None)
    }

    pub fn from_json(value: Option<Value>) -> Self {
        Self(value)
    }

    /// Validate into a [`Quantity`].
    ///
    /// Accepts JSON integers and strings containing an integer.
    pub fn parse(&self) -> Result<Quantity, MovementError> {
        let value = match &self.0 {
            None | Some(Value::Null) => return Err(MovementError::MissingField("quantity")),
            Some(v) => v,
        };

        let units = integer_of(value)
            .ok_or_else(|| MovementError::InvalidQuantity(format!("not an integer: {value}")))?;

        if units <= 0 {
            return Err(MovementError::InvalidQuantity(
                "quantity must be greater than zero".to_string(),
            ));
        }

        u64::try_from(units)
            .ok()
            .and_then(Quantity::new)
            .ok_or_else(|| MovementError::InvalidQuantity("quantity is too large".to_string()))
    }
}

impl From<u64> for RawQuantity {
    fn from(value: u64) -> Self {
        Self(Some(Value::from(value)))
    }
}

impl From<i64> for RawQuantity {
    fn from(value: i64) -> Self {
        Self(Some(Value::from(value)))
    }
}

impl From<&str> for RawQuantity {
    fn from(value: &str) -> Self {
        Self(Some(Value::from(value)))
    }
}

fn integer_of(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Result<Quantity, MovementError> {
        RawQuantity::from_json(Some(v)).parse()
    }

    #[test]
    fn absent_or_null_is_missing() {
        assert_eq!(
            RawQuantity::missing().parse(),
            Err(MovementError::MissingField("quantity"))
        );
        assert_eq!(parse(Value::Null), Err(MovementError::MissingField("quantity")));
    }

    #[test]
    fn integers_and_integer_strings_are_accepted() {
        assert_eq!(parse(json!(5)).unwrap().get(), 5);
        assert_eq!(parse(json!(" 7 ")).unwrap().get(), 7);
    }

    #[test]
    fn zero_and_negative_are_invalid() {
        for v in [json!(0), json!(-3), json!("-1"), json!("0")] {
            assert!(matches!(parse(v), Err(MovementError::InvalidQuantity(_))));
        }
    }

    #[test]
    fn non_integers_are_invalid() {
        for v in [json!(1.5), json!("abc"), json!(true), json!([1]), json!({"n": 1}), json!("")] {
            assert!(matches!(parse(v), Err(MovementError::InvalidQuantity(_))));
        }
    }

    #[test]
    fn values_beyond_u64_are_invalid() {
        let just_past_u64 = "18446744073709551616";
        assert_eq!(
            parse(json!(just_past_u64)),
            Err(MovementError::InvalidQuantity("quantity is too large".to_string()))
        );
    }

    #[test]
    fn values_beyond_max_stock_are_invalid() {
        assert_eq!(parse(json!(MAX_STOCK)).unwrap().get(), MAX_STOCK);
        for v in [json!(MAX_STOCK + 1), json!("9223372036854775808"), json!(u64::MAX)] {
            assert_eq!(
                parse(v),
                Err(MovementError::InvalidQuantity("quantity is too large".to_string()))
            );
        }
    }

    #[test]
    fn out_of_range_quantity_does_not_deserialize() {
        assert!(serde_json::from_value::<Quantity>(json!(0)).is_err());
        assert!(serde_json::from_value::<Quantity>(json!(MAX_STOCK + 1)).is_err());
        assert_eq!(serde_json::from_value::<Quantity>(json!(3)).unwrap().get(), 3);
    }
}
