use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Currency amount held as a signed count of minor units (1/10_000 of a unit).
///
/// Balances never pass through floating point, so any sequence of deposits and
/// withdrawals sums exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(pub i64);

impl Money {
    pub const SCALE: i64 = 10_000; // 4 decimal places
    pub const TARGET_DECIMALS: u32 = 4;
    pub const ZERO: Money = Money(0);

    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Whole currency units, e.g. `Money::from_units(10_000)` is 10000.0000.
    pub const fn from_units(units: i64) -> Self {
        Self(units * Self::SCALE)
    }

    pub fn as_minor(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Rescales `value * 10^-scale` to four decimals, rounding half to even.
    /// Returns `None` when the result does not fit in an `i64`.
    pub fn from_scaled_i128(value: i128, scale: u32) -> Option<Self> {
        let rescaled = if scale <= Self::TARGET_DECIMALS {
            let factor = 10i128.checked_pow(Self::TARGET_DECIMALS - scale)?;
            value.checked_mul(factor)?
        } else {
            let factor = 10i128.checked_pow(scale - Self::TARGET_DECIMALS)?;
            let quotient = value / factor; // truncated toward zero
            let remainder = (value % factor).abs();
            let half = factor / 2;
            let away = if value.is_negative() { -1 } else { 1 };
            if remainder > half || (remainder == half && quotient & 1 != 0) {
                quotient + away
            } else {
                quotient
            }
        };
        i64::try_from(rescaled).ok().map(Self)
    }

    /// Parses `"123"`, `"-4.5"` or `"0.00015"` style strings.
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (body, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
            return None;
        }

        let digits = format!("{int_part}{frac_part}");
        let raw: i128 = digits.parse().ok()?;
        let scale = u32::try_from(frac_part.len()).ok()?;
        Money::from_scaled_i128(if negative { -raw } else { raw }, scale)
    }

    pub fn from_decimal(value: Decimal) -> Option<Self> {
        Money::from_scaled_i128(value.mantissa(), value.scale())
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::TARGET_DECIMALS)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE.unsigned_abs();
        write!(f, "{}{}.{:04}", sign, abs / scale, abs % scale)
    }
}

impl core::str::FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_decimal_str(s).ok_or_else(|| format!("invalid amount: {s}"))
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_decimal_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid Money format: {}", s)))
    }
}
