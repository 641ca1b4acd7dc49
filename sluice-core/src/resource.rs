//! Resource quantities
//!
//! Resource requests and limits are expressed as quantity strings (`"500m"`,
//! `"64Mi"`, `"2"`). Parsing is a pluggable capability, [`QuantityParser`];
//! [`StandardQuantityParser`] covers the plain decimal, SI and binary suffix
//! forms.

use std::collections::BTreeMap;

use thiserror::Error;

/// A resource amount normalized to thousandths of a unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    pub const fn from_units(units: i64) -> Self {
        Self {
            milli: units.saturating_mul(1000),
        }
    }

    pub const fn milli(&self) -> i64 {
        self.milli
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.milli % 1000 == 0 {
            write!(f, "{}", self.milli / 1000)
        } else {
            write!(f, "{}m", self.milli)
        }
    }
}

/// Kind of resource a quantity is requested for
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceName {
    Cpu,
    Memory,
    EphemeralStorage,
    /// Vendor resource such as `nvidia.com/gpu`
    Extended(String),
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceName::Cpu => write!(f, "cpu"),
            ResourceName::Memory => write!(f, "memory"),
            ResourceName::EphemeralStorage => write!(f, "ephemeral-storage"),
            ResourceName::Extended(name) => write!(f, "{}", name),
        }
    }
}

/// Normalized resource amounts keyed by resource kind
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Error parsing a quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),

    #[error("unknown suffix {suffix:?} in quantity {raw:?}")]
    UnknownSuffix { raw: String, suffix: String },

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

/// Converts quantity strings into normalized [`Quantity`] values
pub trait QuantityParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Quantity, QuantityError>;
}

/// Parser for decimal quantities with an optional `m`, SI or binary suffix
///
/// Fractions finer than a milli-unit are rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardQuantityParser;

impl StandardQuantityParser {
    /// Size of one unit of `suffix`, in milli-units
    fn suffix_milli(suffix: &str) -> Option<i128> {
        const KI: i128 = 1024;
        let milli = match suffix {
            "m" => 1,
            "" => 1_000,
            "k" => 1_000 * 1_000,
            "M" => 1_000 * 1_000_000,
            "G" => 1_000 * 1_000_000_000,
            "T" => 1_000 * 1_000_000_000_000,
            "P" => 1_000 * 1_000_000_000_000_000,
            "E" => 1_000 * 1_000_000_000_000_000_000,
            "Ki" => 1_000 * KI,
            "Mi" => 1_000 * KI.pow(2),
            "Gi" => 1_000 * KI.pow(3),
            "Ti" => 1_000 * KI.pow(4),
            "Pi" => 1_000 * KI.pow(5),
            "Ei" => 1_000 * KI.pow(6),
            _ => return None,
        };
        Some(milli)
    }
}

impl QuantityParser for StandardQuantityParser {
    fn parse(&self, raw: &str) -> Result<Quantity, QuantityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let unit = Self::suffix_milli(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            raw: raw.to_string(),
            suffix: suffix.to_string(),
        })?;

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && frac.is_empty()) || frac.contains('.') || frac.len() > 18 {
            return Err(QuantityError::InvalidNumber(raw.to_string()));
        }

        let digits = format!("{}{}", whole, frac);
        let mantissa: i128 = digits
            .parse()
            .map_err(|_| QuantityError::InvalidNumber(raw.to_string()))?;
        let scale = 10_i128.pow(frac.len() as u32);

        let scaled = mantissa
            .checked_mul(unit)
            .ok_or_else(|| QuantityError::OutOfRange(raw.to_string()))?;
        let mut milli = scaled
            .checked_add(scale - 1)
            .ok_or_else(|| QuantityError::OutOfRange(raw.to_string()))?
            / scale;
        if negative {
            milli = -milli;
        }

        let milli =
            i64::try_from(milli).map_err(|_| QuantityError::OutOfRange(raw.to_string()))?;
        Ok(Quantity::from_milli(milli))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Quantity, QuantityError> {
        StandardQuantityParser.parse(raw)
    }

    #[test]
    fn test_parse_plain_and_milli() {
        assert_eq!(parse("2").unwrap(), Quantity::from_units(2));
        assert_eq!(parse("500m").unwrap(), Quantity::from_milli(500));
        assert_eq!(parse("0.250000").unwrap(), Quantity::from_milli(250));
        assert_eq!(parse(".5").unwrap(), Quantity::from_milli(500));
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse("64M").unwrap(), Quantity::from_units(64_000_000));
        assert_eq!(parse("1Gi").unwrap(), Quantity::from_units(1 << 30));
        assert_eq!(parse("1.5Ki").unwrap(), Quantity::from_units(1536));
        assert!(parse("1Gi").unwrap() > parse("1G").unwrap());
    }

    #[test]
    fn test_parse_rounds_up_sub_milli() {
        assert_eq!(parse("0.0001").unwrap(), Quantity::from_milli(1));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(QuantityError::Empty));
        assert!(matches!(parse("abc"), Err(QuantityError::UnknownSuffix { .. })));
        assert!(matches!(parse("10Xi"), Err(QuantityError::UnknownSuffix { .. })));
        assert!(matches!(parse("1.2.3"), Err(QuantityError::InvalidNumber(_))));
        assert!(matches!(parse("."), Err(QuantityError::InvalidNumber(_))));
        assert!(matches!(parse("100E"), Err(QuantityError::OutOfRange(_))));
        // Fits in i128 once scaled, but not once rounded up
        assert!(matches!(
            parse("170141183460469231731.687303715884105727m"),
            Err(QuantityError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::from_milli(1500).to_string(), "1500m");
        assert_eq!(Quantity::from_units(3).to_string(), "3");
        assert_eq!(ResourceName::EphemeralStorage.to_string(), "ephemeral-storage");
        assert_eq!(
            ResourceName::Extended("nvidia.com/gpu".to_string()).to_string(),
            "nvidia.com/gpu"
        );
    }
}
