//! Core types used throughout Tabula
//!
//! This module contains the platform-independent vocabulary shared by the
//! schema model, the differ and the SQL renderers: logical column types,
//! length modifiers, target platforms and referential actions.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::TabulaError;

// ============================================================================
// Logical Types
// ============================================================================

/// Platform-independent column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    #[serde(rename = "biginteger")]
    BigInteger,
    /// 16-bit signed integer
    #[serde(rename = "smallinteger")]
    SmallInteger,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Boolean true/false
    Boolean,
    /// Date without time
    Date,
    /// Date and time without zone
    Timestamp,
    /// Date and time with zone offset
    #[serde(rename = "timestamptz")]
    TimestampTz,
    /// Bounded character string
    String,
    /// Unbounded text
    Text,
    /// Bounded binary data
    Binary,
    /// Unbounded binary data
    BinaryLarge,
    /// Exact numeric with precision and scale
    Decimal,
}

impl LogicalType {
    /// The name used in definition files
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::Integer => "integer",
            LogicalType::BigInteger => "biginteger",
            LogicalType::SmallInteger => "smallinteger",
            LogicalType::Float32 => "float32",
            LogicalType::Float64 => "float64",
            LogicalType::Boolean => "boolean",
            LogicalType::Date => "date",
            LogicalType::Timestamp => "timestamp",
            LogicalType::TimestampTz => "timestamptz",
            LogicalType::String => "string",
            LogicalType::Text => "text",
            LogicalType::Binary => "binary",
            LogicalType::BinaryLarge => "binary_large",
            LogicalType::Decimal => "decimal",
        }
    }

    /// Whether `identity: true` is permitted on this type
    pub fn supports_identity(&self) -> bool {
        matches!(self, LogicalType::Integer | LogicalType::BigInteger)
    }

    /// Whether `max_length` applies to this type
    pub fn uses_max_length(&self) -> bool {
        matches!(self, LogicalType::String | LogicalType::Binary)
    }

    /// Whether `precision` applies to this type
    pub fn uses_precision(&self) -> bool {
        matches!(
            self,
            LogicalType::Timestamp | LogicalType::TimestampTz | LogicalType::Decimal
        )
    }

    /// Whether `scale` applies to this type
    pub fn uses_scale(&self) -> bool {
        matches!(self, LogicalType::Decimal)
    }

    /// Get all logical types
    pub fn all() -> &'static [LogicalType] {
        &[
            LogicalType::Integer,
            LogicalType::BigInteger,
            LogicalType::SmallInteger,
            LogicalType::Float32,
            LogicalType::Float64,
            LogicalType::Boolean,
            LogicalType::Date,
            LogicalType::Timestamp,
            LogicalType::TimestampTz,
            LogicalType::String,
            LogicalType::Text,
            LogicalType::Binary,
            LogicalType::BinaryLarge,
            LogicalType::Decimal,
        ]
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Max Length
// ============================================================================

/// The `max_length` modifier: a character/byte count or the `"max"` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaxLength {
    /// Bounded length
    Length(u32),
    /// Platform maximum
    Max,
}

impl std::fmt::Display for MaxLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxLength::Length(n) => write!(f, "{}", n),
            MaxLength::Max => write!(f, "max"),
        }
    }
}

impl Serialize for MaxLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxLength::Length(n) => serializer.serialize_u32(*n),
            MaxLength::Max => serializer.serialize_str("max"),
        }
    }
}

struct MaxLengthVisitor;

impl<'de> Visitor<'de> for MaxLengthVisitor {
    type Value = MaxLength;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a positive integer or the string \"max\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MaxLength, E> {
        match u32::try_from(v) {
            Ok(0) | Err(_) => Err(E::custom(format!("max_length {} is out of range", v))),
            Ok(n) => Ok(MaxLength::Length(n)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MaxLength, E> {
        if v <= 0 {
            return Err(E::custom(format!("max_length {} is out of range", v)));
        }
        self.visit_u64(v as u64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MaxLength, E> {
        if v.eq_ignore_ascii_case("max") {
            Ok(MaxLength::Max)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for MaxLength {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MaxLengthVisitor)
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// Target SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Microsoft SQL Server
    #[default]
    Mssql,
    /// PostgreSQL
    Postgres,
}

impl Platform {
    /// Name used on the command line and in output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mssql => "mssql",
            Platform::Postgres => "postgres",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Mssql => "Microsoft SQL Server",
            Platform::Postgres => "PostgreSQL",
        }
    }

    /// Get all platforms
    pub fn all() -> &'static [Platform] {
        &[Platform::Mssql, Platform::Postgres]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" => Ok(Platform::Mssql),
            "postgres" | "postgresql" | "pg" => Ok(Platform::Postgres),
            _ => Err(TabulaError::UnknownPlatform(s.to_string())),
        }
    }
}

// ============================================================================
// Referential Actions
// ============================================================================

/// Actions for foreign key constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Do nothing (database default)
    #[default]
    NoAction,
    /// Delete or update related records
    Cascade,
    /// Set foreign key to NULL
    SetNull,
    /// Set foreign key to its default value
    SetDefault,
    /// Prevent the change if related records exist
    Restrict,
}

impl ReferentialAction {
    /// Get the SQL keyword for a platform
    ///
    /// SQL Server has no `RESTRICT`; `NO ACTION` is its equivalent.
    pub fn to_sql(&self, platform: Platform) -> &'static str {
        match (self, platform) {
            (ReferentialAction::NoAction, _) => "NO ACTION",
            (ReferentialAction::Cascade, _) => "CASCADE",
            (ReferentialAction::SetNull, _) => "SET NULL",
            (ReferentialAction::SetDefault, _) => "SET DEFAULT",
            (ReferentialAction::Restrict, Platform::Mssql) => "NO ACTION",
            (ReferentialAction::Restrict, Platform::Postgres) => "RESTRICT",
        }
    }

    /// Whether this is the database default (and can be omitted from DDL)
    pub fn is_default(&self) -> bool {
        matches!(self, ReferentialAction::NoAction)
    }
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferentialAction::NoAction => "no_action",
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set_null",
            ReferentialAction::SetDefault => "set_default",
            ReferentialAction::Restrict => "restrict",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logical_type_names_round_trip_through_serde() {
        for ty in LogicalType::all() {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            let back: LogicalType = serde_json::from_str(&json).unwrap();
            assert_eq!(&back, ty);
        }
    }

    #[test]
    fn test_unknown_logical_type_rejected() {
        assert!(serde_json::from_str::<LogicalType>("\"uuid\"").is_err());
    }

    #[test]
    fn test_identity_support() {
        assert!(LogicalType::Integer.supports_identity());
        assert!(LogicalType::BigInteger.supports_identity());
        assert!(!LogicalType::SmallInteger.supports_identity());
        assert!(!LogicalType::String.supports_identity());
    }

    #[test]
    fn test_modifier_applicability() {
        assert!(LogicalType::String.uses_max_length());
        assert!(LogicalType::Binary.uses_max_length());
        assert!(!LogicalType::Text.uses_max_length());
        assert!(LogicalType::TimestampTz.uses_precision());
        assert!(LogicalType::Decimal.uses_scale());
        assert!(!LogicalType::Timestamp.uses_scale());
    }

    #[test]
    fn test_max_length_from_number_and_sentinel() {
        let n: MaxLength = serde_json::from_str("100").unwrap();
        assert_eq!(n, MaxLength::Length(100));
        let m: MaxLength = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(m, MaxLength::Max);
        let upper: MaxLength = serde_yaml::from_str("MAX").unwrap();
        assert_eq!(upper, MaxLength::Max);
    }

    #[test]
    fn test_max_length_rejects_bad_values() {
        assert!(serde_json::from_str::<MaxLength>("0").is_err());
        assert!(serde_json::from_str::<MaxLength>("-5").is_err());
        assert!(serde_json::from_str::<MaxLength>("\"huge\"").is_err());
    }

    #[test]
    fn test_max_length_serializes_back() {
        assert_eq!(serde_json::to_string(&MaxLength::Length(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&MaxLength::Max).unwrap(), "\"max\"");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("mssql".parse::<Platform>().unwrap(), Platform::Mssql);
        assert_eq!("Postgres".parse::<Platform>().unwrap(), Platform::Postgres);
        assert_eq!("postgresql".parse::<Platform>().unwrap(), Platform::Postgres);
        assert!("oracle".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::Mssql.to_string(), "mssql");
        assert_eq!(Platform::Postgres.display_name(), "PostgreSQL");
    }

    #[test]
    fn test_referential_action_per_platform() {
        assert_eq!(ReferentialAction::Cascade.to_sql(Platform::Mssql), "CASCADE");
        assert_eq!(ReferentialAction::SetNull.to_sql(Platform::Postgres), "SET NULL");
        assert_eq!(ReferentialAction::Restrict.to_sql(Platform::Postgres), "RESTRICT");
        assert_eq!(ReferentialAction::Restrict.to_sql(Platform::Mssql), "NO ACTION");
        assert!(ReferentialAction::default().is_default());
    }
}
