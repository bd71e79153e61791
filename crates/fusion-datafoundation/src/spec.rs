//! Typed view of a DataFoundation offering's `spec.config`
//!
//! The config map is untyped on the wire. [`OfferingSpec::parse`] checks every
//! field and reports all problems at once so a tenant fixes the offering in a
//! single edit.

use std::collections::BTreeMap;
use std::fmt;
use std::num::IntErrorKind;

/// Config key holding the requested usable capacity, in units
pub const USABLE_CAPACITY_KEY: &str = "usableCapacityInUnits";
/// Config key holding the onboarding validation public key
pub const ONBOARDING_VALIDATION_KEY: &str = "onboardingValidationKey";
/// Config key toggling the optional gateway subsystem
pub const ENABLE_FEATURE_KEY: &str = "enableFeature";

/// Validated DataFoundation configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferingSpec {
    /// Requested usable capacity; always positive
    pub usable_capacity_units: u64,
    /// Validation key as supplied; never blank
    pub onboarding_validation_key: String,
    /// Whether the gateway subsystem is requested
    pub enable_feature: bool,
}

impl OfferingSpec {
    /// Parse and validate a raw config map
    pub fn parse(config: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();

        let usable_capacity_units = match config.get(USABLE_CAPACITY_KEY) {
            None => {
                violations.push(FieldViolation::new(USABLE_CAPACITY_KEY, Violation::Missing));
                None
            }
            Some(raw) => parse_positive_integer(raw)
                .map_err(|v| violations.push(FieldViolation::new(USABLE_CAPACITY_KEY, v)))
                .ok(),
        };

        let onboarding_validation_key = match config.get(ONBOARDING_VALIDATION_KEY) {
            None => {
                violations.push(FieldViolation::new(
                    ONBOARDING_VALIDATION_KEY,
                    Violation::Missing,
                ));
                None
            }
            Some(raw) if raw.trim().is_empty() => {
                violations.push(FieldViolation::new(ONBOARDING_VALIDATION_KEY, Violation::Empty));
                None
            }
            Some(raw) => Some(raw.clone()),
        };

        let enable_feature = match config.get(ENABLE_FEATURE_KEY) {
            None => Some(false),
            Some(raw) => parse_bool(raw)
                .map_err(|v| violations.push(FieldViolation::new(ENABLE_FEATURE_KEY, v)))
                .ok(),
        };

        match (usable_capacity_units, onboarding_validation_key, enable_feature) {
            (Some(usable_capacity_units), Some(onboarding_validation_key), Some(enable_feature)) => {
                Ok(Self {
                    usable_capacity_units,
                    onboarding_validation_key,
                    enable_feature,
                })
            }
            _ => Err(ValidationError { violations }),
        }
    }
}

/// Why a single config field was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// Required key absent
    Missing,
    /// Present but blank
    Empty,
    /// Not a base-10 integer
    NotAnInteger(String),
    /// A base-10 integer too large to represent
    OutOfRange(String),
    /// Integer, but zero or negative
    NotPositive(i64),
    /// Not one of the accepted boolean spellings
    NotABoolean(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => f.write_str("is required"),
            Violation::Empty => f.write_str("must not be empty"),
            Violation::NotAnInteger(raw) => write!(f, "'{}' is not an integer", raw),
            Violation::OutOfRange(raw) => write!(f, "'{}' is out of range", raw),
            Violation::NotPositive(value) => write!(f, "must be positive, got {}", value),
            Violation::NotABoolean(raw) => write!(f, "'{}' is not a boolean", raw),
        }
    }
}

/// A rejected config field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    /// Config key
    pub field: &'static str,
    /// What is wrong with it
    pub violation: Violation,
}

impl FieldViolation {
    fn new(field: &'static str, violation: Violation) -> Self {
        Self { field, violation }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.violation)
    }
}

/// Every problem found in an offering config
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// All violations, in config-key order of checking
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the rejected fields
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid DataFoundation config: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn parse_positive_integer(raw: &str) -> Result<u64, Violation> {
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value.unsigned_abs()),
        Ok(value) => Err(Violation::NotPositive(value)),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(Violation::OutOfRange(raw.to_string()))
        }
        Err(_) => Err(Violation::NotAnInteger(raw.to_string())),
    }
}

/// Boolean spellings accepted by the offering catalogue
fn parse_bool(raw: &str) -> Result<bool, Violation> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Violation::NotABoolean(raw.to_string())),
    }
}
