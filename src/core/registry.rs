//! Closed enum registries for location, container and truck types
//!
//! Each registry is a plain Rust enum. Inputs arrive as a [`RegistryInput`],
//! either a canonical name (matched case-insensitively after trimming) or the
//! numeric code of a member (its declaration index), and are resolved once by
//! [`Registry::parse`]. Stored documents always carry the canonical name.
//!
//! Any other JSON value still decodes, as [`RegistryInput::Other`], so that a
//! bad type is reported as `INVALID_TYPE` rather than as a malformed body.

use crate::core::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Raw enum input: a member name, a member code or anything else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryInput {
    Code(i64),
    Name(String),
    Other(Value),
}

impl fmt::Display for RegistryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryInput::Code(code) => write!(f, "{}", code),
            RegistryInput::Name(name) => write!(f, "{}", name),
            RegistryInput::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for RegistryInput {
    fn from(name: &str) -> Self {
        RegistryInput::Name(name.to_string())
    }
}

impl From<String> for RegistryInput {
    fn from(name: String) -> Self {
        RegistryInput::Name(name)
    }
}

impl From<u8> for RegistryInput {
    fn from(code: u8) -> Self {
        RegistryInput::Code(code.into())
    }
}

impl From<i64> for RegistryInput {
    fn from(code: i64) -> Self {
        RegistryInput::Code(code)
    }
}

/// A closed set of named values with stable numeric codes
pub trait Registry: Copy + PartialEq + 'static {
    /// Label used in error messages (e.g. "Location type")
    const LABEL: &'static str;

    /// All members, in code order
    const MEMBERS: &'static [Self];

    /// Canonical name of this member
    fn name(&self) -> &'static str;

    /// Extra accepted spellings for this member
    fn aliases(&self) -> &'static [&'static str];

    fn code(&self) -> u8 {
        Self::MEMBERS
            .iter()
            .position(|member| member == self)
            .unwrap_or_default() as u8
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::MEMBERS.get(code as usize).copied()
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::MEMBERS.iter().copied().find(|member| {
            member.name().eq_ignore_ascii_case(name)
                || member.aliases().iter().any(|a| a.eq_ignore_ascii_case(name))
        })
    }

    /// `true` if `code` identifies a member
    fn is_valid(code: u8) -> bool {
        Self::from_code(code).is_some()
    }

    /// Resolve a name or code to a member
    fn parse(input: &RegistryInput) -> StoreResult<Self> {
        let resolved = match input {
            RegistryInput::Code(code) => u8::try_from(*code).ok().and_then(Self::from_code),
            RegistryInput::Name(name) => Self::from_name(name),
            RegistryInput::Other(_) => None,
        };
        resolved.ok_or_else(|| StoreError::InvalidType {
            label: Self::LABEL,
            value: input.to_string(),
        })
    }
}

macro_rules! registry {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $variant:ident => $text:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Registry for $name {
            const LABEL: &'static str = $label;
            const MEMBERS: &'static [Self] = &[$($name::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn aliases(&self) -> &'static [&'static str] {
                match self {
                    $($name::$variant => &[$($alias),*]),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let input = RegistryInput::deserialize(deserializer)?;
                <$name as Registry>::parse(&input).map_err(serde::de::Error::custom)
            }
        }
    };
}

registry!(
    /// Kind of site a location is
    LocationType, "Location type" {
        Yard => "Yard",
        Port => "Port",
        Rail => "Rail",
    }
);

registry!(
    /// Shipping container size
    ContainerType, "Container type" {
        Twenty => "20ft" | "twenty",
        Forty => "40ft" | "forty",
    }
);

registry!(
    /// Trailer configuration of a truck
    TruckType, "Truck type" {
        Tribox => "Tribox",
        Skeletal => "Skeletal",
    }
);

impl Default for LocationType {
    fn default() -> Self {
        LocationType::Yard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name_is_case_insensitive() {
        assert_eq!(
            LocationType::parse(&"  port ".into()).unwrap(),
            LocationType::Port
        );
        assert_eq!(TruckType::parse(&"SKELETAL".into()).unwrap(), TruckType::Skeletal);
        assert_eq!(
            ContainerType::parse(&"forty".into()).unwrap(),
            ContainerType::Forty
        );
        assert_eq!(
            ContainerType::parse(&"20FT".into()).unwrap(),
            ContainerType::Twenty
        );
    }

    #[test]
    fn test_parse_by_code() {
        assert_eq!(LocationType::parse(&2u8.into()).unwrap(), LocationType::Rail);
        assert_eq!(TruckType::parse(&0u8.into()).unwrap(), TruckType::Tribox);
        assert_eq!(LocationType::Port.code(), 1);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = LocationType::parse(&"Harbour".into()).unwrap_err();
        assert_eq!(err.to_string(), "Location type 'Harbour' is not a valid type");
        assert_eq!(err.error_code(), "INVALID_TYPE");

        let err = TruckType::parse(&7u8.into()).unwrap_err();
        assert_eq!(err.to_string(), "Truck type '7' is not a valid type");
    }

    #[test]
    fn test_out_of_range_and_odd_json_are_invalid_types() {
        for raw in [
            serde_json::json!(300),
            serde_json::json!(-1),
            serde_json::json!(1.5),
            serde_json::json!(true),
        ] {
            let input: RegistryInput = serde_json::from_value(raw.clone()).unwrap();
            let err = LocationType::parse(&input).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_TYPE", "input {}", raw);
        }

        let input: RegistryInput = serde_json::from_value(serde_json::json!(300)).unwrap();
        assert_eq!(input, RegistryInput::Code(300));
        assert_eq!(
            TruckType::parse(&input).unwrap_err().to_string(),
            "Truck type '300' is not a valid type"
        );
    }

    #[test]
    fn test_is_valid() {
        assert!(LocationType::is_valid(0));
        assert!(LocationType::is_valid(2));
        assert!(!LocationType::is_valid(3));
        assert!(ContainerType::is_valid(1));
        assert!(!ContainerType::is_valid(2));
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        assert_eq!(
            serde_json::to_value(ContainerType::Twenty).unwrap(),
            serde_json::json!("20ft")
        );
        let from_code: LocationType = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(from_code, LocationType::Port);
        let from_name: LocationType = serde_json::from_value(serde_json::json!("rail")).unwrap();
        assert_eq!(from_name, LocationType::Rail);
        assert!(serde_json::from_value::<TruckType>(serde_json::json!("Flatbed")).is_err());
    }
}
