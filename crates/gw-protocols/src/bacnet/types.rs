//! BACnet object/property type enumerations (spec §4.4.2), grounded on
//! the original `protocols/bacnet/type.go` object-type table.

use std::fmt;

use gw_errors::{GatewayError, Result};

/// BACnet standard object types this gateway recognizes. Only the ones
/// actually addressable as points are listed (matches spec §6's address
/// syntax examples: `analogInput`, `binaryOutput`, ...); proprietary
/// ranges are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    MultiStateInput,
    MultiStateOutput,
    MultiStateValue,
    Device,
}

impl ObjectType {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "analogInput" => Ok(ObjectType::AnalogInput),
            "analogOutput" => Ok(ObjectType::AnalogOutput),
            "analogValue" => Ok(ObjectType::AnalogValue),
            "binaryInput" => Ok(ObjectType::BinaryInput),
            "binaryOutput" => Ok(ObjectType::BinaryOutput),
            "binaryValue" => Ok(ObjectType::BinaryValue),
            "multiStateInput" => Ok(ObjectType::MultiStateInput),
            "multiStateOutput" => Ok(ObjectType::MultiStateOutput),
            "multiStateValue" => Ok(ObjectType::MultiStateValue),
            "device" => Ok(ObjectType::Device),
            other => Err(GatewayError::address_parse(format!("unknown BACnet object type `{other}`"))),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectType::AnalogInput => "analogInput",
            ObjectType::AnalogOutput => "analogOutput",
            ObjectType::AnalogValue => "analogValue",
            ObjectType::BinaryInput => "binaryInput",
            ObjectType::BinaryOutput => "binaryOutput",
            ObjectType::BinaryValue => "binaryValue",
            ObjectType::MultiStateInput => "multiStateInput",
            ObjectType::MultiStateOutput => "multiStateOutput",
            ObjectType::MultiStateValue => "multiStateValue",
            ObjectType::Device => "device",
        };
        f.write_str(s)
    }
}

/// A BACnet object identifier: type + instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.instance)
    }
}

/// Parses the canonical `<objectType>:<instance>` address form (spec §6,
/// design notes §9: loose `%[^:]:%d`-style parsing is rejected; only
/// this exact shape is accepted at load time).
pub fn parse_address(address: &str) -> Result<ObjectId> {
    let (type_str, instance_str) = address
        .split_once(':')
        .ok_or_else(|| GatewayError::address_parse(format!("expected `<objectType>:<instance>`, got `{address}`")))?;
    let object_type = ObjectType::parse(type_str)?;
    let instance: u32 = instance_str
        .parse()
        .map_err(|_| GatewayError::address_parse(format!("non-numeric BACnet instance in `{address}`")))?;
    Ok(ObjectId { object_type, instance })
}

/// Declared property value type for a point (spec §4.4.2): drives the
/// write type-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValueType {
    Null,
    Boolean,
    UnsignedInt,
    SignedInt,
    Real,
    Double,
    OctetString,
    CharacterString,
    BitString,
    Enumerated,
    Date,
    Time,
    ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_address_parses() {
        let id = parse_address("analogInput:3").unwrap();
        assert_eq!(id.object_type, ObjectType::AnalogInput);
        assert_eq!(id.instance, 3);
    }

    #[test]
    fn loose_forms_are_rejected() {
        assert!(parse_address("analogInput-3").is_err());
        assert!(parse_address("analogInput:").is_err());
        assert!(parse_address("analogInput:x").is_err());
    }

    #[test]
    fn unknown_object_type_is_rejected() {
        assert!(parse_address("frobnicator:1").is_err());
    }
}
