//! ReadProperty/WriteProperty request data and the checks every object type
//! shares: property tables, array indexing and application-tag matching.

use crate::priority::BACNET_MAX_PRIORITY;
use crate::PropertyError;
use bacnode_core::encoding::reader::Reader;
use bacnode_core::types::{BitString, DataValue, ObjectId, PropertyId, Reliability};
use bacnode_core::value_codec::{decode_application_value, encode_to_vec};
use bacnode_core::EncodeError;

/// Decoded ReadProperty request. `array_index: None` addresses the whole
/// property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPropertyData {
    pub object_id: ObjectId,
    pub property: PropertyId,
    pub array_index: Option<u32>,
}

impl ReadPropertyData {
    pub fn new(object_id: ObjectId, property: PropertyId) -> Self {
        Self {
            object_id,
            property,
            array_index: None,
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.array_index = Some(index);
        self
    }
}

/// Decoded WriteProperty request carrying the still-encoded property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePropertyData {
    pub object_id: ObjectId,
    pub property: PropertyId,
    pub array_index: Option<u32>,
    pub priority: Option<u8>,
    pub value: Vec<u8>,
}

impl WritePropertyData {
    /// Builds a request by encoding `value`.
    pub fn new(
        object_id: ObjectId,
        property: PropertyId,
        value: &DataValue,
    ) -> Result<Self, EncodeError> {
        Ok(Self {
            object_id,
            property,
            array_index: None,
            priority: None,
            value: encode_to_vec(value)?,
        })
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.array_index = Some(index);
        self
    }

    /// Requested priority; an absent priority means the lowest one.
    pub fn priority(&self) -> u8 {
        self.priority.unwrap_or(BACNET_MAX_PRIORITY)
    }

    /// Decodes the value as exactly one application-tagged primitive.
    pub fn decode_value(&self) -> Result<DataValue, PropertyError> {
        let mut r = Reader::new(&self.value);
        let value = decode_application_value(&mut r)?;
        if !r.is_empty() {
            return Err(PropertyError::ValueOutOfRange);
        }
        Ok(value)
    }

    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.value)
    }
}

/// Required, optional and proprietary properties of one object type.
#[derive(Debug, Clone, Copy)]
pub struct PropertyLists {
    pub required: &'static [PropertyId],
    pub optional: &'static [PropertyId],
    pub proprietary: &'static [PropertyId],
}

/// Properties every object reports outside of PROPERTY_LIST.
const NOT_IN_PROPERTY_LIST: [PropertyId; 4] = [
    PropertyId::ObjectIdentifier,
    PropertyId::ObjectName,
    PropertyId::ObjectType,
    PropertyId::PropertyList,
];

impl PropertyLists {
    pub fn contains(&self, property: PropertyId) -> bool {
        property == PropertyId::PropertyList || self.all().any(|p| p == property)
    }

    pub fn all(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.required
            .iter()
            .chain(self.optional)
            .chain(self.proprietary)
            .copied()
    }

    /// Contents of the PROPERTY_LIST property.
    pub fn property_list(&self) -> Vec<PropertyId> {
        self.all()
            .filter(|p| !NOT_IN_PROPERTY_LIST.contains(p))
            .collect()
    }
}

/// Properties that are BACnet arrays and so accept an array index.
pub fn is_array_property(property: PropertyId) -> bool {
    matches!(
        property,
        PropertyId::PriorityArray
            | PropertyId::StateText
            | PropertyId::EventTimeStamps
            | PropertyId::WeeklySchedule
            | PropertyId::PropertyList
    )
}

/// Properties no WriteProperty may change, whatever the object type.
pub fn is_read_only_property(property: PropertyId) -> bool {
    matches!(
        property,
        PropertyId::ObjectIdentifier
            | PropertyId::ObjectType
            | PropertyId::StatusFlags
            | PropertyId::EventState
            | PropertyId::PriorityArray
            | PropertyId::PropertyList
            | PropertyId::CurrentCommandPriority
            | PropertyId::AckedTransitions
            | PropertyId::EventTimeStamps
    )
}

/// Reads an array property: index 0 is the element count, 1..=len an
/// element, `None` the whole array.
pub fn read_array<F>(index: Option<u32>, len: usize, element: F) -> Result<DataValue, PropertyError>
where
    F: Fn(usize) -> DataValue,
{
    match index {
        None => Ok(DataValue::List((0..len).map(element).collect())),
        Some(0) => Ok(DataValue::Unsigned(len as u32)),
        Some(i) if (i as usize) <= len => Ok(element(i as usize - 1)),
        Some(_) => Err(PropertyError::InvalidArrayIndex),
    }
}

pub fn expect_boolean(value: &DataValue) -> Result<bool, PropertyError> {
    match value {
        DataValue::Boolean(v) => Ok(*v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

pub fn expect_real(value: &DataValue) -> Result<f32, PropertyError> {
    match value {
        DataValue::Real(v) => Ok(*v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

pub fn expect_unsigned(value: &DataValue) -> Result<u32, PropertyError> {
    match value {
        DataValue::Unsigned(v) => Ok(*v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

pub fn expect_enumerated(value: &DataValue) -> Result<u32, PropertyError> {
    match value {
        DataValue::Enumerated(v) => Ok(*v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

pub fn expect_bit_string(value: &DataValue) -> Result<&BitString, PropertyError> {
    match value {
        DataValue::BitString(v) => Ok(v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

pub fn expect_character_string(value: &DataValue) -> Result<&str, PropertyError> {
    match value {
        DataValue::CharacterString(v) => Ok(v),
        _ => Err(PropertyError::InvalidDataType),
    }
}

/// Object names must not be empty; uniqueness is the device's concern.
pub fn expect_object_name(value: &DataValue) -> Result<&str, PropertyError> {
    let name = expect_character_string(value)?;
    if name.is_empty() {
        return Err(PropertyError::ValueOutOfRange);
    }
    Ok(name)
}

pub fn expect_reliability(value: &DataValue) -> Result<Reliability, PropertyError> {
    Reliability::from_u32(expect_enumerated(value)?).ok_or(PropertyError::ValueOutOfRange)
}
