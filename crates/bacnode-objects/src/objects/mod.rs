//! Hosted object types and the traits the device dispatches through.

pub mod analog_output;
pub mod binary;
pub mod multistate_input;
pub mod schedule;

pub use analog_output::AnalogOutput;
pub use binary::{BinaryInput, BinaryOutput};
pub use multistate_input::MultiStateInput;
pub use schedule::Schedule;

use crate::persist::{ConfigChange, ConfigSection};
use crate::priority::{
    PriorityArray, BACNET_MAX_PRIORITY, BACNET_MIN_ON_OFF_PRIORITY, BACNET_MIN_PRIORITY,
};
use crate::property::{
    expect_boolean, expect_character_string, expect_object_name, expect_reliability,
    is_array_property, is_read_only_property, read_array, PropertyLists, WritePropertyData,
};
use crate::observer::NotificationClassReporter;
use crate::reporting::{EventNotification, IntrinsicReporting};
use crate::{ConfigError, PropertyError};
use bacnode_core::types::{
    DataValue, DateTime, EventState, ObjectId, ObjectType, PropertyId, Reliability,
    StatusFlags, TimeStamp,
};
use std::fmt::Debug;

/// Result of a successful WriteProperty.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome<T> {
    /// Commanded present-value change `(old, new)` the type's observer should
    /// see; `None` when the write was not a command or the object is out of
    /// service.
    pub commanded: Option<(T, T)>,
    pub persist: Vec<ConfigChange>,
}

impl<T> WriteOutcome<T> {
    pub fn none() -> Self {
        Self {
            commanded: None,
            persist: Vec::new(),
        }
    }

    pub fn persist(change: ConfigChange) -> Self {
        Self {
            commanded: None,
            persist: vec![change],
        }
    }

    pub fn persist_all(changes: Vec<ConfigChange>) -> Self {
        Self {
            commanded: None,
            persist: changes,
        }
    }
}

/// A BACnet object hosted by the device.
pub trait BacnetObject: Sized {
    const OBJECT_TYPE: ObjectType;
    /// Configuration package holding this type's sections.
    const PACKAGE: &'static str;
    const PROPERTIES: PropertyLists;

    /// Present-value type reported to observers.
    type Value: Clone + PartialEq + Debug;

    fn new(instance: u32) -> Self;

    fn from_config(instance: u32, section: &ConfigSection<'_>) -> Result<Self, ConfigError>;

    fn instance(&self) -> u32;

    fn object_id(&self) -> ObjectId {
        ObjectId::new(Self::OBJECT_TYPE, self.instance())
    }

    fn name(&self) -> &str;

    fn status_flags(&self) -> StatusFlags;

    fn reporting(&self) -> Option<&IntrinsicReporting> {
        None
    }

    fn reporting_mut(&mut self) -> Option<&mut IntrinsicReporting> {
        None
    }

    fn event_state(&self) -> EventState {
        self.reporting()
            .map_or(EventState::Normal, IntrinsicReporting::event_state)
    }

    /// Runs one intrinsic reporting tick.
    fn intrinsic_reporting(
        &mut self,
        _now: DateTime,
        _reporter: &mut dyn NotificationClassReporter,
    ) -> Option<EventNotification> {
        None
    }

    /// AcknowledgeAlarm addressed to this object.
    fn acknowledge(
        &mut self,
        event_state_acked: EventState,
        time_stamp: &TimeStamp,
    ) -> Result<(), PropertyError> {
        self.reporting_mut()
            .ok_or(PropertyError::InvalidEventState)?
            .acknowledge(event_state_acked, time_stamp)
    }

    /// Reads a property of this type. Identity, status flags, event state
    /// and the property list are answered by [`read_object_property`].
    fn read_property(
        &self,
        property: PropertyId,
        array_index: Option<u32>,
    ) -> Result<DataValue, PropertyError>;

    fn write_property(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<Self::Value>, PropertyError>;

    fn cov_changed(&self) -> bool;

    fn cov_clear(&mut self);

    /// Values carried in a COV notification.
    fn cov_values(&self) -> Vec<(PropertyId, DataValue)> {
        let present_value = self
            .read_property(PropertyId::PresentValue, None)
            .unwrap_or(DataValue::Null);
        vec![
            (PropertyId::PresentValue, present_value),
            (
                PropertyId::StatusFlags,
                self.status_flags().to_bit_string().into(),
            ),
        ]
    }
}

/// ReadProperty entry point shared by every object type.
pub fn read_object_property<O: BacnetObject>(
    object: &O,
    property: PropertyId,
    array_index: Option<u32>,
) -> Result<DataValue, PropertyError> {
    if !O::PROPERTIES.contains(property) {
        return Err(PropertyError::UnknownProperty(property));
    }
    if array_index.is_some() && !is_array_property(property) {
        return Err(PropertyError::PropertyIsNotAnArray);
    }
    match property {
        PropertyId::ObjectIdentifier => Ok(object.object_id().into()),
        PropertyId::ObjectName => Ok(object.name().into()),
        PropertyId::ObjectType => Ok(DataValue::Enumerated(O::OBJECT_TYPE.to_u16() as u32)),
        PropertyId::StatusFlags => Ok(object.status_flags().to_bit_string().into()),
        PropertyId::EventState => Ok(DataValue::Enumerated(object.event_state().to_u32())),
        PropertyId::PropertyList => {
            let list = O::PROPERTIES.property_list();
            read_array(array_index, list.len(), |i| {
                DataValue::Enumerated(list[i].to_u32())
            })
        }
        _ => object.read_property(property, array_index),
    }
}

/// WriteProperty entry point shared by every object type.
pub fn write_object_property<O: BacnetObject>(
    object: &mut O,
    request: &WritePropertyData,
) -> Result<WriteOutcome<O::Value>, PropertyError> {
    // Read-only properties are denied even on types that do not carry them.
    if is_read_only_property(request.property) {
        return Err(PropertyError::WriteAccessDenied);
    }
    if !O::PROPERTIES.contains(request.property) {
        return Err(PropertyError::UnknownProperty(request.property));
    }
    if request.array_index.is_some() && !is_array_property(request.property) {
        return Err(PropertyError::PropertyIsNotAnArray);
    }
    object.write_property(request)
}

/// Name, description and the status fields every object carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHeader {
    pub instance: u32,
    pub name: String,
    pub description: String,
    pub out_of_service: bool,
    pub reliability: Reliability,
}

/// Effect of a header write on the object.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderWrite {
    /// Out-of-service or the fault status changed.
    pub status_changed: bool,
    pub persist: Option<ConfigChange>,
}

impl ObjectHeader {
    pub fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            instance,
            name: format!("{object_type} {instance}"),
            description: String::new(),
            out_of_service: false,
            reliability: Reliability::NoFaultDetected,
        }
    }

    /// Reads `name`, `description` and `out_of_service`.
    pub fn from_config(
        object_type: ObjectType,
        instance: u32,
        section: &ConfigSection<'_>,
    ) -> Result<Self, ConfigError> {
        let mut header = Self::new(object_type, instance);
        if let Some(name) = section.string("name").filter(|n| !n.is_empty()) {
            header.name = name;
        }
        header.description = section.string_or("description", "");
        header.out_of_service = section.flag("out_of_service")?;
        Ok(header)
    }

    pub fn fault(&self) -> bool {
        self.reliability != Reliability::NoFaultDetected
    }

    pub fn read(&self, property: PropertyId) -> Option<DataValue> {
        Some(match property {
            PropertyId::ObjectName => self.name.as_str().into(),
            PropertyId::Description => self.description.as_str().into(),
            PropertyId::OutOfService => DataValue::Boolean(self.out_of_service),
            PropertyId::Reliability => DataValue::Enumerated(self.reliability.to_u32()),
            _ => return None,
        })
    }

    /// Handles writes to the header properties; `Ok(None)` means the property
    /// belongs to the object type.
    pub fn write(
        &mut self,
        property: PropertyId,
        value: &DataValue,
    ) -> Result<Option<HeaderWrite>, PropertyError> {
        let unchanged = |persist| HeaderWrite {
            status_changed: false,
            persist,
        };
        Ok(Some(match property {
            PropertyId::ObjectName => {
                self.name = expect_object_name(value)?.to_string();
                unchanged(Some(ConfigChange::single("name", &self.name)))
            }
            PropertyId::Description => {
                self.description = expect_character_string(value)?.to_string();
                unchanged(Some(ConfigChange::single("description", &self.description)))
            }
            PropertyId::OutOfService => {
                let out_of_service = expect_boolean(value)?;
                let status_changed = out_of_service != self.out_of_service;
                self.out_of_service = out_of_service;
                HeaderWrite {
                    status_changed,
                    persist: Some(ConfigChange::flag("out_of_service", out_of_service)),
                }
            }
            PropertyId::Reliability => {
                let reliability = expect_reliability(value)?;
                if !self.out_of_service {
                    return Err(PropertyError::WriteAccessDenied);
                }
                let was_fault = self.fault();
                self.reliability = reliability;
                HeaderWrite {
                    status_changed: was_fault != self.fault(),
                    persist: None,
                }
            }
            _ => return Ok(None),
        }))
    }
}

/// Objects whose present-value is commanded through a priority array.
pub trait Commandable {
    type Value: Clone + PartialEq;

    fn priority_array(&self) -> &PriorityArray<Self::Value>;

    fn priority_array_mut(&mut self) -> &mut PriorityArray<Self::Value>;

    fn relinquish_default(&self) -> &Self::Value;

    /// Domain check for a commanded value.
    fn check_value(&self, value: &Self::Value) -> Result<(), PropertyError>;

    fn is_out_of_service(&self) -> bool;

    /// Compares the present-value against the last reported one.
    fn detect_cov(&mut self);

    fn decode_value(value: &DataValue) -> Result<Self::Value, PropertyError>;

    fn encode_value(value: &Self::Value) -> DataValue;

    fn present_value(&self) -> Self::Value {
        self.priority_array().resolve(self.relinquish_default())
    }

    fn current_command_priority(&self) -> u8 {
        self.priority_array().active_priority()
    }

    /// Commands `value` at `priority`, or relinquishes the slot for `None`.
    /// Returns the `(old, new)` present-value pair unless out of service.
    fn command(
        &mut self,
        value: Option<Self::Value>,
        priority: u8,
    ) -> Result<Option<(Self::Value, Self::Value)>, PropertyError> {
        check_priority(priority)?;
        if let Some(value) = &value {
            self.check_value(value)?;
        }
        let old = self.present_value();
        match value {
            Some(value) => self.priority_array_mut().set(priority, value)?,
            None => self.priority_array_mut().relinquish(priority)?,
        }
        let new = self.present_value();
        self.detect_cov();
        Ok((!self.is_out_of_service()).then_some((old, new)))
    }

    fn present_value_set(
        &mut self,
        value: Self::Value,
        priority: u8,
    ) -> Result<Option<(Self::Value, Self::Value)>, PropertyError> {
        self.command(Some(value), priority)
    }

    fn present_value_relinquish(
        &mut self,
        priority: u8,
    ) -> Result<Option<(Self::Value, Self::Value)>, PropertyError> {
        self.command(None, priority)
    }

    /// WriteProperty of PRESENT_VALUE: NULL relinquishes.
    fn write_present_value(
        &mut self,
        value: &DataValue,
        priority: u8,
    ) -> Result<Option<(Self::Value, Self::Value)>, PropertyError> {
        check_priority(priority)?;
        let value = match value {
            DataValue::Null => None,
            other => Some(Self::decode_value(other)?),
        };
        self.command(value, priority)
    }

    fn read_priority_array(&self, array_index: Option<u32>) -> Result<DataValue, PropertyError> {
        read_array(array_index, BACNET_MAX_PRIORITY as usize, |i| {
            self.priority_array()
                .slot(i as u8 + 1)
                .map_or(DataValue::Null, Self::encode_value)
        })
    }
}

/// Priority 6 is reserved and checked before the range.
pub fn check_priority(priority: u8) -> Result<(), PropertyError> {
    if priority == BACNET_MIN_ON_OFF_PRIORITY {
        return Err(PropertyError::WriteAccessDenied);
    }
    if !(BACNET_MIN_PRIORITY..=BACNET_MAX_PRIORITY).contains(&priority) {
        return Err(PropertyError::ValueOutOfRange);
    }
    Ok(())
}
