use super::{check_priority, BacnetObject, Commandable, ObjectHeader, WriteOutcome};
use crate::cov::CovTracker;
use crate::persist::{ConfigChange, ConfigSection};
use crate::priority::{PriorityArray, BACNET_MAX_PRIORITY};
use crate::property::{expect_enumerated, expect_real, PropertyLists, WritePropertyData};
use crate::{ConfigError, PropertyError};
use bacnode_core::types::{units, DataValue, ObjectType, PropertyId, StatusFlags};

const AO_PROPERTIES: PropertyLists = PropertyLists {
    required: &[
        PropertyId::ObjectIdentifier,
        PropertyId::ObjectName,
        PropertyId::ObjectType,
        PropertyId::PresentValue,
        PropertyId::StatusFlags,
        PropertyId::EventState,
        PropertyId::OutOfService,
        PropertyId::Units,
        PropertyId::PriorityArray,
        PropertyId::RelinquishDefault,
        PropertyId::CurrentCommandPriority,
    ],
    optional: &[
        PropertyId::Description,
        PropertyId::Reliability,
        PropertyId::MinPresValue,
        PropertyId::MaxPresValue,
        PropertyId::CovIncrement,
    ],
    proprietary: &[],
};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalogOutput {
    header: ObjectHeader,
    priority_array: PriorityArray<f32>,
    relinquish_default: f32,
    min_pres_value: f32,
    max_pres_value: f32,
    cov_increment: f32,
    units: u32,
    overridden: bool,
    cov: CovTracker<f32>,
}

impl AnalogOutput {
    pub fn units(&self) -> u32 {
        self.units
    }

    pub fn cov_increment(&self) -> f32 {
        self.cov_increment
    }

    pub fn set_cov_increment(&mut self, increment: f32) {
        self.cov_increment = increment.max(0.0);
    }

    /// Last present-value reported through COV.
    pub fn prior_value(&self) -> f32 {
        *self.cov.prior()
    }

    pub fn limits(&self) -> (f32, f32) {
        (self.min_pres_value, self.max_pres_value)
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    /// Local override of the physical output, reflected in status flags.
    pub fn set_overridden(&mut self, overridden: bool) {
        if overridden != self.overridden {
            self.overridden = overridden;
            self.cov.mark();
        }
    }
}

impl Commandable for AnalogOutput {
    type Value = f32;

    fn priority_array(&self) -> &PriorityArray<f32> {
        &self.priority_array
    }

    fn priority_array_mut(&mut self) -> &mut PriorityArray<f32> {
        &mut self.priority_array
    }

    fn relinquish_default(&self) -> &f32 {
        &self.relinquish_default
    }

    fn check_value(&self, value: &f32) -> Result<(), PropertyError> {
        if (self.min_pres_value..=self.max_pres_value).contains(value) {
            Ok(())
        } else {
            Err(PropertyError::ValueOutOfRange)
        }
    }

    fn is_out_of_service(&self) -> bool {
        self.header.out_of_service
    }

    fn detect_cov(&mut self) {
        let present_value = self.present_value();
        self.cov
            .detect_with_increment(present_value, self.cov_increment);
    }

    fn decode_value(value: &DataValue) -> Result<f32, PropertyError> {
        expect_real(value)
    }

    fn encode_value(value: &f32) -> DataValue {
        DataValue::Real(*value)
    }
}

impl BacnetObject for AnalogOutput {
    const OBJECT_TYPE: ObjectType = ObjectType::AnalogOutput;
    const PACKAGE: &'static str = "bacnet_ao";
    const PROPERTIES: PropertyLists = AO_PROPERTIES;
    type Value = f32;

    fn new(instance: u32) -> Self {
        Self {
            header: ObjectHeader::new(ObjectType::AnalogOutput, instance),
            priority_array: PriorityArray::new(),
            relinquish_default: 0.0,
            min_pres_value: 0.0,
            max_pres_value: 100.0,
            cov_increment: 1.0,
            units: units::PERCENT,
            overridden: false,
            cov: CovTracker::new(0.0),
        }
    }

    fn from_config(instance: u32, section: &ConfigSection<'_>) -> Result<Self, ConfigError> {
        let mut object = Self::new(instance);
        object.header = ObjectHeader::from_config(ObjectType::AnalogOutput, instance, section)?;
        object.units = section.parse_or("si_unit", object.units)?;
        object.min_pres_value = section.parse_or("min_value", object.min_pres_value)?;
        object.max_pres_value = section.parse_or("max_value", object.max_pres_value)?;
        if object.min_pres_value > object.max_pres_value {
            return Err(section.invalid("min_value", &object.min_pres_value.to_string()));
        }
        object.set_cov_increment(section.parse_or("cov_increment", object.cov_increment)?);
        object.relinquish_default =
            section.parse_or("relinquish_default", object.relinquish_default)?;
        if let Some(value) = section.parse::<f32>("value")? {
            object
                .check_value(&value)
                .map_err(|_| section.invalid("value", &value.to_string()))?;
            object
                .priority_array
                .set(BACNET_MAX_PRIORITY, value)
                .map_err(|_| section.invalid("value", &value.to_string()))?;
        }
        object.cov = CovTracker::new(object.present_value());
        Ok(object)
    }

    fn instance(&self) -> u32 {
        self.header.instance
    }

    fn name(&self) -> &str {
        &self.header.name
    }

    fn status_flags(&self) -> StatusFlags {
        StatusFlags {
            in_alarm: false,
            fault: self.header.fault(),
            overridden: self.overridden,
            out_of_service: self.header.out_of_service,
        }
    }

    fn read_property(
        &self,
        property: PropertyId,
        array_index: Option<u32>,
    ) -> Result<DataValue, PropertyError> {
        if let Some(value) = self.header.read(property) {
            return Ok(value);
        }
        Ok(match property {
            PropertyId::PresentValue => DataValue::Real(self.present_value()),
            PropertyId::Units => DataValue::Enumerated(self.units),
            PropertyId::PriorityArray => return self.read_priority_array(array_index),
            PropertyId::RelinquishDefault => DataValue::Real(self.relinquish_default),
            PropertyId::CurrentCommandPriority => {
                DataValue::Unsigned(self.current_command_priority() as u32)
            }
            PropertyId::MinPresValue => DataValue::Real(self.min_pres_value),
            PropertyId::MaxPresValue => DataValue::Real(self.max_pres_value),
            PropertyId::CovIncrement => DataValue::Real(self.cov_increment),
            _ => return Err(PropertyError::UnknownProperty(property)),
        })
    }

    fn write_property(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<f32>, PropertyError> {
        if request.property == PropertyId::PresentValue {
            check_priority(request.priority())?;
        }
        let value = request.decode_value()?;
        if let Some(write) = self.header.write(request.property, &value)? {
            if write.status_changed {
                self.cov.mark();
            }
            return Ok(WriteOutcome::persist_all(write.persist.into_iter().collect()));
        }

        match request.property {
            PropertyId::PresentValue => {
                let commanded = self.write_present_value(&value, request.priority())?;
                Ok(WriteOutcome {
                    commanded,
                    persist: vec![ConfigChange::single("value", self.present_value())],
                })
            }
            PropertyId::Units => {
                self.units = expect_enumerated(&value)?;
                Ok(WriteOutcome::persist(ConfigChange::single("si_unit", self.units)))
            }
            PropertyId::CovIncrement => {
                let increment = expect_real(&value)?;
                if !increment.is_finite() || increment < 0.0 {
                    return Err(PropertyError::ValueOutOfRange);
                }
                self.cov_increment = increment;
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "cov_increment",
                    increment,
                )))
            }
            PropertyId::MinPresValue => {
                let min = expect_real(&value)?;
                if !min.is_finite() || min > self.max_pres_value {
                    return Err(PropertyError::ValueOutOfRange);
                }
                self.min_pres_value = min;
                Ok(WriteOutcome::persist(ConfigChange::single("min_value", min)))
            }
            PropertyId::MaxPresValue => {
                let max = expect_real(&value)?;
                if !max.is_finite() || max < self.min_pres_value {
                    return Err(PropertyError::ValueOutOfRange);
                }
                self.max_pres_value = max;
                Ok(WriteOutcome::persist(ConfigChange::single("max_value", max)))
            }
            PropertyId::RelinquishDefault => {
                let default = expect_real(&value)?;
                if !default.is_finite() {
                    return Err(PropertyError::ValueOutOfRange);
                }
                self.relinquish_default = default;
                self.detect_cov();
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "relinquish_default",
                    default,
                )))
            }
            _ => Err(PropertyError::WriteAccessDenied),
        }
    }

    fn cov_changed(&self) -> bool {
        self.cov.changed()
    }

    fn cov_clear(&mut self) {
        self.cov.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::AnalogOutput;
    use crate::objects::{read_object_property, write_object_property, BacnetObject, Commandable};
    use crate::persist::{ConfigSection, ConfigStore, MemoryConfigStore};
    use crate::property::WritePropertyData;
    use crate::PropertyError;
    use bacnode_core::types::{DataValue, PropertyId};

    fn write(
        ao: &mut AnalogOutput,
        property: PropertyId,
        value: DataValue,
        priority: u8,
    ) -> Result<(), PropertyError> {
        let request = WritePropertyData::new(ao.object_id(), property, &value)
            .unwrap()
            .with_priority(priority);
        write_object_property(ao, &request).map(|_| ())
    }

    #[test]
    fn bounds_come_from_min_and_max_pres_value() {
        let mut ao = AnalogOutput::new(1);
        assert_eq!(
            ao.present_value_set(100.5, 8),
            Err(PropertyError::ValueOutOfRange)
        );
        assert_eq!(ao.present_value_set(-1.0, 8), Err(PropertyError::ValueOutOfRange));
        assert_eq!(ao.present_value_set(100.0, 8), Ok(Some((0.0, 100.0))));
    }

    #[test]
    fn relinquish_returns_to_default_and_priority_zero() {
        let mut ao = AnalogOutput::new(1);
        write(&mut ao, PropertyId::PresentValue, DataValue::Real(42.0), 10).unwrap();
        assert_eq!(ao.current_command_priority(), 10);
        write(&mut ao, PropertyId::PresentValue, DataValue::Null, 10).unwrap();
        assert_eq!(ao.present_value(), 0.0);
        assert_eq!(
            read_object_property(&ao, PropertyId::CurrentCommandPriority, None),
            Ok(DataValue::Unsigned(0))
        );
    }

    #[test]
    fn out_of_service_commands_stay_internal() {
        let mut ao = AnalogOutput::new(1);
        write(&mut ao, PropertyId::OutOfService, DataValue::Boolean(true), 16).unwrap();
        assert!(ao.cov_changed());
        assert_eq!(ao.present_value_set(12.0, 1), Ok(None));
        assert_eq!(ao.present_value(), 12.0);
    }

    #[test]
    fn priority_array_reads_null_for_empty_slots() {
        let mut ao = AnalogOutput::new(1);
        ao.present_value_set(3.0, 2).unwrap();
        assert_eq!(
            read_object_property(&ao, PropertyId::PriorityArray, Some(2)),
            Ok(DataValue::Real(3.0))
        );
        assert_eq!(
            read_object_property(&ao, PropertyId::PriorityArray, Some(1)),
            Ok(DataValue::Null)
        );
        assert_eq!(
            read_object_property(&ao, PropertyId::PriorityArray, Some(17)),
            Err(PropertyError::InvalidArrayIndex)
        );
        assert_eq!(
            read_object_property(&ao, PropertyId::PresentValue, Some(1)),
            Err(PropertyError::PropertyIsNotAnArray)
        );
    }

    #[test]
    fn loads_from_config() {
        let mut store = MemoryConfigStore::new();
        store.set("bacnet_ao", "2", "name", "Damper").unwrap();
        store.set("bacnet_ao", "2", "max_value", "50").unwrap();
        store.set("bacnet_ao", "2", "value", "25").unwrap();
        store.set("bacnet_ao", "2", "cov_increment", "0.5").unwrap();

        let section = ConfigSection::new(&store, "bacnet_ao", "2");
        let ao = AnalogOutput::from_config(2, &section).unwrap();
        assert_eq!(ao.name(), "Damper");
        assert_eq!(ao.limits(), (0.0, 50.0));
        assert_eq!(ao.present_value(), 25.0);
        assert_eq!(ao.prior_value(), 25.0);
        assert!(!ao.cov_changed());
    }
}
