//! Binary Input and Binary Output.
//!
//! Both share one implementation parameterised by a [`BinaryKind`] marker;
//! they differ in object type, configuration package and whether a
//! reliability fault drives the event state to FAULT.

use super::{check_priority, BacnetObject, Commandable, ObjectHeader, WriteOutcome};
use crate::cov::CovTracker;
use crate::observer::NotificationClassReporter;
use crate::persist::{ConfigChange, ConfigSection};
use crate::priority::{PriorityArray, BACNET_MAX_PRIORITY};
use crate::property::{
    expect_character_string, expect_enumerated, PropertyLists, WritePropertyData,
};
use crate::reporting::{EventInput, EventNotification, IntrinsicReporting, REPORTING_PROPERTIES};
use crate::{ConfigError, PropertyError};
use bacnode_core::types::{
    BinaryPv, DataValue, DateTime, EventState, ObjectType, Polarity, PropertyId, StatusFlags,
};
use std::fmt::Debug;
use std::marker::PhantomData;

pub trait BinaryKind: Debug + Clone + PartialEq {
    const OBJECT_TYPE: ObjectType;
    const PACKAGE: &'static str;
    const FAULT_FROM_RELIABILITY: bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {}

impl BinaryKind for Input {
    const OBJECT_TYPE: ObjectType = ObjectType::BinaryInput;
    const PACKAGE: &'static str = "bacnet_bi";
    const FAULT_FROM_RELIABILITY: bool = false;
}

impl BinaryKind for Output {
    const OBJECT_TYPE: ObjectType = ObjectType::BinaryOutput;
    const PACKAGE: &'static str = "bacnet_bo";
    const FAULT_FROM_RELIABILITY: bool = true;
}

pub type BinaryInput = BinaryObject<Input>;
pub type BinaryOutput = BinaryObject<Output>;

const BINARY_PROPERTIES: PropertyLists = PropertyLists {
    required: &[
        PropertyId::ObjectIdentifier,
        PropertyId::ObjectName,
        PropertyId::ObjectType,
        PropertyId::PresentValue,
        PropertyId::StatusFlags,
        PropertyId::EventState,
        PropertyId::OutOfService,
        PropertyId::Polarity,
        PropertyId::PriorityArray,
        PropertyId::RelinquishDefault,
        PropertyId::CurrentCommandPriority,
    ],
    optional: &[
        PropertyId::Description,
        PropertyId::Reliability,
        PropertyId::ActiveText,
        PropertyId::InactiveText,
        PropertyId::AlarmValue,
        REPORTING_PROPERTIES[0],
        REPORTING_PROPERTIES[1],
        REPORTING_PROPERTIES[2],
        REPORTING_PROPERTIES[3],
        REPORTING_PROPERTIES[4],
        REPORTING_PROPERTIES[5],
        REPORTING_PROPERTIES[6],
    ],
    proprietary: &[],
};

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryObject<K: BinaryKind> {
    header: ObjectHeader,
    priority_array: PriorityArray<BinaryPv>,
    relinquish_default: BinaryPv,
    polarity: Polarity,
    active_text: String,
    inactive_text: String,
    alarm_value: BinaryPv,
    overridden: bool,
    reporting: IntrinsicReporting,
    cov: CovTracker<BinaryPv>,
    kind: PhantomData<K>,
}

fn binary_pv(value: u32) -> Result<BinaryPv, PropertyError> {
    BinaryPv::from_u32(value).ok_or(PropertyError::ValueOutOfRange)
}

fn parse_binary_pv(section: &ConfigSection<'_>, option: &str) -> Result<Option<BinaryPv>, ConfigError> {
    match section.parse::<u32>(option)? {
        Some(raw) => BinaryPv::from_u32(raw)
            .map(Some)
            .ok_or_else(|| section.invalid(option, &raw.to_string())),
        None => Ok(None),
    }
}

impl<K: BinaryKind> BinaryObject<K> {
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn alarm_value(&self) -> BinaryPv {
        self.alarm_value
    }

    pub fn set_alarm_value(&mut self, value: BinaryPv) {
        self.alarm_value = value;
    }

    pub fn active_text(&self) -> &str {
        &self.active_text
    }

    pub fn inactive_text(&self) -> &str {
        &self.inactive_text
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    pub fn reporting_config(&mut self) -> &mut IntrinsicReporting {
        &mut self.reporting
    }

    pub fn set_overridden(&mut self, overridden: bool) {
        if overridden != self.overridden {
            self.overridden = overridden;
            self.cov.mark();
        }
    }

    fn event_input(&self) -> EventInput {
        let present_value = self.present_value();
        EventInput {
            offnormal: present_value == self.alarm_value,
            fault: K::FAULT_FROM_RELIABILITY && self.header.fault(),
            value: DataValue::Enumerated(present_value.to_u32()),
            status_flags: self.status_flags(),
        }
    }
}

impl<K: BinaryKind> Commandable for BinaryObject<K> {
    type Value = BinaryPv;

    fn priority_array(&self) -> &PriorityArray<BinaryPv> {
        &self.priority_array
    }

    fn priority_array_mut(&mut self) -> &mut PriorityArray<BinaryPv> {
        &mut self.priority_array
    }

    fn relinquish_default(&self) -> &BinaryPv {
        &self.relinquish_default
    }

    fn check_value(&self, _value: &BinaryPv) -> Result<(), PropertyError> {
        Ok(())
    }

    fn is_out_of_service(&self) -> bool {
        self.header.out_of_service
    }

    fn detect_cov(&mut self) {
        let present_value = self.present_value();
        self.cov.detect(&present_value);
    }

    fn decode_value(value: &DataValue) -> Result<BinaryPv, PropertyError> {
        binary_pv(expect_enumerated(value)?)
    }

    fn encode_value(value: &BinaryPv) -> DataValue {
        DataValue::Enumerated(value.to_u32())
    }
}

impl<K: BinaryKind> BacnetObject for BinaryObject<K> {
    const OBJECT_TYPE: ObjectType = K::OBJECT_TYPE;
    const PACKAGE: &'static str = K::PACKAGE;
    const PROPERTIES: PropertyLists = BINARY_PROPERTIES;
    type Value = BinaryPv;

    fn new(instance: u32) -> Self {
        Self {
            header: ObjectHeader::new(K::OBJECT_TYPE, instance),
            priority_array: PriorityArray::new(),
            relinquish_default: BinaryPv::Inactive,
            polarity: Polarity::Normal,
            active_text: "Active".to_string(),
            inactive_text: "Inactive".to_string(),
            alarm_value: BinaryPv::Active,
            overridden: false,
            reporting: IntrinsicReporting::default(),
            cov: CovTracker::new(BinaryPv::Inactive),
            kind: PhantomData,
        }
    }

    fn from_config(instance: u32, section: &ConfigSection<'_>) -> Result<Self, ConfigError> {
        let mut object = Self::new(instance);
        object.header = ObjectHeader::from_config(K::OBJECT_TYPE, instance, section)?;
        object.polarity = match section.parse::<u32>("polarity")? {
            Some(raw) => {
                Polarity::from_u32(raw).ok_or_else(|| section.invalid("polarity", &raw.to_string()))?
            }
            None => Polarity::Normal,
        };
        object.active_text = section.string_or("active", &object.active_text);
        object.inactive_text = section.string_or("inactive", &object.inactive_text);
        if let Some(alarm_value) = parse_binary_pv(section, "alarm_value")? {
            object.alarm_value = alarm_value;
        }
        if let Some(default) = parse_binary_pv(section, "relinquish_default")? {
            object.relinquish_default = default;
        }
        if let Some(value) = parse_binary_pv(section, "value")? {
            object
                .priority_array
                .set(BACNET_MAX_PRIORITY, value)
                .map_err(|_| section.invalid("value", &value.to_u32().to_string()))?;
        }
        object.reporting = IntrinsicReporting::from_config(section)?;
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
            in_alarm: self.reporting.event_state() != EventState::Normal,
            fault: self.header.fault(),
            overridden: self.overridden,
            out_of_service: self.header.out_of_service,
        }
    }

    fn reporting(&self) -> Option<&IntrinsicReporting> {
        Some(&self.reporting)
    }

    fn reporting_mut(&mut self) -> Option<&mut IntrinsicReporting> {
        Some(&mut self.reporting)
    }

    fn intrinsic_reporting(
        &mut self,
        now: DateTime,
        reporter: &mut dyn NotificationClassReporter,
    ) -> Option<EventNotification> {
        let input = self.event_input();
        let object_id = self.object_id();
        let in_alarm = input.status_flags.in_alarm;
        let notification = self.reporting.evaluate(object_id, input, now, reporter);
        if self.status_flags().in_alarm != in_alarm {
            self.cov.mark();
        }
        notification
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
            PropertyId::PresentValue => Self::encode_value(&self.present_value()),
            PropertyId::Polarity => DataValue::Enumerated(self.polarity.to_u32()),
            PropertyId::PriorityArray => return self.read_priority_array(array_index),
            PropertyId::RelinquishDefault => Self::encode_value(&self.relinquish_default),
            PropertyId::CurrentCommandPriority => {
                DataValue::Unsigned(self.current_command_priority() as u32)
            }
            PropertyId::ActiveText => self.active_text.as_str().into(),
            PropertyId::InactiveText => self.inactive_text.as_str().into(),
            PropertyId::AlarmValue => Self::encode_value(&self.alarm_value),
            _ => return self.reporting.read_property(property, array_index),
        })
    }

    fn write_property(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<BinaryPv>, PropertyError> {
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
                    persist: vec![ConfigChange::single(
                        "value",
                        self.present_value().to_u32(),
                    )],
                })
            }
            PropertyId::Polarity => {
                self.polarity = Polarity::from_u32(expect_enumerated(&value)?)
                    .ok_or(PropertyError::ValueOutOfRange)?;
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "polarity",
                    self.polarity.to_u32(),
                )))
            }
            PropertyId::ActiveText => {
                self.active_text = expect_character_string(&value)?.to_string();
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "active",
                    &self.active_text,
                )))
            }
            PropertyId::InactiveText => {
                self.inactive_text = expect_character_string(&value)?.to_string();
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "inactive",
                    &self.inactive_text,
                )))
            }
            PropertyId::AlarmValue => {
                self.alarm_value = Self::decode_value(&value)?;
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "alarm_value",
                    self.alarm_value.to_u32(),
                )))
            }
            PropertyId::RelinquishDefault => {
                self.relinquish_default = Self::decode_value(&value)?;
                self.detect_cov();
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "relinquish_default",
                    self.relinquish_default.to_u32(),
                )))
            }
            property => {
                let change = self.reporting.write_property(property, &value)?;
                Ok(WriteOutcome::persist_all(change.into_iter().collect()))
            }
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
    use super::{BinaryInput, BinaryOutput};
    use crate::objects::{write_object_property, BacnetObject, Commandable};
    use crate::observer::NotificationClassReporter;
    use crate::property::WritePropertyData;
    use crate::reporting::EventNotification;
    use crate::PropertyError;
    use bacnode_core::types::{
        BinaryPv, DataValue, Date, DateTime, EventState, EventTransitionBits, PropertyId,
        Reliability, Time,
    };

    struct Quiet;

    impl NotificationClassReporter for Quiet {
        fn report(&mut self, _notification: &mut EventNotification) {}
    }

    fn now() -> DateTime {
        DateTime::new(Date::new(2024, 2, 1), Time::hm(12, 0))
    }

    #[test]
    fn any_change_of_state_is_a_cov() {
        let mut bi = BinaryInput::new(1);
        bi.present_value_set(BinaryPv::Active, 9).unwrap();
        assert!(bi.cov_changed());
        bi.cov_clear();
        bi.present_value_set(BinaryPv::Active, 9).unwrap();
        assert!(!bi.cov_changed());
    }

    #[test]
    fn enumerations_beyond_active_are_out_of_range() {
        let mut bo = BinaryOutput::new(1);
        let request =
            WritePropertyData::new(bo.object_id(), PropertyId::PresentValue, &DataValue::Enumerated(2))
                .unwrap();
        assert_eq!(
            write_object_property(&mut bo, &request),
            Err(PropertyError::ValueOutOfRange)
        );
        let request =
            WritePropertyData::new(bo.object_id(), PropertyId::PresentValue, &DataValue::Real(1.0))
                .unwrap();
        assert_eq!(
            write_object_property(&mut bo, &request),
            Err(PropertyError::InvalidDataType)
        );
    }

    #[test]
    fn alarm_value_drives_offnormal() {
        let mut bi = BinaryInput::new(3);
        bi.reporting_config().event_enable = EventTransitionBits::ALL;
        bi.present_value_set(BinaryPv::Active, 16).unwrap();
        let event = bi.intrinsic_reporting(now(), &mut Quiet).expect("alarm");
        assert_eq!(event.to_state, EventState::Offnormal);
        assert!(bi.status_flags().in_alarm);

        bi.present_value_set(BinaryPv::Inactive, 16).unwrap();
        let event = bi.intrinsic_reporting(now(), &mut Quiet).expect("normal");
        assert_eq!(event.to_state, EventState::Normal);
    }

    #[test]
    fn only_outputs_fault_on_reliability() {
        let oos = DataValue::Boolean(true);
        let fault = DataValue::Enumerated(Reliability::NoOutput.to_u32());

        let mut bo = BinaryOutput::new(1);
        for (property, value) in [(PropertyId::OutOfService, &oos), (PropertyId::Reliability, &fault)] {
            let request = WritePropertyData::new(bo.object_id(), property, value).unwrap();
            write_object_property(&mut bo, &request).unwrap();
        }
        let event = bo.intrinsic_reporting(now(), &mut Quiet).expect("fault");
        assert_eq!(event.to_state, EventState::Fault);

        let mut bi = BinaryInput::new(1);
        for (property, value) in [(PropertyId::OutOfService, &oos), (PropertyId::Reliability, &fault)] {
            let request = WritePropertyData::new(bi.object_id(), property, value).unwrap();
            write_object_property(&mut bi, &request).unwrap();
        }
        assert!(bi.intrinsic_reporting(now(), &mut Quiet).is_none());
        assert!(bi.status_flags().fault);
    }
}
