//! Multi-State Input.
//!
//! States are numbered from 1 on every interface; the alarm flags are kept
//! 0-based internally, so state `n` lives at `alarm_states[n - 1]`.

use super::{check_priority, BacnetObject, Commandable, ObjectHeader, WriteOutcome};
use crate::cov::CovTracker;
use crate::observer::NotificationClassReporter;
use crate::persist::{ConfigChange, ConfigSection};
use crate::priority::{PriorityArray, BACNET_MAX_PRIORITY};
use crate::property::{
    expect_character_string, expect_unsigned, read_array, PropertyLists, WritePropertyData,
};
use crate::reporting::{EventInput, EventNotification, IntrinsicReporting, REPORTING_PROPERTIES};
use crate::{ConfigError, PropertyError};
use bacnode_core::types::{DataValue, DateTime, EventState, ObjectType, PropertyId, StatusFlags};
use bacnode_core::value_codec::decode_application_values;

const MI_PROPERTIES: PropertyLists = PropertyLists {
    required: &[
        PropertyId::ObjectIdentifier,
        PropertyId::ObjectName,
        PropertyId::ObjectType,
        PropertyId::PresentValue,
        PropertyId::StatusFlags,
        PropertyId::EventState,
        PropertyId::OutOfService,
        PropertyId::NumberOfStates,
        PropertyId::PriorityArray,
        PropertyId::RelinquishDefault,
        PropertyId::CurrentCommandPriority,
    ],
    optional: &[
        PropertyId::Description,
        PropertyId::Reliability,
        PropertyId::StateText,
        PropertyId::AlarmValues,
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
pub struct MultiStateInput {
    header: ObjectHeader,
    priority_array: PriorityArray<u32>,
    relinquish_default: u32,
    state_text: Vec<String>,
    alarm_states: Vec<bool>,
    overridden: bool,
    reporting: IntrinsicReporting,
    cov: CovTracker<u32>,
}

impl MultiStateInput {
    pub fn number_of_states(&self) -> u32 {
        self.state_text.len() as u32
    }

    /// Text of state `state` (1-based).
    pub fn state_text(&self, state: u32) -> Option<&str> {
        let index = state.checked_sub(1)? as usize;
        self.state_text.get(index).map(String::as_str)
    }

    pub fn is_alarm_state(&self, state: u32) -> bool {
        state
            .checked_sub(1)
            .and_then(|i| self.alarm_states.get(i as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Flags `state` (1-based) as an alarm value.
    pub fn set_alarm_state(&mut self, state: u32, alarm: bool) -> Result<(), PropertyError> {
        self.check_state(state)?;
        self.alarm_states[state as usize - 1] = alarm;
        Ok(())
    }

    /// Alarm values as 1-based state numbers.
    pub fn alarm_values(&self) -> Vec<u32> {
        self.alarm_states
            .iter()
            .enumerate()
            .filter(|(_, alarm)| **alarm)
            .map(|(i, _)| i as u32 + 1)
            .collect()
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

    fn check_state(&self, state: u32) -> Result<(), PropertyError> {
        if (1..=self.number_of_states()).contains(&state) {
            Ok(())
        } else {
            Err(PropertyError::ValueOutOfRange)
        }
    }

    /// Replaces the state texts, resizing the alarm flags to match. Commanded
    /// values and the relinquish default must remain valid states.
    pub fn set_state_text(&mut self, texts: Vec<String>) -> Result<(), PropertyError> {
        let count = texts.len() as u32;
        if count == 0 {
            return Err(PropertyError::ValueOutOfRange);
        }
        let in_range = |state: &u32| (1..=count).contains(state);
        if !in_range(&self.relinquish_default)
            || self.priority_array.iter().flatten().any(|v| !in_range(v))
        {
            return Err(PropertyError::ValueOutOfRange);
        }
        self.alarm_states.resize(texts.len(), false);
        self.state_text = texts;
        Ok(())
    }

    fn event_input(&self) -> EventInput {
        let present_value = self.present_value();
        EventInput {
            offnormal: self.is_alarm_state(present_value),
            fault: false,
            value: DataValue::Unsigned(present_value),
            status_flags: self.status_flags(),
        }
    }

    fn state_text_change(&self) -> ConfigChange {
        ConfigChange::list("state", self.state_text.clone())
    }

    fn alarm_value_change(&self) -> ConfigChange {
        ConfigChange::list(
            "alarm_value",
            self.alarm_values().iter().map(u32::to_string).collect(),
        )
    }

    fn write_state_text_array(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<u32>, PropertyError> {
        let values = decode_application_values(&mut request.reader())?;
        let texts = values
            .iter()
            .map(|v| expect_character_string(v).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        self.set_state_text(texts)?;
        Ok(WriteOutcome::persist_all(vec![
            self.state_text_change(),
            self.alarm_value_change(),
        ]))
    }

    fn write_alarm_values(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<u32>, PropertyError> {
        let values = decode_application_values(&mut request.reader())?;
        let mut alarm_states = vec![false; self.state_text.len()];
        for value in &values {
            let state = expect_unsigned(value)?;
            self.check_state(state)?;
            alarm_states[state as usize - 1] = true;
        }
        self.alarm_states = alarm_states;
        Ok(WriteOutcome::persist(self.alarm_value_change()))
    }
}

impl Commandable for MultiStateInput {
    type Value = u32;

    fn priority_array(&self) -> &PriorityArray<u32> {
        &self.priority_array
    }

    fn priority_array_mut(&mut self) -> &mut PriorityArray<u32> {
        &mut self.priority_array
    }

    fn relinquish_default(&self) -> &u32 {
        &self.relinquish_default
    }

    fn check_value(&self, value: &u32) -> Result<(), PropertyError> {
        self.check_state(*value)
    }

    fn is_out_of_service(&self) -> bool {
        self.header.out_of_service
    }

    fn detect_cov(&mut self) {
        let present_value = self.present_value();
        self.cov.detect(&present_value);
    }

    fn decode_value(value: &DataValue) -> Result<u32, PropertyError> {
        expect_unsigned(value)
    }

    fn encode_value(value: &u32) -> DataValue {
        DataValue::Unsigned(*value)
    }
}

impl BacnetObject for MultiStateInput {
    const OBJECT_TYPE: ObjectType = ObjectType::MultiStateInput;
    const PACKAGE: &'static str = "bacnet_mi";
    const PROPERTIES: PropertyLists = MI_PROPERTIES;
    type Value = u32;

    fn new(instance: u32) -> Self {
        Self {
            header: ObjectHeader::new(ObjectType::MultiStateInput, instance),
            priority_array: PriorityArray::new(),
            relinquish_default: 1,
            state_text: vec!["State 1".to_string(), "State 2".to_string()],
            alarm_states: vec![false; 2],
            overridden: false,
            reporting: IntrinsicReporting::default(),
            cov: CovTracker::new(1),
        }
    }

    fn from_config(instance: u32, section: &ConfigSection<'_>) -> Result<Self, ConfigError> {
        let mut object = Self::new(instance);
        object.header = ObjectHeader::from_config(ObjectType::MultiStateInput, instance, section)?;
        let states = section.list("state");
        if !states.is_empty() {
            object.alarm_states = vec![false; states.len()];
            object.state_text = states;
        }
        for raw in section.list("alarm_value") {
            let state = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| section.invalid("alarm_value", &raw))?;
            object
                .set_alarm_state(state, true)
                .map_err(|_| section.invalid("alarm_value", &raw))?;
        }
        let default = section.parse_or("relinquish_default", object.relinquish_default)?;
        object
            .check_state(default)
            .map_err(|_| section.invalid("relinquish_default", &default.to_string()))?;
        object.relinquish_default = default;
        if let Some(value) = section.parse::<u32>("value")? {
            object
                .check_state(value)
                .map_err(|_| section.invalid("value", &value.to_string()))?;
            object
                .priority_array
                .set(BACNET_MAX_PRIORITY, value)
                .map_err(|_| section.invalid("value", &value.to_string()))?;
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
            PropertyId::PresentValue => DataValue::Unsigned(self.present_value()),
            PropertyId::NumberOfStates => DataValue::Unsigned(self.number_of_states()),
            PropertyId::PriorityArray => return self.read_priority_array(array_index),
            PropertyId::RelinquishDefault => DataValue::Unsigned(self.relinquish_default),
            PropertyId::CurrentCommandPriority => {
                DataValue::Unsigned(self.current_command_priority() as u32)
            }
            PropertyId::StateText => {
                return read_array(array_index, self.state_text.len(), |i| {
                    self.state_text[i].as_str().into()
                })
            }
            PropertyId::AlarmValues => DataValue::List(
                self.alarm_values()
                    .into_iter()
                    .map(DataValue::Unsigned)
                    .collect(),
            ),
            _ => return self.reporting.read_property(property, array_index),
        })
    }

    fn write_property(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<u32>, PropertyError> {
        match request.property {
            PropertyId::PresentValue => check_priority(request.priority())?,
            PropertyId::StateText if request.array_index.is_none() => {
                return self.write_state_text_array(request)
            }
            PropertyId::AlarmValues => return self.write_alarm_values(request),
            _ => {}
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
            PropertyId::StateText => {
                let text = expect_character_string(&value)?.to_string();
                let slot = match request.array_index {
                    Some(0) => return Err(PropertyError::WriteAccessDenied),
                    Some(index) => self
                        .state_text
                        .get_mut(index as usize - 1)
                        .ok_or(PropertyError::InvalidArrayIndex)?,
                    None => return Err(PropertyError::InvalidArrayIndex),
                };
                *slot = text;
                Ok(WriteOutcome::persist(self.state_text_change()))
            }
            PropertyId::RelinquishDefault => {
                let default = expect_unsigned(&value)?;
                self.check_state(default)?;
                self.relinquish_default = default;
                self.detect_cov();
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "relinquish_default",
                    default,
                )))
            }
            PropertyId::NumberOfStates => Err(PropertyError::WriteAccessDenied),
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
    use super::MultiStateInput;
    use crate::objects::{read_object_property, write_object_property, BacnetObject, Commandable};
    use crate::observer::NotificationClassReporter;
    use crate::persist::{ConfigSection, ConfigStore, MemoryConfigStore};
    use crate::property::WritePropertyData;
    use crate::reporting::EventNotification;
    use crate::PropertyError;
    use bacnode_core::types::{
        DataValue, Date, DateTime, EventState, EventTransitionBits, PropertyId, Time,
    };

    struct Quiet;

    impl NotificationClassReporter for Quiet {
        fn report(&mut self, _notification: &mut EventNotification) {}
    }

    fn modes() -> MultiStateInput {
        let mut store = MemoryConfigStore::new();
        let states = ["Off", "Heat", "Cool"].map(String::from);
        store.set_list("bacnet_mi", "4", "state", &states).unwrap();
        store
            .set_list("bacnet_mi", "4", "alarm_value", &["3".to_string()])
            .unwrap();
        let section = ConfigSection::new(&store, "bacnet_mi", "4");
        MultiStateInput::from_config(4, &section).unwrap()
    }

    #[test]
    fn states_are_one_based() {
        let mut mi = modes();
        assert_eq!(mi.number_of_states(), 3);
        assert_eq!(mi.present_value_set(0, 8), Err(PropertyError::ValueOutOfRange));
        assert_eq!(mi.present_value_set(4, 8), Err(PropertyError::ValueOutOfRange));
        assert_eq!(mi.present_value_set(3, 8), Ok(Some((1, 3))));
        assert_eq!(mi.state_text(3), Some("Cool"));
        assert_eq!(mi.state_text(0), None);
    }

    #[test]
    fn alarm_values_map_to_internal_flags() {
        let mut mi = modes();
        assert_eq!(mi.alarm_values(), vec![3]);
        assert!(mi.is_alarm_state(3));
        assert!(!mi.is_alarm_state(1));

        let request = WritePropertyData::new(
            mi.object_id(),
            PropertyId::AlarmValues,
            &DataValue::List(vec![DataValue::Unsigned(1), DataValue::Unsigned(2)]),
        )
        .unwrap();
        write_object_property(&mut mi, &request).unwrap();
        assert_eq!(
            read_object_property(&mi, PropertyId::AlarmValues, None),
            Ok(DataValue::List(vec![
                DataValue::Unsigned(1),
                DataValue::Unsigned(2)
            ]))
        );

        let request = WritePropertyData::new(
            mi.object_id(),
            PropertyId::AlarmValues,
            &DataValue::List(vec![DataValue::Unsigned(0)]),
        )
        .unwrap();
        assert_eq!(
            write_object_property(&mut mi, &request),
            Err(PropertyError::ValueOutOfRange)
        );
    }

    #[test]
    fn state_text_is_an_array() {
        let mut mi = modes();
        assert_eq!(
            read_object_property(&mi, PropertyId::StateText, Some(0)),
            Ok(DataValue::Unsigned(3))
        );
        let request =
            WritePropertyData::new(mi.object_id(), PropertyId::StateText, &"Auto".into())
                .unwrap()
                .with_index(1);
        write_object_property(&mut mi, &request).unwrap();
        assert_eq!(mi.state_text(1), Some("Auto"));

        let request =
            WritePropertyData::new(mi.object_id(), PropertyId::StateText, &"x".into())
                .unwrap()
                .with_index(4);
        assert_eq!(
            write_object_property(&mut mi, &request),
            Err(PropertyError::InvalidArrayIndex)
        );
    }

    #[test]
    fn shrinking_state_text_keeps_commands_valid() {
        let mut mi = modes();
        mi.present_value_set(3, 10).unwrap();
        let two = vec!["A".to_string(), "B".to_string()];
        assert_eq!(mi.set_state_text(two.clone()), Err(PropertyError::ValueOutOfRange));
        mi.present_value_relinquish(10).unwrap();
        mi.set_state_text(two).unwrap();
        assert_eq!(mi.number_of_states(), 2);
        assert!(mi.alarm_values().is_empty());
    }

    #[test]
    fn alarm_state_raises_offnormal() {
        let mut mi = modes();
        mi.reporting_config().event_enable = EventTransitionBits::ALL;
        let now = DateTime::new(Date::new(2024, 1, 1), Time::hm(0, 0));
        mi.present_value_set(3, 16).unwrap();
        let event = mi.intrinsic_reporting(now, &mut Quiet).expect("alarm");
        assert_eq!(event.to_state, EventState::Offnormal);
        assert_eq!(event.new_state, DataValue::Unsigned(3));
    }
}
