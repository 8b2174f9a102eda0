//! Intrinsic (change-of-state) event reporting.
//!
//! Each reporting object owns an [`IntrinsicReporting`] record. The device
//! calls [`IntrinsicReporting::evaluate`] once per reporting tick with the
//! object's current alarm/fault condition; the record runs the
//! NORMAL/OFFNORMAL/FAULT state machine, counts down the time delay and
//! hands realised transitions to a [`NotificationClassReporter`].

use crate::observer::NotificationClassReporter;
use crate::persist::{ConfigChange, ConfigSection};
use crate::property::{
    expect_bit_string, expect_boolean, expect_enumerated, expect_unsigned, read_array,
};
use crate::{ConfigError, PropertyError};
use bacnode_core::types::{
    DataValue, DateTime, EventState, EventTransitionBits, EventType, NotifyType, ObjectId,
    PropertyId, StatusFlags, TimeStamp, Transition,
};
use serde::Serialize;

/// Properties every intrinsically reporting object adds to its optional list.
pub const REPORTING_PROPERTIES: [PropertyId; 7] = [
    PropertyId::TimeDelay,
    PropertyId::NotificationClass,
    PropertyId::EventEnable,
    PropertyId::AckedTransitions,
    PropertyId::NotifyType,
    PropertyId::EventTimeStamps,
    PropertyId::EventDetectionEnable,
];

/// ConfirmedEventNotification content produced by a transition or an
/// acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventNotification {
    /// Filled in by the device context.
    pub initiating_device: Option<ObjectId>,
    pub event_object: ObjectId,
    pub time_stamp: TimeStamp,
    pub notification_class: u32,
    /// Filled in by the notification class.
    pub priority: u8,
    pub event_type: EventType,
    pub message_text: Option<String>,
    pub notify_type: NotifyType,
    /// Filled in by the notification class.
    pub ack_required: bool,
    pub from_state: EventState,
    pub to_state: EventState,
    /// Change-of-state event values.
    pub new_state: DataValue,
    pub status_flags: StatusFlags,
}

/// What an object reports about itself for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    /// Present-value matches an alarm value.
    pub offnormal: bool,
    /// The object has a fault condition (only objects that derive FAULT).
    pub fault: bool,
    pub value: DataValue,
    pub status_flags: StatusFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicReporting {
    event_state: EventState,
    time_delay: u32,
    remaining_time_delay: u32,
    pub notification_class: u32,
    pub event_enable: EventTransitionBits,
    notify_type: NotifyType,
    pub event_detection_enable: bool,
    acked_transitions: EventTransitionBits,
    ack_time_stamps: [DateTime; 3],
    event_time_stamps: [DateTime; 3],
    pending_ack: Option<EventState>,
}

impl Default for IntrinsicReporting {
    fn default() -> Self {
        Self {
            event_state: EventState::Normal,
            time_delay: 0,
            remaining_time_delay: 0,
            notification_class: 0,
            event_enable: EventTransitionBits::NONE,
            notify_type: NotifyType::Alarm,
            event_detection_enable: true,
            acked_transitions: EventTransitionBits::ALL,
            ack_time_stamps: [DateTime::unspecified(); 3],
            event_time_stamps: [DateTime::unspecified(); 3],
            pending_ack: None,
        }
    }
}

impl IntrinsicReporting {
    pub fn new(notification_class: u32, time_delay: u32, event_enable: EventTransitionBits) -> Self {
        Self {
            notification_class,
            time_delay,
            remaining_time_delay: time_delay,
            event_enable,
            ..Self::default()
        }
    }

    /// Reads `nc`, `time_delay` and the `event` enable mask.
    pub fn from_config(section: &ConfigSection<'_>) -> Result<Self, ConfigError> {
        let mask: u8 = section.parse_or("event", 0)?;
        Ok(Self::new(
            section.parse_or("nc", 0)?,
            section.parse_or("time_delay", 0)?,
            EventTransitionBits::from_mask(mask),
        ))
    }

    pub fn event_state(&self) -> EventState {
        self.event_state
    }

    pub fn time_delay(&self) -> u32 {
        self.time_delay
    }

    pub fn set_time_delay(&mut self, time_delay: u32) {
        self.time_delay = time_delay;
        self.remaining_time_delay = time_delay;
    }

    pub fn remaining_time_delay(&self) -> u32 {
        self.remaining_time_delay
    }

    pub fn notify_type(&self) -> NotifyType {
        self.notify_type
    }

    pub fn acked_transitions(&self) -> EventTransitionBits {
        self.acked_transitions
    }

    pub fn event_time_stamps(&self) -> &[DateTime; 3] {
        &self.event_time_stamps
    }

    pub fn has_unacked_transitions(&self) -> bool {
        self.acked_transitions != EventTransitionBits::ALL
    }

    pub fn read_property(
        &self,
        property: PropertyId,
        array_index: Option<u32>,
    ) -> Result<DataValue, PropertyError> {
        Ok(match property {
            PropertyId::TimeDelay => DataValue::Unsigned(self.time_delay),
            PropertyId::NotificationClass => DataValue::Unsigned(self.notification_class),
            PropertyId::EventEnable => self.event_enable.to_bit_string().into(),
            PropertyId::AckedTransitions => self.acked_transitions.to_bit_string().into(),
            PropertyId::NotifyType => DataValue::Enumerated(self.notify_type.to_u32()),
            PropertyId::EventDetectionEnable => DataValue::Boolean(self.event_detection_enable),
            PropertyId::EventTimeStamps => {
                return read_array(array_index, self.event_time_stamps.len(), |i| {
                    DataValue::TimeStamp(TimeStamp::DateTime(self.event_time_stamps[i]))
                })
            }
            _ => return Err(PropertyError::UnknownProperty(property)),
        })
    }

    /// Applies a write to one of the reporting properties and names the
    /// option to persist, if any.
    pub fn write_property(
        &mut self,
        property: PropertyId,
        value: &DataValue,
    ) -> Result<Option<ConfigChange>, PropertyError> {
        match property {
            PropertyId::TimeDelay => {
                self.set_time_delay(expect_unsigned(value)?);
                Ok(Some(ConfigChange::single("time_delay", self.time_delay)))
            }
            PropertyId::NotificationClass => {
                self.notification_class = expect_unsigned(value)?;
                Ok(Some(ConfigChange::single("nc", self.notification_class)))
            }
            PropertyId::EventEnable => {
                let bits = expect_bit_string(value)?;
                if bits.len() != 3 {
                    return Err(PropertyError::ValueOutOfRange);
                }
                self.event_enable = EventTransitionBits::from_bit_string(bits);
                Ok(Some(ConfigChange::single("event", self.event_enable.to_mask())))
            }
            PropertyId::NotifyType => {
                self.notify_type = match NotifyType::from_u32(expect_enumerated(value)?) {
                    Some(kind @ (NotifyType::Alarm | NotifyType::Event)) => kind,
                    _ => return Err(PropertyError::ValueOutOfRange),
                };
                Ok(None)
            }
            PropertyId::EventDetectionEnable => {
                self.event_detection_enable = expect_boolean(value)?;
                Ok(None)
            }
            PropertyId::AckedTransitions | PropertyId::EventTimeStamps => {
                Err(PropertyError::WriteAccessDenied)
            }
            _ => Err(PropertyError::UnknownProperty(property)),
        }
    }

    /// Runs one reporting tick. A queued acknowledgment is reported first
    /// and replaces transition evaluation for this tick.
    pub fn evaluate(
        &mut self,
        object_id: ObjectId,
        input: EventInput,
        now: DateTime,
        reporter: &mut dyn NotificationClassReporter,
    ) -> Option<EventNotification> {
        if let Some(acked) = self.pending_ack.take() {
            let mut notification = self.notification(object_id, &input, now, acked, acked);
            notification.notify_type = NotifyType::AckNotification;
            notification.message_text = None;
            reporter.report(&mut notification);
            return Some(notification);
        }
        if !self.event_detection_enable {
            return None;
        }

        let from = self.event_state;
        let to = if input.fault {
            EventState::Fault
        } else if from == EventState::Fault {
            EventState::Normal
        } else if from == EventState::Normal && input.offnormal && self.event_enable.to_offnormal {
            self.count_down(EventState::Offnormal)
        } else if from != EventState::Normal && !input.offnormal && self.event_enable.to_normal {
            self.count_down(EventState::Normal)
        } else {
            self.remaining_time_delay = self.time_delay;
            from
        };
        if to == from {
            return None;
        }

        self.event_state = to;
        self.remaining_time_delay = self.time_delay;
        let transition = to.transition();
        self.event_time_stamps[transition.index()] = now;

        let mut notification = self.notification(object_id, &input, now, from, to);
        reporter.report(&mut notification);
        if notification.ack_required {
            self.acked_transitions.set(transition, false);
            self.ack_time_stamps[transition.index()] = now;
        }
        log::debug!("{object_id} event state {} -> {}", from.name(), to.name());
        Some(notification)
    }

    fn count_down(&mut self, target: EventState) -> EventState {
        if self.remaining_time_delay == 0 {
            target
        } else {
            self.remaining_time_delay -= 1;
            self.event_state
        }
    }

    fn notification(
        &self,
        object_id: ObjectId,
        input: &EventInput,
        now: DateTime,
        from: EventState,
        to: EventState,
    ) -> EventNotification {
        let message = match to {
            EventState::Normal => "Back to normal state",
            EventState::Fault => "Goes to fault",
            _ => "Goes to alarm",
        };
        EventNotification {
            initiating_device: None,
            event_object: object_id,
            time_stamp: TimeStamp::DateTime(now),
            notification_class: self.notification_class,
            priority: 0,
            event_type: EventType::ChangeOfState,
            message_text: Some(message.to_string()),
            notify_type: self.notify_type,
            ack_required: false,
            from_state: from,
            to_state: to,
            new_state: input.value.clone(),
            status_flags: input.status_flags,
        }
    }

    /// AcknowledgeAlarm for the transition into `event_state_acked`.
    ///
    /// The request's time stamp must be a date-time strictly later than the
    /// recorded transition time. Acknowledging an already acknowledged
    /// transition succeeds only for the current event state.
    pub fn acknowledge(
        &mut self,
        event_state_acked: EventState,
        time_stamp: &TimeStamp,
    ) -> Result<(), PropertyError> {
        let transition = match event_state_acked {
            EventState::Offnormal | EventState::HighLimit | EventState::LowLimit => {
                Transition::ToOffnormal
            }
            EventState::Fault => Transition::ToFault,
            EventState::Normal => Transition::ToNormal,
            _ => return Err(PropertyError::InvalidEventState),
        };

        if !self.acked_transitions.get(transition) {
            let TimeStamp::DateTime(requested) = time_stamp else {
                return Err(PropertyError::InvalidTimeStamp);
            };
            if self.ack_time_stamps[transition.index()] >= *requested {
                return Err(PropertyError::InvalidTimeStamp);
            }
            self.acked_transitions.set(transition, true);
        } else if event_state_acked != self.event_state {
            return Err(PropertyError::InvalidEventState);
        }
        self.pending_ack = Some(event_state_acked);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EventInput, EventNotification, IntrinsicReporting};
    use crate::observer::NotificationClassReporter;
    use crate::PropertyError;
    use bacnode_core::types::{
        DataValue, Date, DateTime, EventState, EventTransitionBits, NotifyType, ObjectId,
        ObjectType, StatusFlags, Time, TimeStamp,
    };

    #[derive(Default)]
    struct Collect {
        ack_required: bool,
        seen: Vec<EventNotification>,
    }

    impl NotificationClassReporter for Collect {
        fn report(&mut self, notification: &mut EventNotification) {
            notification.priority = 100;
            notification.ack_required = self.ack_required;
            self.seen.push(notification.clone());
        }
    }

    fn input(offnormal: bool) -> EventInput {
        EventInput {
            offnormal,
            fault: false,
            value: DataValue::Enumerated(offnormal as u32),
            status_flags: StatusFlags::default(),
        }
    }

    fn at(minute: u8) -> DateTime {
        DateTime::new(Date::new(2024, 5, 6), Time::hm(10, minute))
    }

    const BI: ObjectId = ObjectId::new(ObjectType::BinaryInput, 1);

    #[test]
    fn time_delay_counts_down_before_alarm() {
        let mut reporting = IntrinsicReporting::new(5, 2, EventTransitionBits::ALL);
        let mut nc = Collect::default();

        assert!(reporting.evaluate(BI, input(true), at(0), &mut nc).is_none());
        assert_eq!(reporting.remaining_time_delay(), 1);
        assert!(reporting.evaluate(BI, input(true), at(1), &mut nc).is_none());
        let event = reporting
            .evaluate(BI, input(true), at(2), &mut nc)
            .expect("transition");
        assert_eq!(event.to_state, EventState::Offnormal);
        assert_eq!(event.message_text.as_deref(), Some("Goes to alarm"));
        assert_eq!(event.priority, 100);
        assert_eq!(reporting.remaining_time_delay(), 2);
    }

    #[test]
    fn condition_loss_resets_the_delay() {
        let mut reporting = IntrinsicReporting::new(5, 3, EventTransitionBits::ALL);
        let mut nc = Collect::default();
        reporting.evaluate(BI, input(true), at(0), &mut nc);
        assert_eq!(reporting.remaining_time_delay(), 2);
        reporting.evaluate(BI, input(false), at(1), &mut nc);
        assert_eq!(reporting.remaining_time_delay(), 3);
        assert_eq!(reporting.event_state(), EventState::Normal);
    }

    #[test]
    fn disabled_transition_never_fires() {
        let mut reporting = IntrinsicReporting::new(5, 0, EventTransitionBits::from_mask(0b110));
        let mut nc = Collect::default();
        assert!(reporting.evaluate(BI, input(true), at(0), &mut nc).is_none());
        assert!(nc.seen.is_empty());
    }

    #[test]
    fn fault_is_immediate_in_both_directions() {
        let mut reporting = IntrinsicReporting::new(5, 10, EventTransitionBits::ALL);
        let mut nc = Collect::default();
        let mut faulted = input(false);
        faulted.fault = true;

        let event = reporting
            .evaluate(BI, faulted, at(0), &mut nc)
            .expect("fault");
        assert_eq!(event.to_state, EventState::Fault);
        let event = reporting
            .evaluate(BI, input(false), at(1), &mut nc)
            .expect("normal");
        assert_eq!(
            (event.from_state, event.to_state),
            (EventState::Fault, EventState::Normal)
        );
    }

    #[test]
    fn acknowledgment_round_trip() {
        let mut reporting = IntrinsicReporting::new(5, 0, EventTransitionBits::ALL);
        let mut nc = Collect {
            ack_required: true,
            ..Collect::default()
        };
        reporting.evaluate(BI, input(true), at(0), &mut nc);
        assert!(reporting.has_unacked_transitions());
        assert!(!reporting.acked_transitions().to_offnormal);

        assert_eq!(
            reporting.acknowledge(EventState::Offnormal, &TimeStamp::SequenceNumber(1)),
            Err(PropertyError::InvalidTimeStamp)
        );
        assert_eq!(
            reporting.acknowledge(EventState::Offnormal, &TimeStamp::DateTime(at(0))),
            Err(PropertyError::InvalidTimeStamp)
        );
        reporting
            .acknowledge(EventState::Offnormal, &TimeStamp::DateTime(at(1)))
            .unwrap();
        assert!(!reporting.has_unacked_transitions());

        let ack = reporting
            .evaluate(BI, input(true), at(2), &mut nc)
            .expect("ack notification");
        assert_eq!(ack.notify_type, NotifyType::AckNotification);

        assert_eq!(
            reporting.acknowledge(EventState::Normal, &TimeStamp::DateTime(at(3))),
            Err(PropertyError::InvalidEventState)
        );
        assert_eq!(
            reporting.acknowledge(EventState::LifeSafetyAlarm, &TimeStamp::DateTime(at(3))),
            Err(PropertyError::InvalidEventState)
        );
    }
}
