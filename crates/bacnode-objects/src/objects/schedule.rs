//! Schedule object: weekly time/value table evaluated against the clock,
//! with the resulting present-value written to a list of object property
//! references.
//!
//! Only BOOLEAN, REAL and ENUMERATED schedules are supported; the
//! schedule-default fixes which one an object uses. Exception schedules are
//! not evaluated.

use super::{BacnetObject, ObjectHeader, WriteOutcome};
use crate::cov::CovTracker;
use crate::persist::{ConfigChange, ConfigSection};
use crate::priority::{BACNET_MAX_PRIORITY, BACNET_MIN_ON_OFF_PRIORITY, BACNET_MIN_PRIORITY};
use crate::property::{expect_unsigned, read_array, PropertyLists, WritePropertyData};
use crate::{ConfigError, PropertyError};
use bacnode_core::encoding::reader::Reader;
use bacnode_core::types::date_time::WILDCARD;
use bacnode_core::types::{
    DataValue, Date, DateRange, DateTime, DeviceObjectPropertyReference, ObjectId, ObjectType,
    PropertyId, StatusFlags, Time, TimeValue,
};
use bacnode_core::value_codec::{
    decode_daily_schedule, decode_date_range, decode_object_property_reference, encode_to_vec,
};
use std::cmp::Ordering;

/// Property references a schedule can hold.
pub const MAX_REFERENCES: usize = 4;

const DAYS: usize = 7;

const DAY_OPTIONS: [&str; DAYS] = ["day_1", "day_2", "day_3", "day_4", "day_5", "day_6", "day_7"];

const SC_PROPERTIES: PropertyLists = PropertyLists {
    required: &[
        PropertyId::ObjectIdentifier,
        PropertyId::ObjectName,
        PropertyId::ObjectType,
        PropertyId::PresentValue,
        PropertyId::EffectivePeriod,
        PropertyId::ScheduleDefault,
        PropertyId::ListOfObjectPropertyReferences,
        PropertyId::PriorityForWriting,
        PropertyId::StatusFlags,
        PropertyId::Reliability,
        PropertyId::OutOfService,
    ],
    optional: &[PropertyId::Description, PropertyId::WeeklySchedule],
    proprietary: &[],
};

/// A write the schedule wants performed after its present-value changed.
/// `device_id: None` addresses the local device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWrite {
    pub device_id: Option<ObjectId>,
    pub request: WritePropertyData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    header: ObjectHeader,
    effective_period: DateRange,
    weekly_schedule: [Vec<TimeValue>; DAYS],
    schedule_default: DataValue,
    present_value: DataValue,
    references: Vec<DeviceObjectPropertyReference>,
    priority_for_writing: u8,
    cov: CovTracker<DataValue>,
}

fn is_supported_default(value: &DataValue) -> bool {
    matches!(
        value,
        DataValue::Boolean(_) | DataValue::Real(_) | DataValue::Enumerated(_)
    )
}

/// Equality used to decide whether the present-value changed.
fn same_value(a: &DataValue, b: &DataValue) -> bool {
    match (a, b) {
        (DataValue::Real(x), DataValue::Real(y)) => (x - y).abs() < f32::EPSILON,
        _ => a == b,
    }
}

fn decode_all<T>(
    request: &WritePropertyData,
    decode: impl Fn(&mut Reader<'_>) -> Result<T, bacnode_core::DecodeError>,
) -> Result<Vec<T>, PropertyError> {
    let mut r = request.reader();
    let mut items = Vec::new();
    while !r.is_empty() {
        items.push(decode(&mut r)?);
    }
    Ok(items)
}

impl Schedule {
    pub fn effective_period(&self) -> DateRange {
        self.effective_period
    }

    pub fn set_effective_period(&mut self, period: DateRange) {
        self.effective_period = period;
    }

    pub fn schedule_default(&self) -> &DataValue {
        &self.schedule_default
    }

    /// Sets the default value, which also fixes the schedule's value type.
    pub fn set_schedule_default(&mut self, value: DataValue) -> Result<(), PropertyError> {
        if !is_supported_default(&value) {
            return Err(PropertyError::InvalidDataType);
        }
        let retyped = value.tag() != self.schedule_default.tag();
        self.schedule_default = value;
        if retyped {
            self.present_value = self.schedule_default.clone();
            self.cov.detect(&self.present_value);
        }
        Ok(())
    }

    pub fn present_value(&self) -> &DataValue {
        &self.present_value
    }

    /// Entries for one day, Monday first.
    pub fn day(&self, index: usize) -> Option<&[TimeValue]> {
        self.weekly_schedule.get(index).map(Vec::as_slice)
    }

    pub fn set_day(&mut self, index: usize, entries: Vec<TimeValue>) -> Result<(), PropertyError> {
        if let Some(bad) = entries.iter().find(|e| !self.accepts(&e.value)) {
            log::debug!("rejecting schedule entry {:?}", bad.value);
            return Err(PropertyError::InvalidDataType);
        }
        let day = self
            .weekly_schedule
            .get_mut(index)
            .ok_or(PropertyError::InvalidArrayIndex)?;
        *day = entries;
        Ok(())
    }

    pub fn references(&self) -> &[DeviceObjectPropertyReference] {
        &self.references
    }

    pub fn set_references(
        &mut self,
        references: Vec<DeviceObjectPropertyReference>,
    ) -> Result<(), PropertyError> {
        if references.len() > MAX_REFERENCES {
            return Err(PropertyError::NoSpaceToWriteProperty);
        }
        self.references = references;
        Ok(())
    }

    pub fn priority_for_writing(&self) -> u8 {
        self.priority_for_writing
    }

    /// Priority 6 is refused: every write-back at it would be denied.
    pub fn set_priority_for_writing(&mut self, priority: u8) -> Result<(), PropertyError> {
        if priority == BACNET_MIN_ON_OFF_PRIORITY
            || !(BACNET_MIN_PRIORITY..=BACNET_MAX_PRIORITY).contains(&priority)
        {
            return Err(PropertyError::ValueOutOfRange);
        }
        self.priority_for_writing = priority;
        Ok(())
    }

    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }

    /// Schedule values must be NULL or carry the default's tag.
    fn accepts(&self, value: &DataValue) -> bool {
        value.is_null() || value.tag() == self.schedule_default.tag()
    }

    /// Value the weekly table selects for `now`: the entry with the latest
    /// time not after `now`, whatever its position in the day's list. NULL,
    /// an empty day and times before the first entry yield the default.
    pub fn scheduled_value(&self, now: &DateTime) -> DataValue {
        let Some(weekday) = now.date.day_of_week() else {
            return self.schedule_default.clone();
        };
        let mut selected: Option<&TimeValue> = None;
        for entry in &self.weekly_schedule[weekday.index()] {
            if !self.accepts(&entry.value) || entry.time.wildcard_cmp(&now.time) == Ordering::Greater
            {
                continue;
            }
            let later = selected.map_or(true, |best| {
                entry.time.wildcard_cmp(&best.time) != Ordering::Less
            });
            if later {
                selected = Some(entry);
            }
        }
        match selected {
            Some(entry) if !entry.value.is_null() => entry.value.clone(),
            _ => self.schedule_default.clone(),
        }
    }

    /// Evaluates the schedule at `now`. Returns the new present-value when it
    /// changed; out-of-service objects and dates outside the effective period
    /// are not evaluated.
    pub fn evaluate(&mut self, now: &DateTime) -> Option<DataValue> {
        if self.header.out_of_service || !self.effective_period.contains(&now.date) {
            return None;
        }
        let value = self.scheduled_value(now);
        if same_value(&value, &self.present_value) {
            return None;
        }
        log::debug!(
            "schedule {} present-value {:?} -> {:?}",
            self.header.instance,
            self.present_value,
            value
        );
        self.present_value = value;
        self.cov.detect(&self.present_value);
        Some(self.present_value.clone())
    }

    /// One write of the present-value per configured reference.
    pub fn write_requests(&self) -> Result<Vec<ScheduleWrite>, PropertyError> {
        let value = encode_to_vec(&self.present_value)?;
        Ok(self
            .references
            .iter()
            .map(|reference| ScheduleWrite {
                device_id: reference.device_id,
                request: WritePropertyData {
                    object_id: reference.object_id,
                    property: reference.property,
                    array_index: reference.array_index,
                    priority: Some(self.priority_for_writing),
                    value: value.clone(),
                },
            })
            .collect())
    }

    fn weekly_value(&self) -> DataValue {
        DataValue::List(
            self.weekly_schedule
                .iter()
                .map(|day| DataValue::DailySchedule(day.clone()))
                .collect(),
        )
    }

    fn default_changes(&self) -> Vec<ConfigChange> {
        let (kind, value) = match &self.schedule_default {
            DataValue::Real(v) => ("real", v.to_string()),
            DataValue::Enumerated(v) => ("enum", v.to_string()),
            other => ("bool", format_value(other)),
        };
        vec![
            ConfigChange::single("type", kind),
            ConfigChange::single("default", value),
        ]
    }

    fn day_change(&self, index: usize) -> ConfigChange {
        ConfigChange::list(
            DAY_OPTIONS[index],
            self.weekly_schedule[index]
                .iter()
                .map(|e| format!("{}={}", format_time(&e.time), format_value(&e.value)))
                .collect(),
        )
    }

    fn references_change(&self) -> ConfigChange {
        ConfigChange::list(
            "ref",
            self.references.iter().map(format_reference).collect(),
        )
    }

    fn write_weekly_schedule(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<DataValue>, PropertyError> {
        let days = decode_all(request, decode_daily_schedule)?;
        match request.array_index {
            None => {
                if days.len() != DAYS {
                    return Err(PropertyError::ValueOutOfRange);
                }
                if days.iter().flatten().any(|e| !self.accepts(&e.value)) {
                    return Err(PropertyError::InvalidDataType);
                }
                for (index, entries) in days.into_iter().enumerate() {
                    self.set_day(index, entries)?;
                }
                Ok(WriteOutcome::persist_all(
                    (0..DAYS).map(|i| self.day_change(i)).collect(),
                ))
            }
            Some(0) => Err(PropertyError::WriteAccessDenied),
            Some(index) => {
                let index = index as usize - 1;
                if index >= DAYS {
                    return Err(PropertyError::InvalidArrayIndex);
                }
                let [entries] = <[Vec<TimeValue>; 1]>::try_from(days)
                    .map_err(|_| PropertyError::ValueOutOfRange)?;
                self.set_day(index, entries)?;
                Ok(WriteOutcome::persist(self.day_change(index)))
            }
        }
    }
}

impl BacnetObject for Schedule {
    const OBJECT_TYPE: ObjectType = ObjectType::Schedule;
    const PACKAGE: &'static str = "bacnet_sc";
    const PROPERTIES: PropertyLists = SC_PROPERTIES;
    type Value = DataValue;

    fn new(instance: u32) -> Self {
        Self {
            header: ObjectHeader::new(ObjectType::Schedule, instance),
            effective_period: DateRange::always(),
            weekly_schedule: Default::default(),
            schedule_default: DataValue::Boolean(false),
            present_value: DataValue::Boolean(false),
            references: Vec::new(),
            priority_for_writing: BACNET_MAX_PRIORITY,
            cov: CovTracker::new(DataValue::Boolean(false)),
        }
    }

    fn from_config(instance: u32, section: &ConfigSection<'_>) -> Result<Self, ConfigError> {
        let mut object = Self::new(instance);
        object.header = ObjectHeader::from_config(ObjectType::Schedule, instance, section)?;

        let kind = section.string_or("type", "bool");
        let raw_default = section.string_or("default", "0");
        object.schedule_default = parse_value(&kind, &raw_default)
            .filter(|v| !v.is_null())
            .ok_or_else(|| section.invalid("default", &raw_default))?;

        for (option, date) in [
            ("start_date", &mut object.effective_period.start),
            ("end_date", &mut object.effective_period.end),
        ] {
            if let Some(raw) = section.string(option) {
                *date = parse_date(&raw).ok_or_else(|| section.invalid(option, &raw))?;
            }
        }

        let priority = section.parse_or("priority", BACNET_MAX_PRIORITY)?;
        object
            .set_priority_for_writing(priority)
            .map_err(|_| section.invalid("priority", &priority.to_string()))?;

        for (index, option) in DAY_OPTIONS.iter().enumerate() {
            let mut entries = Vec::new();
            for raw in section.list(option) {
                let entry = raw
                    .split_once('=')
                    .and_then(|(time, value)| {
                        Some(TimeValue::new(parse_time(time)?, parse_value(&kind, value)?))
                    })
                    .ok_or_else(|| section.invalid(option, &raw))?;
                entries.push(entry);
            }
            object.weekly_schedule[index] = entries;
        }

        let mut references = Vec::new();
        for raw in section.list("ref") {
            references.push(parse_reference(&raw).ok_or_else(|| section.invalid("ref", &raw))?);
        }
        if references.len() > MAX_REFERENCES {
            log::warn!(
                "schedule {instance}: {} references configured, keeping the first {MAX_REFERENCES}",
                references.len()
            );
            references.truncate(MAX_REFERENCES);
        }
        object.references = references;

        object.present_value = object.schedule_default.clone();
        object.cov = CovTracker::new(object.present_value.clone());
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
            overridden: false,
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
            PropertyId::PresentValue => self.present_value.clone(),
            PropertyId::EffectivePeriod => DataValue::DateRange(self.effective_period),
            PropertyId::WeeklySchedule => {
                return read_array(array_index, DAYS, |i| {
                    DataValue::DailySchedule(self.weekly_schedule[i].clone())
                })
            }
            PropertyId::ScheduleDefault => self.schedule_default.clone(),
            PropertyId::ListOfObjectPropertyReferences => DataValue::List(
                self.references
                    .iter()
                    .copied()
                    .map(DataValue::ObjectPropertyReference)
                    .collect(),
            ),
            PropertyId::PriorityForWriting => DataValue::Unsigned(self.priority_for_writing as u32),
            _ => return Err(PropertyError::UnknownProperty(property)),
        })
    }

    fn write_property(
        &mut self,
        request: &WritePropertyData,
    ) -> Result<WriteOutcome<DataValue>, PropertyError> {
        match request.property {
            PropertyId::WeeklySchedule => return self.write_weekly_schedule(request),
            PropertyId::EffectivePeriod => {
                let [period] = <[DateRange; 1]>::try_from(decode_all(request, decode_date_range)?)
                    .map_err(|_| PropertyError::ValueOutOfRange)?;
                self.effective_period = period;
                return Ok(WriteOutcome::persist_all(vec![
                    ConfigChange::single("start_date", format_date(&period.start)),
                    ConfigChange::single("end_date", format_date(&period.end)),
                ]));
            }
            PropertyId::ListOfObjectPropertyReferences => {
                let references = decode_all(request, decode_object_property_reference)?;
                self.set_references(references)?;
                return Ok(WriteOutcome::persist(self.references_change()));
            }
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
                if !self.header.out_of_service {
                    return Err(PropertyError::WriteAccessDenied);
                }
                if value.tag() != self.schedule_default.tag() {
                    return Err(PropertyError::InvalidDataType);
                }
                self.present_value = value;
                self.cov.detect(&self.present_value);
                Ok(WriteOutcome::none())
            }
            PropertyId::ScheduleDefault => {
                self.set_schedule_default(value)?;
                Ok(WriteOutcome::persist_all(self.default_changes()))
            }
            PropertyId::PriorityForWriting => {
                let priority =
                    u8::try_from(expect_unsigned(&value)?).map_err(|_| PropertyError::ValueOutOfRange)?;
                self.set_priority_for_writing(priority)?;
                Ok(WriteOutcome::persist(ConfigChange::single(
                    "priority",
                    priority,
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

/// `2024-06-01`; any field may be `*`, and `*` alone is the wildcard date.
fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw == "*" {
        return Some(Date::wildcard());
    }
    let mut parts = raw.split('-');
    let mut field = |max: u16| -> Option<Option<u16>> {
        match parts.next()?.trim() {
            "*" => Some(None),
            n => n.parse().ok().filter(|v| *v <= max).map(Some),
        }
    };
    let (year, month, day) = (field(2154)?, field(14)?, field(32)?);
    if parts.next().is_some() {
        return None;
    }
    Some(match (year, month, day) {
        (Some(y), Some(m), Some(d)) if y >= 1900 => Date::new(y, m as u8, d as u8),
        (y, m, d) => Date {
            year_since_1900: match y {
                Some(y) => u8::try_from(y.checked_sub(1900)?).ok()?,
                None => WILDCARD,
            },
            month: m.map_or(WILDCARD, |m| m as u8),
            day: d.map_or(WILDCARD, |d| d as u8),
            weekday: WILDCARD,
        },
    })
}

fn format_date(date: &Date) -> String {
    if date.is_wildcard() {
        return "*".to_string();
    }
    let field = |v: u8, width: usize| {
        if v == WILDCARD {
            "*".to_string()
        } else {
            format!("{v:0width$}")
        }
    };
    let year = date.year().map_or("*".to_string(), |y| y.to_string());
    format!("{year}-{}-{}", field(date.month, 2), field(date.day, 2))
}

/// `HH:MM` or `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<Time> {
    let mut parts = raw.trim().split(':').map(|p| p.parse::<u8>().ok());
    let hour = parts.next()??;
    let minute = parts.next()??;
    let second = parts.next().unwrap_or(Some(0))?;
    if parts.next().is_some() || hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(Time::new(hour, minute, second, 0))
}

fn format_time(time: &Time) -> String {
    if time.second == 0 {
        format!("{:02}:{:02}", time.hour, time.minute)
    } else {
        format!("{:02}:{:02}:{:02}", time.hour, time.minute, time.second)
    }
}

/// Parses a value of schedule type `kind` (`bool`, `real` or `enum`);
/// `null` is accepted for every type.
fn parse_value(kind: &str, raw: &str) -> Option<DataValue> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("null") {
        return Some(DataValue::Null);
    }
    match kind {
        "bool" => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "active" => Some(DataValue::Boolean(true)),
            "0" | "false" | "off" | "inactive" => Some(DataValue::Boolean(false)),
            _ => None,
        },
        "real" => raw.parse().ok().map(DataValue::Real),
        "enum" => raw.parse().ok().map(DataValue::Enumerated),
        _ => None,
    }
}

fn format_value(value: &DataValue) -> String {
    match value {
        DataValue::Boolean(v) => u8::from(*v).to_string(),
        DataValue::Real(v) => v.to_string(),
        DataValue::Enumerated(v) => v.to_string(),
        _ => "null".to_string(),
    }
}

/// `type,instance,property[,index[,device]]` with numeric identifiers; an
/// empty index field means no index.
fn parse_reference(raw: &str) -> Option<DeviceObjectPropertyReference> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    if !(3..=5).contains(&fields.len()) {
        return None;
    }
    let object_type = ObjectType::from_u16(fields[0].parse().ok()?);
    let object_id = ObjectId::new(object_type, fields[1].parse().ok()?);
    let property = PropertyId::from_u32(fields[2].parse().ok()?);
    let array_index = match fields.get(3) {
        None | Some(&"") => None,
        Some(index) => Some(index.parse().ok()?),
    };
    let device_id = match fields.get(4) {
        None => None,
        Some(device) => Some(ObjectId::new(ObjectType::Device, device.parse().ok()?)),
    };
    Some(DeviceObjectPropertyReference {
        object_id,
        property,
        array_index,
        device_id,
    })
}

fn format_reference(reference: &DeviceObjectPropertyReference) -> String {
    let mut out = format!(
        "{},{},{}",
        reference.object_id.object_type().to_u16(),
        reference.object_id.instance(),
        reference.property.to_u32()
    );
    if reference.array_index.is_some() || reference.device_id.is_some() {
        out.push(',');
        if let Some(index) = reference.array_index {
            out.push_str(&index.to_string());
        }
    }
    if let Some(device) = reference.device_id {
        out.push_str(&format!(",{}", device.instance()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        format_date, format_reference, parse_date, parse_reference, parse_time, Schedule,
        MAX_REFERENCES,
    };
    use crate::objects::{read_object_property, write_object_property, BacnetObject};
    use crate::persist::{ConfigSection, ConfigStore, MemoryConfigStore};
    use crate::property::WritePropertyData;
    use crate::PropertyError;
    use bacnode_core::types::{
        DataValue, Date, DateRange, DateTime, DeviceObjectPropertyReference, ObjectId,
        ObjectType, PropertyId, Time, TimeValue,
    };

    // 2024-01-01 is a Monday.
    fn monday(hour: u8, minute: u8) -> DateTime {
        DateTime::new(Date::new(2024, 1, 1), Time::hm(hour, minute))
    }

    fn occupancy() -> Schedule {
        let mut sc = Schedule::new(1);
        sc.set_day(
            0,
            vec![
                TimeValue::new(Time::hm(18, 0), DataValue::Boolean(false)),
                TimeValue::new(Time::hm(8, 0), DataValue::Boolean(true)),
            ],
        )
        .unwrap();
        sc.set_schedule_default(DataValue::Boolean(false)).unwrap();
        sc
    }

    #[test]
    fn latest_entry_wins_regardless_of_order() {
        let sc = occupancy();
        assert_eq!(sc.scheduled_value(&monday(7, 0)), DataValue::Boolean(false));
        assert_eq!(sc.scheduled_value(&monday(9, 0)), DataValue::Boolean(true));
        assert_eq!(sc.scheduled_value(&monday(19, 0)), DataValue::Boolean(false));
    }

    #[test]
    fn null_entry_falls_back_to_default() {
        let mut sc = Schedule::new(1);
        sc.set_schedule_default(DataValue::Real(18.0)).unwrap();
        sc.set_day(
            0,
            vec![
                TimeValue::new(Time::hm(6, 0), DataValue::Real(21.0)),
                TimeValue::new(Time::hm(22, 0), DataValue::Null),
            ],
        )
        .unwrap();
        assert_eq!(sc.scheduled_value(&monday(12, 0)), DataValue::Real(21.0));
        assert_eq!(sc.scheduled_value(&monday(23, 0)), DataValue::Real(18.0));
    }

    #[test]
    fn evaluation_reports_only_changes() {
        let mut sc = occupancy();
        assert_eq!(sc.evaluate(&monday(7, 0)), None);
        assert_eq!(sc.evaluate(&monday(9, 0)), Some(DataValue::Boolean(true)));
        assert!(sc.cov_changed());
        assert_eq!(sc.evaluate(&monday(10, 0)), None);
    }

    #[test]
    fn effective_period_and_out_of_service_suspend_evaluation() {
        let mut sc = occupancy();
        sc.set_effective_period(DateRange {
            start: Date::new(2024, 6, 1),
            end: Date::new(2024, 8, 31),
        });
        assert_eq!(sc.evaluate(&monday(9, 0)), None);

        let mut sc = occupancy();
        let request =
            WritePropertyData::new(sc.object_id(), PropertyId::OutOfService, &true.into())
                .unwrap();
        write_object_property(&mut sc, &request).unwrap();
        assert_eq!(sc.evaluate(&monday(9, 0)), None);
    }

    #[test]
    fn present_value_is_writable_only_out_of_service() {
        let mut sc = occupancy();
        let request =
            WritePropertyData::new(sc.object_id(), PropertyId::PresentValue, &true.into())
                .unwrap();
        assert_eq!(
            write_object_property(&mut sc, &request),
            Err(PropertyError::WriteAccessDenied)
        );
        let oos = WritePropertyData::new(sc.object_id(), PropertyId::OutOfService, &true.into())
            .unwrap();
        sc.write_property(&oos).unwrap();
        write_object_property(&mut sc, &request).unwrap();
        assert_eq!(sc.present_value(), &DataValue::Boolean(true));

        let request =
            WritePropertyData::new(sc.object_id(), PropertyId::PresentValue, &DataValue::Real(1.0))
                .unwrap();
        assert_eq!(
            write_object_property(&mut sc, &request),
            Err(PropertyError::InvalidDataType)
        );
    }

    #[test]
    fn unsupported_defaults_and_entries_are_rejected() {
        let mut sc = Schedule::new(1);
        assert_eq!(
            sc.set_schedule_default(DataValue::Unsigned(3)),
            Err(PropertyError::InvalidDataType)
        );
        assert_eq!(
            sc.set_day(0, vec![TimeValue::new(Time::hm(1, 0), DataValue::Real(1.0))]),
            Err(PropertyError::InvalidDataType)
        );
    }

    #[test]
    fn reference_list_is_bounded() {
        let mut sc = Schedule::new(1);
        let reference = DeviceObjectPropertyReference::local(
            ObjectId::new(ObjectType::BinaryOutput, 1),
            PropertyId::PresentValue,
        );
        let refs = DataValue::List(vec![
            DataValue::ObjectPropertyReference(reference);
            MAX_REFERENCES + 1
        ]);
        let request =
            WritePropertyData::new(sc.object_id(), PropertyId::ListOfObjectPropertyReferences, &refs)
                .unwrap();
        assert_eq!(
            write_object_property(&mut sc, &request),
            Err(PropertyError::NoSpaceToWriteProperty)
        );
    }

    #[test]
    fn write_requests_carry_priority_for_writing() {
        let mut sc = occupancy();
        sc.set_priority_for_writing(9).unwrap();
        sc.set_references(vec![DeviceObjectPropertyReference::local(
            ObjectId::new(ObjectType::BinaryOutput, 2),
            PropertyId::PresentValue,
        )])
        .unwrap();
        sc.evaluate(&monday(9, 0));
        let writes = sc.write_requests().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].device_id, None);
        assert_eq!(writes[0].request.priority, Some(9));
        assert_eq!(writes[0].request.decode_value(), Ok(DataValue::Boolean(true)));
    }

    #[test]
    fn priority_for_writing_refuses_the_on_off_slot() {
        let mut sc = occupancy();
        for priority in [0, 6, 17] {
            assert_eq!(
                sc.set_priority_for_writing(priority),
                Err(PropertyError::ValueOutOfRange)
            );
        }
        assert_eq!(sc.priority_for_writing(), 16);
        sc.set_priority_for_writing(5).unwrap();
        sc.set_priority_for_writing(7).unwrap();
        assert_eq!(sc.priority_for_writing(), 7);
    }

    #[test]
    fn weekly_schedule_reads_per_day() {
        let sc = occupancy();
        assert_eq!(
            read_object_property(&sc, PropertyId::WeeklySchedule, Some(0)),
            Ok(DataValue::Unsigned(7))
        );
        assert_eq!(
            read_object_property(&sc, PropertyId::WeeklySchedule, Some(2)),
            Ok(DataValue::DailySchedule(vec![]))
        );
        assert_eq!(
            read_object_property(&sc, PropertyId::WeeklySchedule, Some(8)),
            Err(PropertyError::InvalidArrayIndex)
        );
    }

    #[test]
    fn indexed_weekly_schedule_write() {
        let mut sc = occupancy();
        let tuesday = DataValue::DailySchedule(vec![TimeValue::new(
            Time::hm(7, 30),
            DataValue::Boolean(true),
        )]);
        let request =
            WritePropertyData::new(sc.object_id(), PropertyId::WeeklySchedule, &tuesday)
                .unwrap()
                .with_index(2);
        let outcome = write_object_property(&mut sc, &request).unwrap();
        assert_eq!(outcome.persist[0].option, "day_2");
        assert_eq!(sc.day(1).map(<[TimeValue]>::len), Some(1));
    }

    #[test]
    fn loads_from_config() {
        let mut store = MemoryConfigStore::new();
        store.set("bacnet_sc", "3", "type", "real").unwrap();
        store.set("bacnet_sc", "3", "default", "16.5").unwrap();
        store.set("bacnet_sc", "3", "priority", "12").unwrap();
        store.set("bacnet_sc", "3", "start_date", "2024-01-01").unwrap();
        store.set("bacnet_sc", "3", "end_date", "*").unwrap();
        store
            .set_list(
                "bacnet_sc",
                "3",
                "day_1",
                &["07:00=21".to_string(), "17:30=null".to_string()],
            )
            .unwrap();
        store
            .set_list("bacnet_sc", "3", "ref", &["1,4,85".to_string()])
            .unwrap();

        let section = ConfigSection::new(&store, "bacnet_sc", "3");
        let sc = Schedule::from_config(3, &section).unwrap();
        assert_eq!(sc.schedule_default(), &DataValue::Real(16.5));
        assert_eq!(sc.priority_for_writing(), 12);
        assert_eq!(sc.day(0).map(<[TimeValue]>::len), Some(2));
        assert_eq!(sc.references()[0].object_id, ObjectId::new(ObjectType::AnalogOutput, 4));
        assert_eq!(sc.present_value(), &DataValue::Real(16.5));
        assert!(!sc.effective_period().contains(&Date::new(2023, 12, 31)));

        store.set("bacnet_sc", "3", "type", "string").unwrap();
        let section = ConfigSection::new(&store, "bacnet_sc", "3");
        assert!(Schedule::from_config(3, &section).is_err());
    }

    #[test]
    fn config_text_formats() {
        assert_eq!(parse_time("08:15"), Some(Time::hm(8, 15)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(format_date(&Date::new(2024, 3, 9)), "2024-03-09");
        let any_march = parse_date("*-03-*").unwrap();
        assert_eq!(any_march.year(), None);
        assert_eq!(format_date(&any_march), "*-03-*");

        let remote = parse_reference("4,7,85,,1234").unwrap();
        assert_eq!(remote.array_index, None);
        assert_eq!(remote.device_id, Some(ObjectId::new(ObjectType::Device, 1234)));
        assert_eq!(format_reference(&remote), "4,7,85,,1234");
        assert_eq!(parse_reference("4,7"), None);
    }
}
