//! EPICS text and JSON renderings of property values.

use crate::objects::{read_object_property, BacnetObject};
use bacnode_core::types::{
    units, BinaryPv, BitString, Date, DataValue, DeviceObjectPropertyReference, EventState,
    NotifyType, ObjectId, ObjectType, Polarity, PropertyId, Reliability, Time,
    TimeStamp,
};
use serde_json::{json, Map, Value};
use std::fmt::Write as _;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Name of an enumerated value of `property`, when the property has a
/// known enumeration and the value is part of it.
fn enumeration_name(property: PropertyId, value: u32) -> Option<String> {
    let name = match property {
        PropertyId::ObjectType => {
            let object_type = u16::try_from(value).ok().map(ObjectType::from_u16)?;
            return Some(object_type.to_string());
        }
        PropertyId::PropertyList => return PropertyId::from_u32(value).name().map(str::to_string),
        PropertyId::Units => units::name(value)?,
        PropertyId::EventState => EventState::from_u32(value)?.name(),
        PropertyId::Reliability => Reliability::from_u32(value)?.name(),
        PropertyId::NotifyType => NotifyType::from_u32(value)?.name(),
        PropertyId::Polarity => Polarity::from_u32(value)?.name(),
        PropertyId::PresentValue
        | PropertyId::RelinquishDefault
        | PropertyId::AlarmValue
        | PropertyId::PriorityArray => BinaryPv::from_u32(value)?.name(),
        _ => return None,
    };
    Some(name.to_string())
}

fn epics_bits(bits: &BitString) -> String {
    let bits: Vec<&str> = bits
        .bits()
        .map(|bit| if bit { "TRUE" } else { "FALSE" })
        .collect();
    format!("{{{}}}", bits.join(","))
}

fn epics_date(date: &Date) -> String {
    let weekday = date.day_of_week().map_or("*", |w| w.name());
    let day = match date.day {
        1..=31 => date.day.to_string(),
        _ => "*".to_string(),
    };
    let month = match date.month {
        1..=12 => MONTHS[usize::from(date.month) - 1],
        _ => "*",
    };
    let year = date.year().map_or_else(|| "*".to_string(), |y| y.to_string());
    format!("{weekday}, {day}-{month}-{year}")
}

fn time_field(value: u8, limit: u8) -> String {
    if value < limit {
        format!("{value:02}")
    } else {
        "*".to_string()
    }
}

fn epics_time(time: &Time) -> String {
    format!(
        "{}:{}:{}.{}",
        time_field(time.hour, 24),
        time_field(time.minute, 60),
        time_field(time.second, 60),
        time_field(time.hundredths, 100),
    )
}

fn epics_reference(reference: &DeviceObjectPropertyReference) -> String {
    let mut out = format!("{}, {}", reference.object_id, reference.property);
    if let Some(index) = reference.array_index {
        let _ = write!(out, "[{index}]");
    }
    if let Some(device) = reference.device_id {
        let _ = write!(out, ", {device}");
    }
    format!("{{{out}}}")
}

fn epics_time_stamp(time_stamp: &TimeStamp) -> String {
    match time_stamp {
        TimeStamp::Time(time) => epics_time(time),
        TimeStamp::SequenceNumber(n) => n.to_string(),
        TimeStamp::DateTime(dt) => format!("{{({}),{}}}", epics_date(&dt.date), epics_time(&dt.time)),
    }
}

/// Renders a value the way an EPICS file lists it.
pub fn epics_value(property: PropertyId, value: &DataValue) -> String {
    match value {
        DataValue::Null => "NULL".to_string(),
        DataValue::Boolean(v) => String::from(if *v { "TRUE" } else { "FALSE" }),
        DataValue::Unsigned(v) => v.to_string(),
        DataValue::Signed(v) => v.to_string(),
        DataValue::Real(v) => format!("{v:.6}"),
        DataValue::Double(v) => format!("{v:.6}"),
        DataValue::OctetString(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
        DataValue::CharacterString(s) => format!("\"{s}\""),
        DataValue::BitString(bits) => epics_bits(bits),
        DataValue::Enumerated(v) => {
            enumeration_name(property, *v).unwrap_or_else(|| v.to_string())
        }
        DataValue::Date(date) => epics_date(date),
        DataValue::Time(time) => epics_time(time),
        DataValue::ObjectId(id) => id.to_string(),
        DataValue::DateRange(range) => {
            format!("({}; {})", epics_date(&range.start), epics_date(&range.end))
        }
        DataValue::TimeStamp(ts) => epics_time_stamp(ts),
        DataValue::DailySchedule(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|e| format!("({}, {})", epics_time(&e.time), epics_value(property, &e.value)))
                .collect();
            format!("({})", entries.join(", "))
        }
        DataValue::ObjectPropertyReference(reference) => epics_reference(reference),
        DataValue::List(items) => {
            let items: Vec<String> = items.iter().map(|v| epics_value(property, v)).collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

fn json_object_id(id: &ObjectId) -> Value {
    json!({ "type": id.object_type().to_string(), "instance": id.instance() })
}

fn json_date(date: &Date) -> Value {
    let field = |value: u8, range: std::ops::RangeInclusive<u8>| {
        if range.contains(&value) {
            json!(value)
        } else {
            Value::Null
        }
    };
    json!({
        "year": date.year(),
        "month": field(date.month, 1..=12),
        "day": field(date.day, 1..=31),
        "weekday": date.day_of_week().map(|w| w.name()),
    })
}

/// Renders a value as JSON. Enumerations with a known name become strings
/// and wildcard date fields become `null`.
pub fn json_value(property: PropertyId, value: &DataValue) -> Value {
    match value {
        DataValue::Null => Value::Null,
        DataValue::Boolean(v) => json!(v),
        DataValue::Unsigned(v) => json!(v),
        DataValue::Signed(v) => json!(v),
        DataValue::Real(v) => json!(f64::from(*v)),
        DataValue::Double(v) => json!(v),
        DataValue::OctetString(bytes) => json!(bytes),
        DataValue::CharacterString(s) => json!(s),
        DataValue::BitString(bits) => json!(bits.bits().collect::<Vec<_>>()),
        DataValue::Enumerated(v) => enumeration_name(property, *v).map_or_else(|| json!(v), Value::String),
        DataValue::Date(date) => json_date(date),
        DataValue::Time(time) => json!(epics_time(time)),
        DataValue::ObjectId(id) => json_object_id(id),
        DataValue::DateRange(range) => {
            json!({ "start": json_date(&range.start), "end": json_date(&range.end) })
        }
        DataValue::TimeStamp(TimeStamp::Time(time)) => json!({ "time": epics_time(time) }),
        DataValue::TimeStamp(TimeStamp::SequenceNumber(n)) => json!({ "sequence_number": n }),
        DataValue::TimeStamp(TimeStamp::DateTime(dt)) => {
            json!({ "date": json_date(&dt.date), "time": epics_time(&dt.time) })
        }
        DataValue::DailySchedule(entries) => Value::Array(
            entries
                .iter()
                .map(|e| json!({ "time": epics_time(&e.time), "value": json_value(property, &e.value) }))
                .collect(),
        ),
        DataValue::ObjectPropertyReference(reference) => json!({
            "object": json_object_id(&reference.object_id),
            "property": reference.property.to_string(),
            "array_index": reference.array_index,
            "device": reference.device_id.as_ref().map(json_object_id),
        }),
        DataValue::List(items) => {
            Value::Array(items.iter().map(|v| json_value(property, v)).collect())
        }
    }
}

/// Properties in listing order: identity first, then the type's lists.
fn listed_properties<O: BacnetObject>() -> impl Iterator<Item = PropertyId> {
    [
        PropertyId::ObjectIdentifier,
        PropertyId::ObjectName,
        PropertyId::ObjectType,
        PropertyId::PropertyList,
    ]
    .into_iter()
    .chain(O::PROPERTIES.property_list())
}

/// EPICS block listing every property of `object`. Unreadable properties
/// are written as `?`.
pub fn epics_object<O: BacnetObject>(object: &O) -> String {
    let mut out = String::from("{\n");
    for property in listed_properties::<O>() {
        let value = read_object_property(object, property, None)
            .map_or_else(|_| "?".to_string(), |v| epics_value(property, &v));
        let _ = writeln!(out, "    {property}: {value}");
    }
    out.push('}');
    out
}

/// JSON object keyed by property name. Unreadable properties are skipped.
pub fn json_object<O: BacnetObject>(object: &O) -> Value {
    let mut map = Map::new();
    for property in listed_properties::<O>() {
        match read_object_property(object, property, None) {
            Ok(value) => {
                map.insert(property.to_string(), json_value(property, &value));
            }
            Err(err) => log::debug!("{} {property}: {err}", object.object_id()),
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::{epics_object, epics_value, json_object, json_value};
    use crate::objects::{BacnetObject, BinaryInput};
    use bacnode_core::types::{
        BitString, DataValue, Date, DeviceObjectPropertyReference, ObjectId, ObjectType,
        PropertyId, Time, TimeValue,
    };
    use serde_json::json;

    #[test]
    fn epics_primitives() {
        let pv = PropertyId::PresentValue;
        assert_eq!(epics_value(pv, &DataValue::Boolean(true)), "TRUE");
        assert_eq!(epics_value(pv, &DataValue::Real(21.5)), "21.500000");
        assert_eq!(epics_value(pv, &"Lobby".into()), "\"Lobby\"");
        assert_eq!(epics_value(pv, &DataValue::Enumerated(1)), "active");
        assert_eq!(epics_value(PropertyId::Units, &DataValue::Enumerated(62)), "degrees-celsius");
        assert_eq!(
            epics_value(PropertyId::ObjectType, &DataValue::Enumerated(17)),
            "schedule"
        );
        assert_eq!(
            epics_value(
                PropertyId::StatusFlags,
                &BitString::from_bits(&[false, true, false, false]).into()
            ),
            "{FALSE,TRUE,FALSE,FALSE}"
        );
    }

    #[test]
    fn epics_dates_times_and_wildcards() {
        let p = PropertyId::EffectivePeriod;
        assert_eq!(
            epics_value(p, &DataValue::Date(Date::new(2024, 1, 1))),
            "Monday, 1-Jan-2024"
        );
        assert_eq!(epics_value(p, &DataValue::Date(Date::wildcard())), "*, *-*-*");
        assert_eq!(epics_value(p, &DataValue::Time(Time::hm(8, 0))), "08:00:00.00");
        assert_eq!(epics_value(p, &DataValue::Time(Time::wildcard())), "*:*:*.*");
    }

    #[test]
    fn epics_constructed_values() {
        let schedule = DataValue::DailySchedule(vec![
            TimeValue::new(Time::hm(8, 0), DataValue::Boolean(true)),
            TimeValue::new(Time::hm(17, 30), DataValue::Null),
        ]);
        assert_eq!(
            epics_value(PropertyId::WeeklySchedule, &schedule),
            "((08:00:00.00, TRUE), (17:30:00.00, NULL))"
        );
        let reference = DeviceObjectPropertyReference::local(
            ObjectId::new(ObjectType::BinaryOutput, 3),
            PropertyId::PresentValue,
        );
        assert_eq!(
            epics_value(
                PropertyId::ListOfObjectPropertyReferences,
                &DataValue::List(vec![DataValue::ObjectPropertyReference(reference)])
            ),
            "{{(binary-output,3), present-value}}"
        );
    }

    #[test]
    fn json_names_enumerations_and_nulls_wildcards() {
        assert_eq!(
            json_value(PropertyId::EventState, &DataValue::Enumerated(2)),
            json!("offnormal")
        );
        assert_eq!(
            json_value(PropertyId::TimeDelay, &DataValue::Unsigned(30)),
            json!(30)
        );
        assert_eq!(
            json_value(PropertyId::EffectivePeriod, &DataValue::Date(Date::wildcard())),
            json!({ "year": null, "month": null, "day": null, "weekday": null })
        );
    }

    #[test]
    fn objects_list_every_property() {
        let bi = BinaryInput::new(2);
        let text = epics_object(&bi);
        assert!(text.starts_with("{\n    object-identifier: (binary-input,2)\n"));
        assert!(text.contains("    present-value: inactive\n"));
        assert!(text.contains("    polarity: normal\n"));
        assert!(text.ends_with('}'));

        let json = json_object(&bi);
        assert_eq!(json["object-name"], json!("binary-input 2"));
        assert_eq!(json["event-state"], json!("normal"));
        assert_eq!(json["out-of-service"], json!(false));
    }
}
