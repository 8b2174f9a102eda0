use crate::encoding::tag::AppTag;
use crate::types::{BitString, Date, DateTime, ObjectId, PropertyId, Time};
use alloc::string::String;
use alloc::vec::Vec;

/// An owned, decoded BACnet property value.
///
/// Primitive variants map one-to-one onto application tags. The remaining
/// variants are the constructed values the hosted objects expose; they have
/// no application tag of their own.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataValue {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString(BitString),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectId(ObjectId),
    DateRange(DateRange),
    TimeStamp(TimeStamp),
    DailySchedule(Vec<TimeValue>),
    ObjectPropertyReference(DeviceObjectPropertyReference),
    /// Array or list contents, encoded back to back.
    List(Vec<DataValue>),
}

impl DataValue {
    /// Application tag of a primitive value; `None` for constructed values.
    pub fn tag(&self) -> Option<AppTag> {
        Some(match self {
            Self::Null => AppTag::Null,
            Self::Boolean(_) => AppTag::Boolean,
            Self::Unsigned(_) => AppTag::UnsignedInt,
            Self::Signed(_) => AppTag::SignedInt,
            Self::Real(_) => AppTag::Real,
            Self::Double(_) => AppTag::Double,
            Self::OctetString(_) => AppTag::OctetString,
            Self::CharacterString(_) => AppTag::CharacterString,
            Self::BitString(_) => AppTag::BitString,
            Self::Enumerated(_) => AppTag::Enumerated,
            Self::Date(_) => AppTag::Date,
            Self::Time(_) => AppTag::Time,
            Self::ObjectId(_) => AppTag::ObjectId,
            Self::DateRange(_)
            | Self::TimeStamp(_)
            | Self::DailySchedule(_)
            | Self::ObjectPropertyReference(_)
            | Self::List(_) => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<f32> for DataValue {
    fn from(v: f32) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        Self::CharacterString(v.into())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        Self::CharacterString(v)
    }
}

impl From<ObjectId> for DataValue {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl From<BitString> for DataValue {
    fn from(v: BitString) -> Self {
        Self::BitString(v)
    }
}

/// BACnetDateRange, as used by a schedule's effective period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    /// A range matching every date.
    pub const fn always() -> Self {
        Self {
            start: Date::wildcard(),
            end: Date::wildcard(),
        }
    }

    pub fn contains(&self, date: &Date) -> bool {
        use core::cmp::Ordering;
        self.start.wildcard_cmp(date) != Ordering::Greater
            && date.wildcard_cmp(&self.end) != Ordering::Greater
    }
}

/// BACnetTimeStamp choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeStamp {
    Time(Time),
    SequenceNumber(u32),
    DateTime(DateTime),
}

/// One entry of a daily schedule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeValue {
    pub time: Time,
    pub value: DataValue,
}

impl TimeValue {
    pub fn new(time: Time, value: DataValue) -> Self {
        Self { time, value }
    }
}

/// BACnetDeviceObjectPropertyReference: a schedule write-back target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceObjectPropertyReference {
    pub object_id: ObjectId,
    pub property: PropertyId,
    pub array_index: Option<u32>,
    /// `None` means the local device.
    pub device_id: Option<ObjectId>,
}

impl DeviceObjectPropertyReference {
    /// Reference to a property of an object on the local device.
    pub const fn local(object_id: ObjectId, property: PropertyId) -> Self {
        Self {
            object_id,
            property,
            array_index: None,
            device_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataValue, DateRange};
    use crate::encoding::tag::AppTag;
    use crate::types::Date;

    #[test]
    fn tags_follow_variants() {
        assert_eq!(DataValue::Real(1.0).tag(), Some(AppTag::Real));
        assert_eq!(DataValue::Enumerated(1).tag(), Some(AppTag::Enumerated));
        assert_eq!(DataValue::List(alloc::vec![]).tag(), None);
    }

    #[test]
    fn date_range_is_inclusive_and_wildcard_aware() {
        let summer = DateRange {
            start: Date::new(2024, 6, 1),
            end: Date::new(2024, 8, 31),
        };
        assert!(summer.contains(&Date::new(2024, 6, 1)));
        assert!(summer.contains(&Date::new(2024, 8, 31)));
        assert!(!summer.contains(&Date::new(2024, 9, 1)));
        assert!(DateRange::always().contains(&Date::new(1999, 12, 31)));
    }
}
