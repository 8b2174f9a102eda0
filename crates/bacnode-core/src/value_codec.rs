use crate::encoding::{
    primitives::{
        decode_app_date, decode_app_time, decode_ctx_unsigned, decode_optional_ctx_unsigned,
        decode_signed, decode_unsigned, encode_app_date, encode_app_enumerated, encode_app_signed,
        encode_app_time, encode_app_unsigned, encode_closing_tag, encode_ctx_object_id,
        encode_ctx_unsigned, encode_opening_tag, expect_closing_tag, expect_opening_tag,
    },
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::types::{
    BitString, DataValue, Date, DateRange, DateTime, DeviceObjectPropertyReference, ObjectId,
    PropertyId, Time, TimeStamp, TimeValue,
};
use crate::{DecodeError, EncodeError, MAX_APDU};
use alloc::string::String;
use alloc::vec::Vec;

/// Character set 0: ISO 10646 UTF-8.
const CHARSET_UTF8: u8 = 0;

fn u32_len(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::ValueOutOfRange)
}

/// Encodes `value` the way it appears inside a property's value brackets.
pub fn encode_data_value(w: &mut Writer<'_>, value: &DataValue) -> Result<(), EncodeError> {
    match value {
        DataValue::Null => Tag::Application {
            tag: AppTag::Null,
            len: 0,
        }
        .encode(w),
        DataValue::Boolean(v) => Tag::Application {
            tag: AppTag::Boolean,
            len: *v as u32,
        }
        .encode(w),
        DataValue::Unsigned(v) => encode_app_unsigned(w, *v),
        DataValue::Signed(v) => encode_app_signed(w, *v),
        DataValue::Real(v) => {
            Tag::Application {
                tag: AppTag::Real,
                len: 4,
            }
            .encode(w)?;
            w.write_all(&v.to_be_bytes())
        }
        DataValue::Double(v) => {
            Tag::Application {
                tag: AppTag::Double,
                len: 8,
            }
            .encode(w)?;
            w.write_all(&v.to_be_bytes())
        }
        DataValue::OctetString(v) => {
            Tag::Application {
                tag: AppTag::OctetString,
                len: u32_len(v.len())?,
            }
            .encode(w)?;
            w.write_all(v)
        }
        DataValue::CharacterString(v) => {
            Tag::Application {
                tag: AppTag::CharacterString,
                len: u32_len(v.len() + 1)?,
            }
            .encode(w)?;
            w.write_u8(CHARSET_UTF8)?;
            w.write_all(v.as_bytes())
        }
        DataValue::BitString(v) => {
            if v.unused_bits > 7 {
                return Err(EncodeError::ValueOutOfRange);
            }
            Tag::Application {
                tag: AppTag::BitString,
                len: u32_len(v.data.len() + 1)?,
            }
            .encode(w)?;
            w.write_u8(v.unused_bits)?;
            w.write_all(&v.data)
        }
        DataValue::Enumerated(v) => encode_app_enumerated(w, *v),
        DataValue::Date(v) => encode_app_date(w, *v),
        DataValue::Time(v) => encode_app_time(w, *v),
        DataValue::ObjectId(v) => {
            Tag::Application {
                tag: AppTag::ObjectId,
                len: 4,
            }
            .encode(w)?;
            w.write_be_u32(v.raw())
        }
        DataValue::DateRange(range) => {
            encode_app_date(w, range.start)?;
            encode_app_date(w, range.end)
        }
        DataValue::TimeStamp(ts) => encode_time_stamp(w, ts),
        DataValue::DailySchedule(entries) => {
            encode_opening_tag(w, 0)?;
            for entry in entries {
                encode_app_time(w, entry.time)?;
                encode_data_value(w, &entry.value)?;
            }
            encode_closing_tag(w, 0)
        }
        DataValue::ObjectPropertyReference(reference) => {
            encode_object_property_reference(w, reference)
        }
        DataValue::List(values) => values.iter().try_for_each(|v| encode_data_value(w, v)),
    }
}

/// Encodes `value` into a freshly allocated buffer of at most [`MAX_APDU`] octets.
pub fn encode_to_vec(value: &DataValue) -> Result<Vec<u8>, EncodeError> {
    let mut buf = [0u8; MAX_APDU];
    let mut w = Writer::new(&mut buf);
    encode_data_value(&mut w, value)?;
    Ok(w.as_written().to_vec())
}

pub fn encode_time_stamp(w: &mut Writer<'_>, ts: &TimeStamp) -> Result<(), EncodeError> {
    match ts {
        TimeStamp::Time(time) => {
            Tag::Context { tag_num: 0, len: 4 }.encode(w)?;
            w.write_all(&time.to_octets())
        }
        TimeStamp::SequenceNumber(seq) => encode_ctx_unsigned(w, 1, *seq),
        TimeStamp::DateTime(dt) => {
            encode_opening_tag(w, 2)?;
            encode_app_date(w, dt.date)?;
            encode_app_time(w, dt.time)?;
            encode_closing_tag(w, 2)
        }
    }
}

pub fn encode_object_property_reference(
    w: &mut Writer<'_>,
    reference: &DeviceObjectPropertyReference,
) -> Result<(), EncodeError> {
    encode_ctx_object_id(w, 0, reference.object_id.raw())?;
    encode_ctx_unsigned(w, 1, reference.property.to_u32())?;
    if let Some(index) = reference.array_index {
        encode_ctx_unsigned(w, 2, index)?;
    }
    if let Some(device) = reference.device_id {
        encode_ctx_object_id(w, 3, device.raw())?;
    }
    Ok(())
}

/// Decodes one application-tagged primitive value.
pub fn decode_application_value(r: &mut Reader<'_>) -> Result<DataValue, DecodeError> {
    match Tag::decode(r)? {
        Tag::Application { tag, len } => decode_application_payload(r, tag, len),
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Decodes application-tagged values until the reader is exhausted.
pub fn decode_application_values(r: &mut Reader<'_>) -> Result<Vec<DataValue>, DecodeError> {
    let mut values = Vec::new();
    while !r.is_empty() {
        values.push(decode_application_value(r)?);
    }
    Ok(values)
}

fn decode_application_payload(
    r: &mut Reader<'_>,
    tag: AppTag,
    len: u32,
) -> Result<DataValue, DecodeError> {
    let len = len as usize;
    Ok(match tag {
        AppTag::Null => DataValue::Null,
        AppTag::Boolean => match len {
            0 => DataValue::Boolean(false),
            1 => DataValue::Boolean(true),
            _ => return Err(DecodeError::InvalidValue),
        },
        AppTag::UnsignedInt => DataValue::Unsigned(decode_unsigned(r, len)?),
        AppTag::SignedInt => DataValue::Signed(decode_signed(r, len)?),
        AppTag::Real => {
            if len != 4 {
                return Err(DecodeError::InvalidLength);
            }
            DataValue::Real(f32::from_be_bytes(r.read_array()?))
        }
        AppTag::Double => {
            if len != 8 {
                return Err(DecodeError::InvalidLength);
            }
            DataValue::Double(f64::from_be_bytes(r.read_array()?))
        }
        AppTag::OctetString => DataValue::OctetString(r.read_exact(len)?.to_vec()),
        AppTag::CharacterString => {
            let raw = r.read_exact(len)?;
            let (charset, text) = raw.split_first().ok_or(DecodeError::InvalidLength)?;
            if *charset != CHARSET_UTF8 {
                return Err(DecodeError::UnsupportedCharacterSet);
            }
            let text = core::str::from_utf8(text).map_err(|_| DecodeError::InvalidValue)?;
            DataValue::CharacterString(String::from(text))
        }
        AppTag::BitString => {
            let raw = r.read_exact(len)?;
            let (unused_bits, data) = raw.split_first().ok_or(DecodeError::InvalidLength)?;
            if *unused_bits > 7 || (data.is_empty() && *unused_bits != 0) {
                return Err(DecodeError::InvalidValue);
            }
            DataValue::BitString(BitString::new(*unused_bits, data.to_vec()))
        }
        AppTag::Enumerated => DataValue::Enumerated(decode_unsigned(r, len)?),
        AppTag::Date => {
            if len != 4 {
                return Err(DecodeError::InvalidLength);
            }
            DataValue::Date(Date::from_octets(r.read_array()?))
        }
        AppTag::Time => {
            if len != 4 {
                return Err(DecodeError::InvalidLength);
            }
            DataValue::Time(Time::from_octets(r.read_array()?))
        }
        AppTag::ObjectId => {
            if len != 4 {
                return Err(DecodeError::InvalidLength);
            }
            DataValue::ObjectId(ObjectId::from_raw(r.read_be_u32()?))
        }
    })
}

pub fn decode_date_range(r: &mut Reader<'_>) -> Result<DateRange, DecodeError> {
    let start = decode_app_date(r)?;
    let end = decode_app_date(r)?;
    Ok(DateRange { start, end })
}

pub fn decode_time_stamp(r: &mut Reader<'_>) -> Result<TimeStamp, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num: 0, len: 4 } => Ok(TimeStamp::Time(Time::from_octets(
            r.read_array()?,
        ))),
        Tag::Context { tag_num: 1, len } => {
            Ok(TimeStamp::SequenceNumber(decode_unsigned(r, len as usize)?))
        }
        Tag::Opening { tag_num: 2 } => {
            let date = decode_app_date(r)?;
            let time = decode_app_time(r)?;
            expect_closing_tag(r, 2)?;
            Ok(TimeStamp::DateTime(DateTime::new(date, time)))
        }
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Decodes one `[0] { time value ... }` daily schedule.
pub fn decode_daily_schedule(r: &mut Reader<'_>) -> Result<Vec<TimeValue>, DecodeError> {
    expect_opening_tag(r, 0)?;
    let mut entries = Vec::new();
    loop {
        if Tag::peek(r)? == (Tag::Closing { tag_num: 0 }) {
            expect_closing_tag(r, 0)?;
            return Ok(entries);
        }
        let time = decode_app_time(r)?;
        let value = decode_application_value(r)?;
        entries.push(TimeValue::new(time, value));
    }
}

pub fn decode_object_property_reference(
    r: &mut Reader<'_>,
) -> Result<DeviceObjectPropertyReference, DecodeError> {
    let object_id = ObjectId::from_raw(decode_ctx_unsigned(r, 0)?);
    let property = PropertyId::from_u32(decode_ctx_unsigned(r, 1)?);
    let array_index = decode_optional_ctx_unsigned(r, 2)?;
    let device_id = decode_optional_ctx_unsigned(r, 3)?.map(ObjectId::from_raw);
    Ok(DeviceObjectPropertyReference {
        object_id,
        property,
        array_index,
        device_id,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        decode_application_value, decode_daily_schedule, decode_date_range,
        decode_object_property_reference, decode_time_stamp, encode_data_value, encode_to_vec,
    };
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{
        BitString, DataValue, Date, DateRange, DateTime, DeviceObjectPropertyReference, ObjectId,
        ObjectType, PropertyId, Time, TimeStamp, TimeValue,
    };
    use crate::DecodeError;
    use alloc::vec;

    #[test]
    fn primitive_values_roundtrip() {
        let values = [
            DataValue::Null,
            DataValue::Boolean(true),
            DataValue::Boolean(false),
            DataValue::Unsigned(70_000),
            DataValue::Signed(-5),
            DataValue::Real(21.5),
            DataValue::Double(-0.125),
            DataValue::OctetString(vec![0xDE, 0xAD]),
            DataValue::CharacterString("Fan 1".into()),
            DataValue::BitString(BitString::from_bits(&[false, true, false, false])),
            DataValue::Enumerated(1),
            DataValue::Date(Date::new(2024, 3, 9)),
            DataValue::Time(Time::new(8, 30, 0, 0)),
            DataValue::ObjectId(ObjectId::new(ObjectType::BinaryOutput, 3)),
        ];
        for v in values {
            let bytes = encode_to_vec(&v).unwrap();
            let mut r = Reader::new(&bytes);
            assert_eq!(decode_application_value(&mut r).unwrap(), v);
            assert!(r.is_empty(), "trailing bytes after {v:?}");
        }
    }

    #[test]
    fn real_matches_wire_fixture() {
        let bytes = encode_to_vec(&DataValue::Real(72.0)).unwrap();
        assert_eq!(bytes, vec![0x44, 0x42, 0x90, 0x00, 0x00]);
    }

    #[test]
    fn foreign_character_set_is_rejected() {
        let mut r = Reader::new(&[0x75, 0x03, 0x04, b'h', b'i']);
        assert_eq!(
            decode_application_value(&mut r).unwrap_err(),
            DecodeError::UnsupportedCharacterSet
        );
    }

    #[test]
    fn daily_schedule_roundtrip() {
        let day = vec![
            TimeValue::new(Time::hm(8, 0), DataValue::Boolean(true)),
            TimeValue::new(Time::hm(18, 0), DataValue::Null),
        ];
        let bytes = encode_to_vec(&DataValue::DailySchedule(day.clone())).unwrap();
        assert_eq!(bytes.first(), Some(&0x0E));
        assert_eq!(bytes.last(), Some(&0x0F));
        let mut r = Reader::new(&bytes);
        assert_eq!(decode_daily_schedule(&mut r).unwrap(), day);
    }

    #[test]
    fn constructed_values_decode() {
        let range = DateRange {
            start: Date::new(2024, 1, 1),
            end: Date::wildcard(),
        };
        let stamp = TimeStamp::DateTime(DateTime::new(Date::new(2024, 1, 2), Time::hm(3, 4)));
        let reference = DeviceObjectPropertyReference {
            object_id: ObjectId::new(ObjectType::AnalogOutput, 2),
            property: PropertyId::PresentValue,
            array_index: Some(3),
            device_id: Some(ObjectId::new(ObjectType::Device, 99)),
        };

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        encode_data_value(&mut w, &DataValue::DateRange(range)).unwrap();
        encode_data_value(&mut w, &DataValue::TimeStamp(stamp)).unwrap();
        encode_data_value(&mut w, &DataValue::ObjectPropertyReference(reference)).unwrap();

        let mut r = Reader::new(w.as_written());
        assert_eq!(decode_date_range(&mut r).unwrap(), range);
        assert_eq!(decode_time_stamp(&mut r).unwrap(), stamp);
        assert_eq!(decode_object_property_reference(&mut r).unwrap(), reference);
        assert!(r.is_empty());
    }

    #[test]
    fn truncated_input_is_an_error() {
        let bytes = encode_to_vec(&DataValue::Real(1.0)).unwrap();
        let mut r = Reader::new(&bytes[..3]);
        assert_eq!(
            decode_application_value(&mut r).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }
}
