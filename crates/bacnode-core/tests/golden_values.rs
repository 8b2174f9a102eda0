use bacnode_core::encoding::reader::Reader;
use bacnode_core::encoding::writer::Writer;
use bacnode_core::types::{
    BitString, DataValue, Date, DateTime, DeviceObjectPropertyReference, ObjectId, ObjectType,
    PropertyId, StatusFlags, Time, TimeStamp, TimeValue,
};
use bacnode_core::value_codec::{
    decode_application_value, decode_daily_schedule, decode_object_property_reference,
    decode_time_stamp, encode_data_value, encode_to_vec,
};
use bacnode_core::DecodeError;

#[test]
fn object_name_matches_fixture() {
    let bytes = encode_to_vec(&DataValue::from("AO 1")).unwrap();
    assert_eq!(bytes, vec![0x75, 0x05, 0x00, b'A', b'O', b' ', b'1']);
}

#[test]
fn object_identifier_matches_fixture() {
    let bytes = encode_to_vec(&ObjectId::new(ObjectType::AnalogOutput, 1).into()).unwrap();
    assert_eq!(bytes, vec![0xC4, 0x00, 0x40, 0x00, 0x01]);
}

#[test]
fn status_flags_match_fixture() {
    let flags = StatusFlags {
        out_of_service: true,
        ..StatusFlags::default()
    };
    let bytes = encode_to_vec(&flags.to_bit_string().into()).unwrap();
    assert_eq!(bytes, vec![0x82, 0x04, 0x10]);

    let mut r = Reader::new(&bytes);
    let DataValue::BitString(bits) = decode_application_value(&mut r).unwrap() else {
        panic!("expected a bit string");
    };
    assert_eq!(StatusFlags::from_bit_string(&bits), flags);
}

#[test]
fn present_value_choices_match_fixture() {
    let mut buf = [0u8; 32];
    let mut w = Writer::new(&mut buf);
    encode_data_value(&mut w, &DataValue::Null).unwrap();
    encode_data_value(&mut w, &DataValue::Boolean(true)).unwrap();
    encode_data_value(&mut w, &DataValue::Enumerated(1)).unwrap();
    encode_data_value(&mut w, &DataValue::Unsigned(16)).unwrap();
    encode_data_value(&mut w, &DataValue::Real(0.0)).unwrap();
    assert_eq!(
        w.as_written(),
        &[0x00, 0x11, 0x91, 0x01, 0x21, 0x10, 0x44, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn daily_schedule_matches_fixture() {
    let day = DataValue::DailySchedule(vec![TimeValue::new(
        Time::hm(8, 0),
        DataValue::Boolean(true),
    )]);
    let bytes = encode_to_vec(&day).unwrap();
    assert_eq!(
        bytes,
        vec![0x0E, 0xB4, 0x08, 0x00, 0x00, 0x00, 0x11, 0x0F]
    );

    let mut r = Reader::new(&bytes);
    let entries = decode_daily_schedule(&mut r).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, DataValue::Boolean(true));
}

#[test]
fn local_property_reference_matches_fixture() {
    let reference = DeviceObjectPropertyReference::local(
        ObjectId::new(ObjectType::AnalogOutput, 1),
        PropertyId::PresentValue,
    );
    let bytes = encode_to_vec(&DataValue::ObjectPropertyReference(reference)).unwrap();
    assert_eq!(bytes, vec![0x0C, 0x00, 0x40, 0x00, 0x01, 0x19, 0x55]);

    let mut r = Reader::new(&bytes);
    assert_eq!(decode_object_property_reference(&mut r).unwrap(), reference);
}

#[test]
fn date_time_stamp_matches_fixture() {
    let stamp = TimeStamp::DateTime(DateTime::new(Date::new(2024, 1, 1), Time::hm(8, 0)));
    let bytes = encode_to_vec(&DataValue::TimeStamp(stamp)).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x2E, 0xA4, 124, 0x01, 0x01, 0x01, 0xB4, 0x08, 0x00, 0x00, 0x00, 0x2F,
        ]
    );

    let mut r = Reader::new(&bytes);
    assert_eq!(decode_time_stamp(&mut r).unwrap(), stamp);
}

#[test]
fn context_tag_is_not_an_application_value() {
    let mut r = Reader::new(&[0x19, 0x55]);
    assert_eq!(
        decode_application_value(&mut r).unwrap_err(),
        DecodeError::InvalidTag
    );
}

#[test]
fn oversized_bit_string_padding_is_rejected() {
    let mut r = Reader::new(&[0x82, 0x09, 0x00]);
    assert_eq!(
        decode_application_value(&mut r).unwrap_err(),
        DecodeError::InvalidValue
    );
    let empty = encode_to_vec(&BitString::default().into()).unwrap();
    assert_eq!(empty, vec![0x81, 0x00]);
}
