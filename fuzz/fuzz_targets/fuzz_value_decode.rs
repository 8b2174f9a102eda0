#![no_main]

use bacnode_core::encoding::reader::Reader;
use bacnode_core::value_codec::{
    decode_application_values, decode_daily_schedule, decode_date_range,
    decode_object_property_reference, decode_time_stamp, encode_to_vec,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(values) = decode_application_values(&mut Reader::new(data)) {
        for value in &values {
            let _ = encode_to_vec(value);
        }
    }
    let _ = decode_date_range(&mut Reader::new(data));
    let _ = decode_time_stamp(&mut Reader::new(data));
    let _ = decode_daily_schedule(&mut Reader::new(data));
    let _ = decode_object_property_reference(&mut Reader::new(data));
});
