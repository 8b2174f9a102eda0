#![no_main]

use bacnode_core::types::{ObjectId, ObjectType, PropertyId};
use bacnode_objects::{Device, ReadPropertyData, WritePropertyData};
use libfuzzer_sys::fuzz_target;

const TYPES: [ObjectType; 5] = [
    ObjectType::AnalogOutput,
    ObjectType::BinaryInput,
    ObjectType::BinaryOutput,
    ObjectType::MultiStateInput,
    ObjectType::Schedule,
];

// Layout: type selector, property (2 bytes), index flag + index, priority,
// then the encoded value.
fuzz_target!(|data: &[u8]| {
    let [selector, p_hi, p_lo, index, priority, value @ ..] = data else {
        return;
    };
    let mut device = Device::builder(1).build();
    for object_type in TYPES {
        let _ = device.create(object_type, Some(0));
    }
    let object_id = ObjectId::new(TYPES[usize::from(*selector) % TYPES.len()], 0);
    let property = PropertyId::from_u32(u32::from(u16::from_be_bytes([*p_hi, *p_lo])));
    let request = WritePropertyData {
        object_id,
        property,
        array_index: (*index != 0xFF).then_some(u32::from(*index)),
        priority: (*priority != 0).then_some(*priority),
        value: value.to_vec(),
    };
    if device.write_property(&request).is_ok() {
        let _ = device.read_property_encoded(&ReadPropertyData::new(object_id, property));
    }
    let _ = device.schedule_timer(&bacnode_core::types::DateTime::unspecified());
});
