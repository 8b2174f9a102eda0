use bacnode_core::types::{
    BinaryPv, DataValue, Date, DateTime, ObjectId, ObjectType, PropertyId, Time, TimeValue,
};
use bacnode_objects::objects::{BinaryOutput, Schedule};
use bacnode_objects::{
    BacnetObject, Commandable, ConfigStore, Device, DeviceWriter, MemoryConfigStore,
    PropertyError, WritePropertyData,
};
use std::cell::RefCell;
use std::rc::Rc;

type Sent = Rc<RefCell<Vec<(ObjectId, WritePropertyData)>>>;

struct RecordingWriter(Sent);

impl DeviceWriter for RecordingWriter {
    fn write_property(
        &mut self,
        device: ObjectId,
        request: &WritePropertyData,
    ) -> Result<(), PropertyError> {
        self.0.borrow_mut().push((device, request.clone()));
        Ok(())
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 2024-01-01 is a Monday.
fn monday_at(hour: u8) -> DateTime {
    DateTime::new(Date::new(2024, 1, 1), Time::hm(hour, 0))
}

fn config() -> MemoryConfigStore {
    let mut store = MemoryConfigStore::new();
    store.set("bacnet_bo", "2", "name", "Lights").unwrap();
    store.set("bacnet_sc", "1", "name", "Office hours").unwrap();
    store.set("bacnet_sc", "1", "type", "enum").unwrap();
    store.set("bacnet_sc", "1", "default", "0").unwrap();
    store.set("bacnet_sc", "1", "priority", "10").unwrap();
    store
        .set_list(
            "bacnet_sc",
            "1",
            "day_1",
            &["08:00=1".to_string(), "18:00=0".to_string()],
        )
        .unwrap();
    store
        .set_list(
            "bacnet_sc",
            "1",
            "ref",
            &["4,2,85".to_string(), "4,7,85,,200".to_string()],
        )
        .unwrap();
    store
}

#[test]
fn weekly_table_selects_latest_entry_or_default() {
    let mut schedule = Schedule::new(0);
    schedule
        .set_day(
            0,
            vec![
                TimeValue::new(Time::hm(18, 0), DataValue::Boolean(false)),
                TimeValue::new(Time::hm(8, 0), DataValue::Boolean(true)),
            ],
        )
        .unwrap();
    schedule.set_schedule_default(DataValue::Boolean(false)).unwrap();

    assert_eq!(schedule.evaluate(&monday_at(9)), Some(DataValue::Boolean(true)));
    assert_eq!(schedule.evaluate(&monday_at(19)), Some(DataValue::Boolean(false)));
    assert_eq!(schedule.evaluate(&monday_at(7)), None);
    assert_eq!(schedule.present_value(), &DataValue::Boolean(false));
}

#[test]
fn changes_are_written_once_per_reference() {
    let sent = Sent::default();
    let mut device = Device::builder(100)
        .remote_writer(RecordingWriter(Rc::clone(&sent)))
        .build();
    assert_eq!(device.load_config(&config()).unwrap(), 2);

    assert_eq!(device.schedule_timer(&monday_at(7)), 0);
    assert_eq!(device.schedule_timer(&monday_at(9)), 2);
    assert_eq!(
        device.object::<BinaryOutput>(2).map(|bo| bo.present_value()),
        Some(BinaryPv::Active)
    );
    assert_eq!(
        device
            .object::<BinaryOutput>(2)
            .map(|bo| bo.current_command_priority()),
        Some(10)
    );

    {
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        let (remote, request) = &sent[0];
        assert_eq!(*remote, ObjectId::new(ObjectType::Device, 200));
        assert_eq!(request.object_id, ObjectId::new(ObjectType::BinaryOutput, 7));
        assert_eq!(request.property, PropertyId::PresentValue);
        assert_eq!(request.priority, Some(10));
        assert_eq!(request.decode_value(), Ok(DataValue::Enumerated(1)));
    }

    assert_eq!(device.schedule_timer(&monday_at(10)), 0);
    assert_eq!(device.schedule_timer(&monday_at(19)), 2);
    assert_eq!(
        device.object::<BinaryOutput>(2).map(|bo| bo.present_value()),
        Some(BinaryPv::Inactive)
    );
    assert_eq!(sent.borrow().len(), 2);
}

#[test]
fn remote_writes_without_a_writer_are_dropped() {
    init_logging();
    let mut device = Device::builder(100).build();
    device.load_config(&config()).unwrap();
    assert_eq!(device.schedule_timer(&monday_at(9)), 1);
    assert_eq!(
        device.object::<BinaryOutput>(2).map(|bo| bo.present_value()),
        Some(BinaryPv::Active)
    );
}

#[test]
fn outside_the_effective_period_nothing_is_written() {
    let mut store = config();
    store.set("bacnet_sc", "1", "start_date", "2024-02-01").unwrap();
    store.set("bacnet_sc", "1", "end_date", "*-*-*").unwrap();
    let mut device = Device::builder(100).build();
    device.load_config(&store).unwrap();
    assert_eq!(device.schedule_timer(&monday_at(9)), 0);
    assert!(device.cov_pending().is_empty());
}

#[test]
fn failed_local_writes_still_count_and_leave_others_untouched() {
    init_logging();
    let mut store = config();
    // Target a binary output that does not exist.
    store
        .set_list("bacnet_sc", "1", "ref", &["4,9,85".to_string(), "4,2,85".to_string()])
        .unwrap();
    let mut device = Device::builder(100).build();
    device.load_config(&store).unwrap();
    assert_eq!(device.schedule_timer(&monday_at(9)), 2);
    assert_eq!(
        device.object::<BinaryOutput>(2).map(|bo| bo.present_value()),
        Some(BinaryPv::Active)
    );
    assert_eq!(
        device.cov_pending(),
        vec![
            ObjectId::new(ObjectType::BinaryOutput, 2),
            ObjectId::new(ObjectType::Schedule, 1),
        ]
    );
}
