use bacnode_core::types::{Date, DateTime, ObjectId, ObjectType, Time};
use bacnode_objects::objects::{
    AnalogOutput, BinaryInput, BinaryOutput, MultiStateInput, Schedule,
};
use bacnode_objects::print::{epics_object, json_object};
use bacnode_objects::{ConfigError, Device, UciStore};
use chrono::{Datelike, NaiveDateTime, Timelike};
use clap::ValueEnum;
use std::path::Path;

/// CLI-friendly enum for selecting the hosted object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ObjectTypeArg {
    AnalogOutput,
    BinaryInput,
    BinaryOutput,
    MultiStateInput,
    Schedule,
}

impl ObjectTypeArg {
    /// Convert to the core [`ObjectType`] representation.
    pub const fn into_object_type(self) -> ObjectType {
        match self {
            Self::AnalogOutput => ObjectType::AnalogOutput,
            Self::BinaryInput => ObjectType::BinaryInput,
            Self::BinaryOutput => ObjectType::BinaryOutput,
            Self::MultiStateInput => ObjectType::MultiStateInput,
            Self::Schedule => ObjectType::Schedule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Epics,
    Json,
}

/// Local wall-clock time as a BACnet date-time.
pub fn bacnet_date_time(now: NaiveDateTime) -> DateTime {
    let year = u16::try_from(now.year()).unwrap_or(u16::MAX);
    let date = Date::new(year, now.month() as u8, now.day() as u8);
    let hundredths = (now.nanosecond() / 10_000_000).min(99) as u8;
    let time = Time::new(
        now.hour() as u8,
        now.minute() as u8,
        now.second().min(59) as u8,
        hundredths,
    );
    DateTime::new(date, time)
}

/// A device holding every object configured in the UCI directory `config`.
/// The store is only read; nothing is written back.
pub fn load_device(config: &Path, instance: u32) -> Result<Device, ConfigError> {
    let store = UciStore::open(config)?;
    let mut device = Device::builder(instance).build();
    let loaded = device.load_config(&store)?;
    log::info!("loaded {loaded} objects from {}", config.display());
    Ok(device)
}

/// EPICS block of one hosted object.
pub fn epics_for(device: &Device, id: ObjectId) -> Option<String> {
    let instance = id.instance();
    match id.object_type() {
        ObjectType::AnalogOutput => device.object::<AnalogOutput>(instance).map(epics_object),
        ObjectType::BinaryInput => device.object::<BinaryInput>(instance).map(epics_object),
        ObjectType::BinaryOutput => device.object::<BinaryOutput>(instance).map(epics_object),
        ObjectType::MultiStateInput => {
            device.object::<MultiStateInput>(instance).map(epics_object)
        }
        ObjectType::Schedule => device.object::<Schedule>(instance).map(epics_object),
        _ => None,
    }
}

/// JSON rendering of one hosted object.
pub fn json_for(device: &Device, id: ObjectId) -> Option<serde_json::Value> {
    let instance = id.instance();
    match id.object_type() {
        ObjectType::AnalogOutput => device.object::<AnalogOutput>(instance).map(json_object),
        ObjectType::BinaryInput => device.object::<BinaryInput>(instance).map(json_object),
        ObjectType::BinaryOutput => device.object::<BinaryOutput>(instance).map(json_object),
        ObjectType::MultiStateInput => {
            device.object::<MultiStateInput>(instance).map(json_object)
        }
        ObjectType::Schedule => device.object::<Schedule>(instance).map(json_object),
        _ => None,
    }
}

/// Every hosted object, optionally limited to one type, in object-list
/// order.
pub fn render(device: &Device, only: Option<ObjectTypeArg>, format: OutputFormat) -> String {
    let ids = device
        .object_list()
        .into_iter()
        .filter(|id| only.map_or(true, |t| id.object_type() == t.into_object_type()));
    match format {
        OutputFormat::Epics => ids
            .filter_map(|id| epics_for(device, id))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let objects: Vec<_> = ids.filter_map(|id| json_for(device, id)).collect();
            serde_json::Value::Array(objects).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{bacnet_date_time, load_device, render, ObjectTypeArg, OutputFormat};
    use bacnode_core::types::{ObjectType, Weekday};
    use bacnode_objects::Device;
    use chrono::NaiveDate;

    #[test]
    fn converts_local_time() {
        let now = NaiveDate::from_ymd_opt(2024, 7, 14)
            .and_then(|d| d.and_hms_milli_opt(8, 30, 5, 250))
            .unwrap();
        let dt = bacnet_date_time(now);
        assert_eq!(dt.date.year(), Some(2024));
        assert_eq!(dt.date.day_of_week(), Some(Weekday::Sunday));
        assert_eq!(
            (dt.time.hour, dt.time.minute, dt.time.second, dt.time.hundredths),
            (8, 30, 5, 25)
        );
    }

    #[test]
    fn renders_filtered_objects() {
        let mut device = Device::builder(1).build();
        device.create(ObjectType::AnalogOutput, Some(1)).unwrap();
        device.create(ObjectType::Schedule, Some(1)).unwrap();

        let text = render(&device, Some(ObjectTypeArg::Schedule), OutputFormat::Epics);
        assert!(text.contains("object-identifier: (schedule,1)"));
        assert!(!text.contains("analog-output"));

        let json: serde_json::Value =
            serde_json::from_str(&render(&device, None, OutputFormat::Json)).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["object-name"], "analog-output 1");
    }

    #[test]
    fn prints_objects_from_a_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bacnet_bi"),
            "config bi '4'\n\toption name 'Door'\n\toption value '1'\n",
        )
        .unwrap();
        let untouched = std::fs::read_to_string(dir.path().join("bacnet_bi")).unwrap();

        let device = load_device(dir.path(), 7).unwrap();
        let text = render(&device, None, OutputFormat::Epics);
        assert!(text.contains("object-identifier: (binary-input,4)"), "{text}");
        assert!(text.contains("object-name: \"Door\""), "{text}");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("bacnet_bi")).unwrap(),
            untouched
        );
    }

    #[test]
    fn unreadable_config_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_device(&dir.path().join("missing"), 7).is_err());
    }
}
