//! BACnet object model for bacnode.
//!
//! Hosts Analog Output, Binary Input/Output, Multi-State Input and Schedule
//! objects behind a [`Device`] context: priority-array commanding, change of
//! value tracking, intrinsic (change-of-state) reporting, schedule
//! evaluation with write-back, and persistence of every writable property
//! to a UCI-style [`ConfigStore`].

pub mod cov;
pub mod device;
pub mod error;
pub mod objects;
pub mod observer;
pub mod persist;
pub mod print;
pub mod priority;
pub mod property;
pub mod reporting;
pub mod store;

pub use device::{Device, DeviceBuilder, EventSummary, HostedObject};
pub use error::{ConfigError, PropertyError};
pub use objects::{
    AnalogOutput, BacnetObject, BinaryInput, BinaryOutput, Commandable, MultiStateInput,
    Schedule, WriteOutcome,
};
pub use observer::{DeviceWriter, NameRegistry, NotificationClassReporter, PresentValueObserver};
pub use persist::{ConfigStore, MemoryConfigStore, UciStore};
pub use property::{ReadPropertyData, WritePropertyData};
pub use reporting::EventNotification;
pub use store::ObjectStore;
