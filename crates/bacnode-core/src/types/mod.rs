pub mod bit_string;
pub mod data_value;
pub mod date_time;
pub mod object_id;
pub mod object_type;
pub mod property_id;
pub mod spec;
pub mod status;
pub mod units;

pub use bit_string::BitString;
pub use data_value::{DataValue, DateRange, DeviceObjectPropertyReference, TimeStamp, TimeValue};
pub use date_time::{Date, DateTime, Time, Weekday};
pub use object_id::ObjectId;
pub use object_type::ObjectType;
pub use property_id::PropertyId;
pub use spec::{
    BinaryPv, ErrorClass, ErrorCode, EventState, EventType, NotifyType, Polarity, Reliability,
};
pub use status::{EventTransitionBits, StatusFlags, Transition};
