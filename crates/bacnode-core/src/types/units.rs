//! Engineering units (BACnetEngineeringUnits) used by analog objects.
//!
//! Units are carried as their raw enumeration value; only the common
//! building-automation units get a name.

pub const SQUARE_METERS: u32 = 0;
pub const MILLIAMPERES: u32 = 2;
pub const AMPERES: u32 = 3;
pub const VOLTS: u32 = 5;
pub const WATTS: u32 = 47;
pub const KILOWATTS: u32 = 48;
pub const KILOWATT_HOURS: u32 = 19;
pub const PERCENT_RELATIVE_HUMIDITY: u32 = 29;
pub const PASCALS: u32 = 53;
pub const DEGREES_CELSIUS: u32 = 62;
pub const DEGREES_FAHRENHEIT: u32 = 64;
pub const HOURS: u32 = 71;
pub const MINUTES: u32 = 72;
pub const SECONDS: u32 = 73;
pub const LITERS_PER_SECOND: u32 = 87;
pub const NO_UNITS: u32 = 95;
pub const PARTS_PER_MILLION: u32 = 96;
pub const PERCENT: u32 = 98;
pub const CUBIC_METERS_PER_HOUR: u32 = 135;

pub fn name(units: u32) -> Option<&'static str> {
    Some(match units {
        SQUARE_METERS => "square-meters",
        MILLIAMPERES => "milliamperes",
        AMPERES => "amperes",
        VOLTS => "volts",
        WATTS => "watts",
        KILOWATTS => "kilowatts",
        KILOWATT_HOURS => "kilowatt-hours",
        PERCENT_RELATIVE_HUMIDITY => "percent-relative-humidity",
        PASCALS => "pascals",
        DEGREES_CELSIUS => "degrees-celsius",
        DEGREES_FAHRENHEIT => "degrees-fahrenheit",
        HOURS => "hours",
        MINUTES => "minutes",
        SECONDS => "seconds",
        LITERS_PER_SECOND => "liters-per-second",
        NO_UNITS => "no-units",
        PARTS_PER_MILLION => "parts-per-million",
        PERCENT => "percent",
        CUBIC_METERS_PER_HOUR => "cubic-meters-per-hour",
        _ => return None,
    })
}
