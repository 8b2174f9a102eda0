use core::cmp::Ordering;

/// Octet value meaning "any" in every date and time field.
pub const WILDCARD: u8 = 0xFF;

/// Day of week, numbered the BACnet way (Monday = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1..=7 => Some(Self::ALL[value as usize - 1]),
            _ => None,
        }
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Zero-based position in a weekly schedule (Monday = 0).
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

impl Date {
    /// Builds a concrete date and fills in its weekday.
    ///
    /// Years outside 1900..=2154 cannot be represented and become wildcards.
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        let year_since_1900 = match year.checked_sub(1900) {
            Some(y) if y < WILDCARD as u16 => y as u8,
            _ => WILDCARD,
        };
        let mut date = Self {
            year_since_1900,
            month,
            day,
            weekday: WILDCARD,
        };
        date.weekday = date.computed_weekday().map_or(WILDCARD, Weekday::to_u8);
        date
    }

    pub const fn wildcard() -> Self {
        Self {
            year_since_1900: WILDCARD,
            month: WILDCARD,
            day: WILDCARD,
            weekday: WILDCARD,
        }
    }

    pub fn year(&self) -> Option<u16> {
        (self.year_since_1900 != WILDCARD).then(|| 1900 + self.year_since_1900 as u16)
    }

    pub fn is_wildcard(&self) -> bool {
        self.year_since_1900 == WILDCARD
            && self.month == WILDCARD
            && self.day == WILDCARD
            && self.weekday == WILDCARD
    }

    /// Weekday stored in the date, or derived from year/month/day when the
    /// weekday octet is a wildcard.
    pub fn day_of_week(&self) -> Option<Weekday> {
        Weekday::from_u8(self.weekday).or_else(|| self.computed_weekday())
    }

    fn computed_weekday(&self) -> Option<Weekday> {
        const OFFSETS: [u32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let mut year = self.year()? as u32;
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) {
            return None;
        }
        if self.month < 3 {
            year -= 1;
        }
        let sunday_based = (year + year / 4 - year / 100 + year / 400
            + OFFSETS[self.month as usize - 1]
            + self.day as u32)
            % 7;
        Weekday::from_u8(if sunday_based == 0 { 7 } else { sunday_based as u8 })
    }

    /// Orders two dates field by field, skipping any field that is a
    /// wildcard on either side. Odd/even months (13/14) and last-day-of-month
    /// (32) count as wildcards here.
    pub fn wildcard_cmp(&self, other: &Self) -> Ordering {
        let fields = [
            (self.year_since_1900, other.year_since_1900, 0xFE),
            (self.month, other.month, 12),
            (self.day, other.day, 31),
        ];
        for (a, b, max) in fields {
            if a > max || b > max {
                continue;
            }
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    pub const fn to_octets(self) -> [u8; 4] {
        [self.year_since_1900, self.month, self.day, self.weekday]
    }

    pub const fn from_octets(b: [u8; 4]) -> Self {
        Self {
            year_since_1900: b[0],
            month: b[1],
            day: b[2],
            weekday: b[3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Time {
    pub const fn new(hour: u8, minute: u8, second: u8, hundredths: u8) -> Self {
        Self {
            hour,
            minute,
            second,
            hundredths,
        }
    }

    pub const fn hm(hour: u8, minute: u8) -> Self {
        Self::new(hour, minute, 0, 0)
    }

    pub const fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD, WILDCARD, WILDCARD)
    }

    /// Field-by-field ordering that skips fields wildcarded on either side.
    pub fn wildcard_cmp(&self, other: &Self) -> Ordering {
        let fields = [
            (self.hour, other.hour),
            (self.minute, other.minute),
            (self.second, other.second),
            (self.hundredths, other.hundredths),
        ];
        for (a, b) in fields {
            if a == WILDCARD || b == WILDCARD {
                continue;
            }
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    pub const fn to_octets(self) -> [u8; 4] {
        [self.hour, self.minute, self.second, self.hundredths]
    }

    pub const fn from_octets(b: [u8; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }

    fn sort_key(&self) -> [u8; 4] {
        self.to_octets()
    }
}

/// A local date and time, as carried by BACnet time stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl DateTime {
    pub const fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    /// All-wildcard value used for "never happened" time stamps.
    pub const fn unspecified() -> Self {
        Self::new(Date::wildcard(), Time::wildcard())
    }

    fn sort_key(&self) -> ([u8; 3], [u8; 4], u8) {
        (
            [self.date.year_since_1900, self.date.month, self.date.day],
            self.time.sort_key(),
            self.date.weekday,
        )
    }
}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Chronological order; the weekday octet only breaks ties.
impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::{Date, DateTime, Time, Weekday, WILDCARD};
    use core::cmp::Ordering;

    #[test]
    fn new_fills_in_weekday() {
        assert_eq!(Date::new(2024, 1, 1).weekday, Weekday::Monday as u8);
        assert_eq!(Date::new(2026, 10, 18).day_of_week(), Some(Weekday::Sunday));
        assert_eq!(Date::new(2000, 2, 29).day_of_week(), Some(Weekday::Tuesday));
    }

    #[test]
    fn weekday_is_derived_when_wildcarded() {
        let mut date = Date::new(2024, 6, 14);
        date.weekday = WILDCARD;
        assert_eq!(date.day_of_week(), Some(Weekday::Friday));
        assert_eq!(Date::wildcard().day_of_week(), None);
    }

    #[test]
    fn date_comparison_skips_wildcards() {
        let start = Date {
            year_since_1900: WILDCARD,
            month: 3,
            day: 1,
            weekday: WILDCARD,
        };
        assert_eq!(
            start.wildcard_cmp(&Date::new(2031, 2, 28)),
            Ordering::Greater
        );
        assert_eq!(start.wildcard_cmp(&Date::new(1999, 3, 1)), Ordering::Equal);
        assert_eq!(
            Date::wildcard().wildcard_cmp(&Date::new(2024, 1, 1)),
            Ordering::Equal
        );
    }

    #[test]
    fn time_comparison_skips_wildcards() {
        let any_minute = Time::new(8, WILDCARD, 0, 0);
        assert_eq!(any_minute.wildcard_cmp(&Time::hm(8, 59)), Ordering::Equal);
        assert_eq!(Time::hm(7, 59).wildcard_cmp(&Time::hm(8, 0)), Ordering::Less);
    }

    #[test]
    fn date_times_order_chronologically() {
        let a = DateTime::new(Date::new(2024, 5, 1), Time::hm(23, 59));
        let b = DateTime::new(Date::new(2024, 5, 2), Time::hm(0, 0));
        assert!(a < b);
        assert!(DateTime::new(Date::new(2024, 5, 2), Time::hm(0, 1)) > b);
    }
}
