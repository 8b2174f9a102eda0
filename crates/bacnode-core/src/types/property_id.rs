use core::fmt;

macro_rules! property_ids {
    ($($variant:ident = $num:literal => $name:literal,)+) => {
        /// BACnet property identifiers used by the hosted object types.
        ///
        /// Anything else, standard or vendor-specific, is carried as
        /// [`Proprietary`](Self::Proprietary).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum PropertyId {
            $($variant,)+
            Proprietary(u32),
        }

        impl PropertyId {
            pub const fn to_u32(self) -> u32 {
                match self {
                    $(Self::$variant => $num,)+
                    Self::Proprietary(v) => v,
                }
            }

            pub const fn from_u32(value: u32) -> Self {
                match value {
                    $($num => Self::$variant,)+
                    v => Self::Proprietary(v),
                }
            }

            /// EPICS keyword, or `None` for identifiers without a variant.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)+
                    Self::Proprietary(_) => None,
                }
            }
        }
    };
}

property_ids! {
    AckedTransitions = 0 => "acked-transitions",
    ActiveText = 4 => "active-text",
    AlarmValue = 6 => "alarm-value",
    AlarmValues = 7 => "alarm-values",
    NotificationClass = 17 => "notification-class",
    CovIncrement = 22 => "cov-increment",
    Description = 28 => "description",
    EffectivePeriod = 32 => "effective-period",
    EventEnable = 35 => "event-enable",
    EventState = 36 => "event-state",
    InactiveText = 46 => "inactive-text",
    ListOfObjectPropertyReferences = 54 => "list-of-object-property-references",
    MaxPresValue = 65 => "max-pres-value",
    MinPresValue = 69 => "min-pres-value",
    NotifyType = 72 => "notify-type",
    NumberOfStates = 74 => "number-of-states",
    ObjectIdentifier = 75 => "object-identifier",
    ObjectList = 76 => "object-list",
    ObjectName = 77 => "object-name",
    ObjectType = 79 => "object-type",
    OutOfService = 81 => "out-of-service",
    Polarity = 84 => "polarity",
    PresentValue = 85 => "present-value",
    PriorityArray = 87 => "priority-array",
    PriorityForWriting = 88 => "priority-for-writing",
    Reliability = 103 => "reliability",
    RelinquishDefault = 104 => "relinquish-default",
    StateText = 110 => "state-text",
    StatusFlags = 111 => "status-flags",
    TimeDelay = 113 => "time-delay",
    Units = 117 => "units",
    WeeklySchedule = 123 => "weekly-schedule",
    EventTimeStamps = 130 => "event-time-stamps",
    ScheduleDefault = 174 => "schedule-default",
    EventDetectionEnable = 353 => "event-detection-enable",
    PropertyList = 371 => "property-list",
    CurrentCommandPriority = 431 => "current-command-priority",
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "proprietary-{}", self.to_u32()),
        }
    }
}
