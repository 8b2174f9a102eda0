//! Standard BACnet enumerations used by the object layer.

macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $ty:ident { $($variant:ident = $num:literal => $name:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $ty {
            $($variant = $num,)+
        }

        impl $ty {
            pub const fn to_u32(self) -> u32 {
                self as u32
            }

            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($num => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// EPICS keyword.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

enumeration! {
    /// BACnet error class reported in Error PDUs.
    ErrorClass {
        Device = 0 => "device",
        Object = 1 => "object",
        Property = 2 => "property",
        Resources = 3 => "resources",
        Security = 4 => "security",
        Services = 5 => "services",
        Vt = 6 => "vt",
        Communication = 7 => "communication",
    }
}

enumeration! {
    /// BACnet error codes this layer can report.
    ErrorCode {
        Other = 0 => "other",
        ConfigurationInProgress = 2 => "configuration-in-progress",
        DeviceBusy = 3 => "device-busy",
        InvalidDataType = 9 => "invalid-data-type",
        InvalidTimeStamp = 14 => "invalid-time-stamp",
        NoSpaceToWriteProperty = 20 => "no-space-to-write-property",
        ObjectIdentifierAlreadyExists = 24 => "object-identifier-already-exists",
        UnknownObject = 31 => "unknown-object",
        UnknownProperty = 32 => "unknown-property",
        UnsupportedObjectType = 36 => "unsupported-object-type",
        ValueOutOfRange = 37 => "value-out-of-range",
        WriteAccessDenied = 40 => "write-access-denied",
        CharacterSetNotSupported = 41 => "character-set-not-supported",
        InvalidArrayIndex = 42 => "invalid-array-index",
        DuplicateName = 48 => "duplicate-name",
        PropertyIsNotAnArray = 50 => "property-is-not-an-array",
        InvalidEventState = 73 => "invalid-event-state",
    }
}

enumeration! {
    EventState {
        Normal = 0 => "normal",
        Fault = 1 => "fault",
        Offnormal = 2 => "offnormal",
        HighLimit = 3 => "high-limit",
        LowLimit = 4 => "low-limit",
        LifeSafetyAlarm = 5 => "life-safety-alarm",
    }
}

enumeration! {
    Reliability {
        NoFaultDetected = 0 => "no-fault-detected",
        NoSensor = 1 => "no-sensor",
        OverRange = 2 => "over-range",
        UnderRange = 3 => "under-range",
        OpenLoop = 4 => "open-loop",
        ShortedLoop = 5 => "shorted-loop",
        NoOutput = 6 => "no-output",
        UnreliableOther = 7 => "unreliable-other",
        ProcessError = 8 => "process-error",
        MultiStateFault = 9 => "multi-state-fault",
        ConfigurationError = 10 => "configuration-error",
        CommunicationFailure = 12 => "communication-failure",
        MemberFault = 13 => "member-fault",
    }
}

enumeration! {
    NotifyType {
        Alarm = 0 => "alarm",
        Event = 1 => "event",
        AckNotification = 2 => "ack-notification",
    }
}

enumeration! {
    EventType {
        ChangeOfBitstring = 0 => "change-of-bitstring",
        ChangeOfState = 1 => "change-of-state",
        ChangeOfValue = 2 => "change-of-value",
        OutOfRange = 5 => "out-of-range",
    }
}

enumeration! {
    Polarity {
        Normal = 0 => "normal",
        Reverse = 1 => "reverse",
    }
}

enumeration! {
    /// Present-value of binary objects.
    BinaryPv {
        Inactive = 0 => "inactive",
        Active = 1 => "active",
    }
}

impl Default for Reliability {
    fn default() -> Self {
        Self::NoFaultDetected
    }
}

impl Default for EventState {
    fn default() -> Self {
        Self::Normal
    }
}

impl Default for BinaryPv {
    fn default() -> Self {
        Self::Inactive
    }
}

impl BinaryPv {
    pub const fn inverted(self) -> Self {
        match self {
            Self::Inactive => Self::Active,
            Self::Active => Self::Inactive,
        }
    }
}

impl EventState {
    /// Transition a change into this state reports on.
    pub const fn transition(self) -> crate::types::Transition {
        use crate::types::Transition;
        match self {
            Self::Normal => Transition::ToNormal,
            Self::Fault => Transition::ToFault,
            _ => Transition::ToOffnormal,
        }
    }
}
