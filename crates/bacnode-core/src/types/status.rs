use crate::types::BitString;

/// The four-bit STATUS_FLAGS property, computed from live object state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusFlags {
    pub in_alarm: bool,
    pub fault: bool,
    pub overridden: bool,
    pub out_of_service: bool,
}

impl StatusFlags {
    pub fn to_bit_string(self) -> BitString {
        BitString::from_bits(&[
            self.in_alarm,
            self.fault,
            self.overridden,
            self.out_of_service,
        ])
    }

    pub fn from_bit_string(bits: &BitString) -> Self {
        Self {
            in_alarm: bits.bit(0),
            fault: bits.bit(1),
            overridden: bits.bit(2),
            out_of_service: bits.bit(3),
        }
    }
}

/// Event transitions in their BACnet bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transition {
    ToOffnormal = 0,
    ToFault = 1,
    ToNormal = 2,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Self::ToOffnormal, Self::ToFault, Self::ToNormal];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// EVENT_ENABLE / ACKED_TRANSITIONS style three-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventTransitionBits {
    pub to_offnormal: bool,
    pub to_fault: bool,
    pub to_normal: bool,
}

impl EventTransitionBits {
    pub const ALL: Self = Self {
        to_offnormal: true,
        to_fault: true,
        to_normal: true,
    };

    pub const NONE: Self = Self {
        to_offnormal: false,
        to_fault: false,
        to_normal: false,
    };

    /// Builds the set from the low three bits of a mask
    /// (1 = to-offnormal, 2 = to-fault, 4 = to-normal).
    pub const fn from_mask(mask: u8) -> Self {
        Self {
            to_offnormal: mask & 0x01 != 0,
            to_fault: mask & 0x02 != 0,
            to_normal: mask & 0x04 != 0,
        }
    }

    pub const fn to_mask(self) -> u8 {
        (self.to_offnormal as u8) | (self.to_fault as u8) << 1 | (self.to_normal as u8) << 2
    }

    pub const fn get(self, transition: Transition) -> bool {
        match transition {
            Transition::ToOffnormal => self.to_offnormal,
            Transition::ToFault => self.to_fault,
            Transition::ToNormal => self.to_normal,
        }
    }

    pub fn set(&mut self, transition: Transition, value: bool) {
        match transition {
            Transition::ToOffnormal => self.to_offnormal = value,
            Transition::ToFault => self.to_fault = value,
            Transition::ToNormal => self.to_normal = value,
        }
    }

    pub fn to_bit_string(self) -> BitString {
        BitString::from_bits(&[self.to_offnormal, self.to_fault, self.to_normal])
    }

    pub fn from_bit_string(bits: &BitString) -> Self {
        Self {
            to_offnormal: bits.bit(0),
            to_fault: bits.bit(1),
            to_normal: bits.bit(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventTransitionBits, StatusFlags, Transition};

    #[test]
    fn status_flags_bit_order() {
        let flags = StatusFlags {
            fault: true,
            out_of_service: true,
            ..Default::default()
        };
        let bits = flags.to_bit_string();
        assert_eq!(bits.data, alloc::vec![0b0101_0000]);
        assert_eq!(StatusFlags::from_bit_string(&bits), flags);
    }

    #[test]
    fn transition_mask_roundtrip() {
        let bits = EventTransitionBits::from_mask(0b101);
        assert!(bits.get(Transition::ToOffnormal));
        assert!(!bits.get(Transition::ToFault));
        assert!(bits.get(Transition::ToNormal));
        assert_eq!(bits.to_mask(), 0b101);
    }
}
