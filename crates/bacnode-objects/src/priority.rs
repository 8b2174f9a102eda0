//! The 16-slot command priority array shared by every commandable object.

use crate::PropertyError;

pub const BACNET_MIN_PRIORITY: u8 = 1;
pub const BACNET_MAX_PRIORITY: u8 = 16;
/// Reported as the current command priority when every slot is relinquished.
pub const BACNET_NO_PRIORITY: u8 = 0;
/// Minimum on/off priority; never written through WriteProperty.
pub const BACNET_MIN_ON_OFF_PRIORITY: u8 = 6;

const SLOTS: usize = BACNET_MAX_PRIORITY as usize;

/// Priority slots; slot 0 holds priority 1. `None` means relinquished.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityArray<T> {
    slots: [Option<T>; SLOTS],
}

impl<T> Default for PriorityArray<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

fn slot_index(priority: u8) -> Result<usize, PropertyError> {
    if (BACNET_MIN_PRIORITY..=BACNET_MAX_PRIORITY).contains(&priority) {
        Ok(priority as usize - 1)
    } else {
        Err(PropertyError::ValueOutOfRange)
    }
}

impl<T: Clone> PriorityArray<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, priority: u8, value: T) -> Result<(), PropertyError> {
        self.slots[slot_index(priority)?] = Some(value);
        Ok(())
    }

    pub fn relinquish(&mut self, priority: u8) -> Result<(), PropertyError> {
        self.slots[slot_index(priority)?] = None;
        Ok(())
    }

    pub fn relinquish_all(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Value commanded at `priority`, if any.
    pub fn slot(&self, priority: u8) -> Option<&T> {
        slot_index(priority)
            .ok()
            .and_then(|index| self.slots[index].as_ref())
    }

    /// Highest-precedence active slot and its 1-based priority.
    pub fn active(&self) -> Option<(u8, &T)> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| slot.as_ref().map(|value| (index as u8 + 1, value)))
    }

    pub fn active_priority(&self) -> u8 {
        self.active()
            .map_or(BACNET_NO_PRIORITY, |(priority, _)| priority)
    }

    /// Effective value: the first active slot, else `relinquish_default`.
    pub fn resolve(&self, relinquish_default: &T) -> T {
        self.active()
            .map_or_else(|| relinquish_default.clone(), |(_, value)| value.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// True when no slot is commanded.
    pub fn is_relinquished(&self) -> bool {
        self.active().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{PriorityArray, BACNET_MAX_PRIORITY, BACNET_NO_PRIORITY};
    use crate::PropertyError;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn highest_precedence_slot_wins(
            writes in proptest::collection::vec((1u8..=16, any::<i16>()), 1..12)
        ) {
            let mut array = PriorityArray::new();
            for (priority, value) in &writes {
                array.set(*priority, *value).unwrap();
            }
            let winner = writes.iter().map(|(p, _)| *p).min().unwrap();
            let last_at_winner = writes
                .iter()
                .rev()
                .find(|(p, _)| *p == winner)
                .map(|(_, v)| *v)
                .unwrap();
            prop_assert_eq!(array.active_priority(), winner);
            prop_assert_eq!(array.resolve(&0), last_at_winner);
        }
    }

    #[test]
    fn empty_array_falls_back_to_default() {
        let mut array = PriorityArray::new();
        assert_eq!(array.resolve(&7.5f32), 7.5);
        assert_eq!(array.active_priority(), BACNET_NO_PRIORITY);

        array.set(BACNET_MAX_PRIORITY, 1.0).unwrap();
        assert_eq!(array.resolve(&7.5), 1.0);
        array.relinquish(BACNET_MAX_PRIORITY).unwrap();
        assert_eq!(array.resolve(&7.5), 7.5);
        assert!(array.is_relinquished());
    }

    #[test]
    fn priorities_outside_the_array_are_rejected() {
        let mut array = PriorityArray::new();
        assert_eq!(array.set(0, 1u32), Err(PropertyError::ValueOutOfRange));
        assert_eq!(array.set(17, 1u32), Err(PropertyError::ValueOutOfRange));
        assert_eq!(array.relinquish(17), Err(PropertyError::ValueOutOfRange));
        assert_eq!(array.slot(0), None);
    }
}
