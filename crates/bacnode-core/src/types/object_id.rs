use crate::types::ObjectType;
use core::fmt;

/// Highest instance number a real object may use.
pub const BACNET_MAX_INSTANCE: u32 = 0x3F_FFFE;
/// Instance value meaning "any instance" / "next free instance".
pub const BACNET_WILDCARD_INSTANCE: u32 = 0x3F_FFFF;

/// A packed BACnet object identifier: 10-bit object type, 22-bit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self((((object_type.to_u16() as u32) & 0x03FF) << 22) | (instance & 0x3F_FFFF))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16(((self.0 >> 22) & 0x03FF) as u16)
    }

    pub const fn instance(self) -> u32 {
        self.0 & 0x3F_FFFF
    }
}

/// EPICS notation: `(analog-output,1)`.
impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.object_type(), self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectId;
    use crate::types::ObjectType;
    use alloc::string::ToString;

    #[test]
    fn packs_type_and_instance() {
        let id = ObjectId::new(ObjectType::Schedule, 0x12345);
        assert_eq!(id.raw(), (17 << 22) | 0x12345);
        assert_eq!(id.object_type(), ObjectType::Schedule);
        assert_eq!(id.instance(), 0x12345);
    }

    #[test]
    fn displays_like_epics() {
        let id = ObjectId::new(ObjectType::MultiStateInput, 4);
        assert_eq!(id.to_string(), "(multi-state-input,4)");
    }
}
