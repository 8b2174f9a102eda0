use alloc::vec::Vec;

/// An owned BACnet bit string; bit 0 is the most significant bit of the
/// first octet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitString {
    pub unused_bits: u8,
    pub data: Vec<u8>,
}

impl BitString {
    pub fn new(unused_bits: u8, data: Vec<u8>) -> Self {
        Self { unused_bits, data }
    }

    pub fn from_bits(bits: &[bool]) -> Self {
        let mut data = alloc::vec![0u8; bits.len().div_ceil(8)];
        for (i, bit) in bits.iter().enumerate() {
            if *bit {
                data[i / 8] |= 0x80 >> (i % 8);
            }
        }
        let unused_bits = (data.len() * 8 - bits.len()) as u8;
        Self { unused_bits, data }
    }

    pub fn len(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.unused_bits as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bit `index`; bits beyond the used length read as `false`.
    pub fn bit(&self, index: usize) -> bool {
        index < self.len() && self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|i| self.bit(i))
    }
}
