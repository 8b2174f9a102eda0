use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// Application tag numbers (ASHRAE 135 clause 20.2.1.4).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

impl AppTag {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        Ok(match value {
            0 => Self::Null,
            1 => Self::Boolean,
            2 => Self::UnsignedInt,
            3 => Self::SignedInt,
            4 => Self::Real,
            5 => Self::Double,
            6 => Self::OctetString,
            7 => Self::CharacterString,
            8 => Self::BitString,
            9 => Self::Enumerated,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::ObjectId,
            _ => return Err(DecodeError::InvalidTag),
        })
    }

    /// Name used in EPICS listings and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::UnsignedInt => "unsigned",
            Self::SignedInt => "signed",
            Self::Real => "real",
            Self::Double => "double",
            Self::OctetString => "octet-string",
            Self::CharacterString => "character-string",
            Self::BitString => "bit-string",
            Self::Enumerated => "enumerated",
            Self::Date => "date",
            Self::Time => "time",
            Self::ObjectId => "object-identifier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Application { tag: AppTag, len: u32 },
    Context { tag_num: u8, len: u32 },
    Opening { tag_num: u8 },
    Closing { tag_num: u8 },
}

const CLASS_CONTEXT: u8 = 0b0000_1000;
const EXTENDED_TAG: u8 = 0xF0;
const LVT_OPENING: u8 = 6;
const LVT_CLOSING: u8 = 7;
const LVT_EXTENDED: u8 = 5;

impl Tag {
    pub fn encode(self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Tag::Application { tag, len } => write_header(w, tag as u8, 0, len),
            Tag::Context { tag_num, len } => write_header(w, tag_num, CLASS_CONTEXT, len),
            Tag::Opening { tag_num } => write_marker(w, tag_num, LVT_OPENING),
            Tag::Closing { tag_num } => write_marker(w, tag_num, LVT_CLOSING),
        }
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let first = r.read_u8()?;
        let is_context = first & CLASS_CONTEXT != 0;
        let tag_num = match first >> 4 {
            0x0F => r.read_u8()?,
            n => n,
        };
        let lvt = first & 0x07;

        if is_context {
            return Ok(match lvt {
                LVT_OPENING => Tag::Opening { tag_num },
                LVT_CLOSING => Tag::Closing { tag_num },
                _ => Tag::Context {
                    tag_num,
                    len: read_len(r, lvt)?,
                },
            });
        }

        let tag = AppTag::from_u8(tag_num)?;
        // Booleans carry their value in the LVT field, not a length.
        let len = if tag == AppTag::Boolean {
            lvt as u32
        } else {
            read_len(r, lvt)?
        };
        Ok(Tag::Application { tag, len })
    }

    /// Decodes the next tag without consuming it.
    pub fn peek(r: &Reader<'_>) -> Result<Self, DecodeError> {
        let mut probe = *r;
        Self::decode(&mut probe)
    }
}

fn first_octet(w: &mut Writer<'_>, tag_num: u8, flags: u8) -> Result<(), EncodeError> {
    if tag_num <= 14 {
        w.write_u8((tag_num << 4) | flags)
    } else {
        w.write_u8(EXTENDED_TAG | flags)?;
        w.write_u8(tag_num)
    }
}

fn write_header(w: &mut Writer<'_>, tag_num: u8, class: u8, len: u32) -> Result<(), EncodeError> {
    if len <= 4 {
        return first_octet(w, tag_num, class | len as u8);
    }
    first_octet(w, tag_num, class | LVT_EXTENDED)?;
    match len {
        0..=253 => w.write_u8(len as u8),
        254..=65535 => {
            w.write_u8(254)?;
            w.write_be_u16(len as u16)
        }
        _ => {
            w.write_u8(255)?;
            w.write_be_u32(len)
        }
    }
}

fn write_marker(w: &mut Writer<'_>, tag_num: u8, lvt: u8) -> Result<(), EncodeError> {
    first_octet(w, tag_num, CLASS_CONTEXT | lvt)
}

fn read_len(r: &mut Reader<'_>, lvt: u8) -> Result<u32, DecodeError> {
    match lvt {
        0..=4 => Ok(lvt as u32),
        LVT_EXTENDED => match r.read_u8()? {
            254 => Ok(r.read_be_u16()? as u32),
            255 => r.read_be_u32(),
            v => Ok(v as u32),
        },
        _ => Err(DecodeError::InvalidLength),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppTag, Tag};
    use crate::encoding::{reader::Reader, writer::Writer};

    #[test]
    fn context_tag_with_extended_number_and_length() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        Tag::Context {
            tag_num: 30,
            len: 300,
        }
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0xFD, 30, 254, 0x01, 0x2C]);

        let mut r = Reader::new(w.as_written());
        assert_eq!(
            Tag::decode(&mut r).unwrap(),
            Tag::Context {
                tag_num: 30,
                len: 300
            }
        );
    }

    #[test]
    fn boolean_value_lives_in_lvt() {
        let mut r = Reader::new(&[0x11]);
        assert_eq!(
            Tag::decode(&mut r).unwrap(),
            Tag::Application {
                tag: AppTag::Boolean,
                len: 1
            }
        );
        assert!(r.is_empty());
    }

    #[test]
    fn peek_leaves_reader_untouched() {
        let r = Reader::new(&[0x0E, 0x0F]);
        assert_eq!(Tag::peek(&r).unwrap(), Tag::Opening { tag_num: 0 });
        assert_eq!(r.position(), 0);
    }
}
