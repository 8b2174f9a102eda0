use crate::encoding::{
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::types::{Date, Time};
use crate::{DecodeError, EncodeError};

/// Minimal big-endian width of an unsigned value (1..=4 octets).
pub const fn unsigned_len(value: u32) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Minimal two's-complement width of a signed value (1..=4 octets).
pub const fn signed_len(value: i32) -> usize {
    match value {
        -128..=127 => 1,
        -32_768..=32_767 => 2,
        -8_388_608..=8_388_607 => 3,
        _ => 4,
    }
}

pub fn encode_unsigned(w: &mut Writer<'_>, value: u32) -> Result<usize, EncodeError> {
    let len = unsigned_len(value);
    w.write_all(&value.to_be_bytes()[4 - len..])?;
    Ok(len)
}

pub fn decode_unsigned(r: &mut Reader<'_>, len: usize) -> Result<u32, DecodeError> {
    if !(1..=4).contains(&len) {
        return Err(DecodeError::InvalidLength);
    }
    let mut out = [0u8; 4];
    out[4 - len..].copy_from_slice(r.read_exact(len)?);
    Ok(u32::from_be_bytes(out))
}

pub fn encode_signed(w: &mut Writer<'_>, value: i32) -> Result<usize, EncodeError> {
    let len = signed_len(value);
    w.write_all(&value.to_be_bytes()[4 - len..])?;
    Ok(len)
}

pub fn decode_signed(r: &mut Reader<'_>, len: usize) -> Result<i32, DecodeError> {
    if !(1..=4).contains(&len) {
        return Err(DecodeError::InvalidLength);
    }
    let bytes = r.read_exact(len)?;
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut out = [fill; 4];
    out[4 - len..].copy_from_slice(bytes);
    Ok(i32::from_be_bytes(out))
}

fn encode_unsigned_tagged(w: &mut Writer<'_>, tag: Tag, value: u32) -> Result<(), EncodeError> {
    tag.encode(w)?;
    encode_unsigned(w, value).map(|_| ())
}

pub fn encode_app_unsigned(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_len(value) as u32;
    encode_unsigned_tagged(
        w,
        Tag::Application {
            tag: AppTag::UnsignedInt,
            len,
        },
        value,
    )
}

pub fn encode_app_enumerated(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_len(value) as u32;
    encode_unsigned_tagged(
        w,
        Tag::Application {
            tag: AppTag::Enumerated,
            len,
        },
        value,
    )
}

pub fn encode_app_signed(w: &mut Writer<'_>, value: i32) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::SignedInt,
        len: signed_len(value) as u32,
    }
    .encode(w)?;
    encode_signed(w, value).map(|_| ())
}

pub fn encode_app_date(w: &mut Writer<'_>, date: Date) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::Date,
        len: 4,
    }
    .encode(w)?;
    w.write_all(&date.to_octets())
}

pub fn encode_app_time(w: &mut Writer<'_>, time: Time) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::Time,
        len: 4,
    }
    .encode(w)?;
    w.write_all(&time.to_octets())
}

pub fn encode_ctx_unsigned(w: &mut Writer<'_>, tag_num: u8, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_len(value) as u32;
    encode_unsigned_tagged(w, Tag::Context { tag_num, len }, value)
}

pub fn encode_ctx_object_id(w: &mut Writer<'_>, tag_num: u8, raw: u32) -> Result<(), EncodeError> {
    Tag::Context { tag_num, len: 4 }.encode(w)?;
    w.write_be_u32(raw)
}

pub fn encode_opening_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Opening { tag_num }.encode(w)
}

pub fn encode_closing_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Closing { tag_num }.encode(w)
}

pub fn decode_app_date(r: &mut Reader<'_>) -> Result<Date, DecodeError> {
    match Tag::decode(r)? {
        Tag::Application {
            tag: AppTag::Date,
            len: 4,
        } => Ok(Date::from_octets(r.read_array()?)),
        _ => Err(DecodeError::InvalidTag),
    }
}

pub fn decode_app_time(r: &mut Reader<'_>) -> Result<Time, DecodeError> {
    match Tag::decode(r)? {
        Tag::Application {
            tag: AppTag::Time,
            len: 4,
        } => Ok(Time::from_octets(r.read_array()?)),
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Decodes a context-tagged unsigned value carrying `expected` as its tag number.
pub fn decode_ctx_unsigned(r: &mut Reader<'_>, expected: u8) -> Result<u32, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num, len } if tag_num == expected => decode_unsigned(r, len as usize),
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Like [`decode_ctx_unsigned`], but leaves the reader untouched when the
/// next tag is something else.
pub fn decode_optional_ctx_unsigned(
    r: &mut Reader<'_>,
    expected: u8,
) -> Result<Option<u32>, DecodeError> {
    if r.is_empty() {
        return Ok(None);
    }
    match Tag::peek(r)? {
        Tag::Context { tag_num, .. } if tag_num == expected => {
            decode_ctx_unsigned(r, expected).map(Some)
        }
        _ => Ok(None),
    }
}

pub fn expect_opening_tag(r: &mut Reader<'_>, tag_num: u8) -> Result<(), DecodeError> {
    if Tag::decode(r)? == (Tag::Opening { tag_num }) {
        Ok(())
    } else {
        Err(DecodeError::InvalidTag)
    }
}

pub fn expect_closing_tag(r: &mut Reader<'_>, tag_num: u8) -> Result<(), DecodeError> {
    if Tag::decode(r)? == (Tag::Closing { tag_num }) {
        Ok(())
    } else {
        Err(DecodeError::InvalidTag)
    }
}
