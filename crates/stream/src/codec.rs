//! Field codec: primitives, strings and framing integers
//!
//! Every value in a stream starts with a one-byte tag from
//! [`tags`](crate::format::tags); the functions here write the tag together
//! with its payload, or read a payload once the caller has consumed the tag.

use crate::format::tags;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use keepsake_core::{Error, Result};
use std::io::{Read, Write};

pub(crate) fn write_tag<W: Write + ?Sized>(out: &mut W, tag: u8) -> Result<()> {
    out.write_u8(tag)?;
    Ok(())
}

pub(crate) fn write_u16<W: Write + ?Sized>(out: &mut W, value: u16) -> Result<()> {
    out.write_u16::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn write_u32<W: Write + ?Sized>(out: &mut W, value: u32) -> Result<()> {
    out.write_u32::<BigEndian>(value)?;
    Ok(())
}

/// Convert a length to its u32 prefix
pub(crate) fn length_prefix(what: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::LimitExceeded {
        what,
        limit: u32::MAX as usize,
        actual: len,
    })
}

/// Length-prefixed UTF-8 without a tag (class and field names)
pub(crate) fn write_name<W: Write + ?Sized>(out: &mut W, name: &str) -> Result<()> {
    write_u32(out, length_prefix("name", name.len())?)?;
    out.write_all(name.as_bytes())?;
    Ok(())
}

pub(crate) fn write_null<W: Write + ?Sized>(out: &mut W) -> Result<()> {
    write_tag(out, tags::NULL)
}

pub(crate) fn write_bool<W: Write + ?Sized>(out: &mut W, value: bool) -> Result<()> {
    write_tag(out, tags::BOOL)?;
    out.write_u8(u8::from(value))?;
    Ok(())
}

pub(crate) fn write_int<W: Write + ?Sized>(out: &mut W, value: i32) -> Result<()> {
    write_tag(out, tags::INT)?;
    out.write_i32::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn write_long<W: Write + ?Sized>(out: &mut W, value: i64) -> Result<()> {
    write_tag(out, tags::LONG)?;
    out.write_i64::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn write_double<W: Write + ?Sized>(out: &mut W, value: f64) -> Result<()> {
    write_tag(out, tags::DOUBLE)?;
    out.write_f64::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn write_string<W: Write + ?Sized>(out: &mut W, value: &str) -> Result<()> {
    write_tag(out, tags::STRING)?;
    write_name(out, value)
}

pub(crate) fn read_u8<R: Read + ?Sized>(input: &mut R) -> Result<u8> {
    input.read_u8().map_err(Error::from_read)
}

/// Read the next tag, or `None` when the input ends cleanly before it
pub(crate) fn read_tag_or_eof<R: Read + ?Sized>(input: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

pub(crate) fn read_u16<R: Read + ?Sized>(input: &mut R) -> Result<u16> {
    input.read_u16::<BigEndian>().map_err(Error::from_read)
}

pub(crate) fn read_u32<R: Read + ?Sized>(input: &mut R) -> Result<u32> {
    input.read_u32::<BigEndian>().map_err(Error::from_read)
}

pub(crate) fn read_bool<R: Read + ?Sized>(input: &mut R) -> Result<bool> {
    match read_u8(input)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::corrupt(format!("invalid bool byte 0x{:02x}", other))),
    }
}

pub(crate) fn read_int<R: Read + ?Sized>(input: &mut R) -> Result<i32> {
    input.read_i32::<BigEndian>().map_err(Error::from_read)
}

pub(crate) fn read_long<R: Read + ?Sized>(input: &mut R) -> Result<i64> {
    input.read_i64::<BigEndian>().map_err(Error::from_read)
}

pub(crate) fn read_double<R: Read + ?Sized>(input: &mut R) -> Result<f64> {
    input.read_f64::<BigEndian>().map_err(Error::from_read)
}

/// Read a length-prefixed UTF-8 payload, enforcing `max_len` before allocating
pub(crate) fn read_name<R: Read + ?Sized>(input: &mut R, max_len: usize) -> Result<String> {
    let len = read_u32(input)? as usize;
    if len > max_len {
        return Err(Error::LimitExceeded {
            what: "string",
            limit: max_len,
            actual: len,
        });
    }
    let mut bytes = Vec::with_capacity(len.min(64 * 1024));
    Read::take(&mut *input, len as u64)
        .read_to_end(&mut bytes)
        .map_err(Error::from_read)?;
    if bytes.len() != len {
        return Err(Error::corrupt(format!(
            "string truncated: expected {} bytes, found {}",
            len,
            bytes.len()
        )));
    }
    String::from_utf8(bytes).map_err(|e| Error::corrupt(format!("invalid UTF-8: {}", e)))
}
