//! Stream byte format
//!
//! ```text
//! stream   := header value*
//! header   := MAGIC:u16 VERSION:u16
//! value    := NULL | BOOL u8 | INT i32 | LONG i64 | DOUBLE f64
//!           | STRING len:u32 utf8
//!           | SEQUENCE len:u32 value*
//!           | OBJECT class slot*
//!           | BACKREF handle:u32
//! class    := CLASS_DESC name:string flags:u8 count:u16 (name:string code:u8)* super
//!           | CLASS_REF index:u32
//! super    := class | NULL
//! slot     := value* END_SLOT
//! ```
//!
//! All integers are big-endian. `string` inside a class description is a
//! bare `len:u32 utf8` without the STRING tag.
//!
//! Object handles are assigned in first-emission order, starting at 0, as
//! soon as an OBJECT's class (or a SEQUENCE's length) has been written.
//! Class descriptors have their own index space and are numbered after
//! their supertype description is complete.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use keepsake_core::{Error, Result};
use std::io::{Read, Write};

/// Stream magic ("KS")
pub const STREAM_MAGIC: u16 = 0x4B53;

/// Current stream format version
pub const STREAM_FORMAT_VERSION: u16 = 1;

/// Size of the stream header in bytes
pub const STREAM_HEADER_SIZE: usize = 4;

/// Value and framing tags
pub mod tags {
    /// Null reference or string
    pub const NULL: u8 = 0x70;
    /// Boolean, followed by one byte
    pub const BOOL: u8 = 0x71;
    /// 32-bit integer
    pub const INT: u8 = 0x72;
    /// 64-bit integer
    pub const LONG: u8 = 0x73;
    /// 64-bit float
    pub const DOUBLE: u8 = 0x74;
    /// Length-prefixed UTF-8 string
    pub const STRING: u8 = 0x75;
    /// New object record
    pub const OBJECT: u8 = 0x76;
    /// New sequence object
    pub const SEQUENCE: u8 = 0x77;
    /// Back-reference to an earlier object
    pub const BACKREF: u8 = 0x78;
    /// New class description
    pub const CLASS_DESC: u8 = 0x79;
    /// Back-reference to an earlier class description
    pub const CLASS_REF: u8 = 0x7A;
    /// End of a class slot
    pub const END_SLOT: u8 = 0x7B;

    /// Readable name of a tag, for diagnostics
    pub fn name(tag: u8) -> &'static str {
        match tag {
            NULL => "NULL",
            BOOL => "BOOL",
            INT => "INT",
            LONG => "LONG",
            DOUBLE => "DOUBLE",
            STRING => "STRING",
            OBJECT => "OBJECT",
            SEQUENCE => "SEQUENCE",
            BACKREF => "BACKREF",
            CLASS_DESC => "CLASS_DESC",
            CLASS_REF => "CLASS_REF",
            END_SLOT => "END_SLOT",
            _ => "UNKNOWN",
        }
    }
}

/// Class description flags
pub mod flags {
    /// The class wrote its slot with a custom hook
    pub const SLOT_HOOK: u8 = 0x01;
    /// The class owns its entire encoding
    pub const EXTERNAL: u8 = 0x02;
    /// Every defined flag bit
    pub const ALL: u8 = SLOT_HOOK | EXTERNAL;
}

/// Stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Format version
    pub version: u16,
}

impl StreamHeader {
    /// Header for the current format version
    pub fn current() -> Self {
        StreamHeader {
            version: STREAM_FORMAT_VERSION,
        }
    }

    /// Write the header
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        out.write_u16::<BigEndian>(STREAM_MAGIC)?;
        out.write_u16::<BigEndian>(self.version)?;
        Ok(())
    }

    /// Read and validate a header
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let magic = input.read_u16::<BigEndian>().map_err(Error::from_read)?;
        if magic != STREAM_MAGIC {
            return Err(Error::corrupt(format!(
                "bad stream magic 0x{:04x}, expected 0x{:04x}",
                magic, STREAM_MAGIC
            )));
        }
        let version = input.read_u16::<BigEndian>().map_err(Error::from_read)?;
        if version != STREAM_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion { version });
        }
        Ok(StreamHeader { version })
    }
}
