use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::config::Endianness;
use crate::error::YaffsError;

/// Bounded, endianness-aware cursor over a borrowed image (§4.1).
///
/// Unlike the teacher's `BufReaderExtension`, which stores its cursor
/// inside a `BufReader<File>` instance, this reader is a small by-value
/// struct carried explicitly by its callers (§9: "avoid hidden per-object
/// cursors").
pub struct Reader<'a> {
    data: &'a [u8],
    endianness: Endianness,
    cursor: u64,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Reader {
            data,
            endianness,
            cursor: 0,
        }
    }

    pub fn at(data: &'a [u8], endianness: Endianness, cursor: u64) -> Self {
        Reader {
            data,
            endianness,
            cursor,
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    pub fn seek(&mut self, position: u64) {
        self.cursor = position;
    }

    pub fn remaining(&self) -> u64 {
        (self.data.len() as u64).saturating_sub(self.cursor)
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn slice(&mut self, n: usize) -> Result<&'a [u8], YaffsError> {
        let start = self.cursor as usize;
        let end = start.checked_add(n).ok_or(YaffsError::UnexpectedEof {
            at: self.cursor,
            need: n,
        })?;
        if end > self.data.len() {
            return Err(YaffsError::UnexpectedEof {
                at: self.cursor,
                need: n,
            });
        }
        self.cursor += n as u64;
        Ok(&self.data[start..end])
    }

    pub fn read_u8(&mut self) -> Result<u8, YaffsError> {
        Ok(self.slice(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, YaffsError> {
        let bytes = self.slice(2)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u16(bytes),
            Endianness::Big => BigEndian::read_u16(bytes),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, YaffsError> {
        let bytes = self.slice(4)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u32(bytes),
            Endianness::Big => BigEndian::read_u32(bytes),
        })
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], YaffsError> {
        self.slice(n)
    }

    /// Reads exactly `max_len` bytes, then truncates at the first
    /// `0x00`. The unread padding tail is still consumed from the
    /// cursor's perspective (§4.1).
    pub fn take_cstr(&mut self, max_len: usize) -> Result<Vec<u8>, YaffsError> {
        let bytes = self.slice(max_len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(bytes[..end].to_vec())
    }
}
