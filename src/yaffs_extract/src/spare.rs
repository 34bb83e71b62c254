use crate::config::Config;
use crate::error::YaffsError;
use crate::reader::Reader;

/// Decoded out-of-band (spare) area attached to every page (§3, §4.3).
///
/// `chunk_id == 0` marks a header page; `chunk_id > 0` marks a data page
/// belonging to the file with the given `obj_id`. The log parser does
/// not actually rely on `chunk_id`'s value for sequencing (§4.5) — it is
/// kept here purely for fidelity with the on-disk structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpareRecord {
    pub chunk_id: u32,
    pub obj_id: u32,
}

impl SpareRecord {
    /// Decodes a `spare_size`-byte slice. When ECC layout is disabled, a
    /// 2-byte junk prefix (possibly a vestigial CRC slot) is skipped
    /// first. Trailing bytes in the spare are ignored (§4.3).
    pub fn parse(spare: &[u8], config: &Config) -> Result<SpareRecord, YaffsError> {
        let mut reader = Reader::new(spare, config.endianness);
        if !config.ecc_layout {
            reader.read_bytes(2)?;
        }
        let chunk_id = reader.read_u32()?;
        let obj_id = reader.read_u32()?;
        Ok(SpareRecord { chunk_id, obj_id })
    }
}
