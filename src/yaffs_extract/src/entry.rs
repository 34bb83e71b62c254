use crate::config::Config;
use crate::error::YaffsError;
use crate::reader::Reader;
use crate::spare::SpareRecord;

pub const MAX_NAME_LEN: usize = 253;
pub const MAX_ALIAS_LEN: usize = 159;

/// Closed enumeration of on-disk object types (§3). Any wire value
/// outside `1..=5` decodes to `Unknown` rather than erroring — the
/// record is still emitted by the log parser, but the extractor skips
/// it during materialisation (§4.4's edge policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Unknown,
    File,
    Symlink,
    Directory,
    HardLink,
    Special,
}

impl ObjectType {
    pub fn from_wire(value: u32) -> ObjectType {
        match value {
            1 => ObjectType::File,
            2 => ObjectType::Symlink,
            3 => ObjectType::Directory,
            4 => ObjectType::HardLink,
            5 => ObjectType::Special,
            _ => ObjectType::Unknown,
        }
    }
}

/// A fully decoded header-page record (§3). `file_data` is populated
/// separately by the log parser as subsequent data pages are consumed;
/// it starts empty.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub obj_id: u32,
    pub obj_type: ObjectType,
    pub parent_obj_id: u32,
    pub name: Vec<u8>,

    pub yst_mode: u32,
    pub yst_uid: u32,
    pub yst_gid: u32,
    pub yst_atime: u32,
    pub yst_mtime: u32,
    pub yst_ctime: u32,

    pub file_size: u64,
    pub equiv_id: u32,
    pub alias: Vec<u8>,
    pub yst_rdev: u32,

    pub win_ctime_1: u32,
    pub win_ctime_2: u32,
    pub win_atime_1: u32,
    pub win_atime_2: u32,
    pub win_mtime_1: u32,
    pub win_mtime_2: u32,

    pub inband_shadowed_obj_id: u32,
    pub inband_is_shrink: u32,
    pub reserved: u8,
    pub shadows_obj: u32,
    pub is_shrink: u32,

    pub spare: SpareRecord,
    pub file_data: Vec<u8>,
}

/// §3's file size rule.
fn compute_file_size(file_size_low: u32, file_size_high: u32) -> u64 {
    if file_size_high != 0xFFFF_FFFF {
        ((file_size_high as u64) << 32) | file_size_low as u64
    } else if file_size_low != 0xFFFF_FFFF {
        file_size_low as u64
    } else {
        0
    }
}

impl ObjectRecord {
    /// Decodes a header page (`page_size` bytes) plus its already-parsed
    /// spare, at the fixed offsets given in §6's header table. Trailing
    /// page bytes beyond the last field are ignored.
    pub fn parse(page: &[u8], spare: SpareRecord, config: &Config) -> Result<ObjectRecord, YaffsError> {
        let mut r = Reader::new(page, config.endianness);

        let obj_type = ObjectType::from_wire(r.read_u32()?);
        let parent_obj_id = r.read_u32()?;
        let _sum_no_longer_used = r.read_u16()?;
        let name = r.take_cstr(MAX_NAME_LEN + 1)?;

        let _padding = r.read_u32()?; // 0xFFFFFFFF filler

        let yst_mode = r.read_u32()?;
        let yst_uid = r.read_u32()?;
        let yst_gid = r.read_u32()?;
        let yst_atime = r.read_u32()?;
        let yst_mtime = r.read_u32()?;
        let yst_ctime = r.read_u32()?;
        let file_size_low = r.read_u32()?;
        let equiv_id = r.read_u32()?;

        let alias = r.take_cstr(MAX_ALIAS_LEN + 1)?;

        let yst_rdev = r.read_u32()?;

        let win_ctime_1 = r.read_u32()?;
        let win_ctime_2 = r.read_u32()?;
        let win_atime_1 = r.read_u32()?;
        let win_atime_2 = r.read_u32()?;
        let win_mtime_1 = r.read_u32()?;
        let win_mtime_2 = r.read_u32()?;

        let inband_shadowed_obj_id = r.read_u32()?;
        let inband_is_shrink = r.read_u32()?;
        let file_size_high = r.read_u32()?;
        let reserved = r.read_u8()?;
        let shadows_obj = r.read_u32()?;
        let is_shrink = r.read_u32()?;

        if !name.is_empty() && !name.iter().all(|b| is_printable(*b)) {
            return Err(YaffsError::CorruptName {
                obj_id: spare.obj_id,
                name,
            });
        }

        let file_size = compute_file_size(file_size_low, file_size_high);

        Ok(ObjectRecord {
            obj_id: spare.obj_id,
            obj_type,
            parent_obj_id,
            name,
            yst_mode,
            yst_uid,
            yst_gid,
            yst_atime,
            yst_mtime,
            yst_ctime,
            file_size,
            equiv_id,
            alias,
            yst_rdev,
            win_ctime_1,
            win_ctime_2,
            win_atime_1,
            win_atime_2,
            win_mtime_1,
            win_mtime_2,
            inband_shadowed_obj_id,
            inband_is_shrink,
            reserved,
            shadows_obj,
            is_shrink,
            spare,
            file_data: Vec::new(),
        })
    }
}

/// Matches Python's `string.printable` (digits, ascii letters,
/// punctuation, and whitespace), which the original tool checks the
/// name against (§4.4, §9: name-only, not alias).
fn is_printable(byte: u8) -> bool {
    byte.is_ascii_graphic() || matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
