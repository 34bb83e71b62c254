/// Byte order of multi-byte integer fields in the image. The image's
/// endianness is a single global property (§3); there is no per-field
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Little
    }
}

impl std::str::FromStr for Endianness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().chars().next() {
            Some('b') => Ok(Endianness::Big),
            Some('l') => Ok(Endianness::Little),
            _ => Err(format!("invalid endianness: {s:?} (expected \"big\" or \"little\")")),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 2048;
pub const DEFAULT_SPARE_SIZE: u32 = 64;

/// Page sizes accepted both as explicit configuration and as candidates
/// during auto-detection (§3, §4.2).
pub const VALID_PAGE_SIZES: &[u32] = &[512, 1024, 2048, 4096, 8192, 16384];

/// Immutable geometry and extraction policy, fixed before parsing begins
/// (§3: "Geometry is immutable after detection").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endianness: Endianness,
    pub page_size: u32,
    pub spare_size: u32,
    pub ecc_layout: bool,
    pub preserve_mode: bool,
    pub preserve_owner: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endianness: Endianness::Little,
            page_size: DEFAULT_PAGE_SIZE,
            spare_size: DEFAULT_SPARE_SIZE,
            ecc_layout: true,
            preserve_mode: true,
            preserve_owner: false,
            debug: false,
        }
    }
}

/// `spare_size ∈ { page_size / 32 | page_size valid }` sanity set (§3).
/// Not a hard constraint on pairing a given page size with its own
/// quotient — any combination drawn from the set is accepted.
pub fn plausible_spare_size(spare_size: u32) -> bool {
    VALID_PAGE_SIZES.iter().any(|p| p / 32 == spare_size)
}
