use crate::config::{plausible_spare_size, Config, Endianness, VALID_PAGE_SIZES};
use crate::error::YaffsError;

/// Sample size fed to detection: enough to cover every page size in
/// [`VALID_PAGE_SIZES`] up to 8192 bytes (§4.2). 16384-byte pages are
/// out of reach of a 10 KiB sample; callers wanting to support them must
/// supply a larger sample to [`detect`].
pub const SAMPLE_SIZE: usize = 10 * 1024;

const SPARE_START_LE_ECC: &[u8] = &[0x00, 0x10, 0x00, 0x00];
const SPARE_START_LE_NO_ECC: &[u8] = &[0xFF, 0xFF, 0x00, 0x10, 0x00, 0x00];
const SPARE_START_BE_ECC: &[u8] = &[0x00, 0x00, 0x10, 0x00];
const SPARE_START_BE_NO_ECC: &[u8] = &[0xFF, 0xFF, 0x00, 0x00, 0x10, 0x00];

struct Signature {
    bytes: &'static [u8],
    endianness: Endianness,
    ecc_layout: bool,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        bytes: SPARE_START_LE_ECC,
        endianness: Endianness::Little,
        ecc_layout: true,
    },
    Signature {
        bytes: SPARE_START_LE_NO_ECC,
        endianness: Endianness::Little,
        ecc_layout: false,
    },
    Signature {
        bytes: SPARE_START_BE_ECC,
        endianness: Endianness::Big,
        ecc_layout: true,
    },
    Signature {
        bytes: SPARE_START_BE_NO_ECC,
        endianness: Endianness::Big,
        ecc_layout: false,
    },
];

/// Detects page size, endianness, and ECC layout from a raw sample of
/// the image's leading bytes, then derives the spare size (§4.2).
///
/// `sample` should be at least `max_page_size + max_spare_size + 4`
/// bytes; [`SAMPLE_SIZE`] suffices for page sizes up to 8192.
pub fn detect(sample: &[u8]) -> Result<Config, YaffsError> {
    let (page_size, endianness, ecc_layout) = detect_spare_start(sample)?;
    let spare_size = detect_spare_size(sample, page_size, ecc_layout)?;

    Ok(Config {
        endianness,
        page_size,
        spare_size,
        ecc_layout,
        ..Config::default()
    })
}

fn detect_spare_start(sample: &[u8]) -> Result<(u32, Endianness, bool), YaffsError> {
    for &page_size in VALID_PAGE_SIZES {
        let start = page_size as usize;
        if start > sample.len() {
            continue;
        }
        let tail = &sample[start..];
        for sig in SIGNATURES {
            if tail.starts_with(sig.bytes) {
                return Ok((page_size, sig.endianness, sig.ecc_layout));
            }
        }
    }
    Err(YaffsError::DetectionFailed("spare start"))
}

fn detect_spare_size(sample: &[u8], page_size: u32, ecc_layout: bool) -> Result<u32, YaffsError> {
    let offset = if ecc_layout { 4 } else { 6 };
    let p = page_size as usize;

    let sig_start = p + offset;
    if sig_start + 4 > sample.len() {
        return Err(YaffsError::DetectionFailed("spare end"));
    }

    let mut trailer = sample[sig_start..sig_start + 4].to_vec();
    trailer.extend_from_slice(&[0xFF, 0xFF]);

    let haystack = &sample[p..];
    let index = find_subslice(haystack, &trailer).ok_or(YaffsError::DetectionFailed("spare end"))?;

    let spare_size = index
        .checked_sub(4)
        .ok_or(YaffsError::DetectionFailed("spare end"))? as u32;

    if !plausible_spare_size(spare_size) {
        return Err(YaffsError::DetectionFailed("implausible spare size"));
    }

    Ok(spare_size)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
