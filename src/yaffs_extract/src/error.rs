use thiserror::Error;

/// Fatal errors. Anything that reaches here aborts the whole run (§7):
/// subsequent bytes in the image can no longer be trusted once one of
/// these fires.
#[derive(Debug, Error)]
pub enum YaffsError {
    #[error("unexpected end of image at offset {at}, needed {need} more byte(s)")]
    UnexpectedEof { at: u64, need: usize },

    #[error("geometry detection failed: {0}")]
    DetectionFailed(&'static str),

    #[error("object #{obj_id} has a corrupt (non-printable) name: {name:?}")]
    CorruptName { obj_id: u32, name: Vec<u8> },

    #[error("file '{name}' (object #{obj_id}) has size {size} but only {remaining} byte(s) remain in the image")]
    OversizeFile {
        obj_id: u32,
        name: String,
        size: u64,
        remaining: u64,
    },

    #[error("failed to open input image '{path}': {source}")]
    ImageOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory '{path}': {source}")]
    OutputDirCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
