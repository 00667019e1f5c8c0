//! Matroska reader errors.

use thiserror::Error;

/// Errors that can occur when reading Matroska files.
///
/// Every variant carries the absolute byte position in the source at which the
/// problem was detected. Variants that concern a single element also carry its raw ID.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// The file doesn't start with a valid EBML header.
    #[error("invalid EBML header at offset {position}: {reason}")]
    InvalidEbmlHeader {
        /// Offset of the offending byte.
        position: u64,
        /// What was wrong.
        reason: &'static str,
    },

    /// The DocType is neither "matroska" nor "webm".
    #[error("unsupported DocType {doc_type:?} at offset {position}")]
    UnsupportedDocType {
        /// Offset of the DocType element.
        position: u64,
        /// The DocType found in the file.
        doc_type: String,
    },

    /// The source ended while more data was required.
    #[error("unexpected end of stream at offset {position} while reading element 0x{id:X}")]
    ShortRead {
        /// Offset at which the data ran out.
        position: u64,
        /// The element that was being read. Zero while reading an element header.
        id: u32,
    },

    /// A variable length integer could not be decoded.
    #[error("malformed variable length integer at offset {position}")]
    MalformedVint {
        /// Offset of the first byte of the integer.
        position: u64,
    },

    /// An element is inconsistent with its definition or its parent.
    #[error("malformed element 0x{id:X} at offset {position}: {reason}")]
    MalformedElement {
        /// Offset of the element header.
        position: u64,
        /// The element ID.
        id: u32,
        /// What was wrong.
        reason: &'static str,
    },

    /// A SimpleBlock or Block header could not be decoded.
    #[error("malformed block at offset {position}: {reason}")]
    MalformedBlock {
        /// Offset of the block element.
        position: u64,
        /// What was wrong.
        reason: &'static str,
    },

    /// The lace header of a block is inconsistent with its payload.
    #[error("malformed lacing at offset {position}: {reason}")]
    MalformedLacing {
        /// Offset of the block element.
        position: u64,
        /// What was wrong.
        reason: &'static str,
    },

    /// Seeking was requested on a reader opened without seeking support.
    #[error("seeking is not supported by this reader (offset {position})")]
    SeekNotSupported {
        /// Reader position at the time of the request.
        position: u64,
    },

    /// Seeking was requested, but the file carries no cues.
    #[error("the file has no cues to seek with (offset {position})")]
    NoCues {
        /// Reader position at the time of the request.
        position: u64,
    },

    /// The reader failed before and refuses to reposition.
    #[error("the reader failed earlier and can't be used anymore (offset {position})")]
    ReaderFailed {
        /// Reader position at the time of the request.
        position: u64,
    },

    /// The byte source returned an error.
    #[error("I/O error at offset {position}")]
    Source {
        /// Reader position when the source failed.
        position: u64,
        /// The error of the source.
        #[source]
        source: std::io::Error,
    },
}

impl DemuxError {
    /// The absolute byte offset at which the error was detected.
    pub fn position(&self) -> u64 {
        match self {
            DemuxError::InvalidEbmlHeader { position, .. }
            | DemuxError::UnsupportedDocType { position, .. }
            | DemuxError::ShortRead { position, .. }
            | DemuxError::MalformedVint { position }
            | DemuxError::MalformedElement { position, .. }
            | DemuxError::MalformedBlock { position, .. }
            | DemuxError::MalformedLacing { position, .. }
            | DemuxError::SeekNotSupported { position }
            | DemuxError::NoCues { position }
            | DemuxError::ReaderFailed { position }
            | DemuxError::Source { position, .. } => *position,
        }
    }

    /// The raw ID of the element being parsed, if the error concerns a single element.
    pub fn element_id(&self) -> Option<u32> {
        match self {
            DemuxError::ShortRead { id, .. } if *id != 0 => Some(*id),
            DemuxError::MalformedElement { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DemuxError>;
