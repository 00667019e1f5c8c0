//! Element IDs defined by the EBML and Matroska specifications.
//!
//! The registry below is the grammar the structural parser is driven by: every
//! known ID maps to a symbolic [`ElementId`] and to the [`ElementType`] that
//! decides whether the element is read as a typed leaf, recursed into, or kept
//! as raw bytes. IDs that are not listed are skipped by size.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The supported Element ID.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum ElementId {
    Unknown,
    Ebml,
    EbmlVersion,
    EbmlReadVersion,
    EbmlMaxIdLength,
    EbmlMaxSizeLength,
    DocType,
    DocTypeVersion,
    DocTypeReadVersion,
    Void,
    Crc32,
    Segment,
    SeekHead,
    Seek,
    SeekId,
    SeekPosition,
    Info,
    SegmentUid,
    SegmentFilename,
    PrevUid,
    PrevFilename,
    NextUid,
    NextFilename,
    TimestampScale,
    Duration,
    DateUtc,
    Title,
    MuxingApp,
    WritingApp,
    Cluster,
    Timestamp,
    Position,
    PrevSize,
    SimpleBlock,
    BlockGroup,
    Block,
    BlockAdditions,
    BlockDuration,
    ReferencePriority,
    ReferenceBlock,
    CodecState,
    DiscardPadding,
    Tracks,
    TrackEntry,
    TrackNumber,
    TrackUid,
    TrackType,
    FlagEnabled,
    FlagDefault,
    FlagForced,
    FlagLacing,
    MinCache,
    MaxCache,
    DefaultDuration,
    MaxBlockAdditionId,
    Name,
    Language,
    LanguageIetf,
    CodecId,
    CodecPrivate,
    CodecName,
    CodecDelay,
    SeekPreRoll,
    Video,
    FlagInterlaced,
    StereoMode,
    AlphaMode,
    PixelWidth,
    PixelHeight,
    PixelCropBottom,
    PixelCropTop,
    PixelCropLeft,
    PixelCropRight,
    DisplayWidth,
    DisplayHeight,
    DisplayUnit,
    ColourSpace,
    Audio,
    SamplingFrequency,
    OutputSamplingFrequency,
    Channels,
    BitDepth,
    ContentEncodings,
    ContentEncoding,
    ContentEncodingOrder,
    ContentEncodingScope,
    ContentEncodingType,
    ContentCompression,
    ContentCompAlgo,
    ContentCompSettings,
    ContentEncryption,
    ContentEncAlgo,
    ContentEncKeyId,
    ContentSignature,
    ContentSigKeyId,
    ContentSigAlgo,
    ContentSigHashAlgo,
    Cues,
    CuePoint,
    CueTime,
    CueTrackPositions,
    CueTrack,
    CueClusterPosition,
    CueRelativePosition,
    CueDuration,
    CueBlockNumber,
    Attachments,
    AttachedFile,
    FileDescription,
    FileName,
    FileMimeType,
    FileData,
    FileUid,
    Chapters,
    EditionEntry,
    EditionUid,
    EditionFlagHidden,
    EditionFlagDefault,
    EditionFlagOrdered,
    ChapterAtom,
    ChapterUid,
    ChapterStringUid,
    ChapterTimeStart,
    ChapterTimeEnd,
    ChapterFlagHidden,
    ChapterFlagEnabled,
    ChapterSegmentUid,
    ChapterTrack,
    ChapterTrackUid,
    ChapterDisplay,
    ChapString,
    ChapLanguage,
    ChapLanguageIetf,
    ChapCountry,
    Tags,
    Tag,
    Targets,
    TargetTypeValue,
    TargetType,
    TagTrackUid,
    TagEditionUid,
    TagChapterUid,
    TagAttachmentUid,
    SimpleTag,
    TagName,
    TagLanguage,
    TagDefault,
    TagString,
    TagBinary,
}

/// The types of elements a EBML file can have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ElementType {
    /// An element that contains other EBML elements as children.
    Master,
    /// Unsigned integer.
    Unsigned,
    /// Signed integer.
    Signed,
    /// Float.
    Float,
    /// Nanoseconds since 2001-01-01T00:00:00 UTC.
    Date,
    /// UTF-8 or ASCII string.
    String,
    /// Binary.
    Binary,
    /// Known, but never interpreted. Skipped by size.
    Skip,
}

use ElementType::*;

#[rustfmt::skip]
const REGISTRY: &[(u32, ElementId, ElementType)] = &[
    (0x1A45DFA3, ElementId::Ebml, Master),
    (0x4286, ElementId::EbmlVersion, Unsigned),
    (0x42F7, ElementId::EbmlReadVersion, Unsigned),
    (0x42F2, ElementId::EbmlMaxIdLength, Unsigned),
    (0x42F3, ElementId::EbmlMaxSizeLength, Unsigned),
    (0x4282, ElementId::DocType, String),
    (0x4287, ElementId::DocTypeVersion, Unsigned),
    (0x4285, ElementId::DocTypeReadVersion, Unsigned),
    (0xEC, ElementId::Void, Skip),
    (0xBF, ElementId::Crc32, Skip),
    (0x18538067, ElementId::Segment, Master),
    (0x114D9B74, ElementId::SeekHead, Master),
    (0x4DBB, ElementId::Seek, Master),
    (0x53AB, ElementId::SeekId, Binary),
    (0x53AC, ElementId::SeekPosition, Unsigned),
    (0x1549A966, ElementId::Info, Master),
    (0x73A4, ElementId::SegmentUid, Binary),
    (0x7384, ElementId::SegmentFilename, String),
    (0x3CB923, ElementId::PrevUid, Binary),
    (0x3C83AB, ElementId::PrevFilename, String),
    (0x3EB923, ElementId::NextUid, Binary),
    (0x3E83BB, ElementId::NextFilename, String),
    (0x2AD7B1, ElementId::TimestampScale, Unsigned),
    (0x4489, ElementId::Duration, Float),
    (0x4461, ElementId::DateUtc, Date),
    (0x7BA9, ElementId::Title, String),
    (0x4D80, ElementId::MuxingApp, String),
    (0x5741, ElementId::WritingApp, String),
    (0x1F43B675, ElementId::Cluster, Master),
    (0xE7, ElementId::Timestamp, Unsigned),
    (0xA7, ElementId::Position, Unsigned),
    (0xAB, ElementId::PrevSize, Unsigned),
    (0xA3, ElementId::SimpleBlock, Binary),
    (0xA0, ElementId::BlockGroup, Master),
    (0xA1, ElementId::Block, Binary),
    (0x75A1, ElementId::BlockAdditions, Skip),
    (0x9B, ElementId::BlockDuration, Unsigned),
    (0xFA, ElementId::ReferencePriority, Unsigned),
    (0xFB, ElementId::ReferenceBlock, Signed),
    (0xA4, ElementId::CodecState, Binary),
    (0x75A2, ElementId::DiscardPadding, Signed),
    (0x1654AE6B, ElementId::Tracks, Master),
    (0xAE, ElementId::TrackEntry, Master),
    (0xD7, ElementId::TrackNumber, Unsigned),
    (0x73C5, ElementId::TrackUid, Unsigned),
    (0x83, ElementId::TrackType, Unsigned),
    (0xB9, ElementId::FlagEnabled, Unsigned),
    (0x88, ElementId::FlagDefault, Unsigned),
    (0x55AA, ElementId::FlagForced, Unsigned),
    (0x9C, ElementId::FlagLacing, Unsigned),
    (0x6DE7, ElementId::MinCache, Unsigned),
    (0x6DF8, ElementId::MaxCache, Unsigned),
    (0x23E383, ElementId::DefaultDuration, Unsigned),
    (0x55EE, ElementId::MaxBlockAdditionId, Unsigned),
    (0x536E, ElementId::Name, String),
    (0x22B59C, ElementId::Language, String),
    (0x22B59D, ElementId::LanguageIetf, String),
    (0x86, ElementId::CodecId, String),
    (0x63A2, ElementId::CodecPrivate, Binary),
    (0x258688, ElementId::CodecName, String),
    (0x56AA, ElementId::CodecDelay, Unsigned),
    (0x56BB, ElementId::SeekPreRoll, Unsigned),
    (0xE0, ElementId::Video, Master),
    (0x9A, ElementId::FlagInterlaced, Unsigned),
    (0x53B8, ElementId::StereoMode, Unsigned),
    (0x53C0, ElementId::AlphaMode, Unsigned),
    (0xB0, ElementId::PixelWidth, Unsigned),
    (0xBA, ElementId::PixelHeight, Unsigned),
    (0x54AA, ElementId::PixelCropBottom, Unsigned),
    (0x54BB, ElementId::PixelCropTop, Unsigned),
    (0x54CC, ElementId::PixelCropLeft, Unsigned),
    (0x54DD, ElementId::PixelCropRight, Unsigned),
    (0x54B0, ElementId::DisplayWidth, Unsigned),
    (0x54BA, ElementId::DisplayHeight, Unsigned),
    (0x54B2, ElementId::DisplayUnit, Unsigned),
    (0x2EB524, ElementId::ColourSpace, Binary),
    (0xE1, ElementId::Audio, Master),
    (0xB5, ElementId::SamplingFrequency, Float),
    (0x78B5, ElementId::OutputSamplingFrequency, Float),
    (0x9F, ElementId::Channels, Unsigned),
    (0x6264, ElementId::BitDepth, Unsigned),
    (0x6D80, ElementId::ContentEncodings, Master),
    (0x6240, ElementId::ContentEncoding, Master),
    (0x5031, ElementId::ContentEncodingOrder, Unsigned),
    (0x5032, ElementId::ContentEncodingScope, Unsigned),
    (0x5033, ElementId::ContentEncodingType, Unsigned),
    (0x5034, ElementId::ContentCompression, Master),
    (0x4254, ElementId::ContentCompAlgo, Unsigned),
    (0x4255, ElementId::ContentCompSettings, Binary),
    (0x5035, ElementId::ContentEncryption, Master),
    (0x47E1, ElementId::ContentEncAlgo, Unsigned),
    (0x47E2, ElementId::ContentEncKeyId, Binary),
    (0x47E3, ElementId::ContentSignature, Binary),
    (0x47E4, ElementId::ContentSigKeyId, Binary),
    (0x47E5, ElementId::ContentSigAlgo, Unsigned),
    (0x47E6, ElementId::ContentSigHashAlgo, Unsigned),
    (0x1C53BB6B, ElementId::Cues, Master),
    (0xBB, ElementId::CuePoint, Master),
    (0xB3, ElementId::CueTime, Unsigned),
    (0xB7, ElementId::CueTrackPositions, Master),
    (0xF7, ElementId::CueTrack, Unsigned),
    (0xF1, ElementId::CueClusterPosition, Unsigned),
    (0xF0, ElementId::CueRelativePosition, Unsigned),
    (0xB2, ElementId::CueDuration, Unsigned),
    (0x5378, ElementId::CueBlockNumber, Unsigned),
    (0x1941A469, ElementId::Attachments, Master),
    (0x61A7, ElementId::AttachedFile, Master),
    (0x467E, ElementId::FileDescription, String),
    (0x466E, ElementId::FileName, String),
    (0x4660, ElementId::FileMimeType, String),
    (0x465C, ElementId::FileData, Binary),
    (0x46AE, ElementId::FileUid, Unsigned),
    (0x1043A770, ElementId::Chapters, Master),
    (0x45B9, ElementId::EditionEntry, Master),
    (0x45BC, ElementId::EditionUid, Unsigned),
    (0x45BD, ElementId::EditionFlagHidden, Unsigned),
    (0x45DB, ElementId::EditionFlagDefault, Unsigned),
    (0x45DD, ElementId::EditionFlagOrdered, Unsigned),
    (0xB6, ElementId::ChapterAtom, Master),
    (0x73C4, ElementId::ChapterUid, Unsigned),
    (0x5654, ElementId::ChapterStringUid, String),
    (0x91, ElementId::ChapterTimeStart, Unsigned),
    (0x92, ElementId::ChapterTimeEnd, Unsigned),
    (0x98, ElementId::ChapterFlagHidden, Unsigned),
    (0x4598, ElementId::ChapterFlagEnabled, Unsigned),
    (0x6E67, ElementId::ChapterSegmentUid, Binary),
    (0x8F, ElementId::ChapterTrack, Master),
    (0x89, ElementId::ChapterTrackUid, Unsigned),
    (0x80, ElementId::ChapterDisplay, Master),
    (0x85, ElementId::ChapString, String),
    (0x437C, ElementId::ChapLanguage, String),
    (0x437D, ElementId::ChapLanguageIetf, String),
    (0x437E, ElementId::ChapCountry, String),
    (0x1254C367, ElementId::Tags, Master),
    (0x7373, ElementId::Tag, Master),
    (0x63C0, ElementId::Targets, Master),
    (0x68CA, ElementId::TargetTypeValue, Unsigned),
    (0x63CA, ElementId::TargetType, String),
    (0x63C5, ElementId::TagTrackUid, Unsigned),
    (0x63C9, ElementId::TagEditionUid, Unsigned),
    (0x63C4, ElementId::TagChapterUid, Unsigned),
    (0x63C6, ElementId::TagAttachmentUid, Unsigned),
    (0x67C8, ElementId::SimpleTag, Master),
    (0x45A3, ElementId::TagName, String),
    (0x447A, ElementId::TagLanguage, String),
    (0x4484, ElementId::TagDefault, Unsigned),
    (0x4487, ElementId::TagString, String),
    (0x4485, ElementId::TagBinary, Binary),
];

/// Maps the raw IDs to their symbolic name and type.
pub(crate) static ID_TO_ELEMENT: Lazy<HashMap<u32, (ElementId, ElementType)>> = Lazy::new(|| {
    REGISTRY
        .iter()
        .map(|&(id, element_id, element_type)| (id, (element_id, element_type)))
        .collect()
});

static ELEMENT_TO_ID: Lazy<HashMap<ElementId, u32>> = Lazy::new(|| {
    REGISTRY
        .iter()
        .map(|&(id, element_id, _)| (element_id, id))
        .collect()
});

impl ElementId {
    /// Looks up the symbolic name of a raw element ID.
    pub fn from_raw(id: u32) -> Self {
        ID_TO_ELEMENT
            .get(&id)
            .map_or(ElementId::Unknown, |&(element_id, _)| element_id)
    }

    /// Returns the raw ID as found in the file. `None` for [`ElementId::Unknown`].
    pub fn raw(self) -> Option<u32> {
        ELEMENT_TO_ID.get(&self).copied()
    }

    /// Top level elements that end an unknown-sized Cluster when they show up inside it.
    pub(crate) const fn is_top_level(self) -> bool {
        matches!(
            self,
            ElementId::Ebml
                | ElementId::Segment
                | ElementId::SeekHead
                | ElementId::Info
                | ElementId::Tracks
                | ElementId::Cluster
                | ElementId::Cues
                | ElementId::Attachments
                | ElementId::Chapters
                | ElementId::Tags
        )
    }
}

/// Returns the symbolic name and type of a raw element ID.
pub(crate) fn lookup(id: u32) -> Option<(ElementId, ElementType)> {
    ID_TO_ELEMENT.get(&id).copied()
}
