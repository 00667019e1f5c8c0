//! Descriptive records of a Matroska file.
//!
//! Every record is built from the children the element reader collected for
//! its master element. Children may come in any order, missing optional
//! children take their Matroska default values.

use log::warn;

use crate::ebml::{
    find_all_masters, find_all_unsigned, try_find_binary, try_find_date, try_find_flag,
    try_find_float, try_find_master, try_find_string, try_find_unsigned, ElementData,
};
use crate::element_id::ElementId;
use crate::enums::{
    ContentCompAlgo, ContentEncAlgo, ContentEncodingType, DisplayUnit, FlagInterlaced,
    SimpleTagValue, StereoMode, TrackType,
};
use crate::error::{DemuxError, Result};

type Fields = [(ElementId, ElementData)];

/// The timestamp scale used when the file doesn't define one.
pub const DEFAULT_TIMESTAMP_SCALE: u64 = 1_000_000;

/// The EBML header of the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EbmlHeader {
    version: Option<u64>,
    read_version: Option<u64>,
    max_id_length: u64,
    max_size_length: u64,
    doc_type: String,
    doc_type_version: u64,
    doc_type_read_version: u64,
}

impl EbmlHeader {
    pub(crate) fn new(fields: &Fields, position: u64) -> Result<Self> {
        let doc_type =
            try_find_string(fields, ElementId::DocType).ok_or(DemuxError::InvalidEbmlHeader {
                position,
                reason: "the EBML header has no DocType",
            })?;

        if doc_type != "matroska" && doc_type != "webm" {
            return Err(DemuxError::UnsupportedDocType { position, doc_type });
        }

        Ok(Self {
            version: try_find_unsigned(fields, ElementId::EbmlVersion),
            read_version: try_find_unsigned(fields, ElementId::EbmlReadVersion),
            max_id_length: try_find_unsigned(fields, ElementId::EbmlMaxIdLength).unwrap_or(4),
            max_size_length: try_find_unsigned(fields, ElementId::EbmlMaxSizeLength).unwrap_or(8),
            doc_type,
            doc_type_version: try_find_unsigned(fields, ElementId::DocTypeVersion).unwrap_or(1),
            doc_type_read_version: try_find_unsigned(fields, ElementId::DocTypeReadVersion)
                .unwrap_or(1),
        })
    }

    /// The EBML version used to create the file.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// The minimum EBML version a parser has to support to read this file.
    pub fn read_version(&self) -> Option<u64> {
        self.read_version
    }

    /// The maximum length of the IDs you'll find in this file (4 or less in Matroska).
    pub fn max_id_length(&self) -> u64 {
        self.max_id_length
    }

    /// The maximum length of the sizes you'll find in this file (8 or less in Matroska).
    pub fn max_size_length(&self) -> u64 {
        self.max_size_length
    }

    /// A string that describes the type of document that follows this EBML header ('matroska' / 'webm').
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// The version of DocType interpreter used to create the file.
    pub fn doc_type_version(&self) -> u64 {
        self.doc_type_version
    }

    /// The minimum DocType version an interpreter has to support to read this file.
    pub fn doc_type_read_version(&self) -> u64 {
        self.doc_type_read_version
    }
}

/// The Info element of a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentInfo {
    timestamp_scale: u64,
    duration: Option<f64>,
    date_utc: Option<i64>,
    title: Option<String>,
    muxing_app: Option<String>,
    writing_app: Option<String>,
    segment_uid: Option<[u8; 16]>,
    segment_filename: Option<String>,
    prev_uid: Option<[u8; 16]>,
    prev_filename: Option<String>,
    next_uid: Option<[u8; 16]>,
    next_filename: Option<String>,
}

impl Default for SegmentInfo {
    fn default() -> Self {
        Self {
            timestamp_scale: DEFAULT_TIMESTAMP_SCALE,
            duration: None,
            date_utc: None,
            title: None,
            muxing_app: None,
            writing_app: None,
            segment_uid: None,
            segment_filename: None,
            prev_uid: None,
            prev_filename: None,
            next_uid: None,
            next_filename: None,
        }
    }
}

impl SegmentInfo {
    pub(crate) fn new(fields: &Fields) -> Self {
        let timestamp_scale = match try_find_unsigned(fields, ElementId::TimestampScale) {
            Some(0) => {
                warn!("TimestampScale is zero, using the default");
                DEFAULT_TIMESTAMP_SCALE
            }
            Some(scale) => scale,
            None => DEFAULT_TIMESTAMP_SCALE,
        };

        Self {
            timestamp_scale,
            duration: try_find_float(fields, ElementId::Duration),
            date_utc: try_find_date(fields, ElementId::DateUtc),
            title: try_find_string(fields, ElementId::Title),
            muxing_app: try_find_string(fields, ElementId::MuxingApp),
            writing_app: try_find_string(fields, ElementId::WritingApp),
            segment_uid: find_uid(fields, ElementId::SegmentUid),
            segment_filename: try_find_string(fields, ElementId::SegmentFilename),
            prev_uid: find_uid(fields, ElementId::PrevUid),
            prev_filename: try_find_string(fields, ElementId::PrevFilename),
            next_uid: find_uid(fields, ElementId::NextUid),
            next_filename: try_find_string(fields, ElementId::NextFilename),
        }
    }

    /// Timestamp scale in nanoseconds (1_000_000 means all timestamps in the Segment are expressed in milliseconds).
    pub fn timestamp_scale(&self) -> u64 {
        self.timestamp_scale
    }

    /// Duration of the Segment in ticks of the timestamp scale.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Duration of the Segment in nanoseconds.
    // Scales above 2^53 ns don't occur in real files.
    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    pub fn duration_ns(&self) -> Option<f64> {
        self.duration
            .map(|duration| duration * self.timestamp_scale as f64)
    }

    /// The date and time that the Segment was created, in nanoseconds since 2001-01-01T00:00:00 UTC.
    pub fn date_utc(&self) -> Option<i64> {
        self.date_utc
    }

    /// General name of the Segment.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Muxing application or library.
    pub fn muxing_app(&self) -> Option<&str> {
        self.muxing_app.as_deref()
    }

    /// Writing application.
    pub fn writing_app(&self) -> Option<&str> {
        self.writing_app.as_deref()
    }

    /// A randomly generated unique ID to identify the Segment.
    pub fn segment_uid(&self) -> Option<&[u8; 16]> {
        self.segment_uid.as_ref()
    }

    /// A filename corresponding to this Segment.
    pub fn segment_filename(&self) -> Option<&str> {
        self.segment_filename.as_deref()
    }

    /// The unique ID of the previous Segment of a linked file.
    pub fn prev_uid(&self) -> Option<&[u8; 16]> {
        self.prev_uid.as_ref()
    }

    /// The filename of the previous Segment of a linked file.
    pub fn prev_filename(&self) -> Option<&str> {
        self.prev_filename.as_deref()
    }

    /// The unique ID of the next Segment of a linked file.
    pub fn next_uid(&self) -> Option<&[u8; 16]> {
        self.next_uid.as_ref()
    }

    /// The filename of the next Segment of a linked file.
    pub fn next_filename(&self) -> Option<&str> {
        self.next_filename.as_deref()
    }
}

fn find_uid(fields: &Fields, id: ElementId) -> Option<[u8; 16]> {
    let (_, data) = try_find_binary(fields, id)?;
    match <[u8; 16]>::try_from(data) {
        Ok(uid) => Some(uid),
        Err(_) => {
            warn!("Ignoring {id:?} of {} bytes", data.len());
            None
        }
    }
}

/// A track of the segment.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEntry {
    track_number: u64,
    track_uid: u64,
    track_type: TrackType,
    flag_enabled: bool,
    flag_default: bool,
    flag_forced: bool,
    flag_lacing: bool,
    min_cache: Option<u64>,
    max_cache: Option<u64>,
    default_duration: Option<u64>,
    max_block_addition_id: u64,
    name: Option<String>,
    language: String,
    language_ietf: Option<String>,
    codec_id: String,
    codec_private: Option<Vec<u8>>,
    codec_name: Option<String>,
    codec_delay: u64,
    seek_pre_roll: u64,
    video: Option<Video>,
    audio: Option<Audio>,
    content_encodings: Vec<ContentEncoding>,
}

impl TrackEntry {
    /// Returns `None` for entries without a usable track number, since no block can refer to them.
    pub(crate) fn new(fields: &Fields) -> Option<Self> {
        let track_number = match try_find_unsigned(fields, ElementId::TrackNumber) {
            Some(0) | None => {
                warn!("Dropping a TrackEntry without a valid TrackNumber");
                return None;
            }
            Some(number) => number,
        };

        let language = match try_find_string(fields, ElementId::Language) {
            Some(language) if language.len() >= 3 => language,
            Some(language) => {
                warn!("Ignoring malformed language {language:?} of track {track_number}");
                "und".to_owned()
            }
            None => "und".to_owned(),
        };

        let content_encodings = try_find_master(fields, ElementId::ContentEncodings)
            .map(|encodings| {
                find_all_masters(encodings, ElementId::ContentEncoding)
                    .map(ContentEncoding::new)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            track_number,
            track_uid: try_find_unsigned(fields, ElementId::TrackUid).unwrap_or(0),
            track_type: try_find_unsigned(fields, ElementId::TrackType)
                .unwrap_or(0)
                .into(),
            flag_enabled: try_find_flag(fields, ElementId::FlagEnabled).unwrap_or(true),
            flag_default: try_find_flag(fields, ElementId::FlagDefault).unwrap_or(true),
            flag_forced: try_find_flag(fields, ElementId::FlagForced).unwrap_or(false),
            flag_lacing: try_find_flag(fields, ElementId::FlagLacing).unwrap_or(true),
            min_cache: try_find_unsigned(fields, ElementId::MinCache),
            max_cache: try_find_unsigned(fields, ElementId::MaxCache),
            default_duration: try_find_unsigned(fields, ElementId::DefaultDuration),
            max_block_addition_id: try_find_unsigned(fields, ElementId::MaxBlockAdditionId)
                .unwrap_or(0),
            name: try_find_string(fields, ElementId::Name),
            language,
            language_ietf: try_find_string(fields, ElementId::LanguageIetf),
            codec_id: try_find_string(fields, ElementId::CodecId).unwrap_or_default(),
            codec_private: try_find_binary(fields, ElementId::CodecPrivate)
                .map(|(_, data)| data.to_vec()),
            codec_name: try_find_string(fields, ElementId::CodecName),
            codec_delay: try_find_unsigned(fields, ElementId::CodecDelay).unwrap_or(0),
            seek_pre_roll: try_find_unsigned(fields, ElementId::SeekPreRoll).unwrap_or(0),
            video: try_find_master(fields, ElementId::Video).map(Video::new),
            audio: try_find_master(fields, ElementId::Audio).map(Audio::new),
            content_encodings,
        })
    }

    /// The track number as used in the Block Header.
    pub fn track_number(&self) -> u64 {
        self.track_number
    }

    /// A unique ID to identify the Track.
    pub fn track_uid(&self) -> u64 {
        self.track_uid
    }

    /// The type of the track.
    pub fn track_type(&self) -> TrackType {
        self.track_type
    }

    /// Set if the track is usable.
    pub fn flag_enabled(&self) -> bool {
        self.flag_enabled
    }

    /// Set if that track (audio, video or subs) should be eligible for automatic selection by the player.
    pub fn flag_default(&self) -> bool {
        self.flag_default
    }

    /// Set if that track should be eligible for automatic selection by the player if it matches the user's language preference.
    pub fn flag_forced(&self) -> bool {
        self.flag_forced
    }

    /// Set if the track may contain blocks using lacing.
    pub fn flag_lacing(&self) -> bool {
        self.flag_lacing
    }

    /// The minimum number of frames a player should be able to cache during playback.
    pub fn min_cache(&self) -> Option<u64> {
        self.min_cache
    }

    /// The maximum cache size necessary to store referenced frames in and the current frame.
    pub fn max_cache(&self) -> Option<u64> {
        self.max_cache
    }

    /// Number of nanoseconds (not scaled) per frame.
    pub fn default_duration(&self) -> Option<u64> {
        self.default_duration
    }

    /// The maximum value of BlockAddID.
    pub fn max_block_addition_id(&self) -> u64 {
        self.max_block_addition_id
    }

    /// A human-readable track name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Specifies the language of the track in the Matroska languages form. "und" if not given.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Specifies the language of the track according to BCP 47.
    pub fn language_ietf(&self) -> Option<&str> {
        self.language_ietf.as_deref()
    }

    /// An ID corresponding to the codec.
    pub fn codec_id(&self) -> &str {
        &self.codec_id
    }

    /// Private data only known to the codec.
    pub fn codec_private(&self) -> Option<&[u8]> {
        self.codec_private.as_deref()
    }

    /// A human-readable string specifying the codec.
    pub fn codec_name(&self) -> Option<&str> {
        self.codec_name.as_deref()
    }

    /// The built-in delay for the codec, in nanoseconds.
    pub fn codec_delay(&self) -> u64 {
        self.codec_delay
    }

    /// Nanoseconds a decoder has to decode before the decoded data is valid after a seek.
    pub fn seek_pre_roll(&self) -> u64 {
        self.seek_pre_roll
    }

    /// Video settings.
    pub fn video(&self) -> Option<&Video> {
        self.video.as_ref()
    }

    /// Audio settings.
    pub fn audio(&self) -> Option<&Audio> {
        self.audio.as_ref()
    }

    /// Settings for the content encodings applied to the frames and the codec private data.
    pub fn content_encodings(&self) -> &[ContentEncoding] {
        &self.content_encodings
    }
}

/// Video settings of a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Video {
    pixel_width: u64,
    pixel_height: u64,
    display_width: u64,
    display_height: u64,
    display_unit: DisplayUnit,
    pixel_crop_top: u64,
    pixel_crop_bottom: u64,
    pixel_crop_left: u64,
    pixel_crop_right: u64,
    flag_interlaced: FlagInterlaced,
    stereo_mode: StereoMode,
    alpha_mode: u64,
    colour_space: Option<Vec<u8>>,
}

impl Video {
    pub(crate) fn new(fields: &Fields) -> Self {
        let pixel_width = try_find_unsigned(fields, ElementId::PixelWidth).unwrap_or(0);
        let pixel_height = try_find_unsigned(fields, ElementId::PixelHeight).unwrap_or(0);

        Self {
            pixel_width,
            pixel_height,
            display_width: try_find_unsigned(fields, ElementId::DisplayWidth).unwrap_or(pixel_width),
            display_height: try_find_unsigned(fields, ElementId::DisplayHeight)
                .unwrap_or(pixel_height),
            display_unit: try_find_unsigned(fields, ElementId::DisplayUnit)
                .unwrap_or(0)
                .into(),
            pixel_crop_top: try_find_unsigned(fields, ElementId::PixelCropTop).unwrap_or(0),
            pixel_crop_bottom: try_find_unsigned(fields, ElementId::PixelCropBottom).unwrap_or(0),
            pixel_crop_left: try_find_unsigned(fields, ElementId::PixelCropLeft).unwrap_or(0),
            pixel_crop_right: try_find_unsigned(fields, ElementId::PixelCropRight).unwrap_or(0),
            flag_interlaced: try_find_unsigned(fields, ElementId::FlagInterlaced)
                .unwrap_or(0)
                .into(),
            stereo_mode: try_find_unsigned(fields, ElementId::StereoMode)
                .unwrap_or(0)
                .into(),
            alpha_mode: try_find_unsigned(fields, ElementId::AlphaMode).unwrap_or(0),
            colour_space: try_find_binary(fields, ElementId::ColourSpace)
                .map(|(_, data)| data.to_vec()),
        }
    }

    /// Width of the encoded video frames in pixels.
    pub fn pixel_width(&self) -> u64 {
        self.pixel_width
    }

    /// Height of the encoded video frames in pixels.
    pub fn pixel_height(&self) -> u64 {
        self.pixel_height
    }

    /// Width of the video frames to display. Defaults to the pixel width.
    pub fn display_width(&self) -> u64 {
        self.display_width
    }

    /// Height of the video frames to display. Defaults to the pixel height.
    pub fn display_height(&self) -> u64 {
        self.display_height
    }

    /// How `DisplayWidth` & `DisplayHeight` are interpreted.
    pub fn display_unit(&self) -> DisplayUnit {
        self.display_unit
    }

    /// The number of video pixels to remove at the top of the image.
    pub fn pixel_crop_top(&self) -> u64 {
        self.pixel_crop_top
    }

    /// The number of video pixels to remove at the bottom of the image.
    pub fn pixel_crop_bottom(&self) -> u64 {
        self.pixel_crop_bottom
    }

    /// The number of video pixels to remove on the left of the image.
    pub fn pixel_crop_left(&self) -> u64 {
        self.pixel_crop_left
    }

    /// The number of video pixels to remove on the right of the image.
    pub fn pixel_crop_right(&self) -> u64 {
        self.pixel_crop_right
    }

    /// Whether the video frames are interlaced.
    pub fn flag_interlaced(&self) -> FlagInterlaced {
        self.flag_interlaced
    }

    /// Stereo-3D video mode.
    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    /// Non zero if the video contains an alpha channel.
    pub fn alpha_mode(&self) -> u64 {
        self.alpha_mode
    }

    /// The FourCC of the uncompressed colour space.
    pub fn colour_space(&self) -> Option<&[u8]> {
        self.colour_space.as_deref()
    }
}

/// Audio settings of a track.
#[derive(Clone, Debug, PartialEq)]
pub struct Audio {
    sampling_frequency: f64,
    output_sampling_frequency: f64,
    channels: u64,
    bit_depth: Option<u64>,
}

impl Audio {
    pub(crate) fn new(fields: &Fields) -> Self {
        let sampling_frequency =
            try_find_float(fields, ElementId::SamplingFrequency).unwrap_or(8000.0);

        Self {
            sampling_frequency,
            output_sampling_frequency: try_find_float(fields, ElementId::OutputSamplingFrequency)
                .unwrap_or(sampling_frequency),
            channels: try_find_unsigned(fields, ElementId::Channels).unwrap_or(1),
            bit_depth: try_find_unsigned(fields, ElementId::BitDepth),
        }
    }

    /// Sampling frequency in Hz. Defaults to 8000.
    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    /// Real output sampling frequency in Hz. Defaults to the sampling frequency.
    pub fn output_sampling_frequency(&self) -> f64 {
        self.output_sampling_frequency
    }

    /// Numbers of channels in the track. Defaults to 1.
    pub fn channels(&self) -> u64 {
        self.channels
    }

    /// Bits per sample, mostly used for PCM.
    pub fn bit_depth(&self) -> Option<u64> {
        self.bit_depth
    }
}

/// Settings for one content encoding like compression or encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentEncoding {
    order: u64,
    scope: u64,
    encoding_type: ContentEncodingType,
    compression: Option<ContentCompression>,
    encryption: Option<ContentEncryption>,
}

impl ContentEncoding {
    pub(crate) fn new(fields: &Fields) -> Self {
        Self {
            order: try_find_unsigned(fields, ElementId::ContentEncodingOrder).unwrap_or(0),
            scope: try_find_unsigned(fields, ElementId::ContentEncodingScope).unwrap_or(1),
            encoding_type: try_find_unsigned(fields, ElementId::ContentEncodingType)
                .unwrap_or(0)
                .into(),
            compression: try_find_master(fields, ElementId::ContentCompression).map(|fields| {
                ContentCompression {
                    algo: try_find_unsigned(fields, ElementId::ContentCompAlgo)
                        .unwrap_or(0)
                        .into(),
                    settings: try_find_binary(fields, ElementId::ContentCompSettings)
                        .map(|(_, data)| data.to_vec()),
                }
            }),
            encryption: try_find_master(fields, ElementId::ContentEncryption).map(|fields| {
                ContentEncryption {
                    algo: try_find_unsigned(fields, ElementId::ContentEncAlgo)
                        .unwrap_or(0)
                        .into(),
                    key_id: find_owned_binary(fields, ElementId::ContentEncKeyId),
                    signature: find_owned_binary(fields, ElementId::ContentSignature),
                    sig_key_id: find_owned_binary(fields, ElementId::ContentSigKeyId),
                    sig_algo: try_find_unsigned(fields, ElementId::ContentSigAlgo).unwrap_or(0),
                    sig_hash_algo: try_find_unsigned(fields, ElementId::ContentSigHashAlgo)
                        .unwrap_or(0),
                }
            }),
        }
    }

    /// Tells when this modification was used during encoding/muxing starting with 0 and counting upwards.
    pub fn order(&self) -> u64 {
        self.order
    }

    /// A bit field that describes which elements have been modified in this way.
    /// 1: all frame contents, 2: the codec private data, 4: the next content encoding.
    pub fn scope(&self) -> u64 {
        self.scope
    }

    /// A value describing what kind of transformation is applied.
    pub fn encoding_type(&self) -> ContentEncodingType {
        self.encoding_type
    }

    /// Settings describing the compression used.
    pub fn compression(&self) -> Option<&ContentCompression> {
        self.compression.as_ref()
    }

    /// Settings describing the encryption used.
    pub fn encryption(&self) -> Option<&ContentEncryption> {
        self.encryption.as_ref()
    }
}

fn find_owned_binary(fields: &Fields, id: ElementId) -> Option<Vec<u8>> {
    try_find_binary(fields, id).map(|(_, data)| data.to_vec())
}

/// Settings describing the compression used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentCompression {
    algo: ContentCompAlgo,
    settings: Option<Vec<u8>>,
}

impl ContentCompression {
    /// The compression algorithm used.
    pub fn algo(&self) -> ContentCompAlgo {
        self.algo
    }

    /// Settings that might be needed by the decompressor, like the stripped header bytes.
    pub fn settings(&self) -> Option<&[u8]> {
        self.settings.as_deref()
    }
}

/// Settings describing the encryption used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentEncryption {
    algo: ContentEncAlgo,
    key_id: Option<Vec<u8>>,
    signature: Option<Vec<u8>>,
    sig_key_id: Option<Vec<u8>>,
    sig_algo: u64,
    sig_hash_algo: u64,
}

impl ContentEncryption {
    /// The encryption algorithm used.
    pub fn algo(&self) -> ContentEncAlgo {
        self.algo
    }

    /// For public key algorithms this is the ID of the public key the data was encrypted with.
    pub fn key_id(&self) -> Option<&[u8]> {
        self.key_id.as_deref()
    }

    /// A cryptographic signature of the contents.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// The ID of the private key the data was signed with.
    pub fn sig_key_id(&self) -> Option<&[u8]> {
        self.sig_key_id.as_deref()
    }

    /// The algorithm used for the signature.
    pub fn sig_algo(&self) -> u64 {
        self.sig_algo
    }

    /// The hash algorithm used for the signature.
    pub fn sig_hash_algo(&self) -> u64 {
        self.sig_hash_algo
    }
}

/// A file attached to the segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachedFile {
    uid: u64,
    name: String,
    mime_type: String,
    description: Option<String>,
    data: Vec<u8>,
    position: u64,
}

impl AttachedFile {
    pub(crate) fn new(fields: &Fields) -> Self {
        let (position, data) = try_find_binary(fields, ElementId::FileData)
            .map(|(position, data)| (position, data.to_vec()))
            .unwrap_or_default();

        Self {
            uid: try_find_unsigned(fields, ElementId::FileUid).unwrap_or(0),
            name: try_find_string(fields, ElementId::FileName).unwrap_or_default(),
            mime_type: try_find_string(fields, ElementId::FileMimeType).unwrap_or_default(),
            description: try_find_string(fields, ElementId::FileDescription),
            data,
            position,
        }
    }

    /// Unique ID representing the file.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Filename of the attached file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type of the file.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// A human-friendly name for the attached file.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The data of the file.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Absolute offset of the file data in the source.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Length of the file data in bytes.
    pub fn length(&self) -> u64 {
        u64::try_from(self.data.len()).unwrap_or(u64::MAX)
    }
}

/// Contains all information about a segment edition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditionEntry {
    uid: Option<u64>,
    flag_hidden: bool,
    flag_default: bool,
    flag_ordered: bool,
    chapter_atoms: Vec<ChapterAtom>,
}

impl EditionEntry {
    pub(crate) fn new(fields: &Fields) -> Self {
        Self {
            uid: try_find_unsigned(fields, ElementId::EditionUid),
            flag_hidden: try_find_flag(fields, ElementId::EditionFlagHidden).unwrap_or(false),
            flag_default: try_find_flag(fields, ElementId::EditionFlagDefault).unwrap_or(false),
            flag_ordered: try_find_flag(fields, ElementId::EditionFlagOrdered).unwrap_or(false),
            chapter_atoms: find_all_masters(fields, ElementId::ChapterAtom)
                .map(ChapterAtom::new)
                .collect(),
        }
    }

    /// A unique ID to identify the edition.
    pub fn uid(&self) -> Option<u64> {
        self.uid
    }

    /// Set if an edition is hidden.
    pub fn flag_hidden(&self) -> bool {
        self.flag_hidden
    }

    /// Set if the edition should be used as the default one.
    pub fn flag_default(&self) -> bool {
        self.flag_default
    }

    /// Set if the chapters can be defined multiple times and the order to play them is enforced.
    pub fn flag_ordered(&self) -> bool {
        self.flag_ordered
    }

    /// The top level chapters of the edition.
    pub fn chapter_atoms(&self) -> &[ChapterAtom] {
        &self.chapter_atoms
    }
}

/// A chapter. Chapters may contain nested chapters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterAtom {
    uid: u64,
    string_uid: Option<String>,
    time_start: u64,
    time_end: Option<u64>,
    flag_hidden: bool,
    flag_enabled: bool,
    segment_uid: Option<Vec<u8>>,
    tracks: Vec<u64>,
    displays: Vec<ChapterDisplay>,
    children: Vec<ChapterAtom>,
}

impl ChapterAtom {
    pub(crate) fn new(fields: &Fields) -> Self {
        let tracks = find_all_masters(fields, ElementId::ChapterTrack)
            .flat_map(|track| find_all_unsigned(track, ElementId::ChapterTrackUid))
            .collect();

        Self {
            uid: try_find_unsigned(fields, ElementId::ChapterUid).unwrap_or(0),
            string_uid: try_find_string(fields, ElementId::ChapterStringUid),
            time_start: try_find_unsigned(fields, ElementId::ChapterTimeStart).unwrap_or(0),
            time_end: try_find_unsigned(fields, ElementId::ChapterTimeEnd),
            flag_hidden: try_find_flag(fields, ElementId::ChapterFlagHidden).unwrap_or(false),
            flag_enabled: try_find_flag(fields, ElementId::ChapterFlagEnabled).unwrap_or(true),
            segment_uid: find_owned_binary(fields, ElementId::ChapterSegmentUid),
            tracks,
            displays: find_all_masters(fields, ElementId::ChapterDisplay)
                .map(ChapterDisplay::new)
                .collect(),
            children: find_all_masters(fields, ElementId::ChapterAtom)
                .map(ChapterAtom::new)
                .collect(),
        }
    }

    /// A unique ID to identify the chapter.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// A unique string ID to identify the chapter.
    pub fn string_uid(&self) -> Option<&str> {
        self.string_uid.as_deref()
    }

    /// Timestamp of the start of the chapter in nanoseconds (not scaled).
    pub fn time_start(&self) -> u64 {
        self.time_start
    }

    /// Timestamp of the end of the chapter in nanoseconds (not scaled).
    pub fn time_end(&self) -> Option<u64> {
        self.time_end
    }

    /// Set if a chapter is hidden.
    pub fn flag_hidden(&self) -> bool {
        self.flag_hidden
    }

    /// Set if the chapter is enabled.
    pub fn flag_enabled(&self) -> bool {
        self.flag_enabled
    }

    /// The segment UID of a linked segment to play for this chapter.
    pub fn segment_uid(&self) -> Option<&[u8]> {
        self.segment_uid.as_deref()
    }

    /// The track numbers the chapter applies to. Empty means all tracks.
    pub fn tracks(&self) -> &[u64] {
        &self.tracks
    }

    /// The displayed strings of the chapter.
    pub fn displays(&self) -> &[ChapterDisplay] {
        &self.displays
    }

    /// Nested chapters.
    pub fn children(&self) -> &[ChapterAtom] {
        &self.children
    }
}

/// The displayed string of a chapter in one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterDisplay {
    string: String,
    language: String,
    language_ietf: Option<String>,
    country: String,
}

impl ChapterDisplay {
    pub(crate) fn new(fields: &Fields) -> Self {
        Self {
            string: try_find_string(fields, ElementId::ChapString).unwrap_or_default(),
            language: try_find_string(fields, ElementId::ChapLanguage)
                .unwrap_or_else(|| "eng".to_owned()),
            language_ietf: try_find_string(fields, ElementId::ChapLanguageIetf),
            country: try_find_string(fields, ElementId::ChapCountry).unwrap_or_default(),
        }
    }

    /// The string to use as the chapter title.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// The language of the string in the Matroska languages form. "eng" if not given.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The language of the string according to BCP 47.
    pub fn language_ietf(&self) -> Option<&str> {
        self.language_ietf.as_deref()
    }

    /// The country the string is meant for. Empty if not given.
    pub fn country(&self) -> &str {
        &self.country
    }
}

/// An entry of the cue index. One entry exists for each track position of a cue point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cue {
    time: u64,
    track: u64,
    cluster_position: u64,
    relative_position: Option<u64>,
    block_number: Option<u64>,
    duration: Option<u64>,
    ticks: u64,
    duration_ticks: Option<u64>,
}

impl Cue {
    /// Builds the entries of a CuePoint. Track positions without a cluster position are dropped.
    pub(crate) fn from_cue_point(fields: &Fields, timestamp_scale: u64) -> Vec<Self> {
        let ticks = try_find_unsigned(fields, ElementId::CueTime).unwrap_or(0);

        find_all_masters(fields, ElementId::CueTrackPositions)
            .filter_map(|positions| {
                let Some(cluster_position) =
                    try_find_unsigned(positions, ElementId::CueClusterPosition)
                else {
                    warn!("Ignoring CueTrackPositions without a CueClusterPosition");
                    return None;
                };

                let mut cue = Self {
                    time: 0,
                    track: try_find_unsigned(positions, ElementId::CueTrack).unwrap_or(0),
                    cluster_position,
                    relative_position: try_find_unsigned(
                        positions,
                        ElementId::CueRelativePosition,
                    ),
                    block_number: try_find_unsigned(positions, ElementId::CueBlockNumber),
                    duration: None,
                    ticks,
                    duration_ticks: try_find_unsigned(positions, ElementId::CueDuration),
                };
                cue.rescale(timestamp_scale);
                Some(cue)
            })
            .collect()
    }

    /// Recomputes the nanosecond values after the timestamp scale became known.
    pub(crate) fn rescale(&mut self, timestamp_scale: u64) {
        self.time = self.ticks.saturating_mul(timestamp_scale);
        self.duration = self
            .duration_ticks
            .map(|ticks| ticks.saturating_mul(timestamp_scale));
    }

    /// The time of the cue in nanoseconds.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// The track the cue refers to.
    pub fn track(&self) -> u64 {
        self.track
    }

    /// The position of the cluster, relative to the first byte of the segment payload.
    pub fn cluster_position(&self) -> u64 {
        self.cluster_position
    }

    /// The position of the block inside the cluster payload.
    pub fn relative_position(&self) -> Option<u64> {
        self.relative_position
    }

    /// Number of the block in the cluster, starting at 1.
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// The duration of the block in nanoseconds.
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }
}

/// A tag and the elements it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    targets: Targets,
    simple_tags: Vec<SimpleTag>,
}

impl Tag {
    pub(crate) fn new(fields: &Fields) -> Self {
        Self {
            targets: try_find_master(fields, ElementId::Targets)
                .map(Targets::new)
                .unwrap_or_default(),
            simple_tags: find_all_masters(fields, ElementId::SimpleTag)
                .map(SimpleTag::new)
                .collect(),
        }
    }

    /// The elements the tag applies to.
    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    /// The values of the tag.
    pub fn simple_tags(&self) -> &[SimpleTag] {
        &self.simple_tags
    }
}

/// The elements a tag applies to. Empty UID lists mean the whole segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Targets {
    target_type_value: u64,
    target_type: Option<String>,
    track_uids: Vec<u64>,
    edition_uids: Vec<u64>,
    chapter_uids: Vec<u64>,
    attachment_uids: Vec<u64>,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            target_type_value: 50,
            target_type: None,
            track_uids: Vec::new(),
            edition_uids: Vec::new(),
            chapter_uids: Vec::new(),
            attachment_uids: Vec::new(),
        }
    }
}

impl Targets {
    pub(crate) fn new(fields: &Fields) -> Self {
        Self {
            target_type_value: try_find_unsigned(fields, ElementId::TargetTypeValue).unwrap_or(50),
            target_type: try_find_string(fields, ElementId::TargetType),
            track_uids: find_all_unsigned(fields, ElementId::TagTrackUid),
            edition_uids: find_all_unsigned(fields, ElementId::TagEditionUid),
            chapter_uids: find_all_unsigned(fields, ElementId::TagChapterUid),
            attachment_uids: find_all_unsigned(fields, ElementId::TagAttachmentUid),
        }
    }

    /// A number to indicate the logical level of the target. Defaults to 50 (album, movie, episode).
    pub fn target_type_value(&self) -> u64 {
        self.target_type_value
    }

    /// An informational string that can be used to display the logical level of the target.
    pub fn target_type(&self) -> Option<&str> {
        self.target_type.as_deref()
    }

    /// UIDs of the tracks the tag applies to.
    pub fn track_uids(&self) -> &[u64] {
        &self.track_uids
    }

    /// UIDs of the editions the tag applies to.
    pub fn edition_uids(&self) -> &[u64] {
        &self.edition_uids
    }

    /// UIDs of the chapters the tag applies to.
    pub fn chapter_uids(&self) -> &[u64] {
        &self.chapter_uids
    }

    /// UIDs of the attachments the tag applies to.
    pub fn attachment_uids(&self) -> &[u64] {
        &self.attachment_uids
    }
}

/// The name and value of a tag. Simple tags can be nested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleTag {
    name: String,
    language: String,
    default: bool,
    value: Option<SimpleTagValue>,
    children: Vec<SimpleTag>,
}

impl SimpleTag {
    pub(crate) fn new(fields: &Fields) -> Self {
        let value = try_find_string(fields, ElementId::TagString)
            .map(SimpleTagValue::String)
            .or_else(|| {
                try_find_binary(fields, ElementId::TagBinary)
                    .map(|(_, data)| SimpleTagValue::Binary(data.to_vec()))
            });

        Self {
            name: try_find_string(fields, ElementId::TagName).unwrap_or_default(),
            language: try_find_string(fields, ElementId::TagLanguage)
                .unwrap_or_else(|| "und".to_owned()),
            default: try_find_flag(fields, ElementId::TagDefault).unwrap_or(true),
            value,
            children: find_all_masters(fields, ElementId::SimpleTag)
                .map(SimpleTag::new)
                .collect(),
        }
    }

    /// The name of the tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The language of the tag. "und" if not given.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Set if this is the default or original language of the tag.
    pub fn default(&self) -> bool {
        self.default
    }

    /// The value of the tag.
    pub fn value(&self) -> Option<&SimpleTagValue> {
        self.value.as_ref()
    }

    /// The value of the tag if it is a string.
    pub fn string(&self) -> Option<&str> {
        match &self.value {
            Some(SimpleTagValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Nested tags.
    pub fn children(&self) -> &[SimpleTag] {
        &self.children
    }
}

/// An entry of the SeekHead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekEntry {
    id: u32,
    position: u64,
}

impl SeekEntry {
    pub(crate) fn new(fields: &Fields) -> Option<Self> {
        let (_, id_bytes) = try_find_binary(fields, ElementId::SeekId)?;
        if id_bytes.is_empty() || id_bytes.len() > 4 {
            warn!("Ignoring SeekID of {} bytes", id_bytes.len());
            return None;
        }
        let id = id_bytes
            .iter()
            .fold(0_u32, |acc, &b| (acc << 8) | u32::from(b));
        let position = try_find_unsigned(fields, ElementId::SeekPosition)?;

        Some(Self { id, position })
    }

    /// The raw ID of the element the entry points to.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The symbolic name of the element the entry points to.
    pub fn element_id(&self) -> ElementId {
        ElementId::from_raw(self.id)
    }

    /// The position of the element, relative to the first byte of the segment payload.
    pub fn position(&self) -> u64 {
        self.position
    }
}
