//! Enums exposed in the API.

/// Type of the track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackType {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
    /// A complex track.
    Complex,
    /// A logo.
    Logo,
    /// Subtitles.
    Subtitle,
    /// Buttons.
    Buttons,
    /// Control codes.
    Control,
    /// Metadata.
    Metadata,
    /// A value Matroska doesn't define. The raw value is kept.
    Other(u64),
}

impl From<u64> for TrackType {
    fn from(d: u64) -> Self {
        match d {
            1 => TrackType::Video,
            2 => TrackType::Audio,
            3 => TrackType::Complex,
            16 => TrackType::Logo,
            17 => TrackType::Subtitle,
            18 => TrackType::Buttons,
            32 => TrackType::Control,
            33 => TrackType::Metadata,
            _ => TrackType::Other(d),
        }
    }
}

impl From<TrackType> for u64 {
    fn from(t: TrackType) -> Self {
        match t {
            TrackType::Video => 1,
            TrackType::Audio => 2,
            TrackType::Complex => 3,
            TrackType::Logo => 16,
            TrackType::Subtitle => 17,
            TrackType::Buttons => 18,
            TrackType::Control => 32,
            TrackType::Metadata => 33,
            TrackType::Other(d) => d,
        }
    }
}

/// How `DisplayWidth` & `DisplayHeight` are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayUnit {
    /// In pixels.
    Pixels,
    /// In centimeters.
    Centimeters,
    /// In inches.
    Inches,
    /// By using the aspect ratio.
    DisplayAspectRatio,
    /// Unknown.
    Unknown,
}

impl From<u64> for DisplayUnit {
    fn from(d: u64) -> Self {
        match d {
            0 => DisplayUnit::Pixels,
            1 => DisplayUnit::Centimeters,
            2 => DisplayUnit::Inches,
            3 => DisplayUnit::DisplayAspectRatio,
            _ => DisplayUnit::Unknown,
        }
    }
}

/// Whether the video frames are interlaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagInterlaced {
    /// Unknown.
    Unknown,
    /// Interlaced frames.
    Interlaced,
    /// No interlacing.
    Progressive,
}

impl From<u64> for FlagInterlaced {
    fn from(d: u64) -> Self {
        match d {
            1 => FlagInterlaced::Interlaced,
            2 => FlagInterlaced::Progressive,
            _ => FlagInterlaced::Unknown,
        }
    }
}

/// Stereo-3D video mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StereoMode {
    /// Unknown.
    Unknown,
    /// Mono.
    Mono,
    /// Side by side (left eye first).
    SideBySideLeftEyeFirst,
    /// Top - bottom (right eye is first).
    TopBottomRightEyeFirst,
    /// Top - bottom (left eye is first).
    TopBottomLeftEyeFirst,
    /// Checkboard (right eye is first).
    CheckboardRightEyeFirst,
    /// Checkboard (left eye is first).
    CheckboardLeftEyeFirst,
    /// Row interleaved (right eye is first).
    RowInterleavedRightEyeFirst,
    /// Row interleaved (left eye is first).
    RowInterleavedLeftEyeFirst,
    /// Column interleaved (right eye is first).
    ColumnInterleavedRightEyeFirst,
    /// Column interleaved (left eye is first).
    ColumnInterleavedLeftEyeFirst,
    /// Anaglyph (cyan/red).
    AnaglyphCyanRed,
    /// Side by side (right eye first).
    SideBySideRightEyeFirst,
    /// Anaglyph (green/magenta).
    AnaglyphGreenMagenta,
    /// Both eyes laced in one Block (left eye is first).
    LacedLeftEyeFirst,
    /// Both eyes laced in one Block (right eye is first).
    LacedRightEyeFirst,
}

impl From<u64> for StereoMode {
    fn from(d: u64) -> Self {
        match d {
            0 => StereoMode::Mono,
            1 => StereoMode::SideBySideLeftEyeFirst,
            2 => StereoMode::TopBottomRightEyeFirst,
            3 => StereoMode::TopBottomLeftEyeFirst,
            4 => StereoMode::CheckboardRightEyeFirst,
            5 => StereoMode::CheckboardLeftEyeFirst,
            6 => StereoMode::RowInterleavedRightEyeFirst,
            7 => StereoMode::RowInterleavedLeftEyeFirst,
            8 => StereoMode::ColumnInterleavedRightEyeFirst,
            9 => StereoMode::ColumnInterleavedLeftEyeFirst,
            10 => StereoMode::AnaglyphCyanRed,
            11 => StereoMode::SideBySideRightEyeFirst,
            12 => StereoMode::AnaglyphGreenMagenta,
            13 => StereoMode::LacedLeftEyeFirst,
            14 => StereoMode::LacedRightEyeFirst,
            _ => StereoMode::Unknown,
        }
    }
}

/// Describing what kind of transformation is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentEncodingType {
    /// Unknown.
    Unknown,
    /// Transformation is a compression.
    Compression,
    /// Transformation is a encryption.
    Encryption,
}

impl From<u64> for ContentEncodingType {
    fn from(d: u64) -> Self {
        match d {
            0 => ContentEncodingType::Compression,
            1 => ContentEncodingType::Encryption,
            _ => ContentEncodingType::Unknown,
        }
    }
}

/// The compression algorithm used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentCompAlgo {
    /// Unknown.
    Unknown,
    /// zlib compression, RFC 1950.
    Zlib,
    /// bzip2 compression.
    Bzlib,
    /// LZO1X compression.
    Lzo1x,
    /// Octets in `ContentCompSettings` have been stripped from each frame.
    HeaderStripping,
}

impl From<u64> for ContentCompAlgo {
    fn from(d: u64) -> Self {
        match d {
            0 => ContentCompAlgo::Zlib,
            1 => ContentCompAlgo::Bzlib,
            2 => ContentCompAlgo::Lzo1x,
            3 => ContentCompAlgo::HeaderStripping,
            _ => ContentCompAlgo::Unknown,
        }
    }
}

/// The encryption algorithm used. `NotEncrypted` means that the contents have not been encrypted but only signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentEncAlgo {
    /// Unknown.
    Unknown,
    /// Not encrypted.
    NotEncrypted,
    /// DES - FIPS 46-3.
    Des,
    /// Triple DES - RFC 1851.
    TripleDes,
    /// Twofish.
    Twofish,
    /// Blowfish.
    Blowfish,
    /// AES - FIPS 187.
    Aes,
}

impl From<u64> for ContentEncAlgo {
    fn from(d: u64) -> Self {
        match d {
            0 => ContentEncAlgo::NotEncrypted,
            1 => ContentEncAlgo::Des,
            2 => ContentEncAlgo::TripleDes,
            3 => ContentEncAlgo::Twofish,
            4 => ContentEncAlgo::Blowfish,
            5 => ContentEncAlgo::Aes,
            _ => ContentEncAlgo::Unknown,
        }
    }
}

/// The value of a simple tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleTagValue {
    /// Unicode string.
    String(String),
    /// Binary data.
    Binary(Vec<u8>),
}

/// Which cue a seek picks relative to the requested time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SeekMode {
    /// The last cue at or before the target. Falls back to the first cue.
    #[default]
    PrevKeyframe,
    /// The first cue at or after the target. Falls back to the last cue.
    NextKeyframe,
    /// Whichever cue is nearest to the target. Ties go to the earlier cue.
    Closest,
}
