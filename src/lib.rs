#![warn(missing_docs)]
#![deny(unused_results)]
#![deny(clippy::as_conversions)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
//! A streaming Matroska and WebM parser and packet reader.
//!
//! [`MatroskaReader`] parses the EBML header and the descriptive metadata of a
//! Matroska segment when it's opened and then delivers the frames of all
//! blocks as [`Packet`]s, in the order they appear in the file.
//!
//! ```no_run
//! use std::fs::File;
//! use matroska_reader::MatroskaReader;
//!
//! let file = File::open("video.mkv").unwrap();
//! let mut reader = MatroskaReader::open(file).unwrap();
//! for track in reader.tracks() {
//!     println!("{}: {}", track.track_number(), track.codec_id());
//! }
//! while let Some(packet) = reader.read_packet().unwrap() {
//!     println!("track {} at {} ns", packet.track, packet.start_ns);
//! }
//! ```
//!
//! Sources that can't seek are wrapped in [`Unseekable`] and opened with
//! [`OpenOptions::no_seeking`].
//!
//! Laced blocks are split by the flag bits `0x06`: `0x02` means fixed-size,
//! `0x04` EBML and `0x06` Xiph lacing. Standard Matroska muxers use a different
//! assignment, so their laced audio blocks are not split into the right frames.

use std::collections::{HashSet, VecDeque};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use bitflags::bitflags;
use log::{debug, trace, warn};

pub use element_id::ElementId;
pub use enums::*;
pub use error::{DemuxError, Result};
pub use metadata::*;

use crate::block::{decode_block, Block};
use crate::ebml::{
    find_all_masters, parse_ebml_header, try_find_binary, try_find_signed, try_find_unsigned,
    EbmlReader, ElementHeader, ElementSize,
};

mod block;
mod ebml;
mod element_id;
mod enums;
mod error;
mod metadata;
pub mod vint;

/// Top level elements that are parsed into metadata records.
const METADATA_ELEMENTS: [ElementId; 7] = [
    ElementId::SeekHead,
    ElementId::Info,
    ElementId::Tracks,
    ElementId::Attachments,
    ElementId::Chapters,
    ElementId::Cues,
    ElementId::Tags,
];

bitflags! {
    /// Flags of a packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// The frame can be decoded without any other frame.
        const KEYFRAME = 0x0001;
        /// The frame should be decoded but not displayed.
        const INVISIBLE = 0x0002;
        /// The frame can be dropped during playback.
        const DISCARDABLE = 0x0004;
        /// The frame carries no data and marks a gap in the track.
        const GAP = 0x0008;
    }
}

/// A single frame of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// The track number of the frame.
    pub track: u64,
    /// The presentation time of the frame in nanoseconds.
    pub start_ns: i64,
    /// The end of the frame in nanoseconds. Equal to `start_ns` if the duration is unknown.
    pub end_ns: i64,
    /// Flags of the frame.
    pub flags: PacketFlags,
    /// The frame data.
    pub data: Vec<u8>,
    /// The first ReferenceBlock of a BlockGroup, relative to the block timestamp in ticks.
    pub reference_block: Option<i64>,
    /// Nanoseconds of padding to drop at the end of the decoded frame.
    pub discard_padding: Option<i64>,
    /// Absolute offset of the SimpleBlock or BlockGroup the frame was found in.
    pub file_position: u64,
}

impl Packet {
    /// Returns `true` if the frame can be decoded without any other frame.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }
}

/// Options and flags which can be used to configure how a Matroska file is opened.
#[derive(Clone, Debug, Default)]
pub struct OpenOptions {
    no_seeking: bool,
    elements: Option<Vec<ElementId>>,
}

impl OpenOptions {
    /// Creates the default options: seeking enabled, all metadata parsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Never call `seek` on the source.
    ///
    /// [`MatroskaReader::seek`] fails and [`MatroskaReader::skip_to_keyframe`] does nothing.
    /// Metadata stored behind the clusters is only parsed once the clusters are read.
    pub fn no_seeking(mut self, no_seeking: bool) -> Self {
        self.no_seeking = no_seeking;
        self
    }

    /// Only parse the given top level metadata elements. All others are skipped.
    pub fn elements(mut self, elements: &[ElementId]) -> Self {
        self.elements = Some(elements.to_vec());
        self
    }

    /// Opens a Matroska file with these options.
    ///
    /// # Errors
    ///
    /// Fails if the EBML header or the metadata in front of the first cluster can't be parsed.
    pub fn open<R: Read + Seek>(&self, source: R) -> Result<MatroskaReader<R>> {
        MatroskaReader::with_options(source, self.clone())
    }

    fn wants(&self, id: ElementId) -> bool {
        self.elements
            .as_ref()
            .map_or(true, |elements| elements.contains(&id))
    }
}

/// Adapts a source that can't seek. Every seek fails with [`ErrorKind::Unsupported`].
///
/// Open it with [`OpenOptions::no_seeking`].
#[derive(Debug)]
pub struct Unseekable<R>(pub R);

impl<R: Read> Read for Unseekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R> Seek for Unseekable<R> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            ErrorKind::Unsupported,
            "the source doesn't support seeking",
        ))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Init,
    /// Between clusters.
    Ready,
    /// Inside a cluster that ends at the given offset, if known.
    InCluster(Option<u64>),
    End,
    Failed,
}

/// The fields of a BlockGroup that apply to all frames of its block.
#[derive(Clone, Copy, Debug, Default)]
struct GroupInfo {
    duration: Option<u64>,
    reference_block: Option<i64>,
    discard_padding: Option<i64>,
}

/// Reads the metadata and the packets of a Matroska file.
#[derive(Debug)]
pub struct MatroskaReader<R> {
    reader: EbmlReader<R>,
    options: OpenOptions,
    state: State,
    ebml_header: EbmlHeader,
    info: SegmentInfo,
    tracks: Vec<TrackEntry>,
    attachments: Vec<AttachedFile>,
    chapters: Vec<EditionEntry>,
    cues: Vec<Cue>,
    tags: Vec<Tag>,
    seek_head: Vec<SeekEntry>,
    seek_head_positions: Vec<u64>,
    parsed: HashSet<ElementId>,
    segment_position: u64,
    segment_payload_start: u64,
    segment_end: Option<u64>,
    cues_position: Option<u64>,
    first_cluster_position: Option<u64>,
    cluster_timestamp: u64,
    track_mask: u64,
    queue: VecDeque<Packet>,
}

impl<R: Read + Seek> MatroskaReader<R> {
    /// Opens a Matroska file with the default options.
    ///
    /// # Errors
    ///
    /// Fails if the EBML header or the metadata in front of the first cluster can't be parsed.
    pub fn open(source: R) -> Result<Self> {
        Self::with_options(source, OpenOptions::default())
    }

    fn with_options(source: R, options: OpenOptions) -> Result<Self> {
        let mut reader = EbmlReader::new(source, !options.no_seeking);
        let ebml_header = parse_ebml_header(&mut reader)?;
        debug!("Opened a {} file", ebml_header.doc_type());

        let segment = find_segment(&mut reader)?;
        debug!(
            "Segment at {} with size {:?}",
            segment.position, segment.size
        );

        let mut matroska = Self {
            reader,
            options,
            state: State::Init,
            ebml_header,
            info: SegmentInfo::default(),
            tracks: Vec::new(),
            attachments: Vec::new(),
            chapters: Vec::new(),
            cues: Vec::new(),
            tags: Vec::new(),
            seek_head: Vec::new(),
            seek_head_positions: Vec::new(),
            parsed: HashSet::new(),
            segment_position: segment.position,
            segment_payload_start: segment.data_position(),
            segment_end: segment.end(),
            cues_position: None,
            first_cluster_position: None,
            cluster_timestamp: 0,
            track_mask: 0,
            queue: VecDeque::new(),
        };

        matroska.read_metadata()?;
        if matroska.first_cluster_position.is_some() && matroska.reader.is_seekable() {
            matroska.load_indexed_metadata()?;
        }
        matroska.state = State::Ready;

        debug!(
            "Found {} tracks and {} cues",
            matroska.tracks.len(),
            matroska.cues.len()
        );

        Ok(matroska)
    }

    /// Parses the top level elements up to the first cluster.
    fn read_metadata(&mut self) -> Result<()> {
        loop {
            if self.at_segment_end() {
                return Ok(());
            }

            let Some(header) = self.reader.read_element_header()? else {
                return self.check_segment_complete();
            };

            match header.element_id() {
                ElementId::Cluster
                | ElementId::Timestamp
                | ElementId::SimpleBlock
                | ElementId::BlockGroup => {
                    self.first_cluster_position = Some(header.position);
                    self.reader.unread_header(header);
                    return Ok(());
                }
                id if METADATA_ELEMENTS.contains(&id) => self.read_metadata_element(&header)?,
                _ => self.skip_element(&header)?,
            }
        }
    }

    /// Parses the metadata the SeekHead points to that wasn't found in front of the first cluster.
    ///
    /// SeekHeads listed by the first one are loaded too, but their own SeekHead entries aren't followed.
    fn load_indexed_metadata(&mut self) -> Result<()> {
        let mut moved = false;

        let seek_heads: Vec<u64> = self
            .seek_head
            .iter()
            .filter(|entry| entry.element_id() == ElementId::SeekHead)
            .map(SeekEntry::position)
            .collect();
        for relative in seek_heads {
            moved |= self.load_indexed(ElementId::SeekHead, relative);
        }

        let targets: Vec<(ElementId, u64)> = self
            .seek_head
            .iter()
            .map(|entry| (entry.element_id(), entry.position()))
            .filter(|&(id, _)| {
                id != ElementId::SeekHead
                    && METADATA_ELEMENTS.contains(&id)
                    && !self.parsed.contains(&id)
                    && self.options.wants(id)
            })
            .collect();

        for (id, relative) in targets {
            if !self.parsed.contains(&id) {
                moved |= self.load_indexed(id, relative);
            }
        }

        if let Some(first_cluster) = self.first_cluster_position.filter(|_| moved) {
            self.reader.seek_to(first_cluster)?;
        }

        Ok(())
    }

    /// Loads the element of a SeekHead entry. Returns `true` if the reader was moved.
    ///
    /// Failures are logged and ignored.
    fn load_indexed(&mut self, id: ElementId, relative: u64) -> bool {
        let position = self.segment_payload_start.saturating_add(relative);
        if id == ElementId::SeekHead && self.seek_head_positions.contains(&position) {
            return false;
        }
        if self.segment_end.map_or(false, |end| position >= end) {
            warn!("SeekHead entry for {id:?} points behind the segment");
            return false;
        }
        if let Err(err) = self.load_element_at(id, position) {
            warn!("Can't load {id:?} at {position}: {err}");
        }
        true
    }

    fn load_element_at(&mut self, id: ElementId, position: u64) -> Result<()> {
        self.reader.seek_to(position)?;
        let Some(header) = self.reader.read_element_header()? else {
            warn!("SeekHead entry for {id:?} points behind the end of the file");
            return Ok(());
        };
        if header.element_id() != id {
            warn!(
                "SeekHead entry for {id:?} points to element 0x{:X} at {position}",
                header.id
            );
            return Ok(());
        }
        trace!("Loading {id:?} at {position}");
        self.read_metadata_element(&header)
    }

    /// Parses a metadata element unless it is filtered out or was already parsed.
    fn read_metadata_element(&mut self, header: &ElementHeader) -> Result<()> {
        let id = header.element_id();
        let parsed = if id == ElementId::SeekHead {
            self.seek_head_positions.contains(&header.position)
        } else {
            self.parsed.contains(&id)
        };
        if parsed || !self.options.wants(id) {
            trace!("Skipping {id:?} at {}", header.position);
            return self.skip_element(header);
        }

        let fields = self.reader.collect_children(header)?;
        match id {
            ElementId::SeekHead => {
                self.seek_head_positions.push(header.position);
                self.seek_head.extend(
                    find_all_masters(&fields, ElementId::Seek).filter_map(SeekEntry::new),
                );
                if self.cues_position.is_none() {
                    self.cues_position = self
                        .seek_head
                        .iter()
                        .find(|entry| entry.element_id() == ElementId::Cues)
                        .map(|entry| self.segment_payload_start.saturating_add(entry.position()));
                }
            }
            ElementId::Info => {
                self.info = SegmentInfo::new(&fields);
                let scale = self.info.timestamp_scale();
                self.cues.iter_mut().for_each(|cue| cue.rescale(scale));
            }
            ElementId::Tracks => {
                self.tracks = find_all_masters(&fields, ElementId::TrackEntry)
                    .filter_map(TrackEntry::new)
                    .collect();
            }
            ElementId::Attachments => {
                self.attachments = find_all_masters(&fields, ElementId::AttachedFile)
                    .map(AttachedFile::new)
                    .collect();
            }
            ElementId::Chapters => {
                self.chapters = find_all_masters(&fields, ElementId::EditionEntry)
                    .map(EditionEntry::new)
                    .collect();
            }
            ElementId::Cues => {
                let scale = self.info.timestamp_scale();
                self.cues = find_all_masters(&fields, ElementId::CuePoint)
                    .flat_map(|point| Cue::from_cue_point(point, scale))
                    .collect();
                self.cues.sort_by_key(Cue::time);
                self.cues_position = Some(header.position);
            }
            ElementId::Tags => {
                self.tags = find_all_masters(&fields, ElementId::Tag)
                    .map(Tag::new)
                    .collect();
            }
            _ => {}
        }
        let _ = self.parsed.insert(id);
        trace!("Parsed {id:?} at {}", header.position);

        Ok(())
    }

    /// Skips an element. Elements of unknown size are read and dropped.
    fn skip_element(&mut self, header: &ElementHeader) -> Result<()> {
        match header.size {
            ElementSize::Known(_) => self.reader.skip_element(header),
            ElementSize::Unknown => self.reader.collect_children(header).map(drop),
        }
    }

    fn at_segment_end(&self) -> bool {
        self.segment_end
            .map_or(false, |end| self.reader.position() >= end)
    }

    /// The source ended. That's only fine for segments of unknown size.
    fn check_segment_complete(&self) -> Result<()> {
        match self.segment_end {
            Some(end) if self.reader.position() < end => Err(DemuxError::ShortRead {
                position: self.reader.position(),
                id: ElementId::Segment.raw().unwrap_or_default(),
            }),
            _ => Ok(()),
        }
    }

    /// Returns the next packet of a track that isn't masked.
    ///
    /// Returns `None` at the end of the stream. After an error the reader is
    /// unusable and only returns `None`.
    ///
    /// # Errors
    ///
    /// Fails if the source fails or the file is malformed.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        if self.state == State::Failed {
            return Ok(None);
        }

        match self.next_packet() {
            Ok(packet) => Ok(packet),
            Err(err) => {
                warn!("Reading packets failed: {err}");
                self.state = State::Failed;
                self.queue.clear();
                Err(err)
            }
        }
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            while let Some(packet) = self.queue.pop_front() {
                if !self.is_masked(packet.track) {
                    return Ok(Some(packet));
                }
            }

            if self.state == State::End {
                return Ok(None);
            }
            self.read_next_element()?;
        }
    }

    /// Reads one element of the cluster stream and queues the frames it carries.
    fn read_next_element(&mut self) -> Result<()> {
        if let State::InCluster(Some(end)) = self.state {
            if self.reader.position() >= end {
                self.state = State::Ready;
            }
        }

        if self.at_segment_end() {
            self.state = State::End;
            return Ok(());
        }

        let Some(header) = self.reader.read_element_header()? else {
            if let State::InCluster(Some(_)) = self.state {
                return Err(DemuxError::ShortRead {
                    position: self.reader.position(),
                    id: ElementId::Cluster.raw().unwrap_or_default(),
                });
            }
            self.check_segment_complete()?;
            self.state = State::End;
            return Ok(());
        };

        if let (State::InCluster(Some(end)), Some(child_end)) = (self.state, header.end()) {
            if child_end > end {
                return Err(DemuxError::MalformedElement {
                    position: header.position,
                    id: header.id,
                    reason: "child element exceeds its cluster",
                });
            }
        }

        match header.element_id() {
            ElementId::Cluster => {
                debug!("Cluster at {}", header.position);
                self.cluster_timestamp = 0;
                self.state = State::InCluster(header.end());
            }
            ElementId::Timestamp => {
                let size = self.known_size(&header)?;
                self.cluster_timestamp = self.reader.read_uint(&header, size)?;
            }
            ElementId::SimpleBlock => {
                let size = self.known_size(&header)?;
                let data = self.reader.read_binary(&header, size)?;
                let block = decode_block(&data, header.position)?;
                self.queue_block(block, header.position, None);
            }
            ElementId::BlockGroup => self.read_block_group(&header)?,
            id if METADATA_ELEMENTS.contains(&id) => {
                self.state = State::Ready;
                self.read_metadata_element(&header)?;
            }
            _ => self.skip_element(&header)?,
        }

        Ok(())
    }

    fn known_size(&self, header: &ElementHeader) -> Result<u64> {
        match header.size {
            ElementSize::Known(size) => Ok(size),
            ElementSize::Unknown => Err(DemuxError::MalformedElement {
                position: header.position,
                id: header.id,
                reason: "block element with unknown size",
            }),
        }
    }

    fn read_block_group(&mut self, header: &ElementHeader) -> Result<()> {
        let fields = self.reader.collect_children(header)?;

        let Some((_, data)) = try_find_binary(&fields, ElementId::Block) else {
            warn!("Skipping BlockGroup without a Block at {}", header.position);
            return Ok(());
        };
        let block = decode_block(data, header.position)?;

        let group = GroupInfo {
            duration: try_find_unsigned(&fields, ElementId::BlockDuration),
            reference_block: try_find_signed(&fields, ElementId::ReferenceBlock),
            discard_padding: try_find_signed(&fields, ElementId::DiscardPadding),
        };
        self.queue_block(block, header.position, Some(group));

        Ok(())
    }

    /// Queues one packet per frame of the block.
    fn queue_block(&mut self, block: Block, position: u64, group: Option<GroupInfo>) {
        let scale = i64::try_from(self.info.timestamp_scale()).unwrap_or(i64::MAX);
        let ticks = i64::try_from(self.cluster_timestamp)
            .unwrap_or(i64::MAX)
            .saturating_add(i64::from(block.relative_timestamp));
        let start_ns = ticks.saturating_mul(scale);

        let mut flags = PacketFlags::empty();
        if block.is_invisible() {
            flags |= PacketFlags::INVISIBLE;
        }
        let group = match group {
            Some(group) => {
                if group.reference_block.is_none() {
                    flags |= PacketFlags::KEYFRAME;
                }
                group
            }
            None => {
                if block.is_keyframe() {
                    flags |= PacketFlags::KEYFRAME;
                }
                if block.is_discardable() {
                    flags |= PacketFlags::DISCARDABLE;
                }
                GroupInfo::default()
            }
        };

        let duration_ns = group.duration.map(|duration| {
            i64::try_from(duration)
                .unwrap_or(i64::MAX)
                .saturating_mul(scale)
        });
        let frame_count = i64::try_from(block.frames.len()).unwrap_or(i64::MAX);

        for (index, data) in block.frames.into_iter().enumerate() {
            let end_ns = match duration_ns {
                Some(duration_ns) => {
                    let k = i64::try_from(index + 1).unwrap_or(i64::MAX);
                    let share = i128::from(duration_ns) * i128::from(k) / i128::from(frame_count);
                    start_ns.saturating_add(i64::try_from(share).unwrap_or(i64::MAX))
                }
                None => start_ns,
            };

            let mut flags = flags;
            if data.is_empty() {
                flags |= PacketFlags::GAP;
            }

            self.queue.push_back(Packet {
                track: block.track,
                start_ns,
                end_ns,
                flags,
                data,
                reference_block: group.reference_block,
                discard_padding: group.discard_padding,
                file_position: position,
            });
        }
    }

    /// Masks tracks. Bit `n - 1` masks track `n`, for tracks 1 to 64.
    ///
    /// Masked tracks are skipped by [`MatroskaReader::read_packet`], which includes
    /// frames that are already buffered.
    pub fn set_track_mask(&mut self, mask: u64) {
        self.track_mask = mask;
    }

    fn is_masked(&self, track: u64) -> bool {
        (1..=64).contains(&track) && self.track_mask & (1 << (track - 1)) != 0
    }

    /// Drops packets until the next keyframe of a track that isn't masked.
    /// The keyframe is returned by the next call of [`MatroskaReader::read_packet`].
    ///
    /// Does nothing if the reader was opened without seeking support.
    ///
    /// # Errors
    ///
    /// Fails if reading the packets fails.
    pub fn skip_to_keyframe(&mut self) -> Result<()> {
        if self.options.no_seeking {
            return Ok(());
        }

        while let Some(packet) = self.read_packet()? {
            if packet.is_keyframe() {
                self.queue.push_front(packet);
                break;
            }
        }

        Ok(())
    }

    /// Moves the reader to the cluster of the cue selected by `target_ns` and `mode`.
    ///
    /// Cues of masked tracks are only used if no other cue exists. Buffered packets
    /// are dropped and the next packet is read from the start of the selected cluster.
    ///
    /// # Errors
    ///
    /// Fails if the reader was opened without seeking support, if the file has no
    /// cues, if the reader failed earlier or if the source can't seek.
    pub fn seek(&mut self, target_ns: u64, mode: SeekMode) -> Result<()> {
        let position = self.reader.position();
        if self.state == State::Failed {
            return Err(DemuxError::ReaderFailed { position });
        }
        if self.options.no_seeking {
            return Err(DemuxError::SeekNotSupported { position });
        }

        let mut candidates: Vec<&Cue> = self
            .cues
            .iter()
            .filter(|cue| !self.is_masked(cue.track()))
            .collect();
        if candidates.is_empty() {
            candidates = self.cues.iter().collect();
        }
        let Some(cue) = select_cue(&candidates, target_ns, mode) else {
            return Err(DemuxError::NoCues { position });
        };

        let cluster_position = self
            .segment_payload_start
            .saturating_add(cue.cluster_position());
        debug!(
            "Seeking to {target_ns} ns with {mode:?}: cue at {} ns, cluster at {cluster_position}",
            cue.time()
        );

        self.queue.clear();
        self.cluster_timestamp = 0;
        if let Err(err) = self.reader.seek_to(cluster_position) {
            self.state = State::Failed;
            return Err(err);
        }
        self.state = State::Ready;

        Ok(())
    }

    /// Returns the EBML header.
    pub fn ebml_header(&self) -> &EbmlHeader {
        &self.ebml_header
    }

    /// Returns the segment info. Holds the default values if the file has none.
    pub fn file_info(&self) -> &SegmentInfo {
        &self.info
    }

    /// Returns the number of tracks.
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Returns the track at `index` (not the track number).
    pub fn track(&self, index: usize) -> Option<&TrackEntry> {
        self.tracks.get(index)
    }

    /// Returns all tracks.
    pub fn tracks(&self) -> &[TrackEntry] {
        &self.tracks
    }

    /// Returns the attached files.
    pub fn attachments(&self) -> &[AttachedFile] {
        &self.attachments
    }

    /// Returns the editions and their chapters.
    pub fn chapters(&self) -> &[EditionEntry] {
        &self.chapters
    }

    /// Returns the cues sorted by time.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Returns the tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the entries of all SeekHeads.
    pub fn seek_head(&self) -> &[SeekEntry] {
        &self.seek_head
    }

    /// Absolute offset of the Segment element.
    pub fn segment_position(&self) -> u64 {
        self.segment_position
    }

    /// Absolute offset of the first byte inside the Segment. Cluster positions are relative to it.
    pub fn segment_payload_start(&self) -> u64 {
        self.segment_payload_start
    }

    /// Absolute offset one past the Segment. `None` if the Segment has an unknown size.
    pub fn segment_end(&self) -> Option<u64> {
        self.segment_end
    }

    /// Absolute offset of the Cues element, if known.
    pub fn cues_position(&self) -> Option<u64> {
        self.cues_position
    }

    /// Absolute offset of the first Cluster, if one was found.
    pub fn first_cluster_position(&self) -> Option<u64> {
        self.first_cluster_position
    }

    /// The smallest start time of all buffered packets that weren't returned yet.
    pub fn lowest_queued_timestamp(&self) -> Option<i64> {
        self.queue.iter().map(|packet| packet.start_ns).min()
    }

    /// Returns a reference to the source.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Returns the source.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Reads top level headers until the Segment. Elements in front of it are skipped.
fn find_segment<R: Read + Seek>(reader: &mut EbmlReader<R>) -> Result<ElementHeader> {
    loop {
        let Some(header) = reader.read_element_header()? else {
            return Err(DemuxError::ShortRead {
                position: reader.position(),
                id: ElementId::Segment.raw().unwrap_or_default(),
            });
        };

        if header.element_id() == ElementId::Segment {
            return Ok(header);
        }
        if header.size == ElementSize::Unknown {
            return Err(DemuxError::MalformedElement {
                position: header.position,
                id: header.id,
                reason: "expected a Segment",
            });
        }
        trace!("Skipping 0x{:X} in front of the Segment", header.id);
        reader.skip_element(&header)?;
    }
}

/// Picks the cue for a seek. `cues` must be sorted by time and not be empty.
fn select_cue<'a>(cues: &[&'a Cue], target_ns: u64, mode: SeekMode) -> Option<&'a Cue> {
    let first = *cues.first()?;
    let last = *cues.last()?;

    let prev = || {
        let index = cues.partition_point(|cue| cue.time() <= target_ns);
        index.checked_sub(1).map_or(first, |index| cues[index])
    };
    let next = || {
        let index = cues.partition_point(|cue| cue.time() < target_ns);
        cues.get(index).copied().unwrap_or(last)
    };

    let cue = match mode {
        SeekMode::PrevKeyframe => prev(),
        SeekMode::NextKeyframe => next(),
        SeekMode::Closest => {
            let (prev, next) = (prev(), next());
            if next.time().abs_diff(target_ns) < prev.time().abs_diff(target_ns) {
                next
            } else {
                prev
            }
        }
    };

    Some(cue)
}
