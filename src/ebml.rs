//! Implement the parsing of EBML coded files.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use log::trace;

use crate::element_id::{lookup, ElementId, ElementType};
use crate::error::{DemuxError, Result};
use crate::vint::{max_value, vint_length, MAX_ID_LENGTH, MAX_VINT_LENGTH};
use crate::EbmlHeader;

/// Masters nested deeper than this are rejected.
const MAX_NESTING_DEPTH: usize = 32;

/// Skips shorter than this are read and dropped even on seekable sources.
const SEEK_SKIP_THRESHOLD: u64 = 64 * 1024;

/// The size field of an element header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ElementSize {
    /// The payload has the given number of bytes.
    Known(u64),
    /// The reserved "all ones" pattern: the payload ends with its parent or the stream.
    Unknown,
}

/// The ID and size of an element, together with where it was found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ElementHeader {
    /// Raw ID with the length marker retained.
    pub(crate) id: u32,
    pub(crate) size: ElementSize,
    /// Length of the ID and size fields together.
    pub(crate) header_len: u8,
    /// Absolute offset of the first ID byte.
    pub(crate) position: u64,
}

impl ElementHeader {
    /// Absolute offset of the first payload byte.
    pub(crate) fn data_position(&self) -> u64 {
        self.position + u64::from(self.header_len)
    }

    /// Absolute offset one past the payload. `None` for unknown sizes.
    pub(crate) fn end(&self) -> Option<u64> {
        match self.size {
            ElementSize::Known(size) => Some(self.data_position().saturating_add(size)),
            ElementSize::Unknown => None,
        }
    }

    /// The symbolic name of the element.
    pub(crate) fn element_id(&self) -> ElementId {
        ElementId::from_raw(self.id)
    }

    fn malformed(&self, reason: &'static str) -> DemuxError {
        DemuxError::MalformedElement {
            position: self.position,
            id: self.id,
            reason,
        }
    }
}

/// The data an element can contain.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementData {
    /// Unsigned integer.
    Unsigned(u64),
    /// Signed integer.
    Signed(i64),
    /// Float.
    Float(f64),
    /// Nanoseconds since 2001-01-01T00:00:00 UTC.
    Date(i64),
    /// String.
    String(String),
    /// Binary data and the absolute offset it was read from.
    Binary { offset: u64, data: Vec<u8> },
    /// The collected children of a master element.
    Master(Vec<(ElementId, ElementData)>),
}

/// Reads EBML elements from a byte source and keeps track of the absolute position.
///
/// The position is tracked independently of the source, so non-seekable sources
/// work as long as `seekable` is `false` and the source is never asked to seek.
#[derive(Debug)]
pub(crate) struct EbmlReader<R> {
    source: R,
    position: u64,
    seekable: bool,
    pending: Option<ElementHeader>,
}

impl<R: Read + Seek> EbmlReader<R> {
    pub(crate) fn new(source: R, seekable: bool) -> Self {
        Self {
            source,
            position: 0,
            seekable,
            pending: None,
        }
    }

    /// The absolute offset of the next unread byte.
    ///
    /// A header given back with [`EbmlReader::unread_header`] counts as unread.
    pub(crate) fn position(&self) -> u64 {
        self.pending
            .as_ref()
            .map_or(self.position, |header| header.position)
    }

    pub(crate) fn is_seekable(&self) -> bool {
        self.seekable
    }

    pub(crate) fn get_ref(&self) -> &R {
        &self.source
    }

    pub(crate) fn into_inner(self) -> R {
        self.source
    }

    /// Reads the next element header.
    ///
    /// Returns `None` if the source ends cleanly before the first byte of the header.
    pub(crate) fn read_element_header(&mut self) -> Result<Option<ElementHeader>> {
        if let Some(header) = self.pending.take() {
            return Ok(Some(header));
        }

        let position = self.position;
        let mut first = [0_u8];
        if !self.read_or_eof(&mut first)? {
            return Ok(None);
        }

        let id_len = match vint_length(first[0]) {
            Some(len) if len <= MAX_ID_LENGTH => len,
            _ => return Err(DemuxError::MalformedVint { position }),
        };
        let mut id_bytes = [0_u8; MAX_ID_LENGTH];
        id_bytes[0] = first[0];
        self.read_full(&mut id_bytes[1..id_len], 0)?;
        let id = id_bytes[..id_len]
            .iter()
            .fold(0_u32, |acc, &b| (acc << 8) | u32::from(b));

        let size_position = self.position;
        let mut size_bytes = [0_u8; MAX_VINT_LENGTH];
        self.read_full(&mut size_bytes[..1], id)?;
        let size_len = vint_length(size_bytes[0]).ok_or(DemuxError::MalformedVint {
            position: size_position,
        })?;
        self.read_full(&mut size_bytes[1..size_len], id)?;

        let marker = 0x80_u8 >> (size_len - 1);
        let value = size_bytes[1..size_len]
            .iter()
            .fold(u64::from(size_bytes[0] & !marker), |acc, &b| {
                (acc << 8) | u64::from(b)
            });
        let size = if value == max_value(size_len) {
            ElementSize::Unknown
        } else {
            ElementSize::Known(value)
        };

        let header = ElementHeader {
            id,
            size,
            header_len: u8::try_from(id_len + size_len).unwrap_or(u8::MAX),
            position,
        };
        trace!("Element 0x{id:X} at {position} with size {size:?}");

        Ok(Some(header))
    }

    fn advance(&mut self, bytes: usize) {
        let bytes = u64::try_from(bytes).unwrap_or(u64::MAX);
        self.position = self.position.saturating_add(bytes);
    }

    /// Gives a header back, so the next call of [`EbmlReader::read_element_header`] returns it again.
    pub(crate) fn unread_header(&mut self, header: ElementHeader) {
        self.pending = Some(header);
    }

    /// Fills `buf` completely. A short read is an unexpected end of stream.
    pub(crate) fn read_full(&mut self, buf: &mut [u8], id: u32) -> Result<()> {
        let position = self.position;
        match self.source.read_exact(buf) {
            Ok(()) => {
                self.advance(buf.len());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                Err(DemuxError::ShortRead { position, id })
            }
            Err(source) => Err(DemuxError::Source { position, source }),
        }
    }

    /// Reads a big-endian unsigned integer of `size` bytes (0 to 8).
    pub(crate) fn read_uint(&mut self, header: &ElementHeader, size: u64) -> Result<u64> {
        let size = self.leaf_size(header, size, 8)?;
        let mut bytes = [0_u8; 8];
        self.read_full(&mut bytes[8 - size..], header.id)?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Reads a big-endian two's complement integer of `size` bytes (0 to 8).
    pub(crate) fn read_sint(&mut self, header: &ElementHeader, size: u64) -> Result<i64> {
        let size = self.leaf_size(header, size, 8)?;
        if size == 0 {
            return Ok(0);
        }
        let mut bytes = [0_u8; 8];
        self.read_full(&mut bytes[..size], header.id)?;
        // Arithmetic shift to sign extend.
        Ok(i64::from_be_bytes(bytes) >> (8 * (8 - size)))
    }

    /// Reads an IEEE-754 float of 0, 4 or 8 bytes.
    pub(crate) fn read_float(&mut self, header: &ElementHeader, size: u64) -> Result<f64> {
        let id = header.id;
        let position = self.position;
        let value = match size {
            0 => 0.0,
            4 => f64::from(self.source.read_f32::<BigEndian>().map_err(|err| {
                io_error(err, position, id)
            })?),
            8 => self
                .source
                .read_f64::<BigEndian>()
                .map_err(|err| io_error(err, position, id))?,
            _ => return Err(header.malformed("float must be 4 or 8 bytes long")),
        };
        self.position += size;
        Ok(value)
    }

    /// Reads a string of `size` bytes. Trailing NUL bytes are removed.
    pub(crate) fn read_string(&mut self, header: &ElementHeader, size: u64) -> Result<String> {
        let mut bytes = self.read_binary(header, size)?;
        let len = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len());
        bytes.truncate(len);

        match String::from_utf8(bytes) {
            Ok(value) => Ok(value),
            Err(err) => Ok(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }

    /// Reads `size` bytes.
    pub(crate) fn read_binary(&mut self, header: &ElementHeader, size: u64) -> Result<Vec<u8>> {
        let position = self.position;
        let mut data = Vec::new();
        let read = (&mut self.source)
            .take(size)
            .read_to_end(&mut data)
            .map_err(|source| DemuxError::Source { position, source })?;
        self.advance(read);

        if u64::try_from(read).map_or(true, |read| read < size) {
            return Err(DemuxError::ShortRead {
                position: self.position,
                id: header.id,
            });
        }

        Ok(data)
    }

    /// Skips `size` bytes. Seeks forward when possible, otherwise reads and drops them.
    pub(crate) fn skip(&mut self, size: u64, id: u32) -> Result<()> {
        if self.seekable && size >= SEEK_SKIP_THRESHOLD {
            return self.seek_to(self.position.saturating_add(size));
        }

        let position = self.position;
        let skipped = std::io::copy(&mut (&mut self.source).take(size), &mut std::io::sink())
            .map_err(|source| DemuxError::Source { position, source })?;
        self.position += skipped;

        if skipped < size {
            return Err(DemuxError::ShortRead {
                position: self.position,
                id,
            });
        }

        Ok(())
    }

    /// Skips the payload of the given element. Unknown sizes can't be skipped.
    pub(crate) fn skip_element(&mut self, header: &ElementHeader) -> Result<()> {
        match header.size {
            ElementSize::Known(size) => self.skip(size, header.id),
            ElementSize::Unknown => Err(header.malformed("can't skip an element of unknown size")),
        }
    }

    /// Moves the reader to the given absolute offset.
    pub(crate) fn seek_to(&mut self, position: u64) -> Result<()> {
        if !self.seekable {
            return Err(DemuxError::SeekNotSupported {
                position: self.position,
            });
        }

        let current = self.position;
        self.position = self
            .source
            .seek(SeekFrom::Start(position))
            .map_err(|source| DemuxError::Source {
                position: current,
                source,
            })?;
        self.pending = None;

        Ok(())
    }

    /// Reads the children of a master element according to the element registry.
    ///
    /// Unknown elements, `Void` and `CRC-32` are skipped. Nested masters are collected
    /// recursively. For a master of unknown size, collection stops at the end of the
    /// stream or at the first top level element, which is given back to the reader.
    pub(crate) fn collect_children(
        &mut self,
        parent: &ElementHeader,
    ) -> Result<Vec<(ElementId, ElementData)>> {
        self.collect_until(parent, parent.end(), 0)
    }

    fn collect_until(
        &mut self,
        parent: &ElementHeader,
        end: Option<u64>,
        depth: usize,
    ) -> Result<Vec<(ElementId, ElementData)>> {
        if depth > MAX_NESTING_DEPTH {
            return Err(parent.malformed("elements are nested too deeply"));
        }

        let mut children = Vec::new();
        loop {
            if let Some(end) = end {
                if self.position >= end {
                    break;
                }
            }

            let Some(header) = self.read_element_header()? else {
                if end.is_some() {
                    return Err(DemuxError::ShortRead {
                        position: self.position,
                        id: parent.id,
                    });
                }
                break;
            };

            let child_end = match header.end() {
                Some(child_end) => {
                    if end.map_or(false, |end| child_end > end) {
                        return Err(header.malformed("child element exceeds its parent"));
                    }
                    Some(child_end)
                }
                None => end,
            };

            let Some((element_id, element_type)) = lookup(header.id) else {
                trace!("Skipping unknown element 0x{:X}", header.id);
                self.skip_element(&header)?;
                continue;
            };

            if end.is_none() && element_id.is_top_level() {
                self.unread_header(header);
                break;
            }

            let data = match element_type {
                ElementType::Skip => {
                    self.skip_element(&header)?;
                    continue;
                }
                ElementType::Master => {
                    ElementData::Master(self.collect_until(&header, child_end, depth + 1)?)
                }
                leaf => {
                    let ElementSize::Known(size) = header.size else {
                        return Err(header.malformed("leaf element with unknown size"));
                    };
                    self.read_leaf(&header, leaf, size)?
                }
            };

            children.push((element_id, data));
        }

        if let Some(end) = end {
            if self.position > end {
                return Err(parent.malformed("children overrun the element size"));
            }
        }

        Ok(children)
    }

    fn read_leaf(
        &mut self,
        header: &ElementHeader,
        element_type: ElementType,
        size: u64,
    ) -> Result<ElementData> {
        let data = match element_type {
            ElementType::Unsigned => ElementData::Unsigned(self.read_uint(header, size)?),
            ElementType::Signed => ElementData::Signed(self.read_sint(header, size)?),
            ElementType::Float => ElementData::Float(self.read_float(header, size)?),
            ElementType::Date => ElementData::Date(self.read_sint(header, size)?),
            ElementType::String => ElementData::String(self.read_string(header, size)?),
            ElementType::Binary | ElementType::Master | ElementType::Skip => {
                let offset = self.position;
                ElementData::Binary {
                    offset,
                    data: self.read_binary(header, size)?,
                }
            }
        };
        Ok(data)
    }

    fn leaf_size(&self, header: &ElementHeader, size: u64, max: usize) -> Result<usize> {
        match usize::try_from(size) {
            Ok(size) if size <= max => Ok(size),
            _ => Err(header.malformed("integer element is longer than 8 bytes")),
        }
    }

    /// Reads into `buf`. Returns `false` if the source is already at its end.
    fn read_or_eof(&mut self, buf: &mut [u8; 1]) -> Result<bool> {
        loop {
            match self.source.read(buf) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    self.position += 1;
                    return Ok(true);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(DemuxError::Source {
                        position: self.position,
                        source,
                    })
                }
            }
        }
    }
}

fn io_error(err: std::io::Error, position: u64, id: u32) -> DemuxError {
    if err.kind() == ErrorKind::UnexpectedEof {
        DemuxError::ShortRead { position, id }
    } else {
        DemuxError::Source {
            position,
            source: err,
        }
    }
}

/// Parses and verifies the EBML header at the start of the stream.
pub(crate) fn parse_ebml_header<R: Read + Seek>(r: &mut EbmlReader<R>) -> Result<EbmlHeader> {
    let header = match r.read_element_header() {
        Ok(Some(header)) => header,
        Ok(None) => {
            return Err(DemuxError::InvalidEbmlHeader {
                position: 0,
                reason: "the stream is empty",
            })
        }
        Err(DemuxError::MalformedVint { position }) | Err(DemuxError::ShortRead { position, .. }) => {
            return Err(DemuxError::InvalidEbmlHeader {
                position,
                reason: "the stream doesn't start with an EBML element",
            })
        }
        Err(err) => return Err(err),
    };

    if header.element_id() != ElementId::Ebml {
        return Err(DemuxError::InvalidEbmlHeader {
            position: header.position,
            reason: "the stream doesn't start with an EBML element",
        });
    }
    if header.size == ElementSize::Unknown {
        return Err(DemuxError::InvalidEbmlHeader {
            position: header.position,
            reason: "the EBML header has an unknown size",
        });
    }

    let fields = r.collect_children(&header)?;
    EbmlHeader::new(&fields, header.position)
}

/// Returns the first unsigned integer with the given ID.
pub(crate) fn try_find_unsigned(fields: &[(ElementId, ElementData)], id: ElementId) -> Option<u64> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::Unsigned(value) if *element_id == id => Some(*value),
        _ => None,
    })
}

/// Returns all unsigned integers with the given ID in file order.
pub(crate) fn find_all_unsigned(fields: &[(ElementId, ElementData)], id: ElementId) -> Vec<u64> {
    fields
        .iter()
        .filter_map(|(element_id, data)| match data {
            ElementData::Unsigned(value) if *element_id == id => Some(*value),
            _ => None,
        })
        .collect()
}

/// Returns the first signed integer with the given ID.
pub(crate) fn try_find_signed(fields: &[(ElementId, ElementData)], id: ElementId) -> Option<i64> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::Signed(value) if *element_id == id => Some(*value),
        _ => None,
    })
}

/// Returns the first float with the given ID.
pub(crate) fn try_find_float(fields: &[(ElementId, ElementData)], id: ElementId) -> Option<f64> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::Float(value) if *element_id == id => Some(*value),
        _ => None,
    })
}

/// Returns the first date with the given ID.
pub(crate) fn try_find_date(fields: &[(ElementId, ElementData)], id: ElementId) -> Option<i64> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::Date(value) if *element_id == id => Some(*value),
        _ => None,
    })
}

/// Returns the first string with the given ID.
pub(crate) fn try_find_string(
    fields: &[(ElementId, ElementData)],
    id: ElementId,
) -> Option<String> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::String(value) if *element_id == id => Some(value.clone()),
        _ => None,
    })
}

/// Returns the first binary with the given ID, together with its absolute offset.
pub(crate) fn try_find_binary(
    fields: &[(ElementId, ElementData)],
    id: ElementId,
) -> Option<(u64, &[u8])> {
    fields.iter().find_map(|(element_id, data)| match data {
        ElementData::Binary { offset, data } if *element_id == id => Some((*offset, data.as_slice())),
        _ => None,
    })
}

/// Returns the children of the first master with the given ID.
pub(crate) fn try_find_master(
    fields: &[(ElementId, ElementData)],
    id: ElementId,
) -> Option<&[(ElementId, ElementData)]> {
    find_all_masters(fields, id).next()
}

/// Iterates over the children of all masters with the given ID in file order.
pub(crate) fn find_all_masters(
    fields: &[(ElementId, ElementData)],
    id: ElementId,
) -> impl Iterator<Item = &[(ElementId, ElementData)]> {
    fields.iter().filter_map(move |(element_id, data)| match data {
        ElementData::Master(children) if *element_id == id => Some(children.as_slice()),
        _ => None,
    })
}

/// Returns a flag. Any non zero value is `true`.
pub(crate) fn try_find_flag(fields: &[(ElementId, ElementData)], id: ElementId) -> Option<bool> {
    try_find_unsigned(fields, id).map(|value| value != 0)
}
