//! Decodes SimpleBlock and Block payloads inside a Matroska file.
use byteorder::{BigEndian, ByteOrder};
use log::warn;

use crate::error::{DemuxError, Result};
use crate::vint::{parse_signed_vint, parse_vint};

/// Flag byte: the block only contains keyframes. Only meaningful for SimpleBlocks.
pub(crate) const FLAG_KEYFRAME: u8 = 0x80;
/// Flag byte: the frames should not be displayed.
pub(crate) const FLAG_INVISIBLE: u8 = 0x08;
/// Flag byte: the frames can be dropped during playback. Only meaningful for SimpleBlocks.
pub(crate) const FLAG_DISCARDABLE: u8 = 0x01;

const LACING_MASK: u8 = 0x06;

/// Lacing mode, selected by the bits `0x06` of the flag byte.
///
/// `0x02` is fixed-size, `0x04` is EBML and `0x06` is Xiph lacing. The Matroska
/// specification assigns them differently (`0x02` Xiph, `0x04` fixed-size, `0x06` EBML),
/// so laced blocks written by standard muxers don't split into the right frames.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Lacing {
    None,
    Xiph,
    Ebml,
    FixedSize,
}

impl From<u8> for Lacing {
    fn from(flags: u8) -> Self {
        match flags & LACING_MASK {
            0x02 => Lacing::FixedSize,
            0x04 => Lacing::Ebml,
            0x06 => Lacing::Xiph,
            _ => Lacing::None,
        }
    }
}

/// A decoded block with its frames already split apart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Block {
    pub(crate) track: u64,
    /// Timestamp relative to the cluster, in ticks of the timestamp scale.
    pub(crate) relative_timestamp: i16,
    pub(crate) flags: u8,
    pub(crate) frames: Vec<Vec<u8>>,
}

impl Block {
    pub(crate) fn is_keyframe(&self) -> bool {
        self.flags & FLAG_KEYFRAME != 0
    }

    pub(crate) fn is_invisible(&self) -> bool {
        self.flags & FLAG_INVISIBLE != 0
    }

    pub(crate) fn is_discardable(&self) -> bool {
        self.flags & FLAG_DISCARDABLE != 0
    }
}

/// Decodes the payload of a SimpleBlock or Block element.
///
/// `position` is the offset of the block element and only used for errors.
pub(crate) fn decode_block(data: &[u8], position: u64) -> Result<Block> {
    let malformed = |reason| DemuxError::MalformedBlock { position, reason };

    if data.len() < 4 {
        return Err(malformed("block is shorter than 4 bytes"));
    }
    if data[0] == 0 {
        return Err(malformed("invalid track number"));
    }

    let (track, track_len) = parse_vint(data);
    if track_len == 0 || data.len() < track_len + 3 {
        return Err(malformed("block header is truncated"));
    }

    let relative_timestamp = BigEndian::read_i16(&data[track_len..track_len + 2]);
    let flags = data[track_len + 2];
    let payload = &data[track_len + 3..];

    let lacing = Lacing::from(flags);
    let frames = if lacing == Lacing::None {
        vec![payload.to_vec()]
    } else {
        let Some((&count, lace)) = payload.split_first() else {
            return Err(DemuxError::MalformedLacing {
                position,
                reason: "missing lace header",
            });
        };
        let frame_count = usize::from(count) + 1;
        let (sizes, header_len) = match lacing {
            Lacing::Xiph => xiph_sizes(lace, frame_count, position)?,
            Lacing::Ebml => ebml_sizes(lace, frame_count, position)?,
            Lacing::FixedSize | Lacing::None => (fixed_sizes(lace.len(), frame_count, position), 0),
        };
        split_frames(&lace[header_len..], &sizes)
    };

    Ok(Block {
        track,
        relative_timestamp,
        flags,
        frames,
    })
}

fn split_frames(mut data: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    sizes
        .iter()
        .map(|&size| {
            let (frame, rest) = data.split_at(size);
            data = rest;
            frame.to_vec()
        })
        .collect()
}

/// Completes the explicit sizes with the size of the last frame, which is
/// whatever remains of the block.
fn complete_sizes(
    mut sizes: Vec<usize>,
    header_len: usize,
    total: usize,
    position: u64,
) -> Result<(Vec<usize>, usize)> {
    let used = sizes
        .iter()
        .try_fold(header_len, |acc, &size| acc.checked_add(size))
        .filter(|&used| used <= total)
        .ok_or(DemuxError::MalformedLacing {
            position,
            reason: "frame sizes exceed the block",
        })?;
    sizes.push(total - used);
    Ok((sizes, header_len))
}

/*
    Xiph lacing
     * Block head (with lacing bits set to 11)
     * Lacing head: Number of frames in the lace -1, i.e. 2 for frames of 800 and 500 octets
     * Lacing sizes: only the 2 first ones will be coded, 800 gives 255;255;255;35,
       500 gives 255;245. The size of the last frame is deduced from the total size
       of the block.

    A frame with a size multiple of 255 is coded with a 0 at the end of the size,
    for example 765 is coded 255;255;255;0.
*/
fn xiph_sizes(lace: &[u8], frame_count: usize, position: u64) -> Result<(Vec<usize>, usize)> {
    let mut sizes = Vec::with_capacity(frame_count);
    let mut offset = 0;

    for _ in 0..frame_count - 1 {
        let mut size = 0_usize;
        loop {
            let Some(&value) = lace.get(offset) else {
                return Err(DemuxError::MalformedLacing {
                    position,
                    reason: "lace header is shorter than declared",
                });
            };
            offset += 1;
            size += usize::from(value);
            if value != 255 {
                break;
            }
        }
        sizes.push(size);
    }

    complete_sizes(sizes, offset, lace.len(), position)
}

/*
    EBML lacing
     * Block head (with lacing bits set to 10)
     * Lacing head: Number of frames in the lace -1, i.e. 2 for frames of 800 and 500 octets
     * Lacing sizes: only the 2 first ones will be coded, 800 gives 0x320 0x4000 = 0x4320,
       500 is coded as -300 : - 0x12C + 0x1FFF + 0x4000 = 0x5ED3. The size of the last
       frame is deduced from the total size of the block.

    The first size is an unsigned VINT. Every following size is coded as the signed
    difference to the previous size.
*/
fn ebml_sizes(lace: &[u8], frame_count: usize, position: u64) -> Result<(Vec<usize>, usize)> {
    let truncated = || DemuxError::MalformedLacing {
        position,
        reason: "lace header is shorter than declared",
    };
    let mut sizes = Vec::with_capacity(frame_count);

    if frame_count == 1 {
        return complete_sizes(sizes, 0, lace.len(), position);
    }

    let (first, mut offset) = parse_vint(lace);
    if offset == 0 {
        return Err(truncated());
    }
    let mut size = usize::try_from(first).map_err(|_| DemuxError::MalformedLacing {
        position,
        reason: "frame size is too large",
    })?;
    sizes.push(size);

    for _ in 0..frame_count.saturating_sub(2) {
        let (delta, len) = parse_signed_vint(&lace[offset..]);
        if len == 0 {
            return Err(truncated());
        }
        offset += len;

        size = i64::try_from(size)
            .ok()
            .and_then(|size| size.checked_add(delta))
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(DemuxError::MalformedLacing {
                position,
                reason: "negative frame size",
            })?;
        sizes.push(size);
    }

    complete_sizes(sizes, offset, lace.len(), position)
}

/*
    Fixed-size lacing
     * Block head (with lacing bits set to 01)
     * Lacing head: Number of frames in the lace -1, i.e. 2

    Only the number of frames in the lace is saved, the size of each frame is
    deduced from the total size of the Block. Bytes that don't divide evenly
    are given to the last frame.
*/
fn fixed_sizes(total: usize, frame_count: usize, position: u64) -> Vec<usize> {
    let size = total / frame_count;
    let remainder = total % frame_count;
    if remainder != 0 {
        warn!("Fixed lacing at {position}: {total} bytes don't divide into {frame_count} frames");
    }
    let mut sizes = vec![size; frame_count];
    if let Some(last) = sizes.last_mut() {
        *last += remainder;
    }
    sizes
}
