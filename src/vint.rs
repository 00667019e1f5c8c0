//! EBML variable length integers.
//!
//! A VINT is 1 to 8 big-endian bytes. The number of leading zero bits of the
//! first byte plus one gives the length, the following `1` bit is the length
//! marker and everything after it carries the value.

/// The longest VINT EBML allows.
pub const MAX_VINT_LENGTH: usize = 8;

/// The longest element ID Matroska allows.
pub const MAX_ID_LENGTH: usize = 4;

/// Returns the length of the VINT that starts with the given byte.
///
/// Returns `None` for `0x00`, which would announce a VINT longer than 8 bytes.
pub const fn vint_length(first: u8) -> Option<usize> {
    if first == 0 {
        return None;
    }
    let mut length = 1;
    while first & (0x80 >> (length - 1)) == 0 {
        length += 1;
    }
    Some(length)
}

/// Parses an unsigned VINT from the start of `buf` and returns `(value, length)`.
///
/// The length marker is cleared from the value. Returns `(0, 0)` if `buf` is empty,
/// starts with `0x00` or is shorter than the announced length.
pub fn parse_vint(buf: &[u8]) -> (u64, usize) {
    let Some(&first) = buf.first() else {
        return (0, 0);
    };
    let Some(length) = vint_length(first) else {
        return (0, 0);
    };
    if buf.len() < length {
        return (0, 0);
    }

    let marker = 0x80_u8 >> (length - 1);
    let value = buf[1..length]
        .iter()
        .fold(u64::from(first & !marker), |acc, &b| (acc << 8) | u64::from(b));

    (value, length)
}

/// Parses an element ID from the start of `buf` and returns `(id, length)`.
///
/// The length marker is kept, so IDs compare equal to the values found in the
/// Matroska specification. Returns `(0, 0)` under the same conditions as
/// [`parse_vint`] and for IDs longer than four bytes.
pub fn parse_vint_id(buf: &[u8]) -> (u32, usize) {
    let Some(&first) = buf.first() else {
        return (0, 0);
    };
    let length = match vint_length(first) {
        Some(length) if length <= MAX_ID_LENGTH => length,
        _ => return (0, 0),
    };
    if buf.len() < length {
        return (0, 0);
    }

    let id = buf[..length]
        .iter()
        .fold(0_u32, |acc, &b| (acc << 8) | u32::from(b));

    (id, length)
}

/// Parses a signed VINT from the start of `buf` and returns `(value, length)`.
///
/// The unsigned value is shifted by `2^(7 * length - 1) - 1`, so `0xBF` is zero
/// and `0x80` is -63. Returns `(0, 0)` under the same conditions as [`parse_vint`].
pub fn parse_signed_vint(buf: &[u8]) -> (i64, usize) {
    let (value, length) = parse_vint(buf);
    if length == 0 {
        return (0, 0);
    }

    let bias = signed_bias(length);
    // Both operands are below 2^56, so they fit into an i64.
    let value = i64::try_from(value).unwrap_or(i64::MAX) - bias;

    (value, length)
}

/// Returns `true` if the VINT at the start of `buf` is the reserved "unknown size"
/// pattern, where every value bit is set.
pub fn is_unknown_size(buf: &[u8]) -> bool {
    let (value, length) = parse_vint(buf);
    length != 0 && value == max_value(length)
}

/// The largest value a VINT of the given length can carry, which is also the
/// reserved "unknown size" pattern for that length.
pub const fn max_value(length: usize) -> u64 {
    (1_u64 << (7 * length)) - 1
}

/// Encodes `value` as an unsigned VINT of exactly `length` bytes.
///
/// Returns `None` if the value doesn't fit into that length. The all-ones value
/// is refused because it would read back as "unknown size".
pub fn encode_vint(value: u64, length: usize) -> Option<Vec<u8>> {
    if length == 0 || length > MAX_VINT_LENGTH || value >= max_value(length) {
        return None;
    }

    let marker = 1_u64 << (7 * length);
    let bytes = (value | marker).to_be_bytes();

    Some(bytes[MAX_VINT_LENGTH - length..].to_vec())
}

/// Encodes `value` as an unsigned VINT using the shortest possible length.
pub fn encode_vint_minimal(value: u64) -> Option<Vec<u8>> {
    (1..=MAX_VINT_LENGTH)
        .find(|&length| value < max_value(length))
        .and_then(|length| encode_vint(value, length))
}

/// Encodes the reserved "unknown size" pattern of the given length.
pub fn encode_unknown_size(length: usize) -> Option<Vec<u8>> {
    if length == 0 || length > MAX_VINT_LENGTH {
        return None;
    }

    let bytes = ((1_u64 << (7 * length)) | max_value(length)).to_be_bytes();

    Some(bytes[MAX_VINT_LENGTH - length..].to_vec())
}

/// Encodes `value` as a signed VINT of exactly `length` bytes.
pub fn encode_signed_vint(value: i64, length: usize) -> Option<Vec<u8>> {
    if length == 0 || length > MAX_VINT_LENGTH {
        return None;
    }
    let raw = value.checked_add(signed_bias(length))?;
    let raw = u64::try_from(raw).ok()?;

    encode_vint(raw, length)
}

const fn signed_bias(length: usize) -> i64 {
    (1_i64 << (7 * length - 1)) - 1
}
