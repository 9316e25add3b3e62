//! Index parsing and bounds normalization shared by the array traps.

/// Largest array index; larger digit keys are named properties.
pub const MAX_INDEX: u64 = 4_294_967_294;

/// Parses an array index key.
///
/// Only canonical integers in `[0, MAX_INDEX]` are indices (`"0"`, `"42"`);
/// keys with a leading zero, a sign, any non-digit, or a larger value are
/// named properties.
pub fn parse_index(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let index: u64 = key.parse().ok()?;
    if index > MAX_INDEX {
        return None;
    }
    usize::try_from(index).ok()
}

/// Resolves a relative position against `len` the way native array methods
/// do: `None` takes `default`, negative offsets count back from the end,
/// and the result is clamped into `[0, len]`.
pub fn relative_index(pos: Option<i64>, default: usize, len: usize) -> usize {
    match pos {
        None => default,
        Some(p) if p < 0 => {
            let back = p.unsigned_abs();
            (len as u64).saturating_sub(back) as usize
        }
        Some(p) => (p as u64).min(len as u64) as usize,
    }
}

/// Clamps a splice delete count into `[0, len - start]`; `None` removes
/// everything from `start` on.
pub fn clamp_delete_count(count: Option<i64>, start: usize, len: usize) -> usize {
    let available = len - start;
    match count {
        None => available,
        Some(c) if c <= 0 => 0,
        Some(c) => (c as u64).min(available as u64) as usize,
    }
}
