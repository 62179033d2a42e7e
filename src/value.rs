//! The tagged value grammar: fixints, nil, list markers, floats, explicit
//! integer widths, and a length-prefixed string, serialized directly into
//! the endpoint's frame buffers.
//!
//! Every `put_*`/`get_*` here takes the buffer and cursor explicitly rather
//! than owning them, so the same functions serve both the transmit and
//! receive cursors of [`crate::Endpoint`] without duplication, and so they
//! can be exercised directly in tests without an endpoint.

pub const TAG_NIL: u8 = 0x80;
pub const TAG_LIST_OPEN: u8 = 0x81;
pub const TAG_LIST_CLOSE: u8 = 0x82;
pub const TAG_STRING: u8 = 0x83;
pub const TAG_FLOAT32: u8 = 0x84;
pub const TAG_FLOAT64: u8 = 0x85;
pub const TAG_INT8: u8 = 0x88;
pub const TAG_INT16: u8 = 0x89;
pub const TAG_INT32: u8 = 0x8A;
pub const TAG_INT64: u8 = 0x8B;

/// Largest string payload `put_string` will accept: one length byte, so at
/// most 252 leaves headroom for a leading fixint and a following tag inside
/// a 254-byte MTU frame. Not required by the wire format itself.
pub const MAX_STRING_LEN: usize = 252;

fn fits(_buf: &[u8], pos: usize, limit: usize, n: usize) -> bool {
    pos + n <= limit
}

pub fn put_nil(buf: &mut [u8], pos: &mut usize, limit: usize) -> bool {
    if !fits(buf, *pos, limit, 1) {
        return false;
    }
    buf[*pos] = TAG_NIL;
    *pos += 1;
    true
}

pub fn put_list_open(buf: &mut [u8], pos: &mut usize, limit: usize) -> bool {
    if !fits(buf, *pos, limit, 1) {
        return false;
    }
    buf[*pos] = TAG_LIST_OPEN;
    *pos += 1;
    true
}

pub fn put_list_close(buf: &mut [u8], pos: &mut usize, limit: usize) -> bool {
    if !fits(buf, *pos, limit, 1) {
        return false;
    }
    buf[*pos] = TAG_LIST_CLOSE;
    *pos += 1;
    true
}

pub fn put_string(buf: &mut [u8], pos: &mut usize, limit: usize, s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_STRING_LEN || !fits(buf, *pos, limit, 2 + bytes.len()) {
        return false;
    }
    buf[*pos] = TAG_STRING;
    buf[*pos + 1] = bytes.len() as u8;
    buf[*pos + 2..*pos + 2 + bytes.len()].copy_from_slice(bytes);
    *pos += 2 + bytes.len();
    true
}

pub fn put_int(buf: &mut [u8], pos: &mut usize, limit: usize, v: i64) -> bool {
    if (-64..=127).contains(&v) {
        if !fits(buf, *pos, limit, 1) {
            return false;
        }
        buf[*pos] = v as i8 as u8;
        *pos += 1;
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
        if !fits(buf, *pos, limit, 3) {
            return false;
        }
        let b = (v as i16).to_be_bytes();
        buf[*pos] = TAG_INT16;
        buf[*pos + 1..*pos + 3].copy_from_slice(&b);
        *pos += 3;
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
        if !fits(buf, *pos, limit, 5) {
            return false;
        }
        let b = (v as i32).to_be_bytes();
        buf[*pos] = TAG_INT32;
        buf[*pos + 1..*pos + 5].copy_from_slice(&b);
        *pos += 5;
    } else {
        if !fits(buf, *pos, limit, 9) {
            return false;
        }
        let b = v.to_be_bytes();
        buf[*pos] = TAG_INT64;
        buf[*pos + 1..*pos + 9].copy_from_slice(&b);
        *pos += 9;
    }
    true
}

pub fn put_f32(buf: &mut [u8], pos: &mut usize, limit: usize, v: f32) -> bool {
    if !fits(buf, *pos, limit, 5) {
        return false;
    }
    buf[*pos] = TAG_FLOAT32;
    buf[*pos + 1..*pos + 5].copy_from_slice(&v.to_be_bytes());
    *pos += 5;
    true
}

pub fn put_f64(buf: &mut [u8], pos: &mut usize, limit: usize, v: f64) -> bool {
    if !fits(buf, *pos, limit, 9) {
        return false;
    }
    buf[*pos] = TAG_FLOAT64;
    buf[*pos + 1..*pos + 9].copy_from_slice(&v.to_be_bytes());
    *pos += 9;
    true
}

/// Reads one integer tag. Restores `*pos` on every failure path, per the
/// atomicity rule: a caller may retry with a different typed getter.
pub fn get_int(buf: &[u8], pos: &mut usize, end: usize) -> Option<i64> {
    let start = *pos;
    if start >= end {
        return None;
    }
    let tag = buf[start];

    // fixint: the tag byte itself, interpreted as a signed 8-bit value in [-64, 127]
    let as_i8 = tag as i8 as i64;
    if (-64..=127).contains(&as_i8) {
        *pos = start + 1;
        return Some(as_i8);
    }

    let width = match tag {
        TAG_INT8 => 1,
        TAG_INT16 => 2,
        TAG_INT32 => 4,
        TAG_INT64 => 8,
        _ => return None,
    };

    if start + 1 + width > end {
        return None;
    }

    let body = &buf[start + 1..start + 1 + width];
    let value = match tag {
        TAG_INT8 => body[0] as i8 as i64,
        TAG_INT16 => i16::from_be_bytes([body[0], body[1]]) as i64,
        TAG_INT32 => i32::from_be_bytes([body[0], body[1], body[2], body[3]]) as i64,
        TAG_INT64 => i64::from_be_bytes([
            body[0], body[1], body[2], body[3], body[4], body[5], body[6], body[7],
        ]),
        _ => unreachable!(),
    };

    *pos = start + 1 + width;
    Some(value)
}

pub fn get_f32(buf: &[u8], pos: &mut usize, end: usize) -> Option<f32> {
    let start = *pos;
    if start >= end || buf[start] != TAG_FLOAT32 {
        return None;
    }
    if start + 5 > end {
        return None;
    }
    let b = &buf[start + 1..start + 5];
    *pos = start + 5;
    Some(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn get_f64(buf: &[u8], pos: &mut usize, end: usize) -> Option<f64> {
    let start = *pos;
    if start >= end || buf[start] != TAG_FLOAT64 {
        return None;
    }
    if start + 9 > end {
        return None;
    }
    let b = &buf[start + 1..start + 9];
    *pos = start + 9;
    Some(f64::from_be_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Tries FLOAT32 then FLOAT64, widening either to `f64`.
pub fn get_float(buf: &[u8], pos: &mut usize, end: usize) -> Option<f64> {
    if let Some(v) = get_f32(buf, pos, end) {
        return Some(v as f64);
    }
    get_f64(buf, pos, end)
}

/// Tries `get_float` first, then `get_int` converted to `f64`, so a caller
/// can treat integers and floats as interchangeable numeric values.
pub fn get_number(buf: &[u8], pos: &mut usize, end: usize) -> Option<f64> {
    if let Some(v) = get_float(buf, pos, end) {
        return Some(v);
    }
    get_int(buf, pos, end).map(|v| v as f64)
}

pub fn get_string<'a>(buf: &'a [u8], pos: &mut usize, end: usize) -> Option<&'a str> {
    let start = *pos;
    if start >= end || buf[start] != TAG_STRING {
        return None;
    }
    if start + 2 > end {
        return None;
    }
    let len = buf[start + 1] as usize;
    if start + 2 + len > end {
        return None;
    }
    let bytes = &buf[start + 2..start + 2 + len];
    match core::str::from_utf8(bytes) {
        Ok(s) => {
            *pos = start + 2 + len;
            Some(s)
        }
        Err(_) => None,
    }
}
