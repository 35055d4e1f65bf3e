//! Delta/common-value integer coding for Crate arrays.
//!
//! Values are stored as deltas from the previous value (the first delta is
//! from zero). A header carries the most common delta; a 2-bit code per
//! value then selects how its delta is stored:
//!
//! | code | storage            |
//! |------|--------------------|
//! | 0    | the common delta   |
//! | 1    | i8                 |
//! | 2    | i16 little-endian  |
//! | 3    | i32 (i64 for the 64-bit variant) little-endian |
//!
//! Layout: `[common delta][ceil(n/4) code bytes, 2 bits per value,
//! low bits first][variable-width deltas]`.

use crate::util::{Error, Result};

fn code_bytes(count: usize) -> usize {
    count.div_ceil(4)
}

fn read_code(codes: &[u8], index: usize) -> u8 {
    (codes[index / 4] >> ((index % 4) * 2)) & 0b11
}

/// Decode `count` 32-bit integers.
pub fn decode_u32(data: &[u8], count: usize) -> Result<Vec<u32>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let ncodes = code_bytes(count);
    if data.len() < 4 + ncodes {
        return Err(Error::structural(
            "INTS",
            0,
            "integer-coded block truncated",
        ));
    }
    let common = i32::from_le_bytes(data[0..4].try_into().expect("fixed slice"));
    let codes = &data[4..4 + ncodes];
    let mut pos = 4 + ncodes;

    let mut out = Vec::with_capacity(count);
    let mut prev: i32 = 0;
    for i in 0..count {
        let delta = match read_code(codes, i) {
            0 => common,
            1 => {
                let v = *data
                    .get(pos)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i8 delta truncated"))?
                    as i8;
                pos += 1;
                i32::from(v)
            }
            2 => {
                let bytes = data
                    .get(pos..pos + 2)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i16 delta truncated"))?;
                pos += 2;
                i32::from(i16::from_le_bytes(bytes.try_into().expect("fixed slice")))
            }
            _ => {
                let bytes = data
                    .get(pos..pos + 4)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i32 delta truncated"))?;
                pos += 4;
                i32::from_le_bytes(bytes.try_into().expect("fixed slice"))
            }
        };
        prev = prev.wrapping_add(delta);
        out.push(prev as u32);
    }
    Ok(out)
}

/// Encode 32-bit integers (used by tests and future writers).
pub fn encode_u32(values: &[u32]) -> Vec<u8> {
    let deltas: Vec<i32> = values
        .iter()
        .scan(0u32, |prev, &v| {
            let d = v.wrapping_sub(*prev) as i32;
            *prev = v;
            Some(d)
        })
        .collect();
    let common = most_common(&deltas).unwrap_or(0);

    let mut codes = vec![0u8; code_bytes(values.len())];
    let mut payload = Vec::new();
    for (i, &delta) in deltas.iter().enumerate() {
        let code: u8 = if delta == common {
            0
        } else if i8::try_from(delta).is_ok() {
            payload.push(delta as i8 as u8);
            1
        } else if i16::try_from(delta).is_ok() {
            payload.extend_from_slice(&(delta as i16).to_le_bytes());
            2
        } else {
            payload.extend_from_slice(&delta.to_le_bytes());
            3
        };
        codes[i / 4] |= code << ((i % 4) * 2);
    }

    let mut out = Vec::with_capacity(4 + codes.len() + payload.len());
    out.extend_from_slice(&common.to_le_bytes());
    out.extend_from_slice(&codes);
    out.extend_from_slice(&payload);
    out
}

/// Decode `count` 64-bit integers.
pub fn decode_u64(data: &[u8], count: usize) -> Result<Vec<u64>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let ncodes = code_bytes(count);
    if data.len() < 8 + ncodes {
        return Err(Error::structural(
            "INTS",
            0,
            "integer-coded block truncated",
        ));
    }
    let common = i64::from_le_bytes(data[0..8].try_into().expect("fixed slice"));
    let codes = &data[8..8 + ncodes];
    let mut pos = 8 + ncodes;

    let mut out = Vec::with_capacity(count);
    let mut prev: i64 = 0;
    for i in 0..count {
        let delta = match read_code(codes, i) {
            0 => common,
            1 => {
                let v = *data
                    .get(pos)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i8 delta truncated"))?
                    as i8;
                pos += 1;
                i64::from(v)
            }
            2 => {
                let bytes = data
                    .get(pos..pos + 2)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i16 delta truncated"))?;
                pos += 2;
                i64::from(i16::from_le_bytes(bytes.try_into().expect("fixed slice")))
            }
            _ => {
                let bytes = data
                    .get(pos..pos + 8)
                    .ok_or_else(|| Error::structural("INTS", pos as u64, "i64 delta truncated"))?;
                pos += 8;
                i64::from_le_bytes(bytes.try_into().expect("fixed slice"))
            }
        };
        prev = prev.wrapping_add(delta);
        out.push(prev as u64);
    }
    Ok(out)
}

/// Encode 64-bit integers.
pub fn encode_u64(values: &[u64]) -> Vec<u8> {
    let deltas: Vec<i64> = values
        .iter()
        .scan(0u64, |prev, &v| {
            let d = v.wrapping_sub(*prev) as i64;
            *prev = v;
            Some(d)
        })
        .collect();
    let common = most_common(&deltas).unwrap_or(0);

    let mut codes = vec![0u8; code_bytes(values.len())];
    let mut payload = Vec::new();
    for (i, &delta) in deltas.iter().enumerate() {
        let code: u8 = if delta == common {
            0
        } else if i8::try_from(delta).is_ok() {
            payload.push(delta as i8 as u8);
            1
        } else if i16::try_from(delta).is_ok() {
            payload.extend_from_slice(&(delta as i16).to_le_bytes());
            2
        } else {
            payload.extend_from_slice(&delta.to_le_bytes());
            3
        };
        codes[i / 4] |= code << ((i % 4) * 2);
    }

    let mut out = Vec::with_capacity(8 + codes.len() + payload.len());
    out.extend_from_slice(&common.to_le_bytes());
    out.extend_from_slice(&codes);
    out.extend_from_slice(&payload);
    out
}

fn most_common<T: Copy + PartialEq>(values: &[T]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for &candidate in values {
        let count = values.iter().filter(|&&v| v == candidate).count();
        match best {
            Some((_, n)) if n >= count => {}
            _ => best = Some((candidate, count)),
        }
    }
    best.map(|(v, _)| v)
}
