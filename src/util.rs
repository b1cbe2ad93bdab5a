use crate::parser::{ParseError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Write;

/// Classic 16-bytes-per-row hex dump with an ASCII gutter.
///
/// `start_offset` is only used for the address column.
pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    let mut out = String::with_capacity(bytes.len() / 16 * 78 + 78);
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let offs = start_offset + (i as u64) * 16;
        let hexs: String = chunk.iter().map(|b| format!("{:02x} ", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{:08x}  {:<48}  |{}|", offs, hexs, ascii);
    }
    out
}

/// Split the low `width` bits of `value` into sub-fields, most significant first.
///
/// `pattern` holds the bit width of each field and must sum to `width`:
///
/// ```
/// let [pad, a, b, c] = avcbox::util::split_bits(0x15c7, 16, [1, 5, 5, 5]).unwrap();
/// assert_eq!((pad, a, b, c), (0, 5, 14, 7));
/// ```
pub fn split_bits<const N: usize>(value: u32, width: u32, pattern: [u32; N]) -> Result<[u32; N]> {
    let total: u32 = pattern.iter().sum();
    if total != width || width > 32 {
        return Err(ParseError::format(
            "bit split",
            format!("pattern {:?} does not cover {} bits", pattern, width),
        ));
    }

    let mut fields = [0u32; N];
    let mut shift = width;
    for (field, bits) in fields.iter_mut().zip(pattern) {
        shift -= bits;
        let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
        *field = (value >> shift) & mask;
    }
    Ok(fields)
}

pub fn split8<const N: usize>(value: u8, pattern: [u32; N]) -> Result<[u32; N]> {
    split_bits(value as u32, 8, pattern)
}

pub fn split16<const N: usize>(value: u16, pattern: [u32; N]) -> Result<[u32; N]> {
    split_bits(value as u32, 16, pattern)
}

/// Byte-per-char string conversion (ISO-8859-1), never fails.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) fn serialize_hex<T, S>(bytes: T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    s.serialize_str(&hex::encode(bytes.as_ref()))
}

pub(crate) fn serialize_len<T, S>(bytes: T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    s.serialize_u64(bytes.as_ref().len() as u64)
}

struct Keyed(&'static str, u32);

impl Serialize for Keyed {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(1))?;
        map.serialize_entry(self.0, &self.1)?;
        map.end()
    }
}

/// Render a flat table as `[{key: value}, ..]`.
fn serialize_keyed<T, S>(values: T, key: &'static str, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u32]>,
    S: Serializer,
{
    s.collect_seq(values.as_ref().iter().map(|&v| Keyed(key, v)))
}

pub(crate) fn serialize_sample_numbers<T, S>(values: T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u32]>,
    S: Serializer,
{
    serialize_keyed(values, "sample_number", s)
}

pub(crate) fn serialize_entry_sizes<T, S>(values: T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u32]>,
    S: Serializer,
{
    serialize_keyed(values, "entry_size", s)
}

pub(crate) fn serialize_chunk_offsets<T, S>(values: T, s: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u32]>,
    S: Serializer,
{
    serialize_keyed(values, "chunk_offset", s)
}
