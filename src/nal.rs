//! Length-prefixed H.264 NAL unit splitting over an `mdat` payload.
//!
//! Every unit is stored as a 4-byte big-endian length followed by that many
//! bytes, the first of which is the NAL header
//! (`forbidden_zero_bit:1 | nal_ref_idc:2 | nal_unit_type:5`).

use crate::parser::{ParseError, Result};
use crate::reader::View;
use crate::registry::MdatData;
use crate::util::{hex_dump, split8};
use std::fmt::Write;
use tracing::debug;

const LENGTH_PREFIX: usize = 4;

/// One NAL unit, including its own length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Offset of the length prefix within the payload.
    pub offset: usize,
    pub data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// Unit bytes without the length prefix, starting at the NAL header.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[LENGTH_PREFIX..]
    }

    pub fn nal_ref_idc(&self) -> u8 {
        (self.payload()[0] >> 5) & 0b11
    }

    pub fn unit_type(&self) -> u8 {
        nal_unit_type(self.payload()[0])
    }

    pub fn type_name(&self) -> &'static str {
        nal_unit_type_name(self.unit_type())
    }
}

/// Single-pass iterator over the units of a payload.
///
/// The first error is yielded once and then the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct NalUnits<'a> {
    view: View<'a>,
    verbose: bool,
    done: bool,
}

impl<'a> NalUnits<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            view: View::new(payload),
            verbose: false,
            done: false,
        }
    }

    /// Log every unit at DEBUG as it is split off.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    fn read_unit(&mut self) -> Result<NalUnit<'a>> {
        let offset = self.view.position();
        let length = self.view.read_u32()? as usize;
        // a unit needs at least its header byte
        if length == 0 {
            return Err(ParseError::format(
                format!("nal@{:#x}", offset),
                "zero-length NAL unit",
            ));
        }

        let unit = self.view.read_bytes(length)?;
        let [forbidden_zero_bit, _nal_ref_idc, unit_type] = split8(unit[0], [1, 2, 5])?;
        if forbidden_zero_bit != 0 {
            return Err(ParseError::format(
                format!("nal@{:#x}", offset),
                format!("forbidden_zero_bit set in header byte {:#04x}", unit[0]),
            ));
        }

        if self.verbose {
            debug!(
                offset,
                length,
                unit_type,
                name = nal_unit_type_name(unit_type as u8),
                "NAL unit"
            );
        }

        Ok(NalUnit {
            offset,
            data: &self.view.as_slice()[offset..offset + LENGTH_PREFIX + length],
        })
    }
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = Result<NalUnit<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.view.is_at_end() {
            return None;
        }
        let item = self.read_unit();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for NalUnits<'_> {}

/// Split a whole payload; each slice keeps its 4-byte length prefix.
pub fn split_nal_units(payload: &[u8]) -> Result<Vec<&[u8]>> {
    NalUnits::new(payload).map(|unit| unit.map(|u| u.data)).collect()
}

/// `nal_unit_type` field of a NAL header byte.
pub fn nal_unit_type(header: u8) -> u8 {
    header & 0x1f
}

/// Short name for a `nal_unit_type` (H.264 Table 7-1).
pub fn nal_unit_type_name(unit_type: u8) -> &'static str {
    match unit_type {
        0 => "Unspecified",
        1 => "Non-IDR slice",
        2 => "Slice data partition A",
        3 => "Slice data partition B",
        4 => "Slice data partition C",
        5 => "IDR slice",
        6 => "SEI",
        7 => "SPS",
        8 => "PPS",
        9 => "AUD",
        10 => "End of sequence",
        11 => "End of stream",
        12 => "Filler data",
        13 => "SPS extension",
        14 => "Prefix NAL",
        15 => "Subset SPS",
        16..=18 => "Reserved",
        19 => "Auxiliary slice",
        20 => "Slice extension",
        21 => "Depth view slice extension",
        22 | 23 => "Reserved",
        _ => "Unspecified",
    }
}

impl<'a> MdatData<'a> {
    pub fn nal_units(&self) -> NalUnits<'a> {
        NalUnits::new(self.data)
    }

    /// Hex dump of every NAL unit, each titled with its index, type and size.
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        for (i, unit) in self.nal_units().enumerate() {
            let unit = unit?;
            let _ = writeln!(
                out,
                "NAL #{} type={} ({}) size={}",
                i,
                unit.unit_type(),
                unit.type_name(),
                unit.data.len()
            );
            out.push_str(&hex_dump(unit.data, unit.offset as u64));
        }
        debug!("mdat NAL dump\n{}", out);
        Ok(out)
    }
}
