use crate::boxes::{BoxHeader, BoxNode, BoxPath, Children};
use crate::known_boxes::KnownBox;
use crate::parser::{ParseContext, ParseError, Result, parse_children};
use crate::reader::View;
use crate::util::{
    latin1, serialize_chunk_offsets, serialize_entry_sizes, serialize_hex, serialize_len,
    serialize_sample_numbers, split8, split16,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Decoded fields of one box, one variant per supported type.
///
/// Pure containers carry no fields; their content lives in
/// [`BoxNode::children`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoxValue<'a> {
    Ftyp(FtypData),
    Moov,
    Mdat(MdatData<'a>),
    Free(FreeData<'a>),
    Mvhd(MvhdData),
    Trak,
    Tkhd(TkhdData),
    Edts,
    Elst(ElstData),
    Mdia,
    Mdhd(MdhdData),
    Hdlr(HdlrData),
    Minf,
    Vmhd(VmhdData),
    Dinf,
    Dref(DrefData),
    Url(UrlData),
    Stbl,
    Stsd(StsdData),
    Stts(SttsData),
    Stss(StssData),
    Stsc(StscData),
    Stsz(StszData),
    Stco(StcoData),
    Udta,
    Meta(MetaData),
    Ilst(IlstData<'a>),
    Avc1(Avc1Data),
    Avcc(AvccData<'a>),
}

/// File Type Box (ftyp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FtypData {
    pub major_brand: String,
    pub minor_version: u32,
    pub compatible_brands: Vec<String>,
}

/// Media Data Box (mdat); `data` borrows the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MdatData<'a> {
    #[serde(serialize_with = "serialize_len")]
    pub data: &'a [u8],
}

/// Free Space Box (free)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeData<'a> {
    #[serde(serialize_with = "serialize_hex")]
    pub data: &'a [u8],
}

/// Movie Header Box (mvhd), version 0 layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MvhdData {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    pub rate: u32,   // 16.16 fixed point
    pub volume: u16, // 8.8 fixed point
    pub matrix: [u32; 9],
    #[serde(rename = "next_track_ID")]
    pub next_track_id: u32,
}

/// Track Header Box (tkhd), version 0 layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TkhdData {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u32,
    pub modification_time: u32,
    #[serde(rename = "track_ID")]
    pub track_id: u32,
    pub duration: u32,
    pub layer: u16,
    pub alternate_group: u16,
    pub volume: u16,
    pub matrix: [u32; 9],
    pub width: u32,  // 16.16 fixed point
    pub height: u32, // 16.16 fixed point
}

impl TkhdData {
    pub fn width_px(&self) -> f64 {
        self.width as f64 / 65536.0
    }

    pub fn height_px(&self) -> f64 {
        self.height as f64 / 65536.0
    }
}

/// Edit List Box (elst)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElstData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    pub entries: Vec<ElstEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElstEntry {
    pub segment_duration: u32,
    pub media_time: u32, // 0xFFFF_FFFF marks an empty edit
    pub media_rate_integer: u16,
    pub media_rate_fraction: u16,
}

/// Media Header Box (mdhd)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MdhdData {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    pub language: String,
}

/// Handler Reference Box (hdlr)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HdlrData {
    pub version: u8,
    pub flags: u32,
    pub handler_type: String,
    pub handler_type2: u32,
    pub name: String,
}

/// Video Media Header Box (vmhd)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmhdData {
    pub version: u8,
    pub flags: u32,
    pub graphicsmode: u16,
    pub opcolor: [u16; 3],
}

/// Data Reference Box (dref); entries are child boxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrefData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

/// Data Entry URL Box (url )
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlData {
    pub version: u8,
    pub flags: u32, // 1 = media is in this file
    pub url: String,
}

/// Sample Description Box (stsd); sample entries are child boxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StsdData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

/// Decoding Time-to-Sample Box (stts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SttsData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    #[serde(rename = "samples")]
    pub entries: Vec<SttsEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Sync Sample Box (stss)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StssData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    #[serde(rename = "samples", serialize_with = "serialize_sample_numbers")]
    pub sample_numbers: Vec<u32>,
}

/// Sample-to-Chunk Box (stsc)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StscData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    #[serde(rename = "samples")]
    pub entries: Vec<StscEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// Sample Size Box (stsz)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StszData {
    pub version: u8,
    pub flags: u32,
    pub sample_size: u32,
    pub sample_count: u32,
    #[serde(rename = "samples", serialize_with = "serialize_entry_sizes")]
    pub sample_sizes: Vec<u32>, // Empty if sample_size > 0
}

/// Chunk Offset Box (stco)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StcoData {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
    #[serde(rename = "samples", serialize_with = "serialize_chunk_offsets")]
    pub chunk_offsets: Vec<u32>,
}

/// Meta Box (meta); handler and items are child boxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaData {
    pub version: u8,
    pub flags: u32,
}

/// QuickTime item list (ilst), kept raw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IlstData<'a> {
    #[serde(serialize_with = "serialize_hex")]
    pub data: &'a [u8],
}

/// AVC visual sample entry (avc1); avcC follows as a child box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Avc1Data {
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    pub horizresolution: u32, // 16.16, 0x00480000 = 72 dpi
    pub vertresolution: u32,
    pub frame_count: u16,
    pub compressorname: String,
    pub depth: u16,
}

/// AVC decoder configuration record (avcC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvccData<'a> {
    #[serde(rename = "configurationVersion")]
    pub configuration_version: u8,
    #[serde(rename = "AVCProfileIndication")]
    pub avc_profile_indication: u8,
    pub profile_compatibility: u8,
    #[serde(rename = "AVCLevelIndication")]
    pub avc_level_indication: u8,
    #[serde(rename = "lengthSizeMinusOne")]
    pub length_size_minus_one: u8,
    #[serde(rename = "numOfSequenceParameterSets")]
    pub num_of_sequence_parameter_sets: u8,
    #[serde(rename = "SPS")]
    pub sps: Vec<SequenceParameterSet<'a>>,
    #[serde(rename = "numOfPictureParameterSets")]
    pub num_of_picture_parameter_sets: u8,
    #[serde(rename = "PPS")]
    pub pps: Vec<PictureParameterSet<'a>>,
}

impl AvccData<'_> {
    /// Width in bytes of the NAL length prefixes in this track's samples.
    pub fn nal_length_size(&self) -> usize {
        self.length_size_minus_one as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceParameterSet<'a> {
    #[serde(rename = "sequenceParameterSetLength")]
    pub sequence_parameter_set_length: u16,
    #[serde(rename = "sequenceParameterSetNALUnit", serialize_with = "serialize_hex")]
    pub sequence_parameter_set_nal_unit: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PictureParameterSet<'a> {
    #[serde(rename = "pictureParameterSetLength")]
    pub picture_parameter_set_length: u16,
    #[serde(rename = "pictureParameterSetNALUnit", serialize_with = "serialize_hex")]
    pub picture_parameter_set_nal_unit: &'a [u8],
}

impl fmt::Display for BoxValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxValue::Ftyp(d) => write!(
                f,
                "major={} minor={} compatible={:?}",
                d.major_brand, d.minor_version, d.compatible_brands
            ),
            BoxValue::Mdat(d) => write!(f, "{} bytes", d.data.len()),
            BoxValue::Free(d) => write!(f, "{} bytes", d.data.len()),
            BoxValue::Ilst(d) => write!(f, "{} bytes", d.data.len()),
            BoxValue::Mvhd(d) => write!(
                f,
                "timescale={} duration={} next_track_id={}",
                d.timescale, d.duration, d.next_track_id
            ),
            BoxValue::Tkhd(d) => write!(
                f,
                "track_id={} duration={} width={} height={}",
                d.track_id,
                d.duration,
                d.width_px(),
                d.height_px()
            ),
            BoxValue::Elst(d) => write!(f, "version={} entries={}", d.version, d.entry_count),
            BoxValue::Mdhd(d) => write!(
                f,
                "timescale={} duration={} language={}",
                d.timescale, d.duration, d.language
            ),
            BoxValue::Hdlr(d) => write!(f, "handler={} name={:?}", d.handler_type, d.name),
            BoxValue::Vmhd(d) => write!(
                f,
                "graphicsmode={} opcolor={:?}",
                d.graphicsmode, d.opcolor
            ),
            BoxValue::Dref(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Url(d) => write!(f, "flags={:#x} url={:?}", d.flags, d.url),
            BoxValue::Stsd(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Stts(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Stss(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Stsc(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Stsz(d) => write!(
                f,
                "sample_size={} sample_count={}",
                d.sample_size, d.sample_count
            ),
            BoxValue::Stco(d) => write!(f, "entry_count={}", d.entry_count),
            BoxValue::Meta(d) => write!(f, "version={} flags={:#x}", d.version, d.flags),
            BoxValue::Avc1(d) => write!(
                f,
                "{}x{} compressor={:?} depth={:#x}",
                d.width, d.height, d.compressorname, d.depth
            ),
            BoxValue::Avcc(d) => write!(
                f,
                "profile={} level={} nal_length_size={} sps={} pps={}",
                d.avc_profile_indication,
                d.avc_level_indication,
                d.nal_length_size(),
                d.sps.len(),
                d.pps.len()
            ),
            BoxValue::Moov
            | BoxValue::Trak
            | BoxValue::Edts
            | BoxValue::Mdia
            | BoxValue::Minf
            | BoxValue::Dinf
            | BoxValue::Stbl
            | BoxValue::Udta => Ok(()),
        }
    }
}

// ---------- Decoder table ----------

/// Decode one recognized box whose view is positioned just after its header.
///
/// Boxes with children recurse into the dispatcher; `index` is this box's
/// position among same-typed siblings and is appended to the breadcrumb of
/// its descendants when the type is array-valued.
pub(crate) fn decode_box<'a>(
    kind: KnownBox,
    header: BoxHeader,
    view: &mut View<'a>,
    path: &BoxPath,
    index: usize,
    ctx: &mut ParseContext<'_>,
) -> Result<BoxNode<'a>> {
    let inner = if kind.is_array() {
        path.clone().with_index(index)
    } else {
        path.clone()
    };
    let mut children = Children::new();

    let value = match kind {
        KnownBox::Ftyp => BoxValue::Ftyp(decode_ftyp(view)?),
        KnownBox::Mdat => BoxValue::Mdat(MdatData { data: view.rest() }),
        KnownBox::Free => BoxValue::Free(FreeData { data: view.rest() }),
        KnownBox::Ilst => BoxValue::Ilst(IlstData { data: view.rest() }),
        KnownBox::Mvhd => BoxValue::Mvhd(decode_mvhd(view, path, ctx)?),
        KnownBox::Tkhd => BoxValue::Tkhd(decode_tkhd(view, path, ctx)?),
        KnownBox::Elst => BoxValue::Elst(decode_elst(view)?),
        KnownBox::Mdhd => BoxValue::Mdhd(decode_mdhd(view, path, ctx)?),
        KnownBox::Hdlr => BoxValue::Hdlr(decode_hdlr(view, path, ctx)?),
        KnownBox::Vmhd => BoxValue::Vmhd(decode_vmhd(view, path, ctx)?),
        KnownBox::Url => BoxValue::Url(decode_url(view, path, ctx)?),
        KnownBox::Stts => BoxValue::Stts(decode_stts(view)?),
        KnownBox::Stss => BoxValue::Stss(decode_stss(view)?),
        KnownBox::Stsc => BoxValue::Stsc(decode_stsc(view)?),
        KnownBox::Stsz => BoxValue::Stsz(decode_stsz(view)?),
        KnownBox::Stco => BoxValue::Stco(decode_stco(view)?),
        KnownBox::Avcc => BoxValue::Avcc(decode_avcc(view, path)?),

        KnownBox::Moov => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Moov
        }
        KnownBox::Trak => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Trak
        }
        KnownBox::Edts => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Edts
        }
        KnownBox::Mdia => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Mdia
        }
        KnownBox::Minf => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Minf
        }
        KnownBox::Dinf => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Dinf
        }
        KnownBox::Stbl => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Stbl
        }
        KnownBox::Udta => {
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Udta
        }

        KnownBox::Meta => {
            let (version, flags) = read_full_box_header(view)?;
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Meta(MetaData { version, flags })
        }
        KnownBox::Dref => {
            let dref = decode_dref(view, path, ctx)?;
            children = parse_children(view, &inner, ctx)?;
            check_entry_count(ctx, path, dref.entry_count, &children);
            BoxValue::Dref(dref)
        }
        KnownBox::Stsd => {
            let stsd = decode_stsd(view, path, ctx)?;
            children = parse_children(view, &inner, ctx)?;
            check_entry_count(ctx, path, stsd.entry_count, &children);
            BoxValue::Stsd(stsd)
        }
        KnownBox::Avc1 => {
            let avc1 = decode_avc1(view, path, ctx)?;
            children = parse_children(view, &inner, ctx)?;
            BoxValue::Avc1(avc1)
        }

        KnownBox::Unknown(typ) => {
            return Err(ParseError::format(
                path.to_string(),
                format!("no decoder for box type {}", typ),
            ));
        }
    };

    Ok(BoxNode {
        header,
        value,
        children,
    })
}

// ---------- Helpers ----------

fn read_full_box_header(view: &mut View<'_>) -> Result<(u8, u32)> {
    let version = view.read_u8()?;
    let flags = view.read_u24()?;
    Ok((version, flags))
}

fn read_u32_array<const N: usize>(view: &mut View<'_>) -> Result<[u32; N]> {
    let mut out = [0u32; N];
    for v in &mut out {
        *v = view.read_u32()?;
    }
    Ok(out)
}

/// Capacity hint that a bogus entry_count cannot inflate past the body size.
fn entries_capacity(count: u32, view: &View<'_>, entry_size: usize) -> usize {
    (count as usize).min(view.remaining() / entry_size)
}

fn check_entry_count(ctx: &ParseContext<'_>, path: &BoxPath, declared: u32, children: &Children<'_>) {
    let decoded: usize = children.iter().map(|(_, node)| node.len()).sum();
    if (decoded as u64) > declared as u64 {
        if ctx.options.verify {
            warn!(%path, declared, decoded, "more child entries than entry_count declares");
        }
    } else if (decoded as u64) < declared as u64 {
        debug!(%path, declared, decoded, "some declared entries were not decoded");
    }
}

/// `string[32]` compressor name: a length byte followed by the name.
fn compressor_name(raw: &[u8]) -> String {
    match raw.split_first() {
        Some((&n, rest)) if (n as usize) <= rest.len() => latin1(&rest[..n as usize]),
        _ => latin1(raw).trim_end_matches('\0').to_string(),
    }
}

// ---------- Decoders ----------

// ftyp: major + minor + compatible brands
fn decode_ftyp(view: &mut View<'_>) -> Result<FtypData> {
    let major_brand = view.read_str(4)?;
    let minor_version = view.read_u32()?;

    let mut compatible_brands = Vec::with_capacity(view.remaining() / 4);
    while view.remaining() >= 4 {
        compatible_brands.push(view.read_str(4)?);
    }

    Ok(FtypData {
        major_brand,
        minor_version,
        compatible_brands,
    })
}

fn decode_mvhd(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<MvhdData> {
    let (version, flags) = read_full_box_header(view)?;

    let creation_time = view.read_u32()?;
    let modification_time = view.read_u32()?;
    let timescale = view.read_u32()?;
    let duration = view.read_u32()?;
    let rate = view.read_u32()?;
    let volume = view.read_u16()?;
    let reserved1 = view.read_u16()?;
    let reserved2 = view.read_u32()?;
    let reserved3 = view.read_u32()?;
    let matrix = read_u32_array::<9>(view)?;
    let pre_defined = read_u32_array::<6>(view)?;
    let next_track_id = view.read_u32()?;

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 0);
    ctx.expect(path, "reserved1", reserved1, 0);
    ctx.expect(path, "reserved2", reserved2, 0);
    ctx.expect(path, "reserved3", reserved3, 0);
    ctx.expect(path, "pre_defined", pre_defined, [0; 6]);

    Ok(MvhdData {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        rate,
        volume,
        matrix,
        next_track_id,
    })
}

fn decode_tkhd(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<TkhdData> {
    // flags are usually 3 (enabled | in_movie) and are not checked
    let (version, flags) = read_full_box_header(view)?;

    let creation_time = view.read_u32()?;
    let modification_time = view.read_u32()?;
    let track_id = view.read_u32()?;
    let reserved1 = view.read_u32()?;
    let duration = view.read_u32()?;
    let reserved2 = view.read_u32()?;
    let reserved3 = view.read_u32()?;
    let layer = view.read_u16()?;
    let alternate_group = view.read_u16()?;
    let volume = view.read_u16()?;
    let reserved4 = view.read_u16()?;
    let matrix = read_u32_array::<9>(view)?;
    let width = view.read_u32()?;
    let height = view.read_u32()?;

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "reserved1", reserved1, 0);
    ctx.expect(path, "reserved2", reserved2, 0);
    ctx.expect(path, "reserved3", reserved3, 0);
    ctx.expect(path, "reserved4", reserved4, 0);

    Ok(TkhdData {
        version,
        flags,
        creation_time,
        modification_time,
        track_id,
        duration,
        layer,
        alternate_group,
        volume,
        matrix,
        width,
        height,
    })
}

fn decode_elst(view: &mut View<'_>) -> Result<ElstData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    let mut entries = Vec::with_capacity(entries_capacity(entry_count, view, 12));
    for _ in 0..entry_count {
        entries.push(ElstEntry {
            segment_duration: view.read_u32()?,
            media_time: view.read_u32()?,
            media_rate_integer: view.read_u16()?,
            media_rate_fraction: view.read_u16()?,
        });
    }

    Ok(ElstData {
        version,
        flags,
        entry_count,
        entries,
    })
}

fn decode_mdhd(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<MdhdData> {
    let (version, flags) = read_full_box_header(view)?;

    let creation_time = view.read_u32()?;
    let modification_time = view.read_u32()?;
    let timescale = view.read_u32()?;
    let duration = view.read_u32()?;
    // pad(1) + three 5-bit letters, ISO-639-2/T
    let [_pad, c1, c2, c3] = split16(view.read_u16()?, [1, 5, 5, 5])?;
    let language: String = [c1, c2, c3]
        .iter()
        .map(|&c| char::from(0x60 + c as u8))
        .collect();
    let pre_defined = view.read_u16()?;

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 0);
    ctx.expect(path, "pre_defined", pre_defined, 0);

    Ok(MdhdData {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        language,
    })
}

// hdlr: handler type + name
fn decode_hdlr(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<HdlrData> {
    let (version, flags) = read_full_box_header(view)?;

    let pre_defined = view.read_u32()?;
    let handler_type = view.read_str(4)?;
    let handler_type2 = view.read_u32()?; // "appl" in QuickTime files, else 0
    let reserved2 = view.read_u32()?;
    let reserved3 = view.read_u32()?;
    let name = view.read_cstr();

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 0);
    ctx.expect(path, "pre_defined", pre_defined, 0);
    ctx.expect(path, "reserved2", reserved2, 0);
    ctx.expect(path, "reserved3", reserved3, 0);

    Ok(HdlrData {
        version,
        flags,
        handler_type,
        handler_type2,
        name,
    })
}

fn decode_vmhd(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<VmhdData> {
    let (version, flags) = read_full_box_header(view)?;

    let graphicsmode = view.read_u16()?;
    let opcolor = [view.read_u16()?, view.read_u16()?, view.read_u16()?];

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 1);

    Ok(VmhdData {
        version,
        flags,
        graphicsmode,
        opcolor,
    })
}

fn decode_dref(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<DrefData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 0);

    Ok(DrefData {
        version,
        flags,
        entry_count,
    })
}

fn decode_url(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<UrlData> {
    let (version, flags) = read_full_box_header(view)?;
    let url = latin1(view.rest()).trim_end_matches('\0').to_string();

    ctx.expect(path, "version", version, 0);

    Ok(UrlData {
        version,
        flags,
        url,
    })
}

fn decode_stsd(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<StsdData> {
    let (version, flags) = read_full_box_header(view)?;

    ctx.expect(path, "version", version, 0);
    ctx.expect(path, "flags", flags, 0);

    let entry_count = view.read_u32()?;

    Ok(StsdData {
        version,
        flags,
        entry_count,
    })
}

// stts: time-to-sample
fn decode_stts(view: &mut View<'_>) -> Result<SttsData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    let mut entries = Vec::with_capacity(entries_capacity(entry_count, view, 8));
    for _ in 0..entry_count {
        let sample_count = view.read_u32()?;
        let sample_delta = view.read_u32()?;
        entries.push(SttsEntry {
            sample_count,
            sample_delta,
        });
    }

    Ok(SttsData {
        version,
        flags,
        entry_count,
        entries,
    })
}

// stss: sync sample table
fn decode_stss(view: &mut View<'_>) -> Result<StssData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    let mut sample_numbers = Vec::with_capacity(entries_capacity(entry_count, view, 4));
    for _ in 0..entry_count {
        sample_numbers.push(view.read_u32()?);
    }

    Ok(StssData {
        version,
        flags,
        entry_count,
        sample_numbers,
    })
}

// stsc: sample-to-chunk
fn decode_stsc(view: &mut View<'_>) -> Result<StscData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    let mut entries = Vec::with_capacity(entries_capacity(entry_count, view, 12));
    for _ in 0..entry_count {
        let first_chunk = view.read_u32()?;
        let samples_per_chunk = view.read_u32()?;
        let sample_description_index = view.read_u32()?;
        entries.push(StscEntry {
            first_chunk,
            samples_per_chunk,
            sample_description_index,
        });
    }

    Ok(StscData {
        version,
        flags,
        entry_count,
        entries,
    })
}

// stsz: sample sizes
fn decode_stsz(view: &mut View<'_>) -> Result<StszData> {
    let (version, flags) = read_full_box_header(view)?;
    let sample_size = view.read_u32()?;
    let sample_count = view.read_u32()?;

    // If sample_size is 0, each sample has its own size
    let mut sample_sizes = Vec::new();
    if sample_size == 0 {
        sample_sizes.reserve(entries_capacity(sample_count, view, 4));
        for _ in 0..sample_count {
            sample_sizes.push(view.read_u32()?);
        }
    }

    Ok(StszData {
        version,
        flags,
        sample_size,
        sample_count,
        sample_sizes,
    })
}

// stco: 32-bit chunk offsets
fn decode_stco(view: &mut View<'_>) -> Result<StcoData> {
    let (version, flags) = read_full_box_header(view)?;
    let entry_count = view.read_u32()?;

    let mut chunk_offsets = Vec::with_capacity(entries_capacity(entry_count, view, 4));
    for _ in 0..entry_count {
        chunk_offsets.push(view.read_u32()?);
    }

    Ok(StcoData {
        version,
        flags,
        entry_count,
        chunk_offsets,
    })
}

fn decode_avc1(view: &mut View<'_>, path: &BoxPath, ctx: &ParseContext<'_>) -> Result<Avc1Data> {
    // SampleEntry
    let reserved0 = view.read_u32()?;
    let reserved1 = view.read_u16()?;
    let data_reference_index = view.read_u16()?;
    // VisualSampleEntry
    let pre_defined1 = view.read_u16()?;
    let reserved2 = view.read_u16()?;
    let pre_defined2 = read_u32_array::<3>(view)?;
    let width = view.read_u16()?;
    let height = view.read_u16()?;
    let horizresolution = view.read_u32()?;
    let vertresolution = view.read_u32()?;
    let reserved3 = view.read_u32()?;
    let frame_count = view.read_u16()?;
    let compressorname = compressor_name(view.read_bytes(32)?);
    let depth = view.read_u16()?;
    let pre_defined3 = view.read_u16()?;

    ctx.expect(path, "reserved0", reserved0, 0);
    ctx.expect(path, "reserved1", reserved1, 0);
    ctx.expect(path, "pre_defined1", pre_defined1, 0);
    ctx.expect(path, "reserved2", reserved2, 0);
    ctx.expect(path, "pre_defined2", pre_defined2, [0; 3]);
    ctx.expect(path, "reserved3", reserved3, 0);
    ctx.expect(path, "pre_defined3", pre_defined3, 0xFFFF);

    Ok(Avc1Data {
        data_reference_index,
        width,
        height,
        horizresolution,
        vertresolution,
        frame_count,
        compressorname,
        depth,
    })
}

/// AVCDecoderConfigurationRecord.
///
/// The version and both reserved bit runs gate the length-prefixed SPS/PPS
/// parsing that follows, so a mismatch is fatal rather than a warning.
fn decode_avcc<'a>(view: &mut View<'a>, path: &BoxPath) -> Result<AvccData<'a>> {
    let configuration_version = view.read_u8()?;
    let avc_profile_indication = view.read_u8()?;
    let profile_compatibility = view.read_u8()?;
    let avc_level_indication = view.read_u8()?;
    let [reserved1, length_size_minus_one] = split8(view.read_u8()?, [6, 2])?;
    let [reserved2, num_of_sequence_parameter_sets] = split8(view.read_u8()?, [3, 5])?;

    if configuration_version != 1 || reserved1 != 0b11_1111 || reserved2 != 0b111 {
        return Err(ParseError::format(
            path.to_string(),
            format!(
                "avcC misread: configurationVersion={} reserved=0b{:06b}/0b{:03b}",
                configuration_version, reserved1, reserved2
            ),
        ));
    }

    let mut sps = Vec::with_capacity(num_of_sequence_parameter_sets as usize);
    for _ in 0..num_of_sequence_parameter_sets {
        let length = view.read_u16()?;
        sps.push(SequenceParameterSet {
            sequence_parameter_set_length: length,
            sequence_parameter_set_nal_unit: view.read_bytes(length as usize)?,
        });
    }

    let num_of_picture_parameter_sets = view.read_u8()?;
    let mut pps = Vec::with_capacity(num_of_picture_parameter_sets as usize);
    for _ in 0..num_of_picture_parameter_sets {
        let length = view.read_u16()?;
        pps.push(PictureParameterSet {
            picture_parameter_set_length: length,
            picture_parameter_set_nal_unit: view.read_bytes(length as usize)?,
        });
    }

    Ok(AvccData {
        configuration_version,
        avc_profile_indication,
        profile_compatibility,
        avc_level_indication,
        length_size_minus_one: length_size_minus_one as u8,
        num_of_sequence_parameter_sets: num_of_sequence_parameter_sets as u8,
        sps,
        num_of_picture_parameter_sets,
        pps,
    })
}
