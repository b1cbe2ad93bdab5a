#![allow(dead_code)]

//! Byte builders for synthetic MP4 files.

pub fn bx(typ: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + body.len());
    v.extend_from_slice(&(8 + body.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(body);
    v
}

pub fn full_box(typ: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut payload = vec![version];
    payload.extend_from_slice(&flags.to_be_bytes()[1..]);
    payload.extend_from_slice(body);
    bx(typ, &payload)
}

pub fn container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    bx(typ, &children.concat())
}

pub fn ftyp() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"isom");
    body.extend_from_slice(&512u32.to_be_bytes());
    body.extend_from_slice(b"isomiso2avc1mp41");
    bx(b"ftyp", &body)
}

const IDENTITY: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

fn push_matrix(body: &mut Vec<u8>) {
    for v in IDENTITY {
        body.extend_from_slice(&v.to_be_bytes());
    }
}

pub fn mvhd(timescale: u32, duration: u32, next_track_id: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]); // creation / modification
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate 1.0
    body.extend_from_slice(&0x0100u16.to_be_bytes()); // volume 1.0
    body.extend_from_slice(&[0; 10]); // reserved
    push_matrix(&mut body);
    body.extend_from_slice(&[0; 24]); // pre_defined
    body.extend_from_slice(&next_track_id.to_be_bytes());
    full_box(b"mvhd", 0, 0, &body)
}

pub fn tkhd(track_id: u32, width: u16, height: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]); // creation / modification
    body.extend_from_slice(&track_id.to_be_bytes());
    body.extend_from_slice(&[0; 4]); // reserved
    body.extend_from_slice(&1000u32.to_be_bytes()); // duration
    body.extend_from_slice(&[0; 8]); // reserved
    body.extend_from_slice(&[0; 6]); // layer, alternate_group, volume
    body.extend_from_slice(&[0; 2]); // reserved
    push_matrix(&mut body);
    body.extend_from_slice(&((width as u32) << 16).to_be_bytes());
    body.extend_from_slice(&((height as u32) << 16).to_be_bytes());
    full_box(b"tkhd", 0, 3, &body)
}

/// Pack a three-letter ISO-639-2/T code the way mdhd stores it.
pub fn pack_language(lang: &[u8; 3]) -> u16 {
    lang.iter()
        .fold(0u16, |acc, &c| (acc << 5) | (c - 0x60) as u16)
}

pub fn mdhd(timescale: u32, duration: u32, lang: &[u8; 3]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]);
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&pack_language(lang).to_be_bytes());
    body.extend_from_slice(&[0; 2]); // pre_defined
    full_box(b"mdhd", 0, 0, &body)
}

pub fn hdlr(handler: &[u8; 4], name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 4]); // pre_defined
    body.extend_from_slice(handler);
    body.extend_from_slice(&[0; 12]); // reserved
    body.extend_from_slice(name.as_bytes());
    body.push(0);
    full_box(b"hdlr", 0, 0, &body)
}

pub fn vmhd() -> Vec<u8> {
    full_box(b"vmhd", 0, 1, &[0; 8])
}

pub fn url_self() -> Vec<u8> {
    full_box(b"url ", 0, 1, &[])
}

pub fn dinf() -> Vec<u8> {
    let url = url_self();
    let mut body = 1u32.to_be_bytes().to_vec();
    body.extend_from_slice(&url);
    container(b"dinf", &[full_box(b"dref", 0, 0, &body)])
}

pub fn avcc(sps: &[&[u8]], pps: &[&[u8]]) -> Vec<u8> {
    let mut body = vec![1, 0x64, 0x00, 0x1f, 0xff, 0xe0 | sps.len() as u8];
    for s in sps {
        body.extend_from_slice(&(s.len() as u16).to_be_bytes());
        body.extend_from_slice(s);
    }
    body.push(pps.len() as u8);
    for p in pps {
        body.extend_from_slice(&(p.len() as u16).to_be_bytes());
        body.extend_from_slice(p);
    }
    bx(b"avcC", &body)
}

pub fn avc1(width: u16, height: u16, compressor: &str, children: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 6]); // reserved
    body.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    body.extend_from_slice(&[0; 16]); // pre_defined / reserved
    body.extend_from_slice(&width.to_be_bytes());
    body.extend_from_slice(&height.to_be_bytes());
    body.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    body.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    body.extend_from_slice(&[0; 4]); // reserved
    body.extend_from_slice(&1u16.to_be_bytes()); // frame_count
    let mut name = [0u8; 32];
    name[0] = compressor.len() as u8;
    name[1..1 + compressor.len()].copy_from_slice(compressor.as_bytes());
    body.extend_from_slice(&name);
    body.extend_from_slice(&0x0018u16.to_be_bytes()); // depth
    body.extend_from_slice(&0xffffu16.to_be_bytes()); // pre_defined
    body.extend_from_slice(&children.concat());
    bx(b"avc1", &body)
}

pub fn stsd(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    body.extend_from_slice(&entries.concat());
    full_box(b"stsd", 0, 0, &body)
}

pub fn u32_table(typ: &[u8; 4], values: &[u32]) -> Vec<u8> {
    let mut body = (values.len() as u32).to_be_bytes().to_vec();
    for v in values {
        body.extend_from_slice(&v.to_be_bytes());
    }
    full_box(typ, 0, 0, &body)
}

pub fn stts(entries: &[(u32, u32)]) -> Vec<u8> {
    let flat: Vec<u32> = entries.iter().flat_map(|&(c, d)| [c, d]).collect();
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for v in flat {
        body.extend_from_slice(&v.to_be_bytes());
    }
    full_box(b"stts", 0, 0, &body)
}

pub fn stsc(entries: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for &(a, b, c) in entries {
        body.extend_from_slice(&a.to_be_bytes());
        body.extend_from_slice(&b.to_be_bytes());
        body.extend_from_slice(&c.to_be_bytes());
    }
    full_box(b"stsc", 0, 0, &body)
}

pub fn stsz(sample_size: u32, sizes: &[u32]) -> Vec<u8> {
    let mut body = sample_size.to_be_bytes().to_vec();
    body.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
    if sample_size == 0 {
        for s in sizes {
            body.extend_from_slice(&s.to_be_bytes());
        }
    }
    full_box(b"stsz", 0, 0, &body)
}

/// Length-prefixed NAL unit: 4-byte length, header byte, payload.
pub fn nal(header: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = (1 + payload.len() as u32).to_be_bytes().to_vec();
    v.push(header);
    v.extend_from_slice(payload);
    v
}

pub const SPS: [u8; 6] = [0x67, 0x64, 0x00, 0x1f, 0xac, 0xd9];
pub const PPS: [u8; 4] = [0x68, 0xeb, 0xe3, 0xcb];

pub fn video_trak(track_id: u32) -> Vec<u8> {
    let stbl = container(
        b"stbl",
        &[
            stsd(&[avc1(640, 360, "JVT/AVC Coding", &[avcc(&[&SPS], &[&PPS])])]),
            stts(&[(2, 512)]),
            u32_table(b"stss", &[1]),
            stsc(&[(1, 2, 1)]),
            stsz(0, &[7, 9]),
            u32_table(b"stco", &[0]),
        ],
    );
    let minf = container(b"minf", &[vmhd(), dinf(), stbl]);
    let mdia = container(
        b"mdia",
        &[mdhd(12800, 1024, b"und"), hdlr(b"vide", "VideoHandler"), minf],
    );
    container(b"trak", &[tkhd(track_id, 640, 360), mdia])
}

pub fn mdat_payload() -> Vec<u8> {
    [nal(0x65, &[0x88, 0x84]), nal(0x41, &[0x9a, 0x00, 0x11, 0x22])].concat()
}

/// ftyp + moov with `tracks` video traks + trailing mdat.
pub fn sample_file(tracks: u32) -> Vec<u8> {
    let mut moov = vec![mvhd(1000, 80, tracks + 1)];
    moov.extend((1..=tracks).map(video_trak));
    [ftyp(), container(b"moov", &moov), bx(b"mdat", &mdat_payload())].concat()
}
