use anyhow::Context;
use avcbox::{BoxNode, BoxValue, Mp4Tree, parse};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Simple MP4 media info (like mp4info)")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct AvcInfo {
    profile: u8,
    level: u8,
    nal_length_size: usize,
    sps_count: usize,
    pps_count: usize,
}

#[derive(Debug, Default, Serialize)]
struct TrackInfo {
    index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    track_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    track_type: Option<String>, // "video" / "audio" / "other"

    #[serde(skip_serializing_if = "Option::is_none")]
    codec: Option<String>, // e.g. "avc1"

    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    timescale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ticks: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    sample_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    sync_samples: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    avc: Option<AvcInfo>,
}

#[derive(Debug, Default, Serialize)]
struct MediaInfo {
    file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    major_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor_version: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    compatible_brands: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    movie_timescale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_ticks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_seconds: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    mdat_size: Option<u64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    tracks: Vec<TrackInfo>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with_writer(std::io::stderr)
        .init();

    let data = std::fs::read(&args.path).with_context(|| format!("reading {}", args.path))?;
    let tree = parse(&data).with_context(|| format!("parsing {}", args.path))?;
    let info = media_info(&args.path, &tree);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_human(&info);
    }

    Ok(())
}

fn media_info(file: &str, tree: &Mp4Tree<'_>) -> MediaInfo {
    let mut info = MediaInfo {
        file: file.to_string(),
        ..Default::default()
    };

    if let Some(BoxValue::Ftyp(ftyp)) = tree.top("ftyp").map(|b| &b.value) {
        info.major_brand = Some(ftyp.major_brand.clone());
        info.minor_version = Some(ftyp.minor_version);
        info.compatible_brands = ftyp.compatible_brands.clone();
    }

    if let Some(mdat) = tree.top("mdat") {
        info.mdat_size = Some(mdat.header.size);
    }

    let Some(moov) = tree.top("moov") else {
        return info;
    };

    // mvhd for overall movie duration
    if let Some(BoxValue::Mvhd(mvhd)) = moov.child("mvhd").map(|b| &b.value) {
        info.movie_timescale = Some(mvhd.timescale);
        info.movie_duration_ticks = Some(mvhd.duration as u64);
        info.movie_duration_seconds = seconds(mvhd.duration as u64, mvhd.timescale);
    }

    // trak boxes for per-track info
    if let Some(traks) = moov.children.get(avcbox::FourCC(*b"trak")) {
        for (i, trak) in traks.as_slice().iter().enumerate() {
            info.tracks.push(track_info(trak, i + 1));
        }
    }

    info
}

fn track_info(trak: &BoxNode<'_>, index: usize) -> TrackInfo {
    let mut ti = TrackInfo {
        index,
        ..Default::default()
    };

    // tkhd: track id and presentation size (16.16 fixed point)
    if let Some(BoxValue::Tkhd(tkhd)) = trak.child("tkhd").map(|b| &b.value) {
        ti.track_id = Some(tkhd.track_id);
        if tkhd.width != 0 && tkhd.height != 0 {
            ti.width = Some(tkhd.width >> 16);
            ti.height = Some(tkhd.height >> 16);
        }
    }

    // mdhd: timescale / duration / language
    if let Some(BoxValue::Mdhd(mdhd)) = trak.get("mdia/mdhd").map(|b| &b.value) {
        ti.timescale = Some(mdhd.timescale);
        ti.duration_ticks = Some(mdhd.duration as u64);
        ti.duration_seconds = seconds(mdhd.duration as u64, mdhd.timescale);
        ti.language = Some(mdhd.language.clone());
    }

    // hdlr: determine track type (video/audio/other)
    if let Some(BoxValue::Hdlr(hdlr)) = trak.get("mdia/hdlr").map(|b| &b.value) {
        ti.track_type = Some(track_type(&hdlr.handler_type).to_string());
    }

    let Some(stbl) = trak.get("mdia/minf/stbl") else {
        return ti;
    };

    // stsd -> avc1 -> avcC: codec, coded size and decoder config
    if let Some(avc1) = stbl.get("stsd/avc1") {
        ti.codec = Some("avc1".to_string());
        if ti.track_type.is_none() {
            ti.track_type = Some("video".to_string());
        }
        if let BoxValue::Avc1(entry) = &avc1.value {
            ti.width = Some(entry.width as u32);
            ti.height = Some(entry.height as u32);
        }
        if let Some(BoxValue::Avcc(avcc)) = avc1.child("avcC").map(|b| &b.value) {
            ti.avc = Some(AvcInfo {
                profile: avcc.avc_profile_indication,
                level: avcc.avc_level_indication,
                nal_length_size: avcc.nal_length_size(),
                sps_count: avcc.sps.len(),
                pps_count: avcc.pps.len(),
            });
        }
    }

    if let Some(BoxValue::Stsz(stsz)) = stbl.child("stsz").map(|b| &b.value) {
        ti.sample_count = Some(stsz.sample_count);
    }
    if let Some(BoxValue::Stss(stss)) = stbl.child("stss").map(|b| &b.value) {
        ti.sync_samples = Some(stss.entry_count);
    }

    ti
}

fn track_type(handler: &str) -> &'static str {
    match handler {
        "vide" => "video",
        "soun" => "audio",
        _ => "other",
    }
}

fn seconds(ticks: u64, timescale: u32) -> Option<f64> {
    (timescale != 0).then(|| ticks as f64 / timescale as f64)
}

// ---- human-readable output -----------------------------------------

fn print_human(info: &MediaInfo) {
    println!("File: {}", info.file);
    if let Some(major) = &info.major_brand {
        println!("Major brand: {}", major);
    }
    if let Some(minor) = info.minor_version {
        println!("Minor version: {}", minor);
    }
    if !info.compatible_brands.is_empty() {
        println!("Compatible brands: {}", info.compatible_brands.join(", "));
    }

    if let (Some(ts), Some(dur), Some(sec)) = (
        info.movie_timescale,
        info.movie_duration_ticks,
        info.movie_duration_seconds,
    ) {
        println!("Movie duration: {} ticks @ {} -> {:.3} s", dur, ts, sec);
    }
    if let Some(size) = info.mdat_size {
        println!("Media data: {} bytes", size);
    }

    if info.tracks.is_empty() {
        println!("Tracks: (none)");
        return;
    }

    println!("Tracks:");
    for t in &info.tracks {
        match t.track_id {
            Some(id) => println!("  Track {} (id {}):", t.index, id),
            None => println!("  Track {}:", t.index),
        }

        if let Some(tt) = &t.track_type {
            println!("    type: {}", tt);
        }
        if let Some(codec) = &t.codec {
            println!("    codec: {}", codec);
        }
        if let (Some(w), Some(h)) = (t.width, t.height) {
            println!("    size: {}x{}", w, h);
        }
        if let Some(avc) = &t.avc {
            println!(
                "    avc: profile {} level {} (nal length {} bytes, {} SPS, {} PPS)",
                avc.profile, avc.level, avc.nal_length_size, avc.sps_count, avc.pps_count
            );
        }

        if let Some(ts) = t.timescale {
            println!("    timescale: {}", ts);
        }
        if let Some(dur) = t.duration_ticks {
            if let Some(sec) = t.duration_seconds {
                println!("    duration: {} ticks -> {:.3} s", dur, sec);
            } else {
                println!("    duration: {} ticks", dur);
            }
        }
        if let Some(lang) = &t.language {
            println!("    language: {}", lang);
        }
        if let Some(n) = t.sample_count {
            match t.sync_samples {
                Some(sync) => println!("    samples: {} ({} sync)", n, sync),
                None => println!("    samples: {}", n),
            }
        }
    }
}
