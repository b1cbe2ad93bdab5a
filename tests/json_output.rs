mod common;

use avcbox::json_api::{box_to_json, to_json, to_json_string};
use avcbox::parser::{ParseOptions, parse, parse_with};
use common::*;
use serde_json::{Value, json};

#[test]
fn root_layout() {
    let data = sample_file(1);
    let tree = parse(&data).unwrap();
    let v = to_json(&tree).unwrap();

    assert_eq!(v["BoxHead"], 0);
    assert_eq!(v["BoxSize"], data.len() as u64);
    assert_eq!(v["BoxType"], "root");
    assert!(v.get("diagnostics").is_none());

    let keys: Vec<&String> = v["root"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["ftyp", "moov", "mdat"]);
}

#[test]
fn box_objects_hold_header_fields_and_children() {
    let data = sample_file(2);
    let tree = parse(&data).unwrap();
    let v = to_json(&tree).unwrap();

    let ftyp = &v["root"]["ftyp"];
    assert_eq!(ftyp["BoxHead"], 0);
    assert_eq!(ftyp["BoxSize"], 32);
    assert_eq!(ftyp["BoxType"], "ftyp");
    assert_eq!(ftyp["major_brand"], "isom");
    assert_eq!(ftyp["compatible_brands"], json!(["isom", "iso2", "avc1", "mp41"]));

    let traks = v["root"]["moov"]["trak"].as_array().unwrap();
    assert_eq!(traks.len(), 2);
    assert_eq!(traks[1]["tkhd"]["track_ID"], 2);
    assert_eq!(traks[0]["mdia"]["mdhd"]["language"], "und");
    assert_eq!(traks[0]["mdia"]["hdlr"]["handler_type"], "vide");
    assert_eq!(v["root"]["moov"]["mvhd"]["next_track_ID"], 3);

    let urls = &traks[0]["mdia"]["minf"]["dinf"]["dref"]["url "];
    assert!(urls.is_array());
    assert_eq!(urls[0]["flags"], 1);
}

#[test]
fn avcc_uses_decoder_record_names() {
    let data = sample_file(1);
    let tree = parse(&data).unwrap();
    let v = to_json(&tree).unwrap();

    let avcc = &v["root"]["moov"]["trak"][0]["mdia"]["minf"]["stbl"]["stsd"]["avc1"]["avcC"];
    assert_eq!(avcc["configurationVersion"], 1);
    assert_eq!(avcc["AVCProfileIndication"], 0x64);
    assert_eq!(avcc["lengthSizeMinusOne"], 3);
    assert_eq!(avcc["numOfSequenceParameterSets"], 1);
    assert_eq!(avcc["SPS"][0]["sequenceParameterSetLength"], 6);
    assert_eq!(avcc["SPS"][0]["sequenceParameterSetNALUnit"], "6764001facd9");
    assert_eq!(avcc["PPS"][0]["pictureParameterSetNALUnit"], "68ebe3cb");
}

#[test]
fn sample_tables_render_keyed_entries() {
    let data = container(
        b"stbl",
        &[
            u32_table(b"stco", &[100, 200]),
            u32_table(b"stss", &[1]),
            stsz(0, &[7, 9]),
            stts(&[(2, 512)]),
            stsc(&[(1, 2, 1)]),
        ],
    );
    let tree = parse(&data).unwrap();
    let v = box_to_json(tree.top("stbl").unwrap()).unwrap();

    assert_eq!(
        v["stco"]["samples"],
        json!([{ "chunk_offset": 100 }, { "chunk_offset": 200 }])
    );
    assert_eq!(v["stss"]["samples"], json!([{ "sample_number": 1 }]));
    assert_eq!(
        v["stsz"]["samples"],
        json!([{ "entry_size": 7 }, { "entry_size": 9 }])
    );
    assert_eq!(
        v["stts"]["samples"],
        json!([{ "sample_count": 2, "sample_delta": 512 }])
    );
    assert_eq!(
        v["stsc"]["samples"],
        json!([{ "first_chunk": 1, "samples_per_chunk": 2, "sample_description_index": 1 }])
    );
    assert!(v["stco"].get("chunk_offsets").is_none());
}

#[test]
fn fixed_size_stsz_has_no_samples() {
    let data = stsz(512, &[0, 0, 0]);
    let tree = parse(&data).unwrap();
    let v = box_to_json(tree.top("stsz").unwrap()).unwrap();

    assert_eq!(v["sample_size"], 512);
    assert_eq!(v["sample_count"], 3);
    assert_eq!(v["samples"], json!([]));
}

#[test]
fn mdat_renders_its_length() {
    let data = sample_file(1);
    let tree = parse(&data).unwrap();
    let v = to_json(&tree).unwrap();

    assert_eq!(v["root"]["mdat"]["data"], 16);
}

#[test]
fn containers_have_only_header_and_children() {
    let data = container(b"udta", &[bx(b"free", &[0xff, 0x00])]);
    let tree = parse(&data).unwrap();
    let v = box_to_json(tree.top("udta").unwrap()).unwrap();

    assert_eq!(
        v,
        json!({
            "BoxHead": 0,
            "BoxSize": 18,
            "BoxType": "udta",
            "free": { "BoxHead": 8, "BoxSize": 10, "BoxType": "free", "data": "ff00" }
        })
    );
}

#[test]
fn diagnostics_are_included_when_collected() {
    let data = [ftyp(), bx(b"free", &[])].concat();
    let tree = parse_with(&data, 0, &ParseOptions::default().with_diagnostics(true)).unwrap();
    let v = to_json(&tree).unwrap();

    assert_eq!(
        v["diagnostics"],
        json!({
            "detail": [
                { "BoxPath": "root/ftyp", "BoxHead": 0, "BoxType": "ftyp", "BoxSize": 32 },
                { "BoxPath": "root/free", "BoxHead": 32, "BoxType": "free", "BoxSize": 8 }
            ],
            "boxes": ["root/ftyp:32", "root/free:8"]
        })
    );
}

#[test]
fn string_output_parses_back() {
    let data = sample_file(1);
    let tree = parse(&data).unwrap();

    let compact = to_json_string(&tree, false).unwrap();
    let pretty = to_json_string(&tree, true).unwrap();
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));

    let a: Value = serde_json::from_str(&compact).unwrap();
    let b: Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, to_json(&tree).unwrap());
}
