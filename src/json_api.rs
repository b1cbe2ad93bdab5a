use crate::{
    boxes::{BoxNode, Children, Node},
    parser::Mp4Tree,
    util::hex_dump,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Render a decoded tree as JSON.
///
/// Every box becomes an object holding `BoxHead`, `BoxSize` and `BoxType`,
/// then its decoded fields, then one key per child type. Array-typed
/// children (`trak`, `url `) render as arrays. The root's children sit under
/// the `root` key:
///
/// ```json
/// { "BoxHead": 0, "BoxSize": 1234, "BoxType": "root",
///   "root": { "ftyp": { ... }, "moov": { "trak": [ ... ] } } }
/// ```
pub fn to_json(tree: &Mp4Tree<'_>) -> serde_json::Result<Value> {
    let mut obj = Map::new();
    obj.insert("BoxHead".into(), tree.head.into());
    obj.insert("BoxSize".into(), tree.size.into());
    obj.insert("BoxType".into(), tree.typ.to_string().into());
    obj.insert("root".into(), Value::Object(children_json(&tree.root)?));
    if let Some(diag) = &tree.diagnostics {
        obj.insert("diagnostics".into(), serde_json::to_value(diag)?);
    }
    Ok(Value::Object(obj))
}

pub fn to_json_string(tree: &Mp4Tree<'_>, pretty: bool) -> serde_json::Result<String> {
    let value = to_json(tree)?;
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

/// JSON for a single decoded box and its subtree.
pub fn box_to_json(node: &BoxNode<'_>) -> serde_json::Result<Value> {
    let mut obj = Map::new();
    obj.insert("BoxHead".into(), node.header.head.into());
    obj.insert("BoxSize".into(), node.header.size.into());
    obj.insert("BoxType".into(), node.header.typ.to_string().into());

    // containers serialize to null and contribute nothing
    if let Value::Object(fields) = serde_json::to_value(&node.value)? {
        obj.extend(fields);
    }
    obj.extend(children_json(&node.children)?);
    Ok(Value::Object(obj))
}

fn children_json(children: &Children<'_>) -> serde_json::Result<Map<String, Value>> {
    children
        .iter()
        .map(|(typ, node)| Ok((typ.to_string(), node_json(node)?)))
        .collect()
}

fn node_json(node: &Node<'_>) -> serde_json::Result<Value> {
    match node {
        Node::Box(b) => box_to_json(b),
        Node::List(list) => list
            .iter()
            .map(box_to_json)
            .collect::<serde_json::Result<Vec<_>>>()
            .map(Value::Array),
    }
}

#[derive(Debug, Serialize)]
pub struct HexDump {
    pub offset: u64,
    pub length: u64,
    pub hex: String,
}

/// Hex-dump `max_len` bytes of `buf` starting at `offset`.
///
/// The range is clamped to the buffer, so the returned length may be
/// smaller than `max_len`:
///
/// ```
/// let data: Vec<u8> = (0u8..32).collect();
/// let dump = avcbox::json_api::hex_range(&data, 24, 32);
/// assert_eq!(dump.length, 8);
/// ```
pub fn hex_range(buf: &[u8], offset: u64, max_len: u64) -> HexDump {
    let start = offset.min(buf.len() as u64);
    let end = start.saturating_add(max_len).min(buf.len() as u64);
    let bytes = &buf[start as usize..end as usize];

    HexDump {
        offset,
        length: bytes.len() as u64,
        hex: hex_dump(bytes, offset),
    }
}
