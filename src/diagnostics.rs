use crate::boxes::{BoxHeader, BoxPath, FourCC};
use serde::Serialize;

/// One visited box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    #[serde(rename = "BoxPath")]
    pub box_path: String,
    #[serde(rename = "BoxHead")]
    pub box_head: u64,
    #[serde(rename = "BoxType")]
    pub box_type: FourCC,
    #[serde(rename = "BoxSize")]
    pub box_size: u64,
}

/// Pre-order trace of every decoded box, in the order the tree was built.
///
/// `boxes` mirrors `detail` as compact `"root/moov/trak:0/tkhd:92"` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub detail: Vec<DiagnosticEntry>,
    pub boxes: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, path: &BoxPath, header: &BoxHeader) {
        let box_path = path.to_string();
        self.boxes.push(format!("{}:{}", box_path, header.size));
        self.detail.push(DiagnosticEntry {
            box_path,
            box_head: header.head,
            box_type: header.typ,
            box_size: header.size,
        });
    }

    pub fn len(&self) -> usize {
        self.detail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.detail.iter()
    }
}
