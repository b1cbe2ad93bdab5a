pub mod boxes;
pub mod diagnostics;
pub mod json_api;
pub mod known_boxes;
pub mod nal;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod util;

pub use boxes::{BoxHeader, BoxNode, BoxPath, Children, FourCC, Node, PathSegment};
pub use diagnostics::{DiagnosticEntry, Diagnostics};
pub use json_api::{to_json, to_json_string};
pub use nal::{NalUnit, NalUnits, nal_unit_type, nal_unit_type_name, split_nal_units};
pub use parser::{Mp4Tree, ParseError, ParseOptions, Result, parse, parse_with, read_box_header};
pub use reader::View;
pub use registry::BoxValue;
