use crate::boxes::{BoxHeader, BoxNode, BoxPath, Children, FourCC};
use crate::diagnostics::Diagnostics;
use crate::known_boxes::KnownBox;
use crate::reader::View;
use crate::registry;
use crate::util::hex_dump;
use std::fmt;
use tracing::{debug, trace, warn};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("read of {need} bytes at offset {offset:#x} crosses the end of the view ({available} bytes left)")]
    Bounds {
        offset: u64,
        need: usize,
        available: usize,
    },
    #[error("invalid box size {size} at offset {offset:#x}")]
    InvalidSize { offset: u64, size: u32 },
    #[error("format error at {context}: {detail}")]
    Format { context: String, detail: String },
}

impl ParseError {
    pub(crate) fn format(context: impl Into<String>, detail: impl Into<String>) -> Self {
        ParseError::Format {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Knobs for a single [`parse_with`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Collect a [`Diagnostics`] trace of every decoded box.
    pub diagnostics: bool,
    /// Hex-dump every visited box at TRACE level.
    pub verbose: bool,
    /// Check reserved / pre_defined / version fields and warn on mismatch.
    pub verify: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            diagnostics: false,
            verbose: false,
            verify: true,
        }
    }
}

impl ParseOptions {
    pub fn with_diagnostics(mut self, on: bool) -> Self {
        self.diagnostics = on;
        self
    }

    pub fn with_verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    pub fn with_verify(mut self, on: bool) -> Self {
        self.verify = on;
        self
    }
}

/// State threaded through one traversal.
pub(crate) struct ParseContext<'o> {
    pub options: &'o ParseOptions,
    pub diagnostics: Option<Diagnostics>,
}

impl<'o> ParseContext<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            diagnostics: options.diagnostics.then(Diagnostics::new),
        }
    }

    /// Warn when a field that should be constant is not; the value is kept.
    pub fn expect<T>(&self, path: &BoxPath, field: &str, actual: T, expected: T)
    where
        T: PartialEq + fmt::Debug,
    {
        if self.options.verify && actual != expected {
            warn!(%path, field, ?actual, ?expected, "unexpected value in constant field");
        }
    }
}

/// Result of [`parse`]: a synthetic `root` box spanning the whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp4Tree<'a> {
    pub head: u64,
    pub size: u64,
    pub typ: FourCC,
    pub root: Children<'a>,
    pub diagnostics: Option<Diagnostics>,
}

impl<'a> Mp4Tree<'a> {
    /// Look up a box by breadcrumb, e.g. `root/moov/trak:1/mdia/mdhd`.
    pub fn get(&self, path: &str) -> Option<&BoxNode<'a>> {
        let path = BoxPath::parse(path)?;
        self.root.resolve(&path.segments()[1..])
    }

    /// Top-level box by type; for array types, the first one.
    pub fn top(&self, name: &str) -> Option<&BoxNode<'a>> {
        self.root.get(FourCC::from_str(name)?)?.first()
    }
}

/// Decode the whole buffer with default options.
pub fn parse(buf: &[u8]) -> Result<Mp4Tree<'_>> {
    parse_with(buf, 0, &ParseOptions::default())
}

/// Decode `buf` starting at `cursor`.
///
/// Offsets in the returned tree are always relative to `buf[0]`.
pub fn parse_with<'a>(buf: &'a [u8], cursor: usize, options: &ParseOptions) -> Result<Mp4Tree<'a>> {
    let mut view = View::new(buf);
    view.seek(cursor)?;

    let mut ctx = ParseContext::new(options);
    let root = parse_children(&mut view, &BoxPath::root(), &mut ctx)?;

    Ok(Mp4Tree {
        head: 0,
        size: buf.len() as u64,
        typ: FourCC::ROOT,
        root,
        diagnostics: ctx.diagnostics,
    })
}

/// Read the 8-byte header at the cursor.
///
/// A size field of 0 resolves to "up to the end of this view".
pub fn read_box_header(view: &mut View<'_>) -> Result<BoxHeader> {
    let start = view.position();
    let head = view.absolute_position();
    let size32 = view.read_u32()?;
    let typ = view.read_fourcc()?;

    let size = match size32 {
        0 => (view.len() - start) as u64,
        1..=7 => return Err(ParseError::InvalidSize { offset: head, size: size32 }),
        n => n as u64,
    };

    Ok(BoxHeader { head, size, typ })
}

/// Decode every sibling box in `view` from the cursor to its end.
///
/// Each box gets its own bounded view; the cursor always lands on the
/// declared end of the box no matter how much the decoder consumed.
pub(crate) fn parse_children<'a>(
    view: &mut View<'a>,
    path: &BoxPath,
    ctx: &mut ParseContext<'_>,
) -> Result<Children<'a>> {
    let mut children = Children::new();

    while !view.is_at_end() {
        let start = view.position();
        let header = read_box_header(view)?;
        let mut body = view.sub_view(start, header.size as usize)?;
        body.seek(BoxHeader::SIZE)?;

        if ctx.options.verbose {
            trace!(
                "{}/{} @ {:#x} ({} bytes)\n{}",
                path,
                header.typ,
                header.head,
                header.size,
                hex_dump(body.as_slice(), header.head)
            );
        }

        let kind = KnownBox::from(header.typ);
        if kind.is_known() {
            let own_path = path.child(header.typ);
            let index = children.count(header.typ);
            if let Some(diag) = ctx.diagnostics.as_mut() {
                diag.record(&own_path, &header);
            }

            let node = registry::decode_box(kind, header, &mut body, &own_path, index, ctx)?;
            if !body.is_at_end() {
                debug!(path = %own_path, unread = body.remaining(), "box body not fully consumed");
            }
            children.insert(node);
        } else {
            warn!(%path, box_type = %header.typ, offset = header.head, size = header.size, "skipping unknown box type");
        }

        view.seek(start + header.size as usize)?;
    }

    Ok(children)
}
