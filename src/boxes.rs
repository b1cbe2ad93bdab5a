use crate::known_boxes::KnownBox;
use crate::registry::BoxValue;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::warn;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const ROOT: FourCC = FourCC(*b"root");

    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// The 8-byte box header, resolved against the whole input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub head: u64, // absolute offset of the size field
    pub size: u64, // total size including header; resolved extent when the size field is 0
    pub typ: FourCC,
}

impl BoxHeader {
    pub const SIZE: usize = 8;

    /// Absolute `[start, end)` of the body.
    pub fn body_range(&self) -> (u64, u64) {
        (self.head + Self::SIZE as u64, self.head + self.size)
    }
}

// ---------- Breadcrumb paths ----------

/// One `type[:index]` component of a [`BoxPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub typ: FourCC,
    pub index: Option<usize>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}:{}", self.typ, i),
            None => write!(f, "{}", self.typ),
        }
    }
}

/// Root-to-box breadcrumb such as `root/moov/trak:1/mdia/mdhd`.
///
/// A box's own segment never carries an index; the index of an array-typed
/// box (`trak`) only shows up in its descendants' paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxPath {
    segments: Vec<PathSegment>,
}

impl BoxPath {
    pub fn root() -> Self {
        Self {
            segments: vec![PathSegment {
                typ: FourCC::ROOT,
                index: None,
            }],
        }
    }

    pub fn child(&self, typ: FourCC) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment { typ, index: None });
        Self { segments }
    }

    /// Same path with `index` attached to the last segment.
    pub fn with_index(mut self, index: usize) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.index = Some(index);
        }
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    /// Parse `root/moov/trak:0/tkhd`; the leading `root` is optional.
    pub fn parse(s: &str) -> Option<Self> {
        let mut path = Self::root();
        for (i, token) in s.split('/').enumerate() {
            if i == 0 && token == "root" {
                continue;
            }
            let (name, index) = match token.rsplit_once(':') {
                Some((name, idx)) => (name, Some(idx.parse().ok()?)),
                None => (token, None),
            };
            path.segments.push(PathSegment {
                typ: FourCC::from_str(name)?,
                index,
            });
        }
        Some(path)
    }
}

impl fmt::Display for BoxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

// ---------- Tree ----------

/// A decoded box: its header, its typed fields and its named children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxNode<'a> {
    pub header: BoxHeader,
    pub value: BoxValue<'a>,
    pub children: Children<'a>,
}

impl<'a> BoxNode<'a> {
    pub fn typ(&self) -> FourCC {
        self.header.typ
    }

    /// Direct child by type name; for array types this is the first element.
    pub fn child(&self, name: &str) -> Option<&BoxNode<'a>> {
        self.children.get(FourCC::from_str(name)?)?.first()
    }

    /// Descendant at a relative path like `mdia/minf/stbl`.
    pub fn get(&self, rel: &str) -> Option<&BoxNode<'a>> {
        let path = BoxPath::parse(rel)?;
        self.children.resolve(&path.segments[1..])
    }
}

/// Slot under a parent: a single box, or an ordered list for array types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Box(BoxNode<'a>),
    List(Vec<BoxNode<'a>>),
}

impl<'a> Node<'a> {
    pub fn first(&self) -> Option<&BoxNode<'a>> {
        self.at(0)
    }

    pub fn at(&self, index: usize) -> Option<&BoxNode<'a>> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[BoxNode<'a>] {
        match self {
            Node::Box(b) => std::slice::from_ref(b),
            Node::List(list) => list,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// Children of a box keyed by type, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children<'a> {
    entries: Vec<(FourCC, Node<'a>)>,
}

impl<'a> Children<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a decoded box and return its slot index.
    ///
    /// Array types (`trak`, `url `) append and return the new element's
    /// position; every other type takes the slot (returning 0), replacing
    /// whatever was there.
    pub fn insert(&mut self, node: BoxNode<'a>) -> usize {
        let typ = node.typ();
        let is_array = KnownBox::from(typ).is_array();
        let existing = self.entries.iter_mut().find(|(t, _)| *t == typ);

        match (existing, is_array) {
            (Some((_, Node::List(list))), true) => {
                list.push(node);
                list.len() - 1
            }
            (Some((_, slot)), _) => {
                warn!(box_type = %typ, offset = node.header.head, "duplicate box replaces earlier one");
                *slot = if is_array {
                    Node::List(vec![node])
                } else {
                    Node::Box(node)
                };
                0
            }
            (None, true) => {
                self.entries.push((typ, Node::List(vec![node])));
                0
            }
            (None, false) => {
                self.entries.push((typ, Node::Box(node)));
                0
            }
        }
    }

    pub fn get(&self, typ: FourCC) -> Option<&Node<'a>> {
        self.entries.iter().find(|(t, _)| *t == typ).map(|(_, n)| n)
    }

    /// Number of boxes of `typ` inserted so far.
    pub fn count(&self, typ: FourCC) -> usize {
        self.get(typ).map_or(0, Node::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FourCC, &Node<'a>)> {
        self.entries.iter().map(|(t, n)| (*t, n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk `segments` downwards; `:N` picks a list element, a bare array
    /// segment picks the first one.
    pub fn resolve(&self, segments: &[PathSegment]) -> Option<&BoxNode<'a>> {
        let (seg, rest) = segments.split_first()?;
        let node = self.get(seg.typ)?.at(seg.index.unwrap_or(0))?;
        if rest.is_empty() {
            Some(node)
        } else {
            node.children.resolve(rest)
        }
    }
}
