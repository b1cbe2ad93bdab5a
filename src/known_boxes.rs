use crate::boxes::FourCC;

/// Box types with a decoder.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)` and is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,

    // moov children
    Mvhd,
    Trak,
    Udta,
    Meta,
    Ilst,

    // trak children
    Tkhd,
    Edts,
    Elst,
    Mdia,

    // mdia children
    Mdhd,
    Hdlr,
    Minf,

    // minf children
    Vmhd,
    Dinf,
    Dref,
    Url,
    Stbl,

    // stbl children
    Stsd,
    Stts,
    Stss,
    Stsc,
    Stsz,
    Stco,

    // AVC sample entry
    Avc1,
    Avcc,

    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,

            b"mvhd" => KnownBox::Mvhd,
            b"trak" => KnownBox::Trak,
            b"udta" => KnownBox::Udta,
            b"meta" => KnownBox::Meta,
            b"ilst" => KnownBox::Ilst,

            b"tkhd" => KnownBox::Tkhd,
            b"edts" => KnownBox::Edts,
            b"elst" => KnownBox::Elst,
            b"mdia" => KnownBox::Mdia,

            b"mdhd" => KnownBox::Mdhd,
            b"hdlr" => KnownBox::Hdlr,
            b"minf" => KnownBox::Minf,

            b"vmhd" => KnownBox::Vmhd,
            b"dinf" => KnownBox::Dinf,
            b"dref" => KnownBox::Dref,
            b"url " => KnownBox::Url,
            b"stbl" => KnownBox::Stbl,

            b"stsd" => KnownBox::Stsd,
            b"stts" => KnownBox::Stts,
            b"stss" => KnownBox::Stss,
            b"stsc" => KnownBox::Stsc,
            b"stsz" => KnownBox::Stsz,
            b"stco" => KnownBox::Stco,

            b"avc1" => KnownBox::Avc1,
            b"avcC" => KnownBox::Avcc,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    pub fn is_known(&self) -> bool {
        !matches!(self, KnownBox::Unknown(_))
    }

    /// Pure containers: no fields, body is a sequence of boxes.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownBox::Moov
                | KnownBox::Trak
                | KnownBox::Mdia
                | KnownBox::Minf
                | KnownBox::Stbl
                | KnownBox::Dinf
                | KnownBox::Udta
                | KnownBox::Edts
        )
    }

    /// A short header record followed by child boxes.
    pub fn is_hybrid(&self) -> bool {
        matches!(
            self,
            KnownBox::Meta | KnownBox::Dref | KnownBox::Stsd | KnownBox::Avc1
        )
    }

    pub fn has_children(&self) -> bool {
        self.is_container() || self.is_hybrid()
    }

    /// Repeatable under one parent; stored as an ordered list.
    pub fn is_array(&self) -> bool {
        matches!(self, KnownBox::Trak | KnownBox::Url)
    }

    /// Is this a FullBox (version + flags)?
    pub fn is_full_box(&self) -> bool {
        matches!(
            self,
            KnownBox::Mvhd
                | KnownBox::Tkhd
                | KnownBox::Elst
                | KnownBox::Mdhd
                | KnownBox::Hdlr
                | KnownBox::Vmhd
                | KnownBox::Dref
                | KnownBox::Url
                | KnownBox::Stsd
                | KnownBox::Stts
                | KnownBox::Stss
                | KnownBox::Stsc
                | KnownBox::Stsz
                | KnownBox::Stco
                | KnownBox::Meta
        )
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Mvhd => "Movie Header Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Udta => "User Data Box",
            KnownBox::Meta => "Meta Box",
            KnownBox::Ilst => "Metadata Item List (QuickTime)",
            KnownBox::Tkhd => "Track Header Box",
            KnownBox::Edts => "Edit Box",
            KnownBox::Elst => "Edit List Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Mdhd => "Media Header Box",
            KnownBox::Hdlr => "Handler Reference Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Vmhd => "Video Media Header Box",
            KnownBox::Dinf => "Data Information Box",
            KnownBox::Dref => "Data Reference Box",
            KnownBox::Url => "Data Entry URL Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Stsd => "Sample Description Box",
            KnownBox::Stts => "Decoding Time to Sample Box",
            KnownBox::Stss => "Sync Sample Box",
            KnownBox::Stsc => "Sample To Chunk Box",
            KnownBox::Stsz => "Sample Size Box",
            KnownBox::Stco => "Chunk Offset Box",
            KnownBox::Avc1 => "AVC Sample Entry",
            KnownBox::Avcc => "AVC Configuration Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
