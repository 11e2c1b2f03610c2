//! Serializer-facing cell representation.
//!
//! The scrollback buffer proper is outside this crate; the serializer only
//! needs to walk cells and read three things: the glyph bytes, the stored
//! display width and the attribute identifier. `Cell` is that minimal
//! surface. Glyphs are UTF-8 with small-string optimization (most cells are
//! a single ASCII byte); width is the *stored* width:
//!
//! - 0 — a combining mark riding on the previous cell,
//! - 1 — a normal cell,
//! - 2 — a wide character that also occupies the following spacer cell.

use smallvec::SmallVec;
use unicode_width::UnicodeWidthStr;

use crate::attr::AttrId;

/// One terminal cell: glyph bytes, stored width, attribute identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    glyph: SmallVec<[u8; 4]>,
    width: u8,
    attr: AttrId,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(AttrId::INLINE_DEFAULT)
    }
}

impl Cell {
    /// Create a cell from a glyph, measuring its display width.
    ///
    /// An empty glyph produces a blank cell of width 1; combining marks
    /// measure 0; everything else clamps to 1 or 2 columns.
    #[must_use]
    pub fn new(glyph: &str, attr: AttrId) -> Self {
        let width = if glyph.is_empty() {
            1
        } else {
            UnicodeWidthStr::width(glyph).min(2) as u8
        };
        Self::with_width(glyph, width, attr)
    }

    /// Create a cell with an explicit stored width.
    #[must_use]
    pub fn with_width(glyph: &str, width: u8, attr: AttrId) -> Self {
        Self {
            glyph: SmallVec::from_slice(glyph.as_bytes()),
            width,
            attr,
        }
    }

    /// A blank cell (no glyph, width 1) carrying an attribute.
    #[must_use]
    pub fn blank(attr: AttrId) -> Self {
        Self {
            glyph: SmallVec::new(),
            width: 1,
            attr,
        }
    }

    /// The glyph as UTF-8 text; empty for blank cells.
    #[must_use]
    pub fn glyph(&self) -> &str {
        std::str::from_utf8(&self.glyph).unwrap_or("")
    }

    /// The stored display width (0, 1 or 2).
    #[must_use]
    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// The attribute identifier.
    #[must_use]
    #[inline]
    pub const fn attr(&self) -> AttrId {
        self.attr
    }

    /// Replace the attribute identifier.
    ///
    /// The caller owns the ref/unref bookkeeping for both the old and the
    /// new identifier.
    #[inline]
    pub fn set_attr(&mut self, attr: AttrId) {
        self.attr = attr;
    }

    /// Check whether the cell has no glyph.
    #[must_use]
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.glyph.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_cell_is_width_one() {
        let c = Cell::new("a", AttrId::INLINE_DEFAULT);
        assert_eq!(c.glyph(), "a");
        assert_eq!(c.width(), 1);
        assert!(!c.is_blank());
    }

    #[test]
    fn cjk_cell_is_wide() {
        let c = Cell::new("中", AttrId::INLINE_DEFAULT);
        assert_eq!(c.width(), 2);
    }

    #[test]
    fn combining_mark_is_zero_width() {
        let c = Cell::new("\u{0301}", AttrId::INLINE_DEFAULT);
        assert_eq!(c.width(), 0);
        assert!(!c.is_blank());
    }

    #[test]
    fn blank_cell_keeps_attr_and_width() {
        let id = AttrId(0x0010_0000);
        let c = Cell::blank(id);
        assert!(c.is_blank());
        assert_eq!(c.width(), 1);
        assert_eq!(c.attr(), id);
        assert_eq!(c.glyph(), "");
    }

    #[test]
    fn empty_glyph_defaults_to_width_one() {
        let c = Cell::new("", AttrId::INLINE_DEFAULT);
        assert_eq!(c.width(), 1);
        assert!(c.is_blank());
    }
}
