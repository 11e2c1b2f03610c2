//! Packed attribute representation (32 bits).
//!
//! ## Design
//!
//! A cell's text style is a triple of `(flags, fg, bg)`. For the common case
//! (no true color) the whole triple fits into one 32-bit word, and that word
//! *is* the cell's attribute identifier — no indirection, no storage.
//! True-color attributes cannot fit, so they are interned in a node pool and
//! the identifier becomes a tagged pointer into it.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ bit 31      tag: 0 = inline attribute, 1 = pool pointer        │
//! ├────────────────────────────────────────────────────────────────┤
//! │ inline form (tag = 0)                                          │
//! │   bits 0-7    fg palette index (P16 / P256 modes)              │
//! │   bits 8-15   bg palette index (P16 / P256 modes)              │
//! │   bits 16-17  fg color mode (default / p16 / p256 / rgb)       │
//! │   bits 18-19  bg color mode                                    │
//! │   bits 20-26  bold, underline, blink, inverse, invisible,      │
//! │               dim, italic                                      │
//! │   bits 27-30  reserved (zero)                                  │
//! ├────────────────────────────────────────────────────────────────┤
//! │ pool-pointer form (tag = 1)                                    │
//! │   bits 0-30   word index of a pool node (see `pool`)           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! If either channel is in RGB mode the identifier MUST be in pool-pointer
//! form, and the palette-index byte for that channel MUST be zero so equal
//! attributes compare equal bit-for-bit when used as pool keys.

use bitflags::bitflags;

/// Shift for the foreground color-mode field.
const FG_MODE_SHIFT: u32 = 16;
/// Shift for the background color-mode field.
const BG_MODE_SHIFT: u32 = 18;
/// Width mask of a color-mode field.
const MODE_MASK: u32 = 0b11;

/// Mask of the foreground palette-index byte.
const FG_INDEX_MASK: u32 = 0x0000_00FF;
/// Mask of the background palette-index byte.
const BG_INDEX_MASK: u32 = 0x0000_FF00;
/// Shift of the background palette-index byte.
const BG_INDEX_SHIFT: u32 = 8;

bitflags! {
    /// Style flag bits of the packed attribute word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct AttrFlags: u32 {
        /// Bold text.
        const BOLD = 1 << 20;
        /// Underlined text.
        const UNDERLINE = 1 << 21;
        /// Blinking text.
        const BLINK = 1 << 22;
        /// Inverse video.
        const INVERSE = 1 << 23;
        /// Invisible text.
        const INVISIBLE = 1 << 24;
        /// Dim/faint text.
        const DIM = 1 << 25;
        /// Italic text.
        const ITALIC = 1 << 26;
    }
}

/// Color mode of one channel (fg or bg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ColorMode {
    /// Default terminal color.
    #[default]
    Default = 0,
    /// 16-color palette (indices 0-15).
    Palette16 = 1,
    /// 256-color palette (indices 0-255).
    Palette256 = 2,
    /// 24-bit true color.
    Rgb = 3,
}

impl ColorMode {
    /// Decode from the two mode bits.
    #[must_use]
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & MODE_MASK {
            1 => Self::Palette16,
            2 => Self::Palette256,
            3 => Self::Rgb,
            _ => Self::Default,
        }
    }

    /// Encode as the two mode bits.
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// The 32-bit attribute identifier.
///
/// Inline identifiers (`tag == 0`) carry the full attribute; pool-pointer
/// identifiers (`tag == 1`) index a node in the attribute pool. See the
/// module docs for the bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AttrId(pub u32);

// The identifier must stay exactly one word; cells store it by value.
const _: () = assert!(std::mem::size_of::<AttrId>() == 4);

impl AttrId {
    /// Tag bit marking a pool-pointer identifier.
    pub const POOL_TAG: u32 = 0x8000_0000;

    /// The all-default inline identifier.
    pub const INLINE_DEFAULT: Self = Self(0);

    /// Check whether this identifier points into the pool.
    #[must_use]
    #[inline]
    pub const fn is_pooled(self) -> bool {
        self.0 & Self::POOL_TAG != 0
    }

    /// Check whether this identifier is self-contained.
    #[must_use]
    #[inline]
    pub const fn is_inline(self) -> bool {
        !self.is_pooled()
    }

    /// Word index of the pool node (only meaningful if `is_pooled()`).
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 & !Self::POOL_TAG
    }

    /// Build a pool-pointer identifier from a node's word index.
    #[must_use]
    #[inline]
    pub const fn from_index(index: u32) -> Self {
        Self(index | Self::POOL_TAG)
    }

    /// Raw identifier bits.
    #[must_use]
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Pack RGB components as `0x00RRGGBB`.
#[must_use]
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Unpack a `0x00RRGGBB` word into components.
#[must_use]
#[inline]
pub const fn rgb_parts(v: u32) -> (u8, u8, u8) {
    (((v >> 16) & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, (v & 0xFF) as u8)
}

/// Memoized identifier of an [`Attributes`] value.
///
/// The identifier of a working value is remembered together with the field
/// values it was computed from; it is served again only while all three
/// fields still match.
#[derive(Debug, Clone, Copy)]
struct Memo {
    flags: u32,
    fg: u32,
    bg: u32,
    id: AttrId,
}

/// A working attribute value.
///
/// This is the mutable style state an SGR parser drives: three 32-bit words
/// (`flags`, `fg`, `bg`) plus a private memo of the last identifier the
/// storage handed out for exactly these words. Cells never hold an
/// `Attributes`; they hold the [`AttrId`] obtained from
/// [`AttrStorage::ref_attr`](crate::storage::AttrStorage::ref_attr).
///
/// Equality compares the three value words only; the memo is a cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attributes {
    flags: u32,
    fg: u32,
    bg: u32,
    memo: Option<Memo>,
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.flags == other.flags && self.fg == other.fg && self.bg == other.bg
    }
}

impl Eq for Attributes {}

impl Attributes {
    /// Create an all-default value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from raw field words.
    ///
    /// Useful when restoring parser state; no canonicalization is applied,
    /// so the caller is responsible for upholding the layout invariants
    /// (palette bytes zero in RGB mode).
    #[must_use]
    pub const fn from_raw(flags: u32, fg: u32, bg: u32) -> Self {
        Self {
            flags,
            fg,
            bg,
            memo: None,
        }
    }

    /// Reconstruct from an inline identifier.
    ///
    /// Inline identifiers are self-contained: the identifier word is the
    /// flags word, and both color words are zero.
    #[must_use]
    pub fn from_inline(id: AttrId) -> Self {
        debug_assert!(id.is_inline(), "pool-pointer identifiers need storage");
        let mut a = Self::from_raw(id.bits(), 0, 0);
        a.memo = Some(Memo {
            flags: a.flags,
            fg: 0,
            bg: 0,
            id,
        });
        a
    }

    /// Return to all-default state (SGR 0).
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check whether every field is at its default.
    #[must_use]
    #[inline]
    pub const fn is_default(&self) -> bool {
        self.flags == 0 && self.fg == 0 && self.bg == 0
    }

    /// Raw `(flags, fg, bg)` words, the pool key of this value.
    #[must_use]
    #[inline]
    pub const fn raw_parts(&self) -> (u32, u32, u32) {
        (self.flags, self.fg, self.bg)
    }

    /// The raw flags word (palette bytes, modes and style bits).
    #[must_use]
    #[inline]
    pub const fn flags_word(&self) -> u32 {
        self.flags
    }

    // ------------------------------------------------------------------
    // Style flag accessors
    // ------------------------------------------------------------------

    #[inline]
    fn has_flag(&self, flag: AttrFlags) -> bool {
        self.flags & flag.bits() != 0
    }

    #[inline]
    fn put_flag(&mut self, flag: AttrFlags, on: bool) {
        if on {
            self.flags |= flag.bits();
        } else {
            self.flags &= !flag.bits();
        }
    }

    /// Bold flag.
    #[must_use]
    #[inline]
    pub fn is_bold(&self) -> bool {
        self.has_flag(AttrFlags::BOLD)
    }

    /// Set or clear bold.
    #[inline]
    pub fn set_bold(&mut self, on: bool) {
        self.put_flag(AttrFlags::BOLD, on);
    }

    /// Underline flag.
    #[must_use]
    #[inline]
    pub fn is_underline(&self) -> bool {
        self.has_flag(AttrFlags::UNDERLINE)
    }

    /// Set or clear underline.
    #[inline]
    pub fn set_underline(&mut self, on: bool) {
        self.put_flag(AttrFlags::UNDERLINE, on);
    }

    /// Blink flag.
    #[must_use]
    #[inline]
    pub fn is_blink(&self) -> bool {
        self.has_flag(AttrFlags::BLINK)
    }

    /// Set or clear blink.
    #[inline]
    pub fn set_blink(&mut self, on: bool) {
        self.put_flag(AttrFlags::BLINK, on);
    }

    /// Inverse-video flag.
    #[must_use]
    #[inline]
    pub fn is_inverse(&self) -> bool {
        self.has_flag(AttrFlags::INVERSE)
    }

    /// Set or clear inverse video.
    #[inline]
    pub fn set_inverse(&mut self, on: bool) {
        self.put_flag(AttrFlags::INVERSE, on);
    }

    /// Invisible flag.
    #[must_use]
    #[inline]
    pub fn is_invisible(&self) -> bool {
        self.has_flag(AttrFlags::INVISIBLE)
    }

    /// Set or clear invisible.
    #[inline]
    pub fn set_invisible(&mut self, on: bool) {
        self.put_flag(AttrFlags::INVISIBLE, on);
    }

    /// Dim flag.
    #[must_use]
    #[inline]
    pub fn is_dim(&self) -> bool {
        self.has_flag(AttrFlags::DIM)
    }

    /// Set or clear dim.
    #[inline]
    pub fn set_dim(&mut self, on: bool) {
        self.put_flag(AttrFlags::DIM, on);
    }

    /// Italic flag.
    #[must_use]
    #[inline]
    pub fn is_italic(&self) -> bool {
        self.has_flag(AttrFlags::ITALIC)
    }

    /// Set or clear italic.
    #[inline]
    pub fn set_italic(&mut self, on: bool) {
        self.put_flag(AttrFlags::ITALIC, on);
    }

    // ------------------------------------------------------------------
    // Color accessors
    // ------------------------------------------------------------------

    /// Foreground color mode.
    #[must_use]
    #[inline]
    pub const fn fg_mode(&self) -> ColorMode {
        ColorMode::from_bits(self.flags >> FG_MODE_SHIFT)
    }

    /// Background color mode.
    #[must_use]
    #[inline]
    pub const fn bg_mode(&self) -> ColorMode {
        ColorMode::from_bits(self.flags >> BG_MODE_SHIFT)
    }

    /// Set the foreground color mode.
    ///
    /// Entering RGB mode clears the palette-index byte so pool keys stay
    /// canonical; leaving it clears the RGB word for the same reason.
    #[inline]
    pub fn set_fg_mode(&mut self, mode: ColorMode) {
        self.flags = (self.flags & !(MODE_MASK << FG_MODE_SHIFT)) | (mode.bits() << FG_MODE_SHIFT);
        if matches!(mode, ColorMode::Rgb) {
            self.flags &= !FG_INDEX_MASK;
        } else {
            self.fg = 0;
        }
    }

    /// Set the background color mode. See [`set_fg_mode`](Self::set_fg_mode).
    #[inline]
    pub fn set_bg_mode(&mut self, mode: ColorMode) {
        self.flags = (self.flags & !(MODE_MASK << BG_MODE_SHIFT)) | (mode.bits() << BG_MODE_SHIFT);
        if matches!(mode, ColorMode::Rgb) {
            self.flags &= !BG_INDEX_MASK;
        } else {
            self.bg = 0;
        }
    }

    /// Foreground color value, interpreted per the current mode.
    ///
    /// Default mode yields 0; palette modes yield the palette index; RGB
    /// mode yields the packed `0x00RRGGBB` word.
    #[must_use]
    pub fn get_fg(&self) -> u32 {
        match self.fg_mode() {
            ColorMode::Default => 0,
            ColorMode::Palette16 | ColorMode::Palette256 => self.flags & FG_INDEX_MASK,
            ColorMode::Rgb => self.fg,
        }
    }

    /// Background color value, interpreted per the current mode.
    #[must_use]
    pub fn get_bg(&self) -> u32 {
        match self.bg_mode() {
            ColorMode::Default => 0,
            ColorMode::Palette16 | ColorMode::Palette256 => (self.flags & BG_INDEX_MASK) >> BG_INDEX_SHIFT,
            ColorMode::Rgb => self.bg,
        }
    }

    /// Set the foreground color value for the current mode.
    ///
    /// Default mode ignores the value; palette modes keep the low byte; RGB
    /// mode stores the packed `0x00RRGGBB` word.
    pub fn set_fg(&mut self, value: u32) {
        match self.fg_mode() {
            ColorMode::Default => {}
            ColorMode::Palette16 | ColorMode::Palette256 => {
                self.flags = (self.flags & !FG_INDEX_MASK) | (value & 0xFF);
            }
            ColorMode::Rgb => self.fg = value & 0x00FF_FFFF,
        }
    }

    /// Set the background color value for the current mode.
    pub fn set_bg(&mut self, value: u32) {
        match self.bg_mode() {
            ColorMode::Default => {}
            ColorMode::Palette16 | ColorMode::Palette256 => {
                self.flags = (self.flags & !BG_INDEX_MASK) | ((value & 0xFF) << BG_INDEX_SHIFT);
            }
            ColorMode::Rgb => self.bg = value & 0x00FF_FFFF,
        }
    }

    /// Check whether either channel is in RGB mode.
    ///
    /// RGB attributes cannot be represented inline and must be interned.
    #[must_use]
    #[inline]
    pub fn has_rgb(&self) -> bool {
        matches!(self.fg_mode(), ColorMode::Rgb) || matches!(self.bg_mode(), ColorMode::Rgb)
    }

    // ------------------------------------------------------------------
    // Identifier memo
    // ------------------------------------------------------------------

    /// Return the memoized identifier if the value is unchanged since it was
    /// memoized; otherwise drop the memo and return the default identifier.
    pub fn update_address(&mut self) -> AttrId {
        match self.memo {
            Some(m) if m.flags == self.flags && m.fg == self.fg && m.bg == self.bg => m.id,
            _ => {
                self.memo = None;
                AttrId::INLINE_DEFAULT
            }
        }
    }

    /// Remember `id` as the identifier of the current field values.
    #[inline]
    pub(crate) fn memoize(&mut self, id: AttrId) {
        self.memo = Some(Memo {
            flags: self.flags,
            fg: self.fg,
            bg: self.bg,
            id,
        });
    }

    /// Overwrite all fields and memoize `id` for them.
    #[inline]
    pub(crate) fn load(&mut self, flags: u32, fg: u32, bg: u32, id: AttrId) {
        self.flags = flags;
        self.fg = fg;
        self.bg = bg;
        self.memo = Some(Memo { flags, fg, bg, id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_zero() {
        let a = Attributes::new();
        assert!(a.is_default());
        assert_eq!(a.raw_parts(), (0, 0, 0));
        assert_eq!(a.fg_mode(), ColorMode::Default);
        assert_eq!(a.bg_mode(), ColorMode::Default);
    }

    #[test]
    fn flag_set_get_roundtrip() {
        let mut a = Attributes::new();
        a.set_bold(true);
        a.set_italic(true);
        assert!(a.is_bold());
        assert!(a.is_italic());
        assert!(!a.is_dim());

        a.set_bold(false);
        assert!(!a.is_bold());
        assert!(a.is_italic());
    }

    #[test]
    fn flag_bits_match_layout() {
        let mut a = Attributes::new();
        a.set_bold(true);
        assert_eq!(a.flags_word(), 1 << 20);
        a.set_bold(false);
        a.set_italic(true);
        assert_eq!(a.flags_word(), 1 << 26);
    }

    #[test]
    fn palette_value_truncates_to_byte() {
        let mut a = Attributes::new();
        a.set_fg_mode(ColorMode::Palette256);
        a.set_fg(0x1_02);
        assert_eq!(a.get_fg(), 0x02);
    }

    #[test]
    fn bg_palette_index_uses_second_byte() {
        let mut a = Attributes::new();
        a.set_bg_mode(ColorMode::Palette256);
        a.set_bg(0xAB);
        assert_eq!(a.get_bg(), 0xAB);
        assert_eq!(a.flags_word() & 0xFF, 0, "fg byte untouched");
    }

    #[test]
    fn rgb_mode_clears_palette_byte() {
        let mut a = Attributes::new();
        a.set_fg_mode(ColorMode::Palette256);
        a.set_fg(196);
        a.set_fg_mode(ColorMode::Rgb);
        assert_eq!(a.flags_word() & 0xFF, 0);
        a.set_fg(rgb(0x12, 0x34, 0x56));
        assert_eq!(a.get_fg(), 0x0012_3456);
    }

    #[test]
    fn leaving_rgb_clears_color_word() {
        let mut a = Attributes::new();
        a.set_fg_mode(ColorMode::Rgb);
        a.set_fg(0x123456);
        a.set_fg_mode(ColorMode::Palette16);
        assert_eq!(a.raw_parts().1, 0);
    }

    #[test]
    fn default_mode_get_is_zero_set_is_noop() {
        let mut a = Attributes::new();
        a.set_fg(0xFF);
        assert_eq!(a.get_fg(), 0);
        assert_eq!(a.raw_parts(), (0, 0, 0));
    }

    #[test]
    fn has_rgb_on_either_channel() {
        let mut a = Attributes::new();
        assert!(!a.has_rgb());
        a.set_bg_mode(ColorMode::Rgb);
        assert!(a.has_rgb());
        a.set_bg_mode(ColorMode::Default);
        a.set_fg_mode(ColorMode::Rgb);
        assert!(a.has_rgb());
    }

    #[test]
    fn rgb_pack_unpack() {
        let v = rgb(0x12, 0x34, 0x56);
        assert_eq!(v, 0x0012_3456);
        assert_eq!(rgb_parts(v), (0x12, 0x34, 0x56));
    }

    #[test]
    fn memo_survives_until_any_field_changes() {
        let mut a = Attributes::new();
        a.set_bold(true);
        assert_eq!(a.update_address(), AttrId::INLINE_DEFAULT);

        a.memoize(AttrId(a.flags_word()));
        assert_eq!(a.update_address().bits(), a.flags_word());

        a.set_underline(true);
        assert_eq!(a.update_address(), AttrId::INLINE_DEFAULT);
    }

    #[test]
    fn equality_ignores_memo() {
        let mut a = Attributes::new();
        let b = Attributes::new();
        a.memoize(AttrId(7));
        assert_eq!(a, b);
    }

    #[test]
    fn attr_id_tagging() {
        let id = AttrId::from_index(14);
        assert!(id.is_pooled());
        assert!(!id.is_inline());
        assert_eq!(id.index(), 14);
        assert_eq!(id.bits(), 14 | AttrId::POOL_TAG);

        let inline = AttrId(0x0010_0000);
        assert!(inline.is_inline());
    }

    #[test]
    fn from_inline_is_self_contained() {
        let mut a = Attributes::new();
        a.set_bold(true);
        a.set_fg_mode(ColorMode::Palette16);
        a.set_fg(4);

        let id = AttrId(a.flags_word());
        let mut b = Attributes::from_inline(id);
        assert_eq!(a, b);
        assert_eq!(b.update_address(), id);
    }
}
