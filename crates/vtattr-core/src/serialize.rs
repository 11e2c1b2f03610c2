//! SGR serialization of cell runs.
//!
//! ## Design
//!
//! The serializer walks lines of cells in row-major order and emits a byte
//! stream of UTF-8 text with CSI SGR escapes: whenever a cell's attribute
//! identifier differs from the previous cell's, the *minimal* parameter
//! list transitioning between the two attribute values is written as one
//! `ESC [ ... m` sequence, followed by the cell's glyph. Rows are joined
//! with `\r\n`. Attribute state carries across rows, so a screen serializes
//! as a single stream an emulator can replay.
//!
//! Transition parameters are grouped flags → foreground → background.
//! SGR 22 resets both bold and dim; when either turns off, `22` is emitted
//! once and whichever of the two remains set is asserted again.
//!
//! Trailing blank cells with default background are right-trimmed from each
//! row, the way the original stream would have left them unwritten.

use std::fmt::{self, Write as _};

use crate::attr::{rgb_parts, AttrId, Attributes, ColorMode};
use crate::cell::Cell;
use crate::storage::AttrStorage;

/// Append one parameter, separating with `;`.
fn push_code(params: &mut String, args: fmt::Arguments<'_>) {
    if !params.is_empty() {
        params.push(';');
    }
    let _ = params.write_fmt(args);
}

/// Append set/reset codes for one independently resettable flag.
fn push_flag(params: &mut String, was: bool, now: bool, set: u32, reset: u32) {
    if was != now {
        push_code(params, format_args!("{}", if now { set } else { reset }));
    }
}

/// Append the color codes for one channel.
///
/// `normal`/`bright`/`ext` are the channel's code bases: 30/90/38 for the
/// foreground, 40/100/48 for the background. The default-color code is
/// `ext + 1` (39 / 49).
fn push_color(params: &mut String, mode: ColorMode, value: u32, normal: u32, bright: u32, ext: u32) {
    match mode {
        ColorMode::Default => push_code(params, format_args!("{}", ext + 1)),
        ColorMode::Palette16 => {
            let base = if value & 8 != 0 { bright } else { normal };
            push_code(params, format_args!("{}", base + (value & 7)));
        }
        ColorMode::Palette256 => push_code(params, format_args!("{ext};5;{value}")),
        ColorMode::Rgb => {
            let (r, g, b) = rgb_parts(value);
            push_code(params, format_args!("{ext};2;{r};{g};{b}"));
        }
    }
}

/// Build the minimal SGR escape transitioning `old` into `new`.
///
/// Returns the full `ESC [ ... m` sequence, or an empty string when the two
/// values render identically.
#[must_use]
pub fn sgr_transition(old: &Attributes, new: &Attributes) -> String {
    let mut params = String::new();

    // Bold and dim share reset code 22: emit it once when either turns
    // off, then re-assert the survivor.
    let bold_off = old.is_bold() && !new.is_bold();
    let dim_off = old.is_dim() && !new.is_dim();
    if bold_off || dim_off {
        push_code(&mut params, format_args!("22"));
        if new.is_bold() {
            push_code(&mut params, format_args!("1"));
        }
        if new.is_dim() {
            push_code(&mut params, format_args!("2"));
        }
    } else {
        push_flag(&mut params, old.is_bold(), new.is_bold(), 1, 22);
        push_flag(&mut params, old.is_dim(), new.is_dim(), 2, 22);
    }
    push_flag(&mut params, old.is_italic(), new.is_italic(), 3, 23);
    push_flag(&mut params, old.is_underline(), new.is_underline(), 4, 24);
    push_flag(&mut params, old.is_blink(), new.is_blink(), 5, 25);
    push_flag(&mut params, old.is_inverse(), new.is_inverse(), 7, 27);
    push_flag(&mut params, old.is_invisible(), new.is_invisible(), 8, 28);

    if old.fg_mode() != new.fg_mode() || old.get_fg() != new.get_fg() {
        push_color(&mut params, new.fg_mode(), new.get_fg(), 30, 90, 38);
    }
    if old.bg_mode() != new.bg_mode() || old.get_bg() != new.get_bg() {
        push_color(&mut params, new.bg_mode(), new.get_bg(), 40, 100, 48);
    }

    if params.is_empty() {
        String::new()
    } else {
        format!("\x1b[{params}m")
    }
}

/// Streaming serializer over lines of cells.
///
/// Attribute state starts all-default and carries across pushed lines.
#[derive(Debug)]
pub struct Serializer<'a> {
    storage: &'a AttrStorage,
    prev: Attributes,
    prev_id: AttrId,
    out: String,
    rows: usize,
}

impl<'a> Serializer<'a> {
    /// Create a serializer reading attributes out of `storage`.
    #[must_use]
    pub fn new(storage: &'a AttrStorage) -> Self {
        Self {
            storage,
            prev: Attributes::new(),
            prev_id: AttrId::INLINE_DEFAULT,
            out: String::new(),
            rows: 0,
        }
    }

    /// Serialize one row of cells.
    pub fn push_line(&mut self, cells: &[Cell]) {
        if self.rows > 0 {
            self.out.push_str("\r\n");
        }
        self.rows += 1;

        let end = self.visible_len(cells);
        let mut i = 0;
        while i < end {
            let cell = &cells[i];

            if cell.attr() != self.prev_id {
                let mut next = Attributes::new();
                self.storage.from_id(cell.attr(), &mut next);
                self.out.push_str(&sgr_transition(&self.prev, &next));
                self.prev = next;
                self.prev_id = cell.attr();
            }

            if cell.is_blank() {
                self.out.push(' ');
            } else {
                self.out.push_str(cell.glyph());
            }

            // Wide cells also own the following spacer cell; zero-width
            // cells still advance one slot so the scan makes progress.
            i += usize::from(cell.width().max(1));
        }
    }

    /// Consume the serializer and return the emitted stream.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    /// Length of the row once trailing blank default-background cells are
    /// dropped.
    fn visible_len(&self, cells: &[Cell]) -> usize {
        let mut end = cells.len();
        while end > 0 {
            let cell = &cells[end - 1];
            if cell.is_blank() && self.bg_is_default(cell.attr()) {
                end -= 1;
            } else {
                break;
            }
        }
        end
    }

    fn bg_is_default(&self, id: AttrId) -> bool {
        let mut a = Attributes::new();
        self.storage.from_id(id, &mut a);
        matches!(a.bg_mode(), ColorMode::Default)
    }
}

/// Serialize a whole screen in one call.
#[must_use]
pub fn serialize_lines<L: AsRef<[Cell]>>(storage: &AttrStorage, lines: &[L]) -> String {
    let mut ser = Serializer::new(storage);
    for line in lines {
        ser.push_line(line.as_ref());
    }
    ser.finish()
}
