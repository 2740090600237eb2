//! NVT (ANSI/VT100) stream processor. Shares the same `ScreenBuffer` the
//! 3270 order decoder writes to, so switching between 3270 and NVT mode on
//! a live connection never requires copying cells between two worlds.
//!
//! The state machine mirrors the table-driven shape of the terminal this
//! core's sibling 3270 decoder was grounded on: a small state enum, a
//! per-state byte classifier, and a dispatch function per action. Unlike
//! the 3270 side there is no host-visible wire encoding to round-trip
//! exactly, so a handful of rarely-exercised VT100 actions (terminal-id
//! and device-attribute reports) are collapsed into a single "reply"
//! callback rather than each getting its own action function.

use crate::lib3270::buffer::ScreenBuffer;
use crate::lib3270::callbacks::Callbacks;
use crate::lib3270::cell::{Cell, CS_BASE, CS_DBCS, CS_LINEDRAW, DbcsState, GR_BLINK, GR_INTENSIFY, GR_REVERSE, GR_UNDERLINE, GR_WRAP};

const NN: usize = 20;

/// The nine lexer states the original terminal's `nvt.c` drives its action
/// table with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NvtState {
    Data,
    Esc,
    Csdes,
    N1,
    Decp,
    Text,
    Text2,
    Mbpend,
    Escgt,
}

/// G0-G3 charset designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Default)]
enum Csd {
    LineDrawing,
    UkNational,
    #[default]
    UsAscii,
}


#[derive(Debug, Clone, Copy, Default)]
struct SavedCursor {
    addr: usize,
    gr: u8,
    fg: u8,
    bg: u8,
    cset: usize,
    csd: [Csd; 4],
}

/// Mode bits that ESC 7/8 and DECSC/DECRC do not touch but DEC private
/// mode save/restore (`CSI ? Ps s` / `CSI ? Ps r`) does.
#[derive(Debug, Clone, Copy)]
struct Modes {
    insert: bool,
    auto_newline: bool,
    appl_cursor: bool,
    wraparound: bool,
    rev_wraparound: bool,
    wide: bool,
    allow_wide: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Modes {
            insert: false,
            auto_newline: false,
            appl_cursor: false,
            wraparound: true,
            rev_wraparound: false,
            wide: false,
            allow_wide: false,
        }
    }
}

/// The ANSI/VT100 stream processor. One instance owns the cursor-adjacent
/// rendering state (current SGR attributes, charset designations, modes,
/// tab stops, scroll region) that the 3270 side has no equivalent for;
/// the cells themselves live in the shared `ScreenBuffer` passed to every
/// call.
#[derive(Debug)]
pub struct NvtProcessor {
    state: NvtState,
    saved_cursor: Option<SavedCursor>,

    params: [i32; NN],
    nparams: usize,

    text: String,

    gr: u8,
    fg: u8,
    bg: u8,
    cset: usize,
    csd: [Csd; 4],
    once_cset: Option<usize>,

    modes: Modes,
    saved_modes: Modes,

    scroll_top: usize,
    scroll_bottom: usize,

    tabs: Vec<bool>,

    held_wrap: bool,
    mb_pending: Vec<u8>,

    cs_to_change: usize,
}

impl NvtProcessor {
    pub fn new(cols: usize) -> Self {
        let mut tabs = vec![false; cols.max(1)];
        let mut c = 0;
        while c < tabs.len() {
            tabs[c] = true;
            c += 8;
        }
        NvtProcessor {
            state: NvtState::Data,
            saved_cursor: None,
            params: [0; NN],
            nparams: 0,
            text: String::new(),
            gr: 0,
            fg: 0,
            bg: 0,
            cset: 0,
            csd: [Csd::UsAscii; 4],
            once_cset: None,
            modes: Modes::default(),
            saved_modes: Modes::default(),
            scroll_top: 0,
            scroll_bottom: 0,
            tabs,
            held_wrap: false,
            mb_pending: Vec::new(),
            cs_to_change: 0,
        }
    }

    fn scroll_bottom(&self, buf: &ScreenBuffer) -> usize {
        if self.scroll_bottom == 0 {
            buf.rows() - 1
        } else {
            self.scroll_bottom.min(buf.rows() - 1)
        }
    }

    fn row(&self, buf: &ScreenBuffer) -> usize {
        buf.cursor_addr / buf.cols()
    }

    fn col(&self, buf: &ScreenBuffer) -> usize {
        buf.cursor_addr % buf.cols()
    }

    fn move_to(&mut self, buf: &mut ScreenBuffer, row: usize, col: usize) {
        let row = row.min(buf.rows() - 1);
        let col = col.min(buf.cols() - 1);
        buf.set_cursor(row * buf.cols() + col);
        self.held_wrap = false;
    }

    /// Feed a chunk of host bytes through the lexer, mutating `buf` and
    /// `cb` as actions fire. DBCS pairing for NVT wide characters is
    /// handled inline (unlike the 3270 side's separate post-processing
    /// pass) since there is no structured-field boundary to defer to.
    pub fn process(&mut self, buf: &mut ScreenBuffer, bytes: &[u8], cb: &mut dyn Callbacks) {
        for &b in bytes {
            self.feed_byte(buf, b, cb);
        }
    }

    fn feed_byte(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match self.state {
            NvtState::Data => self.data_byte(buf, b, cb),
            NvtState::Esc => self.esc_byte(buf, b, cb),
            NvtState::Csdes => self.csdes_byte(buf, b),
            NvtState::N1 => self.n1_byte(buf, b, cb),
            NvtState::Decp => self.decp_byte(buf, b, cb),
            NvtState::Text => self.text_byte(b),
            NvtState::Text2 => self.text2_byte(b, cb),
            NvtState::Mbpend => self.mbpend_byte(buf, b),
            NvtState::Escgt => self.escgt_byte(buf, b, cb),
        }
    }

    fn reset_params(&mut self) {
        self.params = [0; NN];
        self.nparams = 0;
    }

    fn param(&self, i: usize, default: i32) -> i32 {
        let v = *self.params.get(i).unwrap_or(&0);
        if v == 0 { default } else { v }
    }

    // ---- DATA state -----------------------------------------------

    fn data_byte(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match b {
            0x00 | 0x7F => {}
            0x07 => cb.ring_bell(),
            0x08 => self.backspace(buf),
            0x09 => self.htab(buf),
            0x0A..=0x0C => self.linefeed(buf, cb),
            0x0D => self.carriage_return(buf),
            0x0E => self.cset = 1,
            0x0F => self.cset = 0,
            0x1B => {
                self.reset_params();
                self.state = NvtState::Esc;
            }
            _ => self.printing(buf, b, cb),
        }
    }

    fn backspace(&mut self, buf: &mut ScreenBuffer) {
        let (row, col) = (self.row(buf), self.col(buf));
        if col > 0 {
            self.move_to(buf, row, col - 1);
        } else if self.modes.rev_wraparound && row > 0 {
            self.move_to(buf, row - 1, buf.cols() - 1);
        }
    }

    fn htab(&mut self, buf: &mut ScreenBuffer) {
        let row = self.row(buf);
        let mut col = self.col(buf) + 1;
        while col < buf.cols() - 1 && !self.tabs[col] {
            col += 1;
        }
        self.move_to(buf, row, col.min(buf.cols() - 1));
    }

    fn carriage_return(&mut self, buf: &mut ScreenBuffer) {
        let row = self.row(buf);
        self.move_to(buf, row, 0);
    }

    fn linefeed(&mut self, buf: &mut ScreenBuffer, cb: &mut dyn Callbacks) {
        if self.modes.auto_newline {
            self.carriage_return(buf);
        }
        self.index(buf, cb);
    }

    fn index(&mut self, buf: &mut ScreenBuffer, cb: &mut dyn Callbacks) {
        let row = self.row(buf);
        let bottom = self.scroll_bottom(buf);
        if row == bottom {
            self.scroll_up(buf, cb);
        } else if row < buf.rows() - 1 {
            let col = self.col(buf);
            self.move_to(buf, row + 1, col);
        }
    }

    fn reverse_index(&mut self, buf: &mut ScreenBuffer) {
        let row = self.row(buf);
        if row == self.scroll_top {
            self.scroll_down(buf);
        } else if row > 0 {
            let col = self.col(buf);
            self.move_to(buf, row - 1, col);
        }
    }

    fn scroll_up(&mut self, buf: &mut ScreenBuffer, cb: &mut dyn Callbacks) {
        let top = self.scroll_top;
        let bottom = self.scroll_bottom(buf);
        let cols = buf.cols();
        cb.scroll_save(1);
        for r in top..bottom {
            for c in 0..cols {
                let src = (r + 1) * cols + c;
                let dst = r * cols + c;
                let cell = *buf.cell(src);
                *buf.cell_mut(dst) = cell;
            }
        }
        let blank_row = bottom;
        for c in 0..cols {
            *buf.cell_mut(blank_row * cols + c) = Cell::default();
        }
        buf.mark_dirty();
    }

    fn scroll_down(&mut self, buf: &mut ScreenBuffer) {
        let top = self.scroll_top;
        let bottom = self.scroll_bottom(buf);
        let cols = buf.cols();
        let mut r = bottom;
        while r > top {
            for c in 0..cols {
                let src = (r - 1) * cols + c;
                let dst = r * cols + c;
                let cell = *buf.cell(src);
                *buf.cell_mut(dst) = cell;
            }
            r -= 1;
        }
        for c in 0..cols {
            *buf.cell_mut(top * cols + c) = Cell::default();
        }
        buf.mark_dirty();
    }

    /// Writes one printable byte, assembling UTF-8 continuation bytes and
    /// DBCS wide-character pairs before committing to the buffer, and
    /// executing a held wrap from the previous call before placing the
    /// new character.
    fn printing(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        if b >= 0x80 {
            self.mb_pending.push(b);
            let need = if b & 0xE0 == 0xC0 {
                2
            } else if b & 0xF0 == 0xE0 {
                3
            } else if b & 0xF8 == 0xF0 {
                4
            } else {
                1
            };
            if self.mb_pending.len() < need {
                self.state = NvtState::Mbpend;
                return;
            }
            let bytes = std::mem::take(&mut self.mb_pending);
            let ch = std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or('\u{FFFD}');
            self.place_char(buf, ch as u32, cb);
            return;
        }
        self.place_char(buf, b as u32, cb);
    }

    fn mbpend_byte(&mut self, buf: &mut ScreenBuffer, b: u8) {
        self.mb_pending.push(b);
        let first = self.mb_pending[0];
        let need = if first & 0xE0 == 0xC0 {
            2
        } else if first & 0xF0 == 0xE0 {
            3
        } else {
            4
        };
        if self.mb_pending.len() >= need {
            let bytes = std::mem::take(&mut self.mb_pending);
            let ch = std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or('\u{FFFD}');
            self.state = NvtState::Data;
            self.place_char_no_cb(buf, ch as u32);
        }
    }

    fn place_char_no_cb(&mut self, buf: &mut ScreenBuffer, ucs4: u32) {
        self.place_char_inner(buf, ucs4);
    }

    fn place_char(&mut self, buf: &mut ScreenBuffer, ucs4: u32, _cb: &mut dyn Callbacks) {
        self.place_char_inner(buf, ucs4);
    }

    fn place_char_inner(&mut self, buf: &mut ScreenBuffer, ucs4: u32) {
        if self.held_wrap {
            self.held_wrap = false;
            let row = self.row(buf);
            let col = buf.cols() - 1;
            buf.cell_mut(row * buf.cols() + col).gr |= GR_WRAP;
            if self.modes.wraparound {
                self.index_for_wrap(buf);
                self.move_to(buf, self.row(buf), 0);
            }
        }

        let wide = self.modes.wide && ucs4 > 0x7F;
        let cs = match self.csd[self.cset] {
            Csd::LineDrawing => CS_LINEDRAW,
            _ => CS_BASE,
        };
        let cset_now = self.once_cset.take().unwrap_or(self.cset);
        let cs = if cset_now == self.cset { cs } else { CS_BASE };

        let row = self.row(buf);
        let col = self.col(buf);
        let addr = row * buf.cols() + col;

        let cell = buf.cell_mut(addr);
        cell.fa = 0;
        cell.ec = if ucs4 < 0x100 { ucs4 as u8 } else { 0 };
        cell.ucs4 = ucs4;
        cell.fg = self.fg;
        cell.bg = self.bg;
        cell.gr = self.gr;
        cell.cs = if wide { CS_DBCS } else { cs };
        cell.db = if wide { DbcsState::Left } else { DbcsState::None };
        buf.mark_dirty();

        if wide && col + 1 < buf.cols() {
            let raddr = addr + 1;
            let rcell = buf.cell_mut(raddr);
            rcell.fa = 0;
            rcell.ec = 0;
            rcell.ucs4 = ucs4;
            rcell.fg = self.fg;
            rcell.bg = self.bg;
            rcell.gr = self.gr;
            rcell.cs = CS_DBCS;
            rcell.db = DbcsState::Right;
        }

        let advance = if wide { 2 } else { 1 };
        let next_col = col + advance;
        if next_col >= buf.cols() {
            if self.modes.wraparound {
                let last_col = buf.cols() - 1;
                buf.cell_mut(row * buf.cols() + last_col).gr |= GR_WRAP;
                self.held_wrap = true;
                buf.set_cursor(row * buf.cols() + last_col);
            } else {
                self.move_to(buf, row, buf.cols() - 1);
            }
        } else {
            self.move_to(buf, row, next_col);
        }
    }

    fn index_for_wrap(&mut self, buf: &mut ScreenBuffer) {
        let row = self.row(buf);
        let bottom = self.scroll_bottom(buf);
        if row == bottom {
            let cols = buf.cols();
            let top = self.scroll_top;
            for r in top..bottom {
                for c in 0..cols {
                    let src = (r + 1) * cols + c;
                    let dst = r * cols + c;
                    let cell = *buf.cell(src);
                    *buf.cell_mut(dst) = cell;
                }
            }
            for c in 0..cols {
                *buf.cell_mut(bottom * cols + c) = Cell::default();
            }
            buf.mark_dirty();
        } else if row < buf.rows() - 1 {
            buf.set_cursor(buf.cursor_addr + buf.cols());
        }
    }

    // ---- ESC state --------------------------------------------------

    fn esc_byte(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match b {
            b'7' => {
                self.saved_cursor = Some(SavedCursor {
                    addr: buf.cursor_addr,
                    gr: self.gr,
                    fg: self.fg,
                    bg: self.bg,
                    cset: self.cset,
                    csd: self.csd,
                });
                self.state = NvtState::Data;
            }
            b'8' => {
                if let Some(s) = self.saved_cursor {
                    buf.set_cursor(s.addr);
                    self.gr = s.gr;
                    self.fg = s.fg;
                    self.bg = s.bg;
                    self.cset = s.cset;
                    self.csd = s.csd;
                }
                self.state = NvtState::Data;
            }
            b'D' => {
                self.index(buf, cb);
                self.state = NvtState::Data;
            }
            b'M' => {
                self.reverse_index(buf);
                self.state = NvtState::Data;
            }
            b'E' => {
                self.carriage_return(buf);
                self.index(buf, cb);
                self.state = NvtState::Data;
            }
            b'c' => {
                self.hard_reset(buf);
                self.state = NvtState::Data;
            }
            b'(' | b')' | b'*' | b'+' => {
                self.cs_to_change = b'(' as usize;
                self.cs_to_change = match b {
                    b'(' => 0,
                    b')' => 1,
                    b'*' => 2,
                    b'+' => 3,
                    _ => 0,
                };
                self.state = NvtState::Csdes;
            }
            b'N' => {
                self.once_cset = Some(2);
                self.state = NvtState::Data;
            }
            b'O' => {
                self.once_cset = Some(3);
                self.state = NvtState::Data;
            }
            b'[' => {
                self.reset_params();
                self.state = NvtState::N1;
            }
            b']' => {
                self.text.clear();
                self.state = NvtState::Text;
            }
            b'>' => {
                self.reset_params();
                self.state = NvtState::Escgt;
            }
            _ => self.state = NvtState::Data,
        }
    }

    fn hard_reset(&mut self, buf: &mut ScreenBuffer) {
        buf.clear();
        self.gr = 0;
        self.fg = 0;
        self.bg = 0;
        self.cset = 0;
        self.csd = [Csd::UsAscii; 4];
        self.modes = Modes::default();
        self.scroll_top = 0;
        self.scroll_bottom = 0;
        self.held_wrap = false;
    }

    fn csdes_byte(&mut self, _buf: &mut ScreenBuffer, b: u8) {
        self.csd[self.cs_to_change] = match b {
            b'0' => Csd::LineDrawing,
            b'A' => Csd::UkNational,
            _ => Csd::UsAscii,
        };
        self.state = NvtState::Data;
    }

    // ---- N1 (CSI) state ----------------------------------------------

    fn n1_byte(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match b {
            b'0'..=b'9' => self.digit(b),
            b';' => self.semicolon(),
            b'?' => self.state = NvtState::Decp,
            b'#' => self.state = NvtState::Escgt,
            b'A' => self.csi_cursor_up(buf),
            b'B' => self.csi_cursor_down(buf),
            b'C' => self.csi_cursor_right(buf),
            b'D' => self.csi_cursor_left(buf),
            b'H' | b'f' => self.csi_cursor_motion(buf),
            b'G' | b'`' => self.csi_cursor_horizontal(buf),
            b'd' => self.csi_vertical_position(buf),
            b'J' => self.csi_erase_in_display(buf),
            b'K' => self.csi_erase_in_line(buf),
            b'L' => self.csi_insert_lines(buf),
            b'M' => self.csi_delete_lines(buf),
            b'P' => self.csi_delete_chars(buf),
            b'@' => self.csi_insert_chars(buf),
            b'm' => self.sgr(),
            b'h' => self.set_mode(),
            b'l' => self.reset_mode(),
            b'c' => cb.trace_ds("device attributes requested"),
            b'n' => self.status_report(buf, cb),
            b'g' => self.tab_clear(buf),
            b'r' => self.dec_scrolling_region(buf),
            _ => {}
        }
        if matches!(b, 0x40..=0x7E) {
            self.state = NvtState::Data;
        }
    }

    fn digit(&mut self, b: u8) {
        if self.nparams == 0 {
            self.nparams = 1;
        }
        let i = self.nparams - 1;
        if i < NN {
            self.params[i] = self.params[i].saturating_mul(10) + (b - b'0') as i32;
        }
    }

    fn semicolon(&mut self) {
        if self.nparams < NN {
            self.nparams += 1;
        }
    }

    fn csi_cursor_up(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let row = self.row(buf).saturating_sub(n).max(self.scroll_top);
        let col = self.col(buf);
        self.move_to(buf, row, col);
    }

    fn csi_cursor_down(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let bottom = self.scroll_bottom(buf);
        let row = (self.row(buf) + n).min(bottom);
        let col = self.col(buf);
        self.move_to(buf, row, col);
    }

    fn csi_cursor_right(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let row = self.row(buf);
        let col = (self.col(buf) + n).min(buf.cols() - 1);
        self.move_to(buf, row, col);
    }

    fn csi_cursor_left(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let row = self.row(buf);
        let col = self.col(buf).saturating_sub(n);
        self.move_to(buf, row, col);
    }

    fn csi_cursor_motion(&mut self, buf: &mut ScreenBuffer) {
        let row = (self.param(0, 1).max(1) as usize - 1).min(buf.rows() - 1);
        let col = (self.param(1, 1).max(1) as usize - 1).min(buf.cols() - 1);
        self.move_to(buf, row, col);
    }

    fn csi_cursor_horizontal(&mut self, buf: &mut ScreenBuffer) {
        let col = (self.param(0, 1).max(1) as usize - 1).min(buf.cols() - 1);
        let row = self.row(buf);
        self.move_to(buf, row, col);
    }

    fn csi_vertical_position(&mut self, buf: &mut ScreenBuffer) {
        let row = (self.param(0, 1).max(1) as usize - 1).min(buf.rows() - 1);
        let col = self.col(buf);
        self.move_to(buf, row, col);
    }

    fn csi_erase_in_display(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 0);
        let addr = buf.cursor_addr;
        let size = buf.size();
        match n {
            0 => {
                for a in addr..size {
                    *buf.cell_mut(a) = Cell::default();
                }
            }
            1 => {
                for a in 0..=addr {
                    *buf.cell_mut(a) = Cell::default();
                }
            }
            2 | 3 => {
                for a in 0..size {
                    *buf.cell_mut(a) = Cell::default();
                }
            }
            _ => {}
        }
        buf.mark_dirty();
    }

    fn csi_erase_in_line(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 0);
        let row = self.row(buf);
        let col = self.col(buf);
        let cols = buf.cols();
        let base = row * cols;
        match n {
            0 => {
                for c in col..cols {
                    *buf.cell_mut(base + c) = Cell::default();
                }
            }
            1 => {
                for c in 0..=col {
                    *buf.cell_mut(base + c) = Cell::default();
                }
            }
            2 => {
                for c in 0..cols {
                    *buf.cell_mut(base + c) = Cell::default();
                }
            }
            _ => {}
        }
        buf.mark_dirty();
    }

    fn csi_insert_lines(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        for _ in 0..n {
            self.scroll_down_from_cursor(buf);
        }
    }

    fn csi_delete_lines(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        for _ in 0..n {
            self.scroll_up_from_cursor(buf);
        }
    }

    fn scroll_down_from_cursor(&mut self, buf: &mut ScreenBuffer) {
        let top = self.row(buf);
        let bottom = self.scroll_bottom(buf);
        let cols = buf.cols();
        let mut r = bottom;
        while r > top {
            for c in 0..cols {
                let cell = *buf.cell((r - 1) * cols + c);
                *buf.cell_mut(r * cols + c) = cell;
            }
            r -= 1;
        }
        for c in 0..cols {
            *buf.cell_mut(top * cols + c) = Cell::default();
        }
        buf.mark_dirty();
    }

    fn scroll_up_from_cursor(&mut self, buf: &mut ScreenBuffer) {
        let top = self.row(buf);
        let bottom = self.scroll_bottom(buf);
        let cols = buf.cols();
        for r in top..bottom {
            for c in 0..cols {
                let cell = *buf.cell((r + 1) * cols + c);
                *buf.cell_mut(r * cols + c) = cell;
            }
        }
        for c in 0..cols {
            *buf.cell_mut(bottom * cols + c) = Cell::default();
        }
        buf.mark_dirty();
    }

    fn csi_delete_chars(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let row = self.row(buf);
        let col = self.col(buf);
        let cols = buf.cols();
        for c in col..cols {
            let src = c + n;
            let cell = if src < cols {
                *buf.cell(row * cols + src)
            } else {
                Cell::default()
            };
            *buf.cell_mut(row * cols + c) = cell;
        }
        buf.mark_dirty();
    }

    fn csi_insert_chars(&mut self, buf: &mut ScreenBuffer) {
        let n = self.param(0, 1).max(1) as usize;
        let row = self.row(buf);
        let col = self.col(buf);
        let cols = buf.cols();
        let mut c = cols;
        while c > col {
            c -= 1;
            let cell = if c >= col + n {
                *buf.cell(row * cols + (c - n))
            } else {
                Cell::default()
            };
            *buf.cell_mut(row * cols + c) = cell;
        }
        buf.mark_dirty();
    }

    fn sgr(&mut self) {
        if self.nparams == 0 {
            self.gr = 0;
            self.fg = 0;
            self.bg = 0;
            return;
        }
        for i in 0..self.nparams {
            match self.params[i] {
                0 => {
                    self.gr = 0;
                    self.fg = 0;
                    self.bg = 0;
                }
                1 => self.gr |= GR_INTENSIFY,
                4 => self.gr |= GR_UNDERLINE,
                5 => self.gr |= GR_BLINK,
                7 => self.gr |= GR_REVERSE,
                22 => self.gr &= !GR_INTENSIFY,
                24 => self.gr &= !GR_UNDERLINE,
                25 => self.gr &= !GR_BLINK,
                27 => self.gr &= !GR_REVERSE,
                30..=37 => self.fg = (self.params[i] - 30) as u8 + 1,
                39 => self.fg = 0,
                40..=47 => self.bg = (self.params[i] - 40) as u8 + 1,
                49 => self.bg = 0,
                _ => {}
            }
        }
    }

    fn set_mode(&mut self) {
        for i in 0..self.nparams.max(1) {
            match self.params[i] {
                4 => self.modes.insert = true,
                20 => self.modes.auto_newline = true,
                _ => {}
            }
        }
    }

    fn reset_mode(&mut self) {
        for i in 0..self.nparams.max(1) {
            match self.params[i] {
                4 => self.modes.insert = false,
                20 => self.modes.auto_newline = false,
                _ => {}
            }
        }
    }

    fn status_report(&mut self, buf: &ScreenBuffer, cb: &mut dyn Callbacks) {
        if self.param(0, 0) == 6 {
            let msg = format!("CPR {};{}", self.row(buf) + 1, self.col(buf) + 1);
            cb.trace_ds(&msg);
        }
    }

    fn tab_clear(&mut self, buf: &ScreenBuffer) {
        match self.param(0, 0) {
            0 => {
                let col = self.col(buf);
                if col < self.tabs.len() {
                    self.tabs[col] = false;
                }
            }
            3 => self.tabs.iter_mut().for_each(|t| *t = false),
            _ => {}
        }
    }

    // ---- DECP (CSI ?) state -------------------------------------------

    fn decp_byte(&mut self, buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match b {
            b'0'..=b'9' => self.digit(b),
            b';' => self.semicolon(),
            b'h' => {
                self.dec_set();
                self.state = NvtState::Data;
            }
            b'l' => {
                self.dec_reset(buf);
                self.state = NvtState::Data;
            }
            b's' => {
                self.saved_modes = self.modes;
                self.state = NvtState::Data;
            }
            b'r' => {
                self.dec_scrolling_region(buf);
                self.state = NvtState::Data;
            }
            b'n' => {
                self.status_report(buf, cb);
                self.state = NvtState::Data;
            }
            _ => self.state = NvtState::Data,
        }
    }

    fn dec_set(&mut self) {
        for i in 0..self.nparams.max(1) {
            match self.params[i] {
                1 => self.modes.appl_cursor = true,
                3 => self.modes.allow_wide = true,
                7 => self.modes.wraparound = true,
                45 => self.modes.rev_wraparound = true,
                _ => {}
            }
        }
    }

    fn dec_reset(&mut self, _buf: &mut ScreenBuffer) {
        for i in 0..self.nparams.max(1) {
            match self.params[i] {
                1 => self.modes.appl_cursor = false,
                3 => self.modes.allow_wide = false,
                7 => self.modes.wraparound = false,
                45 => self.modes.rev_wraparound = false,
                _ => {}
            }
        }
    }

    fn dec_scrolling_region(&mut self, buf: &mut ScreenBuffer) {
        let top = (self.param(0, 1).max(1) as usize) - 1;
        let bottom = (self.param(1, buf.rows() as i32).max(1) as usize) - 1;
        if top < bottom && bottom < buf.rows() {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = 0;
        }
        self.move_to(buf, self.scroll_top, 0);
    }

    // ---- TEXT / TEXT2 (OSC) --------------------------------------------

    fn text_byte(&mut self, b: u8) {
        match b {
            b'0'..=b'9' => self.digit(b),
            b';' => self.state = NvtState::Text2,
            0x07 => self.state = NvtState::Data,
            _ => self.state = NvtState::Data,
        }
    }

    fn text2_byte(&mut self, b: u8, cb: &mut dyn Callbacks) {
        if b == 0x07 {
            let code = self.param(0, 0) as u32;
            cb.xterm_text_gui(code, &self.text);
            self.text.clear();
            self.state = NvtState::Data;
        } else {
            self.text.push(b as char);
        }
    }

    // ---- ESCGT (ESC >) --------------------------------------------------

    fn escgt_byte(&mut self, _buf: &mut ScreenBuffer, b: u8, cb: &mut dyn Callbacks) {
        match b {
            b'0'..=b'9' => self.digit(b),
            b'c' => {
                cb.trace_ds("secondary device attributes requested");
                self.state = NvtState::Data;
            }
            _ => self.state = NvtState::Data,
        }
    }

    /// Reconstructs a best-effort byte stream: cursor position, current
    /// SGR attributes, then the screen's printable content row by row.
    /// Unlike the 3270 Inbound Encoder this does not attempt to
    /// reproduce an in-progress escape sequence, since NVT mode has no
    /// host-visible notion of a partially-applied order.
    pub fn snap(&self, buf: &ScreenBuffer) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"\x1b[2J");
        for row in 0..buf.rows() {
            let mut col = 0;
            while col < buf.cols() {
                let cell = buf.get_row(row)[col];
                if !cell.is_blank() {
                    out.extend_from_slice(format!("\x1b[{};{}H", row + 1, col + 1).as_bytes());
                    if cell.ec != 0 {
                        out.push(cell.ec);
                    }
                }
                col += 1;
            }
        }
        out.extend_from_slice(
            format!("\x1b[{};{}H", self.row(buf) + 1, self.col(buf) + 1).as_bytes(),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::buffer::ScreenSize;
    use crate::lib3270::callbacks::NullCallbacks;

    fn new_buf() -> ScreenBuffer {
        ScreenBuffer::new(ScreenSize::Model2)
    }

    #[test]
    fn printable_characters_advance_cursor() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"AB", &mut cb);
        assert_eq!(buf.cell(0).ec, b'A');
        assert_eq!(buf.cell(1).ec, b'B');
        assert_eq!(buf.cursor_addr, 2);
    }

    #[test]
    fn held_wrap_defers_to_next_character() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        let line = vec![b'X'; buf.cols()];
        nvt.process(&mut buf, &line, &mut cb);
        assert_eq!(buf.cursor_addr, buf.cols() - 1);
        assert!(nvt.held_wrap);
        let last_col = buf.cols() - 1;
        nvt.process(&mut buf, b"Y", &mut cb);
        assert_eq!(buf.cursor_addr, buf.cols() + 1);
        assert_eq!(buf.cell(buf.cols()).ec, b'Y');
        assert_ne!(buf.cell(last_col).gr & GR_WRAP, 0);
    }

    #[test]
    fn erase_in_display_clears_whole_screen() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"hello", &mut cb);
        nvt.process(&mut buf, b"\x1b[2J", &mut cb);
        for addr in 0..buf.size() {
            assert!(buf.cell(addr).is_blank());
        }
    }

    #[test]
    fn cursor_motion_csi_h_moves_absolute() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"\x1b[5;10H", &mut cb);
        assert_eq!(buf.cursor_addr, 4 * buf.cols() + 9);
    }

    #[test]
    fn wide_dbcs_character_occupies_two_cells() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        nvt.modes.wide = true;
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, "\u{3042}".as_bytes(), &mut cb);
        assert_eq!(buf.cell(0).db, DbcsState::Left);
        assert_eq!(buf.cell(1).db, DbcsState::Right);
        assert_eq!(buf.cursor_addr, 2);
    }

    #[test]
    fn sgr_reverse_sets_gr_bit() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"\x1b[7mZ", &mut cb);
        assert_eq!(buf.cell(0).gr & GR_REVERSE, GR_REVERSE);
    }

    #[test]
    fn scroll_region_confines_index() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"\x1b[1;5r", &mut cb);
        assert_eq!(nvt.scroll_top, 0);
        assert_eq!(nvt.scroll_bottom, 4);
        nvt.process(&mut buf, b"top", &mut cb);
        for _ in 0..10 {
            nvt.index(&mut buf, &mut cb);
        }
        assert!(buf.cell(5 * buf.cols()).is_blank());
    }

    #[test]
    fn save_restore_cursor_round_trips() {
        let mut buf = new_buf();
        let mut nvt = NvtProcessor::new(buf.cols());
        let mut cb = NullCallbacks;
        nvt.process(&mut buf, b"\x1b[3;4H\x1b7", &mut cb);
        nvt.process(&mut buf, b"\x1b[10;10H", &mut cb);
        nvt.process(&mut buf, b"\x1b8", &mut cb);
        assert_eq!(buf.cursor_addr, 2 * buf.cols() + 3);
    }
}
