//! Buffer Model: the primary/alternate screen buffers, cursor and
//! buffer-address arithmetic, and 12-bit/14-bit address codec.

use super::cell::Cell;

/// Screen geometry. `Model2` is the 24x80 default; the others are the
/// alternate sizes a host may select via Erase/Write Alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSize {
    Model2,
    Model3,
    Model4,
    Model5,
}

impl ScreenSize {
    pub fn rows(&self) -> usize {
        match self {
            ScreenSize::Model2 => 24,
            ScreenSize::Model3 => 32,
            ScreenSize::Model4 => 43,
            ScreenSize::Model5 => 27,
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            ScreenSize::Model5 => 132,
            _ => 80,
        }
    }

    pub fn cells(&self) -> usize {
        self.rows() * self.cols()
    }
}

/// Translates between a linear buffer address and the 12-bit/14-bit wire
/// encoding used by SBA/RA and by the Read-Buffer/Read-Modified replies.
///
/// The 64-entry table is the EBCDIC-safe byte x3270 uses for each 6-bit
/// value; its defining property is that `byte & 0x3F` recovers the
/// original value, which lets decoding stay a plain mask while encoding
/// must go through the table.
pub mod addressing {
    const CODE_TABLE: [u8; 64] = [
        0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E,
        0x4F, 0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D,
        0x5E, 0x5F, 0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0x6A, 0x6B, 0x6C,
        0x6D, 0x6E, 0x6F, 0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B,
        0x7C, 0x7D, 0x7E, 0x7F,
    ];

    /// Decode an SBA/RA/EUA address pair. Whether the pair is 12-bit or
    /// 14-bit is self-describing: the top two bits of `c1` are `00` for
    /// 14-bit, `01` or `11` for 12-bit.
    pub fn decode(c1: u8, c2: u8) -> usize {
        if c1 & 0xC0 == 0x00 {
            (((c1 & 0x3F) as usize) << 8) | c2 as usize
        } else {
            (((c1 & 0x3F) as usize) << 6) | (c2 & 0x3F) as usize
        }
    }

    /// Encode an address for outbound replies. The mode is selected by
    /// the active screen's total cell count, not per call.
    pub fn encode(addr: usize, use_14bit: bool) -> [u8; 2] {
        if use_14bit {
            [((addr >> 8) & 0x3F) as u8, (addr & 0xFF) as u8]
        } else {
            [CODE_TABLE[(addr >> 6) & 0x3F], CODE_TABLE[addr & 0x3F]]
        }
    }

    /// Whether 14-bit addressing applies to a screen of `cells` cells.
    pub fn use_14bit_for(cells: usize) -> bool {
        cells > 4096
    }
}

/// One screen's worth of cells plus the address registers and default
/// attribute state that travel with it.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    cells: Vec<Cell>,
    sentinel: Cell,
    rows: usize,
    cols: usize,
    pub cursor_addr: usize,
    pub buffer_addr: usize,
    pub default_fg: u8,
    pub default_bg: u8,
    pub default_gr: u8,
    pub default_cs: u8,
    pub default_ic: u8,
    pub reply_mode: ReplyMode,
    pub reply_attrs: Vec<u8>,
    dirty: bool,
    formatted: bool,
}

/// Which attributes Read-Buffer/Read-Modified emit for a non-FA cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    #[default]
    Field,
    Extended,
    Character,
}

impl ScreenBuffer {
    pub fn new(size: ScreenSize) -> Self {
        let rows = size.rows();
        let cols = size.cols();
        let mut sentinel = Cell::default();
        sentinel.fa = super::codes::ATTR_FA_PRINTABLE | super::codes::ATTR_MDT;
        ScreenBuffer {
            cells: vec![Cell::default(); rows * cols],
            sentinel,
            rows,
            cols,
            cursor_addr: 0,
            buffer_addr: 0,
            default_fg: 0,
            default_bg: 0,
            default_gr: 0,
            default_cs: 0,
            default_ic: 0,
            reply_mode: ReplyMode::Field,
            reply_attrs: Vec::new(),
            dirty: false,
            formatted: false,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn use_14bit(&self) -> bool {
        addressing::use_14bit_for(self.size())
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn sentinel(&self) -> &Cell {
        &self.sentinel
    }

    pub fn sentinel_mut(&mut self) -> &mut Cell {
        &mut self.sentinel
    }

    pub fn cell(&self, addr: usize) -> &Cell {
        &self.cells[addr % self.size()]
    }

    pub fn cell_mut(&mut self, addr: usize) -> &mut Cell {
        let n = self.size();
        &mut self.cells[addr % n]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn inc_ba(&self, addr: usize) -> usize {
        (addr + 1) % self.size()
    }

    pub fn dec_ba(&self, addr: usize) -> usize {
        if addr == 0 {
            self.size() - 1
        } else {
            addr - 1
        }
    }

    /// Set a data character, applying the current defaults and marking
    /// the cell dirty on change.
    pub fn add_char(&mut self, addr: usize, ec: u8, cs: u8) {
        let (fg, bg, gr, ic) = (self.default_fg, self.default_bg, self.default_gr, self.default_ic);
        let cell = self.cell_mut(addr);
        let changed = cell.ec != ec || cell.cs != cs || cell.fg != fg || cell.bg != bg || cell.gr != gr;
        cell.fa = 0;
        cell.ec = ec;
        cell.ucs4 = 0;
        cell.cs = cs;
        cell.fg = fg;
        cell.bg = bg;
        cell.gr = gr;
        cell.ic = ic;
        if changed {
            self.dirty = true;
        }
    }

    /// Turn a cell into a field attribute, resetting cs/fg/bg/gr/ic and
    /// marking the screen formatted.
    pub fn add_fa(&mut self, addr: usize, fa: u8) {
        self.cell_mut(addr).start_field(fa | super::codes::ATTR_FA_PRINTABLE);
        self.formatted = true;
        self.dirty = true;
    }

    pub fn add_fg(&mut self, addr: usize, v: u8) {
        let cell = self.cell_mut(addr);
        if cell.fg != v {
            cell.fg = v;
            self.dirty = true;
        }
    }

    pub fn add_bg(&mut self, addr: usize, v: u8) {
        let cell = self.cell_mut(addr);
        if cell.bg != v {
            cell.bg = v;
            self.dirty = true;
        }
    }

    pub fn add_gr(&mut self, addr: usize, v: u8) {
        let cell = self.cell_mut(addr);
        if cell.gr != v {
            cell.gr = v;
            self.dirty = true;
        }
    }

    pub fn add_cs(&mut self, addr: usize, v: u8) {
        let cell = self.cell_mut(addr);
        if cell.cs != v {
            cell.cs = v;
            self.dirty = true;
        }
    }

    pub fn add_ic(&mut self, addr: usize, v: u8) {
        let cell = self.cell_mut(addr);
        if cell.ic != v {
            cell.ic = v;
            self.dirty = true;
        }
    }

    /// Clear every cell and the default SA attributes; does not change
    /// dimensions. Used by Erase-Write/EWA.
    pub fn clear(&mut self) {
        for c in self.cells.iter_mut() {
            *c = Cell::default();
        }
        self.default_fg = 0;
        self.default_bg = 0;
        self.default_gr = 0;
        self.default_cs = 0;
        self.default_ic = 0;
        self.cursor_addr = 0;
        self.buffer_addr = 0;
        self.formatted = false;
        self.dirty = true;
    }

    /// Resize the active area, clearing it. Idempotent when the
    /// dimensions already match.
    pub fn erase_resize(&mut self, size: ScreenSize) {
        let rows = size.rows();
        let cols = size.cols();
        if rows == self.rows && cols == self.cols {
            self.clear();
            return;
        }
        self.rows = rows;
        self.cols = cols;
        self.cells = vec![Cell::default(); rows * cols];
        self.default_fg = 0;
        self.default_bg = 0;
        self.default_gr = 0;
        self.default_cs = 0;
        self.default_ic = 0;
        self.cursor_addr = 0;
        self.buffer_addr = 0;
        self.formatted = false;
        self.dirty = true;
    }

    /// Clear only unprotected cells to EBC_null, per governing FA. Used by
    /// Erase-All-Unprotected and by EUA's order handler (which bounds the
    /// range instead of doing the whole screen).
    pub fn erase_unprotected_range(&mut self, from: usize, to_exclusive: usize) {
        let mut addr = from;
        let mut current_fa = self.sentinel.fa;
        loop {
            if addr == to_exclusive {
                break;
            }
            if self.cell(addr).is_fa() {
                current_fa = self.cell(addr).fa;
            } else if current_fa & super::codes::ATTR_PROTECTED == 0 {
                self.cell_mut(addr).clear_data();
                self.dirty = true;
            }
            addr = self.inc_ba(addr);
        }
    }

    pub fn set_cursor(&mut self, addr: usize) {
        self.cursor_addr = addr % self.size();
    }

    pub fn get_row(&self, row: usize) -> &[Cell] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip_12bit() {
        for addr in 0..(24 * 80) {
            let enc = addressing::encode(addr, false);
            let dec = addressing::decode(enc[0], enc[1]);
            assert_eq!(dec, addr, "addr {addr} round-trip failed");
        }
    }

    #[test]
    fn address_round_trip_14bit() {
        for addr in [0usize, 1, 4095, 4096, 4097, 0x3FFF] {
            let enc = addressing::encode(addr, true);
            let dec = addressing::decode(enc[0], enc[1]);
            assert_eq!(dec, addr);
        }
    }

    #[test]
    fn use_14bit_threshold() {
        assert!(!addressing::use_14bit_for(24 * 80));
        assert!(!addressing::use_14bit_for(4096));
        assert!(addressing::use_14bit_for(4097));
        assert!(!addressing::use_14bit_for(32 * 80));
    }

    #[test]
    fn sba_to_last_cell_succeeds() {
        let buf = ScreenBuffer::new(ScreenSize::Model2);
        assert_eq!(buf.size() - 1, 24 * 80 - 1);
    }

    #[test]
    fn wrap_increment_decrement() {
        let buf = ScreenBuffer::new(ScreenSize::Model2);
        let last = buf.size() - 1;
        assert_eq!(buf.inc_ba(last), 0);
        assert_eq!(buf.dec_ba(0), last);
    }
}
