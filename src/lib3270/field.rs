//! Field & Attribute Engine: scan-left field-attribute lookup, MDT
//! set/clear, and the DBCS left/right/dead/SB classifier.

use super::buffer::ScreenBuffer;
use super::cell::CS_DBCS;
use super::codes::{ATTR_DISPLAY, ATTR_MDT, ATTR_NUMERIC, ATTR_PROTECTED, ATTR_RESERVED, DISPLAY_HIDDEN, DISPLAY_INTENSIFIED, EBC_SI, EBC_SO};

/// A field-attribute byte, with the accessors x3270's `FA_*` macros
/// provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAttr(pub u8);

impl FieldAttr {
    pub fn is_protected(&self) -> bool {
        self.0 & ATTR_PROTECTED != 0
    }

    pub fn is_numeric(&self) -> bool {
        self.0 & ATTR_NUMERIC != 0
    }

    pub fn is_modified(&self) -> bool {
        self.0 & ATTR_MDT != 0
    }

    pub fn is_reserved(&self) -> bool {
        self.0 & ATTR_RESERVED != 0
    }

    pub fn display(&self) -> u8 {
        self.0 & ATTR_DISPLAY
    }

    pub fn is_hidden(&self) -> bool {
        self.display() == DISPLAY_HIDDEN
    }

    pub fn is_intensified(&self) -> bool {
        self.display() == DISPLAY_INTENSIFIED
    }

    pub fn set_modified(&mut self) {
        self.0 |= ATTR_MDT;
    }

    pub fn clear_modified(&mut self) {
        self.0 &= !ATTR_MDT;
    }
}

/// Scan backward with wrap from `baddr` for the governing field
/// attribute. Returns `None` when the screen is unformatted.
pub fn find_field_attribute(buf: &ScreenBuffer, baddr: usize) -> Option<usize> {
    if !buf.is_formatted() {
        return None;
    }
    let mut addr = baddr;
    loop {
        addr = buf.dec_ba(addr);
        if buf.cell(addr).is_fa() {
            return Some(addr);
        }
        if addr == baddr {
            return None;
        }
    }
}

/// Same scan, but the FA byte itself: the sentinel value when
/// unformatted.
pub fn get_field_attribute(buf: &ScreenBuffer, baddr: usize) -> u8 {
    match find_field_attribute(buf, baddr) {
        Some(addr) => buf.cell(addr).fa,
        None => buf.sentinel().fa,
    }
}

/// Like `find_field_attribute`, but gives up if the backward scan would
/// cross `bound` before finding an FA.
pub fn get_bounded_field_attribute(buf: &ScreenBuffer, baddr: usize, bound: usize) -> Option<u8> {
    if !buf.is_formatted() {
        return Some(buf.sentinel().fa);
    }
    let mut addr = baddr;
    loop {
        if addr == bound {
            return None;
        }
        addr = buf.dec_ba(addr);
        if buf.cell(addr).is_fa() {
            return Some(buf.cell(addr).fa);
        }
        if addr == baddr {
            return None;
        }
    }
}

/// Advance from `baddr0`, wrapping, to the first cell after an
/// unprotected FA whose following cell is not itself an FA. Returns 0 if
/// none exists.
pub fn next_unprotected(buf: &ScreenBuffer, baddr0: usize) -> usize {
    if !buf.is_formatted() {
        return 0;
    }
    let mut addr = baddr0;
    loop {
        addr = buf.inc_ba(addr);
        if buf.cell(addr).is_fa()
            && !FieldAttr(buf.cell(addr).fa).is_protected()
            && !buf.cell(buf.inc_ba(addr)).is_fa()
        {
            return buf.inc_ba(addr);
        }
        if addr == baddr0 {
            return 0;
        }
    }
}

/// Sets the MODIFY bit on the governing FA; when `modified_sel` is on,
/// also marks the whole screen dirty rather than just the FA cell.
pub fn mdt_set(buf: &mut ScreenBuffer, baddr: usize, modified_sel: bool) {
    if let Some(fa_addr) = find_field_attribute(buf, baddr) {
        let fa = buf.cell(fa_addr).fa;
        if fa & ATTR_MDT == 0 {
            buf.cell_mut(fa_addr).fa = fa | ATTR_MDT;
            buf.mark_dirty();
        }
    }
    if modified_sel {
        buf.mark_dirty();
    }
}

pub fn mdt_clear(buf: &mut ScreenBuffer, baddr: usize, modified_sel: bool) {
    if let Some(fa_addr) = find_field_attribute(buf, baddr) {
        let fa = buf.cell(fa_addr).fa;
        if fa & ATTR_MDT != 0 {
            buf.cell_mut(fa_addr).fa = fa & !ATTR_MDT;
            buf.mark_dirty();
        }
    }
    if modified_sel {
        buf.mark_dirty();
    }
}

/// Clears MDT on every FA on the screen (WCC reset-MDT), returning
/// whether any bit actually changed.
pub fn reset_all_mdt(buf: &mut ScreenBuffer) -> bool {
    let mut changed = false;
    for addr in 0..buf.size() {
        let cell = buf.cell(addr);
        if cell.is_fa() && cell.fa & ATTR_MDT != 0 {
            buf.cell_mut(addr).fa &= !ATTR_MDT;
            changed = true;
        }
    }
    if changed {
        buf.mark_dirty();
    }
    changed
}

/// Why a `lookleft_state` classification applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookleftReason {
    Field,
    Attribute,
    Subfield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    None,
}

/// Classifies `baddr` as the left or right half of a DBCS pair, per the
/// three-tier rule: governing field charset, then cell charset, then an
/// SO/SI subfield scan.
pub fn lookleft_state(buf: &ScreenBuffer, baddr: usize) -> (Side, Option<LookleftReason>) {
    let governing_fa = find_field_attribute(buf, baddr);
    if let Some(fa_addr) = governing_fa {
        if buf.cell(fa_addr).cs & super::cell::CS_MASK == CS_DBCS {
            let dist = distance(buf, fa_addr, baddr);
            let side = if dist % 2 == 1 { Side::Left } else { Side::Right };
            return (side, Some(LookleftReason::Field));
        }
    }

    if buf.cell(baddr).cs & super::cell::CS_MASK == CS_DBCS
        && buf.cell(baddr).ec != EBC_SO
        && buf.cell(baddr).ec != EBC_SI
    {
        let mut start = baddr;
        loop {
            let prev = buf.dec_ba(start);
            if buf.cell(prev).is_fa() {
                break;
            }
            if buf.cell(prev).cs & super::cell::CS_MASK != CS_DBCS {
                break;
            }
            if prev == baddr {
                break;
            }
            start = prev;
        }
        let dist = distance(buf, start, baddr);
        let side = if dist.is_multiple_of(2) { Side::Left } else { Side::Right };
        return (side, Some(LookleftReason::Attribute));
    }

    let mut addr = baddr;
    let mut pending_si = false;
    loop {
        let prev = buf.dec_ba(addr);
        if buf.cell(prev).is_fa() {
            return (Side::None, None);
        }
        if buf.cell(prev).ec == EBC_SI {
            pending_si = true;
        } else if buf.cell(prev).ec == EBC_SO && !pending_si {
            let dist = distance(buf, prev, baddr);
            let side = if dist % 2 == 1 { Side::Left } else { Side::Right };
            return (side, Some(LookleftReason::Subfield));
        } else if buf.cell(prev).ec == EBC_SO {
            pending_si = false;
        }
        addr = prev;
        if addr == baddr {
            return (Side::None, None);
        }
    }
}

fn distance(buf: &ScreenBuffer, from: usize, to: usize) -> usize {
    if to >= from {
        to - from
    } else {
        buf.size() - from + to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::buffer::ScreenSize;
    use crate::lib3270::codes::ATTR_FA_PRINTABLE;

    #[test]
    fn unformatted_has_no_field_attribute() {
        let buf = ScreenBuffer::new(ScreenSize::Model2);
        assert_eq!(find_field_attribute(&buf, 10), None);
        assert_eq!(get_field_attribute(&buf, 10), buf.sentinel().fa);
    }

    #[test]
    fn find_field_attribute_is_idempotent_across_field() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.add_fa(0, ATTR_FA_PRINTABLE);
        buf.add_char(1, b'A', 0);
        buf.add_char(2, b'B', 0);
        buf.add_char(3, b'C', 0);
        buf.add_fa(4, ATTR_FA_PRINTABLE | ATTR_PROTECTED);
        assert_eq!(find_field_attribute(&buf, 1), Some(0));
        assert_eq!(find_field_attribute(&buf, 2), Some(0));
        assert_eq!(find_field_attribute(&buf, 3), Some(0));
    }

    #[test]
    fn next_unprotected_skips_protected_field() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.add_fa(0, ATTR_FA_PRINTABLE);
        buf.add_char(1, b'A', 0);
        buf.add_char(2, b'B', 0);
        buf.add_char(3, b'C', 0);
        buf.add_fa(4, ATTR_FA_PRINTABLE | ATTR_PROTECTED);
        assert_eq!(next_unprotected(&buf, 4), 1);
    }

    #[test]
    fn mdt_set_and_clear() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.add_fa(0, ATTR_FA_PRINTABLE);
        mdt_set(&mut buf, 1, false);
        assert!(FieldAttr(buf.cell(0).fa).is_modified());
        mdt_clear(&mut buf, 1, false);
        assert!(!FieldAttr(buf.cell(0).fa).is_modified());
    }

    #[test]
    fn reset_all_mdt_clears_every_fa() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.add_fa(0, ATTR_FA_PRINTABLE);
        buf.add_fa(4, ATTR_FA_PRINTABLE);
        mdt_set(&mut buf, 1, false);
        mdt_set(&mut buf, 5, false);
        assert!(reset_all_mdt(&mut buf));
        assert!(!FieldAttr(buf.cell(0).fa).is_modified());
        assert!(!FieldAttr(buf.cell(4).fa).is_modified());
    }
}
