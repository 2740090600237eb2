//! Inbound Encoder: serializes Read-Buffer, Read-Modified(-All), and
//! snapshot streams into an outbound byte buffer.

use super::buffer::{addressing, ReplyMode, ScreenBuffer};
use super::codes::*;
use super::field::FieldAttr;

fn preamble(buf: &ScreenBuffer, aid: u8, out: &mut Vec<u8>) {
    out.push(aid);
    let enc = addressing::encode(buf.cursor_addr, buf.use_14bit());
    out.extend_from_slice(&enc);
}

fn is_short_aid(aid: u8) -> bool {
    matches!(aid, AID_PA1 | AID_PA2 | AID_PA3 | AID_CLEAR)
}

/// Emits SA deltas for the host-subscribed extended attributes of the
/// cell at `addr`, against the buffer's current defaults, only in
/// CHARACTER reply mode.
fn emit_sa_deltas(buf: &ScreenBuffer, addr: usize, out: &mut Vec<u8>) {
    if buf.reply_mode != ReplyMode::Character {
        return;
    }
    let cell = buf.cell(addr);
    for &ty in &buf.reply_attrs {
        let (val, default) = match ty {
            XA_HIGHLIGHTING => (cell.gr, buf.default_gr),
            XA_FOREGROUND => (cell.fg, buf.default_fg),
            XA_BACKGROUND => (cell.bg, buf.default_bg),
            XA_CHARSET => (cell.cs, buf.default_cs),
            XA_VALIDATION => (cell.ic, buf.default_ic),
            _ => continue,
        };
        if val != default {
            out.push(ORDER_SA);
            out.push(ty);
            out.push(val);
        }
    }
}

fn emit_data_cell(buf: &ScreenBuffer, addr: usize, out: &mut Vec<u8>) {
    emit_sa_deltas(buf, addr, out);
    let cell = buf.cell(addr);
    if cell.cs & super::cell::CS_GE != 0 {
        out.push(ORDER_GE);
    }
    out.push(cell.ec);
}

fn emit_fa_cell(buf: &ScreenBuffer, addr: usize, out: &mut Vec<u8>) {
    let cell = buf.cell(addr);
    match buf.reply_mode {
        ReplyMode::Field => {
            out.push(ORDER_SF);
            out.push(cell.fa);
        }
        ReplyMode::Extended | ReplyMode::Character => {
            let mut pairs: Vec<(u8, u8)> = vec![(XA_3270, cell.fa & ATTR_MASK)];
            if cell.gr != 0 {
                pairs.push((XA_HIGHLIGHTING, gr_to_highlight(cell.gr)));
            }
            if cell.fg != 0 {
                pairs.push((XA_FOREGROUND, cell.fg));
            }
            if cell.bg != 0 {
                pairs.push((XA_BACKGROUND, cell.bg));
            }
            out.push(ORDER_SFE);
            out.push(pairs.len() as u8);
            for (ty, val) in pairs {
                out.push(ty);
                out.push(val);
            }
        }
    }
}

fn gr_to_highlight(gr: u8) -> u8 {
    if gr & super::cell::GR_BLINK != 0 {
        HIGHLIGHT_BLINK
    } else if gr & super::cell::GR_REVERSE != 0 {
        HIGHLIGHT_REVERSE
    } else if gr & super::cell::GR_UNDERLINE != 0 {
        HIGHLIGHT_UNDERSCORE
    } else {
        HIGHLIGHT_NORMAL
    }
}

/// Walks every cell, emitting SF/SFE for field attributes and SA-deltas
/// plus a code byte for data cells.
pub fn read_buffer(buf: &ScreenBuffer, aid: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.size() * 2);
    preamble(buf, aid, &mut out);
    for addr in 0..buf.size() {
        if buf.cell(addr).is_fa() {
            emit_fa_cell(buf, addr, &mut out);
        } else {
            emit_data_cell(buf, addr, &mut out);
        }
    }
    out
}

/// Emits only modified fields (or every field when `all`), each preceded
/// by an SBA to its first data cell.
pub fn read_modified(buf: &ScreenBuffer, aid: u8, all: bool) -> Vec<u8> {
    let mut out = Vec::new();
    preamble(buf, aid, &mut out);

    if is_short_aid(aid) {
        return out;
    }
    if !buf.is_formatted() {
        return out;
    }

    let size = buf.size();
    let mut addr = 0usize;
    for _ in 0..size {
        if buf.cell(addr).is_fa() {
            let fa = FieldAttr(buf.cell(addr).fa);
            if all || fa.is_modified() {
                let first = buf.inc_ba(addr);
                out.push(ORDER_SBA);
                let enc = addressing::encode(first, buf.use_14bit());
                out.extend_from_slice(&enc);
                let mut cur = first;
                while cur != addr && !buf.cell(cur).is_fa() {
                    if buf.cell(cur).ec != 0 {
                        emit_data_cell(buf, cur, &mut out);
                    }
                    cur = buf.inc_ba(cur);
                }
            }
        }
        addr = buf.inc_ba(addr);
    }
    out
}

/// Reconstructs a minimal byte stream that, replayed through
/// `process_ds`, reproduces the buffer's contents, attributes, and
/// cursor.
pub fn snapshot(buf: &ScreenBuffer) -> Vec<u8> {
    let mut out = vec![CMD_ERASE_WRITE, WCC_RESET];
    for addr in 0..buf.size() {
        if buf.cell(addr).is_fa() {
            out.push(ORDER_SF);
            out.push(buf.cell(addr).fa);
        } else if !buf.cell(addr).is_blank() {
            out.push(ORDER_SBA);
            let enc = addressing::encode(addr, buf.use_14bit());
            out.extend_from_slice(&enc);
            emit_data_cell(buf, addr, &mut out);
        }
    }
    out.push(ORDER_SBA);
    let enc = addressing::encode(buf.cursor_addr, buf.use_14bit());
    out.extend_from_slice(&enc);
    out.push(ORDER_IC);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::buffer::ScreenSize;
    use crate::lib3270::order_decoder::process_ds;
    use crate::lib3270::config::CoreConfig;

    #[test]
    fn read_modified_after_scenario_2() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        let cfg = CoreConfig::default();
        // fa=0x41: unprotected, MDT set. fa=0x60: protected, MDT clear.
        let data = [
            0xF1, 0xC3, 0x1D, 0x41, 0xC1, 0xC2, 0xC3, 0x1D, 0x60, 0xC4, 0xC5,
        ];
        process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        let out = read_modified(&buf, AID_ENTER, false);
        assert_eq!(out[0], AID_ENTER);
        assert!(out.contains(&ORDER_SBA));
        assert!(out.windows(3).any(|w| w == [0xC1, 0xC2, 0xC3]));
        assert!(!out.windows(2).any(|w| w == [0xC4, 0xC5]));
    }

    #[test]
    fn short_aid_emits_only_aid_and_cursor() {
        let buf = ScreenBuffer::new(ScreenSize::Model2);
        let out = read_modified(&buf, AID_CLEAR, false);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], AID_CLEAR);
    }
}
