//! 3270 Order Decoder: `process_ds` and the byte-at-a-time order loop
//! that interprets a Write-family command stream against the Buffer
//! Model and Field Engine.

use super::buffer::{addressing, ReplyMode, ScreenBuffer, ScreenSize};
use super::cell::{CS_BASE, CS_DBCS, CS_GE, CS_MASK};
use super::codes::*;
use super::config::CoreConfig;
use super::dbcs;
use super::error::{DbcsError, ProtocolError};
use super::field::{self, FieldAttr, Side};

/// Outcome of a command that the controller must act on: AID/keyboard
/// state and the deferred cursor move from IC are not owned by the
/// buffer itself. `dbcs_error` carries the first validation failure the
/// post-processing pass recorded, if any; the buffer is still normalized
/// and usable even when this is set.
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub sound_alarm: bool,
    pub keyboard_restore: bool,
    pub ic_addr: Option<usize>,
    pub dbcs_error: Option<DbcsError>,
}

/// Top-level command dispatch, mirroring x3270's `process_ds`.
/// `default_size`/`alternate_size` are the geometries Erase-Write and
/// Erase-Write-Alternate resize the buffer to, respectively.
pub fn process_ds(
    buf: &mut ScreenBuffer,
    cfg: &CoreConfig,
    data: &[u8],
    default_size: ScreenSize,
    alternate_size: ScreenSize,
) -> Result<WriteOutcome, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::bad_cmd("empty command"));
    }
    match CommandCode::from_u8(data[0]) {
        Some(CommandCode::EraseAllUnprotected) => {
            buf.erase_unprotected_range(0, 0);
            let dbcs_error = dbcs::postprocess(buf).err();
            Ok(WriteOutcome { keyboard_restore: true, dbcs_error, ..Default::default() })
        }
        Some(CommandCode::EraseWrite) => {
            buf.erase_resize(default_size);
            write(buf, cfg, data, true)
        }
        Some(CommandCode::EraseWriteAlternate) => {
            buf.erase_resize(alternate_size);
            write(buf, cfg, data, true)
        }
        Some(CommandCode::Write) => write(buf, cfg, data, false),
        Some(CommandCode::ReadBuffer)
        | Some(CommandCode::ReadModified)
        | Some(CommandCode::ReadModifiedAll) => Ok(WriteOutcome::default()),
        Some(CommandCode::WriteStructuredField) => Ok(WriteOutcome::default()),
        Some(CommandCode::Nop) => Ok(WriteOutcome::default()),
        None => Err(ProtocolError::bad_cmd(format!("unrecognized command byte 0x{:02X}", data[0]))),
    }
}

/// The Write/Erase-Write/EWA order loop.
fn write(buf: &mut ScreenBuffer, cfg: &CoreConfig, data: &[u8], erase: bool) -> Result<WriteOutcome, ProtocolError> {
    if data.len() < 2 {
        return Err(ProtocolError::bad_cmd("write command missing WCC"));
    }
    let wcc = data[1];
    let mut outcome = WriteOutcome::default();

    if wcc & WCC_RESET != 0 {
        buf.default_fg = 0;
        buf.default_bg = 0;
        buf.default_gr = 0;
        buf.default_cs = 0;
        buf.default_ic = 0;
        if erase {
            buf.reply_mode = ReplyMode::Field;
            buf.reply_attrs.clear();
        }
    }
    if wcc & WCC_ALARM != 0 {
        outcome.sound_alarm = true;
    }
    if wcc & WCC_RESTORE != 0 {
        outcome.keyboard_restore = true;
    }
    if wcc & WCC_RESET_MDT != 0 {
        field::reset_all_mdt(buf);
    }

    buf.buffer_addr = buf.cursor_addr;

    let body = &data[2..];
    let mut pos = 0usize;
    let mut last_was_order = true;
    let mut last_zpt_ended_at_zero = false;

    let result = (|| -> Result<(), ProtocolError> {
        while pos < body.len() {
            let b = body[pos];
            pos += 1;
            if let Some(order) = OrderCode::from_u8(b) {
                last_was_order = true;
                match order {
                    OrderCode::StartField => {
                        let fa = take(body, &mut pos)?;
                        buf.add_fa(buf.buffer_addr, fa);
                        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                    }
                    OrderCode::StartFieldExtended => {
                        process_sfe(buf, cfg, body, &mut pos)?;
                    }
                    OrderCode::SetBufferAddress => {
                        let a1 = take(body, &mut pos)?;
                        let a2 = take(body, &mut pos)?;
                        let addr = addressing::decode(a1, a2);
                        if addr >= buf.size() {
                            return Err(ProtocolError::bad_addr(format!("SBA address {addr} out of range")));
                        }
                        buf.buffer_addr = addr;
                    }
                    OrderCode::InsertCursor => {
                        outcome.ic_addr = Some(buf.buffer_addr);
                    }
                    OrderCode::ProgramTab => {
                        process_pt(buf, &mut last_zpt_ended_at_zero, last_was_order);
                    }
                    OrderCode::RepeatToAddress => {
                        process_ra(buf, cfg, body, &mut pos)?;
                    }
                    OrderCode::EraseUnprotectedToAddress => {
                        process_eua(buf, body, &mut pos)?;
                    }
                    OrderCode::GraphicEscape => {
                        let c = take(body, &mut pos)?;
                        write_cell(buf, buf.buffer_addr, c, CS_GE);
                        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                    }
                    OrderCode::ModifyField => {
                        process_mf(buf, cfg, body, &mut pos)?;
                    }
                    OrderCode::SetAttribute => {
                        process_sa(buf, cfg, body, &mut pos)?;
                    }
                }
                continue;
            }

            last_was_order = false;
            match b {
                EBC_SUB | EBC_DUP | EBC_FM | EBC_FF | EBC_CR | EBC_NL | EBC_EM | EBC_LF | EBC_EO => {
                    write_cell(buf, buf.buffer_addr, b, buf.default_cs);
                    buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                }
                EBC_SO => {
                    write_cell(buf, buf.buffer_addr, b, buf.default_cs);
                    buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                }
                EBC_SI => {
                    write_cell(buf, buf.buffer_addr, b, buf.default_cs);
                    buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                }
                EBC_NULL => {
                    if cfg.dbcs {
                        let _second = take(body, &mut pos)?;
                    }
                    write_cell(buf, buf.buffer_addr, 0, buf.default_cs);
                    buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                }
                _ if b < 0x40 => {
                    // Unrecognized control byte: traced and skipped.
                }
                _ => {
                    if cfg.dbcs {
                        let second = take(body, &mut pos)?;
                        write_cell(buf, buf.buffer_addr, b, CS_DBCS);
                        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                        write_cell(buf, buf.buffer_addr, second, CS_DBCS);
                        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                    } else {
                        write_cell(buf, buf.buffer_addr, b, buf.default_cs);
                        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
                    }
                }
            }
        }
        Ok(())
    })();

    if let Some(addr) = outcome.ic_addr {
        buf.set_cursor(addr);
    }
    outcome.dbcs_error = dbcs::postprocess(buf).err();

    result.map(|_| outcome)
}

fn take(body: &[u8], pos: &mut usize) -> Result<u8, ProtocolError> {
    if *pos >= body.len() {
        return Err(ProtocolError::bad_addr("order truncated"));
    }
    let b = body[*pos];
    *pos += 1;
    Ok(b)
}

fn write_cell(buf: &mut ScreenBuffer, addr: usize, ec: u8, cs: u8) {
    buf.add_char(addr, ec, cs);
}

fn process_sfe(buf: &mut ScreenBuffer, cfg: &CoreConfig, body: &[u8], pos: &mut usize) -> Result<(), ProtocolError> {
    let n = take(body, pos)?;
    let addr = buf.buffer_addr;
    let mut fa: u8 = ATTR_FA_PRINTABLE;
    let mut pairs: Vec<(u8, u8)> = Vec::new();
    for _ in 0..n {
        let ty = take(body, pos)?;
        let val = take(body, pos)?;
        if ty == XA_3270 {
            fa = val | ATTR_FA_PRINTABLE;
        } else {
            pairs.push((ty, val));
        }
    }
    // The FA must be established first: `add_fa` resets the cell's
    // extended attributes, which would otherwise wipe out any of the
    // pairs below if it ran after them.
    buf.add_fa(addr, fa);
    for (ty, val) in pairs {
        match ty {
            XA_HIGHLIGHTING => buf.add_gr(addr, highlight_to_gr(val)),
            XA_FOREGROUND
                if cfg.color_display => {
                    buf.add_fg(addr, val);
                }
            XA_BACKGROUND
                if cfg.color_display => {
                    buf.add_bg(addr, val);
                }
            XA_CHARSET => {
                let cs = match val {
                    0xF1 => super::cell::CS_APL,
                    0xF8 => CS_DBCS,
                    _ => CS_BASE,
                };
                buf.add_cs(addr, cs);
            }
            XA_VALIDATION => buf.add_ic(addr, val),
            _ => {
                // Unknown SFE pair type: traced and skipped.
            }
        }
    }
    buf.buffer_addr = buf.inc_ba(addr);
    Ok(())
}

fn highlight_to_gr(val: u8) -> u8 {
    match val {
        HIGHLIGHT_BLINK => super::cell::GR_BLINK,
        HIGHLIGHT_REVERSE => super::cell::GR_REVERSE,
        HIGHLIGHT_UNDERSCORE => super::cell::GR_UNDERLINE,
        _ => 0,
    }
}

fn process_pt(buf: &mut ScreenBuffer, last_zpt_ended_at_zero: &mut bool, prev_was_order: bool) {
    let cur = buf.cell(buf.buffer_addr);
    if cur.is_fa() && !FieldAttr(cur.fa).is_protected() {
        buf.buffer_addr = buf.inc_ba(buf.buffer_addr);
        *last_zpt_ended_at_zero = false;
        return;
    }
    let start = buf.buffer_addr;
    let mut target = field::next_unprotected(buf, buf.buffer_addr);
    if target < start {
        // wrapped past the end without landing past start; treat 0 specially per spec.
        target = if target == 0 { 0 } else { target };
    }

    let should_fill = !prev_was_order || *last_zpt_ended_at_zero;
    if should_fill {
        let mut addr = start;
        while addr != target && !buf.cell(addr).is_fa() {
            buf.cell_mut(addr).clear_data();
            buf.mark_dirty();
            addr = buf.inc_ba(addr);
        }
        *last_zpt_ended_at_zero = target == 0;
    } else {
        *last_zpt_ended_at_zero = false;
    }
    buf.buffer_addr = target;
}

fn process_ra(buf: &mut ScreenBuffer, cfg: &CoreConfig, body: &[u8], pos: &mut usize) -> Result<(), ProtocolError> {
    let a1 = take(body, pos)?;
    let a2 = take(body, pos)?;
    let target = addressing::decode(a1, a2);
    if target >= buf.size() {
        return Err(ProtocolError::bad_addr(format!("RA address {target} out of range")));
    }

    let (side, _) = field::lookleft_state(buf, buf.buffer_addr);
    if side == Side::Right {
        return Err(ProtocolError::bad_addr("RA starting on a DBCS right half"));
    }

    let mut ge_prefix = false;
    let mut c1 = take(body, pos)?;
    if c1 == ORDER_GE {
        ge_prefix = true;
        c1 = take(body, pos)?;
    }

    let dbcs_mode = cfg.dbcs && {
        let governing = field::find_field_attribute(buf, buf.buffer_addr);
        governing.map(|a| buf.cell(a).cs & CS_MASK == CS_DBCS).unwrap_or(false)
    };

    if dbcs_mode {
        let span = if target >= buf.buffer_addr { target - buf.buffer_addr } else { buf.size() - buf.buffer_addr + target };
        if span % 2 != 0 {
            return Err(super::error::DbcsError::OddLengthRepeatToAddress.into_protocol());
        }
        let c2 = take(body, pos)?;
        if c1 == EBC_NULL {
            if !matches!(c2, EBC_NULL | EBC_NL | EBC_EM | EBC_FF | EBC_CR | EBC_DUP | EBC_FM) {
                return Err(super::error::DbcsError::InvalidDbcsControlCharacter { byte: c2 }.into_protocol());
            }
        } else if !(0x40..=0xFE).contains(&c1) || !(0x40..=0xFE).contains(&c2) {
            return Err(super::error::DbcsError::InvalidDbcsCharacter { byte: c1 }.into_protocol());
        }
        let mut addr = buf.buffer_addr;
        while addr != target {
            write_cell(buf, addr, c1, CS_DBCS);
            addr = buf.inc_ba(addr);
            write_cell(buf, addr, c2, CS_DBCS);
            addr = buf.inc_ba(addr);
        }
    } else {
        let cs = if ge_prefix { CS_GE } else { buf.default_cs };
        let mut addr = buf.buffer_addr;
        while addr != target {
            write_cell(buf, addr, c1, cs);
            addr = buf.inc_ba(addr);
        }
    }
    buf.buffer_addr = target;
    Ok(())
}

fn process_eua(buf: &mut ScreenBuffer, body: &[u8], pos: &mut usize) -> Result<(), ProtocolError> {
    let a1 = take(body, pos)?;
    let a2 = take(body, pos)?;
    let target = addressing::decode(a1, a2);
    if target >= buf.size() {
        return Err(ProtocolError::bad_addr(format!("EUA address {target} out of range")));
    }
    if field::lookleft_state(buf, buf.buffer_addr).0 == Side::Right {
        return Err(ProtocolError::bad_addr("EUA overwriting right half"));
    }
    if field::lookleft_state(buf, target).0 == Side::Left {
        return Err(ProtocolError::bad_addr("EUA overwriting left half"));
    }
    buf.erase_unprotected_range(buf.buffer_addr, target);
    buf.buffer_addr = target;
    Ok(())
}

fn process_mf(buf: &mut ScreenBuffer, cfg: &CoreConfig, body: &[u8], pos: &mut usize) -> Result<(), ProtocolError> {
    let n = take(body, pos)?;
    let addr = buf.buffer_addr;
    let is_fa = buf.cell(addr).is_fa();
    let mut new_fa: Option<u8> = None;
    let mut pairs: Vec<(u8, u8)> = Vec::new();
    for _ in 0..n {
        let ty = take(body, pos)?;
        let val = take(body, pos)?;
        if !is_fa {
            continue;
        }
        if ty == XA_3270 {
            new_fa = Some(val | ATTR_FA_PRINTABLE);
        } else {
            pairs.push((ty, val));
        }
    }
    if !is_fa {
        return Ok(());
    }
    // Applying a new FA resets the cell's extended attributes, so it
    // must happen before the other pairs in this same order are applied.
    if let Some(fa) = new_fa {
        buf.add_fa(addr, fa);
    }
    for (ty, val) in pairs {
        match ty {
            XA_HIGHLIGHTING => buf.add_gr(addr, highlight_to_gr(val)),
            XA_FOREGROUND
                if cfg.color_display => {
                    buf.add_fg(addr, val);
                }
            XA_BACKGROUND
                if cfg.color_display => {
                    buf.add_bg(addr, val);
                }
            _ => {}
        }
    }
    Ok(())
}

fn process_sa(buf: &mut ScreenBuffer, cfg: &CoreConfig, body: &[u8], pos: &mut usize) -> Result<(), ProtocolError> {
    let ty = take(body, pos)?;
    let val = take(body, pos)?;
    match ty {
        XA_ALL => {
            buf.default_fg = 0;
            buf.default_bg = 0;
            buf.default_gr = 0;
            buf.default_cs = 0;
            buf.default_ic = 0;
        }
        XA_HIGHLIGHTING => buf.default_gr = highlight_to_gr(val),
        XA_FOREGROUND
            if cfg.color_display => {
                buf.default_fg = val;
            }
        XA_BACKGROUND
            if cfg.color_display => {
                buf.default_bg = val;
            }
        XA_CHARSET => {
            buf.default_cs = match val {
                0xF1 => super::cell::CS_APL,
                0xF8 => CS_DBCS,
                _ => CS_BASE,
            }
        }
        XA_VALIDATION => buf.default_ic = val,
        _ => {}
    }
    Ok(())
}

impl super::error::DbcsError {
    fn into_protocol(self) -> ProtocolError {
        ProtocolError::bad_addr(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::buffer::ScreenSize;

    fn new_buf() -> ScreenBuffer {
        ScreenBuffer::new(ScreenSize::Model2)
    }

    #[test]
    fn scenario_1_ew_sba_write_ic() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [0xF5, 0xC3, 0x11, 0x40, 0x40, 0xC8, 0xC9, 0x13];
        let outcome = process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert_eq!(buf.cell(0).ec, 0xC8);
        assert_eq!(buf.cell(1).ec, 0xC9);
        // IC lands after "HI" in this byte stream, so it captures
        // buffer_addr as it stands post-write, not the SBA target.
        assert_eq!(outcome.ic_addr, Some(2));
        assert_eq!(buf.cursor_addr, 2);
        assert!(outcome.keyboard_restore);
    }

    #[test]
    fn scenario_2_two_fields() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [
            0xF1, 0xC3, 0x1D, 0xF0, 0xC1, 0xC2, 0xC3, 0x1D, 0x60, 0xC4, 0xC5,
        ];
        process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert!(buf.cell(0).is_fa());
        assert_eq!(buf.cell(1).ec, 0xC1);
        assert_eq!(buf.cell(2).ec, 0xC2);
        assert_eq!(buf.cell(3).ec, 0xC3);
        assert!(buf.cell(4).is_fa());
        assert_eq!(buf.cell(5).ec, 0xC4);
        assert_eq!(buf.cell(6).ec, 0xC5);
        assert_eq!(field::find_field_attribute(&buf, 2), Some(0));
        // Both FA bytes here (0xF0, 0x60) have the protect bit (0x20) set,
        // so neither field is unprotected and the scan wraps to nothing.
        assert_eq!(field::next_unprotected(&buf, 4), 0);
    }

    #[test]
    fn scenario_3_repeat_to_address() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [0xF5, 0xC2, 0x3C, 0x40, 0x42, 0x5C];
        process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert_eq!(buf.cell(0).ec, 0x5C);
        assert_eq!(buf.cell(1).ec, 0x5C);
        assert_eq!(buf.cell(2).ec, 0);
    }

    #[test]
    fn sba_past_end_aborts() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let sz = buf.size();
        let addr = sz; // one past the end: invalid.
        let enc = addressing::encode(addr, buf.use_14bit());
        let data = [0xF1, 0x00, 0x11, enc[0], enc[1]];
        let err = process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap_err();
        assert_eq!(err.outcome, super::super::error::Pds::BadAddr);
    }

    #[test]
    fn wcc_reset_mdt_clears_every_fa() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [0xF1, 0x00, 0x1D, 0xF1, b'A'];
        process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert!(FieldAttr(buf.cell(0).fa).is_modified());
        let data2 = [0xF1, WCC_RESET_MDT];
        process_ds(&mut buf, &cfg, &data2, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert!(!FieldAttr(buf.cell(0).fa).is_modified());
    }

    #[test]
    fn nop_is_a_no_op() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [CMD_NOP];
        let outcome = process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model2).unwrap();
        assert!(!outcome.sound_alarm);
        assert!(!outcome.keyboard_restore);
        assert_eq!(buf.cell(0).ec, 0);
    }

    #[test]
    fn erase_write_alternate_resizes_to_the_alternate_geometry() {
        let mut buf = new_buf();
        let cfg = CoreConfig::default();
        let data = [0x7E, 0x00];
        process_ds(&mut buf, &cfg, &data, ScreenSize::Model2, ScreenSize::Model4).unwrap();
        assert_eq!(buf.rows(), ScreenSize::Model4.rows());
        assert_eq!(buf.cols(), ScreenSize::Model4.cols());
    }
}
