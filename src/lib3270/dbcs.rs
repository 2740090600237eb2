//! DBCS Post-Processor: walks the buffer after every 3270 write, every
//! NVT batch, and after scroll, classifying each cell's `db` state and
//! repairing or rejecting invalid sequences.

use super::buffer::ScreenBuffer;
use super::cell::{DbcsState, CS_DBCS, CS_MASK};
use super::codes::{EBC_SI, EBC_SO};
use super::error::DbcsError;

/// Runs one post-processing pass over the whole buffer. Returns the
/// first violation encountered, if any; the buffer is always left fully
/// tagged and normalized regardless.
pub fn postprocess(buf: &mut ScreenBuffer) -> Result<(), DbcsError> {
    let start = 0usize;

    let mut first_error: Option<DbcsError> = None;
    let mut record = |e: DbcsError| {
        if first_error.is_none() {
            first_error = Some(e);
        }
    };

    let mut in_so = false;
    let mut dbcs_field = false;
    let mut pending_left: Option<usize> = None;
    let mut pending_sb: bool = false;

    let n = buf.size();
    let mut addr = start;
    for _ in 0..n {
        let cell = *buf.cell(addr);

        if cell.is_fa() {
            if let Some(left) = pending_left.take() {
                buf.cell_mut(left).db = DbcsState::Dead;
            }
            in_so = false;
            pending_sb = false;
            dbcs_field = cell.cs & CS_MASK == CS_DBCS;
            buf.cell_mut(addr).db = DbcsState::None;
            addr = buf.inc_ba(addr);
            continue;
        }

        if pending_sb {
            buf.cell_mut(addr).db = DbcsState::Sb;
            pending_sb = false;
            addr = buf.inc_ba(addr);
            continue;
        }

        if dbcs_field {
            if pending_left.is_none() {
                buf.cell_mut(addr).db = DbcsState::Left;
                pending_left = Some(addr);
            } else {
                buf.cell_mut(addr).db = DbcsState::Right;
                pending_left = None;
            }
            addr = buf.inc_ba(addr);
            continue;
        }

        match cell.ec {
            EBC_SO => {
                if let Some(left) = pending_left.take() {
                    buf.cell_mut(left).db = DbcsState::Dead;
                }
                if in_so {
                    record(DbcsError::UnpairedSo { addr });
                }
                in_so = true;
                buf.cell_mut(addr).db = DbcsState::None;
            }
            EBC_SI => {
                if let Some(left) = pending_left.take() {
                    buf.cell_mut(left).db = DbcsState::Dead;
                }
                if !in_so {
                    record(DbcsError::UnpairedSi { addr });
                }
                in_so = false;
                buf.cell_mut(addr).db = DbcsState::None;
                pending_sb = true;
            }
            _ if in_so => {
                if buf.cell(addr).cs & CS_MASK != 0 {
                    let cs = buf.cell(addr).cs;
                    buf.cell_mut(addr).cs = cs & !CS_MASK;
                }
                if pending_left.is_none() {
                    buf.cell_mut(addr).db = DbcsState::Left;
                    pending_left = Some(addr);
                } else {
                    buf.cell_mut(addr).db = DbcsState::Right;
                    pending_left = None;
                }
            }
            _ if cell.cs & CS_MASK == CS_DBCS => {
                // reason=ATTRIBUTE: no governing DBCS field and no open SO
                // subfield, but the cell itself carries the DBCS charset.
                if pending_left.is_none() {
                    buf.cell_mut(addr).db = DbcsState::Left;
                    pending_left = Some(addr);
                } else {
                    buf.cell_mut(addr).db = DbcsState::Right;
                    pending_left = None;
                }
            }
            _ => {
                if let Some(left) = pending_left.take() {
                    buf.cell_mut(left).db = DbcsState::Dead;
                }
                buf.cell_mut(addr).db = DbcsState::None;
            }
        }
        addr = buf.inc_ba(addr);
    }

    if let Some(left) = pending_left.take() {
        buf.cell_mut(left).db = DbcsState::Dead;
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::buffer::ScreenSize;

    #[test]
    fn left_is_always_followed_by_right() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.cell_mut(0).cs = CS_DBCS;
        buf.cell_mut(0).ec = 0x41;
        buf.cell_mut(1).cs = CS_DBCS;
        buf.cell_mut(1).ec = 0x41;
        buf.cell_mut(2).cs = CS_DBCS;
        buf.cell_mut(2).ec = 0x41;
        postprocess(&mut buf).unwrap();
        for addr in 0..buf.size() {
            if buf.cell(addr).db == DbcsState::Left {
                let next = buf.cell((addr + 1) % buf.size()).db;
                assert!(matches!(next, DbcsState::Right | DbcsState::RightWrap));
            }
        }
    }

    #[test]
    fn lone_dbcs_char_becomes_dead() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.cell_mut(0).cs = CS_DBCS;
        buf.cell_mut(0).ec = 0x41;
        // cell 1 left as base/null, ending the run before pairing.
        postprocess(&mut buf).unwrap();
        assert_eq!(buf.cell(0).db, DbcsState::Dead);
    }

    #[test]
    fn unpaired_so_is_reported() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.cell_mut(0).ec = EBC_SO;
        buf.cell_mut(1).ec = EBC_SO;
        let err = postprocess(&mut buf).unwrap_err();
        assert_eq!(err, DbcsError::UnpairedSo { addr: 1 });
    }

    #[test]
    fn si_tags_following_cell_sb() {
        let mut buf = ScreenBuffer::new(ScreenSize::Model2);
        buf.cell_mut(0).ec = EBC_SO;
        buf.cell_mut(1).ec = EBC_SI;
        buf.cell_mut(2).ec = b'x';
        postprocess(&mut buf).unwrap();
        assert_eq!(buf.cell(2).db, DbcsState::Sb);
    }
}
