//! The single value that owns both buffers, the AID/keyboard-lock
//! registers, and the NVT processor, and routes inbound host bytes to
//! whichever of the 3270 Order Decoder or the NVT Processor is active.
//! Both decoders mutate the same `ScreenBuffer`, so toggling NVT mode on
//! a live connection never requires copying cells between two worlds.

use super::buffer::{ScreenBuffer, ScreenSize};
use super::callbacks::Callbacks;
use super::codes::AID_NO_AID;
use super::config::CoreConfig;
use super::error::ProtocolError;
use super::inbound;
use super::order_decoder::{self, WriteOutcome};
use crate::nvt::NvtProcessor;

/// Which buffer the controller is currently rendering and decoding
/// into. 3270 hosts can switch to an alternate (larger) screen via
/// Erase/Write Alternate; the primary buffer is restored on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveBuffer {
    Primary,
    Alternate,
}

/// Ties the Buffer Model, Field & Attribute Engine, 3270 Order Decoder,
/// Inbound Encoder, DBCS Post-Processor, and NVT Processor together
/// behind one owning value.
pub struct Controller {
    primary: ScreenBuffer,
    alternate: ScreenBuffer,
    active: ActiveBuffer,
    default_size: ScreenSize,
    alternate_size: ScreenSize,
    pub config: CoreConfig,
    pub aid: u8,
    pub keyboard_locked: bool,
    nvt: NvtProcessor,
    nvt_mode: bool,
}

impl Controller {
    /// `size` is the default (primary) geometry; the alternate buffer
    /// defaults to the Model 4 (43x80) maximum, matching x3270's own
    /// `model_num` default, unless `size` is already that large or
    /// larger.
    pub fn new(size: ScreenSize, config: CoreConfig) -> Self {
        let alternate_size = if size == ScreenSize::Model2 { ScreenSize::Model4 } else { size };
        Self::with_sizes(size, alternate_size, config)
    }

    /// Allows the default and alternate geometries to be chosen
    /// independently, as the host's negotiated model does.
    pub fn with_sizes(default_size: ScreenSize, alternate_size: ScreenSize, config: CoreConfig) -> Self {
        let primary = ScreenBuffer::new(default_size);
        let alternate = ScreenBuffer::new(alternate_size);
        Controller {
            nvt: NvtProcessor::new(primary.cols()),
            primary,
            alternate,
            active: ActiveBuffer::Primary,
            default_size,
            alternate_size,
            config,
            aid: AID_NO_AID,
            keyboard_locked: false,
            nvt_mode: false,
        }
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        match self.active {
            ActiveBuffer::Primary => &self.primary,
            ActiveBuffer::Alternate => &self.alternate,
        }
    }

    pub fn buffer_mut(&mut self) -> &mut ScreenBuffer {
        match self.active {
            ActiveBuffer::Primary => &mut self.primary,
            ActiveBuffer::Alternate => &mut self.alternate,
        }
    }

    pub fn is_alternate(&self) -> bool {
        self.active == ActiveBuffer::Alternate
    }

    pub fn is_nvt_mode(&self) -> bool {
        self.nvt_mode
    }

    pub fn enter_nvt_mode(&mut self) {
        self.nvt_mode = true;
    }

    pub fn enter_3270_mode(&mut self) {
        self.nvt_mode = false;
    }

    /// Feeds one 3270 command (Write/EW/EWA/EAU/Read-*) through the Order
    /// Decoder, switching buffers for Erase/Write Alternate and applying
    /// the resulting alarm/keyboard-restore/DBCS-error outcome through
    /// `cb`.
    pub fn process_3270(
        &mut self,
        data: &[u8],
        cb: &mut dyn Callbacks,
    ) -> Result<WriteOutcome, ProtocolError> {
        use super::codes::CommandCode;

        match data.first().copied().and_then(CommandCode::from_u8) {
            Some(CommandCode::EraseWriteAlternate) => self.active = ActiveBuffer::Alternate,
            Some(CommandCode::EraseWrite) => self.active = ActiveBuffer::Primary,
            _ => {}
        }

        let config = self.config;
        let (default_size, alternate_size) = (self.default_size, self.alternate_size);
        let buf = self.buffer_mut();
        let outcome = order_decoder::process_ds(buf, &config, data, default_size, alternate_size)?;

        if outcome.sound_alarm {
            cb.ring_bell();
        }
        if outcome.keyboard_restore {
            self.keyboard_locked = false;
            self.aid = AID_NO_AID;
            cb.kybd_inhibit(false);
        }
        if let Some(err) = &outcome.dbcs_error {
            cb.trace_ds(&err.to_string());
        }
        cb.screen_changed();
        Ok(outcome)
    }

    /// Feeds host bytes through the NVT Processor.
    pub fn process_nvt(&mut self, data: &[u8], cb: &mut dyn Callbacks) {
        let mut buf = match self.active {
            ActiveBuffer::Primary => std::mem::replace(&mut self.primary, ScreenBuffer::new(ScreenSize::Model2)),
            ActiveBuffer::Alternate => std::mem::replace(&mut self.alternate, ScreenBuffer::new(ScreenSize::Model2)),
        };
        self.nvt.process(&mut buf, data, cb);
        match self.active {
            ActiveBuffer::Primary => self.primary = buf,
            ActiveBuffer::Alternate => self.alternate = buf,
        }
        cb.screen_changed();
    }

    pub fn set_aid(&mut self, aid: u8) {
        self.aid = aid;
        self.keyboard_locked = true;
    }

    pub fn read_buffer(&self) -> Vec<u8> {
        inbound::read_buffer(self.buffer(), self.aid)
    }

    pub fn read_modified(&self, all: bool) -> Vec<u8> {
        inbound::read_modified(self.buffer(), self.aid, all)
    }

    pub fn snapshot_3270(&self) -> Vec<u8> {
        inbound::snapshot(self.buffer())
    }

    pub fn snapshot_nvt(&self) -> Vec<u8> {
        self.nvt.snap(self.buffer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::callbacks::NullCallbacks;

    #[test]
    fn erase_write_alternate_switches_buffer_and_back() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        assert!(!ctl.is_alternate());
        ctl.process_3270(&[0x7E, 0x00], &mut cb).unwrap();
        assert!(ctl.is_alternate());
        ctl.process_3270(&[0xF5, 0x00], &mut cb).unwrap();
        assert!(!ctl.is_alternate());
    }

    #[test]
    fn erase_write_alternate_resizes_the_active_buffer() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        ctl.process_3270(&[0x7E, 0x00], &mut cb).unwrap();
        assert_eq!(ctl.buffer().rows(), ScreenSize::Model4.rows());
        assert_eq!(ctl.buffer().cols(), ScreenSize::Model4.cols());
        ctl.process_3270(&[0xF5, 0x00], &mut cb).unwrap();
        assert_eq!(ctl.buffer().rows(), ScreenSize::Model2.rows());
        assert_eq!(ctl.buffer().cols(), ScreenSize::Model2.cols());
    }

    #[test]
    fn keyboard_restore_clears_aid_and_unlocks() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        ctl.set_aid(super::super::codes::AID_ENTER);
        assert!(ctl.keyboard_locked);
        ctl.process_3270(&[0xF1, super::super::codes::WCC_RESTORE], &mut cb).unwrap();
        assert!(!ctl.keyboard_locked);
        assert_eq!(ctl.aid, AID_NO_AID);
    }

    #[test]
    fn erase_all_unprotected_clears_aid_and_unlocks() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        ctl.set_aid(super::super::codes::AID_ENTER);
        ctl.process_3270(&[0x6F], &mut cb).unwrap();
        assert!(!ctl.keyboard_locked);
        assert_eq!(ctl.aid, AID_NO_AID);
    }

    #[test]
    fn alarm_bit_rings_bell() {
        struct Counter(usize);
        impl Callbacks for Counter {
            fn ring_bell(&mut self) {
                self.0 += 1;
            }
        }
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = Counter(0);
        ctl.process_3270(&[0xF1, 0x04], &mut cb).unwrap();
        assert_eq!(cb.0, 1);
    }

    #[test]
    fn nvt_mode_writes_into_the_same_active_buffer() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        ctl.enter_nvt_mode();
        ctl.process_nvt(b"hi", &mut cb);
        assert_eq!(ctl.buffer().cell(0).ec, b'h');
        assert_eq!(ctl.buffer().cell(1).ec, b'i');
    }

    #[test]
    fn scenario_read_modified_round_trip() {
        let mut ctl = Controller::new(ScreenSize::Model2, CoreConfig::default());
        let mut cb = NullCallbacks;
        let data = [
            0xF1, 0xC3, 0x1D, 0xF0, 0xC1, 0xC2, 0xC3, 0x1D, 0x60, 0xC4, 0xC5,
        ];
        ctl.process_3270(&data, &mut cb).unwrap();
        ctl.set_aid(super::super::codes::AID_ENTER);
        let out = ctl.read_modified(false);
        assert_eq!(out[0], super::super::codes::AID_ENTER);
    }
}
