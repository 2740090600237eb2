//! The abstract external collaborators the core requires: OIA status
//! updates, bell/scrollback/trace sinks, and the xterm OSC hook. None of
//! these are implemented here; `NullCallbacks` is the no-op default used
//! by tests and by callers that don't need a sink.

/// Operator-information-area state bits the core reports on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VStatus {
    pub keyboard_locked: bool,
    pub insert_mode: bool,
    pub alarm: bool,
}

pub trait Callbacks {
    fn ring_bell(&mut self) {}
    fn screen_changed(&mut self) {}
    fn scroll_save(&mut self, _rows: usize) {}
    fn kybd_inhibit(&mut self, _locked: bool) {}
    fn kybdlock_clr(&mut self, _mask: u32, _reason: &str) {}
    fn vstatus_changed(&mut self, _status: VStatus) {}
    fn popup_an_error(&mut self, _message: &str) {}
    fn task_host_output(&mut self) {}
    fn xterm_text_gui(&mut self, _code: u32, _text: &str) {}
    fn trace_ds(&mut self, _message: &str) {}
}

#[derive(Debug, Default)]
pub struct NullCallbacks;

impl Callbacks for NullCallbacks {}
