//! The five configurable knobs the core honors. Unlike the top-level
//! `SessionConfig` property bag, this is a plain value: the core owns
//! no session lifecycle to notify listeners about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// MDT changes invalidate the whole screen, not just the FA cell.
    pub modified_sel: bool,
    /// Permits SFE/MF/SA.
    pub extended_data_stream: bool,
    /// mode3279: disables color attribute storage when false.
    pub color_display: bool,
    /// Enables the DBCS classifier and post-processor.
    pub dbcs: bool,
    /// Spaces-vs-nulls during clear().
    pub visible_control: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            modified_sel: false,
            extended_data_stream: true,
            color_display: false,
            dbcs: false,
            visible_control: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_appres() {
        let cfg = CoreConfig::default();
        assert!(cfg.extended_data_stream);
        assert!(!cfg.modified_sel);
        assert!(!cfg.color_display);
        assert!(!cfg.dbcs);
        assert!(!cfg.visible_control);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = CoreConfig { dbcs: true, color_display: true, ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
