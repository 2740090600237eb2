//! EBCDIC/ASCII conversion, reused by the 3270 order decoder and inbound
//! encoder for code-page-independent character translation.

pub mod ebcdic;

pub use ebcdic::{ebcdic_to_ascii, ascii_to_ebcdic, ebcdic_to_ascii_string, ascii_to_ebcdic_vec};

/// Protocol version information
pub const PROTOCOL_COMMON_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the protocol common module version
pub fn version() -> &'static str {
    PROTOCOL_COMMON_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
    }

    #[test]
    fn test_ebcdic_reexport() {
        let ascii = ebcdic_to_ascii(0xC1);
        assert_eq!(ascii, 'A');

        let ebcdic = ascii_to_ebcdic('A');
        assert_eq!(ebcdic, 0xC1);
    }
}
