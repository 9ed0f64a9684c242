//! CRC-32 helpers for block verification.
//!
//! Checkpoint producers record the CRC-32 (ISO-HDLC, as used by gzip) of every
//! decompressed block as lowercase hex text without a prefix.

use flate2::Crc;

/// Computes the CRC-32 of a decompressed block.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Parses a recorded checksum. Accepts an optional `0x` prefix.
pub fn parse_crc32(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.is_empty() || digits.len() > 8 {
        return None;
    }

    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_value() {
        // Standard check input for CRC-32/ISO-HDLC.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn parse_recorded_checksums() {
        assert_eq!(parse_crc32("cbf43926"), Some(0xCBF4_3926));
        assert_eq!(parse_crc32("0xCBF43926"), Some(0xCBF4_3926));
        assert_eq!(parse_crc32("0"), Some(0));
        assert_eq!(parse_crc32(""), None);
        assert_eq!(parse_crc32("1cbf43926"), None);
        assert_eq!(parse_crc32("zz"), None);
    }
}
