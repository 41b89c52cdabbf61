use tracing::warn;

/// Width of one packed record: 2-letter code followed by 3 base-32 digits
pub const RECORD_WIDTH: usize = 5;

/// The three digit characters that follow a destination code.
/// Stored raw so malformed digits can degrade at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedCode([u8; 3]);

impl PackedCode {
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// Pack three indices into base-32 digits.
    /// Returns `None` if any index does not fit in one digit.
    pub fn encode(kind: u32, visa_type: u32, term: u32) -> Option<Self> {
        let digit = |v: u32| char::from_digit(v, 32).map(|c| c as u8);
        Some(Self([digit(kind)?, digit(visa_type)?, digit(term)?]))
    }

    /// Decoded `(kind, type, term)` indices. A non base-32 character is `None`.
    pub fn indices(&self) -> (Option<u32>, Option<u32>, Option<u32>) {
        let [k, t, r] = self.0;
        (base32(k), base32(t), base32(r))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

#[inline]
fn base32(byte: u8) -> Option<u32> {
    (byte as char).to_digit(32)
}

/// One fixed-width record of a requirement blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub code: [u8; 2],
    pub packed: PackedCode,
}

impl Record {
    pub fn code_str(&self) -> &str {
        std::str::from_utf8(&self.code).unwrap_or("")
    }
}

/// Split a blob into `CCKTT` records. A trailing partial record is dropped.
pub fn parse_records(origin: &str, blob: &str) -> Vec<Record> {
    let bytes = blob.as_bytes();
    let chunks = bytes.chunks_exact(RECORD_WIDTH);

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        warn!(
            origin,
            trailing = %String::from_utf8_lossy(remainder),
            "ignoring partial record at end of blob"
        );
    }

    chunks
        .map(|chunk| Record {
            code: [chunk[0], chunk[1]],
            packed: PackedCode([chunk[2], chunk[3], chunk[4]]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_all_valid_indices() {
        for kind in 0..5 {
            for visa_type in 0..17 {
                for term in 0..19 {
                    let packed = PackedCode::encode(kind, visa_type, term).unwrap();
                    assert_eq!(packed.indices(), (Some(kind), Some(visa_type), Some(term)));
                }
            }
        }
    }

    #[test]
    fn test_digits_are_case_insensitive() {
        let lower = PackedCode::from_bytes(*b"4gi");
        let upper = PackedCode::from_bytes(*b"4GI");
        assert_eq!(lower.indices(), (Some(4), Some(16), Some(18)));
        assert_eq!(lower.indices(), upper.indices());
    }

    #[test]
    fn test_malformed_digit() {
        let packed = PackedCode::from_bytes(*b"1z0");
        assert_eq!(packed.indices(), (Some(1), None, Some(0)));
    }

    #[test]
    fn test_encode_rejects_overflow() {
        assert!(PackedCode::encode(32, 0, 0).is_none());
    }

    #[test]
    fn test_parse_records() {
        let records = parse_records("US", "GB120FR410");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code_str(), "GB");
        assert_eq!(records[0].packed.as_str(), "120");
        assert_eq!(records[1].code_str(), "FR");
        assert_eq!(records[1].packed.as_str(), "410");
    }

    #[test]
    fn test_parse_records_drops_partial_tail() {
        let records = parse_records("US", "GB120FR4");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code_str(), "GB");
    }
}
