//! Four-character codes.
//!
//! The host audio server identifies property selectors, object classes,
//! property scopes and I/O operations with 32-bit values built from four
//! ASCII characters, packed big-endian (`'nsrt'` is `0x6E737274`). This module
//! provides a `const fn` to build those values and a small wrapper type for
//! logging them in readable form.

/// Pack four ASCII bytes into a big-endian 32-bit code.
///
/// Usable in `const` context, which is how every selector table in the
/// driver is declared.
///
/// # Examples
///
/// ```
/// use siphon_utils::fourcc;
///
/// const NOMINAL_SAMPLE_RATE: u32 = fourcc(b"nsrt");
/// assert_eq!(NOMINAL_SAMPLE_RATE, 0x6E73_7274);
/// ```
#[inline]
pub const fn fourcc(bytes: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*bytes)
}

/// A four-character code with a readable `Display`.
///
/// Non-printable bytes are shown as `.` so that numeric codes (for example
/// the plug-in object ID `1`) still render as four characters in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCharCode(pub u32);

impl FourCharCode {
    /// Create a code from four ASCII bytes.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(fourcc(bytes))
    }

    /// Get the raw 32-bit value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the four bytes in display order.
    pub const fn as_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for FourCharCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for FourCharCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.as_bytes() {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_big_endian() {
        assert_eq!(fourcc(b"glob"), 0x676C_6F62);
        assert_eq!(fourcc(b"uid "), 0x7569_6420);
    }

    #[test]
    fn test_fourcc_const() {
        const CODE: u32 = fourcc(b"lpcm");
        assert_eq!(CODE, FourCharCode::new(b"lpcm").as_u32());
    }

    #[test]
    fn test_display_printable() {
        assert_eq!(FourCharCode::new(b"dev#").to_string(), "dev#");
    }

    #[test]
    fn test_display_non_printable() {
        assert_eq!(FourCharCode(1).to_string(), "....");
    }
}
