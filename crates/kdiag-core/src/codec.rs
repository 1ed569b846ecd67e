//! Four letter command codec
//!
//! A command's wire identity is the four ASCII bytes of its name. The
//! registry keys commands by those bytes packed big-endian into an `i32`,
//! so `"ruok"` becomes `0x72756f6b`. The codec does not look at the
//! character set: any four bytes round-trip.

use std::fmt;

/// Width of a command token on the wire
pub const COMMAND_LEN: usize = 4;

/// Pack four name bytes into a command code
pub const fn encode(name: [u8; COMMAND_LEN]) -> i32 {
    i32::from_be_bytes(name)
}

/// Unpack a command code into its four name bytes
pub const fn decode(code: i32) -> [u8; COMMAND_LEN] {
    code.to_be_bytes()
}

/// Integer identity of a four letter command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandCode(i32);

impl CommandCode {
    /// Code for the four bytes read off the wire
    pub const fn from_bytes(bytes: [u8; COMMAND_LEN]) -> Self {
        Self(encode(bytes))
    }

    /// Code for a command name, or `None` if it is not exactly four bytes
    pub fn from_name(name: &str) -> Option<Self> {
        let bytes: [u8; COMMAND_LEN] = name.as_bytes().try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn bytes(self) -> [u8; COMMAND_LEN] {
        decode(self.0)
    }

    /// Human-facing name; non-UTF-8 bytes are replaced
    pub fn name(self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_big_endian() {
        assert_eq!(encode(*b"ruok"), 0x7275_6f6b);
        assert_eq!(decode(0x6d6e_7472), *b"mntr");
    }

    #[test]
    fn test_from_name_rejects_wrong_length() {
        assert!(CommandCode::from_name("mnt").is_none());
        assert!(CommandCode::from_name("mntrx").is_none());
        assert!(CommandCode::from_name("").is_none());
    }

    #[test]
    fn test_name_of_binary_code_is_lossy() {
        let code = CommandCode::from_bytes([0xff, b'a', b'b', b'c']);
        assert_eq!(code.bytes(), [0xff, b'a', b'b', b'c']);
        assert!(code.name().ends_with("abc"));
    }

    #[test]
    fn test_display_prints_name() {
        let code = CommandCode::from_name("lgif").unwrap();
        assert_eq!(code.to_string(), "lgif");
        assert_eq!(CommandCode::from_raw(code.raw()), code);
    }
}
