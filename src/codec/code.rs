use crate::codec::CodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regex fragment matching one code token (use with the `(?i)` flag)
pub const CODE_PATTERN: &str = r"[PCBU][0-9A-F]{4}-[0-9A-F]{2}";

/// Vehicle system named by the leading letter of a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemKind {
    Powertrain,
    Chassis,
    Body,
    Network,
}

impl SystemKind {
    /// Maps a code letter to its system, case-insensitively
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Powertrain),
            'C' => Some(Self::Chassis),
            'B' => Some(Self::Body),
            'U' => Some(Self::Network),
            _ => None,
        }
    }

    /// The two-bit value placed in the top nibble of the encoded code
    pub fn nibble(&self) -> u16 {
        match self {
            Self::Powertrain => 0x0,
            Self::Chassis => 0x1,
            Self::Body => 0x2,
            Self::Network => 0x3,
        }
    }
}

/// A validated code of the form `{letter}{4 hex}-{2 hex}`, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code {
    text: String,
    system: SystemKind,
}

impl Code {
    /// Parses a raw scraped code
    ///
    /// Matching is case-insensitive and exact: surrounding whitespace or any
    /// extra characters make the code invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtc_harvest::codec::Code;
    ///
    /// let code = Code::parse("p0300-00").unwrap();
    /// assert_eq!(code.as_str(), "P0300-00");
    /// assert_eq!(code.base_code(), "P0300");
    /// assert_eq!(code.fault_suffix(), "00");
    /// assert!(Code::parse("X0300-00").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let bytes = raw.as_bytes();
        let invalid = || CodeError::InvalidCodeFormat(raw.to_string());

        if bytes.len() != 8
            || !bytes[1..5].iter().all(u8::is_ascii_hexdigit)
            || bytes[5] != b'-'
            || !bytes[6..8].iter().all(u8::is_ascii_hexdigit)
        {
            return Err(invalid());
        }
        let system = SystemKind::from_letter(bytes[0] as char).ok_or_else(invalid)?;

        Ok(Self {
            text: raw.to_ascii_uppercase(),
            system,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Letter plus four hex digits, e.g. `P0300`
    pub fn base_code(&self) -> &str {
        &self.text[..5]
    }

    /// The two hex digits after the dash
    pub fn fault_suffix(&self) -> &str {
        &self.text[6..]
    }

    pub fn system(&self) -> SystemKind {
        self.system
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Code::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.text
    }
}
