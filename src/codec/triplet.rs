use crate::codec::{Code, CodeError};
use serde::{Serialize, Serializer};
use std::fmt;

/// The three-byte encoded form of a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalTriplet(pub [u8; 3]);

impl CanonicalTriplet {
    /// Encodes an already-validated code
    pub fn from_code(code: &Code) -> Self {
        let base = code.base_code();
        let suffix = code.fault_suffix();

        // Both slices are hex-validated by Code::parse.
        let body = u16::from_str_radix(&base[1..], 16).unwrap_or_default();
        let fault = u8::from_str_radix(suffix, 16).unwrap_or_default();

        let value = (code.system().nibble() << 12) | body;
        Self([(value >> 8) as u8, (value & 0xFF) as u8, fault])
    }

    pub fn bytes(&self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for CanonicalTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [high, mid, low] = self.0;
        write!(f, "{:02X} {:02X} {:02X}", high, mid, low)
    }
}

impl Serialize for CanonicalTriplet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Converts a raw code string into its canonical triplet
///
/// The letter selects the top nibble (P=0, C=1, B=2, U=3), which is OR-ed
/// with the four body digits to form a 16-bit value split into the first two
/// bytes. The third byte is the fault suffix.
///
/// # Examples
///
/// ```
/// use dtc_harvest::codec::to_canonical_triplet;
///
/// let triplet = to_canonical_triplet("P05FF-00").unwrap();
/// assert_eq!(triplet.bytes(), [0x05, 0xFF, 0x00]);
/// assert_eq!(triplet.to_string(), "05 FF 00");
/// ```
pub fn to_canonical_triplet(code: &str) -> Result<CanonicalTriplet, CodeError> {
    Code::parse(code).map(|code| CanonicalTriplet::from_code(&code))
}
