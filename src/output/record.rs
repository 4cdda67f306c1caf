//! Records produced by a harvest

use crate::codec::{fault_meaning, CanonicalTriplet, Code};
use crate::extract::Section;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One decoded detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    /// Code as found on the page (or derived from the URL), uppercased
    pub code: String,

    // Present only when `code` matches the code grammar
    pub base_code: Option<String>,
    pub fault_suffix: Option<String>,
    pub fault_meaning: Option<String>,
    pub canonical_triplet: Option<CanonicalTriplet>,

    pub definition: Option<String>,
    pub url: String,
    pub sections: Vec<Section>,
    pub fetched_at: DateTime<Utc>,
}

impl DetailRecord {
    /// Builds a record, decoding `code` when it is well-formed
    ///
    /// A malformed code is kept as-is with every derived field absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use dtc_harvest::output::DetailRecord;
    ///
    /// let record = DetailRecord::new("p0013-11", None, "https://x.test/p0013-11", vec![]);
    /// assert_eq!(record.code, "P0013-11");
    /// assert_eq!(record.base_code.as_deref(), Some("P0013"));
    /// assert_eq!(record.fault_meaning.as_deref(), Some("Circuit short to ground"));
    ///
    /// let odd = DetailRecord::new("P0013", None, "https://x.test/P0013", vec![]);
    /// assert!(odd.canonical_triplet.is_none());
    /// ```
    pub fn new(
        code: &str,
        definition: Option<String>,
        url: &str,
        sections: Vec<Section>,
    ) -> Self {
        let mut record = Self {
            code: code.trim().to_uppercase(),
            base_code: None,
            fault_suffix: None,
            fault_meaning: None,
            canonical_triplet: None,
            definition,
            url: url.to_string(),
            sections,
            fetched_at: Utc::now(),
        };

        if let Ok(parsed) = Code::parse(&record.code) {
            record.base_code = Some(parsed.base_code().to_string());
            record.fault_suffix = Some(parsed.fault_suffix().to_string());
            record.fault_meaning = fault_meaning(parsed.fault_suffix()).map(str::to_string);
            record.canonical_triplet = Some(CanonicalTriplet::from_code(&parsed));
        }

        record
    }
}

/// A detail link that could not be fetched or parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub error: String,
}

/// Unit pushed to an output sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HarvestRecord {
    Detail(DetailRecord),
    Error(ErrorRecord),
}

impl HarvestRecord {
    pub fn url(&self) -> &str {
        match self {
            Self::Detail(record) => &record.url,
            Self::Error(record) => &record.url,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<DetailRecord> for HarvestRecord {
    fn from(record: DetailRecord) -> Self {
        Self::Detail(record)
    }
}

impl From<ErrorRecord> for HarvestRecord {
    fn from(record: ErrorRecord) -> Self {
        Self::Error(record)
    }
}
