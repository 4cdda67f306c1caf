/// Phase definitions for one namespace harvest
///
/// A run walks `WarmingUp -> Discovering -> Fetching(0..n) -> Done`, and each
/// detail link inside `Fetching` goes through `Fetch -> Parse -> Emit`.
use serde::Serialize;
use std::fmt;

/// Where a harvest run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HarvestPhase {
    /// Priming the fetcher session
    WarmingUp,

    /// Walking listing pages to collect detail links
    Discovering,

    /// Processing the detail link at this index
    Fetching(usize),

    /// Every discovered link has been accounted for, or the run was cancelled
    Done,
}

impl HarvestPhase {
    /// Returns true if the run can move from this phase to `next`
    ///
    /// Fetching indices only move forward one link at a time. `Done` is
    /// reachable from every phase so a cancelled run can always finish.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match (self, next) {
            (_, Self::Done) => !self.is_terminal(),
            (Self::WarmingUp, Self::Discovering) => true,
            (Self::Discovering, Self::Fetching(0)) => true,
            (Self::Fetching(i), Self::Fetching(j)) => *j == i + 1,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Converts the phase to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::WarmingUp => "warming_up",
            Self::Discovering => "discovering",
            Self::Fetching(_) => "fetching",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for HarvestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching(i) => write!(f, "fetching #{}", i),
            other => write!(f, "{}", other.to_db_string().replace('_', " ")),
        }
    }
}

/// Step of the per-link sub-flow inside `Fetching`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStep {
    Fetch,
    Parse,
    Emit,
}

impl RecordStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Emit => "emit",
        }
    }
}

impl fmt::Display for RecordStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
