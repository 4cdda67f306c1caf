//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `HarvestPhase`: where a namespace run is (warming up, discovering, fetching, done)
//! - `RecordStep`: the fetch/parse/emit sub-flow for one detail link

mod phase;

pub use phase::{HarvestPhase, RecordStep};
