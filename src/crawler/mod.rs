//! Crawler module for namespace harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Listing page parsing and link extraction
//! - Breadth-first discovery of listing pages and detail links
//! - Detail page parsing into records
//! - The per-namespace run loop

mod coordinator;
mod detail;
mod frontier;
mod parser;

pub use coordinator::{HarvestOptions, Harvester};
pub use detail::{parse_detail_page, DetailError};
pub use frontier::{Discovery, Frontier};
pub use parser::{parse_listing, ListingPage};

pub use crate::output::HarvestSummary;
