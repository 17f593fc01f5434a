//! Weighted 2D accumulators for the parameter-space voting.
//!
//! [`HoughHistogram`] is one sector's (coord, angle) grid with explicit
//! margin bins on the coord axis; [`SectorHistograms`] bundles one histogram
//! per angular sector and implements the smeared fill (butterfly neighbors,
//! periodic-boundary handling, cross-sector duplication) plus global maximum
//! extraction.

mod histogram2d;
mod sectors;

pub use histogram2d::{BinIndex, HoughHistogram};
pub use sectors::{Maximum, SectorHistograms, SmearSpec};
