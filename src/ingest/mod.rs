//! Upstream data sources.

pub mod iqair;

#[cfg(test)]
pub(crate) mod fixtures;
