//! Graph construction and representation
//!
//! [`builder::WeightedGraph`] is the mutable attestation graph;
//! [`csr::CsrGraph`] is the frozen view the power iteration walks.

pub mod builder;
pub mod csr;
