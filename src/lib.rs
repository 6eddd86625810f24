//! moviegraph - movie catalog to property graph
//!
//! Projects the TMDB/MovieLens movie catalog (CSV rows with embedded nested
//! documents) into deduplicated vertices and labeled edges, stores them as
//! JSON interchange files, and bulk-loads them into a graph store under a
//! throughput budget.

pub mod cli;
pub mod config;
pub mod context;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod graph;
pub mod loader;
pub mod models;
pub mod naming;
pub mod pipeline;
pub mod projection;
pub mod store;
pub mod synth;
