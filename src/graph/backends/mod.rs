//! [`BulkSink`](crate::graph::BulkSink) implementations.
//!
//! | Backend | Module |
//! |---------|--------|
//! | PostgreSQL + Apache AGE | [`postgres`] |
//! | In-process | [`memory`] |

pub mod memory;
pub mod postgres;
