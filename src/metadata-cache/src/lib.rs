#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Persistent, bounded cache of vessel metadata keyed by MarineTraffic ship id.

mod cache;
mod error;
mod lru;
mod snapshot;

pub use cache::MetadataCache;
pub use error::{Error, Result};
