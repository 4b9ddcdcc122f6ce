#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Polls MarineTraffic map tiles around the observing vessel and emits the vessels found
//! as Signal K deltas.

pub mod error;
pub mod marine_traffic;
pub mod poller;
pub mod position;
pub mod session;
pub mod settings;
pub mod sink;
pub mod startup;
