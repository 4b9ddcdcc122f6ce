#![deny(warnings)]
#![deny(rust_2018_idioms)]

mod domain;
mod ports;

pub mod error;

pub use domain::*;
pub use error::{BoxedError, Error, Result};
pub use ports::*;
