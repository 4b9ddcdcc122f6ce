mod delta;
mod geo;
mod normalize;
mod ship_type;
mod vessel;

pub use delta::*;
pub use geo::*;
pub use normalize::*;
pub use ship_type::*;
pub use vessel::*;
