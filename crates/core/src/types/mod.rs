pub mod geo;
pub mod range;
