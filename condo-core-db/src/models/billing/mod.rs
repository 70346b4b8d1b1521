pub mod charge;

pub use charge::*;
