pub mod unit_credit;

pub use unit_credit::*;
