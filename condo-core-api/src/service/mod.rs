pub mod policy_provider;
pub mod requests;
pub mod retry;

pub use policy_provider::*;
pub use requests::*;
pub use retry::*;
