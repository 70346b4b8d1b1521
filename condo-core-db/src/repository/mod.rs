pub mod create_batch;
pub mod load;
pub mod load_batch;
pub mod load_for_update;
pub mod pagination;
pub mod update_batch;

// Re-exports
pub use create_batch::*;
pub use load::*;
pub use load_batch::*;
pub use load_for_update::*;
pub use pagination::*;
pub use update_batch::*;
