pub mod create_batch;
pub mod find_by_egress;
pub mod repo_impl;

pub use repo_impl::EgressAllocationRepositoryImpl;
