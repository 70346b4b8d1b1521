pub mod egress_allocation_repository;
pub mod egress_repository;
pub mod payable_repository;

pub use egress_allocation_repository::EgressAllocationRepositoryImpl;
pub use egress_repository::EgressRepositoryImpl;
pub use payable_repository::PayableRepositoryImpl;
