pub mod payment_allocation_repository;
pub mod payment_repository;

pub use payment_allocation_repository::PaymentAllocationRepositoryImpl;
pub use payment_repository::PaymentRepositoryImpl;
