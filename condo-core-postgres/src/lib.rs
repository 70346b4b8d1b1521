pub mod config;
pub mod policy_store;
pub mod postgres_repositories;
pub mod repository;
pub mod service;
pub mod unit_of_work;
pub mod utils;

pub use config::CoreConfig;
pub use postgres_repositories::{BillingRepositories, PostgresRepositories};
pub use service::engine::BillingEngine;
pub use unit_of_work::Executor;

#[cfg(test)]
pub mod test_helper;
