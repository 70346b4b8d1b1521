//! Transaction-scoped operations.
//!
//! Every function here runs on the repositories of one unit of work and never commits: the caller
//! (normally [`engine::BillingEngine`]) owns the transaction boundary. Locks are always taken in
//! the same order: folio counter, charges or payables, financial account, then the unit credit
//! lock.

pub mod billing_rules;
pub mod cancellation;
pub mod charge;
pub mod credit;
pub mod egress;
pub mod engine;
pub mod folio;
pub mod payment;
pub mod reconciliation;

use condo_core_api::error::{BillingError, BillingResult};
use condo_core_db::models::audit::AuditLogModel;
use condo_core_db::models::identifiable::Identifiable;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use heapless::String as HeaplessString;
use sqlx::Postgres;
use std::str::FromStr;
use uuid::Uuid;

use crate::postgres_repositories::BillingRepositories;

pub(crate) fn bounded<const N: usize>(field: &str, value: &str) -> BillingResult<HeaplessString<N>> {
    HeaplessString::from_str(value)
        .map_err(|_| BillingError::validation(format!("{field} exceeds {N} characters")))
}

pub(crate) fn bounded_opt<const N: usize>(
    field: &str,
    value: Option<&str>,
) -> BillingResult<Option<HeaplessString<N>>> {
    value.map(|v| bounded(field, v)).transpose()
}

/// One audit log row per mutating transaction, attributed to the acting user.
pub(crate) async fn open_audit_log(repos: &BillingRepositories, actor_id: Uuid) -> BillingResult<Uuid> {
    let audit_log = repos
        .audit_log_repository
        .create(&AuditLogModel::new(actor_id))
        .await?;
    Ok(audit_log.id)
}

pub(crate) async fn lock_one<T, R>(repo: &R, entity: &str, id: Uuid) -> BillingResult<T>
where
    T: Identifiable,
    R: LoadForUpdate<Postgres, T> + ?Sized,
{
    repo.load_for_update(&[id])
        .await?
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| BillingError::not_found(entity, id))
}
