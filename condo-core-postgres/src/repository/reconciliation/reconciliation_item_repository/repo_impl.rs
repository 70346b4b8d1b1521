use crate::unit_of_work::Executor;

pub struct ReconciliationItemRepositoryImpl {
    pub executor: Executor,
}

impl ReconciliationItemRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}
