use crate::unit_of_work::Executor;

pub struct ReconciliationRepositoryImpl {
    pub executor: Executor,
}

impl ReconciliationRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}
