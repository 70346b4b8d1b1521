use crate::unit_of_work::Executor;

pub struct EgressAllocationRepositoryImpl {
    pub executor: Executor,
}

impl EgressAllocationRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}
