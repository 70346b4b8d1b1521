use crate::unit_of_work::Executor;

pub struct PaymentAllocationRepositoryImpl {
    pub executor: Executor,
}

impl PaymentAllocationRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}
