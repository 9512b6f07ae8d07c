use roundfsm_core_types::Context;

use crate::{Address, AppEvent, Body, RoundName};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TestContext;

impl TestContext {
    pub fn new() -> Self {
        Self
    }
}

impl Context for TestContext {
    type Address = Address;
    type RoundId = RoundName;
    type AppEvent = AppEvent;
    type Body = Body;
}
