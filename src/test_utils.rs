//! Small stand-ins for tests that don't need a whole domain.
use crate::space::Action;
use crate::space::State;

impl State for u8 {}
impl Action for u8 {}
