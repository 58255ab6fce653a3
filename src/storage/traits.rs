use crate::domain::StateMap;
use crate::errors::TailResult;

#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Previously saved state; an absent store is an empty map.
    fn load(&self) -> TailResult<StateMap>;
    fn save(&self, states: &StateMap) -> TailResult<()>;
}
