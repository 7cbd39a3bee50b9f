//! Reducers and ordered reducer-module chains.

use std::marker::PhantomData;

/// Pure state transition.
///
/// Returns a new state; the input snapshot may still be held by readers and
/// is never mutated.
pub trait Reducer<S, A>: Send + Sync + 'static {
    /// Apply `action` to `state`.
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

/// One independent slice of an entity's transition logic.
///
/// Every module sees every action. A module that does not recognise the
/// action returns the state unchanged.
pub trait ReducerModule<S, A>: Send + Sync {
    /// Name for diagnostics.
    fn name(&self) -> &'static str;

    /// Transform the accumulated state.
    fn reduce(&self, state: S, action: &A) -> S;
}

/// Statically ordered list of modules folded left to right.
pub struct ModuleChain<S: 'static, A: 'static> {
    modules: &'static [&'static dyn ReducerModule<S, A>],
    _marker: PhantomData<fn(S, &A)>,
}

impl<S: 'static, A: 'static> ModuleChain<S, A> {
    /// Chain the given modules in order.
    pub const fn new(modules: &'static [&'static dyn ReducerModule<S, A>]) -> Self {
        Self {
            modules,
            _marker: PhantomData,
        }
    }

    /// Module names in fold order.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

impl<S: 'static, A: 'static> Clone for ModuleChain<S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: 'static, A: 'static> Copy for ModuleChain<S, A> {}

impl<S, A> Reducer<S, A> for ModuleChain<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self.modules
            .iter()
            .fold(state.clone(), |acc, module| module.reduce(acc, action))
    }
}
