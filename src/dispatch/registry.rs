//! Capability registry: `(controller, action)` → callable.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::DispatchError;
use crate::routing::value::Value;

/// A registered action. Receives the descriptor's `args`.
pub type Action<T> = Arc<dyn Fn(&[Value]) -> Result<T, DispatchError> + Send + Sync>;

/// Actions available to the responder, populated at startup.
pub struct Registry<T> {
    controllers: HashMap<String, HashMap<String, Action<T>>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    /// Register an action, replacing any previous one under the same names.
    pub fn register<F>(&mut self, controller: &str, action: &str, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<T, DispatchError> + Send + Sync + 'static,
    {
        self.controllers
            .entry(controller.to_string())
            .or_default()
            .insert(action.to_string(), Arc::new(f));
        self
    }

    pub fn get(&self, controller: &str, action: &str) -> Option<&Action<T>> {
        self.controllers.get(controller)?.get(action)
    }

    pub fn contains(&self, controller: &str, action: &str) -> bool {
        self.get(controller, action).is_some()
    }

    /// Total number of registered actions.
    pub fn len(&self) -> usize {
        self.controllers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .controllers
            .iter()
            .flat_map(|(c, actions)| actions.keys().map(move |a| format!("{}.{}", c, a)))
            .collect();
        names.sort();
        f.debug_struct("Registry").field("actions", &names).finish()
    }
}
