//! Action and policy registries.

use std::collections::HashMap;
use std::sync::Arc;

use bouncer_sdk::{ActionHandler, ActionOptions, BouncerError, Policy, PolicyLoader};

use super::slot::PolicySlot;

/// A globally defined action.
pub struct RegisteredAction<U> {
    pub handler: Arc<dyn ActionHandler<U>>,
    pub options: ActionOptions,
}

/// Append-only mapping from action name to handler and options.
pub struct ActionRegistry<U> {
    actions: HashMap<String, RegisteredAction<U>>,
    /// Names in registration order.
    order: Vec<String>,
}

impl<U> Default for ActionRegistry<U> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<U> ActionRegistry<U> {
    /// # Errors
    ///
    /// [`BouncerError::DuplicateAction`] if `name` is already registered.
    pub fn insert(
        &mut self,
        name: String,
        handler: Arc<dyn ActionHandler<U>>,
        options: ActionOptions,
    ) -> Result<(), BouncerError> {
        if self.actions.contains_key(&name) {
            return Err(BouncerError::DuplicateAction(name));
        }
        self.order.push(name.clone());
        self.actions
            .insert(name, RegisteredAction { handler, options });
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredAction<U>> {
        self.actions.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Registered policies by name, each loaded and booted on first use.
pub struct PolicyRegistry<U> {
    slots: HashMap<String, PolicySlot<U>>,
}

impl<U> Default for PolicyRegistry<U> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<U> PolicyRegistry<U> {
    #[must_use]
    pub fn new(loaders: HashMap<String, Arc<dyn PolicyLoader<U>>>) -> Self {
        Self {
            slots: loaders
                .into_iter()
                .map(|(name, loader)| (name.clone(), PolicySlot::new(name, loader)))
                .collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the booted policy registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`BouncerError::PolicyNotFound`] if no policy is registered under `name`
    /// - [`BouncerError::PolicyLoad`] if its loader fails
    pub async fn resolve(&self, name: &str) -> Result<Arc<Policy<U>>, BouncerError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| BouncerError::PolicyNotFound(name.to_owned()))?;
        slot.get_or_load().await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use bouncer_sdk::{ActionArgs, ActionResponse, FnAction};

    use super::*;

    struct User;

    fn allow() -> Arc<dyn ActionHandler<User>> {
        Arc::new(FnAction(|_: Option<&User>, _: &ActionArgs| {
            Ok::<_, anyhow::Error>(ActionResponse::Allow)
        }))
    }

    #[test]
    fn actions_keep_registration_order() {
        let mut registry = ActionRegistry::default();
        registry
            .insert("edit".to_owned(), allow(), ActionOptions::default())
            .unwrap();
        registry
            .insert("view".to_owned(), allow(), ActionOptions::new().allow_guest(true))
            .unwrap();

        assert_eq!(registry.names(), &["edit".to_owned(), "view".to_owned()]);
        assert!(registry.get("view").unwrap().options.allow_guest);
        assert!(registry.contains("edit"));
        assert!(!registry.contains("delete"));
    }

    #[test]
    fn duplicate_action_does_not_overwrite() {
        let mut registry = ActionRegistry::default();
        registry
            .insert("edit".to_owned(), allow(), ActionOptions::new().allow_guest(true))
            .unwrap();

        let err = registry
            .insert("edit".to_owned(), allow(), ActionOptions::default())
            .unwrap_err();

        assert!(matches!(err, BouncerError::DuplicateAction(ref name) if name == "edit"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("edit").unwrap().options.allow_guest);
    }

    #[tokio::test]
    async fn unknown_policy_is_not_found() {
        let registry = PolicyRegistry::<User>::default();

        let err = registry.resolve("post").await.unwrap_err();
        assert!(matches!(err, BouncerError::PolicyNotFound(ref name) if name == "post"));
    }
}
