//! Policy record: a named bundle of actions scoped to one resource type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{
    ActionHandler, AfterHook, BeforeHook, FnAction, FnAfterHook, FnBeforeHook,
};
use crate::args::ActionArgs;
use crate::error::BouncerError;
use crate::models::{ActionOptions, ActionResponse, AuthorizationResult};

/// A policy as produced by a [`PolicyLoader`](crate::api::PolicyLoader).
///
/// Actions are declared with `define*`, optionally with [`ActionOptions`].
/// Declared options only take effect once the policy is booted; the
/// bouncer boots every policy exactly once, right after loading it.
///
/// Policy hooks wrap the policy's actions only and run inside the
/// bouncer-wide hooks.
pub struct Policy<U> {
    name: String,
    handlers: HashMap<String, Arc<dyn ActionHandler<U>>>,
    declared_options: Vec<(String, ActionOptions)>,
    actions_options: HashMap<String, ActionOptions>,
    before: Vec<Arc<dyn BeforeHook<U>>>,
    after: Vec<Arc<dyn AfterHook<U>>>,
    booted: bool,
}

impl<U> Policy<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
            declared_options: Vec::new(),
            actions_options: HashMap::new(),
            before: Vec::new(),
            after: Vec::new(),
            booted: false,
        }
    }

    /// Declare an action with default options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicatePolicyAction`] if `action` is already declared.
    pub fn define(
        self,
        action: impl Into<String>,
        handler: impl ActionHandler<U> + 'static,
    ) -> Result<Self, BouncerError> {
        self.define_with(action, ActionOptions::default(), handler)
    }

    /// Declare an action with explicit options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicatePolicyAction`] if `action` is already declared.
    pub fn define_with(
        mut self,
        action: impl Into<String>,
        options: ActionOptions,
        handler: impl ActionHandler<U> + 'static,
    ) -> Result<Self, BouncerError> {
        let action = action.into();
        if self.handlers.contains_key(&action) {
            return Err(BouncerError::DuplicatePolicyAction {
                policy: self.name,
                action,
            });
        }
        if options != ActionOptions::default() {
            self.declared_options.push((action.clone(), options));
        }
        self.handlers.insert(action, Arc::new(handler));
        Ok(self)
    }

    /// Declare an action backed by a synchronous closure.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicatePolicyAction`] if `action` is already declared.
    pub fn define_fn<F>(self, action: impl Into<String>, f: F) -> Result<Self, BouncerError>
    where
        F: Fn(Option<&U>, &ActionArgs) -> anyhow::Result<ActionResponse> + Send + Sync + 'static,
    {
        self.define(action, FnAction(f))
    }

    /// Declare an action backed by a synchronous closure, with options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicatePolicyAction`] if `action` is already declared.
    pub fn define_fn_with<F>(
        self,
        action: impl Into<String>,
        options: ActionOptions,
        f: F,
    ) -> Result<Self, BouncerError>
    where
        F: Fn(Option<&U>, &ActionArgs) -> anyhow::Result<ActionResponse> + Send + Sync + 'static,
    {
        self.define_with(action, options, FnAction(f))
    }

    #[must_use]
    pub fn before(mut self, hook: impl BeforeHook<U> + 'static) -> Self {
        self.before.push(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn before_fn<F>(self, f: F) -> Self
    where
        F: Fn(Option<&U>, &str, &ActionArgs) -> anyhow::Result<Option<ActionResponse>>
            + Send
            + Sync
            + 'static,
    {
        self.before(FnBeforeHook(f))
    }

    #[must_use]
    pub fn after(mut self, hook: impl AfterHook<U> + 'static) -> Self {
        self.after.push(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn after_fn<F>(self, f: F) -> Self
    where
        F: Fn(Option<&U>, &str, &AuthorizationResult, &ActionArgs) -> anyhow::Result<Option<ActionResponse>>
            + Send
            + Sync
            + 'static,
    {
        self.after(FnAfterHook(f))
    }
}

impl<U> Policy<U> {
    /// One-time boot: applies the declared per-action options.
    ///
    /// Booting an already booted policy is a no-op.
    pub fn boot(&mut self) {
        if self.booted {
            return;
        }
        for (action, options) in self.declared_options.drain(..) {
            self.actions_options.insert(action, options);
        }
        self.booted = true;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    #[must_use]
    pub fn handler(&self, action: &str) -> Option<&Arc<dyn ActionHandler<U>>> {
        self.handlers.get(action)
    }

    /// Options of `action`; defaults until the policy is booted.
    #[must_use]
    pub fn action_options(&self, action: &str) -> ActionOptions {
        self.actions_options
            .get(action)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn before_hooks(&self) -> &[Arc<dyn BeforeHook<U>>] {
        &self.before
    }

    #[must_use]
    pub fn after_hooks(&self) -> &[Arc<dyn AfterHook<U>>] {
        &self.after
    }
}

impl<U> std::fmt::Debug for Policy<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("Policy")
            .field("name", &self.name)
            .field("actions", &actions)
            .field("actions_options", &self.actions_options)
            .field("booted", &self.booted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    struct User;

    fn post_policy() -> Policy<User> {
        Policy::new("post")
            .define_fn("update", |user, _| Ok(user.is_some().into()))
            .unwrap()
            .define_fn_with(
                "view",
                ActionOptions::new().allow_guest(true),
                |_, _| Ok(ActionResponse::Allow),
            )
            .unwrap()
    }

    #[test]
    fn options_apply_only_after_boot() {
        let mut policy = post_policy();
        assert!(!policy.is_booted());
        assert!(!policy.action_options("view").allow_guest);

        policy.boot();

        assert!(policy.is_booted());
        assert!(policy.action_options("view").allow_guest);
        assert!(!policy.action_options("update").allow_guest);
    }

    #[test]
    fn second_boot_is_noop() {
        let mut policy = post_policy();
        policy.boot();
        policy.boot();

        assert!(policy.action_options("view").allow_guest);
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let err = post_policy()
            .define_fn("view", |_, _| Ok(ActionResponse::Deny))
            .unwrap_err();

        match err {
            BouncerError::DuplicatePolicyAction { policy, action } => {
                assert_eq!(policy, "post");
                assert_eq!(action, "view");
            }
            other => panic!("Expected DuplicatePolicyAction, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_has_no_handler() {
        let policy = post_policy();
        assert!(policy.handler("view").is_some());
        assert!(policy.handler("delete").is_none());
    }

    #[tokio::test]
    async fn closure_action_is_invoked() {
        let policy = post_policy();
        let handler = policy.handler("update").unwrap();

        let as_guest = handler.handle(None, &ActionArgs::new()).await.unwrap();
        let as_user = handler.handle(Some(&User), &ActionArgs::new()).await.unwrap();

        assert_eq!(as_guest, ActionResponse::Deny);
        assert_eq!(as_user, ActionResponse::Allow);
    }

    #[test]
    fn hooks_keep_registration_order() {
        let policy = post_policy()
            .before_fn(|_, _, _| Ok(None))
            .before_fn(|_, _, _| Ok(Some(ActionResponse::Deny)))
            .after_fn(|_, _, _, _| Ok(None));

        assert_eq!(policy.before_hooks().len(), 2);
        assert_eq!(policy.after_hooks().len(), 1);
    }
}
