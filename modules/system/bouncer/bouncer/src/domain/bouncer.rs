//! Bouncer builder and the built, shareable bouncer.

use std::collections::HashMap;
use std::sync::Arc;

use bouncer_sdk::{
    ActionArgs, ActionHandler, ActionOptions, ActionResponse, AfterHook, AuthorizationResult,
    BeforeHook, BouncerError, FnAction, FnAfterHook, FnBeforeHook, PolicyLoader,
};
use tracing::info;

use super::authorizer::ActionsAuthorizer;
use super::hooks::HookChain;
use super::registry::{ActionRegistry, PolicyRegistry};
use super::service::Service;
use crate::config::{BouncerConfig, ConfigError};

/// Named policy loaders, handed to [`BouncerBuilder::register_policies`].
pub struct Policies<U> {
    loaders: HashMap<String, Arc<dyn PolicyLoader<U>>>,
}

impl<U> Default for Policies<U> {
    fn default() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }
}

impl<U> Policies<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` under `name`, replacing any loader of that name.
    ///
    /// The loaded policy must carry the same name; a mismatch fails the load.
    #[must_use]
    pub fn policy(mut self, name: impl Into<String>, loader: impl PolicyLoader<U> + 'static) -> Self {
        self.loaders.insert(name.into(), Arc::new(loader));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// Setup-time builder of a [`Bouncer`].
///
/// Actions are append-only: defining a name twice is an error. Policies are
/// registered as one set; a later [`register_policies`](Self::register_policies)
/// call replaces the earlier set.
///
/// ```ignore
/// let bouncer = BouncerBuilder::<User>::new()
///     .define_fn("edit-post", |user, args| {
///         let post: Post = args.parse(0)?;
///         Ok(user.is_some_and(|u| u.id == post.author_id).into())
///     })?
///     .before_fn(|user, _, _| Ok(user.filter(|u| u.is_admin).map(|_| ActionResponse::Allow)))
///     .register_policies(Policies::new().policy("post", post_policy))
///     .build();
/// ```
pub struct BouncerBuilder<U> {
    config: BouncerConfig,
    actions: ActionRegistry<U>,
    policies: HashMap<String, Arc<dyn PolicyLoader<U>>>,
    hooks: HookChain<U>,
}

impl<U> Default for BouncerBuilder<U> {
    fn default() -> Self {
        Self {
            config: BouncerConfig::default(),
            actions: ActionRegistry::default(),
            policies: HashMap::new(),
            hooks: HookChain::default(),
        }
    }
}

impl<U> BouncerBuilder<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny defaults and profiler labels come from `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDenyStatus`] if `config` fails validation.
    pub fn with_config(mut self, config: BouncerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Define an action with default options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicateAction`] if `name` is already defined.
    pub fn define(
        self,
        name: impl Into<String>,
        handler: impl ActionHandler<U> + 'static,
    ) -> Result<Self, BouncerError> {
        self.define_with(name, ActionOptions::default(), handler)
    }

    /// Define an action with explicit options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicateAction`] if `name` is already defined.
    pub fn define_with(
        mut self,
        name: impl Into<String>,
        options: ActionOptions,
        handler: impl ActionHandler<U> + 'static,
    ) -> Result<Self, BouncerError> {
        self.actions.insert(name.into(), Arc::new(handler), options)?;
        Ok(self)
    }

    /// Define an action backed by a synchronous closure.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicateAction`] if `name` is already defined.
    pub fn define_fn<F>(self, name: impl Into<String>, f: F) -> Result<Self, BouncerError>
    where
        F: Fn(Option<&U>, &ActionArgs) -> anyhow::Result<ActionResponse> + Send + Sync + 'static,
    {
        self.define(name, FnAction(f))
    }

    /// Define an action backed by a synchronous closure, with options.
    ///
    /// # Errors
    ///
    /// [`BouncerError::DuplicateAction`] if `name` is already defined.
    pub fn define_fn_with<F>(
        self,
        name: impl Into<String>,
        options: ActionOptions,
        f: F,
    ) -> Result<Self, BouncerError>
    where
        F: Fn(Option<&U>, &ActionArgs) -> anyhow::Result<ActionResponse> + Send + Sync + 'static,
    {
        self.define_with(name, options, FnAction(f))
    }

    /// Append a hook run before every evaluation, policies included.
    #[must_use]
    pub fn before(mut self, hook: impl BeforeHook<U> + 'static) -> Self {
        self.hooks.before.push(Arc::new(hook));
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

    /// Append a hook run after every evaluation, policies included.
    #[must_use]
    pub fn after(mut self, hook: impl AfterHook<U> + 'static) -> Self {
        self.hooks.after.push(Arc::new(hook));
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

    /// Replace the registered policy set.
    #[must_use]
    pub fn register_policies(mut self, policies: Policies<U>) -> Self {
        self.policies = policies.loaders;
        self
    }

    #[must_use]
    pub fn build(self) -> Bouncer<U> {
        info!(
            actions = self.actions.len(),
            policies = self.policies.len(),
            before_hooks = self.hooks.before.len(),
            after_hooks = self.hooks.after.len(),
            "Bouncer initialized"
        );
        let service = Service::new(
            self.actions,
            PolicyRegistry::new(self.policies),
            self.hooks,
            self.config.deny_defaults(),
            self.config.span_label_prefix,
        );
        Bouncer {
            service: Arc::new(service),
        }
    }
}

/// Built bouncer: immutable registries shared by all authorizers.
///
/// Cloneable and cheap to pass around (`Arc` inside).
pub struct Bouncer<U> {
    service: Arc<Service<U>>,
}

impl<U> Clone for Bouncer<U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<U> Bouncer<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub fn builder() -> BouncerBuilder<U> {
        BouncerBuilder::new()
    }

    /// Authorizer bound to `user`; pass `None` for a guest.
    #[must_use]
    pub fn for_user(&self, user: impl Into<Option<Arc<U>>>) -> ActionsAuthorizer<U> {
        ActionsAuthorizer::new(Arc::clone(&self.service), user.into())
    }

    #[must_use]
    pub fn for_guest(&self) -> ActionsAuthorizer<U> {
        self.for_user(None)
    }

    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.service.actions().contains(name)
    }

    #[must_use]
    pub fn has_policy(&self, name: &str) -> bool {
        self.service.policies().contains(name)
    }

    /// Defined action names, in definition order.
    #[must_use]
    pub fn action_names(&self) -> &[String] {
        self.service.actions().names()
    }
}

impl<U> std::fmt::Debug for Bouncer<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bouncer")
            .field("actions", &self.service.actions().names())
            .field("policies", &self.service.policies().len())
            .finish_non_exhaustive()
    }
}
