//! Evaluation service shared by every authorizer of one bouncer.

use std::sync::Arc;

use bouncer_sdk::{
    ActionArgs, ActionHandler, ActionOptions, ActionResponse, AfterHook, AuthorizationResult,
    BeforeHook, BouncerError, DenyDefaults,
};
use tracing::debug;

use super::hooks::{HookChain, run_after, run_before};
use super::registry::{ActionRegistry, PolicyRegistry};

/// Resolved evaluation target: the handler, its options and the
/// policy-level hooks wrapping it (empty for global actions).
struct Target<'a, U> {
    handler: &'a Arc<dyn ActionHandler<U>>,
    options: ActionOptions,
    before: &'a [Arc<dyn BeforeHook<U>>],
    after: &'a [Arc<dyn AfterHook<U>>],
}

/// Registries and settings fixed when the bouncer is built.
pub struct Service<U> {
    actions: ActionRegistry<U>,
    policies: PolicyRegistry<U>,
    hooks: HookChain<U>,
    defaults: DenyDefaults,
    span_label_prefix: String,
}

impl<U> Service<U> {
    #[must_use]
    pub fn new(
        actions: ActionRegistry<U>,
        policies: PolicyRegistry<U>,
        hooks: HookChain<U>,
        defaults: DenyDefaults,
        span_label_prefix: String,
    ) -> Self {
        Self {
            actions,
            policies,
            hooks,
            defaults,
            span_label_prefix,
        }
    }

    #[must_use]
    pub fn actions(&self) -> &ActionRegistry<U> {
        &self.actions
    }

    #[must_use]
    pub fn policies(&self) -> &PolicyRegistry<U> {
        &self.policies
    }

    #[must_use]
    pub fn span_label(&self, action: &str) -> String {
        format!("{} {action}", self.span_label_prefix)
    }
}

impl<U> Service<U>
where
    U: Send + Sync + 'static,
{
    /// Evaluate `action` for `user`, against the global actions or, when
    /// `policy` is given, against that policy's actions.
    ///
    /// # Errors
    ///
    /// - [`BouncerError::ActionNotFound`] / [`BouncerError::PolicyActionNotFound`]
    ///   if the action is not defined in the active action set
    /// - [`BouncerError::PolicyNotFound`] / [`BouncerError::PolicyLoad`] if the
    ///   policy cannot be resolved
    /// - [`BouncerError::Handler`] if a hook or the handler fails
    #[tracing::instrument(skip_all, fields(action = %action, policy = policy.unwrap_or("-"), guest = user.is_none()))]
    pub async fn evaluate(
        &self,
        user: Option<&U>,
        policy: Option<&str>,
        action: &str,
        args: &ActionArgs,
    ) -> Result<AuthorizationResult, BouncerError> {
        let result = if let Some(policy_name) = policy {
            let policy = self.policies.resolve(policy_name).await?;
            let handler = policy.handler(action).ok_or_else(|| {
                BouncerError::PolicyActionNotFound {
                    policy: policy_name.to_owned(),
                    action: action.to_owned(),
                }
            })?;
            let target = Target {
                handler,
                options: policy.action_options(action),
                before: policy.before_hooks(),
                after: policy.after_hooks(),
            };
            self.run(user, action, args, target).await?
        } else {
            let registered = self
                .actions
                .get(action)
                .ok_or_else(|| BouncerError::ActionNotFound(action.to_owned()))?;
            let target = Target {
                handler: &registered.handler,
                options: registered.options,
                before: &[],
                after: &[],
            };
            self.run(user, action, args, target).await?
        };

        debug!(authorized = result.authorized(), "authorization verdict");
        Ok(result)
    }

    /// Global before-hooks, policy before-hooks, guest check or handler,
    /// policy after-hooks, global after-hooks.
    async fn run(
        &self,
        user: Option<&U>,
        action: &str,
        args: &ActionArgs,
        target: Target<'_, U>,
    ) -> Result<AuthorizationResult, BouncerError> {
        let mut short_circuit = run_before(&self.hooks.before, user, action, args).await?;
        if short_circuit.is_none() {
            short_circuit = run_before(target.before, user, action, args).await?;
        }

        let response = match short_circuit {
            Some(response) => response,
            None if user.is_none() && !target.options.allow_guest => {
                debug!("guest is not allowed, handler skipped");
                ActionResponse::Deny
            }
            None => target
                .handler
                .handle(user, args)
                .await
                .map_err(BouncerError::Handler)?,
        };

        let result = AuthorizationResult::from_response(response, &self.defaults);
        let result = run_after(target.after, user, action, result, args, &self.defaults).await?;
        run_after(&self.hooks.after, user, action, result, args, &self.defaults).await
    }
}
