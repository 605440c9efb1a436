//! Per-user authorizers.
//!
//! [`ActionsAuthorizer`] evaluates globally defined actions;
//! [`PolicyAuthorizer`] evaluates the actions of one policy. Both are cheap
//! to create and clone, and never change the user they were created for.

use std::sync::Arc;

use bouncer_sdk::{ActionArgs, AuthorizationError, AuthorizationResult, BouncerError, Profiler};
use tracing::Instrument;

use super::service::Service;

/// State shared by both authorizer flavours.
struct Context<U> {
    service: Arc<Service<U>>,
    user: Option<Arc<U>>,
    profiler: Option<Arc<dyn Profiler>>,
}

impl<U> Clone for Context<U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            user: self.user.clone(),
            profiler: self.profiler.clone(),
        }
    }
}

impl<U> Context<U>
where
    U: Send + Sync + 'static,
{
    fn for_user(&self, user: Option<Arc<U>>) -> Self {
        Self {
            service: Arc::clone(&self.service),
            user,
            profiler: self.profiler.clone(),
        }
    }

    async fn evaluate(
        &self,
        policy: Option<&str>,
        action: &str,
        args: &ActionArgs,
    ) -> Result<AuthorizationResult, BouncerError> {
        let span = self
            .profiler
            .as_ref()
            .map(|p| p.create(&self.service.span_label(action)));

        let evaluation = self
            .service
            .evaluate(self.user.as_deref(), policy, action, args);
        let result = match span.as_ref().and_then(|s| s.tracing_span()) {
            Some(parent) => evaluation.instrument(parent).await,
            None => evaluation.await,
        };

        if let Some(span) = span {
            span.end();
        }
        result
    }

    async fn authorize(
        &self,
        policy: Option<&str>,
        action: &str,
        args: &ActionArgs,
    ) -> Result<(), BouncerError> {
        let result = self.evaluate(policy, action, args).await?;
        match AuthorizationError::from_result(&result) {
            None => Ok(()),
            Some(e) => Err(BouncerError::Unauthorized(e)),
        }
    }
}

/// Authorizer for globally defined actions, bound to one user.
///
/// ```ignore
/// let authorizer = bouncer.for_user(Arc::new(user));
///
/// if authorizer.allows("edit-post", &ActionArgs::new().serialized(&post)?).await? {
///     // ...
/// }
///
/// // Fails with `BouncerError::Unauthorized` on deny
/// authorizer.authorize("edit-post", &args).await?;
///
/// // Policy-scoped
/// authorizer.with_policy("post").authorize("delete", &args).await?;
/// ```
pub struct ActionsAuthorizer<U> {
    ctx: Context<U>,
}

impl<U> Clone for ActionsAuthorizer<U> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<U> ActionsAuthorizer<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub(crate) fn new(service: Arc<Service<U>>, user: Option<Arc<U>>) -> Self {
        Self {
            ctx: Context {
                service,
                user,
                profiler: None,
            },
        }
    }

    /// The user this authorizer evaluates for; `None` for a guest.
    #[must_use]
    pub fn user(&self) -> Option<&U> {
        self.ctx.user.as_deref()
    }

    /// New authorizer for another user, sharing the registries and profiler.
    #[must_use]
    pub fn for_user(&self, user: impl Into<Option<Arc<U>>>) -> Self {
        Self {
            ctx: self.ctx.for_user(user.into()),
        }
    }

    /// New authorizer resolving actions against the policy registered as
    /// `policy`. The policy is loaded on first evaluation.
    #[must_use]
    pub fn with_policy(&self, policy: impl Into<String>) -> PolicyAuthorizer<U> {
        PolicyAuthorizer {
            ctx: self.ctx.clone(),
            policy: policy.into(),
        }
    }

    /// Wrap every following evaluation in a profiler span.
    pub fn set_profiler(&mut self, profiler: Arc<dyn Profiler>) {
        self.ctx.profiler = Some(profiler);
    }

    /// Evaluate `action` and return the verdict itself.
    ///
    /// # Errors
    ///
    /// - [`BouncerError::ActionNotFound`] if `action` is not defined
    /// - [`BouncerError::Handler`] if a hook or the handler fails
    pub async fn evaluate(
        &self,
        action: &str,
        args: &ActionArgs,
    ) -> Result<AuthorizationResult, BouncerError> {
        self.ctx.evaluate(None, action, args).await
    }

    /// `true` if the user may perform `action`.
    ///
    /// # Errors
    ///
    /// Same as [`ActionsAuthorizer::evaluate`]; a deny is `Ok(false)`.
    pub async fn allows(&self, action: &str, args: &ActionArgs) -> Result<bool, BouncerError> {
        Ok(self.evaluate(action, args).await?.authorized())
    }

    /// `true` if the user may not perform `action`.
    ///
    /// # Errors
    ///
    /// Same as [`ActionsAuthorizer::evaluate`]; a deny is `Ok(true)`.
    pub async fn denies(&self, action: &str, args: &ActionArgs) -> Result<bool, BouncerError> {
        Ok(!self.evaluate(action, args).await?.authorized())
    }

    /// Succeeds only if the user may perform `action`.
    ///
    /// # Errors
    ///
    /// - [`BouncerError::Unauthorized`] with the deny message and status
    /// - everything [`ActionsAuthorizer::evaluate`] fails with
    pub async fn authorize(&self, action: &str, args: &ActionArgs) -> Result<(), BouncerError> {
        self.ctx.authorize(None, action, args).await
    }
}

impl<U> std::fmt::Debug for ActionsAuthorizer<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionsAuthorizer")
            .field("guest", &self.ctx.user.is_none())
            .field("profiled", &self.ctx.profiler.is_some())
            .finish_non_exhaustive()
    }
}

/// Authorizer for the actions of one policy, bound to one user.
pub struct PolicyAuthorizer<U> {
    ctx: Context<U>,
    policy: String,
}

impl<U> Clone for PolicyAuthorizer<U> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<U> PolicyAuthorizer<U>
where
    U: Send + Sync + 'static,
{
    #[must_use]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    #[must_use]
    pub fn user(&self) -> Option<&U> {
        self.ctx.user.as_deref()
    }

    /// New authorizer for another user, same policy and profiler.
    #[must_use]
    pub fn for_user(&self, user: impl Into<Option<Arc<U>>>) -> Self {
        Self {
            ctx: self.ctx.for_user(user.into()),
            policy: self.policy.clone(),
        }
    }

    /// Switch to another policy, same user and profiler.
    #[must_use]
    pub fn with_policy(&self, policy: impl Into<String>) -> Self {
        Self {
            ctx: self.ctx.clone(),
            policy: policy.into(),
        }
    }

    pub fn set_profiler(&mut self, profiler: Arc<dyn Profiler>) {
        self.ctx.profiler = Some(profiler);
    }

    /// Evaluate the policy action and return the verdict itself.
    ///
    /// # Errors
    ///
    /// - [`BouncerError::PolicyNotFound`] if the policy is not registered
    /// - [`BouncerError::PolicyLoad`] if the policy fails to load
    /// - [`BouncerError::PolicyActionNotFound`] if the policy lacks `action`
    /// - [`BouncerError::Handler`] if a hook or the handler fails
    pub async fn evaluate(
        &self,
        action: &str,
        args: &ActionArgs,
    ) -> Result<AuthorizationResult, BouncerError> {
        self.ctx.evaluate(Some(&self.policy), action, args).await
    }

    /// # Errors
    ///
    /// Same as [`PolicyAuthorizer::evaluate`]; a deny is `Ok(false)`.
    pub async fn allows(&self, action: &str, args: &ActionArgs) -> Result<bool, BouncerError> {
        Ok(self.evaluate(action, args).await?.authorized())
    }

    /// # Errors
    ///
    /// Same as [`PolicyAuthorizer::evaluate`]; a deny is `Ok(true)`.
    pub async fn denies(&self, action: &str, args: &ActionArgs) -> Result<bool, BouncerError> {
        Ok(!self.evaluate(action, args).await?.authorized())
    }

    /// # Errors
    ///
    /// - [`BouncerError::Unauthorized`] with the deny message and status
    /// - everything [`PolicyAuthorizer::evaluate`] fails with
    pub async fn authorize(&self, action: &str, args: &ActionArgs) -> Result<(), BouncerError> {
        self.ctx.authorize(Some(&self.policy), action, args).await
    }
}

impl<U> std::fmt::Debug for PolicyAuthorizer<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyAuthorizer")
            .field("policy", &self.policy)
            .field("guest", &self.ctx.user.is_none())
            .field("profiled", &self.ctx.profiler.is_some())
            .finish_non_exhaustive()
    }
}
