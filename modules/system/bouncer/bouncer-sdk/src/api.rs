//! Contracts implemented by action handlers, hooks, policy loaders and
//! profilers.
//!
//! `U` is the user type of the bouncer. Every handler receives
//! `Option<&U>`: `None` means the request is not authenticated.

use std::future::Future;

use async_trait::async_trait;

use crate::args::ActionArgs;
use crate::models::{ActionResponse, AuthorizationResult};
use crate::policy::Policy;

/// Authorization predicate behind a named action.
///
/// ```ignore
/// struct EditPost;
///
/// #[async_trait]
/// impl ActionHandler<User> for EditPost {
///     async fn handle(&self, user: Option<&User>, args: &ActionArgs) -> anyhow::Result<ActionResponse> {
///         let post: Post = args.parse(0)?;
///         Ok(user.is_some_and(|u| u.id == post.author_id).into())
///     }
/// }
/// ```
#[async_trait]
pub trait ActionHandler<U>: Send + Sync {
    /// Decide whether `user` may perform the action.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller of the authorizer unchanged.
    async fn handle(&self, user: Option<&U>, args: &ActionArgs) -> anyhow::Result<ActionResponse>;
}

/// Interceptor run before the action handler.
///
/// Returning `Some(response)` short-circuits: the remaining before-hooks
/// and the handler are skipped and `response` becomes the verdict.
#[async_trait]
pub trait BeforeHook<U>: Send + Sync {
    /// # Errors
    ///
    /// Any error is returned to the caller of the authorizer unchanged.
    async fn before(
        &self,
        user: Option<&U>,
        action: &str,
        args: &ActionArgs,
    ) -> anyhow::Result<Option<ActionResponse>>;
}

/// Interceptor run after the verdict is computed.
///
/// Returning `Some(response)` replaces the verdict seen by later hooks and
/// by the caller.
#[async_trait]
pub trait AfterHook<U>: Send + Sync {
    /// # Errors
    ///
    /// Any error is returned to the caller of the authorizer unchanged.
    async fn after(
        &self,
        user: Option<&U>,
        action: &str,
        result: &AuthorizationResult,
        args: &ActionArgs,
    ) -> anyhow::Result<Option<ActionResponse>>;
}

/// Lazy source of a [`Policy`].
///
/// Invoked at most once per registered policy name; plain async functions
/// returning `anyhow::Result<Policy<U>>` implement it directly:
///
/// ```ignore
/// async fn post_policy() -> anyhow::Result<Policy<User>> {
///     Ok(Policy::new("post").define_fn("view", |_, _| Ok(true.into()))?)
/// }
///
/// let policies = Policies::new().policy("post", post_policy);
/// ```
#[async_trait]
pub trait PolicyLoader<U>: Send + Sync {
    /// # Errors
    ///
    /// Returns whatever prevented the policy from being built.
    async fn load(&self) -> anyhow::Result<Policy<U>>;
}

#[async_trait]
impl<U, F, Fut> PolicyLoader<U> for F
where
    U: 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Policy<U>>> + Send + 'static,
{
    async fn load(&self) -> anyhow::Result<Policy<U>> {
        (self)().await
    }
}

/// Optional span recorder wrapped around each evaluation.
///
/// Used for observability only; it never influences a verdict.
pub trait Profiler: Send + Sync {
    fn create(&self, label: &str) -> Box<dyn ProfilerSpan>;
}

/// Span returned by [`Profiler::create`].
pub trait ProfilerSpan: Send {
    fn end(self: Box<Self>);

    /// `tracing` span the evaluation runs inside while this span is open.
    /// `None` leaves the evaluation under the caller's current span.
    fn tracing_span(&self) -> Option<tracing::Span> {
        None
    }
}

/// [`ActionHandler`] backed by a synchronous closure.
pub struct FnAction<F>(pub F);

#[async_trait]
impl<U, F> ActionHandler<U> for FnAction<F>
where
    U: Sync,
    F: Fn(Option<&U>, &ActionArgs) -> anyhow::Result<ActionResponse> + Send + Sync,
{
    async fn handle(&self, user: Option<&U>, args: &ActionArgs) -> anyhow::Result<ActionResponse> {
        (self.0)(user, args)
    }
}

/// [`BeforeHook`] backed by a synchronous closure.
pub struct FnBeforeHook<F>(pub F);

#[async_trait]
impl<U, F> BeforeHook<U> for FnBeforeHook<F>
where
    U: Sync,
    F: Fn(Option<&U>, &str, &ActionArgs) -> anyhow::Result<Option<ActionResponse>> + Send + Sync,
{
    async fn before(
        &self,
        user: Option<&U>,
        action: &str,
        args: &ActionArgs,
    ) -> anyhow::Result<Option<ActionResponse>> {
        (self.0)(user, action, args)
    }
}

/// [`AfterHook`] backed by a synchronous closure.
pub struct FnAfterHook<F>(pub F);

#[async_trait]
impl<U, F> AfterHook<U> for FnAfterHook<F>
where
    U: Sync,
    F: Fn(Option<&U>, &str, &AuthorizationResult, &ActionArgs) -> anyhow::Result<Option<ActionResponse>>
        + Send
        + Sync,
{
    async fn after(
        &self,
        user: Option<&U>,
        action: &str,
        result: &AuthorizationResult,
        args: &ActionArgs,
    ) -> anyhow::Result<Option<ActionResponse>> {
        (self.0)(user, action, result, args)
    }
}
