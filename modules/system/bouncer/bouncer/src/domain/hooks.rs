//! Before/after hook chain.

use std::sync::Arc;

use bouncer_sdk::{
    ActionArgs, ActionResponse, AfterHook, AuthorizationResult, BeforeHook, BouncerError,
    DenyDefaults,
};
use tracing::debug;

/// Bouncer-wide hooks, in registration order.
pub struct HookChain<U> {
    pub before: Vec<Arc<dyn BeforeHook<U>>>,
    pub after: Vec<Arc<dyn AfterHook<U>>>,
}

impl<U> Default for HookChain<U> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

/// Runs `hooks` in order until one answers.
///
/// # Errors
///
/// [`BouncerError::Handler`] with the error of the first failing hook.
pub async fn run_before<U: Sync>(
    hooks: &[Arc<dyn BeforeHook<U>>],
    user: Option<&U>,
    action: &str,
    args: &ActionArgs,
) -> Result<Option<ActionResponse>, BouncerError> {
    for (position, hook) in hooks.iter().enumerate() {
        if let Some(response) = hook
            .before(user, action, args)
            .await
            .map_err(BouncerError::Handler)?
        {
            debug!(position, "before hook short-circuited evaluation");
            return Ok(Some(response));
        }
    }
    Ok(None)
}

/// Runs every hook in order; each answer replaces the verdict seen by the
/// next hook, so the last answering hook decides.
///
/// # Errors
///
/// [`BouncerError::Handler`] with the error of the first failing hook.
pub async fn run_after<U: Sync>(
    hooks: &[Arc<dyn AfterHook<U>>],
    user: Option<&U>,
    action: &str,
    mut result: AuthorizationResult,
    args: &ActionArgs,
    defaults: &DenyDefaults,
) -> Result<AuthorizationResult, BouncerError> {
    for (position, hook) in hooks.iter().enumerate() {
        if let Some(response) = hook
            .after(user, action, &result, args)
            .await
            .map_err(BouncerError::Handler)?
        {
            debug!(position, "after hook overrode verdict");
            result = AuthorizationResult::from_response(response, defaults);
        }
    }
    Ok(result)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Mutex;

    use bouncer_sdk::{FnAfterHook, FnBeforeHook, deny};

    use super::*;

    struct User;

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    fn before(
        calls: &Calls,
        name: &'static str,
        answer: Option<ActionResponse>,
    ) -> Arc<dyn BeforeHook<User>> {
        let calls = Arc::clone(calls);
        Arc::new(FnBeforeHook(
            move |_: Option<&User>, _: &str, _: &ActionArgs| {
                calls.lock().unwrap().push(name);
                Ok::<_, anyhow::Error>(answer.clone())
            },
        ))
    }

    #[tokio::test]
    async fn first_answering_before_hook_wins() {
        let calls = Calls::default();
        let hooks = vec![
            before(&calls, "a", None),
            before(&calls, "b", Some(deny("blocked", 451))),
            before(&calls, "c", Some(ActionResponse::Allow)),
        ];

        let answer = run_before(&hooks, None, "edit", &ActionArgs::new())
            .await
            .unwrap();

        assert_eq!(answer, Some(deny("blocked", 451)));
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn silent_before_hooks_do_not_answer() {
        let calls = Calls::default();
        let hooks = vec![before(&calls, "a", None), before(&calls, "b", None)];

        let answer = run_before(&hooks, Some(&User), "edit", &ActionArgs::new())
            .await
            .unwrap();

        assert!(answer.is_none());
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn after_hooks_see_previous_override() {
        let seen: Arc<Mutex<Vec<bool>>> = Arc::default();
        let seen_a = Arc::clone(&seen);
        let seen_b = Arc::clone(&seen);
        let hooks: Vec<Arc<dyn AfterHook<User>>> = vec![
            Arc::new(FnAfterHook(
                move |_: Option<&User>, _: &str, result: &AuthorizationResult, _: &ActionArgs| {
                    seen_a.lock().unwrap().push(result.authorized());
                    Ok::<_, anyhow::Error>(Some(ActionResponse::Deny))
                },
            )),
            Arc::new(FnAfterHook(
                move |_: Option<&User>, _: &str, result: &AuthorizationResult, _: &ActionArgs| {
                    seen_b.lock().unwrap().push(result.authorized());
                    Ok::<_, anyhow::Error>(Some(deny("second", 401)))
                },
            )),
        ];

        let result = run_after(
            &hooks,
            None,
            "edit",
            AuthorizationResult::allowed(),
            &ActionArgs::new(),
            &DenyDefaults::default(),
        )
        .await
        .unwrap();

        assert_eq!(result, AuthorizationResult::denied("second", 401));
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn failing_hook_propagates_error() {
        let hooks: Vec<Arc<dyn BeforeHook<User>>> = vec![Arc::new(FnBeforeHook(
            |_: Option<&User>, _: &str, _: &ActionArgs| {
                Err::<Option<ActionResponse>, _>(anyhow::anyhow!("hook exploded"))
            },
        ))];

        let err = run_before(&hooks, None, "edit", &ActionArgs::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BouncerError::Handler(ref e) if e.to_string() == "hook exploded"));
    }
}
