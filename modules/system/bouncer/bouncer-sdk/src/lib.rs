#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Bouncer SDK
//!
//! This crate provides the public contracts of the `bouncer` module:
//!
//! - [`ActionHandler`], [`BeforeHook`], [`AfterHook`] - Traits for actions and hooks
//! - [`PolicyLoader`], [`Policy`] - Lazily loaded bundles of actions
//! - [`ActionResponse`], [`deny`] - Raw answers of actions and hooks
//! - [`AuthorizationResult`] - Normalized verdict
//! - [`ActionArgs`] - Positional arguments forwarded to actions
//! - [`Profiler`], [`ProfilerSpan`] - Optional span recording around evaluations
//! - [`BouncerError`], [`AuthorizationError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use bouncer_sdk::{ActionArgs, ActionOptions, ActionResponse, Policy, deny};
//!
//! async fn post_policy() -> anyhow::Result<Policy<User>> {
//!     let policy = Policy::new("post")
//!         .define_fn_with("view", ActionOptions::new().allow_guest(true), |_, args| {
//!             let post: Post = args.parse(0)?;
//!             Ok(post.published.into())
//!         })?
//!         .define_fn("delete", |user, args| {
//!             let post: Post = args.parse(0)?;
//!             if post.locked {
//!                 return Ok(deny("Post is locked", 423));
//!             }
//!             Ok(user.is_some_and(|u| u.id == post.author_id).into())
//!         })?;
//!     Ok(policy)
//! }
//! ```

pub mod api;
pub mod args;
pub mod error;
pub mod models;
pub mod policy;

// Re-export main types at crate root
pub use api::{
    ActionHandler, AfterHook, BeforeHook, FnAction, FnAfterHook, FnBeforeHook, PolicyLoader,
    Profiler, ProfilerSpan,
};
pub use args::{ActionArgs, IntoArgValue};
pub use error::{ArgumentError, AuthorizationError, BouncerError};
pub use models::{
    ActionOptions, ActionResponse, AuthorizationResult, DEFAULT_DENY_MESSAGE, DEFAULT_DENY_STATUS,
    DenyDefaults, ErrorResponse, deny,
};
pub use policy::Policy;
