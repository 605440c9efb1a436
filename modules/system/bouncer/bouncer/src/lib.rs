//! Bouncer Module
//!
//! Holds named authorization actions, lazily loaded policies and
//! before/after hooks, and evaluates them per user through
//! [`ActionsAuthorizer`] and [`PolicyAuthorizer`].
//!
//! The contracts implemented by actions, hooks, policy loaders and
//! profilers live in `bouncer_sdk`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod profiler;

pub use config::{BouncerConfig, ConfigError};
pub use domain::{ActionsAuthorizer, Bouncer, BouncerBuilder, Policies, PolicyAuthorizer};
pub use profiler::TracingProfiler;
