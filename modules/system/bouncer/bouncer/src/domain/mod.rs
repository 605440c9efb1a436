//! Domain layer for the bouncer.

pub mod authorizer;
pub mod bouncer;
pub mod hooks;
pub mod registry;
pub mod service;
pub mod slot;

pub use authorizer::{ActionsAuthorizer, PolicyAuthorizer};
pub use bouncer::{Bouncer, BouncerBuilder, Policies};
pub use service::Service;
