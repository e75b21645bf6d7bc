//! Core traits shared by activators.

pub mod resolver;

pub use resolver::{ServiceResolver, ServiceResolverExt};
