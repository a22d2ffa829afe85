//! Declarative timeline model and its validator.

pub(crate) mod model;
pub(crate) mod validate;
