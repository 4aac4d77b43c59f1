//! Binary-side wiring: config layering, tracing setup and the fetch run.

pub(crate) mod config_runtime;
pub(crate) mod runtime;
pub(crate) mod terminal;
