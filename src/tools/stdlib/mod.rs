//! Standard library natives

pub mod compiler_eval;
pub mod control_flow;
pub mod io_basic;
pub mod numeric;
pub mod sequences;
pub mod strings;
pub mod type_predicates;

use crate::tools::Registry;

/// Register every standard library native
pub fn register_all(registry: &mut Registry<'_>) {
    type_predicates::register(registry);
    numeric::register(registry);
    sequences::register(registry);
    strings::register(registry);
    control_flow::register(registry);
    compiler_eval::register(registry);
    io_basic::register(registry);

    tracing::debug!(count = registry.registered().len(), "standard library registered");
}
