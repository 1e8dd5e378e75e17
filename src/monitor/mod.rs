//! Unit monitoring: status probing against the service manager and the
//! pure transition-classification policy.

pub mod probe;
pub mod transition;
