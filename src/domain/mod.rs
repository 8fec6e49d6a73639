// Domain layer - Plain data, no I/O
pub mod filters;
pub mod metrics;
pub mod transaction;
