pub mod compare;
pub mod liveness;
pub mod readiness;
