pub mod backoff;
pub mod compare;
pub mod config;
pub mod control;
pub mod host_identity;
pub mod logging;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod sink;
