pub mod breaker;
pub mod config;
pub mod diagnostics;
pub mod metrics;
pub mod observers;
pub mod regions;
pub mod render;
pub mod scheduler;
