pub mod builder;
pub mod coordinator;
pub mod emission;
pub mod metrics;
