//! Continuous synthetic data generation for a simulated oceanographic sensor fleet.
//!
//! A `FleetCoordinator` seeds the base catalog once, then spawns one
//! `EmissionTask` per sensor. Each task writes a reading with a depth-weighted
//! temperature, a jittered transparency and a random set of detected species,
//! sleeps for the sensor's output interval and repeats until cancelled.

pub mod aggregates;
pub mod cache;
pub mod error;
pub mod generation;
pub mod logger;
pub mod memory;
pub mod random;
pub mod repository;
pub mod sampler;
pub mod seed;
