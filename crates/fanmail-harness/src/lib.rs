//! Deterministic simulation harness for Fanmail testing.
//!
//! Seeded, virtual-clock implementation of the core `Environment`, fault
//! injection for both collaborators, and a [`World`] builder that wires
//! devices to shared in-memory services.
//!
//! Everything here is reproducible from the seed: the same test with the same
//! seed generates the same keys, identifiers and ciphertexts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod sim_env;
pub mod world;

pub use faulty::{Fault, FaultyDirectory, FaultyTransport};
pub use sim_env::{DEFAULT_START_MS, SimEnv};
pub use world::{SimDevice, SimDirectory, SimTransport, World};
