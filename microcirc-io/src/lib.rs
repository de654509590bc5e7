//! microcirc-io: File parsing for cortical microcircuit data.
//!
//! This crate reads the on-disk formats into the in-memory model of
//! `microcirc-core`: HDF5 morphology files (two schema versions), the
//! line-oriented circuit composition file, and per-neuron HDF5 synapse
//! attribute tables. A label-keyed store shares built morphologies across
//! every neuron that references the same reconstruction.

mod circuit;
mod config;
mod error;
mod morphology;
mod store;
mod synapse;

pub use circuit::{read_circuit, read_circuit_file, GidSelection};
pub use config::{LoaderConfig, MorphologyFormat, RepairStage, Verbosity};
pub use error::{Error, Result};
pub use morphology::read_morphology;
pub use store::MorphologyStore;
pub use synapse::{SynapseFilter, SynapseReader};
