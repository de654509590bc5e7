//! microcirc-core: Core types and geometric queries for reconstructed
//! cortical microcircuits.
//!
//! This crate provides the in-memory data model (raw morphology arrays,
//! the fully-indexed [`Morphology`], neuron placements, synapse batches)
//! and the index builder that derives section adjacency, branch order,
//! cable lengths, and bounding extents from flat point/structure tables.

pub mod builder;
pub mod circuit;
pub mod error;
pub mod geometry;
pub mod morphology;
pub mod raw;
pub mod section;
pub mod synapse;

pub use builder::build_morphology;
pub use circuit::{Circuit, Gid, NeuronPlacement};
pub use error::{Error, Result};
pub use geometry::{BoundingBox, Point3};
pub use morphology::{Morphology, Segment};
pub use raw::RawMorphology;
pub use section::{SectionId, SectionType, MAX_SECTION_CHILDREN, SOMA_SECTION};
pub use synapse::{SynapseAttributeSelection, SynapseBatch};
