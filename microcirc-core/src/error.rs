//! Error types for microcirc-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for morphology and circuit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Section start offsets must be non-decreasing.
    #[error("section {section} starts at point {start}, before section {previous}")]
    NonMonotonicStarts {
        section: usize,
        previous: usize,
        start: u32,
    },

    /// A section resolved to zero points.
    #[error("section {0} has no points")]
    EmptySection(usize),

    /// A section references a parent outside the section table.
    #[error("section {section} references invalid parent {parent}")]
    InvalidParent { section: usize, parent: u32 },

    /// Only the soma (section 0) may be parentless.
    #[error("section {0} has no parent but is not the soma")]
    MissingParent(usize),

    /// The section table is not grouped soma-first, axon-second.
    #[error("unexpected section type layout: {0}")]
    TypeLayout(String),

    /// A section exceeded the hard per-section child limit of the format.
    #[error("section {section} has more than {limit} children")]
    TooManyChildren { section: usize, limit: usize },

    /// A section was not reachable from the soma during traversal.
    #[error("section {0} is not reachable from the soma")]
    UnreachableSection(usize),

    /// The point table and section table disagree.
    #[error("point count {points} inconsistent with section starts (max start {max_start})")]
    PointCountMismatch { points: usize, max_start: u32 },

    /// Query for a section id outside the morphology.
    #[error("section {section} out of range (morphology has {count} sections)")]
    SectionOutOfRange { section: u32, count: usize },

    /// The soma has no parent; callers must special-case section 0.
    #[error("soma has no parent section")]
    SomaHasNoParent,

    /// Query for a cell GID absent from the circuit.
    #[error("neuron with GID {0} not found in circuit")]
    NeuronNotFound(u32),

    /// Query for a morphology label that has not been loaded.
    #[error("morphology '{0}' not loaded")]
    MorphologyNotFound(String),
}
