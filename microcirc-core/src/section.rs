//! Section types and structural constants of the morphology format.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a section within a morphology.
pub type SectionId = u32;

/// The soma is always section 0.
pub const SOMA_SECTION: SectionId = 0;

/// Hard structural limit of the morphology format: a section may branch
/// into at most this many child sections.
pub const MAX_SECTION_CHILDREN: usize = 4;

/// Classification of a morphology section.
///
/// Raw files carry a small integer code per section; codes outside the
/// known range map to [`SectionType::Undefined`] so that files written by
/// newer tools still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SectionType {
    Soma,
    Axon,
    Dendrite,
    ApicalDendrite,
    Undefined,
}

impl SectionType {
    /// Maps a raw file type code to a section type.
    #[must_use]
    pub fn from_raw_code(code: i64) -> Self {
        match code {
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::Dendrite,
            4 => Self::ApicalDendrite,
            _ => Self::Undefined,
        }
    }

    /// True for basal or apical dendrites.
    #[must_use]
    pub fn is_dendrite(self) -> bool {
        matches!(self, Self::Dendrite | Self::ApicalDendrite)
    }
}
