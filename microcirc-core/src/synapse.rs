//! Structure-of-arrays synapse attribute storage.
//!
//! Synapses are not objects: the circuit holds one [`SynapseBatch`] of
//! parallel vectors indexed by a dense synapse index. Loaders fill only the
//! columns the caller asked for; arrays for unrequested attributes stay
//! zero-length.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selects which attribute columns a loader populates.
///
/// Every populated array ends up with the dataset length; deselected
/// attributes cost no memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SynapseAttributeSelection {
    /// Pre/post GIDs, sections, and segments.
    pub include_connectivity: bool,
    /// Segment-relative distances of both endpoints.
    pub include_positions: bool,
    /// Synapse type codes.
    pub include_types: bool,
    /// Peak conductance.
    pub include_conductance: bool,
    /// Release dynamics: utilization, depression, facilitation, decay.
    pub include_dynamics: bool,
    /// Axonal delay.
    pub include_delay: bool,
}

impl SynapseAttributeSelection {
    /// Selects every attribute.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_connectivity: true,
            include_positions: true,
            include_types: true,
            include_conductance: true,
            include_dynamics: true,
            include_delay: true,
        }
    }

    /// Selects only the connectivity columns.
    #[must_use]
    pub fn connectivity_only() -> Self {
        Self {
            include_connectivity: true,
            include_positions: false,
            include_types: false,
            include_conductance: false,
            include_dynamics: false,
            include_delay: false,
        }
    }
}

impl Default for SynapseAttributeSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// A batch of synapses in structure-of-arrays layout.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseBatch {
    /// Presynaptic cell GIDs.
    pub pre_gid: Vec<u32>,
    /// Postsynaptic cell GIDs.
    pub post_gid: Vec<u32>,
    /// Presynaptic section ids.
    pub pre_section: Vec<u32>,
    /// Presynaptic segment ids.
    pub pre_segment: Vec<u32>,
    /// Postsynaptic section ids.
    pub post_section: Vec<u32>,
    /// Postsynaptic segment ids.
    pub post_segment: Vec<u32>,
    /// Segment-relative distance of the presynaptic endpoint.
    pub pre_distance: Vec<f64>,
    /// Segment-relative distance of the postsynaptic endpoint.
    pub post_distance: Vec<f64>,
    /// Synapse type codes.
    pub type_code: Vec<i32>,
    /// Peak conductance (nS).
    pub conductance: Vec<f64>,
    /// Release utilization.
    pub utilization: Vec<f64>,
    /// Depression time constant (ms).
    pub depression: Vec<f64>,
    /// Facilitation time constant (ms).
    pub facilitation: Vec<f64>,
    /// Decay time constant (ms).
    pub decay: Vec<f64>,
    /// Axonal delay (ms).
    pub delay: Vec<f64>,
}

impl SynapseBatch {
    /// Creates an empty batch reserving `capacity` in the arrays named by
    /// the selection.
    #[must_use]
    pub fn with_capacity(capacity: usize, selection: &SynapseAttributeSelection) -> Self {
        let mut batch = Self::default();
        batch.reserve(capacity, selection);
        batch
    }

    /// Reserves room in the arrays named by the selection.
    pub fn reserve(&mut self, additional: usize, selection: &SynapseAttributeSelection) {
        if selection.include_connectivity {
            self.pre_gid.reserve(additional);
            self.post_gid.reserve(additional);
            self.pre_section.reserve(additional);
            self.pre_segment.reserve(additional);
            self.post_section.reserve(additional);
            self.post_segment.reserve(additional);
        }
        if selection.include_positions {
            self.pre_distance.reserve(additional);
            self.post_distance.reserve(additional);
        }
        if selection.include_types {
            self.type_code.reserve(additional);
        }
        if selection.include_conductance {
            self.conductance.reserve(additional);
        }
        if selection.include_dynamics {
            self.utilization.reserve(additional);
            self.depression.reserve(additional);
            self.facilitation.reserve(additional);
            self.decay.reserve(additional);
        }
        if selection.include_delay {
            self.delay.reserve(additional);
        }
    }

    /// Number of synapses, taken from the longest populated array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pre_gid
            .len()
            .max(self.post_gid.len())
            .max(self.type_code.len())
            .max(self.conductance.len())
            .max(self.utilization.len())
            .max(self.delay.len())
    }

    /// True when no synapse is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears every array.
    pub fn clear(&mut self) {
        self.pre_gid.clear();
        self.post_gid.clear();
        self.pre_section.clear();
        self.pre_segment.clear();
        self.post_section.clear();
        self.post_segment.clear();
        self.pre_distance.clear();
        self.post_distance.clear();
        self.type_code.clear();
        self.conductance.clear();
        self.utilization.clear();
        self.depression.clear();
        self.facilitation.clear();
        self.decay.clear();
        self.delay.clear();
    }
}
