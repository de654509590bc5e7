//! Neuron placements and the circuit container.
//!
//! A [`Circuit`] owns its neurons in an arena indexed by insertion order,
//! with a GID map for O(1) lookup. Cross-references (neuron to morphology,
//! synapse to neuron) are keys into owning containers, resolved through an
//! explicit lookup each time; nothing holds a back-pointer.

use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::synapse::SynapseBatch;
use std::collections::HashMap;

/// Global cell identifier, unique within a circuit.
pub type Gid = u32;

/// Placement record for one neuron: where it sits and which reconstructed
/// morphology it instantiates.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronPlacement {
    /// Global cell identifier.
    pub gid: Gid,
    /// Morphology label; key into a morphology store.
    pub morphology: String,
    /// Origin/database tag carried through from the composition file.
    pub origin: String,
    /// Cortical column GID.
    pub column: u32,
    /// Minicolumn GID.
    pub minicolumn: u32,
    /// Cortical layer number.
    pub layer: u32,
    /// Index into the circuit's morphology-type name table.
    pub morphology_type: u32,
    /// Index into the circuit's electrophysiology-type name table.
    pub electro_type: u32,
    /// Soma position in circuit-global coordinates.
    pub position: Point3,
    /// Rotation around the Y axis, degrees.
    pub y_rotation: f64,
}

impl NeuronPlacement {
    /// Maps a morphology-local point into circuit-global coordinates:
    /// rotation around the Y axis, then translation to the soma position.
    #[must_use]
    pub fn transform(&self, local: Point3) -> Point3 {
        let radians = self.y_rotation.to_radians();
        let (sin, cos) = radians.sin_cos();
        Point3 {
            x: local.z.mul_add(sin, local.x * cos) + self.position.x,
            y: local.y + self.position.y,
            z: local.z.mul_add(cos, -local.x * sin) + self.position.z,
        }
    }
}

/// Per-neuron synapse links, indices into the circuit's [`SynapseBatch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynapseLinks {
    /// Synapses terminating on this neuron.
    pub afferent: Vec<usize>,
    /// Synapses originating from this neuron.
    pub efferent: Vec<usize>,
}

/// A circuit: neuron arena, GID index, type-name tables, and the shared
/// synapse dataset with per-neuron links.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    neurons: Vec<NeuronPlacement>,
    links: Vec<SynapseLinks>,
    by_gid: HashMap<Gid, usize>,
    /// Electrophysiology class names, indexed by `electro_type`.
    pub electro_types: Vec<String>,
    /// Morphology class names, indexed by `morphology_type`.
    pub morphology_types: Vec<String>,
    /// Flat synapse attribute arrays shared by the whole circuit.
    pub synapses: SynapseBatch,
}

impl Circuit {
    /// Creates an empty circuit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of neurons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// True when the circuit holds no neurons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// Adds a neuron and indexes it by GID. A re-inserted GID replaces the
    /// index entry but keeps the arena slot of the newer record.
    pub fn insert(&mut self, placement: NeuronPlacement) {
        self.by_gid.insert(placement.gid, self.neurons.len());
        self.neurons.push(placement);
        self.links.push(SynapseLinks::default());
    }

    /// All placements in insertion order.
    #[must_use]
    pub fn neurons(&self) -> &[NeuronPlacement] {
        &self.neurons
    }

    /// Looks a neuron up by GID.
    ///
    /// # Errors
    /// Returns [`Error::NeuronNotFound`] for an unknown GID.
    pub fn neuron(&self, gid: Gid) -> Result<&NeuronPlacement> {
        self.index_of(gid).map(|i| &self.neurons[i])
    }

    /// True when the circuit contains the GID.
    #[must_use]
    pub fn contains(&self, gid: Gid) -> bool {
        self.by_gid.contains_key(&gid)
    }

    /// Synapse links of a neuron.
    ///
    /// # Errors
    /// Returns [`Error::NeuronNotFound`] for an unknown GID.
    pub fn synapse_links(&self, gid: Gid) -> Result<&SynapseLinks> {
        self.index_of(gid).map(|i| &self.links[i])
    }

    /// Clears a neuron's afferent/efferent sets. Loaders call this before
    /// repopulating; linking is destructive, never additive.
    ///
    /// # Errors
    /// Returns [`Error::NeuronNotFound`] for an unknown GID.
    pub fn clear_synapse_links(&mut self, gid: Gid) -> Result<()> {
        let index = self.index_of(gid)?;
        self.links[index].afferent.clear();
        self.links[index].efferent.clear();
        Ok(())
    }

    /// Records a synapse index in a neuron's afferent set.
    ///
    /// # Errors
    /// Returns [`Error::NeuronNotFound`] for an unknown GID.
    pub fn link_afferent(&mut self, gid: Gid, synapse: usize) -> Result<()> {
        let index = self.index_of(gid)?;
        self.links[index].afferent.push(synapse);
        Ok(())
    }

    /// Records a synapse index in a neuron's efferent set.
    ///
    /// # Errors
    /// Returns [`Error::NeuronNotFound`] for an unknown GID.
    pub fn link_efferent(&mut self, gid: Gid, synapse: usize) -> Result<()> {
        let index = self.index_of(gid)?;
        self.links[index].efferent.push(synapse);
        Ok(())
    }

    fn index_of(&self, gid: Gid) -> Result<usize> {
        self.by_gid
            .get(&gid)
            .copied()
            .ok_or(Error::NeuronNotFound(gid))
    }
}
