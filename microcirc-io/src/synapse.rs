//! Synapse attribute loader.
//!
//! One HDF5 file holds one dataset per postsynaptic neuron, named
//! `a{gid}`, shaped N x 18 with one row per afferent synapse. Loading is
//! two-pass: a sizing pass sums row counts so the circuit's attribute
//! arrays reserve once, then a fill pass copies the selected columns and
//! rebuilds the per-neuron links. A neuron with no dataset simply
//! contributes nothing; that is not an error.

use crate::error::Result;
use crate::morphology::read_table_2d;
use log::{debug, info};
use microcirc_core::{Circuit, Gid, SynapseAttributeSelection};
use ndarray::ArrayView1;
use std::collections::HashSet;
use std::path::Path;

/// Columns of one synapse row.
const SYNAPSE_COLUMNS: usize = 18;

const COL_PRE_GID: usize = 0;
const COL_DELAY: usize = 1;
const COL_POST_SECTION: usize = 2;
const COL_POST_SEGMENT: usize = 3;
const COL_POST_DISTANCE: usize = 4;
const COL_PRE_SECTION: usize = 5;
const COL_PRE_SEGMENT: usize = 6;
const COL_PRE_DISTANCE: usize = 7;
const COL_CONDUCTANCE: usize = 8;
const COL_UTILIZATION: usize = 9;
const COL_DEPRESSION: usize = 10;
const COL_FACILITATION: usize = 11;
const COL_DECAY: usize = 12;
const COL_TYPE: usize = 13;

/// Which synapse rows a load admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynapseFilter {
    /// Only synapses whose presynaptic neuron is also in the target set.
    OnlyShared,
    /// Every afferent synapse of a target neuron, regardless of where its
    /// presynaptic side lives.
    OnlyAfferent,
}

/// Reader over one synapse attribute file.
pub struct SynapseReader {
    file: hdf5::File,
}

impl SynapseReader {
    /// Opens a synapse attribute file.
    ///
    /// # Errors
    /// Returns an HDF5 error when the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = hdf5::File::open(path)?;
        Ok(Self { file })
    }

    /// Loads the selected attribute columns for every `target` neuron into
    /// the circuit's synapse batch and relinks the touched neurons.
    ///
    /// Linking is destructive: each target neuron's afferent/efferent sets
    /// are cleared before the fill pass repopulates them.
    ///
    /// # Errors
    /// Returns a format error when a dataset is not N x 18, or a lookup
    /// error when a target GID is not in the circuit.
    pub fn load(
        &self,
        circuit: &mut Circuit,
        target: &[Gid],
        selection: &SynapseAttributeSelection,
        filter: SynapseFilter,
    ) -> Result<()> {
        let target_set: HashSet<Gid> = target.iter().copied().collect();

        let mut total_rows = 0;
        for &gid in target {
            if let Ok(dataset) = self.file.dataset(&dataset_name(gid)) {
                let shape = dataset.shape();
                if shape.len() == 2 {
                    total_rows += shape[0];
                }
            }
        }
        circuit.synapses.reserve(total_rows, selection);
        info!(
            "loading up to {total_rows} synapses for {} neurons",
            target.len()
        );

        for &gid in target {
            circuit.clear_synapse_links(gid)?;
        }

        let mut next_index = circuit.synapses.len();
        for &post_gid in target {
            let name = dataset_name(post_gid);
            let Ok(dataset) = self.file.dataset(&name) else {
                debug!("neuron {post_gid} has no synapse dataset, skipping");
                continue;
            };
            let table = read_table_2d::<f64>(&dataset, &name, SYNAPSE_COLUMNS)?;

            for row in table.rows() {
                let pre_gid = column_u32(&row, COL_PRE_GID);
                if filter == SynapseFilter::OnlyShared && !target_set.contains(&pre_gid) {
                    continue;
                }

                push_row(&mut circuit.synapses, &row, post_gid, selection);
                circuit.link_afferent(post_gid, next_index)?;
                if target_set.contains(&pre_gid) && circuit.contains(pre_gid) {
                    circuit.link_efferent(pre_gid, next_index)?;
                }
                next_index += 1;
            }
        }

        Ok(())
    }

    /// Lists the GIDs that have a synapse dataset in this file.
    ///
    /// # Errors
    /// Returns an HDF5 error when the member list cannot be read.
    pub fn available_gids(&self) -> Result<Vec<Gid>> {
        let mut gids = Vec::new();
        for name in self.file.member_names()? {
            if let Some(rest) = name.strip_prefix('a') {
                if let Ok(gid) = rest.parse::<Gid>() {
                    gids.push(gid);
                }
            }
        }
        gids.sort_unstable();
        Ok(gids)
    }
}

fn dataset_name(gid: Gid) -> String {
    format!("a{gid}")
}

fn push_row(
    batch: &mut microcirc_core::SynapseBatch,
    row: &ArrayView1<'_, f64>,
    post_gid: Gid,
    selection: &SynapseAttributeSelection,
) {
    if selection.include_connectivity {
        batch.pre_gid.push(column_u32(row, COL_PRE_GID));
        batch.post_gid.push(post_gid);
        batch.pre_section.push(column_u32(row, COL_PRE_SECTION));
        batch.pre_segment.push(column_u32(row, COL_PRE_SEGMENT));
        batch.post_section.push(column_u32(row, COL_POST_SECTION));
        batch.post_segment.push(column_u32(row, COL_POST_SEGMENT));
    }
    if selection.include_positions {
        batch.pre_distance.push(row[COL_PRE_DISTANCE]);
        batch.post_distance.push(row[COL_POST_DISTANCE]);
    }
    if selection.include_types {
        #[allow(clippy::cast_possible_truncation)]
        batch.type_code.push(row[COL_TYPE] as i32);
    }
    if selection.include_conductance {
        batch.conductance.push(row[COL_CONDUCTANCE]);
    }
    if selection.include_dynamics {
        batch.utilization.push(row[COL_UTILIZATION]);
        batch.depression.push(row[COL_DEPRESSION]);
        batch.facilitation.push(row[COL_FACILITATION]);
        batch.decay.push(row[COL_DECAY]);
    }
    if selection.include_delay {
        batch.delay.push(row[COL_DELAY]);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn column_u32(row: &ArrayView1<'_, f64>, column: usize) -> u32 {
    row[column] as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use microcirc_core::{NeuronPlacement, Point3};
    use ndarray::arr2;
    use tempfile::NamedTempFile;

    fn placement(gid: Gid) -> NeuronPlacement {
        NeuronPlacement {
            gid,
            morphology: format!("morph-{gid}"),
            origin: "0".to_string(),
            column: 1,
            minicolumn: 1,
            layer: 4,
            morphology_type: 0,
            electro_type: 0,
            position: Point3::new(0.0, 0.0, 0.0),
            y_rotation: 0.0,
        }
    }

    fn row(pre_gid: f64, conductance: f64) -> [f64; 18] {
        let mut row = [0.0; 18];
        row[COL_PRE_GID] = pre_gid;
        row[COL_DELAY] = 1.5;
        row[COL_POST_SECTION] = 2.0;
        row[COL_POST_SEGMENT] = 3.0;
        row[COL_POST_DISTANCE] = 0.25;
        row[COL_PRE_SECTION] = 4.0;
        row[COL_PRE_SEGMENT] = 5.0;
        row[COL_PRE_DISTANCE] = 0.75;
        row[COL_CONDUCTANCE] = conductance;
        row[COL_UTILIZATION] = 0.5;
        row[COL_DEPRESSION] = 670.0;
        row[COL_FACILITATION] = 17.0;
        row[COL_DECAY] = 1.7;
        row[COL_TYPE] = 113.0;
        row
    }

    fn write_dataset(file: &hdf5::File, gid: Gid, rows: &[[f64; 18]]) {
        let table = arr2(rows);
        let ds = file
            .new_dataset::<f64>()
            .shape(table.dim())
            .create(dataset_name(gid).as_str())
            .unwrap();
        ds.write(table.view()).unwrap();
    }

    /// Synapses: 2 -> 1, 3 -> 1, 1 -> 2, 1 -> 3. Neuron 3 is outside the
    /// circuit; its dataset exists in the file but is never a load target.
    fn fixture() -> (NamedTempFile, Circuit) {
        let tmp = NamedTempFile::new().unwrap();
        let file = hdf5::File::create(tmp.path()).unwrap();
        write_dataset(&file, 1, &[row(2.0, 0.4), row(3.0, 0.6)]);
        write_dataset(&file, 2, &[row(1.0, 0.8)]);
        write_dataset(&file, 3, &[row(1.0, 0.2)]);
        drop(file);

        let mut circuit = Circuit::new();
        circuit.insert(placement(1));
        circuit.insert(placement(2));
        (tmp, circuit)
    }

    #[test]
    fn test_only_shared_drops_external_presynaptic_rows() {
        let (tmp, mut circuit) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        reader
            .load(
                &mut circuit,
                &[1, 2],
                &SynapseAttributeSelection::all(),
                SynapseFilter::OnlyShared,
            )
            .unwrap();

        // The 3 -> 1 row is excluded: its presynaptic side is not in the
        // target set.
        assert_eq!(circuit.synapses.len(), 2);
        assert_eq!(circuit.synapses.pre_gid, vec![2, 1]);
        assert_eq!(circuit.synapses.post_gid, vec![1, 2]);

        let links = circuit.synapse_links(1).unwrap();
        assert_eq!(links.afferent, vec![0]);
        // The 1 -> 3 synapse never reaches neuron 1's efferent set either:
        // postsynaptic 3 is outside the target, so its dataset is not read.
        assert_eq!(links.efferent, vec![1]);
        let links = circuit.synapse_links(2).unwrap();
        assert_eq!(links.afferent, vec![1]);
        assert_eq!(links.efferent, vec![0]);
    }

    #[test]
    fn test_only_afferent_keeps_external_rows() {
        let (tmp, mut circuit) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        reader
            .load(
                &mut circuit,
                &[1, 2],
                &SynapseAttributeSelection::all(),
                SynapseFilter::OnlyAfferent,
            )
            .unwrap();

        assert_eq!(circuit.synapses.len(), 3);
        assert_eq!(circuit.synapses.pre_gid, vec![2, 3, 1]);
        // No efferent link for GID 3: it is not a circuit neuron.
        assert_eq!(circuit.synapse_links(1).unwrap().afferent, vec![0, 1]);
        assert_eq!(circuit.synapse_links(2).unwrap().efferent, vec![0]);
    }

    #[test]
    fn test_unselected_columns_stay_empty() {
        let (tmp, mut circuit) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        reader
            .load(
                &mut circuit,
                &[1, 2],
                &SynapseAttributeSelection::connectivity_only(),
                SynapseFilter::OnlyAfferent,
            )
            .unwrap();

        assert_eq!(circuit.synapses.pre_gid.len(), 3);
        assert!(circuit.synapses.conductance.is_empty());
        assert!(circuit.synapses.delay.is_empty());
        assert!(circuit.synapses.pre_distance.is_empty());
        assert!(circuit.synapses.type_code.is_empty());
    }

    #[test]
    fn test_attribute_values_follow_column_map() {
        let (tmp, mut circuit) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        reader
            .load(
                &mut circuit,
                &[1],
                &SynapseAttributeSelection::all(),
                SynapseFilter::OnlyAfferent,
            )
            .unwrap();

        assert_eq!(circuit.synapses.post_section, vec![2, 2]);
        assert_eq!(circuit.synapses.pre_segment, vec![5, 5]);
        assert_eq!(circuit.synapses.type_code, vec![113, 113]);
        assert!((circuit.synapses.conductance[1] - 0.6).abs() < 1e-12);
        assert!((circuit.synapses.depression[0] - 670.0).abs() < 1e-12);
        assert!((circuit.synapses.delay[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_dataset_is_skipped() {
        let (tmp, mut circuit) = fixture();
        circuit.insert(placement(9));
        let reader = SynapseReader::open(tmp.path()).unwrap();
        reader
            .load(
                &mut circuit,
                &[1, 9],
                &SynapseAttributeSelection::all(),
                SynapseFilter::OnlyAfferent,
            )
            .unwrap();

        assert_eq!(circuit.synapses.len(), 2);
        assert!(circuit.synapse_links(9).unwrap().afferent.is_empty());
    }

    #[test]
    fn test_reload_replaces_links() {
        let (tmp, mut circuit) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        let selection = SynapseAttributeSelection::connectivity_only();
        reader
            .load(&mut circuit, &[1, 2], &selection, SynapseFilter::OnlyAfferent)
            .unwrap();
        reader
            .load(&mut circuit, &[1, 2], &selection, SynapseFilter::OnlyAfferent)
            .unwrap();

        // Links were rebuilt against the appended batch, not accumulated.
        assert_eq!(circuit.synapse_links(1).unwrap().afferent, vec![3, 4]);
        assert_eq!(circuit.synapse_links(2).unwrap().afferent, vec![5]);
    }

    #[test]
    fn test_wrong_column_count_is_format_error() {
        let tmp = NamedTempFile::new().unwrap();
        let file = hdf5::File::create(tmp.path()).unwrap();
        let table = arr2(&[[1.0, 2.0, 3.0]]);
        let ds = file
            .new_dataset::<f64>()
            .shape(table.dim())
            .create("a1")
            .unwrap();
        ds.write(table.view()).unwrap();
        drop(file);

        let mut circuit = Circuit::new();
        circuit.insert(placement(1));
        let reader = SynapseReader::open(tmp.path()).unwrap();
        let result = reader.load(
            &mut circuit,
            &[1],
            &SynapseAttributeSelection::all(),
            SynapseFilter::OnlyAfferent,
        );
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_available_gids() {
        let (tmp, _) = fixture();
        let reader = SynapseReader::open(tmp.path()).unwrap();
        assert_eq!(reader.available_gids().unwrap(), vec![1, 2, 3]);
    }
}
