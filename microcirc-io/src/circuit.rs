//! Circuit composition parser.
//!
//! Line-oriented, section-delimited text format. Section headers are
//! matched verbatim; the body of an unrecognized section is skipped. The
//! Nth body line of "Neurons Loaded" describes the neuron with GID N
//! (1-indexed by line order), fields whitespace-delimited in the fixed
//! order: morphology-name, origin, column-GID, minicolumn-GID, layer,
//! morphology-type-id, electrophysiology-type-id, x, y, z,
//! y-rotation-degrees.

use crate::error::{Error, Result};
use log::{debug, warn};
use microcirc_core::{Circuit, Gid, NeuronPlacement, Point3};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

const NEURONS_HEADER: &str = "Neurons Loaded";
const MICROBOX_HEADER: &str = "MicroBox Data";
const LAYERS_HEADER: &str = "Layers Positions Data";
const MINICOLUMNS_HEADER: &str = "MiniColumnsPosition";
const ELECTRO_TYPES_HEADER: &str = "ElectroTypes";
const MORPH_TYPES_HEADER: &str = "MorphTypes";

const NEURON_FIELDS: usize = 11;

/// Which cell GIDs a circuit load decodes.
///
/// Loading everything is an explicit choice; an empty subset selects
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GidSelection {
    /// Decode every neuron line.
    All,
    /// Decode only the listed GIDs.
    Subset(HashSet<Gid>),
}

impl GidSelection {
    fn selects(&self, gid: Gid) -> bool {
        match self {
            Self::All => true,
            Self::Subset(set) => set.contains(&gid),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Neurons,
    ElectroTypes,
    MorphTypes,
    Skipped,
}

/// Reads a circuit composition file.
///
/// # Errors
/// Returns an I/O error when the file cannot be opened, or a format error
/// (with the source line number) when a selected neuron line is malformed.
pub fn read_circuit_file<P: AsRef<Path>>(
    path: P,
    selection: &GidSelection,
) -> Result<Circuit> {
    let file = File::open(path)?;
    read_circuit(BufReader::new(file), selection)
}

/// Reads a circuit composition from any buffered reader.
///
/// # Errors
/// Returns a format error (with the source line number) when a selected
/// neuron line is malformed.
pub fn read_circuit<R: BufRead>(reader: R, selection: &GidSelection) -> Result<Circuit> {
    let mut circuit = Circuit::new();
    let mut section = Section::None;
    let mut next_gid: Gid = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = recognize_header(trimmed) {
            section = header;
            continue;
        }

        match section {
            Section::Neurons => {
                next_gid += 1;
                if !selection.selects(next_gid) {
                    continue;
                }
                let placement = decode_neuron_line(trimmed, next_gid, line_number)?;
                debug!("decoded neuron {next_gid} ({})", placement.morphology);
                circuit.insert(placement);
            }
            Section::ElectroTypes => circuit.electro_types.push(trimmed.to_string()),
            Section::MorphTypes => circuit.morphology_types.push(trimmed.to_string()),
            Section::None | Section::Skipped => {}
        }
    }

    if circuit.electro_types.is_empty() {
        warn!("composition file has no ElectroTypes section, using the default table");
        circuit.electro_types = default_electro_types();
    }
    if circuit.morphology_types.is_empty() {
        warn!("composition file has no MorphTypes section, using the default table");
        circuit.morphology_types = default_morphology_types();
    }

    Ok(circuit)
}

fn recognize_header(line: &str) -> Option<Section> {
    match line {
        NEURONS_HEADER => Some(Section::Neurons),
        ELECTRO_TYPES_HEADER => Some(Section::ElectroTypes),
        MORPH_TYPES_HEADER => Some(Section::MorphTypes),
        MICROBOX_HEADER | LAYERS_HEADER | MINICOLUMNS_HEADER => Some(Section::Skipped),
        _ => None,
    }
}

fn decode_neuron_line(line: &str, gid: Gid, line_number: usize) -> Result<NeuronPlacement> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != NEURON_FIELDS {
        return Err(Error::FormatAtLine {
            line: line_number,
            reason: format!(
                "expected {NEURON_FIELDS} fields, found {}",
                fields.len()
            ),
        });
    }

    Ok(NeuronPlacement {
        gid,
        morphology: fields[0].to_string(),
        origin: fields[1].to_string(),
        column: numeric(fields[2], "column GID", line_number)?,
        minicolumn: numeric(fields[3], "minicolumn GID", line_number)?,
        layer: numeric(fields[4], "layer", line_number)?,
        morphology_type: numeric(fields[5], "morphology type id", line_number)?,
        electro_type: numeric(fields[6], "electrophysiology type id", line_number)?,
        position: Point3::new(
            numeric(fields[7], "x position", line_number)?,
            numeric(fields[8], "y position", line_number)?,
            numeric(fields[9], "z position", line_number)?,
        ),
        y_rotation: numeric(fields[10], "y rotation", line_number)?,
    })
}

fn numeric<T: FromStr>(field: &str, what: &str, line_number: usize) -> Result<T> {
    field.parse().map_err(|_| Error::FormatAtLine {
        line: line_number,
        reason: format!("malformed {what} '{field}'"),
    })
}

/// Electrophysiology classes assumed when the file carries no
/// ElectroTypes section. Kept for compatibility with old composition
/// files.
fn default_electro_types() -> Vec<String> {
    [
        "cAC", "bAC", "cNAC", "bNAC", "dNAC", "cSTUT", "bSTUT", "dSTUT", "cIR",
        "bIR", "cADpyr", "cADint", "bADint", "dADint", "cFS", "bFS", "cLTS", "bLTS",
        "cRS", "bRS",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Morphology classes assumed when the file carries no MorphTypes
/// section.
fn default_morphology_types() -> Vec<String> {
    [
        "L1_DAC", "L1_NGC", "L23_PC", "L23_MC", "L23_BTC", "L23_DBC", "L23_BP",
        "L23_NGC", "L23_LBC", "L23_NBC", "L23_SBC", "L23_ChC", "L4_PC", "L4_SP",
        "L4_SS", "L5_TTPC1", "L5_TTPC2", "L5_UTPC", "L5_STPC", "L5_MC", "L6_TPC",
        "L6_UTPC", "L6_IPC", "L6_BPC", "L6_NGC",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FIVE_NEURONS: &str = "\
Neurons Loaded
morph-a 0 101 7 2 3 1 10.0 20.0 30.0 45.0
morph-b 0 101 8 2 4 2 11.0 21.0 31.0 90.0
morph-c 0 102 9 3 5 1 12.0 22.0 32.0 135.0
morph-d 0 102 9 3 5 2 13.0 23.0 33.0 180.0
morph-e 0 103 9 4 6 3 14.0 24.0 34.0 270.0
";

    fn subset(gids: &[Gid]) -> GidSelection {
        GidSelection::Subset(gids.iter().copied().collect())
    }

    #[test]
    fn test_subset_selects_by_line_order() {
        let circuit = read_circuit(Cursor::new(FIVE_NEURONS), &subset(&[2, 4])).unwrap();

        assert_eq!(circuit.len(), 2);
        assert_eq!(circuit.neuron(2).unwrap().morphology, "morph-b");
        assert_eq!(circuit.neuron(4).unwrap().morphology, "morph-d");
        assert!(!circuit.contains(1));
        assert!(!circuit.contains(3));
        assert!(!circuit.contains(5));
    }

    #[test]
    fn test_all_is_an_explicit_opt_in() {
        let circuit = read_circuit(Cursor::new(FIVE_NEURONS), &GidSelection::All).unwrap();
        assert_eq!(circuit.len(), 5);

        // An empty subset selects nothing.
        let circuit = read_circuit(Cursor::new(FIVE_NEURONS), &subset(&[])).unwrap();
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_placement_fields_decoded() {
        let circuit = read_circuit(Cursor::new(FIVE_NEURONS), &subset(&[4])).unwrap();
        let neuron = circuit.neuron(4).unwrap();
        assert_eq!(neuron.origin, "0");
        assert_eq!(neuron.column, 102);
        assert_eq!(neuron.minicolumn, 9);
        assert_eq!(neuron.layer, 3);
        assert_eq!(neuron.morphology_type, 5);
        assert_eq!(neuron.electro_type, 2);
        assert_eq!(neuron.position, Point3::new(13.0, 23.0, 33.0));
        assert!((neuron.y_rotation - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_selected_line_reports_line_number() {
        let text = "Neurons Loaded\nmorph-a 0 101 7 2 3 1 10.0 20.0 30.0 notanumber\n";
        let result = read_circuit(Cursor::new(text), &GidSelection::All);
        assert!(matches!(
            result,
            Err(Error::FormatAtLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_unselected_line_is_skipped() {
        let text = "Neurons Loaded\nbroken line\nmorph-b 0 101 8 2 4 2 11.0 21.0 31.0 90.0\n";
        let circuit = read_circuit(Cursor::new(text), &subset(&[2])).unwrap();
        assert_eq!(circuit.len(), 1);
        assert_eq!(circuit.neuron(2).unwrap().morphology, "morph-b");
    }

    #[test]
    fn test_unrecognized_sections_skipped() {
        let text = "\
MicroBox Data
1.0 2.0 3.0
Some Future Section
garbage that is not a neuron
Neurons Loaded
morph-a 0 101 7 2 3 1 10.0 20.0 30.0 45.0
";
        let circuit = read_circuit(Cursor::new(text), &GidSelection::All).unwrap();
        assert_eq!(circuit.len(), 1);
    }

    #[test]
    fn test_type_tables_parsed_when_present() {
        let text = "\
ElectroTypes
cADpyr
cAC
MorphTypes
L5_TTPC1
Neurons Loaded
morph-a 0 101 7 2 0 1 10.0 20.0 30.0 45.0
";
        let circuit = read_circuit(Cursor::new(text), &GidSelection::All).unwrap();
        assert_eq!(circuit.electro_types, vec!["cADpyr", "cAC"]);
        assert_eq!(circuit.morphology_types, vec!["L5_TTPC1"]);
    }

    #[test]
    fn test_default_type_tables_when_absent() {
        let circuit = read_circuit(Cursor::new(FIVE_NEURONS), &subset(&[1])).unwrap();
        assert_eq!(circuit.electro_types.len(), 20);
        assert_eq!(circuit.morphology_types.len(), 25);
    }
}
