//! HDF5 morphology reader.
//!
//! Two schema versions are supported:
//!
//! - **v1**: top-level `points` (N×4 f64: x, y, z, diameter) and
//!   `structure` (S×3 i32: start point, type code, parent) datasets.
//! - **v2**: a `neuron1` root group with per-stage point tables
//!   (`neuron1/{raw,unraveled,repaired}/points`), the structure table at
//!   `neuron1/structure/{stage}` (S×2 i32: start point, parent), and a
//!   shared `neuron1/structure/sectiontype` table that may be stored as
//!   integer or floating point.
//!
//! The reader produces unindexed [`RawMorphology`] arrays; building the
//! derived indices is `microcirc_core::build_morphology`'s job.

use crate::config::MorphologyFormat;
use crate::error::{Error, Result};
use hdf5::{Dataset, File, Group};
use microcirc_core::{Point3, RawMorphology, SectionType};
use ndarray::Array2;
use std::path::Path;

const POINT_COLUMNS: usize = 4;
const V1_STRUCTURE_COLUMNS: usize = 3;
const V2_STRUCTURE_COLUMNS: usize = 2;
const V2_ROOT: &str = "neuron1";

/// Reads one morphology file into raw flat tables.
///
/// # Errors
/// Returns a format error when the file cannot be opened, a required
/// dataset is absent, or a table's dimensionality does not match the
/// schema.
pub fn read_morphology<P: AsRef<Path>>(
    path: P,
    format: &MorphologyFormat,
) -> Result<RawMorphology> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::Format(format!("cannot open '{}': {e}", path.display())))?;

    match format {
        MorphologyFormat::V1 => read_v1(&file),
        MorphologyFormat::V2(stage) => read_v2(&file, stage.group_name()),
    }
    .map_err(|e| match e {
        Error::Format(reason) => Error::Format(format!("{}: {reason}", path.display())),
        other => other,
    })
}

fn read_v1(file: &File) -> Result<RawMorphology> {
    let points = open_dataset(file, "points")?;
    let structure = open_dataset(file, "structure")?;

    let (points, diameters) = read_points(&points)?;
    let structure = read_table_2d::<i32>(&structure, "structure", V1_STRUCTURE_COLUMNS)?;

    let sections = structure.nrows();
    let mut section_start = Vec::with_capacity(sections);
    let mut section_type = Vec::with_capacity(sections);
    let mut section_parent = Vec::with_capacity(sections);
    for row in structure.rows() {
        section_start.push(to_u32(row[0], "section start")?);
        section_type.push(SectionType::from_raw_code(i64::from(row[1])));
        section_parent.push(parent_of(row[2])?);
    }

    Ok(RawMorphology {
        points,
        diameters,
        section_start,
        section_type,
        section_parent,
    })
}

fn read_v2(file: &File, stage: &str) -> Result<RawMorphology> {
    let root = file
        .group(V2_ROOT)
        .map_err(|_| Error::Format(format!("missing root group '{V2_ROOT}'")))?;

    let stage_group = root
        .group(stage)
        .map_err(|_| Error::Format(format!("missing stage group '{V2_ROOT}/{stage}'")))?;
    let points = open_dataset(&stage_group, "points")?;
    let (points, diameters) = read_points(&points)?;

    let structure_group = root
        .group("structure")
        .map_err(|_| Error::Format(format!("missing group '{V2_ROOT}/structure'")))?;
    let structure = open_dataset(&structure_group, stage)?;
    let structure = read_table_2d::<i32>(&structure, stage, V2_STRUCTURE_COLUMNS)?;

    let type_codes = read_section_types(&structure_group)?;
    if type_codes.len() != structure.nrows() {
        return Err(Error::Format(format!(
            "sectiontype has {} entries for {} sections",
            type_codes.len(),
            structure.nrows()
        )));
    }

    let sections = structure.nrows();
    let mut section_start = Vec::with_capacity(sections);
    let mut section_parent = Vec::with_capacity(sections);
    for row in structure.rows() {
        section_start.push(to_u32(row[0], "section start")?);
        section_parent.push(parent_of(row[1])?);
    }

    Ok(RawMorphology {
        points,
        diameters,
        section_start,
        section_type: type_codes,
        section_parent,
    })
}

/// Reads the N×4 point table and splits it into positions and diameters.
fn read_points(dataset: &Dataset) -> Result<(Vec<Point3>, Vec<f64>)> {
    let table = read_table_2d::<f64>(dataset, "points", POINT_COLUMNS)?;
    let mut points = Vec::with_capacity(table.nrows());
    let mut diameters = Vec::with_capacity(table.nrows());
    for row in table.rows() {
        points.push(Point3::new(row[0], row[1], row[2]));
        diameters.push(row[3]);
    }
    Ok((points, diameters))
}

/// Reads the section type table, coercing a floating-point dataset to
/// integer codes when necessary.
fn read_section_types(structure_group: &Group) -> Result<Vec<SectionType>> {
    let dataset = open_dataset(structure_group, "sectiontype")?;
    let codes: Vec<i64> = match dataset.read_raw::<i32>() {
        Ok(codes) => codes.into_iter().map(i64::from).collect(),
        Err(_) => {
            let floats = dataset.read_raw::<f64>()?;
            #[allow(clippy::cast_possible_truncation)]
            floats.into_iter().map(|c| c as i64).collect()
        }
    };
    Ok(codes.into_iter().map(SectionType::from_raw_code).collect())
}

fn open_dataset(group: &Group, name: &str) -> Result<Dataset> {
    group
        .dataset(name)
        .map_err(|_| Error::Format(format!("missing dataset '{name}'")))
}

pub(crate) fn read_table_2d<T: hdf5::H5Type + Copy>(
    dataset: &Dataset,
    name: &str,
    columns: usize,
) -> Result<Array2<T>> {
    let shape = dataset.shape();
    if shape.len() != 2 || shape[1] != columns {
        return Err(Error::Format(format!(
            "dataset '{name}' must be 2-D with {columns} columns, found shape {shape:?}"
        )));
    }
    Ok(dataset.read_2d::<T>()?)
}

fn to_u32(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Format(format!("negative {what}: {value}")))
}

/// Parent column decoding: a negative value is the "no parent" sentinel
/// and is only legal for the soma (enforced later by validation).
fn parent_of(value: i32) -> Result<Option<u32>> {
    if value < 0 {
        Ok(None)
    } else {
        Ok(Some(to_u32(value, "parent index")?))
    }
}
