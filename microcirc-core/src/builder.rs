//! Morphology index builder.
//!
//! Derives every index a [`Morphology`] carries from the flat raw tables:
//! points per section, type-family offsets, the parent/children adjacency,
//! first-order sections, branch order, cable lengths, per-point normalized
//! distances, and the bounding box. Pure function of its input; any
//! violated invariant aborts the whole build, there is no partial index.

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Point3};
use crate::morphology::Morphology;
use crate::raw::RawMorphology;
use crate::section::{SectionId, SectionType, MAX_SECTION_CHILDREN, SOMA_SECTION};
use std::collections::VecDeque;

/// Builds a fully-indexed [`Morphology`] from raw flat tables.
///
/// # Errors
/// Returns a topology error when the raw tables violate a structural
/// invariant: non-monotonic starts, empty sections, bad parent references,
/// an unexpected type layout, more than [`MAX_SECTION_CHILDREN`] children,
/// or sections unreachable from the soma.
pub fn build_morphology(raw: RawMorphology) -> Result<Morphology> {
    raw.validate()?;

    let section_point_count = point_counts(&raw)?;
    let (basal_dendrite_offset, apical_dendrite_offset) = type_offsets(&raw.section_type)?;
    let (children, first_order_sections) = children_table(&raw.section_parent)?;
    let branch_order = branch_orders(&children, &first_order_sections, raw.section_count())?;
    let (section_length, point_relative_distance) =
        lengths_and_distances(&raw, &section_point_count);
    let bounding_box = bounding_box(&raw, &section_point_count);

    Ok(Morphology {
        points: raw.points,
        diameters: raw.diameters,
        section_start: raw.section_start,
        section_type: raw.section_type,
        section_parent: raw.section_parent,
        section_point_count,
        basal_dendrite_offset,
        apical_dendrite_offset,
        children,
        first_order_sections,
        branch_order,
        section_length,
        point_relative_distance,
        bounding_box,
    })
}

/// Points per section from successive start differences; the tail section
/// runs to the end of the point table. Empty sections are rejected here so
/// that every downstream query may assume at least one point.
fn point_counts(raw: &RawMorphology) -> Result<Vec<u32>> {
    let sections = raw.section_count();
    let mut counts = Vec::with_capacity(sections);

    for i in 0..sections {
        let start = raw.section_start[i];
        let end = if i + 1 < sections {
            raw.section_start[i + 1]
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let total = raw.point_count() as u32;
            total
        };
        let count = end - start;
        if count == 0 {
            return Err(Error::EmptySection(i));
        }
        counts.push(count);
    }

    Ok(counts)
}

/// Scans the section type column for the family boundaries.
///
/// Sections are grouped contiguously by type: soma first, axon second,
/// then the basal dendrites, then the apical dendrites. A missing family
/// yields `None`; many morphologies legitimately lack apical dendrites.
fn type_offsets(types: &[SectionType]) -> Result<(Option<SectionId>, Option<SectionId>)> {
    if types.first() != Some(&SectionType::Soma) {
        return Err(Error::TypeLayout(
            "section 0 must be the soma".to_string(),
        ));
    }
    if types.get(1) != Some(&SectionType::Axon) {
        return Err(Error::TypeLayout(
            "section 1 must be the first axon section".to_string(),
        ));
    }

    // Axon offset is fixed at 1; advance past the axon run.
    let mut i = 1;
    while i < types.len() && types[i] == SectionType::Axon {
        i += 1;
    }

    #[allow(clippy::cast_possible_truncation)]
    let basal = if i < types.len() && types[i] == SectionType::Dendrite {
        let offset = i as SectionId;
        while i < types.len() && types[i] == SectionType::Dendrite {
            i += 1;
        }
        Some(offset)
    } else {
        None
    };

    #[allow(clippy::cast_possible_truncation)]
    let apical = if i < types.len() && types[i] == SectionType::ApicalDendrite {
        Some(i as SectionId)
    } else {
        None
    };

    Ok((basal, apical))
}

/// Single pass over sections 1..N building the parent → children table.
///
/// The soma's children are not in this table; sections whose parent is the
/// soma are collected separately as first-order sections. Exceeding
/// [`MAX_SECTION_CHILDREN`] is a hard structural limit of the format.
fn children_table(
    parents: &[Option<SectionId>],
) -> Result<(Vec<Vec<SectionId>>, Vec<SectionId>)> {
    let sections = parents.len();
    let mut children: Vec<Vec<SectionId>> = vec![Vec::new(); sections];
    let mut first_order = Vec::new();

    for (i, parent) in parents.iter().enumerate().skip(1) {
        #[allow(clippy::cast_possible_truncation)]
        let id = i as SectionId;
        let parent = parent.unwrap_or(SOMA_SECTION);
        if parent == SOMA_SECTION {
            first_order.push(id);
            continue;
        }
        let list = &mut children[parent as usize];
        if list.len() == MAX_SECTION_CHILDREN {
            return Err(Error::TooManyChildren {
                section: parent as usize,
                limit: MAX_SECTION_CHILDREN,
            });
        }
        list.push(id);
    }

    Ok((children, first_order))
}

/// Breadth-first branch order: the soma is 0, first-order sections 1, each
/// child its parent's order plus one. After the traversal every non-soma
/// section must have been reached exactly once.
fn branch_orders(
    children: &[Vec<SectionId>],
    first_order: &[SectionId],
    sections: usize,
) -> Result<Vec<u32>> {
    let mut order = vec![u32::MAX; sections];
    order[SOMA_SECTION as usize] = 0;

    let mut queue: VecDeque<SectionId> = VecDeque::with_capacity(sections);
    for &section in first_order {
        order[section as usize] = 1;
        queue.push_back(section);
    }

    while let Some(section) = queue.pop_front() {
        let next = order[section as usize] + 1;
        for &child in &children[section as usize] {
            if order[child as usize] != u32::MAX {
                return Err(Error::UnreachableSection(child as usize));
            }
            order[child as usize] = next;
            queue.push_back(child);
        }
    }

    if let Some(unreached) = order.iter().position(|&o| o == u32::MAX) {
        return Err(Error::UnreachableSection(unreached));
    }

    Ok(order)
}

/// Per-section cable length and per-point normalized distance from the
/// section start. The last point of every section is forced to exactly 1.0
/// regardless of accumulation error; single-point (zero-length) sections
/// keep all distances at 0.
fn lengths_and_distances(
    raw: &RawMorphology,
    counts: &[u32],
) -> (Vec<f64>, Vec<f64>) {
    let mut lengths = Vec::with_capacity(counts.len());
    let mut relative = vec![0.0; raw.point_count()];

    for (i, &count) in counts.iter().enumerate() {
        let start = raw.section_start[i] as usize;
        let end = start + count as usize;

        let mut length = 0.0;
        for p in start + 1..end {
            length += raw.points[p - 1].distance(&raw.points[p]);
        }
        lengths.push(length);

        if length > 0.0 {
            let mut accumulated = 0.0;
            for p in start + 1..end {
                accumulated += raw.points[p - 1].distance(&raw.points[p]);
                relative[p] = accumulated / length;
            }
            relative[end - 1] = 1.0;
        }
    }

    (lengths, relative)
}

/// Bounding box: seeded from the soma's maximum point-to-centroid radius as
/// a symmetric cube, then expanded by every point of every section plus its
/// radius, both range endpoints included.
fn bounding_box(raw: &RawMorphology, counts: &[u32]) -> BoundingBox {
    let soma_start = raw.section_start[SOMA_SECTION as usize] as usize;
    let soma_end = soma_start + counts[SOMA_SECTION as usize] as usize;

    #[allow(clippy::cast_precision_loss)]
    let soma_points = (soma_end - soma_start) as f64;
    let mut centroid = Point3::default();
    for point in &raw.points[soma_start..soma_end] {
        centroid.x += point.x;
        centroid.y += point.y;
        centroid.z += point.z;
    }
    centroid.x /= soma_points;
    centroid.y /= soma_points;
    centroid.z /= soma_points;

    let soma_radius = raw.points[soma_start..soma_end]
        .iter()
        .map(|p| p.distance(&centroid))
        .fold(0.0, f64::max);

    let mut bbox = BoundingBox::cube(centroid, soma_radius);
    for (point, diameter) in raw.points.iter().zip(&raw.diameters) {
        bbox.include_sphere(point, diameter / 2.0);
    }
    bbox
}
