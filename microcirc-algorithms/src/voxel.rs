//! Segment-to-voxel spatial mapping.
//!
//! Rasterizes every segment of a morphology into an axis-aligned voxel
//! grid keyed by integer cell coordinates. Segments longer than a voxel
//! edge are sampled at sub-voxel steps so no cell along the cable is
//! skipped.

use microcirc_core::{Morphology, Point3, Result, SectionId};
use std::collections::HashMap;

/// Reference to one segment of a morphology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    /// Section id within the morphology.
    pub section: SectionId,
    /// Segment index within the section.
    pub segment: u32,
}

/// Voxel map over a morphology's segments.
///
/// Cells are cubes of `voxel_size` micrometers in the morphology's local
/// coordinate frame.
#[derive(Debug)]
pub struct VoxelMap {
    voxel_size: f64,
    cells: HashMap<(i32, i32, i32), Vec<SegmentRef>>,
}

impl VoxelMap {
    /// Rasterizes every segment of `morphology` into a voxel map.
    ///
    /// # Errors
    /// Propagates section/segment range errors from the morphology; a
    /// successfully built morphology never produces them.
    ///
    /// # Panics
    /// Panics if `voxel_size` is not strictly positive.
    pub fn build(morphology: &Morphology, voxel_size: f64) -> Result<Self> {
        assert!(voxel_size > 0.0, "voxel size must be positive");
        let mut map = Self {
            voxel_size,
            cells: HashMap::new(),
        };

        for section in morphology.all_sections() {
            for segment in 0..morphology.segment_count(section)? {
                let seg = morphology.segment(section, segment)?;
                map.insert_segment(SegmentRef { section, segment }, &seg.begin, &seg.end);
            }
        }

        Ok(map)
    }

    /// Number of occupied voxels.
    #[must_use]
    pub fn occupied_voxels(&self) -> usize {
        self.cells.len()
    }

    /// Segments registered in the voxel containing `point`.
    #[must_use]
    pub fn query(&self, point: &Point3) -> &[SegmentRef] {
        self.cells
            .get(&self.cell_of(point))
            .map_or(&[], Vec::as_slice)
    }

    /// Segments registered in the 27-cell neighborhood around `point`,
    /// deduplicated.
    #[must_use]
    pub fn query_neighborhood(&self, point: &Point3) -> Vec<SegmentRef> {
        let (cx, cy, cz) = self.cell_of(point);
        let mut result = Vec::new();

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(segments) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for segment in segments {
                            if !result.contains(segment) {
                                result.push(*segment);
                            }
                        }
                    }
                }
            }
        }

        result
    }

    /// Registers a segment in every voxel its cable passes through,
    /// sampling at half-voxel steps between both endpoints inclusive.
    fn insert_segment(&mut self, segment: SegmentRef, begin: &Point3, end: &Point3) {
        let length = begin.distance(end);
        let step = self.voxel_size / 2.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = ((length / step).ceil() as usize).max(1);

        let mut last_cell = None;
        for i in 0..=samples {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / samples as f64;
            let cell = self.cell_of(&begin.lerp(end, t));
            if last_cell == Some(cell) {
                continue;
            }
            let entry = self.cells.entry(cell).or_default();
            if entry.last() != Some(&segment) {
                entry.push(segment);
            }
            last_cell = Some(cell);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, point: &Point3) -> (i32, i32, i32) {
        (
            (point.x / self.voxel_size).floor() as i32,
            (point.y / self.voxel_size).floor() as i32,
            (point.z / self.voxel_size).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcirc_core::{build_morphology, RawMorphology, SectionType};

    fn straight_morphology() -> Morphology {
        // Soma at the origin, a 10 um axon along +x, a 6 um dendrite
        // along +y.
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
        ];
        let mut diameters = vec![1.0, 1.0];

        for i in 0..3 {
            points.push(Point3::new(f64::from(i) * 5.0, 0.0, 0.0));
            diameters.push(0.5);
        }
        for i in 0..3 {
            points.push(Point3::new(0.0, f64::from(i) * 3.0, 0.0));
            diameters.push(0.5);
        }

        let raw = RawMorphology {
            points,
            diameters,
            section_start: vec![0, 2, 5],
            section_type: vec![
                SectionType::Soma,
                SectionType::Axon,
                SectionType::Dendrite,
            ],
            section_parent: vec![None, Some(0), Some(0)],
        };
        build_morphology(raw).unwrap()
    }

    #[test]
    fn test_query_hits_segment_midpoint() {
        let morph = straight_morphology();
        let map = VoxelMap::build(&morph, 2.0).unwrap();

        // Midpoint of axon segment 0 (x in [0, 5]).
        let hits = map.query(&Point3::new(2.5, 0.0, 0.0));
        assert!(hits.contains(&SegmentRef {
            section: 1,
            segment: 0
        }));
    }

    #[test]
    fn test_query_far_away_is_empty() {
        let morph = straight_morphology();
        let map = VoxelMap::build(&morph, 2.0).unwrap();
        assert!(map.query(&Point3::new(100.0, 100.0, 100.0)).is_empty());
    }

    #[test]
    fn test_long_segment_fills_intermediate_voxels() {
        let morph = straight_morphology();
        let map = VoxelMap::build(&morph, 1.0).unwrap();
        // Every voxel along the 10 um axon must know the cable.
        for x in [0.5, 1.5, 3.5, 6.5, 9.5] {
            assert!(
                !map.query(&Point3::new(x, 0.0, 0.0)).is_empty(),
                "no segment registered at x = {x}"
            );
        }
    }

    #[test]
    fn test_neighborhood_spans_adjacent_cells() {
        let morph = straight_morphology();
        let map = VoxelMap::build(&morph, 2.0).unwrap();

        // A point one voxel off the dendrite still sees it through the
        // 27-cell neighborhood.
        let hits = map.query_neighborhood(&Point3::new(2.5, 4.0, 0.0));
        assert!(hits
            .iter()
            .any(|s| s.section == 2));
    }
}
