//! The fully-indexed morphology and its read-only geometric queries.
//!
//! A [`Morphology`] is produced once by [`crate::builder::build_morphology`]
//! and never mutated afterwards; circuits share it behind an `Arc`, one
//! instance per distinct morphology label.

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Point3};
use crate::section::{SectionId, SectionType, SOMA_SECTION};
use std::ops::Range;

/// A sub-unit of a section between two consecutive sample points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub begin: Point3,
    pub end: Point3,
    pub begin_diameter: f64,
    pub end_diameter: f64,
}

impl Segment {
    /// Cable length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.begin.distance(&self.end)
    }
}

/// An immutable morphology skeleton with all derived indices.
#[derive(Debug, Clone)]
pub struct Morphology {
    // Flat tables carried over from the raw input.
    pub(crate) points: Vec<Point3>,
    pub(crate) diameters: Vec<f64>,
    pub(crate) section_start: Vec<u32>,
    pub(crate) section_type: Vec<SectionType>,
    pub(crate) section_parent: Vec<Option<SectionId>>,

    // Derived indices.
    pub(crate) section_point_count: Vec<u32>,
    pub(crate) basal_dendrite_offset: Option<SectionId>,
    pub(crate) apical_dendrite_offset: Option<SectionId>,
    pub(crate) children: Vec<Vec<SectionId>>,
    pub(crate) first_order_sections: Vec<SectionId>,
    pub(crate) branch_order: Vec<u32>,
    pub(crate) section_length: Vec<f64>,
    pub(crate) point_relative_distance: Vec<f64>,
    pub(crate) bounding_box: BoundingBox,
}

impl Morphology {
    /// Number of sample points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of sections (the soma included).
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.section_start.len()
    }

    /// Sample point positions.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Sample point diameters.
    #[must_use]
    pub fn diameters(&self) -> &[f64] {
        &self.diameters
    }

    /// Type of a section.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn section_type(&self, section: SectionId) -> Result<SectionType> {
        self.check_section(section)?;
        Ok(self.section_type[section as usize])
    }

    /// Number of sample points in a section. Always at least 1.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn section_point_count(&self, section: SectionId) -> Result<u32> {
        self.check_section(section)?;
        Ok(self.section_point_count[section as usize])
    }

    /// Cable length of a section. Zero for single-point sections.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn section_length(&self, section: SectionId) -> Result<f64> {
        self.check_section(section)?;
        Ok(self.section_length[section as usize])
    }

    /// Normalized distance of every point from its section start, in [0, 1].
    #[must_use]
    pub fn point_relative_distances(&self) -> &[f64] {
        &self.point_relative_distance
    }

    /// Parent section id.
    ///
    /// # Errors
    /// Returns [`Error::SomaHasNoParent`] for the soma; callers must
    /// special-case section 0.
    pub fn parent_of(&self, section: SectionId) -> Result<SectionId> {
        self.check_section(section)?;
        if section == SOMA_SECTION {
            return Err(Error::SomaHasNoParent);
        }
        // Non-soma sections always have a parent after a successful build.
        Ok(self.section_parent[section as usize].unwrap_or(SOMA_SECTION))
    }

    /// Child sections. The soma's children are the first-order sections.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn children_of(&self, section: SectionId) -> Result<&[SectionId]> {
        self.check_section(section)?;
        if section == SOMA_SECTION {
            Ok(&self.first_order_sections)
        } else {
            Ok(&self.children[section as usize])
        }
    }

    /// Sections attached directly to the soma.
    #[must_use]
    pub fn first_order_sections(&self) -> &[SectionId] {
        &self.first_order_sections
    }

    /// Branch order per section; the soma is 0, its children 1.
    #[must_use]
    pub fn branch_orders(&self) -> &[u32] {
        &self.branch_order
    }

    /// Bounding box of every point expanded by its radius.
    #[must_use]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// All section ids, the soma included.
    #[must_use]
    pub fn all_sections(&self) -> Range<SectionId> {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.section_count() as SectionId;
        0..count
    }

    /// Axon section ids (contiguous, starting at section 1).
    #[must_use]
    pub fn axon(&self) -> Range<SectionId> {
        let end = self
            .basal_dendrite_offset
            .or(self.apical_dendrite_offset)
            .unwrap_or_else(|| self.all_sections().end);
        1..end
    }

    /// Basal dendrite section ids; empty when the family is absent.
    #[must_use]
    pub fn basal_dendrites(&self) -> Range<SectionId> {
        match self.basal_dendrite_offset {
            Some(offset) => {
                let end = self
                    .apical_dendrite_offset
                    .unwrap_or_else(|| self.all_sections().end);
                offset..end
            }
            None => 0..0,
        }
    }

    /// Apical dendrite section ids; empty when the family is absent.
    #[must_use]
    pub fn apical_dendrites(&self) -> Range<SectionId> {
        match self.apical_dendrite_offset {
            Some(offset) => offset..self.all_sections().end,
            None => 0..0,
        }
    }

    /// All dendrite section ids, basal then apical.
    pub fn dendrites(&self) -> impl Iterator<Item = SectionId> {
        self.basal_dendrites().chain(self.apical_dendrites())
    }

    /// Point index range `[start, end)` of a section.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn section_points(&self, section: SectionId) -> Result<Range<usize>> {
        self.check_section(section)?;
        let start = self.section_start[section as usize] as usize;
        let count = self.section_point_count[section as usize] as usize;
        Ok(start..start + count)
    }

    /// Position at a normalized distance along a section.
    ///
    /// `t` is clamped to [0, 1]; `t = 0` returns exactly the first point of
    /// the section and `t = 1` exactly the last. Single-point sections
    /// return their point for any `t`.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn position_at(&self, section: SectionId, t: f64) -> Result<Point3> {
        let (lower, upper, frac) = self.bracket(section, t)?;
        Ok(self.points[lower].lerp(&self.points[upper], frac))
    }

    /// Diameter at a normalized distance along a section.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn diameter_at(&self, section: SectionId, t: f64) -> Result<f64> {
        let (lower, upper, frac) = self.bracket(section, t)?;
        let d0 = self.diameters[lower];
        let d1 = self.diameters[upper];
        Ok((d1 - d0).mul_add(frac, d0))
    }

    /// Cable distance from a normalized position on a section to the soma.
    ///
    /// The partial length of `section` at `t`, plus the full lengths of
    /// every ancestor up to (not including) the soma. The soma itself
    /// yields 0 by definition.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn path_length_to_soma(&self, section: SectionId, t: f64) -> Result<f64> {
        self.check_section(section)?;
        if section == SOMA_SECTION {
            return Ok(0.0);
        }
        let mut length = t.clamp(0.0, 1.0) * self.section_length[section as usize];
        let mut current = section;
        loop {
            let parent = self.section_parent[current as usize].unwrap_or(SOMA_SECTION);
            if parent == SOMA_SECTION {
                break;
            }
            length += self.section_length[parent as usize];
            current = parent;
        }
        Ok(length)
    }

    /// Number of segments of a section (points minus one).
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] for an unknown section id.
    pub fn segment_count(&self, section: SectionId) -> Result<u32> {
        self.check_section(section)?;
        Ok(self.section_point_count[section as usize] - 1)
    }

    /// The `segment`-th segment of a section.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] when the section or segment id
    /// is out of range.
    pub fn segment(&self, section: SectionId, segment: u32) -> Result<Segment> {
        let range = self.section_points(section)?;
        let begin = range.start + segment as usize;
        if begin + 1 >= range.end {
            return Err(Error::SectionOutOfRange {
                section,
                count: self.section_count(),
            });
        }
        Ok(Segment {
            begin: self.points[begin],
            end: self.points[begin + 1],
            begin_diameter: self.diameters[begin],
            end_diameter: self.diameters[begin + 1],
        })
    }

    /// Position at a normalized distance along one segment of a section.
    ///
    /// Used when resolving synapse endpoints, which are addressed as
    /// (section, segment, offset) triples.
    ///
    /// # Errors
    /// Returns [`Error::SectionOutOfRange`] when the section or segment id
    /// is out of range.
    pub fn segment_position(&self, section: SectionId, segment: u32, t: f64) -> Result<Point3> {
        let seg = self.segment(section, segment)?;
        Ok(seg.begin.lerp(&seg.end, t.clamp(0.0, 1.0)))
    }

    fn check_section(&self, section: SectionId) -> Result<()> {
        if (section as usize) < self.section_count() {
            Ok(())
        } else {
            Err(Error::SectionOutOfRange {
                section,
                count: self.section_count(),
            })
        }
    }

    /// Brackets `t` between two point indices of the section and returns
    /// `(lower, upper, fraction)` for interpolation.
    fn bracket(&self, section: SectionId, t: f64) -> Result<(usize, usize, f64)> {
        let range = self.section_points(section)?;
        let t = t.clamp(0.0, 1.0);

        if range.len() == 1 {
            return Ok((range.start, range.start, 0.0));
        }
        if t <= 0.0 {
            return Ok((range.start, range.start, 0.0));
        }
        if t >= 1.0 {
            return Ok((range.end - 1, range.end - 1, 0.0));
        }

        let rel = &self.point_relative_distance[range.clone()];
        // partition_point: first index whose relative distance exceeds t.
        let upper = rel.partition_point(|&d| d <= t).min(range.len() - 1);
        let lower = upper - 1;
        let span = rel[upper] - rel[lower];
        let frac = if span > 0.0 { (t - rel[lower]) / span } else { 0.0 };
        Ok((range.start + lower, range.start + upper, frac))
    }
}
