//! Raw (unindexed) morphology arrays as read from a file.
//!
//! This is the builder's input: flat point and structure tables with no
//! derived indices. Parsers fill it column by column; `validate` checks
//! the structural invariants before any index is derived.

use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::section::{SectionId, SectionType};

/// Flat morphology tables: one entry per sample point and per section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMorphology {
    /// Sample point positions.
    pub points: Vec<Point3>,
    /// Sample point diameters (same length as `points`).
    pub diameters: Vec<f64>,
    /// First point index of each section, non-decreasing.
    pub section_start: Vec<u32>,
    /// Section type per section.
    pub section_type: Vec<SectionType>,
    /// Parent section per section; `None` for the soma only.
    pub section_parent: Vec<Option<SectionId>>,
}

impl RawMorphology {
    /// Number of sample points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.section_start.len()
    }

    /// Checks the raw structural invariants.
    ///
    /// - point and diameter tables have equal length;
    /// - section starts are non-decreasing and within the point table;
    /// - section 0 (and only section 0) has no parent;
    /// - every parent index refers to an existing section.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        let points = self.point_count();
        let sections = self.section_count();

        debug_assert_eq!(self.points.len(), self.diameters.len());
        debug_assert_eq!(self.section_type.len(), sections);
        debug_assert_eq!(self.section_parent.len(), sections);

        for (i, &start) in self.section_start.iter().enumerate() {
            if i > 0 && start < self.section_start[i - 1] {
                return Err(Error::NonMonotonicStarts {
                    section: i,
                    previous: i - 1,
                    start,
                });
            }
            if start as usize >= points {
                return Err(Error::PointCountMismatch {
                    points,
                    max_start: start,
                });
            }
        }

        for (i, parent) in self.section_parent.iter().enumerate() {
            match (i, parent) {
                (0, Some(p)) => {
                    return Err(Error::InvalidParent {
                        section: 0,
                        parent: *p,
                    })
                }
                (0, None) => {}
                (_, None) => return Err(Error::MissingParent(i)),
                (_, Some(p)) => {
                    if *p as usize >= sections || *p as usize == i {
                        return Err(Error::InvalidParent {
                            section: i,
                            parent: *p,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_raw(starts: &[u32], parents: &[Option<u32>], points: usize) -> RawMorphology {
        RawMorphology {
            points: vec![Point3::default(); points],
            diameters: vec![1.0; points],
            section_start: starts.to_vec(),
            section_type: vec![SectionType::Soma; starts.len()],
            section_parent: parents.to_vec(),
        }
    }

    #[test]
    fn test_valid_raw() {
        let raw = flat_raw(&[0, 3, 7], &[None, Some(0), Some(0)], 10);
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_decreasing_starts_rejected() {
        let raw = flat_raw(&[0, 5, 3], &[None, Some(0), Some(1)], 10);
        assert!(matches!(
            raw.validate(),
            Err(Error::NonMonotonicStarts { section: 2, .. })
        ));
    }

    #[test]
    fn test_start_past_point_table_rejected() {
        let raw = flat_raw(&[0, 12], &[None, Some(0)], 10);
        assert!(matches!(
            raw.validate(),
            Err(Error::PointCountMismatch { .. })
        ));
    }

    #[test]
    fn test_soma_with_parent_rejected() {
        let raw = flat_raw(&[0, 3], &[Some(1), Some(0)], 10);
        assert!(matches!(
            raw.validate(),
            Err(Error::InvalidParent { section: 0, .. })
        ));
    }

    #[test]
    fn test_orphan_section_rejected() {
        let raw = flat_raw(&[0, 3], &[None, None], 10);
        assert!(matches!(raw.validate(), Err(Error::MissingParent(1))));
    }

    #[test]
    fn test_out_of_range_parent_rejected() {
        let raw = flat_raw(&[0, 3], &[None, Some(9)], 10);
        assert!(matches!(
            raw.validate(),
            Err(Error::InvalidParent {
                section: 1,
                parent: 9
            })
        ));
    }
}
