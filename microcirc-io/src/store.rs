//! Label-keyed morphology cache.
//!
//! Many neurons instantiate the same reconstructed morphology; the store
//! parses and builds each label once and hands out shared [`Arc`]s. Bulk
//! loads fan the parse/build work out with rayon.

use crate::config::MorphologyFormat;
use crate::error::Result;
use crate::morphology::read_morphology;
use log::info;
use microcirc_core::{build_morphology, Morphology};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache of built morphologies under one directory, keyed by label.
/// The file for label `L` is `{directory}/L.h5`.
pub struct MorphologyStore {
    directory: PathBuf,
    format: MorphologyFormat,
    cache: HashMap<String, Arc<Morphology>>,
}

impl MorphologyStore {
    /// Creates an empty store over a morphology directory.
    pub fn new<P: AsRef<Path>>(directory: P, format: MorphologyFormat) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            format,
            cache: HashMap::new(),
        }
    }

    /// Returns the cached morphology for a label, if already loaded.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<Arc<Morphology>> {
        self.cache.get(label).cloned()
    }

    /// Returns the morphology for a label, parsing and building it on a
    /// cache miss. Repeated calls for the same label share one allocation.
    ///
    /// # Errors
    /// Returns a format or build error when the file is unreadable or its
    /// topology is inconsistent.
    pub fn load(&mut self, label: &str) -> Result<Arc<Morphology>> {
        if let Some(cached) = self.cache.get(label) {
            return Ok(Arc::clone(cached));
        }
        let built = load_one(&self.directory, label, &self.format)?;
        self.cache.insert(label.to_string(), Arc::clone(&built));
        Ok(built)
    }

    /// Loads every distinct label in parallel. Already-cached labels are
    /// skipped; the first failing label aborts the batch.
    ///
    /// # Errors
    /// Returns the error of the first label that fails to parse or build.
    pub fn load_all<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<()> {
        let mut missing: Vec<&str> = labels
            .iter()
            .map(AsRef::as_ref)
            .filter(|label| !self.cache.contains_key(*label))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if missing.is_empty() {
            return Ok(());
        }
        info!("loading {} morphologies", missing.len());

        let loaded: Vec<(String, Arc<Morphology>)> = missing
            .par_iter()
            .map(|label| {
                load_one(&self.directory, label, &self.format)
                    .map(|built| ((*label).to_string(), built))
            })
            .collect::<Result<_>>()?;

        self.cache.extend(loaded);
        Ok(())
    }

    /// Number of cached morphologies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn load_one(
    directory: &Path,
    label: &str,
    format: &MorphologyFormat,
) -> Result<Arc<Morphology>> {
    let path = directory.join(format!("{label}.h5"));
    let raw = read_morphology(&path, format)?;
    Ok(Arc::new(build_morphology(raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ndarray::arr2;
    use tempfile::TempDir;

    fn write_fixture(dir: &Path, label: &str) {
        let file = hdf5::File::create(dir.join(format!("{label}.h5"))).unwrap();

        let points = arr2(&[
            [0.0, 0.0, 0.0, 2.0],
            [1.0, 0.0, 0.0, 2.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, -1.0, 0.0, 1.0],
        ]);
        let ds = file
            .new_dataset::<f64>()
            .shape(points.dim())
            .create("points")
            .unwrap();
        ds.write(points.view()).unwrap();

        let structure = arr2(&[[0, 1, -1], [2, 2, 0]]);
        let ds = file
            .new_dataset::<i32>()
            .shape(structure.dim())
            .create("structure")
            .unwrap();
        ds.write(structure.view()).unwrap();
    }

    #[test]
    fn test_load_caches_and_shares() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path(), "m1");

        let mut store = MorphologyStore::new(dir.path(), MorphologyFormat::V1);
        assert!(store.get("m1").is_none());

        let first = store.load("m1").unwrap();
        let second = store.load("m1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &store.get("m1").unwrap()));
        assert_eq!(store.len(), 1);
        assert_eq!(first.section_count(), 2);
    }

    #[test]
    fn test_load_all_deduplicates_labels() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path(), "m1");
        write_fixture(dir.path(), "m2");

        let mut store = MorphologyStore::new(dir.path(), MorphologyFormat::V1);
        store.load_all(&["m1", "m2", "m1"]).unwrap();
        assert_eq!(store.len(), 2);

        let cached = store.get("m2").unwrap();
        let reloaded = store.load("m2").unwrap();
        assert!(Arc::ptr_eq(&cached, &reloaded));
    }

    #[test]
    fn test_missing_file_is_format_error() {
        let dir = TempDir::new().unwrap();
        let mut store = MorphologyStore::new(dir.path(), MorphologyFormat::V1);
        assert!(matches!(store.load("absent"), Err(Error::Format(_))));
    }
}
