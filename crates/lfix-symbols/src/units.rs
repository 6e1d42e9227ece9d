//! Mapping from source files to output units

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Decides which output file each source file's symbols land in.
///
/// Files are matched by basename. Unmapped headers go to `header_unit`,
/// everything else unmapped to `source_unit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMap {
    pub units: BTreeMap<String, String>,
    pub header_unit: String,
    pub source_unit: String,
}

impl OutputMap {
    pub fn new(
        units: BTreeMap<String, String>,
        header_unit: impl Into<String>,
        source_unit: impl Into<String>,
    ) -> Self {
        Self {
            units,
            header_unit: header_unit.into(),
            source_unit: source_unit.into(),
        }
    }

    pub fn unit_for(&self, path: &str) -> &str {
        if let Some(unit) = self.units.get(basename(path)) {
            return unit;
        }
        if path.ends_with(".h") {
            &self.header_unit
        } else {
            &self.source_unit
        }
    }

    /// Sorted basenames of the sources mapped to `unit`
    pub fn sources_of(&self, unit: &str) -> Vec<&str> {
        self.units
            .iter()
            .filter(|(_, u)| u.as_str() == unit)
            .map(|(source, _)| source.as_str())
            .collect()
    }

    /// Sorted basenames of all mapped sources
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }
}

pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}
