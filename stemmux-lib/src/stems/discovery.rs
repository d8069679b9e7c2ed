use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use super::{StemFile, StemSet};
use crate::constants::{CANONICAL_STEM_ORDER, MULTICHANNEL_FILENAME, STEM_EXTENSION};
use crate::error::{Result, StemError};

/// Order stem names: canonical instruments first in priority order, then the
/// remaining names alphabetically.
///
/// Duplicates are collapsed.
pub fn order_stem_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut remaining: Vec<String> = names.into_iter().map(Into::into).collect();
    remaining.sort();
    remaining.dedup();

    let mut ordered = Vec::with_capacity(remaining.len());
    for canonical in CANONICAL_STEM_ORDER {
        if let Some(position) = remaining.iter().position(|name| name == canonical) {
            ordered.push(remaining.remove(position));
        }
    }
    ordered.extend(remaining);
    ordered
}

/// Scan `dir` for stem files and return them in channel order.
pub fn discover_stems(dir: &Path) -> Result<StemSet> {
    if !dir.is_dir() {
        return Err(StemError::NotFound(format!(
            "stem directory {} does not exist",
            dir.display()
        )));
    }

    let mut available: HashMap<String, PathBuf> = HashMap::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if let Some(name) = candidate_name(&path) {
            // Later entries win on duplicate names.
            available.insert(name, path);
        }
    }

    if available.is_empty() {
        return Err(StemError::NotFound(format!(
            "no {} stem files found in {}",
            STEM_EXTENSION,
            dir.display()
        )));
    }

    let stems: Vec<StemFile> = order_stem_names(available.keys().cloned())
        .into_iter()
        .filter_map(|name| {
            available
                .remove(&name)
                .map(|path| StemFile { name, path })
        })
        .collect();

    debug!(
        "discovered {} stem(s) in {}: {:?}",
        stems.len(),
        dir.display(),
        stems.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
    );

    Ok(StemSet { stems })
}

fn candidate_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name == MULTICHANNEL_FILENAME {
        return None;
    }
    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case(STEM_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    (!stem.is_empty()).then(|| stem.to_string())
}
