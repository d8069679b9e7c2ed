use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::STEM_INDEX_FILENAME;
use crate::error::Result;
use crate::layout::ChannelLayout;

/// Sidecar describing how stems map onto channels of the assembled stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemIndex {
    pub order: Vec<String>,
    pub channel_layout: String,
    pub channel_count: usize,
}

impl StemIndex {
    pub fn new(order: Vec<String>, layout: &ChannelLayout) -> Self {
        Self {
            channel_count: order.len(),
            channel_layout: layout.name().to_string(),
            order,
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(STEM_INDEX_FILENAME)
    }

    /// Write the index into `dir`, replacing any previous one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Read the index from `dir`.
    ///
    /// A missing, unparsable or self-inconsistent index yields `None`.
    pub fn read(dir: &Path) -> Option<Self> {
        let path = Self::path_in(dir);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return None,
        };
        let index: Self = match serde_json::from_str(&contents) {
            Ok(index) => index,
            Err(err) => {
                warn!("ignoring unreadable stem index {}: {}", path.display(), err);
                return None;
            }
        };
        if index.order.is_empty() || index.order.len() != index.channel_count {
            warn!(
                "ignoring stem index {}: {} names for {} channels",
                path.display(),
                index.order.len(),
                index.channel_count
            );
            return None;
        }
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::resolve_layout;

    #[test]
    fn index_uses_the_documented_field_names() {
        let index = StemIndex::new(
            vec!["vocals".into(), "bass".into(), "other".into()],
            &resolve_layout(3),
        );
        let value = serde_json::to_value(&index).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "order": ["vocals", "bass", "other"],
                "channel_layout": "3.0",
                "channel_count": 3
            })
        );
    }

    #[test]
    fn written_index_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = StemIndex::new(vec!["drums".into()], &resolve_layout(1));
        let path = index.write(dir.path()).expect("write");
        assert!(path.ends_with(STEM_INDEX_FILENAME));
        assert_eq!(StemIndex::read(dir.path()), Some(index));
    }

    #[test]
    fn invalid_index_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(StemIndex::read(dir.path()), None);

        std::fs::write(StemIndex::path_in(dir.path()), "{not json").expect("write");
        assert_eq!(StemIndex::read(dir.path()), None);

        std::fs::write(
            StemIndex::path_in(dir.path()),
            r#"{"order": ["vocals"], "channel_layout": "stereo", "channel_count": 2}"#,
        )
        .expect("write");
        assert_eq!(StemIndex::read(dir.path()), None);
    }
}
