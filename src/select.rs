//! Incremental work-set selection.

use std::path::{Path, PathBuf};

use tracing::info;

/// Choose the files to process.
///
/// A full build, or an incremental build whose configuration changed,
/// processes every file. Otherwise only files `has_delta` reports as changed
/// are kept, in their original order.
pub fn select<F>(
    files: &[PathBuf],
    is_incremental: bool,
    config_changed: bool,
    mut has_delta: F,
) -> Vec<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    if !is_incremental {
        return files.to_vec();
    }
    if config_changed {
        info!("Configuration changed, processing all {} files", files.len());
        return files.to_vec();
    }

    let selected: Vec<PathBuf> = files
        .iter()
        .filter(|file| has_delta(file.as_path()))
        .cloned()
        .collect();
    if selected.is_empty() {
        info!("No files have changed, nothing to process");
    } else {
        info!("Processing {} of {} files", selected.len(), files.len());
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<PathBuf> {
        ["A.java", "B.java", "C.java"]
            .iter()
            .map(PathBuf::from)
            .collect()
    }

    #[test]
    fn test_incremental_keeps_only_changed() {
        let selected = select(&files(), true, false, |p| p == Path::new("B.java"));
        assert_eq!(selected, vec![PathBuf::from("B.java")]);
    }

    #[test]
    fn test_config_change_selects_all() {
        let selected = select(&files(), true, true, |_| false);
        assert_eq!(selected, files());
    }

    #[test]
    fn test_full_build_ignores_delta() {
        let mut asked = 0;
        let selected = select(&files(), false, false, |_| {
            asked += 1;
            false
        });
        assert_eq!(selected, files());
        assert_eq!(asked, 0);
    }

    #[test]
    fn test_nothing_changed() {
        assert!(select(&files(), true, false, |_| false).is_empty());
    }
}
