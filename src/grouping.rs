//! Discovery of source photos and their grouping into numbered SKU sets.

use crate::error::{ProcessError, Result};
use crate::sku::{extract_sku, Sku};
use glob::Pattern;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions picked up from an input scope. Anything else is ignored.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "gif"];

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lists regular files directly inside `dir` with one of `extensions` whose
/// file name matches `pattern`. The result is in no particular order.
pub fn list_files(dir: &Path, extensions: &[&str], pattern: &Pattern) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ProcessError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ProcessError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }
        if !pattern.matches(&file_name_of(&path)) {
            debug!(file = %path.display(), "excluded by file pattern");
            continue;
        }
        files.push(path);
    }
    Ok(files)
}

/// Accepted source photos directly inside `dir`.
pub fn discover_images(dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>> {
    list_files(dir, ACCEPTED_EXTENSIONS, pattern)
}

/// Source files sharing one SKU, in ordinal order.
#[derive(Debug, Clone)]
pub struct SkuGroup {
    pub sku: Sku,
    pub files: Vec<PathBuf>,
}

impl SkuGroup {
    /// `(ordinal, file)` pairs, ordinals starting at 1.
    pub fn ordinals(&self) -> impl Iterator<Item = (u32, &Path)> + '_ {
        self.files
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32 + 1, p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Grouping {
    /// Iterates in lexicographic SKU order.
    pub groups: BTreeMap<Sku, SkuGroup>,
    /// Files whose name yielded no SKU.
    pub skipped: Vec<PathBuf>,
}

/// Buckets `files` by SKU and sorts each bucket by case-insensitive file name.
/// Input order has no influence on the resulting ordinals.
pub fn group_by_sku(files: Vec<PathBuf>) -> Grouping {
    let mut grouping = Grouping::default();

    for path in files {
        match extract_sku(&file_name_of(&path)) {
            Ok(sku) => grouping
                .groups
                .entry(sku.clone())
                .or_insert_with(|| SkuGroup {
                    sku,
                    files: Vec::new(),
                })
                .files
                .push(path),
            Err(_) => grouping.skipped.push(path),
        }
    }

    for group in grouping.groups.values_mut() {
        group.files.sort_by_cached_key(|p| {
            let name = file_name_of(p);
            (name.to_lowercase(), name)
        });
    }
    grouping.skipped.sort();

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/in").join(n)).collect()
    }

    fn names(group: &SkuGroup) -> Vec<(u32, String)> {
        group
            .ordinals()
            .map(|(n, p)| (n, file_name_of(p)))
            .collect()
    }

    #[test]
    fn test_group_by_sku_buckets_case_insensitively() {
        let grouping = group_by_sku(paths(&["abc123_front.jpg", "ABC123_back.jpg", "def456.png"]));

        let skus: Vec<&str> = grouping.groups.keys().map(|s| s.as_str()).collect();
        assert_eq!(skus, vec!["abc123", "def456"]);
        assert!(grouping.skipped.is_empty());

        let abc = &grouping.groups[&Sku::new("abc123").unwrap()];
        assert_eq!(
            names(abc),
            vec![
                (1, "ABC123_back.jpg".to_string()),
                (2, "abc123_front.jpg".to_string())
            ]
        );
    }

    #[test]
    fn test_ordinals_independent_of_input_order() {
        let forward = ["p1_a.jpg", "P1_B.jpg", "p1_c.jpg", "p1_D.png"];
        let mut reversed = forward;
        reversed.reverse();
        let shuffled = ["p1_c.jpg", "p1_a.jpg", "p1_D.png", "P1_B.jpg"];

        let expected = names(&group_by_sku(paths(&forward)).groups.into_values().next().unwrap());
        for order in [reversed, shuffled] {
            let group = group_by_sku(paths(&order)).groups.into_values().next().unwrap();
            assert_eq!(names(&group), expected);
        }

        let ordinals: Vec<u32> = expected.iter().map(|(n, _)| *n).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unextractable_files_are_skipped() {
        let grouping = group_by_sku(paths(&["_unknown.jpg", "__.png", "ok1.jpg"]));
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.skipped.len(), 2);
    }

    #[test]
    fn test_discover_images_filters_extensions() {
        let dir = TempDir::new().unwrap();
        for name in ["a_1.JPG", "b.png", "c.webp", "d.gif", "e.bmp", "f.jpeg", "notes.txt", "raw.tiff"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let all = Pattern::new("*").unwrap();
        let mut found: Vec<String> = discover_images(dir.path(), &all)
            .unwrap()
            .iter()
            .map(|p| file_name_of(p))
            .collect();
        found.sort();
        assert_eq!(found, vec!["a_1.JPG", "b.png", "c.webp", "d.gif", "e.bmp", "f.jpeg"]);
    }

    #[test]
    fn test_discover_images_applies_pattern() {
        let dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.png", "c.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let jpgs = Pattern::new("*.jpg").unwrap();
        let found = discover_images(dir.path(), &jpgs).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_discover_images_missing_dir() {
        let all = Pattern::new("*").unwrap();
        let result = discover_images(Path::new("/nonexistent/prodimg/dir"), &all);
        assert!(matches!(result, Err(ProcessError::Io { .. })));
    }
}
