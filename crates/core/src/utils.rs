use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Marker appended to the input file stem to name the report
pub const OUTPUT_SUFFIX: &str = "_PARSED";

/// Keeps the first occurrence of each value, preserving the original order
pub fn dedup_preserving_order<T>(values: Vec<T>) -> Vec<T>
where
    T: Eq + std::hash::Hash + Clone,
{
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Report path for an input: same directory, `<stem>_PARSED.csv`
pub fn derive_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}{}.csv", stem, OUTPUT_SUFFIX);
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserving_order() {
        assert_eq!(dedup_preserving_order(vec!["a", "b", "a", "c"]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_preserving_order(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_dedup_is_exact_match_only() {
        assert_eq!(
            dedup_preserving_order(vec!["A", "a", "a ", "A"]),
            vec!["A", "a", "a "]
        );
    }

    #[test]
    fn test_derive_output_path_csv() {
        assert_eq!(
            derive_output_path(Path::new("/data/parcels.csv")),
            PathBuf::from("/data/parcels_PARSED.csv")
        );
    }

    #[test]
    fn test_derive_output_path_zip() {
        assert_eq!(
            derive_output_path(Path::new("/data/export.2024.zip")),
            PathBuf::from("/data/export.2024_PARSED.csv")
        );
    }

    #[test]
    fn test_derive_output_path_relative() {
        assert_eq!(
            derive_output_path(Path::new("parcels.csv")),
            PathBuf::from("parcels_PARSED.csv")
        );
    }

    #[test]
    fn test_derive_output_path_is_deterministic() {
        let input = Path::new("dir/input.CSV");
        assert_eq!(derive_output_path(input), derive_output_path(input));
    }
}
