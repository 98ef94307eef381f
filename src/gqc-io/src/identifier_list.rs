use std::{collections::HashSet, fs::File, io::Read, path::Path};

use located_error::prelude::*;

use crate::error::IoError;

/// Load the union of whitespace-separated tokens across one or more
/// identifier-list files, eagerly (§5: identifier-list sets are built once
/// at construction and are immutable thereafter, so they can be shared
/// freely by multiple filters).
///
/// # Errors
/// `IdentifierListMissing` if any file cannot be opened.
pub fn load_identifier_set(paths: &[impl AsRef<Path>]) -> anyhow::Result<HashSet<String>> {
    let mut tokens = HashSet::new();
    for path in paths {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .map_err(|_| IoError::IdentifierListMissing(path.to_path_buf()))
            .with_loc(|| format!("While opening identifier-list file '{}'", path.display()))?
            .read_to_string(&mut contents)
            .with_loc(|| format!("While reading identifier-list file '{}'", path.display()))?;
        tokens.extend(contents.split_whitespace().map(String::from));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn merges_tokens_from_multiple_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "rs1 rs2\nrs3").unwrap();
        std::fs::write(&b, "rs3 rs4").unwrap();

        let set = load_identifier_set(&[a, b]).unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.contains("rs1"));
        assert!(set.contains("rs4"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(load_identifier_set(&[missing]).is_err());
    }
}
