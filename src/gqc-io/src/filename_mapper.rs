use std::{fs, path::Path};

use located_error::prelude::*;

use crate::error::IoError;

/// Wildcard character recognised in input patterns and output templates.
const WILDCARD: char = '#';
/// Inclusive range of decimal integers a wildcard capture may decode to.
const WILDCARD_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Expands input wildcards, pairs each existing file with a rendered output
/// filename, and records which output index a given input maps to.
///
/// Consecutive inputs whose rendered output filename is identical share one
/// output slot; `output_index_of` exposes this many-to-one mapping.
#[derive(Debug, Clone, Default)]
pub struct FilenameMapper {
    inputs: Vec<String>,
    wildcard_captures: Vec<String>,
    outputs: Vec<String>,
    input_to_output: Vec<usize>,
}

impl FilenameMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand `input_pattern` against the filesystem, render one output
    /// filename per match, and extend the mapper.
    ///
    /// # Errors
    /// `WildcardMismatch` / `WildcardPresenceMismatch` if the pattern or
    /// template carry more than one wildcard, or disagree on whether a
    /// wildcard is present at all; `NoMatch` if the pattern matched nothing.
    pub fn add_pair(&mut self, input_pattern: &str, output_template: &str) -> anyhow::Result<()> {
        let context = || format!("While mapping input pattern '{input_pattern}' to output template '{output_template}'");

        let input_wildcard = split_on_wildcard(input_pattern).with_loc(context)?;
        let output_has_wildcard = output_template.matches(WILDCARD).count() == 1;
        if output_has_wildcard != input_wildcard.is_some() {
            return Err(IoError::WildcardPresenceMismatch{
                input: input_pattern.to_string(),
                output: output_template.to_string(),
            }).with_loc(context);
        }

        let matches = match input_wildcard {
            None => {
                if Path::new(input_pattern).is_file() {
                    vec![(input_pattern.to_string(), String::new())]
                } else {
                    Vec::new()
                }
            }
            Some((prefix, suffix)) => find_wildcard_matches(input_pattern, prefix, suffix)?,
        };

        if matches.is_empty() {
            return Err(IoError::NoMatch(input_pattern.to_string())).with_loc(context);
        }

        for (path, capture) in matches {
            let output = if capture.is_empty() {
                output_template.to_string()
            } else {
                output_template.replacen(WILDCARD, &capture, 1)
            };
            self.inputs.push(path);
            self.wildcard_captures.push(capture);
            if self.outputs.last() != Some(&output) {
                self.outputs.push(output);
            }
            self.input_to_output.push(self.outputs.len() - 1);
        }
        Ok(())
    }

    /// Apply `add_pair` pairwise; the two lists must have equal length.
    ///
    /// # Errors
    /// `Cardinality` if the list lengths differ.
    pub fn add_pairs(&mut self, inputs: &[String], outputs: &[String]) -> anyhow::Result<()> {
        if inputs.len() != outputs.len() {
            return Err(IoError::Cardinality{inputs: inputs.len(), outputs: outputs.len()})
                .loc("While mapping input/output lists pairwise");
        }
        for (input, output) in inputs.iter().zip(outputs) {
            self.add_pair(input, output)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn input_count(&self) -> usize { self.inputs.len() }

    #[must_use]
    pub fn output_count(&self) -> usize { self.outputs.len() }

    #[must_use]
    pub fn input(&self, i: usize) -> Option<&str> { self.inputs.get(i).map(String::as_str) }

    #[must_use]
    pub fn output(&self, j: usize) -> Option<&str> { self.outputs.get(j).map(String::as_str) }

    #[must_use]
    pub fn matched_wildcard_part(&self, i: usize) -> Option<&str> { self.wildcard_captures.get(i).map(String::as_str) }

    #[must_use]
    pub fn output_index_of(&self, i: usize) -> Option<usize> { self.input_to_output.get(i).copied() }
}

/// Split `pattern` into `(prefix, suffix)` around its single wildcard.
///
/// # Errors
/// `WildcardMismatch` if `pattern` contains more than one wildcard character.
fn split_on_wildcard(pattern: &str) -> Result<Option<(&str, &str)>, IoError> {
    match pattern.matches(WILDCARD).count() {
        0 => Ok(None),
        1 => {
            let idx = pattern.find(WILDCARD).expect("just counted one occurrence");
            Ok(Some((&pattern[..idx], &pattern[idx + WILDCARD.len_utf8()..])))
        }
        _ => Err(IoError::WildcardMismatch(pattern.to_string())),
    }
}

/// List the parent directory of `pattern` and retain entries whose filename
/// starts with `prefix`, ends with `suffix`, and whose captured middle
/// segment decodes as a decimal integer in `WILDCARD_RANGE`. Results are
/// ordered by that integer.
fn find_wildcard_matches(pattern: &str, prefix: &str, suffix: &str) -> anyhow::Result<Vec<(String, String)>> {
    let pattern_path = Path::new(pattern);
    let (dir, prefix, suffix) = match pattern_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => (parent.to_path_buf(), strip_dir(prefix, parent), suffix),
        None => (Path::new(".").to_path_buf(), prefix, suffix),
    };

    let mut matches = Vec::new();
    let Ok(entries) = fs::read_dir(&dir) else { return Ok(matches) };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(capture) = name.strip_prefix(prefix).and_then(|rest| rest.strip_suffix(suffix)) else { continue };
        let Ok(value) = capture.parse::<u32>() else { continue };
        if !WILDCARD_RANGE.contains(&value) { continue }
        let full_path = dir.join(name);
        matches.push((value, full_path.to_string_lossy().into_owned(), capture.to_string()));
    }
    matches.sort_by_key(|(value, ..)| *value);
    Ok(matches.into_iter().map(|(_, path, capture)| (path, capture)).collect())
}

fn strip_dir<'a>(prefix: &'a str, parent: &Path) -> &'a str {
    let parent_str = parent.to_string_lossy();
    prefix.strip_prefix(parent_str.as_ref()).map_or(prefix, |rest| rest.trim_start_matches(std::path::MAIN_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn single_file_no_wildcard() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.gen");
        File::create(&path).unwrap();

        let mut mapper = FilenameMapper::new();
        mapper.add_pair(path.to_str().unwrap(), "out.gen").unwrap();
        assert_eq!(mapper.input_count(), 1);
        assert_eq!(mapper.output_count(), 1);
        assert_eq!(mapper.output(0), Some("out.gen"));
        assert_eq!(mapper.matched_wildcard_part(0), Some(""));
    }

    #[test]
    fn wildcard_expands_in_range_and_orders_numerically() {
        let dir = tempdir().unwrap();
        for n in [2, 1, 22, 101, 0] {
            File::create(dir.path().join(format!("chr{n}.gen"))).unwrap();
        }
        let pattern = dir.path().join("chr#.gen");
        let mut mapper = FilenameMapper::new();
        mapper.add_pair(pattern.to_str().unwrap(), "out_#.gen").unwrap();

        // 0 and 101 are out of [1,100] and must be dropped.
        assert_eq!(mapper.input_count(), 3);
        assert_eq!(mapper.matched_wildcard_part(0), Some("1"));
        assert_eq!(mapper.matched_wildcard_part(1), Some("2"));
        assert_eq!(mapper.matched_wildcard_part(2), Some("22"));
        assert_eq!(mapper.output(2), Some("out_22.gen"));
    }

    #[test]
    fn no_match_is_an_error() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("missing#.gen");
        let mut mapper = FilenameMapper::new();
        assert!(mapper.add_pair(pattern.to_str().unwrap(), "out_#.gen").is_err());
    }

    #[test]
    fn wildcard_presence_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("chr1.gen")).unwrap();
        let pattern = dir.path().join("chr#.gen");
        let mut mapper = FilenameMapper::new();
        assert!(mapper.add_pair(pattern.to_str().unwrap(), "out.gen").is_err());
    }

    #[test]
    fn consecutive_same_output_is_deduplicated() {
        let dir = tempdir().unwrap();
        for n in [1, 2, 3] {
            File::create(dir.path().join(format!("chr{n}.gen"))).unwrap();
        }
        let pattern = dir.path().join("chr#.gen");
        let mut mapper = FilenameMapper::new();
        mapper.add_pair(pattern.to_str().unwrap(), "merged.gen").unwrap();

        assert_eq!(mapper.input_count(), 3);
        assert_eq!(mapper.output_count(), 1);
        assert_eq!(mapper.output_index_of(0), Some(0));
        assert_eq!(mapper.output_index_of(2), Some(0));
    }

    #[test]
    fn cardinality_mismatch_is_rejected() {
        let mut mapper = FilenameMapper::new();
        let inputs = vec!["a".to_string(), "b".to_string()];
        let outputs = vec!["only-one".to_string()];
        assert!(mapper.add_pairs(&inputs, &outputs).is_err());
    }
}
