use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use genotype::{ColumnKind, SampleRow, SampleTable};
use located_error::prelude::*;

use crate::error::IoError;

/// Read a sample annotation file: column headings on line 1, column-type
/// tags on line 2, one row per sample thereafter (§6).
///
/// # Errors
/// `OpenFile` if `path` cannot be opened; `MalformedRow` if a data row's
/// field count disagrees with the header; propagates [`SampleTable::validate_schema`]
/// failures for a missing mandatory column.
pub fn read_sample_table(path: impl AsRef<Path>) -> anyhow::Result<SampleTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::OpenFile(path.to_path_buf(), e))
        .loc("While opening a sample annotation file")?;
    let mut lines = BufReader::new(file).lines();

    let header = lines.next()
        .ok_or_else(|| IoError::MalformedRow{path: path.to_path_buf(), line: 1, reason: "missing header line".into()})?
        .map_err(|e| IoError::OpenFile(path.to_path_buf(), e))?;
    let columns: Vec<String> = header.split_whitespace().map(String::from).collect();

    let tag_line = lines.next()
        .ok_or_else(|| IoError::MalformedRow{path: path.to_path_buf(), line: 2, reason: "missing column-type line".into()})?
        .map_err(|e| IoError::OpenFile(path.to_path_buf(), e))?;
    let kinds: Vec<ColumnKind> = tag_line.split_whitespace().map(ColumnKind::from_tag).collect::<anyhow::Result<_>>()
        .with_loc(|| format!("While parsing column-type tags of '{}'", path.display()))?;

    let mut table = SampleTable::new(columns, kinds);
    table.validate_schema().with_loc(|| format!("While validating the schema of '{}'", path.display()))?;

    for (offset, line) in lines.enumerate() {
        let line = line.map_err(|e| IoError::OpenFile(path.to_path_buf(), e))?;
        if line.trim().is_empty() { continue }
        let fields: Vec<String> = line.split_whitespace().map(String::from).collect();
        if fields.len() != table.columns.len() {
            return Err(IoError::MalformedRow{
                path: path.to_path_buf(), line: offset + 3,
                reason: format!("expected {} fields, found {}", table.columns.len(), fields.len()),
            }).loc("While reading a sample annotation row");
        }
        table.rows.push(SampleRow::new(fields));
    }
    Ok(table)
}

/// Write a sample annotation table back out, preserving header, type tags,
/// and row order.
///
/// # Errors
/// `OpenFile` if `path` cannot be created.
pub fn write_sample_table(path: impl AsRef<Path>, table: &SampleTable) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::OpenFile(path.to_path_buf(), e))
        .loc("While creating a sample annotation file")?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", table.columns.join(" "))?;
    let tags: Vec<&str> = table.kinds.iter().map(ColumnKind::tag).collect();
    writeln!(writer, "{}", tags.join(" "))?;
    for row in &table.rows {
        writeln!(writer, "{}", row.fields.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}
