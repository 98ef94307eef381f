use std::{fs::File, io::{BufWriter, Write}, path::Path};

use located_error::prelude::*;
use statistics::Value;

/// The destination for the rectangular per-variant statistics file: one
/// header row of registered names, then one row per surviving variant
/// (row index, then one formatted value per column).
pub trait StatsSink {
    fn write_header(&mut self, names: &[&str]) -> anyhow::Result<()>;
    fn write_row(&mut self, row_index: usize, values: &[Value]) -> anyhow::Result<()>;
}

/// Plain-text [`StatsSink`]: whitespace-separated columns, numbers
/// rendered to a fixed number of significant digits (5 by default,
/// matching the historical output; parameterised here rather than
/// hard-coded).
pub struct TextStatsSink {
    writer: BufWriter<File>,
    significant_digits: usize,
}

impl TextStatsSink {
    /// # Errors
    /// Propagates the underlying file-creation error.
    pub fn create(path: impl AsRef<Path>, significant_digits: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| crate::error::PipelineError::OpenFile(path.to_path_buf(), e)).loc("While creating the statistics output file")?;
        Ok(Self{writer: BufWriter::new(file), significant_digits})
    }
}

impl StatsSink for TextStatsSink {
    fn write_header(&mut self, names: &[&str]) -> anyhow::Result<()> {
        writeln!(self.writer, "row_index {}", names.join(" ")).loc("While writing the statistics file header")?;
        Ok(())
    }

    fn write_row(&mut self, row_index: usize, values: &[Value]) -> anyhow::Result<()> {
        let rendered: Vec<String> = values.iter().map(|v| v.display(self.significant_digits)).collect();
        writeln!(self.writer, "{row_index} {}", rendered.join(" ")).loc("While writing a statistics file row")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        {
            let mut sink = TextStatsSink::create(&path, 5).unwrap();
            sink.write_header(&["SNPID", "MAF"]).unwrap();
            sink.write_row(1, &[Value::Text("snp1".into()), Value::Number(0.123_456)]).unwrap();
        }
        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "row_index SNPID MAF");
        assert_eq!(lines.next().unwrap(), "1 snp1 0.12346");
    }
}
