use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use genotype::{Allele, Chromosome, GenotypeTriple, Identification, VariantRecord};
use located_error::prelude::*;
use log::debug;

use crate::{error::IoError, sink::SnpSink, source::SnpSource};

/// Reference line format: one variant per line, whitespace-separated
/// `chromosome snp_id rs_id position allele1 allele2 (p_AA p_AB p_BB)*n`.
///
/// Grounded in qctool's plain-text `GenRow` row layout, with chromosome
/// promoted to a leading field (the original omits it from the text
/// encoding and relies on a separate per-file chromosome association,
/// which this core does not model).
const FIELDS_BEFORE_TRIPLES: usize = 5;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn open_reader(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| IoError::OpenFile(path.to_path_buf(), e))
        .loc("While opening a text-format SNP source")?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn count_variant_lines(mut reader: impl BufRead) -> anyhow::Result<usize> {
    let mut count = 0;
    let mut buf = String::new();
    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 { break }
        if !buf.trim().is_empty() { count += 1; }
    }
    Ok(count)
}

/// Whitespace-separated plain-text (optionally gzip-compressed) variant
/// source, reusing the caller-supplied [`VariantRecord`] on every read.
pub struct TextSource {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    n_samples: usize,
    total_variants: usize,
    line_no: usize,
}

impl TextSource {
    /// Open `path`, sniffing the sample count from the first non-empty line
    /// and pre-counting the remaining lines for `total_variants`.
    ///
    /// # Errors
    /// `OpenFile` if `path` cannot be opened; `MalformedRow` if the first
    /// line's field count is not `FIELDS_BEFORE_TRIPLES + 3*k`.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut probe = open_reader(&path)?;
        let mut first_line = String::new();
        let first_len = probe.read_line(&mut first_line)?;
        let total_variants = 1 + count_variant_lines(probe).unwrap_or(0);

        let (n_samples, total_variants) = if first_len == 0 || first_line.trim().is_empty() {
            (0, 0)
        } else {
            (n_samples_in_line(&first_line, &path, 1)?, total_variants)
        };

        debug!("Opened text SNP source '{}': {n_samples} samples, {total_variants} variants", path.display());
        let reader = open_reader(&path)?;
        Ok(Self{reader, path, n_samples, total_variants, line_no: 0})
    }
}

fn n_samples_in_line(line: &str, path: &Path, line_no: usize) -> anyhow::Result<usize> {
    let field_count = line.split_whitespace().count();
    let remainder = field_count.checked_sub(FIELDS_BEFORE_TRIPLES)
        .ok_or_else(|| IoError::MalformedRow{path: path.to_path_buf(), line: line_no, reason: "fewer than 5 identification fields".into()})?;
    if remainder % 3 != 0 {
        return Err(IoError::MalformedRow{
            path: path.to_path_buf(), line: line_no,
            reason: "trailing genotype fields are not a multiple of 3".into(),
        }).loc("While sniffing the sample count of a text SNP source");
    }
    Ok(remainder / 3)
}

impl SnpSource for TextSource {
    fn n_samples(&self) -> usize {
        self.n_samples
    }

    fn total_variants(&self) -> usize {
        self.total_variants
    }

    fn read_next(&mut self, record: &mut VariantRecord) -> anyhow::Result<bool> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)
                .map_err(|e| IoError::OpenFile(self.path.clone(), e))
                .loc("While reading the next line of a text SNP source")?;
            if read == 0 { return Ok(false) }
            self.line_no += 1;
            if !line.trim().is_empty() { break }
        }

        let path = self.path.clone();
        let line_no = self.line_no;
        let bad = |reason: &str| IoError::MalformedRow{path: path.clone(), line: line_no, reason: reason.to_string()};

        let mut tokens = line.split_whitespace();
        let chromosome: Chromosome = tokens.next().ok_or_else(|| bad("missing chromosome"))?.parse()?;
        let snp_id = tokens.next().ok_or_else(|| bad("missing snp id"))?.to_string();
        let rs_id = tokens.next().ok_or_else(|| bad("missing rs id"))?.to_string();
        let position: u32 = tokens.next().ok_or_else(|| bad("missing position"))?.parse()
            .map_err(|_| bad("position is not a non-negative integer"))?;
        let allele1: Allele = tokens.next().ok_or_else(|| bad("missing first allele"))?.parse()?;
        let allele2: Allele = tokens.next().ok_or_else(|| bad("missing second allele"))?.parse()?;

        record.id = Identification::new(snp_id, rs_id, chromosome, position, allele1, allele2);
        record.set_number_of_samples(0);

        let remaining: Vec<&str> = tokens.collect();
        if remaining.len() != self.n_samples * 3 {
            return Err(bad(&format!("expected {} genotype fields, found {}", self.n_samples * 3, remaining.len())))
                .loc("While parsing a text SNP source row");
        }
        for chunk in remaining.chunks_exact(3) {
            let aa: f64 = chunk[0].parse().map_err(|_| bad("AA probability is not a float"))?;
            let ab: f64 = chunk[1].parse().map_err(|_| bad("AB probability is not a float"))?;
            let bb: f64 = chunk[2].parse().map_err(|_| bad("BB probability is not a float"))?;
            record.add_genotype_triple(GenotypeTriple::new(aa, ab, bb));
        }
        Ok(true)
    }
}

/// Mirror of [`TextSource`]: writes one whitespace-separated line per
/// variant in the same field order, gzip-compressing when `path` ends in
/// `.gz`.
pub struct TextSink {
    writer: Box<dyn Write>,
    written: usize,
}

impl TextSink {
    /// # Errors
    /// `OpenFile` if `path` cannot be created.
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| IoError::OpenFile(path.to_path_buf(), e))
            .loc("While creating a text-format SNP sink")?;
        let writer: Box<dyn Write> = if is_gzip(path) {
            Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(Self{writer, written: 0})
    }
}

impl SnpSink for TextSink {
    fn write_variant(&mut self, variant: &VariantRecord) -> anyhow::Result<()> {
        let id = &variant.id;
        write!(
            self.writer, "{} {} {} {} {} {}",
            id.chromosome, id.snp_id, id.rs_id, id.position, id.allele1, id.allele2,
        )?;
        for triple in variant.triples() {
            write!(self.writer, " {} {} {}", triple.aa, triple.ab, triple.bb)?;
        }
        writeln!(self.writer)?;
        self.written += 1;
        Ok(())
    }

    fn variants_written(&self) -> usize {
        self.written
    }
}

impl Drop for TextSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            debug!("Failed to flush text SNP sink on drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrips_through_plain_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("variants.txt");
        {
            let mut sink = TextSink::create(&path).unwrap();
            let mut record = VariantRecord::new(2);
            record.id = Identification::new("snpA", "rsA", Chromosome::Autosome(1), 100, Allele::A, Allele::G);
            record.triples_mut()[0] = GenotypeTriple::new(1.0, 0.0, 0.0);
            record.triples_mut()[1] = GenotypeTriple::new(0.0, 1.0, 0.0);
            sink.write_variant(&record).unwrap();
        }

        let mut source = TextSource::open(&path).unwrap();
        assert_eq!(source.n_samples(), 2);
        assert_eq!(source.total_variants(), 1);

        let mut record = VariantRecord::new(2);
        assert!(source.read_next(&mut record).unwrap());
        assert_eq!(record.id.snp_id, "snpA");
        assert_eq!(record.id.chromosome, Chromosome::Autosome(1));
        assert_eq!(record.triples()[0], GenotypeTriple::new(1.0, 0.0, 0.0));
        assert!(!source.read_next(&mut record).unwrap());
    }

    #[test]
    fn roundtrips_through_gzip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("variants.txt.gz");
        {
            let mut sink = TextSink::create(&path).unwrap();
            let mut record = VariantRecord::new(1);
            record.id = Identification::new("s", "r", Chromosome::X, 5, Allele::C, Allele::T);
            record.triples_mut()[0] = GenotypeTriple::new(0.2, 0.3, 0.5);
            sink.write_variant(&record).unwrap();
        }

        let mut source = TextSource::open(&path).unwrap();
        let mut record = VariantRecord::new(1);
        assert!(source.read_next(&mut record).unwrap());
        assert_eq!(record.id.chromosome, Chromosome::X);
        assert!((record.triples()[0].bb - 0.5).abs() < 1e-12);
    }

    #[test]
    fn malformed_row_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "1 snp rs 100 A G 1.0 0.0 0.0\n2 snp2 rs2 101 A G 1.0 0.0\n").unwrap();
        let mut source = TextSource::open(&path).unwrap();
        let mut record = VariantRecord::new(source.n_samples());
        assert!(source.read_next(&mut record).is_ok());
        assert!(source.read_next(&mut record).is_err());
    }
}
