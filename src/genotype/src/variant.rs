use located_error::prelude::*;

use crate::{allele::Allele, chromosome::Chromosome, error::GenotypeError, triple::GenotypeTriple};

/// Identifying fields of a variant, shared by both the owned and the
/// borrowed record flavours.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub snp_id: String,
    pub rs_id: String,
    pub chromosome: Chromosome,
    pub position: u32,
    pub allele1: Allele,
    pub allele2: Allele,
}

impl Identification {
    #[must_use]
    pub fn new(snp_id: impl Into<String>, rs_id: impl Into<String>, chromosome: Chromosome, position: u32, allele1: Allele, allele2: Allele) -> Self {
        Self{snp_id: snp_id.into(), rs_id: rs_id.into(), chromosome, position, allele1, allele2}
    }
}

impl Default for Identification {
    fn default() -> Self {
        Self{snp_id: String::new(), rs_id: String::new(), chromosome: Chromosome::Unknown, position: 0, allele1: Allele::N, allele2: Allele::N}
    }
}

/// Abstracts over who owns the backing `Vec<GenotypeTriple>` of a
/// [`Variant`]: the record itself ([`VariantRecord`]), or caller-supplied
/// storage borrowed for the duration of one read ([`BorrowedVariant`]).
///
/// This is how the two record subtypes described by the data model stay
/// observationally identical while letting the main loop reuse a single
/// allocation instead of reallocating every variant.
pub trait TripleStorage {
    fn as_slice(&self) -> &[GenotypeTriple];
    fn as_mut_slice(&mut self) -> &mut [GenotypeTriple];
    fn push(&mut self, t: GenotypeTriple);
    fn resize(&mut self, n: usize);
    fn truncate_to(&mut self, indices_to_remove: &[usize]);
}

impl TripleStorage for Vec<GenotypeTriple> {
    fn as_slice(&self) -> &[GenotypeTriple] { self }
    fn as_mut_slice(&mut self) -> &mut [GenotypeTriple] { self }
    fn push(&mut self, t: GenotypeTriple) { Vec::push(self, t); }
    fn resize(&mut self, n: usize) { Vec::resize(self, n, GenotypeTriple::default()); }
    fn truncate_to(&mut self, indices_to_remove: &[usize]) {
        let mut keep_iter = indices_to_remove.iter().peekable();
        let mut write = 0usize;
        for read in 0..self.len() {
            if keep_iter.peek() == Some(&&read) {
                keep_iter.next();
                continue;
            }
            self.swap(write, read);
            write += 1;
        }
        self.truncate(write);
    }
}

impl TripleStorage for &mut Vec<GenotypeTriple> {
    fn as_slice(&self) -> &[GenotypeTriple] { self.as_ref() }
    fn as_mut_slice(&mut self) -> &mut [GenotypeTriple] { self.as_mut() }
    fn push(&mut self, t: GenotypeTriple) { Vec::push(self, t); }
    fn resize(&mut self, n: usize) { Vec::resize(self, n, GenotypeTriple::default()); }
    fn truncate_to(&mut self, indices_to_remove: &[usize]) {
        TripleStorage::truncate_to(*self, indices_to_remove);
    }
}

/// A single SNP: identification fields plus an ordered sequence of
/// per-sample genotype-probability triples.
///
/// Generic over its triple storage so the same implementation backs both
/// the owned [`VariantRecord`] and the caller-storage-backed
/// [`BorrowedVariant`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variant<S> {
    pub id: Identification,
    triples: S,
}

pub type VariantRecord = Variant<Vec<GenotypeTriple>>;
pub type BorrowedVariant<'a> = Variant<&'a mut Vec<GenotypeTriple>>;

impl VariantRecord {
    #[must_use]
    pub fn new(n_samples: usize) -> Self {
        Self{id: Identification::default(), triples: vec![GenotypeTriple::default(); n_samples]}
    }

    #[must_use]
    pub fn empty() -> Self {
        Self{id: Identification::default(), triples: Vec::new()}
    }
}

impl<'a> BorrowedVariant<'a> {
    #[must_use]
    pub fn new(storage: &'a mut Vec<GenotypeTriple>) -> Self {
        Self{id: Identification::default(), triples: storage}
    }
}

impl<S: TripleStorage> Variant<S> {
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.triples.as_slice().len()
    }

    #[must_use]
    pub fn triples(&self) -> &[GenotypeTriple] {
        self.triples.as_slice()
    }

    pub fn triples_mut(&mut self) -> &mut [GenotypeTriple] {
        self.triples.as_mut_slice()
    }

    pub fn triple(&self, i: usize) -> Option<&GenotypeTriple> {
        self.triples.as_slice().get(i)
    }

    /// Append one genotype triple, growing the record by one sample.
    pub fn add_genotype_triple(&mut self, t: GenotypeTriple) {
        self.triples.push(t);
    }

    /// Resize to `n` samples, zero-initialising any newly introduced triples.
    pub fn set_number_of_samples(&mut self, n: usize) {
        self.triples.resize(n);
    }

    /// Remove the per-sample triples at the given indices, in place, and
    /// shrink the record's sample count accordingly. Preserves the
    /// relative order of the remaining samples.
    ///
    /// # Errors
    /// `GenotypeError::IndexOutOfRange` if any index is out of bounds, or
    /// `GenotypeError::UnsortedIndexSet` if `sorted_indices` is not sorted
    /// ascending.
    pub fn filter_out_samples_by_index(&mut self, sorted_indices: &[usize]) -> anyhow::Result<()> {
        let n = self.n_samples();
        let mut prev = None;
        for &idx in sorted_indices {
            if idx >= n {
                return Err(GenotypeError::IndexOutOfRange{index: idx, n_samples: n}).loc("While filtering out samples by index");
            }
            if let Some(p) = prev {
                if idx <= p {
                    return Err(GenotypeError::UnsortedIndexSet(idx, p)).loc("While filtering out samples by index");
                }
            }
            prev = Some(idx);
        }
        self.triples.truncate_to(sorted_indices);
        Ok(())
    }

    /// Swap the first/second allele labels and `p_AA`/`p_BB` in every
    /// triple. `p_AB` and alleles-symmetric derived statistics are
    /// unaffected.
    pub fn flip_alleles(&mut self) {
        std::mem::swap(&mut self.id.allele1, &mut self.id.allele2);
        for t in self.triples.as_mut_slice() {
            t.flip();
        }
    }

    #[must_use]
    pub fn approx_eq(&self, other: &Variant<impl TripleStorage>, tolerance: f64) -> bool {
        self.id == other.id
            && self.n_samples() == other.n_samples()
            && self.triples().iter().zip(other.triples()).all(|(a, b)| a.approx_eq(b, tolerance))
    }
}
