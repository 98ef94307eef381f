use located_error::prelude::*;

use crate::{error::GenotypeError, triple::GenotypeTriple, variant::{TripleStorage, Variant}};

/// Per-sample derived statistics, computed once streaming has finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub missing: f64,
    pub heterozygosity: f64,
}

/// Column-wise sum of genotype probabilities, accumulated across the
/// autosomal variants of a stream.
///
/// Sex-determining variants are skipped entirely (see
/// [`crate::Chromosome::is_autosomal`]); `K`, the number of accumulated
/// autosomal variants, is tracked so [`SampleAccumulator::derive`] can
/// normalise by it rather than by the total variant count.
#[derive(Debug, Clone)]
pub struct SampleAccumulator {
    sums: Vec<GenotypeTriple>,
    n_autosomal: usize,
}

impl SampleAccumulator {
    #[must_use]
    pub fn new(n_samples: usize) -> Self {
        Self{sums: vec![GenotypeTriple::default(); n_samples], n_autosomal: 0}
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.sums.len()
    }

    #[must_use]
    pub fn n_autosomal_variants(&self) -> usize {
        self.n_autosomal
    }

    /// Add this variant's per-sample triples into the running sums.
    ///
    /// Callers are expected to have already excluded sex-determining
    /// variants (§4.7 of the pipeline driver); this method does not
    /// inspect the variant's chromosome itself, only its sample count.
    pub fn accumulate(&mut self, variant: &Variant<impl TripleStorage>) -> anyhow::Result<()> {
        if variant.n_samples() != self.sums.len() {
            return Err(GenotypeError::SampleCountMismatch{expected: self.sums.len(), got: variant.n_samples()})
                .loc("While accumulating a variant into the per-sample accumulator");
        }
        for (sum, triple) in self.sums.iter_mut().zip(variant.triples()) {
            sum.aa += triple.aa;
            sum.ab += triple.ab;
            sum.bb += triple.bb;
        }
        self.n_autosomal += 1;
        Ok(())
    }

    /// Derive `(missing, heterozygosity)` for each sample from the
    /// accumulated sums and the number of autosomal variants seen.
    /// `missing_i = 1 - (sumAA_i+sumAB_i+sumBB_i)/K`;
    /// `heterozygosity_i = sumAB_i / (sumAA_i+sumAB_i+sumBB_i)`.
    #[must_use]
    pub fn derive(&self) -> Vec<SampleStats> {
        let k = self.n_autosomal as f64;
        self.sums.iter().map(|sum| {
            let total = sum.sum();
            let missing = if k > 0.0 { 1.0 - total / k } else { f64::NAN };
            let heterozygosity = if total > 0.0 { sum.ab / total } else { f64::NAN };
            SampleStats{missing, heterozygosity}
        }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantRecord;

    fn variant_with(triples: &[(f64, f64, f64)]) -> VariantRecord {
        let mut v = VariantRecord::new(triples.len());
        for (slot, &(aa, ab, bb)) in v.triples_mut().iter_mut().zip(triples) {
            *slot = GenotypeTriple::new(aa, ab, bb);
        }
        v
    }

    #[test]
    fn fidelity_matches_elementwise_sum() {
        let mut acc = SampleAccumulator::new(2);
        let v1 = variant_with(&[(1.0, 0.0, 0.0), (0.0, 1.0, 0.0)]);
        let v2 = variant_with(&[(0.0, 0.5, 0.5), (0.0, 0.0, 1.0)]);
        acc.accumulate(&v1).unwrap();
        acc.accumulate(&v2).unwrap();

        assert_eq!(acc.n_autosomal_variants(), 2);
        let stats = acc.derive();
        // sample 0: sum = (1.0, 0.5, 0.5) => total 2.0, het = 0.5/2.0 = 0.25
        assert!((stats[0].heterozygosity - 0.25).abs() < 1e-9);
        // sample 1: sum = (0.0, 1.0, 1.0) => total 2.0, het = 1.0/2.0 = 0.5
        assert!((stats[1].heterozygosity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sample_count_mismatch_errors() {
        let mut acc = SampleAccumulator::new(2);
        let v = variant_with(&[(1.0, 0.0, 0.0)]);
        assert!(acc.accumulate(&v).is_err());
    }

    #[test]
    fn missing_is_nan_with_zero_variants() {
        let acc = SampleAccumulator::new(1);
        assert!(acc.derive()[0].missing.is_nan());
    }
}
