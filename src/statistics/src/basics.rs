use genotype::GenotypeTriple;

/// Summary quantities derived once per variant and shared by every
/// built-in statistic (§4.4 "basic derived quantities").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicSummary {
    pub n_samples: usize,
    pub sum_aa: f64,
    pub sum_ab: f64,
    pub sum_bb: f64,
}

impl BasicSummary {
    #[must_use]
    pub fn from_triples(triples: &[GenotypeTriple]) -> Self {
        let (sum_aa, sum_ab, sum_bb) = triples.iter()
            .fold((0.0, 0.0, 0.0), |(aa, ab, bb), t| (aa + t.aa, ab + t.ab, bb + t.bb));
        Self{n_samples: triples.len(), sum_aa, sum_ab, sum_bb}
    }

    #[must_use]
    pub fn non_missing_mass(&self) -> f64 {
        self.sum_aa + self.sum_ab + self.sum_bb
    }

    #[must_use]
    pub fn missing_mass(&self) -> f64 {
        self.n_samples as f64 - self.non_missing_mass()
    }

    /// `(sumAA, sumAB, sumBB) / non_missing_mass`; NaN components when the
    /// non-missing mass is zero.
    #[must_use]
    pub fn mean_genotype(&self) -> (f64, f64, f64) {
        let k = self.non_missing_mass();
        if k == 0.0 {
            (f64::NAN, f64::NAN, f64::NAN)
        } else {
            (self.sum_aa / k, self.sum_ab / k, self.sum_bb / k)
        }
    }

    #[must_use]
    pub fn allele_counts(&self) -> (f64, f64) {
        (2.0 * self.sum_aa + self.sum_ab, 2.0 * self.sum_bb + self.sum_ab)
    }

    #[must_use]
    pub fn mean_allele_freqs(&self) -> (f64, f64) {
        let denom = 2.0 * self.non_missing_mass();
        let (a, b) = self.allele_counts();
        if denom == 0.0 { (f64::NAN, f64::NAN) } else { (a / denom, b / denom) }
    }

    /// Each genotype sum rounded to the nearest non-negative integer, used
    /// as the input to the HWE exact test and the likelihood statistics.
    #[must_use]
    pub fn rounded_genotype_counts(&self) -> (i64, i64, i64) {
        (self.sum_aa.round() as i64, self.sum_ab.round() as i64, self.sum_bb.round() as i64)
    }
}
