use genotype::Allele;

use crate::{
    engine::{Statistic, StatisticsEngine},
    error::StatisticsError,
    hwe, likelihood,
    information::{self, InformationVariant},
    value::Value,
};

use located_error::prelude::*;

/// A sample's best-guess genotype call is considered confidently resolved
/// once its largest triple component reaches this threshold; the
/// `missing_calls` statistic uses it to report a hard-call missingness
/// rate distinct from the probabilistic `missing` mass.
pub const CALL_CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Names of the built-in statistics that read only the variant's
/// identification fields, never its genotype triples. The pipeline driver
/// uses this list to emit identification-only rows (with every other
/// statistic reported as unavailable) for sex-determining variants.
pub const IDENTIFICATION_NAMES: [&str; 6] = ["SNPID", "RSID", "chromosome", "position", "alleleA", "alleleB"];

#[derive(Debug, Clone, Copy)]
enum Kind {
    SnpId,
    RsId,
    Chromosome,
    Position,
    Allele1,
    Allele2,
    MinorAllele,
    MajorAllele,
    Maf,
    SumAa,
    SumAb,
    SumBb,
    Missing,
    MissingCalls,
    Heterozygosity,
    Hwe,
    Information(InformationVariant),
    Mlig,
    Mlighw,
    Hwlr,
}

/// A fixed built-in statistic, registered by name and dispatched by kind;
/// every one of these reads only from the engine's current variant.
pub struct Builtin {
    name: &'static str,
    kind: Kind,
}

impl Builtin {
    const fn new(name: &'static str, kind: Kind) -> Self {
        Self{name, kind}
    }
}

impl Statistic for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, engine: &StatisticsEngine) -> anyhow::Result<Value> {
        let id = engine.current_id()?;
        let basics = engine.current_basics()?;

        match self.kind {
            Kind::SnpId => Ok(Value::Text(id.snp_id.clone())),
            Kind::RsId => Ok(Value::Text(id.rs_id.clone())),
            Kind::Chromosome => Ok(Value::Text(id.chromosome.to_string())),
            Kind::Position => Ok(Value::Number(f64::from(id.position))),
            Kind::Allele1 => Ok(Value::Text(id.allele1.to_string())),
            Kind::Allele2 => Ok(Value::Text(id.allele2.to_string())),

            Kind::MinorAllele | Kind::MajorAllele => {
                let (freq_1, freq_2) = basics.mean_allele_freqs();
                let allele = choose_allele(self.kind, freq_1, freq_2, id.allele1, id.allele2)?;
                Ok(Value::Text(allele.to_string()))
            }
            Kind::Maf => {
                let (freq_1, freq_2) = basics.mean_allele_freqs();
                Ok(Value::Number(freq_1.min(freq_2)))
            }
            Kind::SumAa => Ok(Value::Number(basics.sum_aa)),
            Kind::SumAb => Ok(Value::Number(basics.sum_ab)),
            Kind::SumBb => Ok(Value::Number(basics.sum_bb)),
            Kind::Missing => Ok(Value::Number(basics.missing_mass() / basics.n_samples as f64)),
            Kind::MissingCalls => {
                let triples = engine.current_triples()?;
                let uncalled = triples.iter()
                    .filter(|t| t.aa.max(t.ab).max(t.bb) < CALL_CONFIDENCE_THRESHOLD)
                    .count();
                Ok(Value::Number(uncalled as f64 / basics.n_samples as f64))
            }
            Kind::Heterozygosity => Ok(Value::Number(basics.mean_genotype().1)),
            Kind::Hwe => {
                let (aa, ab, bb) = basics.rounded_genotype_counts();
                Ok(Value::Number(-hwe::exact_test_p_value(aa, ab, bb)?.log10()))
            }
            Kind::Information(variant) => {
                let triples = engine.current_triples()?;
                Ok(Value::Number(information::information(triples, variant)))
            }
            Kind::Mlig => {
                let (aa, ab, bb) = basics.rounded_genotype_counts();
                Ok(Value::Number(likelihood::mlig(aa as f64, ab as f64, bb as f64)))
            }
            Kind::Mlighw => {
                let (aa, ab, bb) = basics.rounded_genotype_counts();
                Ok(Value::Number(likelihood::mlighw(aa as f64, ab as f64, bb as f64)))
            }
            Kind::Hwlr => {
                let (aa, ab, bb) = basics.rounded_genotype_counts();
                Ok(Value::Number(likelihood::hwlr(aa as f64, ab as f64, bb as f64)?))
            }
        }
    }
}

fn choose_allele(kind: Kind, freq_1: f64, freq_2: f64, allele1: Allele, allele2: Allele) -> anyhow::Result<Allele> {
    if freq_1.is_nan() || freq_2.is_nan() {
        return Err(StatisticsError::DomainError("allele frequency undefined for a fully-missing variant".into()))
            .loc("While choosing the minor/major allele");
    }
    let first_is_minor = freq_1 <= freq_2;
    Ok(match (kind, first_is_minor) {
        (Kind::MinorAllele, true) | (Kind::MajorAllele, false) => allele1,
        _ => allele2,
    })
}

/// Every statistic qctool registers by default, in the original naming
/// scheme (`information`/`filled_information`/`scaled_information`).
#[must_use]
pub fn all() -> Vec<Box<dyn Statistic>> {
    vec![
        Box::new(Builtin::new("SNPID", Kind::SnpId)),
        Box::new(Builtin::new("RSID", Kind::RsId)),
        Box::new(Builtin::new("chromosome", Kind::Chromosome)),
        Box::new(Builtin::new("position", Kind::Position)),
        Box::new(Builtin::new("alleleA", Kind::Allele1)),
        Box::new(Builtin::new("alleleB", Kind::Allele2)),
        Box::new(Builtin::new("minor_allele", Kind::MinorAllele)),
        Box::new(Builtin::new("major_allele", Kind::MajorAllele)),
        Box::new(Builtin::new("MAF", Kind::Maf)),
        Box::new(Builtin::new("AA", Kind::SumAa)),
        Box::new(Builtin::new("AB", Kind::SumAb)),
        Box::new(Builtin::new("BB", Kind::SumBb)),
        Box::new(Builtin::new("missing", Kind::Missing)),
        Box::new(Builtin::new("missing_calls", Kind::MissingCalls)),
        Box::new(Builtin::new("heterozygosity", Kind::Heterozygosity)),
        Box::new(Builtin::new("HWE", Kind::Hwe)),
        Box::new(Builtin::new("information", Kind::Information(InformationVariant::Plain))),
        Box::new(Builtin::new("filled_information", Kind::Information(InformationVariant::Filling))),
        Box::new(Builtin::new("scaled_information", Kind::Information(InformationVariant::Scaling))),
        Box::new(Builtin::new("MLIG", Kind::Mlig)),
        Box::new(Builtin::new("MLIGHW", Kind::Mlighw)),
        Box::new(Builtin::new("HWLR", Kind::Hwlr)),
    ]
}

#[cfg(test)]
mod tests {
    use genotype::{Allele as A, Chromosome, GenotypeTriple, Identification, VariantRecord};

    use crate::engine::StatisticsEngine;

    fn engine_with(triples: &[GenotypeTriple]) -> StatisticsEngine {
        let mut engine = StatisticsEngine::new();
        for b in super::all() {
            engine.register(b).unwrap();
        }
        let mut variant = VariantRecord::new(0);
        variant.id = Identification::new("snp1", "rs1", Chromosome::Autosome(1), 100, A::A, A::G);
        for t in triples {
            variant.add_genotype_triple(*t);
        }
        engine.process(&variant);
        engine
    }

    #[test]
    fn maf_and_alleles_agree_with_frequencies() {
        let engine = engine_with(&[
            GenotypeTriple::new(1.0, 0.0, 0.0),
            GenotypeTriple::new(1.0, 0.0, 0.0),
            GenotypeTriple::new(0.0, 1.0, 0.0),
            GenotypeTriple::new(0.0, 0.0, 1.0),
        ]);
        let maf = engine.value_of("MAF").unwrap().as_f64().unwrap();
        assert!((maf - 0.375).abs() < 1e-9); // freq(B) = (1 + 2)/8 = 0.375 < freq(A) = 0.625
        assert_eq!(engine.value_of("minor_allele").unwrap().display(5), "G");
        assert_eq!(engine.value_of("major_allele").unwrap().display(5), "A");
    }

    #[test]
    fn missing_calls_uses_the_hard_call_threshold() {
        let engine = engine_with(&[
            GenotypeTriple::new(0.95, 0.03, 0.02), // confidently called
            GenotypeTriple::new(0.5, 0.3, 0.2),    // not confidently called
        ]);
        let missing_calls = engine.value_of("missing_calls").unwrap().as_f64().unwrap();
        assert!((missing_calls - 0.5).abs() < 1e-9);
    }

    #[test]
    fn identifying_fields_pass_through() {
        let engine = engine_with(&[GenotypeTriple::new(1.0, 0.0, 0.0)]);
        assert_eq!(engine.value_of("SNPID").unwrap().display(5), "snp1");
        assert_eq!(engine.value_of("chromosome").unwrap().display(5), "1");
    }

    #[test]
    fn aa_ab_bb_are_raw_sums_not_means() {
        let engine = engine_with(&[
            GenotypeTriple::new(1.0, 0.0, 0.0),
            GenotypeTriple::new(1.0, 0.0, 0.0),
            GenotypeTriple::new(0.0, 1.0, 0.0),
            GenotypeTriple::new(0.0, 0.0, 1.0),
        ]);
        assert_eq!(engine.value_of("AA").unwrap().as_f64().unwrap(), 2.0);
        assert_eq!(engine.value_of("AB").unwrap().as_f64().unwrap(), 1.0);
        assert_eq!(engine.value_of("BB").unwrap().as_f64().unwrap(), 1.0);
        // AB is the raw heterozygote sum, distinct from heterozygosity (AB/K = 0.25).
        let heterozygosity = engine.value_of("heterozygosity").unwrap().as_f64().unwrap();
        assert!((heterozygosity - 0.25).abs() < 1e-9);
        assert_ne!(engine.value_of("AB").unwrap().as_f64().unwrap(), heterozygosity);
    }

    #[test]
    fn hwe_is_minus_log10_p_per_scenario_5() {
        let equilibrium = engine_with(&counts_as_triples(25, 50, 25));
        let hwe = equilibrium.value_of("HWE").unwrap().as_f64().unwrap();
        assert!(hwe < 0.1, "expected HWE ~ 0 at equilibrium, got {hwe}");

        let extreme = engine_with(&counts_as_triples(50, 0, 50));
        let hwe = extreme.value_of("HWE").unwrap().as_f64().unwrap();
        assert!(hwe > 6.0, "expected a large -log10(p) under extreme heterozygote deficit, got {hwe}");
    }

    fn counts_as_triples(n_aa: usize, n_ab: usize, n_bb: usize) -> Vec<GenotypeTriple> {
        std::iter::repeat(GenotypeTriple::new(1.0, 0.0, 0.0)).take(n_aa)
            .chain(std::iter::repeat(GenotypeTriple::new(0.0, 1.0, 0.0)).take(n_ab))
            .chain(std::iter::repeat(GenotypeTriple::new(0.0, 0.0, 1.0)).take(n_bb))
            .collect()
    }
}
