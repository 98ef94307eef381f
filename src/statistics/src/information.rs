use genotype::GenotypeTriple;

/// The three documented variants of the information measure, differing only
/// in how each sample's triple is adjusted before the common formula is
/// applied (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InformationVariant {
    Plain,
    /// Replace missing mass at each sample with `(0.25, 0.5, 0.25)` scaled
    /// by the deficit, as if the missing calls were themselves uncertain
    /// under Hardy-Weinberg proportions at `theta = 0.5`.
    Filling,
    /// Rescale each triple to sum to 1 when its non-missing mass is at
    /// least 0.1; zero it out otherwise.
    Scaling,
}

fn adjust(triples: &[GenotypeTriple], variant: InformationVariant) -> Vec<GenotypeTriple> {
    match variant {
        InformationVariant::Plain => triples.to_vec(),
        InformationVariant::Filling => triples.iter().map(|t| {
            let deficit = t.missingness();
            GenotypeTriple::new(t.aa + 0.25 * deficit, t.ab + 0.5 * deficit, t.bb + 0.25 * deficit)
        }).collect(),
        InformationVariant::Scaling => triples.iter().map(|t| {
            let mass = t.sum();
            if mass >= 0.1 {
                GenotypeTriple::new(t.aa / mass, t.ab / mass, t.bb / mass)
            } else {
                GenotypeTriple::default()
            }
        }).collect(),
    }
}

/// Imputation-quality statistic in `[0,1]`: `1 - V / (2*K*theta*(1-theta))`,
/// returning 0 when the non-missing mass `K` is zero and 1 when the allele
/// frequency MLE `theta` is 0 or 1.
#[must_use]
pub fn information(triples: &[GenotypeTriple], variant: InformationVariant) -> f64 {
    let adjusted = adjust(triples, variant);

    let k: f64 = adjusted.iter().map(GenotypeTriple::sum).sum();
    if k == 0.0 {
        return 0.0;
    }

    let theta = adjusted.iter().map(|t| t.ab + 2.0 * t.bb).sum::<f64>() / (2.0 * k);
    if theta <= 0.0 || theta >= 1.0 {
        return 1.0;
    }

    let v: f64 = adjusted.iter()
        .map(|t| t.ab * (1.0 - t.ab) + 4.0 * t.bb * (1.0 - t.bb) - 4.0 * t.ab * t.bb)
        .sum();

    1.0 - v / (2.0 * k * theta * (1.0 - theta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaked_triples_give_perfect_information() {
        for t in [GenotypeTriple::new(1.0, 0.0, 0.0), GenotypeTriple::new(0.0, 1.0, 0.0), GenotypeTriple::new(0.0, 0.0, 1.0)] {
            let v = information(&[t], InformationVariant::Plain);
            assert!((v - 1.0).abs() < 1e-9, "triple {t:?} gave information {v}");
        }
    }

    #[test]
    fn flat_heterozygous_prior_gives_zero_information() {
        let triples = vec![GenotypeTriple::new(0.25, 0.5, 0.25); 4];
        let v = information(&triples, InformationVariant::Plain);
        assert!(v.abs() < 1e-9, "expected ~0, got {v}");
    }

    #[test]
    fn full_calls_are_perfectly_informative() {
        let triples = vec![GenotypeTriple::new(0.0, 1.0, 0.0); 5];
        let v = information(&triples, InformationVariant::Plain);
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn filling_pulls_missing_mass_towards_uncertainty() {
        let mostly_missing = GenotypeTriple::new(0.0, 0.0, 0.0);
        let plain = information(&[mostly_missing], InformationVariant::Plain);
        assert_eq!(plain, 0.0); // K = 0 under the plain variant
        let filled = information(&[mostly_missing], InformationVariant::Filling);
        assert!(filled.abs() < 1e-9); // filled to (0.25, 0.5, 0.25), theta=0.5, V=0.5 => info=0
    }

    #[test]
    fn scaling_drops_low_mass_samples() {
        let low_mass = GenotypeTriple::new(0.02, 0.0, 0.0);
        let informative = GenotypeTriple::new(0.0, 1.0, 0.0);
        let v = information(&[low_mass, informative], InformationVariant::Scaling);
        // low_mass is zeroed (mass < 0.1); informative alone gives perfect information.
        assert!((v - 1.0).abs() < 1e-9);
    }
}
