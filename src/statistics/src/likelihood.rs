use statrs::distribution::{ChiSquared, ContinuousCDF};

/// `x * ln(x)`, with the continuous extension `0` at `x == 0`.
fn x_ln_x(x: f64) -> f64 {
    if x <= 0.0 { 0.0 } else { x * x.ln() }
}

/// Log-likelihood of the genotype counts under the unconstrained
/// multinomial model, `sum n_g * ln(n_g / N)`.
#[must_use]
pub fn mlig(n_aa: f64, n_ab: f64, n_bb: f64) -> f64 {
    let n = n_aa + n_ab + n_bb;
    if n == 0.0 {
        return 0.0;
    }
    x_ln_x(n_aa) + x_ln_x(n_ab) + x_ln_x(n_bb) - n * n.ln()
}

/// Log-likelihood of the same counts under the Hardy-Weinberg-constrained
/// model, using the MLE allele frequencies derived from the counts.
#[must_use]
pub fn mlighw(n_aa: f64, n_ab: f64, n_bb: f64) -> f64 {
    let n = n_aa + n_ab + n_bb;
    if n == 0.0 {
        return 0.0;
    }
    let p_a = (2.0 * n_aa + n_ab) / (2.0 * n);
    let p_b = 1.0 - p_a;
    2.0 * n_aa * nonzero_ln(p_a) + n_ab * nonzero_ln(2.0 * p_a * p_b) + 2.0 * n_bb * nonzero_ln(p_b)
}

fn nonzero_ln(x: f64) -> f64 {
    if x <= 0.0 { 0.0 } else { x.ln() }
}

/// Likelihood-ratio test for Hardy-Weinberg equilibrium: the one-sided tail
/// probability of `-2*(MLIGHW - MLIG)` under a chi-squared distribution
/// with one degree of freedom.
///
/// # Errors
/// Propagates construction failure from `statrs`, which cannot occur for a
/// fixed degrees-of-freedom of `1` but is preserved for API symmetry.
pub fn hwlr(n_aa: f64, n_ab: f64, n_bb: f64) -> anyhow::Result<f64> {
    let statistic = -2.0 * (mlighw(n_aa, n_ab, n_bb) - mlig(n_aa, n_ab, n_bb));
    let chi_sq = ChiSquared::new(1.0)?;
    Ok(1.0 - chi_sq.cdf(statistic.max(0.0)))
}
