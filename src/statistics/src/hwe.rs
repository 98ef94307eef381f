use located_error::prelude::*;
use statrs::function::gamma::ln_gamma;

use crate::error::StatisticsError;

fn ln_fact(n: i64) -> f64 {
    ln_gamma(n as f64 + 1.0)
}

/// Log-probability of observing exactly `k` heterozygotes given the total
/// rare/common allele counts `(n_a, n_b)` and sample count `n` (§4.4).
fn ln_prob_heterozygotes(k: i64, n_a: i64, n_b: i64, n: i64) -> f64 {
    let half_a = (n_a - k) / 2;
    let half_b = (n_b - k) / 2;
    ln_fact(n) + ln_fact(n_a) + ln_fact(n_b) - ln_fact(2 * n)
        + (k as f64) * std::f64::consts::LN_2
        - ln_fact(half_a) - ln_fact(k) - ln_fact(half_b)
}

/// Two-sided Wigginton-Abecasis exact test p-value for Hardy-Weinberg
/// equilibrium given rounded genotype counts `(n_AA, n_AB, n_BB)`.
///
/// # Errors
/// `DomainError` if any count is negative.
pub fn exact_test_p_value(n_aa: i64, n_ab: i64, n_bb: i64) -> anyhow::Result<f64> {
    if n_aa < 0 || n_ab < 0 || n_bb < 0 {
        return Err(StatisticsError::DomainError(format!("negative rounded genotype count ({n_aa}, {n_ab}, {n_bb})")))
            .loc("While running the Hardy-Weinberg exact test");
    }

    let n_a = 2 * n_aa.min(n_bb) + n_ab;
    let n_b = 2 * n_aa.max(n_bb) + n_ab;
    if n_a + n_b == 0 {
        return Ok(1.0);
    }
    let n = (n_a + n_b) / 2;

    let ln_p_observed = ln_prob_heterozygotes(n_ab, n_a, n_b, n);

    let mut ln_probs = Vec::new();
    let mut k = n_a % 2;
    while k <= n_a {
        ln_probs.push(ln_prob_heterozygotes(k, n_a, n_b, n));
        k += 2;
    }

    let max_ln = ln_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = ln_probs.iter().map(|&lp| (lp - max_ln).exp()).sum();
    // A tiny relative tolerance absorbs floating-point noise when the
    // observed count is itself the mode (which should include exactly).
    let tolerance = 1e-7 * ln_p_observed.abs().max(1.0);
    let included: f64 = ln_probs.iter()
        .filter(|&&lp| lp <= ln_p_observed + tolerance)
        .map(|&lp| (lp - max_ln).exp())
        .sum();

    Ok((included / total).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equilibrium_counts_give_p_near_one() {
        let p = exact_test_p_value(25, 50, 25).unwrap();
        assert!(p > 0.9, "expected near-1 p-value, got {p}");
    }

    #[test]
    fn extreme_excess_heterozygote_deficit_gives_tiny_p() {
        let p = exact_test_p_value(50, 0, 50).unwrap();
        assert!(p < 1e-6, "expected a vanishingly small p-value, got {p}");
    }

    #[test]
    fn monotone_separation_between_scenarios() {
        let equilibrium = exact_test_p_value(25, 50, 25).unwrap();
        let extreme = exact_test_p_value(50, 0, 50).unwrap();
        assert!(equilibrium > extreme);
    }

    #[test]
    fn zero_total_count_is_trivially_satisfied() {
        assert_eq!(exact_test_p_value(0, 0, 0).unwrap(), 1.0);
    }

    #[test]
    fn negative_counts_are_a_domain_error() {
        assert!(exact_test_p_value(-1, 0, 0).is_err());
    }
}
