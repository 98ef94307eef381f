use std::{cmp::Ordering, fmt::{self, Display, Formatter}, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("'{0}' is not a recognised chromosome label")]
pub struct ParseChromosomeError(pub String);

/// A chromosome label.
///
/// Autosomes carry their 1-based index; the sex-determining chromosomes and
/// the mitochondrion are distinguished so the pipeline can skip them during
/// per-sample accumulation (see [`Chromosome::is_autosomal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chromosome {
    Autosome(u8),
    X,
    Y,
    /// Pseudo-autosomal region shared by X and Y.
    XY,
    MT,
    Unknown,
}

impl Chromosome {
    /// Chromosomes 1-22 are the only ones that contribute to the per-sample
    /// accumulator; sex-determining chromosomes and the mitochondrion do not.
    #[must_use]
    pub fn is_autosomal(&self) -> bool {
        matches!(self, Self::Autosome(_))
    }
}

impl FromStr for Chromosome {
    type Err = ParseChromosomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("chr").unwrap_or(s);
        match stripped.to_ascii_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "XY" => Ok(Self::XY),
            "MT" | "M" => Ok(Self::MT),
            "NA" | "." | "" => Ok(Self::Unknown),
            other => other.parse::<u8>()
                .map(Self::Autosome)
                .map_err(|_| ParseChromosomeError(s.to_string())),
        }
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Autosome(n) => write!(f, "{n}"),
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
            Self::XY => write!(f, "XY"),
            Self::MT => write!(f, "MT"),
            Self::Unknown => write!(f, "NA"),
        }
    }
}

/// Orders autosomes numerically and places the sex-determining labels and
/// `Unknown` after them, in the order X, Y, XY, MT, Unknown.
impl Ord for Chromosome {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(c: &Chromosome) -> (u8, u8) {
            match c {
                Chromosome::Autosome(n) => (0, *n),
                Chromosome::X => (1, 0),
                Chromosome::Y => (2, 0),
                Chromosome::XY => (3, 0),
                Chromosome::MT => (4, 0),
                Chromosome::Unknown => (5, 0),
            }
        }
        rank(self).cmp(&rank(other))
    }
}

impl PartialOrd for Chromosome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
