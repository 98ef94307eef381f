use std::{fmt::{self, Display, Formatter}, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("'{0}' is not a recognised allele label")]
pub struct ParseAlleleError(pub char);

/// A single-character allele label.
///
/// `N` stands for an unresolved/unknown allele; it is still a valid label
/// (variants lacking REF/ALT annotation are common), but callers that need
/// known alleles (e.g. transition filtering) should check [`Allele::is_known`].
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum Allele { A, C, G, T, N }

impl Allele {
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::N)
    }
}

impl From<Allele> for char {
    fn from(value: Allele) -> Self {
        match value {
            Allele::A => 'A',
            Allele::C => 'C',
            Allele::G => 'G',
            Allele::T => 'T',
            Allele::N => 'N',
        }
    }
}

impl TryFrom<char> for Allele {
    type Error = ParseAlleleError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'C' => Ok(Self::C),
            'G' => Ok(Self::G),
            'T' => Ok(Self::T),
            'N' | '.' | '0' => Ok(Self::N),
            other => Err(ParseAlleleError(other)),
        }
    }
}

impl FromStr for Allele {
    type Err = ParseAlleleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::try_from(c),
            _ => Err(ParseAlleleError(s.chars().next().unwrap_or('?'))),
        }
    }
}

impl Display for Allele {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&char::from(*self), f)
    }
}
