use crate::{Error, Result};
use std::fmt;

/// Repetition bounds of a quantified node. Repetition is greedy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantifier {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Quantifier {
    pub const ZERO_OR_ONE: Self = Self::new(0, Some(1));
    pub const ZERO_OR_MORE: Self = Self::new(0, None);
    pub const ONE_OR_MORE: Self = Self::new(1, None);

    #[must_use]
    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn exactly(n: usize) -> Self {
        Self::new(n, Some(n))
    }

    pub fn validate(&self) -> Result<()> {
        match self.max {
            Some(max) if max < self.min => Err(Error::InvalidQuantifier { min: self.min, max }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, Some(1)) => f.write_str("?"),
            (0, None) => f.write_str("*"),
            (1, None) => f.write_str("+"),
            (min, None) => write!(f, "{{{min},}}"),
            (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
            (min, Some(max)) => write!(f, "{{{min},{max}}}"),
        }
    }
}
