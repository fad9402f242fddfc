use std::{collections::BTreeSet, fmt};

/// A set of feature symbols, stored either as the symbols it contains or as
/// the symbols it excludes.
///
/// `Except` of an empty set is the universal set. Symbol universes are open,
/// so an `Except` set is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolSet {
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::any()
    }
}

impl SymbolSet {
    /// The set that admits every symbol.
    #[must_use]
    pub fn any() -> Self {
        Self::Except(BTreeSet::new())
    }

    #[must_use]
    pub fn only<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(symbols.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn except<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(symbols.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Only(symbols) if symbols.is_empty())
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Except(symbols) if symbols.is_empty())
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        match self {
            Self::Only(symbols) => symbols.contains(symbol),
            Self::Except(symbols) => !symbols.contains(symbol),
        }
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Only(a), Self::Only(b)) => Self::Only(a.intersection(b).cloned().collect()),
            (Self::Only(a), Self::Except(b)) | (Self::Except(b), Self::Only(a)) => {
                Self::Only(a.difference(b).cloned().collect())
            }
            (Self::Except(a), Self::Except(b)) => Self::Except(a.union(b).cloned().collect()),
        }
    }

    #[must_use]
    pub fn complement(&self) -> Self {
        match self {
            Self::Only(symbols) => Self::Except(symbols.clone()),
            Self::Except(symbols) => Self::Only(symbols.clone()),
        }
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }
}

impl fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, symbols) = match self {
            Self::Only(symbols) => ("", symbols),
            Self::Except(symbols) if symbols.is_empty() => return f.write_str("*"),
            Self::Except(symbols) => ("!", symbols),
        };
        f.write_str(prefix)?;
        if symbols.len() == 1
            && let Some(symbol) = symbols.first()
        {
            return f.write_str(symbol);
        }
        write!(f, "{{")?;
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(symbol)?;
        }
        write!(f, "}}")
    }
}
