use super::SymbolSet;
use std::{collections::BTreeMap, fmt};

/// Values bound to pattern variables during a match attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VariableBindings {
    values: BTreeMap<String, SymbolSet>,
}

impl VariableBindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SymbolSet> {
        self.values.get(name)
    }

    pub fn bind(&mut self, name: impl Into<String>, value: SymbolSet) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolSet)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for VariableBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}
