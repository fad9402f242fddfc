//! Symbolic feature structures with variables.
//!
//! This is the unification model used for both annotation content and
//! automaton arc conditions. A feature structure maps feature names to
//! [`FeatureValue`]s; a value is a [`SymbolSet`] optionally constrained to
//! agree (`=a`) or disagree (`!=a`) with pattern variables.

mod bindings;
mod symbol_set;

pub use self::{bindings::VariableBindings, symbol_set::SymbolSet};
use super::{Error, Result};
use rustc_hash::FxHasher;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    hash::{Hash, Hasher},
};

/// The value of a single feature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureValue {
    symbols: SymbolSet,
    agree: BTreeSet<String>,
    disagree: BTreeSet<String>,
}

impl FeatureValue {
    #[must_use]
    pub fn symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from(SymbolSet::only(symbols))
    }

    #[must_use]
    pub fn not_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from(SymbolSet::except(symbols))
    }

    /// A value that must agree with the variable `name`.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            agree: BTreeSet::from([name.into()]),
            ..Self::default()
        }
    }

    /// A value that must differ from the variable `name`.
    #[must_use]
    pub fn not_variable(name: impl Into<String>) -> Self {
        Self {
            disagree: BTreeSet::from([name.into()]),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn symbol_set(&self) -> &SymbolSet {
        &self.symbols
    }

    #[must_use]
    pub fn has_variables(&self) -> bool {
        !self.agree.is_empty() || !self.disagree.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.agree.iter().chain(&self.disagree).map(String::as_str)
    }

    /// Merges two values without consulting variable bindings.
    #[must_use]
    pub fn unify(&self, other: &Self) -> Option<Self> {
        let symbols = self.symbols.intersection(&other.symbols);
        if symbols.is_empty() {
            return None;
        }
        let agree: BTreeSet<_> = self.agree.union(&other.agree).cloned().collect();
        let disagree: BTreeSet<_> = self.disagree.union(&other.disagree).cloned().collect();
        if !agree.is_disjoint(&disagree) {
            return None;
        }
        Some(Self {
            symbols,
            agree,
            disagree,
        })
    }

    /// Narrows the value by every bound variable it mentions. Returns `None`
    /// when the narrowed value admits no symbol.
    fn resolve(&self, bindings: &VariableBindings) -> Option<SymbolSet> {
        let mut symbols = self.symbols.clone();
        for name in &self.agree {
            if let Some(bound) = bindings.get(name) {
                symbols = symbols.intersection(bound);
            }
        }
        for name in &self.disagree {
            if let Some(bound) = bindings.get(name) {
                symbols = symbols.intersection(&bound.complement());
            }
        }
        (!symbols.is_empty()).then_some(symbols)
    }
}

impl From<SymbolSet> for FeatureValue {
    fn from(symbols: SymbolSet) -> Self {
        Self {
            symbols,
            ..Self::default()
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if !self.symbols.is_any() || !self.has_variables() {
            write!(f, "{}", self.symbols)?;
            first = false;
        }
        for (prefix, names) in [("=", &self.agree), ("!=", &self.disagree)] {
            for name in names {
                if !first {
                    f.write_str("&")?;
                }
                write!(f, "{prefix}{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A set of feature/value pairs.
///
/// Equality and hashing consider only the feature values. Once frozen, the
/// structure can no longer be modified and exposes a stable
/// [`frozen_hash`](Self::frozen_hash).
#[derive(Clone, Debug, Default)]
pub struct FeatureStruct {
    values: BTreeMap<String, FeatureValue>,
    frozen_hash: Option<u64>,
}

impl FeatureStruct {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` for `feature`, replacing any previous value.
    ///
    /// Building on a frozen structure yields a frozen structure whose hash
    /// covers the new contents.
    #[must_use]
    pub fn with(mut self, feature: impl Into<String>, value: FeatureValue) -> Self {
        let frozen = self.frozen_hash.take().is_some();
        self.values.insert(feature.into(), value);
        if frozen {
            self.freeze();
        }
        self
    }

    /// Restricts `feature` to the single symbol `symbol`.
    #[must_use]
    pub fn symbol(self, feature: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.with(feature, FeatureValue::symbols([symbol]))
    }

    #[must_use]
    pub fn not_symbol(self, feature: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.with(feature, FeatureValue::not_symbols([symbol]))
    }

    #[must_use]
    pub fn variable(self, feature: impl Into<String>, name: impl Into<String>) -> Self {
        self.with(feature, FeatureValue::variable(name))
    }

    #[must_use]
    pub fn not_variable(self, feature: impl Into<String>, name: impl Into<String>) -> Self {
        self.with(feature, FeatureValue::not_variable(name))
    }

    #[must_use]
    pub fn value(&self, feature: &str) -> Option<&FeatureValue> {
        self.values.get(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values
            .iter()
            .map(|(feature, value)| (feature.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn has_variables(&self) -> bool {
        self.values.values().any(FeatureValue::has_variables)
    }

    pub fn add_value(&mut self, feature: impl Into<String>, value: FeatureValue) -> Result<()> {
        self.check_mutable()?;
        self.values.insert(feature.into(), value);
        Ok(())
    }

    pub fn remove_value(&mut self, feature: &str) -> Result<Option<FeatureValue>> {
        self.check_mutable()?;
        Ok(self.values.remove(feature))
    }

    /// Overwrites this structure's values with those of `other`, keeping
    /// features that `other` does not mention.
    pub fn priority_union(&mut self, other: &FeatureStruct) -> Result<()> {
        self.check_mutable()?;
        for (feature, value) in &other.values {
            self.values.insert(feature.clone(), value.clone());
        }
        Ok(())
    }

    /// Structural unification. Variables are carried into the result but
    /// never bound.
    #[must_use]
    pub fn unify(&self, other: &FeatureStruct) -> Option<FeatureStruct> {
        let mut values = self.values.clone();
        for (feature, value) in &other.values {
            let merged = match values.get(feature) {
                Some(existing) => existing.unify(value)?,
                None => value.clone(),
            };
            values.insert(feature.clone(), merged);
        }
        Some(FeatureStruct {
            values,
            frozen_hash: None,
        })
    }

    /// Unifies against `other` under `bindings`.
    ///
    /// Bound variables narrow the values they appear in. Unbound variables
    /// are bound when the opposite value is variable-free: an agreeing
    /// variable takes the narrowed value, a disagreeing one its complement.
    /// `bindings` is only updated on success.
    #[must_use]
    pub fn unify_bound(
        &self,
        other: &FeatureStruct,
        bindings: &mut VariableBindings,
    ) -> Option<FeatureStruct> {
        let mut updated = bindings.clone();
        let mut values = self.values.clone();
        for (feature, value) in &other.values {
            let Some(existing) = values.get(feature) else {
                values.insert(feature.clone(), value.clone());
                continue;
            };
            let concrete = !existing.has_variables() || !value.has_variables();
            let merged = existing.unify(value)?;
            let symbols = merged.resolve(&updated)?;
            if concrete {
                for name in &merged.agree {
                    if !updated.contains(name) {
                        updated.bind(name.clone(), symbols.clone());
                    }
                }
                for name in &merged.disagree {
                    if !updated.contains(name) {
                        updated.bind(name.clone(), symbols.complement());
                    }
                }
            }
            values.insert(feature.clone(), FeatureValue::from(symbols));
        }
        *bindings = updated;
        Some(FeatureStruct {
            values,
            frozen_hash: None,
        })
    }

    #[must_use]
    pub fn is_unifiable(&self, other: &FeatureStruct) -> bool {
        self.values.iter().all(|(feature, value)| {
            other
                .values
                .get(feature)
                .is_none_or(|theirs| value.unify(theirs).is_some())
        })
    }

    pub fn freeze(&mut self) {
        if self.frozen_hash.is_none() {
            let mut hasher = FxHasher::default();
            self.values.hash(&mut hasher);
            self.frozen_hash = Some(hasher.finish());
        }
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen_hash.is_some()
    }

    /// A content hash that is stable across runs, available once frozen.
    #[must_use]
    pub fn frozen_hash(&self) -> Option<u64> {
        self.frozen_hash
    }

    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.freeze();
        self
    }

    fn check_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            Err(Error::Frozen("feature structure"))
        } else {
            Ok(())
        }
    }
}

impl PartialEq for FeatureStruct {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for FeatureStruct {}

impl Hash for FeatureStruct {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl fmt::Display for FeatureStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (feature, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{feature}:{value}")?;
        }
        f.write_str("]")
    }
}
