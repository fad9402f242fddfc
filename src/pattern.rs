//! Compiled patterns and the matching entry points.

mod iter;

pub use self::iter::Matches;
use crate::{
    AnnotationList, Direction, Error, Expression, Filter, PatternBuilder, PatternMatch, Result,
    engine::Search, fsa::Automaton,
};
use rustc_hash::FxHasher;
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

/// Default bound on the configurations explored by one match attempt.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Options that control how a [`Pattern`] is compiled and executed.
#[derive(Clone, Debug)]
pub struct MatcherSettings {
    /// The order in which the input is read.
    pub direction: Direction,
    /// Annotations rejected by the filter are skipped.
    pub filter: Filter,
    /// Only try the start position that was asked for instead of scanning
    /// forward from it.
    pub anchored_to_start: bool,
    /// Maximum number of configurations explored per start position.
    pub max_steps: usize,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            direction: Direction::LeftToRight,
            filter: Filter::all(),
            anchored_to_start: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl MatcherSettings {
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_anchored_to_start(mut self, anchored: bool) -> Self {
        self.anchored_to_start = anchored;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// A pattern tree together with its settings and, once compiled, its
/// automaton.
///
/// A pattern must be [frozen](Pattern::freeze) before it can be compiled.
/// Compilation happens on the first match call (or an explicit
/// [`compile`](Pattern::compile)) and is cached for the lifetime of the
/// pattern.
pub struct Pattern {
    root: Expression,
    settings: MatcherSettings,
    frozen_hash: Option<u64>,
    automaton: OnceLock<Automaton>,
}

impl Pattern {
    #[must_use]
    pub fn new(root: Expression) -> Self {
        Self::with_settings(root, MatcherSettings::default())
    }

    #[must_use]
    pub fn with_settings(root: Expression, settings: MatcherSettings) -> Self {
        Self {
            root,
            settings,
            frozen_hash: None,
            automaton: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn builder() -> PatternBuilder {
        PatternBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Expression {
        &self.root
    }

    /// Mutable access to the tree of a pattern that is not yet frozen.
    pub fn root_mut(&mut self) -> Result<&mut Expression> {
        if self.is_frozen() {
            return Err(Error::Frozen("pattern"));
        }
        Ok(&mut self.root)
    }

    #[must_use]
    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.settings.direction
    }

    /// Freezes the pattern and every condition in it. Freezing twice is a
    /// no-op.
    pub fn freeze(&mut self) {
        if self.is_frozen() {
            return;
        }
        for child in &mut self.root.children {
            child.freeze();
        }
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        self.frozen_hash = Some(hasher.finish());
    }

    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.freeze();
        self
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen_hash.is_some()
    }

    /// Hash of the pattern computed when it was frozen.
    #[must_use]
    pub fn frozen_hash(&self) -> Option<u64> {
        self.frozen_hash
    }

    /// Compiles the pattern, or returns the automaton compiled earlier.
    ///
    /// Nothing is cached when compilation fails.
    pub fn compile(&self) -> Result<&Automaton> {
        if let Some(automaton) = self.automaton.get() {
            return Ok(automaton);
        }
        if !self.is_frozen() {
            return Err(Error::NotFrozen);
        }
        let automaton = Automaton::compile(&self.root, self.settings.direction)?;
        Ok(self.automaton.get_or_init(|| automaton))
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.automaton.get().is_some()
    }

    /// The compiled automaton, if the pattern has been compiled.
    #[must_use]
    pub fn automaton(&self) -> Option<&Automaton> {
        self.automaton.get()
    }

    pub fn is_match(&self, input: &AnnotationList) -> Result<bool> {
        Ok(self.find(input)?.is_some())
    }

    /// Finds the best match at the first start position that yields one,
    /// scanning from the edge of `input` read first.
    pub fn find(&self, input: &AnnotationList) -> Result<Option<PatternMatch>> {
        self.compile()?;
        match self.origin(input) {
            Some(start) => self.find_at(input, start),
            None => Ok(None),
        }
    }

    /// Finds the best match starting at, or scanning onwards from, the
    /// annotation at index `start`.
    pub fn find_at(&self, input: &AnnotationList, start: usize) -> Result<Option<PatternMatch>> {
        let automaton = self.compile()?;
        let matches = Search::new(automaton, input, &self.settings).find(start, false)?;
        Ok(matches.into_iter().next())
    }

    /// Finds every accepting completion at the first start position that
    /// yields any, best first.
    pub fn find_all(&self, input: &AnnotationList) -> Result<Vec<PatternMatch>> {
        self.compile()?;
        match self.origin(input) {
            Some(start) => self.find_all_at(input, start),
            None => Ok(Vec::new()),
        }
    }

    pub fn find_all_at(&self, input: &AnnotationList, start: usize) -> Result<Vec<PatternMatch>> {
        let automaton = self.compile()?;
        Search::new(automaton, input, &self.settings).find(start, true)
    }

    /// Iterates over successive non-overlapping best matches in `input`.
    pub fn matches<'a>(&'a self, input: &'a AnnotationList) -> Result<Matches<'a>> {
        let automaton = self.compile()?;
        Ok(Matches {
            search: Search::new(automaton, input, &self.settings),
            input,
            direction: self.settings.direction,
            filter: &self.settings.filter,
            next: self.origin(input),
        })
    }

    /// The same pattern read in the opposite direction.
    ///
    /// The result is frozen if this pattern is, and compiles separately.
    #[must_use]
    pub fn reverse(&self) -> Self {
        let settings = self
            .settings
            .clone()
            .with_direction(self.settings.direction.reverse());
        let mut reversed = Self::with_settings(self.root.clone(), settings);
        if self.is_frozen() {
            reversed.freeze();
        }
        reversed
    }

    fn origin(&self, input: &AnnotationList) -> Option<usize> {
        input.first(self.settings.direction, &self.settings.filter)
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            settings: self.settings.clone(),
            frozen_hash: self.frozen_hash,
            automaton: OnceLock::new(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.settings.direction == other.settings.direction
            && self.settings.anchored_to_start == other.settings.anchored_to_start
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.settings.direction.hash(state);
        self.settings.anchored_to_start.hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("root", &self.root)
            .field("settings", &self.settings)
            .field("frozen", &self.is_frozen())
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.root.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeatureStruct, PatternNode};

    fn pattern() -> Pattern {
        Pattern::new(Expression::new(
            None,
            vec![PatternNode::Constraint(FeatureStruct::new().symbol("seg", "a"))],
        ))
    }

    #[test]
    fn freezing_sets_the_hash_once() {
        let mut pattern = pattern();
        assert_eq!(pattern.frozen_hash(), None);
        pattern.freeze();
        let hash = pattern.frozen_hash();
        assert!(hash.is_some());
        pattern.freeze();
        assert_eq!(pattern.frozen_hash(), hash);
        assert_eq!(pattern.root_mut().unwrap_err(), Error::Frozen("pattern"));
    }

    #[test]
    fn clones_compile_independently() {
        let pattern = pattern().frozen();
        pattern.compile().unwrap();
        let clone = pattern.clone();
        assert!(pattern.is_compiled());
        assert!(!clone.is_compiled());
        assert_eq!(pattern, clone);
    }

    #[test]
    fn reverse_mirrors_the_direction() {
        let pattern = pattern().frozen();
        let reversed = pattern.reverse();
        assert_eq!(reversed.direction(), Direction::RightToLeft);
        assert!(reversed.is_frozen());
        assert_ne!(pattern, reversed);
        assert_eq!(reversed.reverse(), pattern);
    }
}
