//! The annotated input sequence that patterns are matched against.

use super::{Error, FeatureStruct, MAX_ANNOTATIONS, Result};
use std::{fmt, sync::Arc};

/// The order in which a sequence is traversed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::LeftToRight => Self::RightToLeft,
            Self::RightToLeft => Self::LeftToRight,
        }
    }
}

/// A half-open range of offsets covered by an annotation or a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub const fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[must_use]
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The offset at which the span begins when read in `dir`.
    #[must_use]
    pub const fn start_in(&self, dir: Direction) -> usize {
        match dir {
            Direction::LeftToRight => self.start,
            Direction::RightToLeft => self.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One element of the input sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub span: Span,
    pub fs: FeatureStruct,
    /// Optional annotations may be skipped when locating the sequence edges
    /// for anchors.
    pub optional: bool,
}

impl Annotation {
    #[must_use]
    pub fn new(span: Span, fs: FeatureStruct) -> Self {
        Self {
            span,
            fs,
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// An admissibility predicate over annotations.
///
/// Annotations rejected by the filter are invisible to the matcher.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&Annotation) -> bool + Send + Sync>);

impl Filter {
    pub fn new(f: impl Fn(&Annotation) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A filter that admits every annotation.
    #[must_use]
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    #[inline]
    #[must_use]
    pub fn admits(&self, annotation: &Annotation) -> bool {
        (self.0)(annotation)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

/// An ordered, bidirectionally navigable sequence of annotations.
///
/// Besides its elements, a list carries sequence-level features that
/// acceptance predicates can consult (for example the part of speech of the
/// word the elements spell out).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationList {
    annotations: Vec<Annotation>,
    features: FeatureStruct,
}

impl AnnotationList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_features(mut self, features: FeatureStruct) -> Self {
        self.features = features;
        self
    }

    #[must_use]
    pub fn features(&self) -> &FeatureStruct {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureStruct {
        &mut self.features
    }

    pub fn push(&mut self, annotation: Annotation) -> Result<()> {
        self.insert(self.annotations.len(), annotation)
    }

    /// Inserts an annotation at `index`.
    ///
    /// Fails with [`Error::TooManyAnnotations`] once the list holds
    /// [`MAX_ANNOTATIONS`] elements.
    pub fn insert(&mut self, index: usize, annotation: Annotation) -> Result<()> {
        if self.annotations.len() >= MAX_ANNOTATIONS {
            return Err(Error::TooManyAnnotations);
        }
        if index > self.annotations.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.annotations.len(),
            });
        }
        self.annotations.insert(index, annotation);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Annotation> {
        (index < self.annotations.len()).then(|| self.annotations.remove(index))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Annotation> {
        self.annotations.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    /// The span from the first to the last annotation.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        let first = self.annotations.first()?;
        let last = self.annotations.last()?;
        Some(Span::new(first.span.start, last.span.end))
    }

    /// Index of the first admissible annotation when reading in `dir`.
    #[must_use]
    pub fn first(&self, dir: Direction, filter: &Filter) -> Option<usize> {
        match dir {
            Direction::LeftToRight => self.annotations.iter().position(|a| filter.admits(a)),
            Direction::RightToLeft => self.annotations.iter().rposition(|a| filter.admits(a)),
        }
    }

    /// Index of the next admissible annotation after `index` in `dir`.
    #[must_use]
    pub fn next(&self, index: usize, dir: Direction, filter: &Filter) -> Option<usize> {
        match dir {
            Direction::LeftToRight => self
                .annotations
                .iter()
                .enumerate()
                .skip(index.saturating_add(1))
                .find(|(_, a)| filter.admits(a))
                .map(|(i, _)| i),
            Direction::RightToLeft => self.annotations[..index.min(self.annotations.len())]
                .iter()
                .rposition(|a| filter.admits(a)),
        }
    }

    /// Indexes of every admissible annotation, in traversal order.
    #[must_use]
    pub fn admissible(&self, dir: Direction, filter: &Filter) -> Vec<usize> {
        let mut indexes: Vec<usize> = self
            .annotations
            .iter()
            .enumerate()
            .filter(|(_, a)| filter.admits(a))
            .map(|(i, _)| i)
            .collect();
        if dir == Direction::RightToLeft {
            indexes.reverse();
        }
        indexes
    }
}

impl<'a> IntoIterator for &'a AnnotationList {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.annotations.iter()
    }
}

impl std::ops::Index<usize> for AnnotationList {
    type Output = Annotation;

    fn index(&self, index: usize) -> &Self::Output {
        &self.annotations[index]
    }
}
