//! Sequence-edge marking for anchored patterns.
//!
//! An annotation is at the left (right) edge of a sequence if it is the first
//! (last) admissible annotation, or if every annotation before (after) it is
//! optional. Marks are computed per match call as a side table; the input is
//! never modified.

use crate::{AnnotationList, Direction, Filter, fsa::AnchorSides};
use rustc_hash::FxHashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnchorMarks {
    left: FxHashSet<usize>,
    right: FxHashSet<usize>,
}

impl AnchorMarks {
    pub fn new(input: &AnnotationList, filter: &Filter) -> Self {
        Self {
            left: edge(input, Direction::LeftToRight, filter),
            right: edge(input, Direction::RightToLeft, filter),
        }
    }

    #[must_use]
    pub fn is_left(&self, index: usize) -> bool {
        self.left.contains(&index)
    }

    #[must_use]
    pub fn is_right(&self, index: usize) -> bool {
        self.right.contains(&index)
    }

    /// True if a match covering `first..=last` touches every edge in `sides`.
    #[must_use]
    pub fn admits_span(&self, sides: AnchorSides, first: usize, last: usize) -> bool {
        (!sides.start || self.is_left(first)) && (!sides.end || self.is_right(last))
    }
}

/// Annotations reachable from the edge read first in `dir` by stepping over
/// optional annotations.
fn edge(input: &AnnotationList, dir: Direction, filter: &Filter) -> FxHashSet<usize> {
    let mut marked = FxHashSet::default();
    let mut current = input.first(dir, filter);
    while let Some(index) = current
        && marked.insert(index)
    {
        let annotation = &input[index];
        if !annotation.optional {
            break;
        }
        // continue with the next annotation that does not overlap this one
        let mut next = input.next(index, dir, filter);
        while let Some(candidate) = next
            && input[candidate].span.overlaps(&annotation.span)
        {
            next = input.next(candidate, dir, filter);
        }
        current = next;
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotation, FeatureStruct, Span};

    fn list(optional: &[bool]) -> AnnotationList {
        let mut list = AnnotationList::new();
        for (i, &opt) in optional.iter().enumerate() {
            let ann = Annotation::new(Span::new(i, i + 1), FeatureStruct::new());
            list.push(if opt { ann.optional() } else { ann }).unwrap();
        }
        list
    }

    #[test]
    fn edges_extend_through_optional_annotations() {
        let marks = AnchorMarks::new(&list(&[true, true, false, false, true]), &Filter::all());
        assert!(marks.is_left(0) && marks.is_left(1) && marks.is_left(2));
        assert!(!marks.is_left(3));
        assert!(marks.is_right(4) && marks.is_right(3));
        assert!(!marks.is_right(2));
    }

    #[test]
    fn edges_respect_the_filter() {
        let filter = Filter::new(|a| a.span.start != 0);
        let marks = AnchorMarks::new(&list(&[false, false, false]), &filter);
        assert!(!marks.is_left(0));
        assert!(marks.is_left(1));
        assert!(marks.is_right(2));
    }

    #[test]
    fn sides() {
        let marks = AnchorMarks::new(&list(&[false]), &Filter::all());
        let both = AnchorSides {
            start: true,
            end: true,
        };
        assert!(marks.admits_span(both, 0, 0));
        assert!(marks.admits_span(AnchorSides::default(), 7, 9));
        assert!(!marks.admits_span(both, 0, 7));
    }
}
