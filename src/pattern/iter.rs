use crate::{AnnotationList, Direction, Filter, PatternMatch, Result, engine::Search};

/// Iterator over successive non-overlapping matches, created by
/// [`Pattern::matches`](crate::Pattern::matches).
///
/// Each search resumes after the last annotation consumed by the previous
/// match. Iteration ends at the first error.
pub struct Matches<'a> {
    pub(super) search: Search<'a>,
    pub(super) input: &'a AnnotationList,
    pub(super) direction: Direction,
    pub(super) filter: &'a Filter,
    pub(super) next: Option<usize>,
}

impl Iterator for Matches<'_> {
    type Item = Result<PatternMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        match self.search.find(start, false) {
            Ok(matches) => {
                let m = matches.into_iter().next()?;
                let last = match self.direction {
                    Direction::LeftToRight => m.last_index(),
                    Direction::RightToLeft => m.first_index(),
                };
                self.next = self.input.next(last, self.direction, self.filter);
                Some(Ok(m))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
