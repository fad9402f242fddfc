//! Match results and their assembly from raw registers.

use crate::{
    Annotation, AnnotationList, Direction, Span, VariableBindings,
    engine::state::{Register, Registers},
    fsa::GroupId,
};
use indexmap::IndexMap;

/// A successful match of a pattern against an annotation list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMatch {
    span: Span,
    groups: IndexMap<String, Span>,
    path: Vec<String>,
    bindings: VariableBindings,
    /// Lowest and highest annotation index covered by the match.
    indexes: (usize, usize),
}

impl PatternMatch {
    /// Builds a match from the registers of an accepting thread.
    ///
    /// Returns `None` when the overall match is empty. Groups that did not
    /// capture anything, or whose span falls outside the overall match, are
    /// left out.
    pub(crate) fn assemble(
        input: &AnnotationList,
        dir: Direction,
        group_ids: &IndexMap<String, GroupId>,
        registers: &Registers,
        path: &[String],
        bindings: VariableBindings,
    ) -> Option<Self> {
        let indexes = captured(registers.get(GroupId::ENTIRE.index()), dir)?;
        let span = span_of(input, indexes)?;
        let groups = group_ids
            .iter()
            .filter_map(|(name, id)| {
                let group = span_of(input, captured(registers.get(id.index()), dir)?)?;
                span.contains(&group).then(|| (name.clone(), group))
            })
            .collect();
        Some(Self {
            span,
            groups,
            path: path.to_vec(),
            bindings,
            indexes,
        })
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// The span captured by `name`, or `None` if the group did not take part
    /// in this match.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<Span> {
        self.groups.get(name).copied()
    }

    /// Captured groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, Span)> {
        self.groups.iter().map(|(name, span)| (name.as_str(), *span))
    }

    /// Names of the expressions leading to the alternative that matched.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    #[must_use]
    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    /// Index of the leftmost annotation in the match.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.indexes.0
    }

    /// Index of the rightmost annotation in the match.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.indexes.1
    }

    /// The annotations covered by the match.
    pub fn annotations<'a>(&self, input: &'a AnnotationList) -> impl Iterator<Item = &'a Annotation> {
        (self.indexes.0..=self.indexes.1).filter_map(|i| input.get(i))
    }
}

/// Orders a register's endpoints as (leftmost, rightmost), or `None` if the
/// group consumed nothing.
fn captured(register: Register, dir: Direction) -> Option<(usize, usize)> {
    let (open, close) = (register.open?, register.close?);
    match dir {
        Direction::LeftToRight if open <= close => Some((open, close)),
        Direction::RightToLeft if close <= open => Some((close, open)),
        _ => None,
    }
}

fn span_of(input: &AnnotationList, (first, last): (usize, usize)) -> Option<Span> {
    let start = input.get(first)?.span.start;
    let end = input.get(last)?.span.end;
    (start <= end).then_some(Span::new(start, end))
}
