use crate::{
    VariableBindings,
    fsa::{
        ArcId, Tag,
        dfa::{DfaStateId, ThreadCommand},
    },
};

/// Annotation indexes recorded when a group's boundaries were crossed.
///
/// `open` is the annotation about to be consumed when the group was entered,
/// `close` the annotation consumed last before it was left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Register {
    pub open: Option<usize>,
    pub close: Option<usize>,
}

impl Register {
    /// Whether either boundary of the group was crossed.
    #[inline]
    pub fn is_set(self) -> bool {
        self.open.is_some() || self.close.is_some()
    }
}

/// One register per group, indexed by [`GroupId`](crate::fsa::GroupId).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers(pub(crate) Vec<Register>);

impl Registers {
    pub fn new(groups: usize) -> Self {
        Self(vec![Register::default(); groups])
    }

    #[inline]
    pub fn get(&self, index: usize) -> Register {
        self.0.get(index).copied().unwrap_or_default()
    }

    fn apply(&mut self, tag: Tag, consumed: Option<usize>, upcoming: Option<usize>) {
        let Some(register) = self.0.get_mut(tag.group.index()) else {
            return;
        };
        if tag.close {
            register.close = consumed;
        } else {
            register.open = upcoming;
        }
    }
}

/// What one path through the NFA has recorded so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub registers: Registers,
    pub bindings: VariableBindings,
}

impl Run {
    pub fn new(groups: usize) -> Self {
        Self {
            registers: Registers::new(groups),
            bindings: VariableBindings::new(),
        }
    }
}

/// Runs `commands` against the runs of the source threads, producing the
/// runs of every target thread.
///
/// Origins are tried in order. A source run passes through an origin that
/// consumed an NFA arc only when `admit` accepts that arc under a copy of
/// the run's bindings. A target thread keeps one run per distinct set of
/// bindings, the first to arrive; a thread left without runs is dead.
pub fn advance(
    commands: &[ThreadCommand],
    runs: &[Vec<Run>],
    consumed: Option<usize>,
    upcoming: Option<usize>,
    mut admit: impl FnMut(ArcId, &mut VariableBindings) -> bool,
) -> Vec<Vec<Run>> {
    commands
        .iter()
        .map(|command| {
            let mut reached: Vec<Run> = Vec::new();
            for origin in &command.origins {
                for source in runs.get(origin.from).into_iter().flatten() {
                    let mut bindings = source.bindings.clone();
                    if let Some(arc) = origin.arc
                        && !admit(arc, &mut bindings)
                    {
                        continue;
                    }
                    if reached.iter().any(|run| run.bindings == bindings) {
                        continue;
                    }
                    let mut registers = source.registers.clone();
                    for &tag in &origin.tags {
                        registers.apply(tag, consumed, upcoming);
                    }
                    reached.push(Run {
                        registers,
                        bindings,
                    });
                }
            }
            reached
        })
        .collect()
}

/// A configuration of a match attempt: where the automaton is, what has been
/// consumed and what each thread has recorded.
#[derive(Clone, Debug)]
pub struct Frame {
    pub state: DfaStateId,
    /// Position in the admissible traversal order of the next annotation.
    pub pos: usize,
    /// The runs of each thread of `state`, best first.
    pub runs: Vec<Vec<Run>>,
}

impl Frame {
    pub fn is_alive(&self) -> bool {
        self.runs.iter().any(|runs| !runs.is_empty())
    }
}
