//! Subset construction.
//!
//! A deterministic state is the ordered list of significant NFA states
//! ("threads") reachable through arcs that consume no input. Thread order is
//! the order in which an exploration ranked by arc priority first reaches
//! each state, so earlier threads always belong to higher-priority paths.
//!
//! Conditioned arcs leaving the same state are merged whenever their
//! conditions unify. Every mergeable combination gets its own arc, most
//! specific first, and the unmerged arcs remain as fallbacks, so the executor
//! may still need to try more than one arc per state.

use super::{
    AnchorSides, ArcId, StateId, Tag,
    nfa::{Condition, Nfa},
};
use crate::{Error, FeatureStruct, MAX_DFA_STATES, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Upper bound on merged arcs generated for a single state. Past it, only
/// the combinations found so far (and the single arcs) are kept.
const MAX_MERGED_ARCS: usize = 1024;

/// Index of a state in a [`Dfa`].
pub type DfaStateId = usize;

/// One way a thread of the target state can be reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    /// The thread of the source state whose registers and bindings are
    /// inherited.
    pub from: usize,
    /// The NFA arc consumed on the way; `None` for the start state.
    pub arc: Option<ArcId>,
    /// Tags crossed between the consumed arc and the thread's NFA state.
    pub tags: Vec<Tag>,
}

/// Register bookkeeping for one thread of the target state.
///
/// Origins are ordered by priority. The executor uses the first one whose
/// source thread is alive and whose own condition holds under that thread's
/// bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadCommand {
    pub origins: Vec<Origin>,
}

#[derive(Clone, Debug)]
pub struct DfaArc {
    pub condition: FeatureStruct,
    pub anchor: AnchorSides,
    pub target: DfaStateId,
    /// One command per thread of the target state.
    pub commands: Vec<ThreadCommand>,
    /// The NFA arcs merged into this one, sorted.
    pub sources: Vec<ArcId>,
}

#[derive(Clone, Debug, Default)]
pub struct DfaState {
    pub threads: Vec<StateId>,
    pub arcs: Vec<DfaArc>,
    /// Indexes of accepting threads, best priority first.
    pub accepting: Vec<usize>,
    /// Priority of the best accepting thread.
    pub priority: Option<usize>,
}

impl DfaState {
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        !self.accepting.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Dfa {
    pub(crate) states: Vec<DfaState>,
    pub(crate) start: DfaStateId,
    pub(crate) start_commands: Vec<ThreadCommand>,
}

impl Dfa {
    #[must_use]
    pub fn start(&self) -> DfaStateId {
        self.start
    }

    #[must_use]
    pub fn state(&self, id: DfaStateId) -> &DfaState {
        &self.states[id]
    }

    pub fn states(&self) -> impl Iterator<Item = &DfaState> {
        self.states.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Threads reached from `seeds`, in priority order, with the commands that
/// produce their registers.
///
/// Each seed is explored on its own, so a state reached from several seeds
/// records every one of them as an origin.
fn closure(
    nfa: &Nfa,
    seeds: impl IntoIterator<Item = (usize, Option<ArcId>, StateId)>,
) -> (Vec<StateId>, Vec<ThreadCommand>) {
    let mut index: FxHashMap<StateId, usize> = FxHashMap::default();
    let mut threads = Vec::new();
    let mut commands: Vec<ThreadCommand> = Vec::new();
    for (from, arc, seed) in seeds {
        let mut visited = FxHashSet::default();
        let mut stack = vec![(seed, Vec::new())];
        while let Some((state, tags)) = stack.pop() {
            if !visited.insert(state) {
                continue;
            }
            if nfa.is_significant(state) {
                let origin = Origin {
                    from,
                    arc,
                    tags: tags.clone(),
                };
                if let Some(&thread) = index.get(&state) {
                    commands[thread].origins.push(origin);
                } else {
                    index.insert(state, threads.len());
                    threads.push(state);
                    commands.push(ThreadCommand {
                        origins: vec![origin],
                    });
                }
            }
            for &id in nfa.state(state).outgoing.iter().rev() {
                let arc = nfa.arc(id);
                if arc.condition.is_some() || visited.contains(&arc.target) {
                    continue;
                }
                let mut tags = tags.clone();
                tags.extend(arc.tag);
                stack.push((arc.target, tags));
            }
        }
    }
    (threads, commands)
}

struct Merged {
    /// Indexes into the candidate list, increasing.
    members: Vec<usize>,
    condition: FeatureStruct,
    anchor: AnchorSides,
}

/// A conditioned NFA arc leaving one of the threads of a state.
struct Candidate<'a> {
    thread: usize,
    arc: ArcId,
    target: StateId,
    condition: &'a Condition,
}

/// Every combination of candidate arcs whose conditions unify.
fn merge_candidates(candidates: &[Candidate<'_>]) -> Vec<Merged> {
    let mut merged: Vec<Merged> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| Merged {
            members: vec![i],
            condition: c.condition.fs.clone(),
            anchor: c.condition.anchor,
        })
        .collect();

    let mut next = 0;
    'grow: while next < merged.len() {
        let last = merged[next].members.last().copied().unwrap_or_default();
        for (j, candidate) in candidates.iter().enumerate().skip(last + 1) {
            if let Some(condition) = merged[next].condition.unify(&candidate.condition.fs) {
                let mut members = merged[next].members.clone();
                members.push(j);
                let anchor = merged[next].anchor.union(candidate.condition.anchor);
                merged.push(Merged {
                    members,
                    condition,
                    anchor,
                });
                if merged.len() >= MAX_MERGED_ARCS {
                    break 'grow;
                }
            }
        }
        next += 1;
    }

    merged.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.members.cmp(&b.members))
    });
    merged
}

struct Determinizer<'a> {
    nfa: &'a Nfa,
    states: Vec<DfaState>,
    index: FxHashMap<Vec<StateId>, DfaStateId>,
    worklist: VecDeque<DfaStateId>,
}

impl Determinizer<'_> {
    fn state_for(&mut self, threads: Vec<StateId>) -> Result<DfaStateId> {
        if let Some(&id) = self.index.get(&threads) {
            return Ok(id);
        }
        if self.states.len() >= MAX_DFA_STATES {
            return Err(Error::TooManyStates);
        }
        let mut accepting: Vec<(usize, usize)> = threads
            .iter()
            .enumerate()
            .filter_map(|(t, &state)| {
                let acceptor = self.nfa.state(state).accept.as_ref()?;
                Some((acceptor.priority, t))
            })
            .collect();
        accepting.sort_unstable();
        let priority = accepting.first().map(|&(priority, _)| priority);
        let id = self.states.len();
        self.index.insert(threads.clone(), id);
        self.states.push(DfaState {
            threads,
            arcs: Vec::new(),
            accepting: accepting.into_iter().map(|(_, t)| t).collect(),
            priority,
        });
        self.worklist.push_back(id);
        Ok(id)
    }

    fn expand(&mut self, id: DfaStateId) -> Result<()> {
        let nfa = self.nfa;
        let candidates: Vec<Candidate<'_>> = self.states[id]
            .threads
            .iter()
            .enumerate()
            .flat_map(|(thread, &state)| {
                nfa.state(state).outgoing.iter().filter_map(move |&arc| {
                    let nfa_arc = nfa.arc(arc);
                    Some(Candidate {
                        thread,
                        arc,
                        target: nfa_arc.target,
                        condition: nfa_arc.condition.as_ref()?,
                    })
                })
            })
            .collect();

        let mut arcs = Vec::new();
        for merged in merge_candidates(&candidates) {
            let seeds = merged.members.iter().map(|&m| {
                let candidate = &candidates[m];
                (candidate.thread, Some(candidate.arc), candidate.target)
            });
            let (threads, commands) = closure(nfa, seeds);
            if threads.is_empty() {
                continue;
            }
            let target = self.state_for(threads)?;
            let mut sources: Vec<ArcId> = merged.members.iter().map(|&m| candidates[m].arc).collect();
            sources.sort_unstable();
            arcs.push(DfaArc {
                condition: merged.condition,
                anchor: merged.anchor,
                target,
                commands,
                sources,
            });
        }
        self.states[id].arcs = arcs;
        Ok(())
    }
}

/// Converts `nfa` into a deterministic automaton by subset construction.
pub(crate) fn determinize(nfa: &Nfa) -> Result<Dfa> {
    let mut determinizer = Determinizer {
        nfa,
        states: Vec::new(),
        index: FxHashMap::default(),
        worklist: VecDeque::new(),
    };
    let (threads, start_commands) = closure(nfa, [(0, None, nfa.start())]);
    let start = determinizer.state_for(threads)?;
    while let Some(id) = determinizer.worklist.pop_front() {
        determinizer.expand(id)?;
    }
    Ok(Dfa {
        states: determinizer.states,
        start,
        start_commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, Expression, PatternNode, Quantifier, fsa::nfa};

    fn seg(symbol: &str) -> FeatureStruct {
        FeatureStruct::new().symbol("seg", symbol).frozen()
    }

    fn nfa_for(children: Vec<PatternNode>) -> Nfa {
        nfa::build(&Expression::new(None, children), Direction::LeftToRight)
            .unwrap()
            .nfa
    }

    /// Plain NFA simulation: does some path consume all of `input` and accept?
    fn nfa_accepts(nfa: &Nfa, input: &[FeatureStruct]) -> bool {
        let eps_closure = |seeds: Vec<StateId>| {
            let mut seen: FxHashSet<StateId> = FxHashSet::default();
            let mut stack = seeds;
            while let Some(s) = stack.pop() {
                if seen.insert(s) {
                    stack.extend(
                        nfa.outgoing(s)
                            .filter(|arc| arc.condition.is_none())
                            .map(|arc| arc.target),
                    );
                }
            }
            seen
        };
        let mut current = eps_closure(vec![nfa.start()]);
        for fs in input {
            let next = current
                .iter()
                .flat_map(|&s| nfa.outgoing(s))
                .filter(|arc| {
                    arc.condition
                        .as_ref()
                        .is_some_and(|c| c.fs.is_unifiable(fs))
                })
                .map(|arc| arc.target)
                .collect();
            current = eps_closure(next);
        }
        current.iter().any(|&s| nfa.state(s).accept.is_some())
    }

    /// Depth-first DFA run with fallback to the remaining arcs.
    fn dfa_accepts(dfa: &Dfa, state: DfaStateId, input: &[FeatureStruct]) -> bool {
        let Some((fs, rest)) = input.split_first() else {
            return dfa.state(state).is_accepting();
        };
        dfa.state(state)
            .arcs
            .iter()
            .filter(|arc| arc.condition.is_unifiable(fs))
            .any(|arc| dfa_accepts(dfa, arc.target, rest))
    }

    fn words(alphabet: &[&str], max_len: usize) -> Vec<Vec<FeatureStruct>> {
        let mut all = vec![vec![]];
        let mut frontier: Vec<Vec<FeatureStruct>> = vec![vec![]];
        for _ in 0..max_len {
            let mut next = Vec::new();
            for word in &frontier {
                for symbol in alphabet {
                    let mut w = word.clone();
                    w.push(seg(symbol));
                    next.push(w);
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }
        all
    }

    #[test]
    fn determinization_preserves_the_language() {
        let a = || PatternNode::Constraint(seg("a"));
        let b = || PatternNode::Constraint(seg("b"));
        let any = || PatternNode::Constraint(FeatureStruct::new().frozen());
        let patterns = vec![
            vec![a(), PatternNode::quantified(b(), Quantifier::ZERO_OR_MORE), a()],
            vec![PatternNode::Alternation(vec![
                PatternNode::Group {
                    name: None,
                    children: vec![a(), b()],
                },
                PatternNode::Group {
                    name: None,
                    children: vec![any(), any(), any()],
                },
            ])],
            vec![
                PatternNode::quantified(any(), Quantifier::new(1, Some(2))),
                PatternNode::quantified(a(), Quantifier::ONE_OR_MORE),
            ],
            vec![PatternNode::quantified(
                PatternNode::Alternation(vec![a(), any()]),
                Quantifier::new(2, None),
            )],
        ];
        for children in patterns {
            let nfa = nfa_for(children);
            let dfa = determinize(&nfa).unwrap();
            for word in words(&["a", "b", "c"], 4) {
                assert_eq!(
                    nfa_accepts(&nfa, &word),
                    dfa_accepts(&dfa, dfa.start(), &word),
                    "language mismatch on {word:?}"
                );
            }
        }
    }

    #[test]
    fn unifiable_arcs_are_merged_most_specific_first() {
        let nfa = nfa_for(vec![PatternNode::Alternation(vec![
            PatternNode::Constraint(seg("a")),
            PatternNode::Constraint(FeatureStruct::new().symbol("voice", "+").frozen()),
        ])]);
        let dfa = determinize(&nfa).unwrap();
        let start = dfa.state(dfa.start());
        assert_eq!(start.arcs.len(), 3);
        assert_eq!(start.arcs[0].sources.len(), 2);
        assert_eq!(start.arcs[0].condition.to_string(), "[seg:a voice:+]");
    }

    #[test]
    fn accepting_state_keeps_best_priority() {
        let root = Expression::new(
            None,
            vec![
                PatternNode::Expression(Expression::new(
                    Some("first".into()),
                    vec![PatternNode::Constraint(seg("a"))],
                )),
                PatternNode::Expression(Expression::new(
                    Some("second".into()),
                    vec![PatternNode::Constraint(seg("a"))],
                )),
            ],
        );
        let nfa = nfa::build(&root, Direction::LeftToRight).unwrap().nfa;
        let dfa = determinize(&nfa).unwrap();
        let merged = &dfa.state(dfa.start()).arcs[0];
        let target = dfa.state(merged.target);
        assert_eq!(target.accepting.len(), 2);
        assert_eq!(target.priority, Some(0));
    }

    #[test]
    fn epsilon_cycles_terminate() {
        let empty_group = PatternNode::Group {
            name: Some("g".into()),
            children: vec![PatternNode::quantified(
                PatternNode::Constraint(seg("a")),
                Quantifier::ZERO_OR_MORE,
            )],
        };
        let nfa = nfa_for(vec![PatternNode::quantified(
            empty_group,
            Quantifier::ZERO_OR_MORE,
        )]);
        assert!(determinize(&nfa).is_ok());
    }
}
