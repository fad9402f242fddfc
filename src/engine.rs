//! Execution of compiled automata against annotation lists.
//!
//! A match attempt starts at one annotation and explores the deterministic
//! automaton depth-first. At each configuration the arcs of the current
//! state are tried in order. An arc is taken when the next admissible
//! annotation unifies with its condition and at least one target thread
//! survives. Each thread carries one run per distinct set of variable
//! bindings, and every run re-checks the NFA arc it came through under its
//! own bindings, so bindings never leak between alternatives that share a
//! deterministic state. Arcs merged from a subset of an arc already
//! taken are skipped, so each input path is explored once. Every accepting
//! thread is checked against its alternative's anchors and acceptance
//! predicates.

pub(crate) mod anchor;
pub(crate) mod state;

use self::{
    anchor::AnchorMarks,
    state::{Frame, Run, advance},
};
use crate::{
    AnnotationList, Direction, Error, FeatureStruct, MatcherSettings, PatternMatch, Result,
    VariableBindings,
    fsa::{ArcId, Automaton, dfa::DfaArc, nfa::Acceptor},
};
use log::trace;
use std::cmp::Reverse;

/// An accepted completion of a match attempt.
struct Candidate {
    priority: usize,
    length: usize,
    order: usize,
    m: PatternMatch,
}

/// A search of one automaton over one annotation list.
pub(crate) struct Search<'a> {
    automaton: &'a Automaton,
    input: &'a AnnotationList,
    settings: &'a MatcherSettings,
    /// Admissible annotation indexes in traversal order.
    order: Vec<usize>,
    marks: Option<AnchorMarks>,
}

impl<'a> Search<'a> {
    pub fn new(
        automaton: &'a Automaton,
        input: &'a AnnotationList,
        settings: &'a MatcherSettings,
    ) -> Self {
        let order = input.admissible(automaton.direction(), &settings.filter);
        let marks = automaton
            .has_anchors()
            .then(|| AnchorMarks::new(input, &settings.filter));
        Self {
            automaton,
            input,
            settings,
            order,
            marks,
        }
    }

    /// Finds the matches at the first start position, at or after the
    /// annotation `start` in traversal order, that yields any.
    ///
    /// With `all_matches` unset at most one match, the best, is returned.
    pub fn find(&self, start: usize, all_matches: bool) -> Result<Vec<PatternMatch>> {
        let Some(first) = self.position_of(start) else {
            return Ok(Vec::new());
        };
        let last = if self.settings.anchored_to_start {
            first + 1
        } else {
            self.order.len()
        };

        for pos in first..last {
            let mut candidates = self.attempt(pos)?;
            if candidates.is_empty() {
                continue;
            }
            trace!(
                "{} accepting completions at annotation {}",
                candidates.len(),
                self.order[pos]
            );
            candidates.sort_by_key(|c| (c.priority, Reverse(c.length), c.order));
            if !all_matches {
                candidates.truncate(1);
            }
            let mut matches: Vec<PatternMatch> = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if !matches.contains(&candidate.m) {
                    matches.push(candidate.m);
                }
            }
            return Ok(matches);
        }
        Ok(Vec::new())
    }

    /// Position in the traversal order of the first admissible annotation at
    /// or after `start`.
    fn position_of(&self, start: usize) -> Option<usize> {
        match self.automaton.direction() {
            Direction::LeftToRight => self.order.iter().position(|&i| i >= start),
            Direction::RightToLeft => self.order.iter().position(|&i| i <= start),
        }
    }

    fn attempt(&self, start: usize) -> Result<Vec<Candidate>> {
        let dfa = self.automaton.dfa();
        let runs = advance(
            &dfa.start_commands,
            &[vec![Run::new(self.automaton.registers)]],
            None,
            self.order.get(start).copied(),
            |_, _| true,
        );
        let mut stack = vec![Frame {
            state: dfa.start(),
            pos: start,
            runs,
        }];
        let mut candidates = Vec::new();
        let mut steps = 0;

        while let Some(frame) = stack.pop() {
            steps += 1;
            if steps > self.settings.max_steps {
                return Err(Error::StepLimit {
                    limit: self.settings.max_steps,
                });
            }
            self.accept(&frame, start, &mut candidates);

            let Some(&index) = self.order.get(frame.pos) else {
                continue;
            };
            let state = dfa.state(frame.state);
            let fs = &self.input[index].fs;
            let mut taken: Vec<&DfaArc> = Vec::new();
            let mut next = Vec::new();
            for arc in &state.arcs {
                if taken.iter().any(|t| is_subset(&arc.sources, &t.sources)) {
                    continue;
                }
                if frame.pos == start && !self.admits_leading(arc, index) {
                    continue;
                }
                if !arc.condition.is_unifiable(fs) {
                    continue;
                }
                let target = Frame {
                    state: arc.target,
                    pos: frame.pos + 1,
                    runs: advance(
                        &arc.commands,
                        &frame.runs,
                        Some(index),
                        self.order.get(frame.pos + 1).copied(),
                        |id, bindings| self.admits(id, fs, bindings),
                    ),
                };
                if !target.is_alive() {
                    continue;
                }
                taken.push(arc);
                next.push(target);
            }
            stack.extend(next.into_iter().rev());
        }
        Ok(candidates)
    }

    /// Anchor check for an arc taken on the first annotation of an attempt.
    /// Only the edge read first can be decided here; the other edge is
    /// checked on acceptance.
    fn admits_leading(&self, arc: &DfaArc, index: usize) -> bool {
        let Some(marks) = &self.marks else {
            return true;
        };
        match self.automaton.direction() {
            Direction::LeftToRight => !arc.anchor.start || marks.is_left(index),
            Direction::RightToLeft => !arc.anchor.end || marks.is_right(index),
        }
    }

    /// Whether the NFA arc `id` consumes `fs` under a thread's `bindings`,
    /// extending them on success.
    fn admits(&self, id: ArcId, fs: &FeatureStruct, bindings: &mut VariableBindings) -> bool {
        self.automaton
            .nfa()
            .arc(id)
            .condition
            .as_ref()
            .is_some_and(|condition| condition.fs.unify_bound(fs, bindings).is_some())
    }

    fn accept(&self, frame: &Frame, start: usize, candidates: &mut Vec<Candidate>) {
        let state = self.automaton.dfa().state(frame.state);
        for &thread in &state.accepting {
            let Some(acceptor) = &self.automaton.nfa().state(state.threads[thread]).accept else {
                continue;
            };
            for run in frame.runs.get(thread).into_iter().flatten() {
                self.accept_run(run, acceptor, frame.pos - start, candidates);
            }
        }
    }

    fn accept_run(
        &self,
        run: &Run,
        acceptor: &Acceptor,
        length: usize,
        candidates: &mut Vec<Candidate>,
    ) {
        let Some(m) = PatternMatch::assemble(
            self.input,
            self.automaton.direction(),
            &self.automaton.groups,
            &run.registers,
            &acceptor.path,
            run.bindings.clone(),
        ) else {
            return;
        };
        if let Some(marks) = &self.marks
            && !marks.admits_span(acceptor.anchors, m.first_index(), m.last_index())
        {
            return;
        }
        // nested predicates only apply when their expression took part
        if acceptor
            .predicates
            .iter()
            .filter(|p| p.scope.is_none_or(|g| run.registers.get(g.index()).is_set()))
            .all(|p| p.acceptable.accepts(self.input, &m))
        {
            candidates.push(Candidate {
                priority: acceptor.priority,
                length,
                order: candidates.len(),
                m,
            });
        }
    }
}

fn is_subset<T: PartialEq>(sub: &[T], of: &[T]) -> bool {
    sub.len() <= of.len() && sub.iter().all(|x| of.contains(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Annotation, Expression, PatternNode, Quantifier, Span,
        fsa::{StateId, nfa::Nfa},
    };
    use rustc_hash::FxHashSet;

    fn constraint(fs: FeatureStruct) -> PatternNode {
        PatternNode::Constraint(fs.frozen())
    }

    fn agree(feature: &str) -> PatternNode {
        constraint(FeatureStruct::new().variable(feature, "a"))
    }

    fn disagree(feature: &str) -> PatternNode {
        constraint(FeatureStruct::new().not_variable(feature, "a"))
    }

    fn x(symbol: &str) -> PatternNode {
        constraint(FeatureStruct::new().symbol("x", symbol))
    }

    /// Does some path of `nfa` consume all of `input` and accept, binding
    /// variables consistently along the way?
    fn nfa_accepts(nfa: &Nfa, input: &[FeatureStruct]) -> bool {
        let mut seen: FxHashSet<(StateId, usize, VariableBindings)> = FxHashSet::default();
        let mut stack = vec![(nfa.start(), 0, VariableBindings::new())];
        while let Some((state, pos, bindings)) = stack.pop() {
            if !seen.insert((state, pos, bindings.clone())) {
                continue;
            }
            if pos == input.len() && nfa.state(state).accept.is_some() {
                return true;
            }
            for arc in nfa.outgoing(state) {
                let Some(condition) = &arc.condition else {
                    stack.push((arc.target, pos, bindings.clone()));
                    continue;
                };
                let Some(fs) = input.get(pos) else {
                    continue;
                };
                let mut bindings = bindings.clone();
                if condition.fs.unify_bound(fs, &mut bindings).is_some() {
                    stack.push((arc.target, pos + 1, bindings));
                }
            }
        }
        false
    }

    fn executor_accepts(automaton: &Automaton, input: &[FeatureStruct]) -> bool {
        let mut list = AnnotationList::new();
        for (i, fs) in input.iter().enumerate() {
            list.push(Annotation::new(Span::new(i, i + 1), fs.clone()))
                .unwrap();
        }
        let settings = MatcherSettings::default().with_anchored_to_start(true);
        Search::new(automaton, &list, &settings)
            .find(0, true)
            .unwrap()
            .iter()
            .any(|m| m.first_index() == 0 && m.last_index() + 1 == input.len())
    }

    fn alphabet() -> Vec<FeatureStruct> {
        vec![
            FeatureStruct::new().symbol("f", "+").symbol("g", "-"),
            FeatureStruct::new().symbol("g", "0").symbol("x", "2"),
            FeatureStruct::new().symbol("g", "-").symbol("x", "1"),
            FeatureStruct::new().symbol("f", "-").symbol("g", "+"),
            FeatureStruct::new().symbol("x", "1"),
        ]
    }

    fn words(max_len: usize) -> Vec<Vec<FeatureStruct>> {
        let mut all = Vec::new();
        let mut frontier: Vec<Vec<FeatureStruct>> = vec![vec![]];
        for _ in 0..max_len {
            let mut next = Vec::new();
            for word in &frontier {
                for fs in alphabet() {
                    let mut w = word.clone();
                    w.push(fs);
                    next.push(w);
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }
        all
    }

    #[test]
    fn variable_bindings_preserve_the_language() {
        let patterns = vec![
            vec![
                PatternNode::Expression(Expression::new(
                    Some("rule1".into()),
                    vec![disagree("f"), x("1")],
                )),
                PatternNode::Expression(Expression::new(
                    Some("rule2".into()),
                    vec![agree("g"), agree("g")],
                )),
            ],
            vec![
                PatternNode::Alternation(vec![agree("g"), x("1")]),
                disagree("g"),
            ],
            vec![
                agree("g"),
                PatternNode::Alternation(vec![agree("g"), x("1")]),
                disagree("g"),
            ],
            vec![
                PatternNode::quantified(agree("g"), Quantifier::ONE_OR_MORE),
                disagree("f"),
            ],
            vec![
                PatternNode::quantified(
                    PatternNode::Alternation(vec![disagree("f"), x("2")]),
                    Quantifier::new(1, Some(2)),
                ),
                agree("g"),
            ],
        ];
        for (i, children) in patterns.into_iter().enumerate() {
            let root = Expression::new(None, children);
            let automaton = Automaton::compile(&root, Direction::LeftToRight).unwrap();
            for word in words(3) {
                assert_eq!(
                    nfa_accepts(automaton.nfa(), &word),
                    executor_accepts(&automaton, &word),
                    "pattern {i} on {word:?}"
                );
            }
        }
    }

    #[test]
    fn alternatives_keep_their_own_bindings() {
        let root = Expression::new(
            None,
            vec![
                PatternNode::Alternation(vec![agree("g"), x("1")]),
                disagree("g"),
            ],
        );
        let automaton = Automaton::compile(&root, Direction::LeftToRight).unwrap();
        let word = [
            FeatureStruct::new().symbol("g", "-").symbol("x", "1"),
            FeatureStruct::new().symbol("g", "-"),
        ];
        assert!(executor_accepts(&automaton, &word));
    }
}
