//! Thompson-style NFA construction from pattern trees.

use super::{AnchorSides, ArcId, GroupId, StateId, Tag};
use crate::{
    Acceptable, Direction, Expression, FeatureStruct, PatternNode, Quantifier, Result,
    ast::{first_in, in_direction},
};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

/// The feature condition on an input-consuming arc.
#[derive(Clone, Debug)]
pub struct Condition {
    pub fs: FeatureStruct,
    pub anchor: AnchorSides,
}

/// An acceptance predicate, optionally limited to matches that went through
/// the expression it was declared on.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub acceptable: Acceptable,
    /// Tag group of the declaring expression; `None` for the root and the
    /// alternatives' own expressions, whose predicates always apply.
    pub scope: Option<GroupId>,
}

impl Predicate {
    fn unscoped(acceptable: &Acceptable) -> Self {
        Self {
            acceptable: acceptable.clone(),
            scope: None,
        }
    }
}

/// Identifies the alternative an accepting state belongs to.
#[derive(Clone, Debug)]
pub struct Acceptor {
    /// Names of the expressions from the root down to the alternative.
    pub path: Vec<String>,
    /// Lower values win; assigned in declaration order.
    pub priority: usize,
    /// Acceptance predicates of the alternative, its ancestors and the
    /// expressions nested in it.
    pub predicates: Vec<Predicate>,
    /// Sequence edges the alternative is anchored to.
    pub anchors: AnchorSides,
}

#[derive(Clone, Debug, Default)]
pub struct NfaState {
    pub outgoing: Vec<ArcId>,
    pub incoming: Vec<ArcId>,
    pub accept: Option<Acceptor>,
}

#[derive(Clone, Debug)]
pub struct NfaArc {
    pub source: StateId,
    pub target: StateId,
    /// `None` for arcs that are followed without consuming input.
    pub condition: Option<Condition>,
    pub tag: Option<Tag>,
    /// Rank among the source's outgoing arcs; lower ranks are explored first.
    pub priority: usize,
}

#[derive(Clone, Debug)]
pub struct Nfa {
    pub(crate) states: Vec<NfaState>,
    pub(crate) arcs: Vec<NfaArc>,
    pub(crate) start: StateId,
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

impl Nfa {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: vec![NfaState::default()],
            arcs: Vec::new(),
            start: StateId(0),
        }
    }

    #[must_use]
    pub fn start(&self) -> StateId {
        self.start
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &NfaState {
        &self.states[id.0]
    }

    #[must_use]
    pub fn arc(&self, id: ArcId) -> &NfaArc {
        &self.arcs[id.0]
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &NfaState)> {
        self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
    }

    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &NfaArc)> {
        self.arcs.iter().enumerate().map(|(i, a)| (ArcId(i), a))
    }

    pub fn outgoing(&self, id: StateId) -> impl Iterator<Item = &NfaArc> {
        self.states[id.0].outgoing.iter().map(|&arc| &self.arcs[arc.0])
    }

    pub fn add_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        StateId(self.states.len() - 1)
    }

    pub fn add_accepting_state(&mut self, acceptor: Acceptor) -> StateId {
        let id = self.add_state();
        self.states[id.0].accept = Some(acceptor);
        id
    }

    pub fn add_arc(
        &mut self,
        source: StateId,
        target: StateId,
        condition: Option<Condition>,
        tag: Option<Tag>,
    ) -> ArcId {
        let id = ArcId(self.arcs.len());
        let priority = self.states[source.0].outgoing.len();
        self.arcs.push(NfaArc {
            source,
            target,
            condition,
            tag,
            priority,
        });
        self.states[source.0].outgoing.push(id);
        self.states[target.0].incoming.push(id);
        id
    }

    pub fn add_epsilon(&mut self, source: StateId, target: StateId) -> ArcId {
        self.add_arc(source, target, None, None)
    }

    /// True if the state consumes input or accepts; only such states need
    /// to be tracked during execution.
    #[must_use]
    pub fn is_significant(&self, id: StateId) -> bool {
        let state = &self.states[id.0];
        state.accept.is_some() || self.outgoing(id).any(|arc| arc.condition.is_some())
    }

    /// Conditioned arcs that can be taken first after `from` (`forward`) or
    /// last before reaching `from` (backward), looking through arcs that
    /// consume no input.
    #[must_use]
    pub fn boundary_conditions(&self, from: StateId, forward: bool) -> Vec<ArcId> {
        let mut visited = FxHashSet::default();
        let mut worklist = vec![from];
        let mut found = Vec::new();
        while let Some(state) = worklist.pop() {
            if !visited.insert(state) {
                continue;
            }
            let arcs = if forward {
                &self.states[state.0].outgoing
            } else {
                &self.states[state.0].incoming
            };
            for &id in arcs {
                let arc = &self.arcs[id.0];
                if arc.condition.is_some() {
                    if !found.contains(&id) {
                        found.push(id);
                    }
                } else {
                    worklist.push(if forward { arc.target } else { arc.source });
                }
            }
        }
        found
    }
}

/// The result of NFA construction.
pub(crate) struct Built {
    pub nfa: Nfa,
    /// Named capture groups in declaration order.
    pub groups: IndexMap<String, GroupId>,
    /// Number of registers a thread needs, including the overall match and
    /// the unnamed groups that scope nested predicates.
    pub registers: usize,
}

/// Builds the NFA for `root` traversed in `dir`.
pub(crate) fn build(root: &Expression, dir: Direction) -> Result<Built> {
    let mut builder = Builder {
        nfa: Nfa::new(),
        dir,
        groups: IndexMap::new(),
        next_group: 1,
        next_priority: 0,
    };
    let start = builder.nfa.start;
    builder.expression(start, root, &[], &[])?;
    Ok(Built {
        nfa: builder.nfa,
        groups: builder.groups,
        registers: builder.next_group,
    })
}

struct Builder {
    nfa: Nfa,
    dir: Direction,
    groups: IndexMap<String, GroupId>,
    next_group: usize,
    next_priority: usize,
}

impl Builder {
    fn group_id(&mut self, name: &str) -> GroupId {
        if let Some(&id) = self.groups.get(name) {
            return id;
        }
        let id = self.new_group();
        self.groups.insert(name.to_owned(), id);
        id
    }

    fn new_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        id
    }

    /// Wraps the fragment built by `body` in the open and close tags of
    /// `group`.
    fn tagged(
        &mut self,
        start: StateId,
        group: GroupId,
        body: impl FnOnce(&mut Self, StateId) -> Result<StateId>,
    ) -> Result<StateId> {
        let inner = self.nfa.add_state();
        self.nfa.add_arc(start, inner, None, Some(Tag::open(group)));
        let inner_end = body(self, inner)?;
        let exit = self.nfa.add_state();
        self.nfa
            .add_arc(inner_end, exit, None, Some(Tag::close(group)));
        Ok(exit)
    }

    /// Emits one alternative per leaf-bearing expression. Composite
    /// expressions are flattened: their alternatives all leave from `start`
    /// and are prioritised in declaration order.
    fn expression(
        &mut self,
        start: StateId,
        expr: &Expression,
        path: &[String],
        predicates: &[Predicate],
    ) -> Result<()> {
        let mut path = path.to_vec();
        path.extend(expr.name.iter().cloned());
        let mut predicates = predicates.to_vec();
        predicates.extend(expr.acceptables.iter().map(Predicate::unscoped));

        if expr.is_composite() {
            for child in &expr.children {
                if let PatternNode::Expression(child) = child {
                    self.expression(start, child, &path, &predicates)?;
                }
            }
            return Ok(());
        }

        let body_start = self.nfa.add_state();
        self.nfa
            .add_arc(start, body_start, None, Some(Tag::open(GroupId::ENTIRE)));
        let body_end = self.sequence(body_start, &expr.children, &mut predicates)?;

        let mut anchors = AnchorSides::default();
        if let Some(kind) =
            first_in(&expr.children, self.dir).and_then(|node| node.leading_anchor(self.dir))
        {
            self.mark_anchored(body_start, true, kind.into());
            anchors = anchors.union(kind.into());
        }
        let reverse = self.dir.reverse();
        if let Some(kind) =
            first_in(&expr.children, reverse).and_then(|node| node.leading_anchor(reverse))
        {
            self.mark_anchored(body_end, false, kind.into());
            anchors = anchors.union(kind.into());
        }

        let exit = self.nfa.add_state();
        self.nfa
            .add_arc(body_end, exit, None, Some(Tag::close(GroupId::ENTIRE)));
        let accepting = self.nfa.add_accepting_state(Acceptor {
            path,
            priority: self.next_priority,
            predicates,
            anchors,
        });
        self.next_priority += 1;
        self.nfa.add_epsilon(exit, accepting);
        Ok(())
    }

    fn mark_anchored(&mut self, from: StateId, forward: bool, sides: AnchorSides) {
        for id in self.nfa.boundary_conditions(from, forward) {
            if let Some(condition) = self.nfa.arcs[id.0].condition.as_mut() {
                condition.anchor = condition.anchor.union(sides);
            }
        }
    }

    fn sequence(
        &mut self,
        start: StateId,
        nodes: &[PatternNode],
        predicates: &mut Vec<Predicate>,
    ) -> Result<StateId> {
        let mut current = start;
        for node in in_direction(nodes, self.dir) {
            current = self.node(current, node, predicates)?;
        }
        Ok(current)
    }

    /// Emits the fragment for `node` starting at `start` and returns its exit
    /// state.
    fn node(
        &mut self,
        start: StateId,
        node: &PatternNode,
        predicates: &mut Vec<Predicate>,
    ) -> Result<StateId> {
        match node {
            PatternNode::Constraint(fs) => {
                let target = self.nfa.add_state();
                let condition = Condition {
                    fs: fs.clone(),
                    anchor: AnchorSides::default(),
                };
                self.nfa.add_arc(start, target, Some(condition), None);
                Ok(target)
            }
            PatternNode::Group { name, children } => {
                let Some(name) = name else {
                    return self.sequence(start, children, predicates);
                };
                let group = self.group_id(name);
                self.tagged(start, group, |b, inner| {
                    b.sequence(inner, children, predicates)
                })
            }
            PatternNode::Quantified { node, quantifier } => {
                self.quantified(start, node, *quantifier, predicates)
            }
            PatternNode::Alternation(branches) => {
                let exit = self.nfa.add_state();
                for branch in branches {
                    let entry = self.nfa.add_state();
                    self.nfa.add_epsilon(start, entry);
                    let end = self.node(entry, branch, predicates)?;
                    self.nfa.add_epsilon(end, exit);
                }
                Ok(exit)
            }
            PatternNode::Anchor(_) => Ok(start),
            PatternNode::Expression(expr) if expr.acceptables.is_empty() => {
                self.sequence(start, &expr.children, predicates)
            }
            PatternNode::Expression(expr) => {
                // the predicates only apply to matches that pass through here
                let scope = self.new_group();
                predicates.extend(expr.acceptables.iter().map(|acceptable| Predicate {
                    acceptable: acceptable.clone(),
                    scope: Some(scope),
                }));
                self.tagged(start, scope, |b, inner| {
                    b.sequence(inner, &expr.children, predicates)
                })
            }
        }
    }

    /// Unrolls the mandatory repetitions, then either loops (unbounded) or
    /// chains optional copies that can each bail out to a shared exit.
    /// Entering the body is always ranked before skipping it.
    fn quantified(
        &mut self,
        start: StateId,
        node: &PatternNode,
        quantifier: Quantifier,
        predicates: &mut Vec<Predicate>,
    ) -> Result<StateId> {
        quantifier.validate()?;
        let mut current = start;
        for _ in 0..quantifier.min {
            current = self.node(current, node, predicates)?;
        }
        match quantifier.max {
            None => {
                let head = self.nfa.add_state();
                self.nfa.add_epsilon(current, head);
                let body_end = self.node(head, node, predicates)?;
                let exit = self.nfa.add_state();
                self.nfa.add_epsilon(head, exit);
                self.nfa.add_epsilon(body_end, head);
                Ok(exit)
            }
            Some(max) => {
                let exit = self.nfa.add_state();
                for _ in quantifier.min..max {
                    let next = self.node(current, node, predicates)?;
                    self.nfa.add_epsilon(current, exit);
                    current = next;
                }
                self.nfa.add_epsilon(current, exit);
                Ok(exit)
            }
        }
    }
}
