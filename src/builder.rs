//! Fluent construction of pattern trees.
//!
//! ```
//! use fsmatch::{FeatureStruct, Pattern, builder::PatternSyntax};
//!
//! let pattern = Pattern::builder()
//!     .group("onset", |g| g.annotation(FeatureStruct::new().symbol("cons", "+")))
//!     .one_or_more(|q| q.annotation(FeatureStruct::new().symbol("cons", "-")))
//!     .build()
//!     .unwrap()
//!     .frozen();
//! assert!(pattern.is_frozen());
//! ```

use crate::{
    Acceptable, AnchorKind, AnnotationList, Direction, Expression, FeatureStruct, Filter,
    MatcherSettings, Pattern, PatternMatch, PatternNode, Quantifier, Result,
};

/// Node-adding operations shared by every builder.
///
/// Nested structures are described by closures that receive a fresh
/// [`NodesBuilder`] and return it filled in.
pub trait PatternSyntax: Sized {
    /// Appends `node` as is.
    #[must_use]
    fn node(self, node: PatternNode) -> Self;

    /// Appends a constraint matching one annotation that unifies with `fs`.
    #[must_use]
    fn annotation(self, fs: FeatureStruct) -> Self {
        self.node(PatternNode::Constraint(fs))
    }

    /// Appends a capturing group.
    #[must_use]
    fn group(self, name: impl Into<String>, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.node(PatternNode::group(name, f(NodesBuilder::new()).nodes))
    }

    /// Appends a non-capturing group.
    #[must_use]
    fn sequence(self, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.node(PatternNode::Group {
            name: None,
            children: f(NodesBuilder::new()).nodes,
        })
    }

    #[must_use]
    fn quantified(
        self,
        quantifier: Quantifier,
        f: impl FnOnce(NodesBuilder) -> NodesBuilder,
    ) -> Self {
        self.node(PatternNode::quantified(
            f(NodesBuilder::new()).into_node(),
            quantifier,
        ))
    }

    #[must_use]
    fn optional(self, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.quantified(Quantifier::ZERO_OR_ONE, f)
    }

    #[must_use]
    fn zero_or_more(self, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.quantified(Quantifier::ZERO_OR_MORE, f)
    }

    #[must_use]
    fn one_or_more(self, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.quantified(Quantifier::ONE_OR_MORE, f)
    }

    /// Appends a node repeated between `min` and `max` times; `None` leaves
    /// the upper bound open.
    #[must_use]
    fn range(
        self,
        min: usize,
        max: Option<usize>,
        f: impl FnOnce(NodesBuilder) -> NodesBuilder,
    ) -> Self {
        self.quantified(Quantifier::new(min, max), f)
    }

    #[must_use]
    fn alternation(self, f: impl FnOnce(AlternationBuilder) -> AlternationBuilder) -> Self {
        self.node(PatternNode::Alternation(
            f(AlternationBuilder::default()).branches,
        ))
    }

    #[must_use]
    fn start_anchor(self) -> Self {
        self.node(PatternNode::Anchor(AnchorKind::Start))
    }

    #[must_use]
    fn end_anchor(self) -> Self {
        self.node(PatternNode::Anchor(AnchorKind::End))
    }

    /// Appends a named sub-pattern with its own acceptance predicates.
    #[must_use]
    fn expression(
        self,
        name: impl Into<String>,
        f: impl FnOnce(ExpressionBuilder) -> ExpressionBuilder,
    ) -> Self {
        let builder = f(ExpressionBuilder {
            expression: Expression::new(Some(name.into()), Vec::new()),
        });
        self.node(PatternNode::Expression(builder.expression))
    }
}

/// Collects a list of sibling nodes.
#[derive(Debug, Default)]
pub struct NodesBuilder {
    nodes: Vec<PatternNode>,
}

impl NodesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn build(self) -> Vec<PatternNode> {
        self.nodes
    }

    /// A single node stands for itself; anything else becomes a
    /// non-capturing group.
    fn into_node(mut self) -> PatternNode {
        if self.nodes.len() == 1
            && let Some(node) = self.nodes.pop()
        {
            return node;
        }
        PatternNode::Group {
            name: None,
            children: self.nodes,
        }
    }
}

impl PatternSyntax for NodesBuilder {
    fn node(mut self, node: PatternNode) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Collects the branches of an alternation in priority order.
#[derive(Debug, Default)]
pub struct AlternationBuilder {
    branches: Vec<PatternNode>,
}

impl AlternationBuilder {
    #[must_use]
    pub fn branch(mut self, f: impl FnOnce(NodesBuilder) -> NodesBuilder) -> Self {
        self.branches.push(f(NodesBuilder::new()).into_node());
        self
    }
}

/// Builds a named [`Expression`].
#[derive(Debug)]
pub struct ExpressionBuilder {
    expression: Expression,
}

impl ExpressionBuilder {
    /// Adds a predicate the match must satisfy before it is reported.
    #[must_use]
    pub fn acceptable(
        mut self,
        f: impl Fn(&AnnotationList, &PatternMatch) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.expression.acceptables.push(Acceptable::new(f));
        self
    }
}

impl PatternSyntax for ExpressionBuilder {
    fn node(mut self, node: PatternNode) -> Self {
        self.expression.children.push(node);
        self
    }
}

/// Builds a [`Pattern`] from its root expression and settings.
#[derive(Debug, Default)]
pub struct PatternBuilder {
    root: Expression,
    settings: MatcherSettings,
}

impl PatternBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the root expression; the name begins every match path.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.root.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn acceptable(
        mut self,
        f: impl Fn(&AnnotationList, &PatternMatch) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.root.acceptables.push(Acceptable::new(f));
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: MatcherSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.settings.direction = direction;
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.settings.filter = filter;
        self
    }

    #[must_use]
    pub fn anchored_to_start(mut self, anchored: bool) -> Self {
        self.settings.anchored_to_start = anchored;
        self
    }

    #[must_use]
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.settings.max_steps = max_steps;
        self
    }

    /// Checks the tree and returns the pattern, not yet frozen.
    pub fn build(self) -> Result<Pattern> {
        for child in &self.root.children {
            child.validate()?;
        }
        Ok(Pattern::with_settings(self.root, self.settings))
    }
}

impl PatternSyntax for PatternBuilder {
    fn node(mut self, node: PatternNode) -> Self {
        self.root.children.push(node);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn seg(symbol: &str) -> FeatureStruct {
        FeatureStruct::new().symbol("seg", symbol)
    }

    #[test]
    fn single_quantified_node_is_not_wrapped() {
        let nodes = NodesBuilder::new()
            .optional(|q| q.annotation(seg("a")))
            .range(1, Some(2), |q| q.annotation(seg("b")).annotation(seg("c")))
            .build();
        assert_eq!(
            nodes[0],
            PatternNode::quantified(PatternNode::Constraint(seg("a")), Quantifier::ZERO_OR_ONE)
        );
        let PatternNode::Quantified { node, .. } = &nodes[1] else {
            panic!("expected a quantifier, got {:?}", nodes[1]);
        };
        assert!(matches!(**node, PatternNode::Group { name: None, .. }));
    }

    #[test]
    fn build_rejects_bad_bounds() {
        let err = Pattern::builder()
            .range(3, Some(1), |q| q.annotation(seg("a")))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidQuantifier { min: 3, max: 1 });
    }

    #[test]
    fn expressions_nest() {
        let pattern = Pattern::builder()
            .name("rules")
            .expression("rule1", |e| e.annotation(seg("a")).acceptable(|_, _| true))
            .expression("rule2", |e| e.annotation(seg("b")))
            .build()
            .unwrap();
        assert!(pattern.root().is_composite());
        assert_eq!(pattern.to_string(), "[seg:a] [seg:b]");
    }
}
