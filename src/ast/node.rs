use super::{super::FeatureStruct, Acceptable, Quantifier};
use crate::Direction;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PatternNode {
    /// Matches one annotation whose feature structure unifies with the
    /// condition.
    Constraint(FeatureStruct),

    /// A sequence of nodes, captured under `name` when one is given.
    Group {
        name: Option<String>,
        children: Vec<PatternNode>,
    },

    // Quantified items
    Quantified {
        node: Box<PatternNode>,
        quantifier: Quantifier,
    },

    /// Branches tried in declaration order; earlier branches have priority.
    Alternation(Vec<PatternNode>),

    // Anchors (zero-width assertions)
    Anchor(AnchorKind),

    /// A named sub-pattern with its own acceptance predicates.
    Expression(Expression),
}

/// Which edge of the input sequence an anchor is tied to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AnchorKind {
    /// The left edge of the sequence (its first element).
    Start,
    /// The right edge of the sequence (its last element).
    End,
}

/// A composite node carrying a name for the pattern path and acceptance
/// predicates that are re-checked before a match is reported.
///
/// When every child of an expression is itself an expression, the children
/// are independent alternatives, each with its own priority. Otherwise the
/// children form the body of a single alternative.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Expression {
    pub name: Option<String>,
    pub acceptables: Vec<Acceptable>,
    pub children: Vec<PatternNode>,
}

impl Expression {
    #[must_use]
    pub fn new(name: Option<String>, children: Vec<PatternNode>) -> Self {
        Self {
            name,
            acceptables: Vec::new(),
            children,
        }
    }

    #[must_use]
    pub fn with_acceptable(mut self, acceptable: Acceptable) -> Self {
        self.acceptables.push(acceptable);
        self
    }

    /// True if the children are alternatives rather than a body.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.children
            .iter()
            .all(|child| matches!(child, PatternNode::Expression(_)))
    }
}

impl PatternNode {
    #[must_use]
    pub fn group(name: impl Into<String>, children: Vec<PatternNode>) -> Self {
        Self::Group {
            name: Some(name.into()),
            children,
        }
    }

    #[must_use]
    pub fn quantified(node: PatternNode, quantifier: Quantifier) -> Self {
        Self::Quantified {
            node: Box::new(node),
            quantifier,
        }
    }

    /// Direct children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[PatternNode] {
        match self {
            Self::Group { children, .. } | Self::Alternation(children) => children,
            Self::Expression(expr) => &expr.children,
            Self::Quantified { node, .. } => std::slice::from_ref(node.as_ref()),
            Self::Constraint(_) | Self::Anchor(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut [PatternNode] {
        match self {
            Self::Group { children, .. } | Self::Alternation(children) => children,
            Self::Expression(expr) => &mut expr.children,
            Self::Quantified { node, .. } => std::slice::from_mut(node.as_mut()),
            Self::Constraint(_) | Self::Anchor(_) => &mut [],
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Constraint(_) | Self::Anchor(_))
    }

    /// The anchor at the edge of this node that is read first in `dir`,
    /// looking through groups.
    #[must_use]
    pub(crate) fn leading_anchor(&self, dir: Direction) -> Option<AnchorKind> {
        match self {
            Self::Anchor(kind) => Some(*kind),
            Self::Group { children, .. } => super::first_in(children, dir)?.leading_anchor(dir),
            _ => None,
        }
    }
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constraint(fs) => write!(f, "{fs}"),
            Self::Group { name, children } => {
                f.write_str("(")?;
                if let Some(name) = name {
                    write!(f, "{name}: ")?;
                }
                write_seq(f, children, " ")?;
                f.write_str(")")
            }
            Self::Quantified { node, quantifier } => write!(f, "{node}{quantifier}"),
            Self::Alternation(branches) => {
                f.write_str("(")?;
                write_seq(f, branches, " | ")?;
                f.write_str(")")
            }
            Self::Anchor(AnchorKind::Start) => f.write_str("^"),
            Self::Anchor(AnchorKind::End) => f.write_str("$"),
            Self::Expression(expr) => write_seq(f, &expr.children, " "),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, nodes: &[PatternNode], sep: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}
