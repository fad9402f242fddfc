//! Graphviz export for inspecting compiled automata.

use super::{Automaton, GroupId, Tag};
use std::fmt::Write;

impl Automaton {
    /// Renders the NFA in Graphviz `dot` syntax.
    #[must_use]
    pub fn nfa_dot(&self) -> String {
        let mut out = String::from("digraph nfa {\n  rankdir=LR;\n");
        for (id, state) in self.nfa.states() {
            let shape = if state.accept.is_some() {
                "doublecircle"
            } else {
                "circle"
            };
            let _ = writeln!(out, "  {} [shape={shape}];", id.index());
        }
        for (_, arc) in self.nfa.arcs() {
            let label = match (&arc.condition, arc.tag) {
                (Some(cond), _) => cond.fs.to_string(),
                (None, Some(tag)) => self.tag_label(tag),
                (None, None) => "&epsilon;".to_owned(),
            };
            let _ = writeln!(
                out,
                "  {} -> {} [label=\"{}, {}\"];",
                arc.source.index(),
                arc.target.index(),
                escape(&label),
                arc.priority
            );
        }
        out.push_str("}\n");
        out
    }

    /// Renders the DFA in Graphviz `dot` syntax.
    #[must_use]
    pub fn dfa_dot(&self) -> String {
        let mut out = String::from("digraph dfa {\n  rankdir=LR;\n");
        for (id, state) in self.dfa.states().enumerate() {
            match state.priority {
                Some(priority) => {
                    let _ = writeln!(
                        out,
                        "  {id} [shape=doublecircle, label=\"{id} ({priority})\"];"
                    );
                }
                None => {
                    let _ = writeln!(out, "  {id} [shape=circle];");
                }
            }
        }
        for (id, state) in self.dfa.states().enumerate() {
            for arc in &state.arcs {
                let tags: Vec<String> = arc
                    .commands
                    .iter()
                    .filter_map(|cmd| cmd.origins.first())
                    .flat_map(|origin| origin.tags.iter())
                    .map(|&tag| self.tag_label(tag))
                    .collect();
                let _ = writeln!(
                    out,
                    "  {id} -> {} [label=\"{} {}\"];",
                    arc.target,
                    escape(&arc.condition.to_string()),
                    escape(&tags.join(","))
                );
            }
        }
        out.push_str("}\n");
        out
    }

    fn tag_label(&self, tag: Tag) -> String {
        let name = if tag.group == GroupId::ENTIRE {
            "*".to_owned()
        } else {
            self.groups
                .iter()
                .find(|&(_, &id)| id == tag.group)
                .map_or_else(|| format!("#{}", tag.group.index()), |(name, _)| name.clone())
        };
        if tag.close {
            format!("{name}>")
        } else {
            format!("<{name}")
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
