use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub label: String,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// Node table produced by the parser. Ids are indices into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: &str, children: &[NodeId]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            label: label.to_string(),
            children: children.to_vec(),
        });
        id
    }

    /// `leaf(label)` is `push(label, &[])`.
    pub fn leaf(&mut self, label: &str) -> NodeId {
        self.push(label, &[])
    }

    /// Builds the identifier chain for `base.f1.f2`: every identifier node
    /// carries one `ACCESS` child whose first child is the next field.
    pub fn path(&mut self, path: &[&str]) -> NodeId {
        let mut next: Option<NodeId> = None;
        for name in path.iter().rev() {
            next = Some(match next {
                None => self.leaf(name),
                Some(field) => {
                    let access = self.push("ACCESS", &[field]);
                    self.push(name, &[access])
                }
            });
        }
        next.unwrap_or_else(|| self.leaf(""))
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, CompilerError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(CompilerError::UnknownNode(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
