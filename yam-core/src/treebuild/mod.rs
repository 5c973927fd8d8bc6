//! Events to node graphs.

pub use composer::Composer;
pub use node::{Node, NodeData, NodeGraph, NodeId, NodeKind};

mod composer;
mod node;
