//! Tool namespace aggregation.
//!
//! Tool sets are merged in declaration order. When two servers expose the
//! same name the later one wins; every such overwrite is kept as a
//! [`NameCollision`] and logged.

use crate::application::tooling::ToolDescriptor;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub name: String,
    pub previous_server: String,
    pub winning_server: String,
}

#[derive(Debug, Clone, Default)]
pub struct ToolNamespace {
    tools: BTreeMap<String, ToolDescriptor>,
    collisions: Vec<NameCollision>,
}

impl ToolNamespace {
    /// Merge tool sets in the order given.
    pub fn merge<I>(tool_sets: I) -> Self
    where
        I: IntoIterator<Item = Vec<ToolDescriptor>>,
    {
        let mut namespace = Self::default();
        for set in tool_sets {
            for descriptor in set {
                namespace.insert(descriptor);
            }
        }
        namespace
    }

    fn insert(&mut self, descriptor: ToolDescriptor) {
        let name = descriptor.name().to_string();
        let winning_server = descriptor.server().to_string();
        if let Some(previous) = self.tools.insert(name.clone(), descriptor) {
            warn!(
                tool = %name,
                previous = previous.server(),
                winner = %winning_server,
                "Tool name collision; later server overrides earlier one"
            );
            self.collisions.push(NameCollision {
                name,
                previous_server: previous.server().to_string(),
                winning_server,
            });
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors sorted by tool name.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tooling::{ToolHandle, ToolInvokeError, ToolTransport};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Unreachable(&'static str);

    #[async_trait]
    impl ToolTransport for Unreachable {
        fn server(&self) -> &str {
            self.0
        }

        async fn request(&self, _method: &str, _params: Value) -> Result<Value, ToolInvokeError> {
            Err(ToolInvokeError::transport(self.0, "unreachable"))
        }

        async fn notify(&self, _method: &str, _params: Value) -> Result<(), ToolInvokeError> {
            Ok(())
        }
    }

    fn tool(server: &'static str, name: &str, description: &str) -> ToolDescriptor {
        let transport: Arc<dyn ToolTransport> = Arc::new(Unreachable(server));
        ToolDescriptor::new(
            name,
            Some(description.to_string()),
            json!({"type": "object"}),
            server,
            ToolHandle::new(transport, name),
        )
    }

    #[test]
    fn later_declared_server_wins_collisions() {
        let namespace = ToolNamespace::merge(vec![
            vec![tool("minizinc", "x", "first"), tool("minizinc", "solve", "solve")],
            vec![tool("instances", "x", "second")],
        ]);

        let winner = namespace.get("x").expect("x present");
        assert_eq!(winner.server(), "instances");
        assert_eq!(winner.description(), Some("second"));
        assert_eq!(winner, &tool("instances", "x", "second"));
        assert_eq!(namespace.len(), 2);
        assert_eq!(
            namespace.collisions(),
            &[NameCollision {
                name: "x".to_string(),
                previous_server: "minizinc".to_string(),
                winning_server: "instances".to_string(),
            }]
        );
    }

    #[test]
    fn reversed_declaration_order_flips_the_winner() {
        let namespace = ToolNamespace::merge(vec![
            vec![tool("instances", "x", "second")],
            vec![tool("minizinc", "x", "first")],
        ]);
        assert_eq!(namespace.get("x").map(ToolDescriptor::server), Some("minizinc"));
    }

    #[test]
    fn disjoint_sets_merge_without_collisions() {
        let namespace = ToolNamespace::merge(vec![
            vec![tool("minizinc", "solve_constraint", "solve")],
            vec![tool("instances", "get_instances", "list")],
        ]);
        assert!(namespace.collisions().is_empty());
        assert_eq!(namespace.names(), vec!["get_instances", "solve_constraint"]);
    }

    #[test]
    fn empty_input_yields_empty_namespace() {
        let namespace = ToolNamespace::merge(Vec::<Vec<ToolDescriptor>>::new());
        assert!(namespace.is_empty());
    }
}
