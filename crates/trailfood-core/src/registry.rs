//! The registry: single arena owning every composition node and crew
//! member, and the only way to resolve an id to a node.
//!
//! The registry is passed explicitly to every operation; there is no
//! process-wide instance. Tests get an isolated registry each.

use crate::adventure::AdventureData;
use crate::config::EngineConfig;
use crate::crew::CrewMember;
use crate::error::ModelError;
use crate::id::{CrewId, NodeId, NodeKey, NodeKind};
use crate::ingredient::IngredientData;
use crate::node::{Node, NodeBody};
use chrono::{DateTime, FixedOffset};
use slotmap::SlotMap;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Registry {
    config: EngineConfig,
    nodes: SlotMap<NodeKey, Node>,
    index: HashMap<NodeId, NodeKey>,
    crew: HashMap<CrewId, CrewMember>,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Node construction
    // -----------------------------------------------------------------------

    /// Create and register a standalone node of the given kind. An empty
    /// or missing name falls back to `"Unnamed <Kind>"`.
    pub fn create(&mut self, kind: NodeKind, name: Option<&str>) -> NodeId {
        let node = self.blank_node(NodeId::new(), kind, name, self.config.now());
        let id = node.id();
        let key = self.nodes.insert(node);
        self.index.insert(id, key);
        id
    }

    /// Register an empty node under a persisted id and creation time, for
    /// persistence layers that keep their own records. Children, nutrients
    /// and trip data are restored afterwards through the normal operations.
    pub fn restore_node(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        name: &str,
        created_at: DateTime<FixedOffset>,
    ) -> Result<NodeId, ModelError> {
        let node = self.blank_node(id, kind, Some(name), created_at);
        self.insert_node(node)
    }

    fn blank_node(
        &self,
        id: NodeId,
        kind: NodeKind,
        name: Option<&str>,
        created_at: DateTime<FixedOffset>,
    ) -> Node {
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => Node::default_name(kind),
        };
        let body = match kind {
            NodeKind::Ingredient => NodeBody::Ingredient(IngredientData::default()),
            NodeKind::Meal => NodeBody::Meal,
            NodeKind::Adventure => NodeBody::Adventure(AdventureData::new(self.config.default_days)),
        };
        Node::new(id, name, created_at, body)
    }

    pub fn create_ingredient(&mut self, name: &str) -> NodeId {
        self.create(NodeKind::Ingredient, Some(name))
    }

    pub fn create_meal(&mut self, name: &str) -> NodeId {
        self.create(NodeKind::Meal, Some(name))
    }

    pub fn create_adventure(&mut self, name: &str) -> NodeId {
        self.create(NodeKind::Adventure, Some(name))
    }

    /// Register a node built elsewhere (e.g. restored from a snapshot),
    /// keeping its id. Fails if the id is already taken.
    pub(crate) fn insert_node(&mut self, node: Node) -> Result<NodeId, ModelError> {
        let id = node.id();
        if self.index.contains_key(&id) {
            return Err(ModelError::DuplicateId(id));
        }
        let key = self.nodes.insert(node);
        self.index.insert(id, key);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).and_then(|&key| self.nodes.get(key))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let key = *self.index.get(&id)?;
        self.nodes.get_mut(key)
    }

    /// Like [`get`](Self::get) but with a `NodeNotFound` error.
    pub fn node(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.get(id).ok_or(ModelError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        self.get_mut(id).ok_or(ModelError::NodeNotFound(id))
    }

    /// Resolve `id` and check that it is a node of `kind`.
    pub fn node_of_kind(&self, id: NodeId, kind: NodeKind) -> Result<&Node, ModelError> {
        let node = self.node(id)?;
        if node.kind() != kind {
            return Err(ModelError::KindMismatch {
                id,
                expected: kind,
                found: node.kind(),
            });
        }
        Ok(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate every registered node, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All nodes of one kind, oldest first.
    pub fn all_of(&self, kind: NodeKind) -> Vec<&Node> {
        let mut found: Vec<&Node> = self.iter().filter(|n| n.kind() == kind).collect();
        found.sort_by_key(|n| n.created_at());
        found
    }

    pub fn adventures(&self) -> Vec<&Node> {
        self.all_of(NodeKind::Adventure)
    }

    /// Every node whose edge table references `id`. Scans edge tables
    /// rather than trusting the child's parent set.
    pub fn find_parents(&self, id: NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|n| n.has_child(id))
            .map(Node::id)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Unregister a node without touching anything that references it.
    /// Edges and parent sets pointing at `id` become dangling; propagation
    /// skips them.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, ModelError> {
        let key = self.index.remove(&id).ok_or(ModelError::NodeNotFound(id))?;
        self.nodes
            .remove(key)
            .ok_or(ModelError::NodeNotFound(id))
    }

    /// Detach a node from every parent (rebalancing their ratios), drop it
    /// from its children's parent sets, then unregister it. An adventure's
    /// crew members are unregistered with it.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node, ModelError> {
        let node = self.node(id)?;
        let parents: Vec<NodeId> = node.parents().iter().copied().collect();
        let children: Vec<NodeId> = node.edges().iter().map(|e| e.child()).collect();

        for parent in parents {
            if self.get(parent).is_some_and(|p| p.has_child(id)) {
                self.remove_child(parent, id)?;
            }
        }
        for child in children {
            if let Some(c) = self.get_mut(child) {
                c.remove_parent(id);
            }
        }

        let node = self.remove_node(id)?;
        if let NodeBody::Adventure(data) = node.body() {
            for crew in data.crew() {
                self.crew.remove(crew);
            }
        }
        Ok(node)
    }

    // -----------------------------------------------------------------------
    // Crew members
    // -----------------------------------------------------------------------

    pub(crate) fn insert_crew(&mut self, member: CrewMember) {
        self.crew.insert(member.id(), member);
    }

    pub(crate) fn take_crew(&mut self, id: CrewId) -> Option<CrewMember> {
        self.crew.remove(&id)
    }

    pub fn crew_member(&self, id: CrewId) -> Option<&CrewMember> {
        self.crew.get(&id)
    }

    pub fn crew_len(&self) -> usize {
        self.crew.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_lookup() {
        let mut reg = Registry::new();
        let oats = reg.create_ingredient("Oats");
        let node = reg.get(oats).unwrap();
        assert_eq!(node.name(), "Oats");
        assert_eq!(node.kind(), NodeKind::Ingredient);
        assert!(reg.contains(oats));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unnamed_nodes_get_default_name() {
        let mut reg = Registry::new();
        let meal = reg.create(NodeKind::Meal, None);
        let adv = reg.create(NodeKind::Adventure, Some(""));
        assert_eq!(reg.get(meal).unwrap().name(), "Unnamed Meal");
        assert_eq!(reg.get(adv).unwrap().name(), "Unnamed Adventure");
    }

    #[test]
    fn new_adventure_uses_default_days() {
        let mut reg = Registry::with_config(EngineConfig {
            default_days: 4,
            ..Default::default()
        });
        let adv = reg.create_adventure("Fjäll");
        match reg.get(adv).unwrap().body() {
            NodeBody::Adventure(data) => assert_eq!(data.days(), 4),
            other => panic!("expected adventure body, got {other:?}"),
        }
    }

    #[test]
    fn node_not_found() {
        let reg = Registry::new();
        let ghost = NodeId::new();
        assert_eq!(reg.node(ghost).unwrap_err(), ModelError::NodeNotFound(ghost));
    }

    #[test]
    fn node_of_kind_checks_kind() {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Lunch");
        assert!(reg.node_of_kind(meal, NodeKind::Meal).is_ok());
        match reg.node_of_kind(meal, NodeKind::Adventure) {
            Err(ModelError::KindMismatch { expected, found, .. }) => {
                assert_eq!(expected, NodeKind::Adventure);
                assert_eq!(found, NodeKind::Meal);
            }
            other => panic!("expected KindMismatch, got {other:?}"),
        }
    }

    #[test]
    fn remove_node_twice_fails() {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Dinner");
        assert!(reg.remove_node(meal).is_ok());
        assert_eq!(reg.remove_node(meal).unwrap_err(), ModelError::NodeNotFound(meal));
        assert!(reg.is_empty());
    }

    #[test]
    fn insert_node_rejects_duplicate_id() {
        let mut reg = Registry::new();
        let meal = reg.create_meal("Dinner");
        let copy = reg.get(meal).unwrap().clone();
        assert_eq!(reg.insert_node(copy).unwrap_err(), ModelError::DuplicateId(meal));
    }

    #[test]
    fn restore_node_keeps_id_and_time() {
        let mut reg = Registry::new();
        let id = NodeId::new();
        let created_at = DateTime::parse_from_rfc3339("2024-06-01T08:00:00+02:00").unwrap();

        assert_eq!(reg.restore_node(id, NodeKind::Meal, "Lunch", created_at), Ok(id));
        let node = reg.get(id).unwrap();
        assert_eq!(node.id(), id);
        assert_eq!(node.name(), "Lunch");
        assert_eq!(node.kind(), NodeKind::Meal);
        assert_eq!(node.created_at(), created_at);

        assert_eq!(
            reg.restore_node(id, NodeKind::Ingredient, "Oats", created_at),
            Err(ModelError::DuplicateId(id))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn restored_nodes_compose_normally() {
        let mut reg = Registry::new();
        let now = reg.config().now();
        let meal = reg.restore_node(NodeId::new(), NodeKind::Meal, "", now).unwrap();
        let oats = reg.restore_node(NodeId::new(), NodeKind::Ingredient, "Oats", now).unwrap();
        assert_eq!(reg.get(meal).unwrap().name(), "Unnamed Meal");

        reg.add_ingredient(meal, oats).unwrap();
        reg.set_ingredient_weight(meal, oats, 80.0).unwrap();
        assert_eq!(reg.get(meal).unwrap().edge(oats).unwrap().ratio(), 1.0);
        assert!(reg.get(oats).unwrap().parents().contains(&meal));
    }

    #[test]
    fn all_of_filters_by_kind() {
        let mut reg = Registry::new();
        reg.create_meal("A");
        reg.create_ingredient("B");
        reg.create_meal("C");
        let meals = reg.all_of(NodeKind::Meal);
        assert_eq!(meals.len(), 2);
        assert!(meals.iter().all(|n| n.kind() == NodeKind::Meal));
        assert!(meals[0].created_at() <= meals[1].created_at());
    }
}
