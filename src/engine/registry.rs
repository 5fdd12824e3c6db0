//! Per-handle object registry.
//!
//! Every live layout node of a handle has a [`NodeRecord`] in an arena. The
//! registry keeps the records in creation order (the first one is the root) and
//! maintains side tables from toolkit objects and accessible proxies back to
//! their owning node, so that toolkit callbacks can be routed without touching
//! the toolkit's own object attachments.

use std::collections::HashMap;
use slotmap::{new_key_type, SlotMap};
use crate::engine::errors::ScriptError;
use crate::render::backend::{ObjectId, ProxyId};

new_key_type! {
    /// Arena key of a node record.
    pub struct NodeKey;
}

/// What a slot currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotContent {
    /// A leaf image object; it has no node record of its own
    Image(ObjectId),
    /// A nested sub-layout
    Layout(NodeKey),
}

/// A slot of a node that was filled through the script port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Child {
    pub slot: String,
    pub content: SlotContent,
}

/// Accessible proxy exposing one part of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessProxy {
    pub proxy: ProxyId,
    pub part: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub object: ObjectId,
    /// `None` only for the root.
    pub id: Option<String>,
    pub children: Vec<Child>,
    pub parent: Option<NodeKey>,
    pub access_chain: Vec<AccessProxy>,
}

impl NodeRecord {
    pub fn new(object: ObjectId, id: Option<String>, parent: Option<NodeKey>) -> Self {
        Self {
            object,
            id,
            children: Vec::new(),
            parent,
            access_chain: Vec::new(),
        }
    }

    /// Index of the child occupying `slot`, if any.
    pub fn child_in(&self, slot: &str) -> Option<usize> {
        self.children.iter().position(|child| child.slot == slot)
    }

    pub fn proxy_for(&self, part: &str) -> Option<&AccessProxy> {
        self.access_chain.iter().find(|p| p.part == part)
    }
}

#[derive(Default)]
pub struct ObjectRegistry {
    records: SlotMap<NodeKey, NodeRecord>,
    order: Vec<NodeKey>,
    by_object: HashMap<ObjectId, NodeKey>,
    proxies: HashMap<ProxyId, NodeKey>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the node whose id equals `id`. `None` finds the root.
    pub fn find(&self, id: Option<&str>) -> Option<NodeKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.records.get(*key).is_some_and(|r| r.id.as_deref() == id))
    }

    /// Add a node. Ids must be unique within the registry.
    pub fn insert(&mut self, record: NodeRecord) -> Result<NodeKey, ScriptError> {
        if self.find(record.id.as_deref()).is_some() {
            return Err(ScriptError::Invalid(match &record.id {
                Some(id) => format!("object id '{id}' is already in use"),
                None => "a root object is already registered".to_string(),
            }));
        }

        let object = record.object;
        let proxies: Vec<ProxyId> = record.access_chain.iter().map(|p| p.proxy).collect();

        let key = self.records.insert(record);
        self.order.push(key);
        self.by_object.insert(object, key);
        for proxy in proxies {
            self.proxies.insert(proxy, key);
        }

        Ok(key)
    }

    /// Erase a node and every side-table entry pointing at it.
    pub fn remove(&mut self, key: NodeKey) -> Option<NodeRecord> {
        let record = self.records.remove(key)?;
        self.order.retain(|k| *k != key);
        self.by_object.remove(&record.object);
        self.proxies.retain(|_, owner| *owner != key);
        Some(record)
    }

    pub fn get(&self, key: NodeKey) -> Option<&NodeRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut NodeRecord> {
        self.records.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.records.contains_key(key)
    }

    /// First node ever inserted and still alive.
    pub fn root(&self) -> Option<NodeKey> {
        self.order.first().copied()
    }

    pub fn by_object(&self, object: ObjectId) -> Option<NodeKey> {
        self.by_object.get(&object).copied()
    }

    /// Node owning `proxy`.
    pub fn proxy_owner(&self, proxy: ProxyId) -> Option<NodeKey> {
        self.proxies.get(&proxy).copied()
    }

    pub fn bind_proxy(&mut self, proxy: ProxyId, owner: NodeKey) {
        self.proxies.insert(proxy, owner);
    }

    pub fn unbind_proxy(&mut self, proxy: ProxyId) {
        self.proxies.remove(&proxy);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in creation order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.order.iter().copied()
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(object: u64, id: Option<&str>) -> NodeRecord {
        NodeRecord::new(ObjectId(object), id.map(str::to_string), None)
    }

    #[test]
    fn find_matches_ids_and_root() {
        let mut reg = ObjectRegistry::new();
        let root = reg.insert(record(1, None)).unwrap();
        let title = reg.insert(record(2, Some("title"))).unwrap();

        assert_eq!(reg.find(None), Some(root));
        assert_eq!(reg.find(Some("title")), Some(title));
        assert_eq!(reg.find(Some("Title")), None);
        assert_eq!(reg.root(), Some(root));
    }

    #[test]
    fn find_is_idempotent() {
        let mut reg = ObjectRegistry::new();
        reg.insert(record(1, None)).unwrap();
        reg.insert(record(2, Some("a"))).unwrap();

        let first = reg.find(Some("a"));
        assert_eq!(reg.find(Some("a")), first);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut reg = ObjectRegistry::new();
        reg.insert(record(1, None)).unwrap();
        reg.insert(record(2, Some("a"))).unwrap();

        assert!(matches!(reg.insert(record(3, Some("a"))), Err(ScriptError::Invalid(_))));
        assert!(matches!(reg.insert(record(4, None)), Err(ScriptError::Invalid(_))));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.by_object(ObjectId(3)), None);
    }

    #[test]
    fn remove_clears_side_tables() {
        let mut reg = ObjectRegistry::new();
        let root = reg.insert(record(1, None)).unwrap();
        let sub = reg.insert(record(2, Some("sub"))).unwrap();
        reg.bind_proxy(ProxyId(10), sub);
        reg.bind_proxy(ProxyId(11), root);

        let removed = reg.remove(sub).unwrap();
        assert_eq!(removed.object, ObjectId(2));
        assert_eq!(reg.find(Some("sub")), None);
        assert_eq!(reg.by_object(ObjectId(2)), None);
        assert_eq!(reg.proxy_owner(ProxyId(10)), None);
        assert_eq!(reg.proxy_owner(ProxyId(11)), Some(root));
        assert!(reg.remove(sub).is_none());
    }

    #[test]
    fn root_follows_creation_order() {
        let mut reg = ObjectRegistry::new();
        let root = reg.insert(record(1, None)).unwrap();
        reg.insert(record(2, Some("a"))).unwrap();
        assert_eq!(reg.root(), Some(root));

        reg.remove(root);
        let new_root = reg.insert(record(3, None)).unwrap();
        assert_ne!(reg.root(), Some(new_root));
        assert_eq!(reg.keys().count(), 2);
    }
}
