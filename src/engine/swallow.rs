//! Swallow-slot bookkeeping.
//!
//! A slot holds at most one child: either a leaf image or a nested layout with
//! its own node record. Replacing the content of a slot always evicts the old
//! occupant first, and tearing down a layout cascades through everything it
//! swallowed and every proxy it registered.

use std::fs::File;
use log::{debug, error};
use uuid::Uuid;
use crate::engine::access::{rebuild_focus_chain, release_proxy};
use crate::engine::errors::ScriptError;
use crate::engine::image_option::ImageOption;
use crate::engine::registry::{Child, NodeKey, NodeRecord, ObjectRegistry, SlotContent};
use crate::render::backend::SceneToolkit;

/// New content for a slot.
#[derive(Clone, Copy, Debug)]
pub enum SlotSource<'a> {
    Image {
        path: &'a str,
        option: &'a ImageOption,
    },
    Layout {
        path: &'a str,
        group: &'a str,
        /// Id for the new node; generated from the slot name when absent.
        target_id: Option<&'a str>,
    },
}

impl SlotSource<'_> {
    pub fn path(&self) -> &str {
        match self {
            SlotSource::Image { path, .. } | SlotSource::Layout { path, .. } => path,
        }
    }
}

fn is_readable(path: &str) -> bool {
    !path.is_empty() && File::open(path).is_ok()
}

/// True when `node` is `ancestor` or lives somewhere below it.
fn is_within(reg: &ObjectRegistry, node: NodeKey, ancestor: NodeKey) -> bool {
    let mut current = Some(node);
    while let Some(key) = current {
        if key == ancestor {
            return true;
        }
        current = reg.get(key).and_then(|r| r.parent);
    }
    false
}

fn slot_occupant(reg: &ObjectRegistry, parent: NodeKey, slot: &str) -> Option<NodeKey> {
    let record = reg.get(parent)?;
    let child = &record.children[record.child_in(slot)?];
    match child.content {
        SlotContent::Layout(key) => Some(key),
        SlotContent::Image(_) => None,
    }
}

/// Id for a swallowed layout when the caller did not pick one.
fn generate_id(reg: &ObjectRegistry, slot: &str) -> String {
    if reg.find(Some(slot)).is_none() {
        return slot.to_string();
    }

    loop {
        let candidate = format!("{slot}-{}", Uuid::new_v4().simple());
        if reg.find(Some(&candidate)).is_none() {
            return candidate;
        }
    }
}

/// Replace whatever `slot` of `parent` holds with `source`.
///
/// Returns the key of the new node when a layout was swallowed. An empty or
/// unreadable path clears the slot and succeeds. A slot left empty loses its
/// accessible proxy.
pub fn set_slot_content(
    reg: &mut ObjectRegistry,
    tk: &mut dyn SceneToolkit,
    parent: NodeKey,
    slot: &str,
    source: SlotSource<'_>,
) -> Result<Option<NodeKey>, ScriptError> {
    if !reg.contains(parent) {
        return Err(ScriptError::Invalid(format!("no node record behind slot '{slot}'")));
    }

    if let SlotSource::Layout { target_id: Some(id), .. } = source {
        if let Some(holder) = reg.find(Some(id)) {
            let freed_by_eviction = slot_occupant(reg, parent, slot)
                .is_some_and(|occupant| is_within(reg, holder, occupant));
            if !freed_by_eviction {
                return Err(ScriptError::Invalid(format!("object id '{id}' is already in use")));
            }
        }
    }

    evict_slot(reg, tk, parent, slot);

    let result = fill_slot(reg, tk, parent, slot, source);

    let filled = reg.get(parent).and_then(|r| r.child_in(slot)).is_some();
    if !filled {
        release_proxy(reg, tk, parent, slot);
    }
    rebuild_focus_chain(reg, tk, parent);
    result
}

fn fill_slot(
    reg: &mut ObjectRegistry,
    tk: &mut dyn SceneToolkit,
    parent: NodeKey,
    slot: &str,
    source: SlotSource<'_>,
) -> Result<Option<NodeKey>, ScriptError> {
    let path = source.path();
    if !is_readable(path) {
        debug!("Slot '{}' left empty, path '{}' is not readable", slot, path);
        return Ok(None);
    }

    let parent_object = match reg.get(parent) {
        Some(record) => record.object,
        None => return Ok(None),
    };

    match source {
        SlotSource::Image { path, option } => {
            let image = tk.load_image(path).map_err(|e| {
                error!("Failed to load image {}: {}", path, e);
                ScriptError::from(e)
            })?;

            let layout = option.layout_for(tk.image_size(image), tk.part_geometry(parent_object, slot));
            tk.apply_image_layout(image, &layout);
            tk.part_swallow(parent_object, slot, image);
            attach(reg, parent, slot, SlotContent::Image(image));

            Ok(None)
        }
        SlotSource::Layout { path, group, target_id } => {
            let object = tk.load_layout(path, group).map_err(|e| {
                error!("Could not load {} from {}: {}", group, path, e);
                ScriptError::from(e)
            })?;

            let id = match target_id {
                Some(id) => id.to_string(),
                None => generate_id(reg, slot),
            };

            let key = match reg.insert(NodeRecord::new(object, Some(id), Some(parent))) {
                Ok(key) => key,
                Err(e) => {
                    tk.delete_object(object);
                    return Err(e);
                }
            };

            tk.part_swallow(parent_object, slot, object);
            attach(reg, parent, slot, SlotContent::Layout(key));

            Ok(Some(key))
        }
    }
}

fn attach(reg: &mut ObjectRegistry, parent: NodeKey, slot: &str, content: SlotContent) {
    if let Some(record) = reg.get_mut(parent) {
        record.children.push(Child {
            slot: slot.to_string(),
            content,
        });
    }
}

/// Remove and destroy whatever `slot` of `parent` holds. Returns true when
/// something was evicted.
pub fn evict_slot(reg: &mut ObjectRegistry, tk: &mut dyn SceneToolkit, parent: NodeKey, slot: &str) -> bool {
    let Some(record) = reg.get_mut(parent) else {
        return false;
    };
    let parent_object = record.object;
    let tracked = record.child_in(slot).map(|idx| record.children.remove(idx));
    let mut evicted = tracked.is_some();

    match tracked.map(|child| child.content) {
        Some(SlotContent::Image(image)) => {
            debug!("Evicting image {} from slot '{}'", image, slot);
            tk.part_unswallow(parent_object, image);
            tk.delete_object(image);
        }
        Some(SlotContent::Layout(key)) => {
            if let Some(object) = reg.get(key).map(|r| r.object) {
                debug!("Evicting layout {} from slot '{}'", object, slot);
                tk.part_unswallow(parent_object, object);
            }
            destroy_node(reg, tk, key);
        }
        None => {}
    }

    // content the toolkit holds without a child record
    if let Some(stray) = tk.part_swallowed(parent_object, slot) {
        debug!("Evicting untracked {} from slot '{}'", stray, slot);
        tk.part_unswallow(parent_object, stray);
        match reg.by_object(stray) {
            Some(key) => {
                destroy_node(reg, tk, key);
            }
            None => tk.delete_object(stray),
        }
        evicted = true;
    }

    evicted
}

/// Tear down a node and everything it owns. Returns the number of proxies
/// that were unregistered.
pub fn destroy_node(reg: &mut ObjectRegistry, tk: &mut dyn SceneToolkit, key: NodeKey) -> usize {
    let Some(record) = reg.remove(key) else {
        return 0;
    };

    if let Some(parent) = record.parent.and_then(|p| reg.get_mut(p)) {
        parent.children.retain(|child| child.content != SlotContent::Layout(key));
    }

    let mut released = 0;
    for child in &record.children {
        match child.content {
            SlotContent::Image(image) => tk.delete_object(image),
            SlotContent::Layout(sub) => released += destroy_node(reg, tk, sub),
        }
    }

    for proxy in &record.access_chain {
        tk.unregister_proxy(proxy.proxy);
    }
    released += record.access_chain.len();

    debug!(
        "Destroyed node {} ({}), {} proxies released",
        record.id.as_deref().unwrap_or("<root>"),
        record.object,
        released
    );
    tk.delete_object(record.object);

    released
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::access::describe;
    use crate::render::backends::null::{NullObjectKind, NullToolkit};
    use crate::render::Rect;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn resource() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"scene").unwrap();
        file
    }

    fn setup() -> (ObjectRegistry, NullToolkit, NodeKey) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut tk = NullToolkit::new();
        let mut reg = ObjectRegistry::new();
        let object = tk.load_layout("main.edj", "main").unwrap();
        let root = reg.insert(NodeRecord::new(object, None, None)).unwrap();
        (reg, tk, root)
    }

    fn swallow_layout(
        reg: &mut ObjectRegistry,
        tk: &mut NullToolkit,
        parent: NodeKey,
        slot: &str,
        path: &str,
        target_id: Option<&str>,
    ) -> Result<Option<NodeKey>, ScriptError> {
        set_slot_content(reg, tk, parent, slot, SlotSource::Layout { path, group: "sub", target_id })
    }

    #[test]
    fn swallows_an_image_with_its_layout() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();
        let root_object = reg.get(root).unwrap().object;
        tk.set_part_geometry(root_object, "icon", Rect::sized(100, 100));

        let option = ImageOption::parse("aspect=true;fill=in-size");
        let created = set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path, option: &option })
            .unwrap();
        assert_eq!(created, None);

        let image = tk.part_swallowed(root_object, "icon").unwrap();
        let layout = tk.object(image).unwrap().image_layout.unwrap();
        assert_eq!(layout.fill, Rect::new(0, 12, 100, 75));
        assert_eq!(reg.get(root).unwrap().children.len(), 1);
    }

    #[test]
    fn reswallow_evicts_exactly_one_node() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();

        let first = swallow_layout(&mut reg, &mut tk, root, "content", path, None).unwrap().unwrap();
        let objects_before = tk.live_objects();
        let nodes_before = reg.len();

        let second = swallow_layout(&mut reg, &mut tk, root, "content", path, None).unwrap().unwrap();

        assert!(!reg.contains(first));
        assert!(reg.contains(second));
        assert_eq!(reg.len(), nodes_before);
        assert_eq!(tk.live_objects(), objects_before);
        assert_eq!(reg.get(root).unwrap().children.len(), 1);
        assert_eq!(reg.get(second).unwrap().id.as_deref(), Some("content"));
    }

    #[test]
    fn empty_or_missing_path_clears_the_slot() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();
        let option = ImageOption::default();
        let root_object = reg.get(root).unwrap().object;

        set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path, option: &option }).unwrap();
        assert!(tk.part_swallowed(root_object, "icon").is_some());

        let cleared =
            set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path: "", option: &option });
        assert!(matches!(cleared, Ok(None)));
        assert_eq!(tk.part_swallowed(root_object, "icon"), None);
        assert!(reg.get(root).unwrap().children.is_empty());

        let missing = swallow_layout(&mut reg, &mut tk, root, "content", "/nonexistent/scene.edj", None);
        assert!(matches!(missing, Ok(None)));
        assert_eq!(tk.live_objects(), 1);
    }

    #[test]
    fn clearing_a_slot_releases_its_proxy() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();
        let option = ImageOption::default();
        let root_object = reg.get(root).unwrap().object;

        set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path, option: &option }).unwrap();
        describe(&mut reg, &mut tk, root, "icon", "Icon").unwrap();
        describe(&mut reg, &mut tk, root, "title", "Title").unwrap();
        assert_eq!(tk.live_proxies(), 2);

        // replacing the content keeps the description
        set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path, option: &option }).unwrap();
        assert_eq!(tk.live_proxies(), 2);

        set_slot_content(&mut reg, &mut tk, root, "icon", SlotSource::Image { path: "", option: &option }).unwrap();

        let record = reg.get(root).unwrap();
        assert_eq!(tk.live_proxies(), 1);
        assert_eq!(reg.proxy_count(), 1);
        assert_eq!(record.access_chain.len(), 1);
        assert_eq!(record.access_chain[0].part, "title");
        assert_eq!(tk.focus_chain(root_object), vec![record.access_chain[0].proxy]);
    }

    #[test]
    fn generated_ids_never_collide() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();

        let a = swallow_layout(&mut reg, &mut tk, root, "slot", path, None).unwrap().unwrap();
        let b = swallow_layout(&mut reg, &mut tk, a, "slot", path, None).unwrap().unwrap();

        let id_a = reg.get(a).unwrap().id.clone().unwrap();
        let id_b = reg.get(b).unwrap().id.clone().unwrap();
        assert_eq!(id_a, "slot");
        assert!(id_b.starts_with("slot-"));
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn duplicate_target_id_is_rejected_before_eviction() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();

        swallow_layout(&mut reg, &mut tk, root, "left", path, Some("panel")).unwrap();
        let right = swallow_layout(&mut reg, &mut tk, root, "right", path, Some("other")).unwrap().unwrap();

        let result = swallow_layout(&mut reg, &mut tk, root, "right", path, Some("panel"));
        assert!(matches!(result, Err(ScriptError::Invalid(_))));
        assert!(reg.contains(right), "occupant must survive a rejected update");

        // the id held by the occupant itself is released by the eviction
        let replaced = swallow_layout(&mut reg, &mut tk, root, "right", path, Some("other")).unwrap().unwrap();
        assert_eq!(reg.find(Some("other")), Some(replaced));
    }

    #[test]
    fn failed_load_leaves_slot_empty() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();

        swallow_layout(&mut reg, &mut tk, root, "content", path, None).unwrap();
        tk.fail_path(path, || crate::render::backend::LoadError::Corrupt("bad".into()));

        let result = swallow_layout(&mut reg, &mut tk, root, "content", path, None);
        assert!(matches!(result, Err(ScriptError::Io(_))));
        assert!(reg.get(root).unwrap().children.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn destroy_cascades_and_counts_proxies() {
        let (mut reg, mut tk, root) = setup();
        let file = resource();
        let path = file.path().to_str().unwrap();
        let option = ImageOption::default();

        let mid = swallow_layout(&mut reg, &mut tk, root, "content", path, None).unwrap().unwrap();
        let leaf = swallow_layout(&mut reg, &mut tk, mid, "inner", path, None).unwrap().unwrap();
        set_slot_content(&mut reg, &mut tk, leaf, "icon", SlotSource::Image { path, option: &option }).unwrap();

        describe(&mut reg, &mut tk, root, "title", "Root title").unwrap();
        describe(&mut reg, &mut tk, mid, "label", "Middle").unwrap();
        describe(&mut reg, &mut tk, leaf, "a", "Leaf a").unwrap();
        describe(&mut reg, &mut tk, leaf, "b", "Leaf b").unwrap();

        let released = destroy_node(&mut reg, &mut tk, mid);

        assert_eq!(released, 3);
        assert_eq!(tk.unregistered_proxies(), 3);
        assert_eq!(tk.live_proxies(), 1);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(root).unwrap().children.is_empty());
        assert_eq!(reg.get(root).unwrap().access_chain.len(), 1);
        assert_eq!(tk.live_objects(), 1);
    }

    #[test]
    fn untracked_occupants_are_evicted() {
        let (mut reg, mut tk, root) = setup();
        let root_object = reg.get(root).unwrap().object;
        let foreign = tk.load_image("foreign.png").unwrap();
        tk.part_swallow(root_object, "icon", foreign);

        assert!(evict_slot(&mut reg, &mut tk, root, "icon"));
        assert!(tk.object(foreign).is_none());
        assert!(matches!(
            tk.object(root_object).map(|o| &o.kind),
            Some(NullObjectKind::Layout { .. })
        ));
    }

    #[test]
    fn missing_parent_is_invalid() {
        let (mut reg, mut tk, root) = setup();
        destroy_node(&mut reg, &mut tk, root);

        let result = swallow_layout(&mut reg, &mut tk, root, "content", "x.edj", None);
        assert!(matches!(result, Err(ScriptError::Invalid(_))));
    }
}
