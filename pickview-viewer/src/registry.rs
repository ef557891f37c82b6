//! Scene object registry
//!
//! Tracks the user-visible scene entries (loaded models and processing
//! results) in insertion order and keeps an external list view in sync.

use crate::scene::{NodeHandle, Renderable, Scene};
use std::fmt;
use tracing::debug;

/// Opaque identity of a registry entry, stable for the entry's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj_{}", self.0)
    }
}

/// A named, owned scene node
#[derive(Debug)]
pub struct SceneEntry {
    pub id: ObjectId,
    pub name: String,
    pub node: NodeHandle,
    pub visible: bool,
}

/// One row of the object list
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub id: ObjectId,
    pub name: String,
    pub visible: bool,
}

impl ListRow {
    /// Label opacity used by the list view: hidden entries are dimmed
    pub fn opacity(&self) -> f32 {
        if self.visible {
            1.0
        } else {
            0.5
        }
    }
}

/// External list widget, rebuilt from scratch after every registry mutation
pub trait ObjectListView {
    fn rebuild(&mut self, rows: &[ListRow]);
}

/// Ordered collection of scene entries
#[derive(Default)]
pub struct SceneRegistry {
    entries: Vec<SceneEntry>,
    next_id: u64,
    view: Option<Box<dyn ObjectListView>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a list view and populate it with the current rows
    pub fn set_view(&mut self, view: Box<dyn ObjectListView>) {
        self.view = Some(view);
        self.refresh_view();
    }

    /// Attach `renderable` to the scene and register it under `name`
    pub fn add(&mut self, scene: &mut Scene, name: impl Into<String>, renderable: Renderable) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let node = scene.attach(renderable);
        let name = name.into();
        debug!(%id, %name, "registered scene object");
        self.entries.push(SceneEntry {
            id,
            name,
            node,
            visible: true,
        });

        self.refresh_view();
        id
    }

    /// Detach and discard an entry; unknown ids are ignored
    pub fn remove(&mut self, scene: &mut Scene, id: ObjectId) {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return;
        };

        let entry = self.entries.remove(index);
        scene.detach(entry.node);
        debug!(%id, name = %entry.name, "removed scene object");
        self.refresh_view();
    }

    /// Set the entry flag and the node's visibility together
    pub fn set_visible(&mut self, scene: &mut Scene, id: ObjectId, visible: bool) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return;
        };

        entry.visible = visible;
        scene.set_visible(&entry.node, visible);
        self.refresh_view();
    }

    /// Flip an entry's visibility, as the list view's eye button does
    pub fn toggle_visibility(&mut self, scene: &mut Scene, id: ObjectId) {
        if let Some(visible) = self.get(id).map(|e| e.visible) {
            self.set_visible(scene, id, !visible);
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries in display order
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn list(&self) -> Vec<ListRow> {
        self.entries
            .iter()
            .map(|e| ListRow {
                id: e.id,
                name: e.name.clone(),
                visible: e.visible,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn refresh_view(&mut self) {
        let rows = self.list();
        if let Some(view) = self.view.as_mut() {
            view.rebuild(&rows);
        }
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("entries", &self.entries)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickview_core::{Color, Point3f};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingView(Rc<RefCell<Vec<Vec<ListRow>>>>);

    impl ObjectListView for RecordingView {
        fn rebuild(&mut self, rows: &[ListRow]) {
            self.0.borrow_mut().push(rows.to_vec());
        }
    }

    fn marker() -> Renderable {
        Renderable::marker(Point3f::origin(), 0.1, Color::WHITE)
    }

    #[test]
    fn test_add_then_remove_leaves_list_empty() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();

        let id = registry.add(&mut scene, "Cube", marker());
        assert_eq!(registry.list().len(), 1);
        assert_eq!(scene.len(), 1);

        registry.remove(&mut scene, id);
        assert!(registry.list().is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_set_visible_flags_only_that_entry() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();
        let a = registry.add(&mut scene, "a", marker());
        let b = registry.add(&mut scene, "b", marker());

        registry.set_visible(&mut scene, a, false);
        let rows = registry.list();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].visible);
        assert!(rows[1].visible);
        assert_eq!(rows[0].opacity(), 0.5);

        assert!(!scene.node(&registry.get(a).unwrap().node).unwrap().visible);
        assert!(scene.node(&registry.get(b).unwrap().node).unwrap().visible);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();
        let id = registry.add(&mut scene, "a", marker());

        registry.toggle_visibility(&mut scene, id);
        assert!(!registry.get(id).unwrap().visible);
        registry.toggle_visibility(&mut scene, id);
        assert!(registry.get(id).unwrap().visible);
    }

    #[test]
    fn test_insertion_order_and_unique_ids() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();
        let ids: Vec<_> = ["first", "second", "third"]
            .into_iter()
            .map(|name| registry.add(&mut scene, name, marker()))
            .collect();

        registry.remove(&mut scene, ids[1]);
        let again = registry.add(&mut scene, "fourth", marker());
        assert!(!ids.contains(&again));

        let names: Vec<_> = registry.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "third", "fourth"]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();
        let view = RecordingView::default();
        registry.set_view(Box::new(view.clone()));

        let id = registry.add(&mut scene, "a", marker());
        registry.remove(&mut scene, id);
        let rebuilds = view.0.borrow().len();

        registry.remove(&mut scene, id);
        registry.set_visible(&mut scene, id, false);
        registry.toggle_visibility(&mut scene, id);
        assert_eq!(view.0.borrow().len(), rebuilds);
    }

    #[test]
    fn test_every_mutation_rebuilds_view() {
        let mut scene = Scene::new();
        let mut registry = SceneRegistry::new();
        let view = RecordingView::default();
        registry.set_view(Box::new(view.clone()));

        let id = registry.add(&mut scene, "a", marker());
        registry.set_visible(&mut scene, id, false);
        registry.remove(&mut scene, id);

        let snapshots = view.0.borrow();
        // initial populate + three mutations
        assert_eq!(snapshots.len(), 4);
        assert!(snapshots[0].is_empty());
        assert_eq!(snapshots[1][0].name, "a");
        assert!(!snapshots[2][0].visible);
        assert!(snapshots[3].is_empty());
    }
}
