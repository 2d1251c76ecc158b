//! Scene of items
//!
//! Items live in a slot map and are drawn in the order of an index list,
//! bottom first. The boolean wrappers here insert their result above the
//! topmost operand unless the options ask for a detached result.

use slotmap::{new_key_type, SlotMap};

use crate::boolean::BooleanOptions;
use crate::item::{Item, PathItem};

new_key_type! {
    /// Unique identifier for an item in a scene
    pub struct ItemKey;
}

/// Result of a scene-aware boolean operation
#[derive(Clone, Debug, PartialEq)]
pub enum BooleanOutput {
    /// The result was inserted into the scene
    Inserted(ItemKey),
    /// The result was not inserted, or an operand was missing from the scene
    Detached(Item),
}

impl BooleanOutput {
    pub fn key(&self) -> Option<ItemKey> {
        match self {
            BooleanOutput::Inserted(key) => Some(*key),
            BooleanOutput::Detached(_) => None,
        }
    }
}

/// Ordered collection of items
pub struct Scene {
    items: SlotMap<ItemKey, Item>,
    order: Vec<ItemKey>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Adds an item on top of all others
    pub fn insert(&mut self, item: impl Into<Item>) -> ItemKey {
        let key = self.items.insert(item.into());
        self.order.push(key);
        key
    }

    /// Adds an item directly above `above`, or on top when `above` is not
    /// in the scene
    pub fn insert_above(&mut self, above: ItemKey, item: impl Into<Item>) -> ItemKey {
        let key = self.items.insert(item.into());
        match self.index_of(above) {
            Some(index) => self.order.insert(index + 1, key),
            None => self.order.push(key),
        }
        key
    }

    pub fn get(&self, key: ItemKey) -> Option<&Item> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut Item> {
        self.items.get_mut(key)
    }

    pub fn path(&self, key: ItemKey) -> Option<&PathItem> {
        self.items.get(key).and_then(Item::as_path)
    }

    /// Drawing position of an item, 0 being the bottom
    pub fn index_of(&self, key: ItemKey) -> Option<usize> {
        self.order.iter().position(|&k| k == key)
    }

    pub fn remove(&mut self, key: ItemKey) -> Option<Item> {
        let item = self.items.remove(key)?;
        self.order.retain(|&k| k != key);
        Some(item)
    }

    /// Keys from bottom to top
    pub fn keys(&self) -> &[ItemKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unite(&mut self, a: ItemKey, b: ItemKey, options: &BooleanOptions) -> Option<BooleanOutput> {
        self.run(a, b, options, |p1, p2| Item::Path(p1.unite(p2, options)))
    }

    pub fn intersect(&mut self, a: ItemKey, b: ItemKey, options: &BooleanOptions) -> Option<BooleanOutput> {
        self.run(a, b, options, |p1, p2| Item::Path(p1.intersect(p2, options)))
    }

    pub fn subtract(&mut self, a: ItemKey, b: ItemKey, options: &BooleanOptions) -> Option<BooleanOutput> {
        self.run(a, b, options, |p1, p2| Item::Path(p1.subtract(p2, options)))
    }

    pub fn exclude(&mut self, a: ItemKey, b: ItemKey, options: &BooleanOptions) -> Option<BooleanOutput> {
        self.run(a, b, options, |p1, p2| Item::Path(p1.exclude(p2, options)))
    }

    pub fn divide(&mut self, a: ItemKey, b: ItemKey, options: &BooleanOptions) -> Option<BooleanOutput> {
        self.run(a, b, options, |p1, p2| p1.divide(p2, options))
    }

    /// Runs `op` on two path items of the scene. Returns `None` when either
    /// key does not name a path item.
    fn run(
        &mut self,
        a: ItemKey,
        b: ItemKey,
        options: &BooleanOptions,
        op: impl FnOnce(&PathItem, &PathItem) -> Item,
    ) -> Option<BooleanOutput> {
        let result = op(self.path(a)?, self.path(b)?);
        if !options.insert {
            return Some(BooleanOutput::Detached(result));
        }
        let (ia, ib) = (self.index_of(a)?, self.index_of(b)?);
        let top = if ia >= ib { a } else { b };
        let key = self.insert_above(top, result);
        tracing::debug!("scene: inserted boolean result above item {}", ia.max(ib));
        Some(BooleanOutput::Inserted(key))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares() -> (Scene, ItemKey, ItemKey, ItemKey) {
        let mut scene = Scene::new();
        let a = scene.insert(PathItem::rectangle(0.0, 0.0, 100.0, 100.0));
        let b = scene.insert(PathItem::rectangle(50.0, 50.0, 100.0, 100.0));
        let top = scene.insert(PathItem::rectangle(500.0, 0.0, 10.0, 10.0));
        (scene, a, b, top)
    }

    #[test]
    fn test_insert_keeps_drawing_order() {
        let (mut scene, a, b, top) = squares();
        assert_eq!(scene.keys(), &[a, b, top]);
        let key = scene.insert_above(a, PathItem::new());
        assert_eq!(scene.index_of(key), Some(1));
        assert!(scene.remove(a).is_some());
        assert_eq!(scene.index_of(key), Some(0));
        assert!(scene.get(a).is_none());
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_result_is_inserted_above_topmost_operand() {
        let (mut scene, a, b, top) = squares();
        let output = scene.unite(b, a, &BooleanOptions::default()).unwrap();
        let key = output.key().unwrap();
        assert_eq!(scene.index_of(key), Some(2));
        assert_eq!(scene.index_of(top), Some(3));
        let area = scene.path(key).unwrap().area();
        assert!((area - 17500.0).abs() < 1e-6);
    }

    #[test]
    fn test_detached_result_leaves_scene_alone() {
        let (mut scene, a, b, _) = squares();
        let options = BooleanOptions {
            insert: false,
            ..BooleanOptions::default()
        };
        let output = scene.intersect(a, b, &options).unwrap();
        assert_eq!(scene.len(), 3);
        let BooleanOutput::Detached(item) = output else {
            panic!("expected a detached result");
        };
        assert!((item.area() - 2500.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_operand() {
        let (mut scene, a, b, _) = squares();
        scene.remove(b);
        assert!(scene.subtract(a, b, &BooleanOptions::default()).is_none());
    }
}
