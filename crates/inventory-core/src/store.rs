//! In-memory item store.
//!
//! [`ItemStore`] owns every item and the identifier counter. A single
//! mutex guards both; each operation holds it for its whole duration, so
//! operations are atomic with respect to one another and never observe a
//! partially applied change.
//!
//! # Example
//!
//! ```
//! use inventory_core::{ItemFilter, ItemStore, NewItem};
//!
//! let store = ItemStore::new();
//! let spot = store.create(NewItem::new("Spot", Some("TagOfSpot".to_string()))).unwrap();
//! assert_eq!(spot.id, 1000);
//!
//! assert_eq!(store.get(1000).unwrap(), spot);
//! assert_eq!(store.list(&ItemFilter::default()).len(), 1);
//!
//! store.delete(1000).unwrap();
//! assert!(store.get(1000).is_err());
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{InventoryError, InventoryResult};
use crate::item::{Item, ItemId, NewItem};

/// First identifier handed out by a fresh store.
///
/// Identifiers below this value are left free for seeded and test data.
pub const DEFAULT_FIRST_ID: ItemId = 1000;

/// Filter applied by [`ItemStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Only return items whose tag equals one of these values.
    ///
    /// `None` returns items regardless of tag.
    pub tags: Option<Vec<String>>,

    /// Return at most this many items.
    pub limit: Option<usize>,
}

impl ItemFilter {
    /// Creates a filter that matches every item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to items tagged with one of `tags`.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Caps the number of returned items.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, item: &Item) -> bool {
        match &self.tags {
            Some(tags) => item.has_any_tag(tags),
            None => true,
        }
    }
}

#[derive(Debug)]
struct StoreState {
    items: HashMap<ItemId, Item>,
    /// `None` once `ItemId::MAX` has been issued.
    next_id: Option<ItemId>,
}

/// The shared, lock-guarded item collection.
///
/// Construct one per process (or per test) and share it through an `Arc`.
#[derive(Debug)]
pub struct ItemStore {
    state: Mutex<StoreState>,
}

impl ItemStore {
    /// Creates an empty store that starts issuing ids at [`DEFAULT_FIRST_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_first_id(DEFAULT_FIRST_ID)
    }

    /// Creates an empty store that starts issuing ids at `first_id`.
    #[must_use]
    pub fn with_first_id(first_id: ItemId) -> Self {
        Self {
            state: Mutex::new(StoreState {
                items: HashMap::new(),
                next_id: Some(first_id),
            }),
        }
    }

    /// Returns the items passing `filter`.
    ///
    /// Iteration order is unspecified. The result is empty, never absent,
    /// when nothing matches.
    #[must_use]
    pub fn list(&self, filter: &ItemFilter) -> Vec<Item> {
        let state = self.state.lock();

        if filter.limit == Some(0) {
            return Vec::new();
        }

        let mut result = Vec::new();
        for item in state.items.values() {
            if filter.matches(item) {
                result.push(item.clone());
            }
            if filter.limit.is_some_and(|limit| result.len() >= limit) {
                break;
            }
        }
        result
    }

    /// Stores a new item and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::IdsExhausted`] once `ItemId::MAX` has been
    /// issued; ids never wrap around.
    pub fn create(&self, new_item: NewItem) -> InventoryResult<Item> {
        let mut state = self.state.lock();

        let id = state.next_id.ok_or(InventoryError::IdsExhausted)?;
        state.next_id = id.checked_add(1);

        let item = Item::from_new(id, new_item);
        state.items.insert(id, item.clone());

        tracing::debug!(item_id = id, "item created");
        Ok(item)
    }

    /// Returns the item stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] if no such item exists.
    pub fn get(&self, id: ItemId) -> InventoryResult<Item> {
        let state = self.state.lock();
        state
            .items
            .get(&id)
            .cloned()
            .ok_or(InventoryError::not_found(id))
    }

    /// Replaces the name and tag of the item stored under `id`.
    ///
    /// Existence is checked before `payload` is evaluated, both under the
    /// lock: when the id is missing the payload is never parsed and
    /// [`InventoryError::NotFound`] is returned even if it would not parse.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] for an unknown id, or whatever
    /// error `payload` produces.
    pub fn update<F>(&self, id: ItemId, payload: F) -> InventoryResult<Item>
    where
        F: FnOnce() -> InventoryResult<NewItem>,
    {
        let mut state = self.state.lock();

        if !state.items.contains_key(&id) {
            return Err(InventoryError::not_found(id));
        }

        let item = Item::from_new(id, payload()?);
        state.items.insert(id, item.clone());

        tracing::debug!(item_id = id, "item updated");
        Ok(item)
    }

    /// Removes the item stored under `id`. Its id is never reissued.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] if no such item exists.
    pub fn delete(&self, id: ItemId) -> InventoryResult<()> {
        let mut state = self.state.lock();

        if state.items.remove(&id).is_none() {
            return Err(InventoryError::not_found(id));
        }

        tracing::debug!(item_id = id, "item deleted");
        Ok(())
    }

    /// Inserts a pre-built item, replacing any item with the same id.
    ///
    /// Used to seed fixtures. If the id is at or above the counter, the
    /// counter moves past it so the id is never issued by [`create`].
    ///
    /// [`create`]: ItemStore::create
    pub fn insert(&self, item: Item) {
        let mut state = self.state.lock();
        if let Some(next) = state.next_id {
            if item.id >= next {
                state.next_id = item.id.checked_add(1);
            }
        }
        state.items.insert(item.id, item);
    }

    /// Removes every item. The id counter is left untouched.
    pub fn clear(&self) {
        self.state.lock().items.clear();
    }

    /// Returns the number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns `true` if the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Returns the id the next [`create`](ItemStore::create) will assign,
    /// or `None` when the id space is used up.
    #[must_use]
    pub fn next_id(&self) -> Option<ItemId> {
        self.state.lock().next_id
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn tagged(name: &str, tag: &str) -> NewItem {
        NewItem::new(name, Some(tag.to_string()))
    }

    #[test]
    fn test_create_assigns_default_first_id() {
        let store = ItemStore::new();
        let item = store.create(tagged("Spot", "TagOfSpot")).unwrap();
        assert_eq!(item, Item::new(1000, "Spot", Some("TagOfSpot".to_string())));
        assert_eq!(store.next_id(), Some(1001));
    }

    #[test]
    fn test_create_with_custom_first_id() {
        let store = ItemStore::with_first_id(1);
        assert_eq!(store.create(NewItem::new("a", None)).unwrap().id, 1);
        assert_eq!(store.create(NewItem::new("b", None)).unwrap().id, 2);
    }

    #[test]
    fn test_get_returns_created_item() {
        let store = ItemStore::new();
        let created = store.create(tagged("Spot", "dog")).unwrap();
        assert_eq!(store.get(created.id).unwrap(), created);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = ItemStore::new();
        assert_eq!(store.get(9999), Err(InventoryError::not_found(9999)));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = ItemStore::new();
        let first = store.create(NewItem::new("a", None)).unwrap();
        store.delete(first.id).unwrap();
        let second = store.create(NewItem::new("b", None)).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let store = ItemStore::new();
        let item = store.create(NewItem::new("a", None)).unwrap();
        assert!(store.delete(item.id).is_ok());
        assert_eq!(store.delete(item.id), Err(InventoryError::not_found(item.id)));
        assert_eq!(store.get(item.id), Err(InventoryError::not_found(item.id)));
    }

    #[test]
    fn test_update_preserves_id() {
        let store = ItemStore::new();
        let item = store.create(tagged("Spot", "dog")).unwrap();

        let updated = store
            .update(item.id, || Ok(NewItem::new("Fido", None)))
            .unwrap();

        assert_eq!(updated, Item::new(item.id, "Fido", None));
        assert_eq!(store.get(item.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing_skips_payload() {
        let store = ItemStore::new();
        let mut parsed = false;

        let result = store.update(5, || {
            parsed = true;
            Err(InventoryError::malformed("Invalid format for Item"))
        });

        assert_eq!(result, Err(InventoryError::not_found(5)));
        assert!(!parsed);
    }

    #[test]
    fn test_update_bad_payload_leaves_item_unchanged() {
        let store = ItemStore::new();
        let item = store.create(tagged("Spot", "dog")).unwrap();

        let result = store.update(item.id, || Err(InventoryError::malformed("bad")));

        assert_eq!(result, Err(InventoryError::malformed("bad")));
        assert_eq!(store.get(item.id).unwrap(), item);
    }

    #[test]
    fn test_list_empty_store() {
        let store = ItemStore::new();
        assert!(store.list(&ItemFilter::new()).is_empty());
    }

    #[test]
    fn test_list_filters_by_tag() {
        let store = ItemStore::new();
        let a = store.create(tagged("one", "A")).unwrap();
        store.create(tagged("two", "B")).unwrap();
        store.create(NewItem::new("three", None)).unwrap();
        let a2 = store.create(tagged("four", "A")).unwrap();

        let result: HashSet<ItemId> = store
            .list(&ItemFilter::new().tags(["A"]))
            .into_iter()
            .map(|item| item.id)
            .collect();

        assert_eq!(result, HashSet::from([a.id, a2.id]));
    }

    #[test]
    fn test_list_duplicate_filter_tags_return_item_once() {
        let store = ItemStore::new();
        store.create(tagged("one", "A")).unwrap();

        let result = store.list(&ItemFilter::new().tags(["A", "A"]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_list_unknown_tag_is_empty() {
        let store = ItemStore::new();
        store.create(NewItem::new("one", None)).unwrap();
        store.create(NewItem::new("two", None)).unwrap();

        assert!(store.list(&ItemFilter::new().tags(["NotExists"])).is_empty());
    }

    #[test]
    fn test_list_limit() {
        let store = ItemStore::new();
        for i in 0..5 {
            store.create(NewItem::new(format!("item-{i}"), None)).unwrap();
        }

        assert_eq!(store.list(&ItemFilter::new().limit(3)).len(), 3);
        assert_eq!(store.list(&ItemFilter::new().limit(10)).len(), 5);
        assert!(store.list(&ItemFilter::new().limit(0)).is_empty());
    }

    #[test]
    fn test_list_limit_with_tags() {
        let store = ItemStore::new();
        for i in 0..4 {
            store.create(tagged(&format!("a-{i}"), "A")).unwrap();
            store.create(tagged(&format!("b-{i}"), "B")).unwrap();
        }

        let result = store.list(&ItemFilter::new().tags(["B"]).limit(2));
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|item| item.tag.as_deref() == Some("B")));
    }

    #[test]
    fn test_insert_seeds_below_counter() {
        let store = ItemStore::new();
        store.insert(Item::new(100, "seeded", None));

        assert_eq!(store.get(100).unwrap().name, "seeded");
        assert_eq!(store.next_id(), Some(1000));
    }

    #[test]
    fn test_insert_at_counter_advances_it() {
        let store = ItemStore::new();
        store.insert(Item::new(1000, "seeded", None));

        let created = store.create(NewItem::new("new", None)).unwrap();
        assert_eq!(created.id, 1001);
        assert_eq!(store.get(1000).unwrap().name, "seeded");
    }

    #[test]
    fn test_last_id_is_issued_once() {
        let store = ItemStore::with_first_id(ItemId::MAX);

        let last = store.create(NewItem::new("last", None)).unwrap();
        assert_eq!(last.id, ItemId::MAX);
        assert_eq!(store.next_id(), None);

        assert_eq!(
            store.create(NewItem::new("one too many", None)),
            Err(InventoryError::IdsExhausted)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_at_max_id_exhausts_counter() {
        let store = ItemStore::new();
        store.insert(Item::new(ItemId::MAX, "seeded", None));

        assert_eq!(store.next_id(), None);
        assert_eq!(
            store.create(NewItem::new("new", None)),
            Err(InventoryError::IdsExhausted)
        );

        // An exhausted counter stays exhausted.
        store.insert(Item::new(5, "low", None));
        assert_eq!(store.next_id(), None);
    }

    #[test]
    fn test_clear_keeps_counter() {
        let store = ItemStore::new();
        store.create(NewItem::new("a", None)).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.create(NewItem::new("b", None)).unwrap().id, 1001);
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(ItemStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| store.create(NewItem::new(format!("{t}-{i}"), None)).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<ItemId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(ids.len(), 400);
        assert_eq!(store.len(), 400);
        assert_eq!(store.next_id(), Some(1400));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Create(String, Option<String>),
            DeleteNth(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                ("[a-z]{1,8}", proptest::option::of("[A-C]")).prop_map(|(n, t)| Op::Create(n, t)),
                (0usize..16).prop_map(Op::DeleteNth),
            ]
        }

        proptest! {
            #[test]
            fn test_ids_strictly_increase(ops in proptest::collection::vec(op_strategy(), 0..64)) {
                let store = ItemStore::new();
                let mut issued: Vec<ItemId> = Vec::new();
                let mut live: Vec<ItemId> = Vec::new();

                for op in ops {
                    match op {
                        Op::Create(name, tag) => {
                            let item = store.create(NewItem::new(name, tag)).unwrap();
                            if let Some(last) = issued.last() {
                                prop_assert!(item.id > *last);
                            }
                            issued.push(item.id);
                            live.push(item.id);
                        }
                        Op::DeleteNth(n) => {
                            if !live.is_empty() {
                                let id = live.remove(n % live.len());
                                prop_assert!(store.delete(id).is_ok());
                                prop_assert!(store.get(id).is_err());
                            }
                        }
                    }
                }

                let listed: HashSet<ItemId> = store
                    .list(&ItemFilter::new())
                    .into_iter()
                    .map(|item| item.id)
                    .collect();
                let expected: HashSet<ItemId> = live.into_iter().collect();
                prop_assert_eq!(listed, expected);
            }

            #[test]
            fn test_limit_bounds_result(count in 0usize..40, limit in 0usize..50) {
                let store = ItemStore::new();
                for i in 0..count {
                    store.create(NewItem::new(format!("item-{i}"), None)).unwrap();
                }

                let result = store.list(&ItemFilter::new().limit(limit));
                prop_assert_eq!(result.len(), count.min(limit));
            }

            #[test]
            fn test_tag_filter_exact(tags in proptest::collection::vec(proptest::option::of("[A-C]"), 0..30)) {
                let store = ItemStore::new();
                for (i, tag) in tags.iter().enumerate() {
                    store.create(NewItem::new(format!("item-{i}"), tag.clone())).unwrap();
                }

                let result = store.list(&ItemFilter::new().tags(["A"]));
                let expected = tags.iter().filter(|t| t.as_deref() == Some("A")).count();
                prop_assert_eq!(result.len(), expected);
                prop_assert!(result.iter().all(|item| item.tag.as_deref() == Some("A")));
            }
        }
    }
}
