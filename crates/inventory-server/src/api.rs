//! The inventory operations.
//!
//! One handler per contract operation, each a thin adapter between a
//! [`HandlerRequest`] and the shared [`ItemStore`]. Parameters are parsed
//! here even when the validation stage already checked them, since that
//! stage can be switched off.

use std::sync::Arc;

use http::StatusCode;
use inventory_core::{InventoryError, ItemFilter, ItemId, ItemStore, NewItem};

use crate::handler::{HandlerRegistry, HandlerRequest, HandlerResponse, HandlerResult};

/// `GET /items`
pub const FIND_ITEMS: &str = "findItems";
/// `POST /items`
pub const ADD_ITEM: &str = "addItem";
/// `GET /items/{id}`
pub const FIND_ITEM_BY_ID: &str = "findItemById";
/// `PUT /items/{id}`
pub const UPDATE_ITEM: &str = "updateItem";
/// `DELETE /items/{id}`
pub const DELETE_ITEM: &str = "deleteItem";

/// Registers every inventory operation against `store`.
pub fn register(registry: &mut HandlerRegistry, store: &Arc<ItemStore>) {
    let s = Arc::clone(store);
    registry.register(FIND_ITEMS, move |req| find_items(Arc::clone(&s), req));

    let s = Arc::clone(store);
    registry.register(ADD_ITEM, move |req| add_item(Arc::clone(&s), req));

    let s = Arc::clone(store);
    registry.register(FIND_ITEM_BY_ID, move |req| find_item_by_id(Arc::clone(&s), req));

    let s = Arc::clone(store);
    registry.register(UPDATE_ITEM, move |req| update_item(Arc::clone(&s), req));

    let s = Arc::clone(store);
    registry.register(DELETE_ITEM, move |req| delete_item(Arc::clone(&s), req));
}

/// Lists items, optionally filtered by repeated `tags` and capped by `limit`.
pub async fn find_items(store: Arc<ItemStore>, req: HandlerRequest) -> HandlerResult {
    let tags = req.query_values("tags");
    let mut filter = ItemFilter::new();
    if !tags.is_empty() {
        filter = filter.tags(tags);
    }
    if let Some(limit) = parse_limit(&req)? {
        filter = filter.limit(limit);
    }

    let items = store.list(&filter);
    HandlerResponse::json(StatusCode::OK, &items)
}

/// Creates an item; ids are assigned by the store.
pub async fn add_item(store: Arc<ItemStore>, req: HandlerRequest) -> HandlerResult {
    let new_item = NewItem::from_json(req.body(), "Invalid format for NewItem")?;
    let item = store.create(new_item)?;
    HandlerResponse::json(StatusCode::CREATED, &item)
}

/// Returns a single item.
pub async fn find_item_by_id(store: Arc<ItemStore>, req: HandlerRequest) -> HandlerResult {
    let id = parse_id(&req)?;
    let item = store.get(id)?;
    HandlerResponse::json(StatusCode::OK, &item)
}

/// Replaces an item's name and tag.
///
/// An unknown id is reported before the body is looked at.
pub async fn update_item(store: Arc<ItemStore>, req: HandlerRequest) -> HandlerResult {
    let id = parse_id(&req)?;
    let item = store.update(id, || NewItem::from_json(req.body(), "Invalid format for Item"))?;
    HandlerResponse::json(StatusCode::OK, &item)
}

/// Deletes an item.
pub async fn delete_item(store: Arc<ItemStore>, req: HandlerRequest) -> HandlerResult {
    let id = parse_id(&req)?;
    store.delete(id)?;
    Ok(HandlerResponse::no_content())
}

fn parse_id(req: &HandlerRequest) -> Result<ItemId, InventoryError> {
    req.param("id")
        .and_then(|raw| raw.parse::<ItemId>().ok())
        .ok_or_else(|| InventoryError::malformed("Invalid format for parameter id"))
}

fn parse_limit(req: &HandlerRequest) -> Result<Option<usize>, InventoryError> {
    let Some(raw) = req.query_value("limit") else {
        return Ok(None);
    };

    raw.parse::<i32>()
        .ok()
        .and_then(|limit| usize::try_from(limit).ok())
        .map(Some)
        .ok_or_else(|| InventoryError::malformed("Invalid format for parameter limit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use inventory_core::Item;
    use std::collections::HashMap;

    fn with_id(id: &str, body: &str) -> HandlerRequest {
        HandlerRequest::new(
            HashMap::from([("id".to_string(), id.to_string())]),
            Vec::new(),
            Bytes::from(body.to_string()),
        )
    }

    fn with_query(query: &str) -> HandlerRequest {
        HandlerRequest::new(
            HashMap::new(),
            HandlerRequest::parse_query(Some(query)).unwrap(),
            Bytes::new(),
        )
    }

    fn items(response: &HandlerResponse) -> Vec<Item> {
        serde_json::from_slice(response.body().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_add_item_returns_created() {
        let store = Arc::new(ItemStore::new());
        let req = HandlerRequest::new(
            HashMap::new(),
            Vec::new(),
            Bytes::from(r#"{"name":"Spot","tag":"TagOfSpot"}"#),
        );

        let response = add_item(Arc::clone(&store), req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let item: Item = serde_json::from_slice(response.body().unwrap()).unwrap();
        assert_eq!(item, Item::new(1000, "Spot", Some("TagOfSpot".to_string())));
    }

    #[tokio::test]
    async fn test_add_item_bad_body() {
        let store = Arc::new(ItemStore::new());
        let req = HandlerRequest::new(HashMap::new(), Vec::new(), Bytes::from("nope"));

        let err = add_item(Arc::clone(&store), req).await.unwrap_err();
        assert_eq!(err.to_body().message, "Invalid format for NewItem");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_find_items_filters_and_limits() {
        let store = Arc::new(ItemStore::new());
        store.create(NewItem::new("a", Some("cat".to_string()))).unwrap();
        store.create(NewItem::new("b", Some("dog".to_string()))).unwrap();
        store.create(NewItem::new("c", Some("dog".to_string()))).unwrap();

        let response = find_items(Arc::clone(&store), with_query("tags=dog")).await.unwrap();
        assert_eq!(items(&response).len(), 2);

        let response = find_items(Arc::clone(&store), with_query("tags=cat&tags=dog&limit=2"))
            .await
            .unwrap();
        assert_eq!(items(&response).len(), 2);

        let response = find_items(Arc::clone(&store), with_query("limit=0")).await.unwrap();
        assert_eq!(response.body().unwrap().as_ref(), b"[]");
    }

    #[tokio::test]
    async fn test_find_items_bad_limit() {
        let store = Arc::new(ItemStore::new());
        for query in ["limit=abc", "limit=-1", "limit=99999999999"] {
            let err = find_items(Arc::clone(&store), with_query(query)).await.unwrap_err();
            assert_eq!(err.to_body().message, "Invalid format for parameter limit", "{query}");
        }
    }

    #[tokio::test]
    async fn test_find_item_by_id() {
        let store = Arc::new(ItemStore::new());
        let item = store.create(NewItem::new("Spot", None)).unwrap();

        let response = find_item_by_id(Arc::clone(&store), with_id("1000", "")).await.unwrap();
        let found: Item = serde_json::from_slice(response.body().unwrap()).unwrap();
        assert_eq!(found, item);

        let err = find_item_by_id(Arc::clone(&store), with_id("9999", "")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = find_item_by_id(Arc::clone(&store), with_id("x", "")).await.unwrap_err();
        assert_eq!(err.to_body().message, "Invalid format for parameter id");
    }

    #[tokio::test]
    async fn test_update_item_missing_wins_over_bad_body() {
        let store = Arc::new(ItemStore::new());
        let err = update_item(Arc::clone(&store), with_id("5", "garbage")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_item_bad_body() {
        let store = Arc::new(ItemStore::new());
        store.create(NewItem::new("Spot", None)).unwrap();

        let err = update_item(Arc::clone(&store), with_id("1000", "garbage")).await.unwrap_err();
        assert_eq!(err.to_body().message, "Invalid format for Item");
    }

    #[tokio::test]
    async fn test_delete_item() {
        let store = Arc::new(ItemStore::new());
        store.create(NewItem::new("Spot", None)).unwrap();

        let response = delete_item(Arc::clone(&store), with_id("1000", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let err = delete_item(Arc::clone(&store), with_id("1000", "")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_register_all_operations() {
        let mut registry = HandlerRegistry::new();
        register(&mut registry, &Arc::new(ItemStore::new()));

        for op in [FIND_ITEMS, ADD_ITEM, FIND_ITEM_BY_ID, UPDATE_ITEM, DELETE_ITEM] {
            assert!(registry.contains(op), "{op}");
        }
    }
}
