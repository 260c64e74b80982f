//! Item and payload types.
//!
//! [`Item`] is what the store holds and what the API returns. [`NewItem`] is
//! the body of create and update requests; it never carries an identifier.

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, InventoryResult};

/// Identifier assigned to an item by the store.
pub type ItemId = i64;

/// A stored inventory entry.
///
/// # Example
///
/// ```
/// use inventory_core::Item;
///
/// let item = Item::new(1000, "Spot", Some("TagOfSpot".to_string()));
/// let json = serde_json::to_value(&item).unwrap();
/// assert_eq!(json["id"], 1000);
/// assert_eq!(json["tag"], "TagOfSpot");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier, equal to the item's key in the store.
    pub id: ItemId,

    /// Name of the item.
    pub name: String,

    /// Optional free-text label used for filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Item {
    /// Creates an item from its parts.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tag,
        }
    }

    /// Builds the item stored under `id` from a payload.
    #[must_use]
    pub fn from_new(id: ItemId, new_item: NewItem) -> Self {
        Self {
            id,
            name: new_item.name,
            tag: new_item.tag,
        }
    }

    /// Returns `true` if the item's tag equals any of `tags`.
    ///
    /// Untagged items never match.
    #[must_use]
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        match &self.tag {
            Some(tag) => tags.iter().any(|t| t == tag),
            None => false,
        }
    }
}

/// The create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Name of the item. Must not be empty.
    pub name: String,

    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NewItem {
    /// Creates a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }

    /// Parses a JSON request body into a payload.
    ///
    /// Any decoding failure, and an empty `name`, is reported as
    /// [`InventoryError::MalformedRequest`] carrying `message`.
    ///
    /// # Example
    ///
    /// ```
    /// use inventory_core::NewItem;
    ///
    /// let item = NewItem::from_json(br#"{"name":"Spot"}"#, "bad payload").unwrap();
    /// assert_eq!(item.name, "Spot");
    /// assert!(item.tag.is_none());
    ///
    /// assert!(NewItem::from_json(b"{}", "bad payload").is_err());
    /// ```
    pub fn from_json(body: &[u8], message: &str) -> InventoryResult<Self> {
        let new_item: Self = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "rejecting undecodable item payload");
            InventoryError::malformed(message)
        })?;

        if new_item.name.is_empty() {
            return Err(InventoryError::malformed(message));
        }

        Ok(new_item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serialization_omits_absent_tag() {
        let item = Item::new(7, "Fido", None);
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"Fido"}"#);
    }

    #[test]
    fn test_item_deserialization_without_tag() {
        let item: Item = serde_json::from_str(r#"{"id":3,"name":"Rex"}"#).unwrap();
        assert_eq!(item, Item::new(3, "Rex", None));
    }

    #[test]
    fn test_from_new_copies_fields() {
        let item = Item::from_new(1000, NewItem::new("Spot", Some("dog".to_string())));
        assert_eq!(item.id, 1000);
        assert_eq!(item.name, "Spot");
        assert_eq!(item.tag.as_deref(), Some("dog"));
    }

    #[test]
    fn test_has_any_tag() {
        let tags = vec!["a".to_string(), "b".to_string()];
        assert!(Item::new(1, "x", Some("b".to_string())).has_any_tag(&tags));
        assert!(!Item::new(2, "y", Some("c".to_string())).has_any_tag(&tags));
        assert!(!Item::new(3, "z", None).has_any_tag(&tags));
        assert!(!Item::new(4, "w", Some("a".to_string())).has_any_tag(&[]));
    }

    #[test]
    fn test_new_item_from_json_rejects_garbage() {
        let err = NewItem::from_json(b"not json", "Invalid format for NewItem").unwrap_err();
        assert_eq!(err.to_string(), "Invalid format for NewItem");
    }

    #[test]
    fn test_new_item_from_json_rejects_empty_name() {
        assert!(NewItem::from_json(br#"{"name":""}"#, "bad").is_err());
    }

    #[test]
    fn test_new_item_from_json_rejects_wrong_types() {
        assert!(NewItem::from_json(br#"{"name":12}"#, "bad").is_err());
        assert!(NewItem::from_json(br#"{"name":"ok","tag":false}"#, "bad").is_err());
    }

    #[test]
    fn test_new_item_from_json_accepts_null_tag() {
        let item = NewItem::from_json(br#"{"name":"ok","tag":null}"#, "bad").unwrap();
        assert!(item.tag.is_none());
    }
}
