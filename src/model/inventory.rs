use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::common::{default_timestamp, default_user, render_number};
use crate::model::{generate_id, Id, RecordId, UserContext};

fn default_count() -> u32 {
    1
}

/// Treat an explicit JSON `null` the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Dimension fields arrive as strings from the forms but as numbers from older exports
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(render_number(&n))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Distinguishes "field absent" from "field explicitly null" in patches
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Packing material requirement, e.g. two small boxes.
///
/// `quantity` is any JSON number; rolls of tape or wrap are measured in
/// fractions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackingNeed {
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: serde_json::Number,
}

impl PackingNeed {
    pub fn new(kind: impl Into<String>, quantity: impl Into<serde_json::Number>) -> Self {
        Self {
            kind: kind.into(),
            quantity: quantity.into(),
        }
    }

    /// Quantity as the grouping key renders it
    pub fn quantity_text(&self) -> String {
        render_number(&self.quantity)
    }
}

/// One furniture item placed in a room of a stop.
///
/// Every field except the base identifier is optional. Absent collections
/// and `null` collections both deserialize to empty vectors so they produce
/// the same grouping key as an explicitly empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furniture_item_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Display name; not part of the item's identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cuft: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub lbs: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packing_needs: Vec<PackingNeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uploaded_images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub camera_images: Vec<String>,
    #[serde(default = "default_count")]
    pub count: u32,
}

impl Default for InventoryItemInstance {
    fn default() -> Self {
        Self {
            furniture_item_id: None,
            id: None,
            name: None,
            room_id: None,
            tags: Vec::new(),
            notes: None,
            cuft: None,
            lbs: None,
            packing_needs: Vec::new(),
            link: None,
            uploaded_images: Vec::new(),
            camera_images: Vec::new(),
            count: 1,
        }
    }
}

impl InventoryItemInstance {
    /// Instance of a catalog furniture item
    pub fn for_furniture(furniture_item_id: impl Into<RecordId>) -> Self {
        Self {
            furniture_item_id: Some(furniture_item_id.into()),
            ..Self::default()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag unless it is already present. Returns true if the tag set changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Apply a partial update. `count` is owned by the row and never patched.
    pub fn apply(&mut self, update: &InstanceUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(room_id) = &update.room_id {
            self.room_id = room_id.clone();
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(cuft) = &update.cuft {
            self.cuft = Some(cuft.clone());
        }
        if let Some(lbs) = &update.lbs {
            self.lbs = Some(lbs.clone());
        }
        if let Some(packing_needs) = &update.packing_needs {
            self.packing_needs = packing_needs.clone();
        }
        if let Some(link) = &update.link {
            self.link = Some(link.clone());
        }
        if let Some(images) = &update.uploaded_images {
            self.uploaded_images = images.clone();
        }
        if let Some(images) = &update.camera_images {
            self.camera_images = images.clone();
        }
    }
}

/// Partial update for an inventory item.
/// `roomId: null` unassigns the item, an absent `roomId` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub room_id: Option<Option<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lbs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing_needs: Option<Vec<PackingNeed>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_images: Option<Vec<String>>,
}

impl InstanceUpdate {
    pub fn tags(tags: Vec<String>) -> Self {
        Self {
            tags: Some(tags),
            ..Self::default()
        }
    }

    pub fn room(room_id: Option<RecordId>) -> Self {
        Self {
            room_id: Some(room_id),
            ..Self::default()
        }
    }
}

/// Stored inventory row: an item instance scoped to a stop, with its
/// persisted grouping key and audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub row_id: Id,
    pub stop_id: Id,
    #[serde(flatten)]
    pub item: InventoryItemInstance,
    /// Key as last written; may be stale for rows imported from older exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_key: Option<String>,

    #[serde(default = "default_user")]
    pub created_by: String,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_user")]
    pub updated_by: String,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryRow {
    pub fn new(
        stop_id: Id,
        item: InventoryItemInstance,
        grouping_key: String,
        user: &UserContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            row_id: generate_id(),
            stop_id,
            item,
            grouping_key: Some(grouping_key),
            created_by: user.user_id.clone(),
            created_at: now,
            updated_by: user.user_id.clone(),
            updated_at: now,
        }
    }

    pub fn count(&self) -> u32 {
        self.item.count
    }

    pub fn room_id(&self) -> Option<&RecordId> {
        self.item.room_id.as_ref()
    }

    /// Record a modification by `user`
    pub fn touch(&mut self, user: &UserContext) {
        self.updated_by = user.user_id.clone();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_null_collections_deserialize_to_empty() {
        let missing: InventoryItemInstance =
            serde_json::from_value(json!({"furnitureItemId": 7})).unwrap();
        let nulls: InventoryItemInstance = serde_json::from_value(json!({
            "furnitureItemId": 7,
            "tags": null,
            "packingNeeds": null,
            "uploadedImages": null,
            "cameraImages": null,
            "cuft": null
        }))
        .unwrap();

        assert_eq!(missing, nulls);
        assert_eq!(missing.count, 1);
        assert!(missing.tags.is_empty());
    }

    #[test]
    fn test_numeric_dimensions_are_read_as_strings() {
        let item: InventoryItemInstance = serde_json::from_value(json!({
            "id": 99,
            "cuft": 12.5,
            "lbs": "80"
        }))
        .unwrap();

        assert_eq!(item.cuft.as_deref(), Some("12.5"));
        assert_eq!(item.lbs.as_deref(), Some("80"));
    }

    #[test]
    fn test_whole_float_dimensions_render_without_fraction() {
        let item: InventoryItemInstance =
            serde_json::from_value(json!({"id": 99, "cuft": 12.0, "lbs": 80})).unwrap();

        assert_eq!(item.cuft.as_deref(), Some("12"));
        assert_eq!(item.lbs.as_deref(), Some("80"));
    }

    #[test]
    fn test_fractional_packing_quantity_is_accepted() {
        let item: InventoryItemInstance = serde_json::from_value(json!({
            "id": 99,
            "packingNeeds": [{"type": "wrap", "quantity": 1.5}]
        }))
        .unwrap();

        assert_eq!(item.packing_needs[0].quantity_text(), "1.5");
        assert_eq!(
            serde_json::to_value(&item.packing_needs[0]).unwrap(),
            json!({"type": "wrap", "quantity": 1.5})
        );
    }

    #[test]
    fn test_packing_need_uses_type_on_the_wire() {
        let need: PackingNeed =
            serde_json::from_value(json!({"type": "box-small", "quantity": 2})).unwrap();
        assert_eq!(need, PackingNeed::new("box-small", 2));

        let value = serde_json::to_value(&need).unwrap();
        assert_eq!(value, json!({"type": "box-small", "quantity": 2}));
    }

    #[test]
    fn test_update_distinguishes_null_room_from_absent_room() {
        let unassign: InstanceUpdate = serde_json::from_value(json!({"roomId": null})).unwrap();
        let untouched: InstanceUpdate = serde_json::from_value(json!({"notes": "x"})).unwrap();

        assert_eq!(unassign.room_id, Some(None));
        assert_eq!(untouched.room_id, None);

        let mut item = InventoryItemInstance::for_furniture(7);
        item.room_id = Some(RecordId::Int(2));

        item.apply(&untouched);
        assert_eq!(item.room_id, Some(RecordId::Int(2)));
        assert_eq!(item.notes.as_deref(), Some("x"));

        item.apply(&unassign);
        assert_eq!(item.room_id, None);
    }

    #[test]
    fn test_add_tag_is_idempotent() {
        let mut item = InventoryItemInstance::for_furniture(1);
        assert!(item.add_tag("storage"));
        assert!(!item.add_tag("storage"));
        assert_eq!(item.tags, vec!["storage".to_string()]);
    }

    #[test]
    fn test_row_round_trips_with_flattened_item() {
        let user = UserContext::new("mover-1".to_string());
        let mut item = InventoryItemInstance::for_furniture(7);
        item.tags = vec!["fragile".to_string()];
        let row = InventoryRow::new("stop-1".to_string(), item, "7||fragile".to_string(), &user);

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["furnitureItemId"], json!(7));
        assert_eq!(value["stopId"], json!("stop-1"));
        assert_eq!(value["groupingKey"], json!("7||fragile"));

        let parsed: InventoryRow = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, row);
    }
}
