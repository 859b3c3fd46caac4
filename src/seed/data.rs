use crate::logic::InventoryOperations;
use crate::model::{Id, InventoryItemInstance, InventoryRow, PackingNeed, RecordId, UserContext};
use crate::store::traits::Store;
use anyhow::Result;
use serde_json::json;

pub const SEED_ORIGIN_STOP: &str = "lead-1001-origin";
pub const SEED_DESTINATION_STOP: &str = "lead-1001-destination";

const LIVING_ROOM: i64 = 1;
const BEDROOM: i64 = 2;
const KITCHEN: i64 = 3;

/// Helper to build an item from a catalog id, a room and a handful of tags
fn furniture(furniture_item_id: i64, name: &str, room: i64, tags: &[&str]) -> InventoryItemInstance {
    InventoryItemInstance {
        name: Some(name.to_string()),
        room_id: Some(RecordId::Int(room)),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..InventoryItemInstance::for_furniture(furniture_item_id)
    }
}

/// Load a sample move: an origin with three rooms and a destination that
/// still carries rows written by an older client with stale keys.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    let user = UserContext::system();
    let origin: Id = SEED_ORIGIN_STOP.to_string();
    let destination: Id = SEED_DESTINATION_STOP.to_string();

    let mut sofa = furniture(101, "Sofa, 3 cushion", LIVING_ROOM, &["bulky"]);
    sofa.cuft = Some("45".to_string());
    sofa.lbs = Some("180".to_string());

    let mut lamp = furniture(140, "Floor lamp", LIVING_ROOM, &["fragile"]);
    lamp.count = 2;

    let mut dresser = furniture(210, "Dresser", BEDROOM, &["disassemble", "bulky"]);
    dresser.packing_needs = vec![PackingNeed::new("blanket", 2), PackingNeed::new("box-medium", 3)];
    dresser.notes = Some("Mirror detaches".to_string());

    let mut dishes = furniture(330, "Dish pack", KITCHEN, &["fragile"]);
    dishes.packing_needs = vec![PackingNeed::new("dish-pack", 1)];
    dishes.uploaded_images = vec!["https://cdn.example.com/inventory/dishes-1.jpg".to_string()];

    // The second lamp entry folds into the first row
    let items = vec![sofa, lamp, furniture(140, "Floor lamp", LIVING_ROOM, &["fragile"]), dresser, dishes];
    for item in items {
        InventoryOperations::add_item(store, &origin, item, &user).await?;
    }

    let legacy: Vec<InventoryRow> = vec![
        json!({"rowId": "legacy-1", "stopId": destination, "furnitureItemId": 101, "roomId": LIVING_ROOM,
               "tags": ["bulky"], "cuft": 45, "groupingKey": "101|1|bulky"}),
        json!({"rowId": "legacy-2", "stopId": destination, "furnitureItemId": 101, "roomId": LIVING_ROOM,
               "tags": ["bulky"], "cuft": "45"}),
        json!({"rowId": "legacy-3", "stopId": destination, "id": "custom-piano", "name": "Upright piano",
               "tags": ["crate", "third-party"], "count": 1}),
    ]
    .into_iter()
    .map(serde_json::from_value::<InventoryRow>)
    .collect::<std::result::Result<_, _>>()?;

    for row in legacy {
        store.upsert_row(row).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InventoryStore, MemoryStore};

    #[tokio::test]
    async fn test_seed_data_loads() {
        let store = MemoryStore::new();
        load_seed_data(&store).await.unwrap();

        let origin = store
            .list_rows_for_stop(&SEED_ORIGIN_STOP.to_string())
            .await
            .unwrap();
        assert_eq!(origin.len(), 4);
        let lamp = origin
            .iter()
            .find(|row| row.item.furniture_item_id == Some(RecordId::Int(140)))
            .unwrap();
        assert_eq!(lamp.count(), 3);

        let destination = store
            .list_rows_for_stop(&SEED_DESTINATION_STOP.to_string())
            .await
            .unwrap();
        assert_eq!(destination.len(), 3);
    }
}
