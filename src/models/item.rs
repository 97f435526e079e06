use crate::entities::drink_item_entity as items;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub is_special: bool,
    pub is_drawable: bool,
}

impl From<items::Model> for ItemResponse {
    fn from(m: items::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            image_ref: m.image_ref,
            is_special: m.is_special,
            is_drawable: m.is_drawable,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitItemRequest {
    #[schema(example = "Thunder Viper")]
    pub name: String,
    #[schema(example = "Tastes like a lightning storm in a can")]
    pub description: String,
    pub image_ref: Option<String>,
}
