// src/models/topic.rs

use serde::Serialize;
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'topics' table: a history subject area grouping an
/// ordered lesson sequence, unlocked by cumulative XP.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub required_xp_to_unlock: i64,
    pub subcategories: Json<Vec<String>>,
}
