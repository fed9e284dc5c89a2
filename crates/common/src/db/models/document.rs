//! Stored meeting document entity

use crate::errors::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    pub start_time: Option<DateTimeWithTimeZone>,

    /// Text that was embedded: summary, description, location, attendees
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    /// `{summary, startTime, location}`; older rows hold it JSON-encoded
    /// inside a string
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Typed view of the `metadata` column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub summary: String,

    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub location: Option<String>,
}

impl Model {
    /// Decode metadata regardless of whether it was stored as an object or
    /// as encoded text
    pub fn parse_metadata(&self) -> crate::errors::Result<DocumentMetadata> {
        let raw = self.metadata.as_ref().ok_or_else(|| AppError::Parse {
            message: format!("document {} has no metadata", self.id),
        })?;

        let value = match raw {
            Json::String(encoded) => serde_json::from_str(encoded).map_err(|e| AppError::Parse {
                message: format!("document {}: undecodable metadata text: {}", self.id, e),
            })?,
            other => other.clone(),
        };

        serde_json::from_value(value).map_err(|e| AppError::Parse {
            message: format!("document {}: {}", self.id, e),
        })
    }
}
