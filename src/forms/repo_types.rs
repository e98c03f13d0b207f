use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One question of a form. `kind` is an open tag and is never interpreted here.
/// Keys this service doesn't model (`options` for choice inputs, etc.) ride along
/// in `extra` and are stored and echoed as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub id: Uuid,
    pub name: String,
    pub fields: Vec<Field>,
    pub creator_email: String,
    pub magic_token: String,
    pub is_active: bool,
    pub submission_count: i64,
    pub created_at: OffsetDateTime,
}

/// Form record as stored in the `forms` table.
#[derive(Debug, FromRow)]
pub struct FormRow {
    pub id: Uuid,
    pub name: String,
    pub fields: Json<Vec<Field>>,
    pub creator_email: String,
    pub magic_token: String,
    pub is_active: bool,
    pub submission_count: i64,
    pub created_at: OffsetDateTime,
}

impl From<FormRow> for Form {
    fn from(r: FormRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            fields: r.fields.0,
            creator_email: r.creator_email,
            magic_token: r.magic_token,
            is_active: r.is_active,
            submission_count: r.submission_count,
            created_at: r.created_at,
        }
    }
}
