use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BusStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl BusStatus {
    pub fn parse(raw: &str) -> Result<Self, errors::ModelError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(BusStatus::Active),
            "inactive" => Ok(BusStatus::Inactive),
            other => Err(errors::ModelError::Validation(format!(
                "status must be 'active' or 'inactive', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bus")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub route: String,
    pub image_url: String,
    /// JSON array of stop names, in travel order.
    #[sea_orm(column_type = "Text")]
    pub stops: String,
    pub status: BusStatus,
    pub schedule: String,
    pub fare: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn stop_list(&self) -> Result<Vec<String>, errors::ModelError> {
        decode_stops(&self.stops)
    }
}

/// Column values for a new row; id and timestamps are assigned on insert.
#[derive(Clone, Debug)]
pub struct NewBus {
    pub name: String,
    pub route: String,
    pub image_url: String,
    pub stops: Vec<String>,
    pub status: BusStatus,
    pub schedule: String,
    pub fare: String,
}

pub fn encode_stops(stops: &[String]) -> Result<String, errors::ModelError> {
    serde_json::to_string(stops).map_err(|e| errors::ModelError::Validation(e.to_string()))
}

pub fn decode_stops(raw: &str) -> Result<Vec<String>, errors::ModelError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| errors::ModelError::Db(format!("corrupt stops column: {e}")))
}

pub fn validate_required(field: &str, value: &str) -> Result<(), errors::ModelError> {
    if value.trim().is_empty() {
        return Err(errors::ModelError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, new: NewBus) -> Result<Model, errors::ModelError> {
    validate_required("name", &new.name)?;
    validate_required("route", &new.route)?;
    validate_required("schedule", &new.schedule)?;
    validate_required("fare", &new.fare)?;
    validate_required("imageUrl", &new.image_url)?;

    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(new.name),
        route: Set(new.route),
        image_url: Set(new.image_url),
        stops: Set(encode_stops(&new.stops)?),
        status: Set(new.status),
        schedule: Set(new.schedule),
        fare: Set(new.fare),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list_newest_first(db: &DatabaseConnection) -> Result<Vec<Model>, errors::ModelError> {
    let rows = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

/// Delete by id; returns whether a row was removed.
pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(BusStatus::parse(" Active ").unwrap(), BusStatus::Active);
        assert_eq!(BusStatus::parse("INACTIVE").unwrap(), BusStatus::Inactive);
        assert!(BusStatus::parse("retired").is_err());
    }

    #[test]
    fn stops_json_keeps_order() {
        let stops = vec!["X".to_string(), "Y".to_string(), "Z".to_string()];
        let raw = encode_stops(&stops).unwrap();
        assert_eq!(raw, r#"["X","Y","Z"]"#);
        assert_eq!(decode_stops(&raw).unwrap(), stops);
        assert!(decode_stops("").unwrap().is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(BusStatus::Inactive).unwrap(), serde_json::json!("inactive"));
    }
}
