use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::bus::{BusStatus, NewBus};

use crate::errors::ServiceError;

/// Raw text fields of a create/update form. Every field is optional at this stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusForm {
    pub name: Option<String>,
    pub route: Option<String>,
    /// Comma separated stop names.
    pub stops: Option<String>,
    pub status: Option<String>,
    pub schedule: Option<String>,
    pub fare: Option<String>,
}

/// Validated create input still waiting for its image URL.
#[derive(Debug, Clone, PartialEq)]
pub struct BusDraft {
    pub name: String,
    pub route: String,
    pub stops: Vec<String>,
    pub status: BusStatus,
    pub schedule: String,
    pub fare: String,
}

impl BusDraft {
    pub fn with_image(self, image_url: String) -> NewBus {
        NewBus {
            name: self.name,
            route: self.route,
            image_url,
            stops: self.stops,
            status: self.status,
            schedule: self.schedule,
            fare: self.fare,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusChanges {
    pub name: Option<String>,
    pub route: Option<String>,
    pub image_url: Option<String>,
    pub stops: Option<Vec<String>>,
    pub status: Option<BusStatus>,
    pub schedule: Option<String>,
    pub fare: Option<String>,
}

/// Bus as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusRecord {
    pub id: Uuid,
    pub name: String,
    pub route: String,
    pub image_url: String,
    pub stops: Vec<String>,
    pub status: BusStatus,
    pub schedule: String,
    pub fare: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl TryFrom<models::bus::Model> for BusRecord {
    type Error = ServiceError;

    fn try_from(m: models::bus::Model) -> Result<Self, Self::Error> {
        let stops = m.stop_list()?;
        Ok(BusRecord {
            id: m.id,
            name: m.name,
            route: m.route,
            image_url: m.image_url,
            stops,
            status: m.status,
            schedule: m.schedule,
            fare: m.fare,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Split on commas, trim, drop empty entries.
///
/// Blank entries (`"X,,Y"`, a trailing comma) never become stops, so an empty
/// string clears the list instead of storing `[""]`.
pub fn parse_stops(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(field: &str, value: Option<&String>) -> Result<String, ServiceError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ServiceError::Validation(format!("{field} is required"))),
    }
}

/// A provided value must not be blank; an absent one stays absent.
fn non_blank(field: &str, value: Option<&String>) -> Result<Option<String>, ServiceError> {
    match value {
        None => Ok(None),
        Some(v) => required(field, Some(v)).map(Some),
    }
}

fn status(value: Option<&String>) -> Result<Option<BusStatus>, ServiceError> {
    match value.map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => BusStatus::parse(v)
            .map(Some)
            .map_err(|_| ServiceError::Validation("status must be 'active' or 'inactive'".into())),
    }
}

impl BusForm {
    pub fn validate_for_create(&self) -> Result<BusDraft, ServiceError> {
        Ok(BusDraft {
            name: required("name", self.name.as_ref())?,
            route: required("route", self.route.as_ref())?,
            stops: self.stops.as_deref().map(parse_stops).unwrap_or_default(),
            status: status(self.status.as_ref())?.unwrap_or_default(),
            schedule: required("schedule", self.schedule.as_ref())?,
            fare: required("fare", self.fare.as_ref())?,
        })
    }

    pub fn validate_for_update(&self) -> Result<BusChanges, ServiceError> {
        Ok(BusChanges {
            name: non_blank("name", self.name.as_ref())?,
            route: non_blank("route", self.route.as_ref())?,
            image_url: None,
            stops: self.stops.as_deref().map(parse_stops),
            status: status(self.status.as_ref())?,
            schedule: non_blank("schedule", self.schedule.as_ref())?,
            fare: non_blank("fare", self.fare.as_ref())?,
        })
    }
}
