//! Dashboard resources and the input shapes used to create or edit them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::query::SortOrder;

/// A managed table exposed through the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Clients,
    Workers,
    Locations,
    Assignments,
}

/// Reference from one resource's column to another resource's `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: Resource,
}

impl Resource {
    pub const ALL: [Self; 4] = [Self::Clients, Self::Workers, Self::Locations, Self::Assignments];

    /// Table name in the data API.
    pub fn table(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Workers => "workers",
            Self::Locations => "locations",
            Self::Assignments => "assignments",
        }
    }

    /// Cached dashboard page listing this resource.
    pub fn dashboard_path(self) -> String {
        format!("/dashboard/{}", self.table())
    }

    pub fn search_columns(self) -> &'static [&'static str] {
        match self {
            Self::Clients => &["name", "email", "phone"],
            Self::Workers => &["first_name", "last_name", "email"],
            Self::Locations => &["name", "address"],
            Self::Assignments => &["notes"],
        }
    }

    pub fn sortable_columns(self) -> &'static [&'static str] {
        match self {
            Self::Clients => &["name", "email", "created_at", "updated_at"],
            Self::Workers => &["last_name", "first_name", "email", "created_at", "updated_at"],
            Self::Locations => &["name", "created_at", "updated_at"],
            Self::Assignments => &["starts_at", "ends_at", "created_at", "updated_at"],
        }
    }

    /// Ordering applied when the caller does not choose one.
    pub fn default_sort(self) -> (&'static str, SortOrder) {
        match self {
            Self::Clients | Self::Locations => ("name", SortOrder::Asc),
            Self::Workers => ("last_name", SortOrder::Asc),
            Self::Assignments => ("starts_at", SortOrder::Desc),
        }
    }

    /// Columns holding values that must be unique among this resource's rows.
    pub fn unique_columns(self) -> &'static [&'static str] {
        match self {
            Self::Clients | Self::Workers => &["email"],
            Self::Locations | Self::Assignments => &[],
        }
    }

    pub fn foreign_keys(self) -> &'static [ForeignKey] {
        match self {
            Self::Clients | Self::Workers => &[],
            Self::Locations => &[ForeignKey {
                column: "client_id",
                references: Self::Clients,
            }],
            Self::Assignments => &[
                ForeignKey {
                    column: "worker_id",
                    references: Self::Workers,
                },
                ForeignKey {
                    column: "location_id",
                    references: Self::Locations,
                },
            ],
        }
    }

    /// Columns that must be present on every row.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Clients | Self::Locations => &["name"],
            Self::Workers => &["first_name", "last_name", "email"],
            Self::Assignments => &["worker_id", "location_id", "starts_at", "ends_at"],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource: {0}")]
pub struct UnknownResource(String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.table() == value)
            .ok_or_else(|| UnknownResource(value.to_owned()))
    }
}

/// Input type that creates or edits rows of one resource.
///
/// Inputs are read from camelCase request bodies and serialise to the
/// table's column names. Unset optional fields are left out of the row, so
/// an update only touches the columns it carries.
pub trait ResourceInput:
    Validate + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const RESOURCE: Resource;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct ClientInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[validate(length(max = 40, message = "Phone number is too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ResourceInput for ClientInput {
    const RESOURCE: Resource = Resource::Clients;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct WorkerInput {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(max = 40, message = "Phone number is too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
}

impl ResourceInput for WorkerInput {
    const RESOURCE: Resource = Resource::Workers;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct LocationInput {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[validate(length(max = 2000, message = "Instructions are too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ResourceInput for LocationInput {
    const RESOURCE: Resource = Resource::Locations;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all(deserialize = "camelCase"))]
#[validate(schema(function = "validate_shift_window", skip_on_field_errors = false))]
pub struct AssignmentInput {
    pub worker_id: Uuid,
    pub location_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ResourceInput for AssignmentInput {
    const RESOURCE: Resource = Resource::Assignments;
}

fn validate_shift_window(input: &AssignmentInput) -> Result<(), ValidationError> {
    if input.ends_at <= input.starts_at {
        let mut error = ValidationError::new("shift_window");
        error.message = Some("The shift must end after it starts".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InputSchema;
    use crate::domain::schema::ValidatorSchema;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    fn resources_round_trip_through_their_table_names() {
        for resource in Resource::ALL {
            assert_eq!(resource.table().parse::<Resource>(), Ok(resource));
        }
        assert!("rosters".parse::<Resource>().is_err());
    }

    #[rstest]
    fn default_sort_columns_are_sortable() {
        for resource in Resource::ALL {
            let (column, _) = resource.default_sort();
            assert!(resource.sortable_columns().contains(&column));
        }
    }

    #[rstest]
    fn dashboard_paths_follow_table_names() {
        assert_eq!(Resource::Workers.dashboard_path(), "/dashboard/workers");
    }

    #[rstest]
    #[case(Duration::hours(8), true)]
    #[case(Duration::zero(), false)]
    #[case(Duration::hours(-1), false)]
    fn assignments_must_end_after_they_start(#[case] length: Duration, #[case] valid: bool) {
        let starts_at = Utc::now();
        let input = AssignmentInput {
            worker_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            starts_at,
            ends_at: starts_at + length,
            notes: None,
        };
        let outcome = ValidatorSchema::<AssignmentInput>::new().validate(input);
        assert_eq!(outcome.is_ok(), valid);
        if let Err(failure) = outcome {
            assert!(failure.issues[0].path.is_empty());
        }
    }

    #[rstest]
    fn optional_client_email_is_checked_when_present() {
        let input = ClientInput {
            name: "Acme".into(),
            email: Some("nope".into()),
            phone: None,
            address: None,
            notes: None,
        };
        let failure = ValidatorSchema::<ClientInput>::new()
            .validate(input)
            .expect_err("invalid email");
        assert_eq!(failure.issues[0].dotted_path().as_deref(), Some("email"));
    }

    #[rstest]
    fn inputs_read_camel_case_and_write_column_names() {
        let input: WorkerInput = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "hourlyRate": 21.5
        }))
        .expect("worker input");
        let row = serde_json::to_value(&input).expect("row");
        assert_eq!(
            row,
            serde_json::json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "hourly_rate": 21.5
            })
        );
    }
}
