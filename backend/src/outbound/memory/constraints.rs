//! Table constraints enforced by the in-memory backend.
//!
//! Errors mirror what PostgreSQL reports through the data API so the domain
//! error mappers see the same codes and detail lines in tests as in
//! production.

use std::collections::HashMap;

use crate::domain::ports::Record;
use crate::domain::{DatabaseError, Resource};

use super::eval::{is_null, value_text};

type Tables = HashMap<String, Vec<Record>>;

fn id_of(row: &Record) -> Option<String> {
    value_text(row.get("id"))
}

/// Check not-null, unique and foreign-key constraints for `row`.
pub(super) fn check_row(
    tables: &Tables,
    resource: Resource,
    row: &Record,
) -> Result<(), DatabaseError> {
    let table = resource.table();

    if let Some(column) = resource
        .required_columns()
        .iter()
        .find(|column| is_null(row.get(**column)))
    {
        return Err(DatabaseError::new(
            "23502",
            format!(
                "null value in column \"{column}\" of relation \"{table}\" violates not-null constraint"
            ),
        ));
    }

    let own_id = id_of(row);
    let existing = tables.get(table).map(Vec::as_slice).unwrap_or_default();
    for column in resource.unique_columns() {
        let Some(value) = value_text(row.get(*column)) else {
            continue;
        };
        let duplicate = existing.iter().any(|other| {
            id_of(other) != own_id && value_text(other.get(*column)).as_deref() == Some(&value)
        });
        if duplicate {
            return Err(DatabaseError::new(
                "23505",
                format!("duplicate key value violates unique constraint \"{table}_{column}_key\""),
            )
            .with_details(format!("Key ({column})=({value}) already exists.")));
        }
    }

    for key in resource.foreign_keys() {
        let Some(value) = value_text(row.get(key.column)) else {
            continue;
        };
        let referenced = key.references.table();
        let present = tables
            .get(referenced)
            .is_some_and(|rows| rows.iter().any(|other| id_of(other).as_deref() == Some(&value)));
        if !present {
            return Err(DatabaseError::new(
                "23503",
                format!(
                    "insert or update on table \"{table}\" violates foreign key constraint \"{table}_{column}_fkey\"",
                    column = key.column
                ),
            )
            .with_details(format!(
                "Key ({column})=({value}) is not present in table \"{referenced}\".",
                column = key.column
            )));
        }
    }
    Ok(())
}

/// Refuse to delete rows of `resource` that other rows still reference.
pub(super) fn check_delete(
    tables: &Tables,
    resource: Resource,
    doomed: &[Record],
) -> Result<(), DatabaseError> {
    let table = resource.table();
    for dependant in Resource::ALL {
        for key in dependant
            .foreign_keys()
            .iter()
            .filter(|key| key.references == resource)
        {
            let rows = tables.get(dependant.table()).map(Vec::as_slice).unwrap_or_default();
            let referenced = doomed.iter().filter_map(id_of).find(|id| {
                rows.iter()
                    .any(|row| value_text(row.get(key.column)).as_deref() == Some(id.as_str()))
            });
            if let Some(id) = referenced {
                return Err(DatabaseError::new(
                    "23503",
                    format!(
                        "update or delete on table \"{table}\" violates foreign key constraint \"{dependant}_{column}_fkey\" on table \"{dependant}\"",
                        column = key.column
                    ),
                )
                .with_details(format!(
                    "Key (id)=({id}) is still referenced from table \"{dependant}\"."
                )));
            }
        }
    }
    Ok(())
}
