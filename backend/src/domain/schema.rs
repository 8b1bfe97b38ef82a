//! Input schemas checked before an action's handler runs.
//!
//! [`InputSchema`] is the seam the action wrapper validates through. The
//! [`ValidatorSchema`] adapter plugs any `validator::Validate` type into it
//! and flattens `validator`'s nested error tree into [`ValidationIssue`]s.
//! Inputs are camelCase on the wire, so issue paths name fields in camelCase
//! too.

use std::marker::PhantomData;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::failures::{PathSegment, ValidationFailure, ValidationIssue};

/// Field key `validator` uses for struct-level (schema function) errors.
const STRUCT_LEVEL_KEY: &str = "__all__";

/// Validates (and may normalise) an action input.
pub trait InputSchema<I>: Send + Sync {
    /// Return the validated input or the list of issues found.
    fn validate(&self, input: I) -> Result<I, ValidationFailure>;
}

/// Schema backed by the input type's `validator::Validate` implementation.
pub struct ValidatorSchema<T>(PhantomData<fn() -> T>);

impl<T> ValidatorSchema<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ValidatorSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Validate> InputSchema<T> for ValidatorSchema<T> {
    fn validate(&self, input: T) -> Result<T, ValidationFailure> {
        match Validate::validate(&input) {
            Ok(()) => Ok(input),
            Err(errors) => Err(ValidationFailure::from(&errors)),
        }
    }
}

impl From<&ValidationErrors> for ValidationFailure {
    fn from(errors: &ValidationErrors) -> Self {
        let mut issues = Vec::new();
        collect_issues(errors, &[], &mut issues);
        Self::new(issues)
    }
}

fn collect_issues(errors: &ValidationErrors, prefix: &[PathSegment], out: &mut Vec<ValidationIssue>) {
    // HashMap order is unstable; sort so issue order is deterministic.
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| **name);

    for (name, kind) in fields {
        let mut path = prefix.to_vec();
        if *name != STRUCT_LEVEL_KEY {
            path.push(PathSegment::Key(wire_name(name)));
        }
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(ValidationIssue::new(path.clone(), describe(error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_issues(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::Index(*index));
                    collect_issues(nested, &item_path, out);
                }
            }
        }
    }
}

/// Serde's `camelCase` rename of a Rust field name.
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(ch.to_uppercase());
            upper = false;
        } else {
            name.push(ch);
        }
    }
    name
}

fn describe(error: &validator::ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("Invalid value ({})", error.code),
    }
}
