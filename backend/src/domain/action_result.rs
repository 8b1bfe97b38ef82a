//! Success/failure envelope returned by every action.
//!
//! On the wire an [`ActionResult`] is either
//! `{"success": true, "data": ...}` or `{"success": false, "error": {...}}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Error, ErrorCode, ErrorDetails, create_error};

/// Outcome of one action invocation.
///
/// # Examples
/// ```
/// use staffdesk::domain::{ActionResult, ErrorCode};
///
/// let ok = ActionResult::success(3);
/// assert!(ok.is_success());
/// let failed: ActionResult<u8> = ActionResult::failure(ErrorCode::NotFound, "missing", None);
/// assert!(failed.is_failure());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    /// The action completed and produced `data`.
    Success { data: T },
    /// The action failed with a taxonomy error.
    Failure { error: Error },
}

impl<T> ActionResult<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>, details: Option<ErrorDetails>) -> Self {
        Self::Failure {
            error: create_error(code, message, details),
        }
    }

    pub fn from_error(error: Error) -> Self {
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Data when the action succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Error when the action failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Convert into a standard [`Result`] for `?`-style handling.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }

    /// Transform successful data, leaving failures untouched.
    pub fn map<U, F>(self, f: F) -> ActionResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success { data } => ActionResult::Success { data: f(data) },
            Self::Failure { error } => ActionResult::Failure { error },
        }
    }
}

impl<T> From<Result<T, Error>> for ActionResult<T> {
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(data) => Self::success(data),
            Err(error) => Self::from_error(error),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ActionResultRef<'a, T> {
    Success { success: bool, data: &'a T },
    Failure { success: bool, error: &'a Error },
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success { data } => ActionResultRef::Success {
                success: true,
                data,
            },
            Self::Failure { error } => ActionResultRef::Failure {
                success: false,
                error,
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ActionResultDto<T> {
    success: bool,
    // `null` is valid data (unit results), so presence decides `Some`.
    #[serde(default = "Option::default", deserialize_with = "present")]
    data: Option<T>,
    #[serde(default)]
    error: Option<Error>,
}

fn present<'de, D: Deserializer<'de>, T: DeserializeOwned>(
    deserializer: D,
) -> Result<Option<T>, D::Error> {
    T::deserialize(deserializer).map(Some)
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ActionResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dto = ActionResultDto::<T>::deserialize(deserializer)?;
        match (dto.success, dto.data, dto.error) {
            (true, Some(data), None) => Ok(Self::Success { data }),
            (false, None, Some(error)) => Ok(Self::Failure { error }),
            (true, _, _) => Err(serde::de::Error::custom(
                "successful results carry data and no error",
            )),
            (false, _, _) => Err(serde::de::Error::custom(
                "failed results carry an error and no data",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Envelope predicates and wire shape.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn success_predicates() {
        let result = ActionResult::success("x");
        assert!(result.is_success());
        assert!(!result.is_failure());
        assert_eq!(result.data(), Some(&"x"));
        assert!(result.error().is_none());
    }

    #[rstest]
    fn failure_predicates() {
        let result: ActionResult<()> =
            ActionResult::failure(ErrorCode::Forbidden, "no access", None);
        assert!(result.is_failure());
        assert!(!result.is_success());
        assert_eq!(result.error().map(Error::code), Some(ErrorCode::Forbidden));
        assert!(result.data().is_none());
    }

    #[rstest]
    fn success_serialises_with_flag_and_data() {
        let value = serde_json::to_value(ActionResult::success(json!({"id": 7}))).expect("json");
        assert_eq!(value, json!({"success": true, "data": {"id": 7}}));
    }

    #[rstest]
    fn failure_serialises_with_flag_and_error() {
        let result: ActionResult<u8> = ActionResult::failure(ErrorCode::NotFound, "gone", None);
        let value = serde_json::to_value(result).expect("json");
        assert_eq!(
            value,
            json!({"success": false, "error": {"code": "NOT_FOUND", "message": "gone"}})
        );
    }

    #[rstest]
    fn deserialises_both_shapes() {
        let ok: ActionResult<u8> =
            serde_json::from_value(json!({"success": true, "data": 4})).expect("success");
        assert_eq!(ok, ActionResult::success(4));

        let failed: ActionResult<u8> = serde_json::from_value(json!({
            "success": false,
            "error": {"code": "FORBIDDEN", "message": "no"}
        }))
        .expect("failure");
        assert!(failed.is_failure());

        let unit = serde_json::to_value(ActionResult::success(())).expect("json");
        assert_eq!(unit, json!({"success": true, "data": null}));
        let unit: ActionResult<()> = serde_json::from_value(unit).expect("unit success");
        assert_eq!(unit, ActionResult::success(()));
    }

    #[rstest]
    fn blank_failure_messages_use_the_code_default() {
        let result: ActionResult<u8> = ActionResult::failure(ErrorCode::NotFound, " ", None);
        assert_eq!(
            result.error().map(Error::message),
            Some(ErrorCode::NotFound.default_message())
        );
    }

    #[rstest]
    #[case(json!({"success": true}))]
    #[case(json!({"success": false, "data": 1}))]
    #[case(json!({"success": true, "data": null}))]
    #[case(json!({"success": true, "data": 1, "error": {"code": "FORBIDDEN", "message": "no"}}))]
    fn rejects_inconsistent_envelopes(#[case] payload: serde_json::Value) {
        assert!(serde_json::from_value::<ActionResult<u8>>(payload).is_err());
    }

    #[rstest]
    fn map_and_into_result() {
        let doubled = ActionResult::success(21).map(|n| n * 2);
        assert_eq!(doubled.into_result().expect("success"), 42);

        let failed: ActionResult<u8> = ActionResult::from_error(Error::not_found("x"));
        assert_eq!(failed.map(|n| n + 1).into_result().map_err(|e| e.code()), Err(ErrorCode::NotFound));
    }
}
