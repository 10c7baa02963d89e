//! The `{ success, data }` response convention.
//!
//! Read paths answer with `{ "success": true, "data": ... }`, but a few routes
//! return the payload bare. `Envelope` accepts both and `into_data` yields the
//! payload either way.
//!
//! An object with a boolean `success` is always read as wrapped, so a bad
//! `data` payload fails with the error from the payload itself rather than a
//! generic "no variant matched".

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped {
        success: bool,
        data: Option<T>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Bare(T),
}

#[derive(Deserialize)]
struct WrappedBody<T> {
    success: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("success").is_some_and(Value::is_boolean) {
            let WrappedBody {
                success,
                data,
                message,
            } = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Envelope::Wrapped {
                success,
                data,
                message,
            })
        } else {
            serde_json::from_value(value)
                .map(Envelope::Bare)
                .map_err(D::Error::custom)
        }
    }
}

impl<T> Envelope<T> {
    /// A successful wrapped envelope around `data`.
    pub fn ok(data: T) -> Self {
        Envelope::Wrapped {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn into_data(self) -> Result<T, ApiError> {
        match self {
            Envelope::Wrapped {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope::Wrapped {
                success: true,
                data: None,
                ..
            } => Err(ApiError::Deserialization(
                "envelope reported success without data".to_string(),
            )),
            Envelope::Wrapped {
                success: false,
                message,
                ..
            } => Err(ApiError::Rejected(
                message.unwrap_or_else(|| "request was not successful".to_string()),
            )),
            Envelope::Bare(data) => Ok(data),
        }
    }
}

impl<T> From<T> for Envelope<T> {
    fn from(data: T) -> Self {
        Envelope::Bare(data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn wrapped_success_unwraps_data() {
        let env: Envelope<Vec<Value>> =
            serde_json::from_value(json!({"success": true, "data": [{"_id": "p1"}]})).unwrap();
        assert_eq!(env.into_data().unwrap(), vec![json!({"_id": "p1"})]);
    }

    #[test]
    fn bare_payload_passes_through() {
        let env: Envelope<Vec<Value>> = serde_json::from_value(json!([1, 2])).unwrap();
        assert!(matches!(env, Envelope::Bare(_)));
        assert_eq!(env.into_data().unwrap(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn bare_object_without_success_field_is_not_wrapped() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"data": 1, "total": 3})).unwrap();
        assert_eq!(env.into_data().unwrap(), json!({"data": 1, "total": 3}));
    }

    #[test]
    fn unsuccessful_envelope_becomes_rejected() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"success": false, "message": "Ca trùng"})).unwrap();
        let err = env.into_data().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Ca trùng"));
    }

    #[test]
    fn bad_payload_error_names_the_field() {
        let err = serde_json::from_value::<Envelope<crate::types::LeaveRequest>>(json!({
            "success": true,
            "data": {"_id": "l1", "LyDo": 7},
        }))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid type"), "got {message}");
        assert!(!message.contains("did not match any variant"), "got {message}");
    }

    #[test]
    fn wrapped_list_keeps_good_records_next_to_odd_ones() {
        let env: Envelope<Vec<crate::types::WorkSchedule>> = serde_json::from_value(json!({
            "success": true,
            "data": [
                {"_id": "s1", "NgayLamViec": "2024-05-06", "CaLamViec": "Sang"},
                {"_id": "s2", "NgayLamViec": "not a date", "CaLamViec": "Toi"},
            ],
        }))
        .unwrap();
        let schedules = env.into_data().unwrap();
        assert_eq!(schedules.len(), 2);
        assert!(schedules[0].work_date().is_some());
        assert!(schedules[1].work_date().is_none());
    }

    #[test]
    fn success_without_data_is_an_error() {
        let env: Envelope<Vec<Value>> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(matches!(env.into_data(), Err(ApiError::Deserialization(_))));
    }
}
