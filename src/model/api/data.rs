use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

/// JSON body of every successful response. Failures carry an `error`
/// field instead, see [`crate::error::ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

/// Wrap a value into a successful JSON response body.
pub fn data<T>(value: T) -> Json<Data<T>> {
    Json(Data { data: value })
}
