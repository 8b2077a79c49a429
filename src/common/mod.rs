pub mod errors;
pub mod utils;

use lambda_http::http::StatusCode;
use lambda_http::Response as LambdaResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::errors::Error;

pub const TABLE_NAME_DEFAULT: &str = "records-table";

/// A schemaless record. The only required field is a string `id`, which
/// keys the item in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }
}

/// 200 envelope used by every successful branch: permissive CORS,
/// JSON content type, JSON-encoded body.
pub fn json_response<T: Serialize>(body: &T) -> Result<LambdaResponse<String>, Error> {
    let response = LambdaResponse::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(body)?)
        .map_err(Error::from)?;

    Ok(response)
}

pub fn error_response(status: StatusCode, message: &str) -> Result<LambdaResponse<String>, Error> {
    let response = LambdaResponse::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Content-Type", "application/json")
        .body(serde_json::json!({ "error": message }).to_string())
        .map_err(Error::from)?;

    Ok(response)
}
