use std::collections::HashMap;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::info;

use crate::common::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record is missing required string field `id`")]
    MissingId,
    #[error("unsupported attribute value for field `{0}`")]
    UnsupportedAttribute(String),
    #[error("number `{0}` does not fit a JSON number")]
    InvalidNumber(String),
    #[error("dynamodb request failed: {0}")]
    Request(String),
}

/// Thin wrapper over the DynamoDB client bound to one table. Records are
/// stored whole, keyed by the string partition key `id`.
pub struct RecordStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl RecordStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Writes the record unconditionally. An existing item with the same
    /// `id` is replaced, last write wins.
    pub async fn put_record(&self, record: &Record) -> Result<(), StoreError> {
        let item = record_to_item(record)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| StoreError::Request(DisplayErrorContext(err).to_string()))?;

        Ok(())
    }

    /// Returns every record in the table. Single unbounded scan, no
    /// pagination, no filtering.
    pub async fn scan_records(&self) -> Result<Vec<Record>, StoreError> {
        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|err| StoreError::Request(DisplayErrorContext(err).to_string()))?;

        let items = result.items.unwrap_or_default();
        info!("scanned {} records", items.len());

        items.iter().map(item_to_record).collect()
    }

    pub async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| StoreError::Request(DisplayErrorContext(err).to_string()))?;

        match result.item {
            Some(item) => Ok(Some(item_to_record(&item)?)),
            None => Ok(None),
        }
    }

    /// Removes the record and returns the deleted attributes as the
    /// acknowledgment. An absent `id` yields an empty record.
    pub async fn delete_record(&self, id: &str) -> Result<Record, StoreError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|err| StoreError::Request(DisplayErrorContext(err).to_string()))?;

        match result.attributes {
            Some(attributes) => item_to_record(&attributes),
            None => Ok(Record(Map::new())),
        }
    }
}

fn record_to_item(record: &Record) -> Result<HashMap<String, AttributeValue>, StoreError> {
    if record.id().is_none() {
        return Err(StoreError::MissingId);
    }

    let mut item = HashMap::with_capacity(record.0.len());
    for (field, value) in &record.0 {
        item.insert(field.clone(), value_to_attr(field, value)?);
    }

    Ok(item)
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<Record, StoreError> {
    let mut fields = Map::with_capacity(item.len());
    for (field, attr) in item {
        fields.insert(field.clone(), attr_to_value(field, attr)?);
    }

    Ok(Record(fields))
}

fn value_to_attr(field: &str, value: &Value) -> Result<AttributeValue, StoreError> {
    let attr = match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(
            values
                .iter()
                .map(|v| value_to_attr(field, v))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => {
            let mut nested = HashMap::with_capacity(fields.len());
            for (nested_field, nested_value) in fields {
                nested.insert(nested_field.clone(), value_to_attr(nested_field, nested_value)?);
            }
            AttributeValue::M(nested)
        }
    };

    Ok(attr)
}

fn attr_to_value(field: &str, attr: &AttributeValue) -> Result<Value, StoreError> {
    let value = match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(attrs) => Value::Array(
            attrs
                .iter()
                .map(|a| attr_to_value(field, a))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(item) => {
            let mut nested = Map::with_capacity(item.len());
            for (nested_field, nested_attr) in item {
                nested.insert(
                    nested_field.clone(),
                    attr_to_value(nested_field, nested_attr)?,
                );
            }
            Value::Object(nested)
        }
        AttributeValue::Ss(values) => Value::Array(
            values.iter().map(|s| Value::String(s.clone())).collect(),
        ),
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        _ => return Err(StoreError::UnsupportedAttribute(field.to_string())),
    };

    Ok(value)
}

// Integers stay exact; everything else falls back to f64.
fn parse_number(n: &str) -> Result<Number, StoreError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Number::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| StoreError::InvalidNumber(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> Record {
        serde_json::from_value(json!({
            "id": "r1",
            "name": "alpha",
            "count": 3,
            "ratio": 0.5,
            "active": true,
            "tags": ["a", "b"],
            "nested": { "city": "Sydney", "zip": 2000 },
            "note": null,
        }))
        .unwrap()
    }

    #[test]
    fn record_survives_item_conversion() {
        let record = sample_record();
        let item = record_to_item(&record).unwrap();
        let parsed = item_to_record(&item).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn id_becomes_string_attribute() {
        let item = record_to_item(&sample_record()).unwrap();
        assert_eq!(item["id"], AttributeValue::S("r1".to_string()));
        assert_eq!(item["count"], AttributeValue::N("3".to_string()));
    }

    #[test]
    fn record_without_id_is_rejected() {
        let record: Record = serde_json::from_value(json!({"name": "orphan"})).unwrap();
        assert!(matches!(
            record_to_item(&record),
            Err(StoreError::MissingId)
        ));
    }

    #[test]
    fn large_integers_stay_exact() {
        let n = parse_number("9007199254740993").unwrap();
        assert_eq!(n.as_i64(), Some(9007199254740993));
    }

    #[test]
    fn string_set_reads_as_array() {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("r2".to_string()));
        item.insert(
            "labels".to_string(),
            AttributeValue::Ss(vec!["x".to_string(), "y".to_string()]),
        );

        let record = item_to_record(&item).unwrap();
        assert_eq!(record.0["labels"], json!(["x", "y"]));
    }

    #[test]
    fn binary_attribute_is_unsupported() {
        let mut item = HashMap::new();
        item.insert(
            "blob".to_string(),
            AttributeValue::B(aws_sdk_dynamodb::primitives::Blob::new(vec![1, 2])),
        );

        assert!(matches!(
            item_to_record(&item),
            Err(StoreError::UnsupportedAttribute(field)) if field == "blob"
        ));
    }
}
