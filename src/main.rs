use aws_config::BehaviorVersion;
use lambda_http::http::{Method, StatusCode};
use lambda_http::{
    run, service_fn, Error as LambdaError, Request as LambdaRequest, Response as LambdaResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

mod common;
mod store;

use crate::common::errors::Error;
use crate::common::utils::extract_request;
use crate::common::{error_response, json_response, Record, TABLE_NAME_DEFAULT};
use crate::store::{RecordStore, StoreError};

const UNSUPPORTED_METHOD_ERROR: &str = "Unsupported method";
const NO_SUCH_RECORD_ERROR: &str = "No record with that id";
const INTERNAL_ERROR: &str = "Internal error";

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    pub id: String,
    pub name: Value,
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    pub id: String,
}

/// POST: body is an array of records, each written unconditionally.
/// Echoes the input array back.
async fn create_records(
    request: LambdaRequest,
    store: &RecordStore,
) -> Result<LambdaResponse<String>, Error> {
    let records = extract_request::<Vec<Record>>(request)?;

    // Reject the whole batch up front so a bad record cannot leave
    // earlier writes behind a 400.
    if records.iter().any(|record| record.id().is_none()) {
        return Err(render_store_error(StoreError::MissingId));
    }

    info!("writing {} records", records.len());
    for record in &records {
        store.put_record(record).await.map_err(render_store_error)?;
    }

    json_response(&records)
}

/// GET: every record in the table, ignoring the body.
async fn read_records(store: &RecordStore) -> Result<LambdaResponse<String>, Error> {
    let records = store.scan_records().await.map_err(render_store_error)?;

    json_response(&records)
}

/// PUT: fetches the record named by `id`, overwrites its `name` field and
/// writes the full item back. 404 when the id is unknown.
async fn update_record(
    request: LambdaRequest,
    store: &RecordStore,
) -> Result<LambdaResponse<String>, Error> {
    let update = extract_request::<UpdateRequest>(request)?;

    let mut record = match store
        .get_record(&update.id)
        .await
        .map_err(render_store_error)?
    {
        Some(record) => record,
        None => return Err(render_not_found(&update.id)),
    };

    record.set("name", update.name);
    store.put_record(&record).await.map_err(render_store_error)?;

    json_response(&record)
}

/// DELETE: removes the record named by `id` and returns the store's
/// deletion acknowledgment.
async fn delete_record(
    request: LambdaRequest,
    store: &RecordStore,
) -> Result<LambdaResponse<String>, Error> {
    let delete = extract_request::<DeleteRequest>(request)?;

    info!("deleting record: {}", delete.id);
    let deleted = store
        .delete_record(&delete.id)
        .await
        .map_err(render_store_error)?;

    json_response(&deleted)
}

fn render_not_found(id: &str) -> Error {
    error!("update of unknown record: {}", id);

    match error_response(StatusCode::NOT_FOUND, NO_SUCH_RECORD_ERROR) {
        Ok(response) => Error::HttpError(response),
        Err(err) => err,
    }
}

fn render_store_error(err: StoreError) -> Error {
    error!("store call failed: {err}");

    let (status, message) = match &err {
        StoreError::MissingId => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string()),
    };

    match error_response(status, &message) {
        Ok(response) => Error::HttpError(response),
        Err(err) => err,
    }
}

#[tracing::instrument(skip(store))]
async fn process_request(
    request: LambdaRequest,
    store: &RecordStore,
) -> Result<LambdaResponse<String>, Error> {
    match request.method() {
        &Method::POST => create_records(request, store).await,
        &Method::GET => read_records(store).await,
        &Method::PUT => update_record(request, store).await,
        &Method::DELETE => delete_record(request, store).await,
        method => {
            error!("unsupported method: {}", method);
            let response =
                error_response(StatusCode::METHOD_NOT_ALLOWED, UNSUPPORTED_METHOD_ERROR)?;
            Err(Error::HttpError(response))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time() // CloudWatch will add the ingestion time
        .with_target(false)
        .init();

    let table_name = std::env::var("TABLE_NAME").unwrap_or(TABLE_NAME_DEFAULT.into());

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let dynamo_client = aws_sdk_dynamodb::Client::new(&config);
    let store = RecordStore::new(dynamo_client, table_name);

    run(service_fn(|request: LambdaRequest| async {
        let result = process_request(request, &store).await;

        match result {
            Ok(val) => Ok(val),
            Err(Error::HttpError(val)) => Ok(val),
            Err(Error::LambdaError(err)) => Err(err),
        }
    }))
    .await
}
