use lambda_http::http::StatusCode;
use lambda_http::{Request, RequestPayloadExt};
use serde::de::DeserializeOwned;

use crate::common::errors::Error;
use crate::common::error_response;

const EMPTY_PAYLOAD_ERROR: &str = "Request payload is empty";

/// Deserializes the request body, turning an empty or malformed payload
/// into a rendered 400.
pub fn extract_request<T: DeserializeOwned>(request: Request) -> Result<T, Error> {
    match request.payload::<T>() {
        Ok(Some(val)) => Ok(val),
        Ok(None) => Err(Error::HttpError(error_response(
            StatusCode::BAD_REQUEST,
            EMPTY_PAYLOAD_ERROR,
        )?)),
        Err(err) => Err(Error::HttpError(error_response(
            StatusCode::BAD_REQUEST,
            &err.to_string(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct KeyRequest {
        pub id: String,
    }

    fn json_request(body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method("PUT")
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn extracts_typed_payload() {
        let request = json_request(r#"{"id": "r1"}"#);
        let parsed: KeyRequest = extract_request(request).unwrap();
        assert_eq!(parsed.id, "r1");
    }

    #[test]
    fn empty_payload_is_rendered_400() {
        let request = lambda_http::http::Request::builder()
            .method("PUT")
            .body(Body::Empty)
            .unwrap();

        match extract_request::<KeyRequest>(request) {
            Err(Error::HttpError(response)) => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
                assert!(response.body().contains("empty"));
            }
            other => panic!("expected rendered 400, got {:?}", other),
        }
    }

    #[test]
    fn malformed_payload_is_rendered_400() {
        let request = json_request(r#"{"id": }"#);
        match extract_request::<KeyRequest>(request) {
            Err(Error::HttpError(response)) => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST)
            }
            other => panic!("expected rendered 400, got {:?}", other),
        }
    }
}
