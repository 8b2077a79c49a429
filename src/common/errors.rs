use lambda_http::{Error as LambdaError, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A response already rendered for the client. The service loop
    /// unwraps this into an Ok response instead of failing the invocation.
    #[error("request rejected with status {}", .0.status())]
    HttpError(Response<String>),
    #[error(transparent)]
    LambdaError(#[from] LambdaError),
}

impl From<lambda_http::http::Error> for Error {
    fn from(err: lambda_http::http::Error) -> Self {
        Error::LambdaError(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::LambdaError(err.into())
    }
}
