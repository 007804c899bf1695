//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use courier_domain::CourierError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CourierError);

impl From<InfraError> for CourierError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CourierError> for InfraError {
    fn from(value: CourierError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCourierError {
    fn into_courier(self) -> CourierError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for HttpError {
    fn into_courier(self) -> CourierError {
        if self.is_builder() {
            return CourierError::Configuration(format!("failed to build request: {self}"));
        }

        if self.is_timeout() {
            return CourierError::Transport(format!("request timed out: {self}"));
        }

        if self.is_connect() {
            return CourierError::Transport(format!("connection failed: {self}"));
        }

        // Request, redirect, body and decode failures all mean the exchange
        // broke off mid-flight.
        CourierError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for IoError {
    fn into_courier(self) -> CourierError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => CourierError::Configuration(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                CourierError::Configuration(format!("permission denied: {self}"))
            }
            _ => CourierError::SinkWrite(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* Config parsing errors → CourierError */
/* -------------------------------------------------------------------------- */

impl IntoCourierError for JsonError {
    fn into_courier(self) -> CourierError {
        CourierError::Configuration(format!("Invalid JSON format: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_courier())
    }
}

impl IntoCourierError for TomlError {
    fn into_courier(self) -> CourierError {
        CourierError::Configuration(format!("Invalid TOML format: {self}"))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_courier())
    }
}

impl IntoCourierError for UrlError {
    fn into_courier(self) -> CourierError {
        CourierError::Configuration(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_courier())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
