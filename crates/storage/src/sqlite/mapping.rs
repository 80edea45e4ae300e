use quiz_core::model::{ProfileId, SessionId, Subject};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn profile_id_from_str(raw: &str) -> Result<ProfileId, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn session_id_from_str(raw: &str) -> Result<SessionId, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn subject_from_str(raw: &str) -> Result<Subject, StorageError> {
    raw.parse().map_err(ser)
}
