//! Response helpers. Successful bodies are the bare Read shapes; errors use `AppError`'s envelope.

use crate::export::Archive;
use axum::{
    http::{header, StatusCode},
    Json,
};
use serde::Serialize;

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub fn zip_attachment(archive: Archive) -> (StatusCode, [(header::HeaderName, String); 2], Vec<u8>) {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", archive.file_name),
            ),
        ],
        archive.bytes,
    )
}
