use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use std::fmt;

use crate::repository::RepositoryError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    InternalServerError(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(msg) => {
                HttpResponse::NotFound().json(ErrorResponse { error: msg.clone() })
            }
            AppError::BadRequest(msg) => {
                HttpResponse::BadRequest().json(ErrorResponse { error: msg.clone() })
            }
            AppError::Conflict(msg) => {
                HttpResponse::Conflict().json(ErrorResponse { error: msg.clone() })
            }
            AppError::InternalServerError(msg) => {
                HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() })
            }
            AppError::DatabaseError(msg) => {
                HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() })
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RepositoryError::MissingRequiredField(_) => AppError::BadRequest(err.to_string()),
            RepositoryError::DuplicateKey(_) => AppError::Conflict(err.to_string()),
            RepositoryError::AmbiguousResult(_) => {
                error!("primary-key invariant violated: {}", err);
                AppError::InternalServerError(err.to_string())
            }
            RepositoryError::Storage(_) => {
                error!("storage round trip failed: {}", err);
                AppError::DatabaseError(err.to_string())
            }
        }
    }
}
