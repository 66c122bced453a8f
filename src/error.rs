use actix_web::{HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde_json::json;

use crate::butter::error::ButterError;
use crate::config::ConfigError;
use crate::notify::NotifyError;

#[derive(thiserror::Error, Debug)]
pub enum BusNotifyError {
    #[error("Transit data error: {0}")]
    Butter(#[from] ButterError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error response: {0} {1}")]
    Response(u16, String),
}

impl ResponseError for BusNotifyError {
    fn error_response(&self) -> actix_web::HttpResponse<actix_web::body::BoxBody> {
        match self {
            BusNotifyError::Response(_, message) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": message }))
            }
            BusNotifyError::Butter(e) => {
                log::error!("Upstream fetch failed: {}", e);
                HttpResponse::build(self.status_code()).json(json!({ "error": "fetch failed" }))
            }
            BusNotifyError::Notify(e) => {
                log::warn!("Trigger registration failed: {}", e);
                HttpResponse::build(self.status_code())
                    .json(json!({ "error": "registration failed" }))
            }
            other => {
                log::error!("{}", other);
                actix_web::HttpResponse::InternalServerError().finish()
            }
        }
    }

    fn status_code(&self) -> reqwest::StatusCode {
        match self {
            BusNotifyError::Response(status, _) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            BusNotifyError::Butter(_) | BusNotifyError::Notify(_) => StatusCode::BAD_GATEWAY,
            _ => reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type BusNotifyResult<T> = Result<T, BusNotifyError>;
