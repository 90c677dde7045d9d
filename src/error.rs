//! Error types shared across the crate.

use thiserror::Error;

/// Problems found while loading or validating the startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No credentials configured")]
    NoCredentials,

    #[error("Duplicate identifier in credential table: {0}")]
    DuplicateIdentifier(String),

    #[error("Exactly one admin identifier must be configured, found {0}")]
    AdminCount(usize),

    #[error("Failed to hash secret for {0}")]
    Hashing(String),
}

/// Errors raised by the image tools. All of them are shown to the user as a
/// notice inside the view that produced them.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Please choose an image to upload.")]
    Missing,

    #[error("Unsupported file type for {0}. Allowed types: jpg, jpeg, png")]
    UnsupportedType(String),

    #[error("Error loading image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Compression quality must be between 10 and 95, got {0}")]
    Quality(String),

    #[error("Max width must be a whole number of at least 100 px, got {0}")]
    MaxWidth(String),

    #[error("An error occurred during optimization: {0}")]
    Encode(#[source] image::ImageError),
}

#[cfg(feature = "web")]
pub use web::AppError;

#[cfg(feature = "web")]
mod web {
    use super::ConfigError;
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use thiserror::Error;

    /// Failures that abort a single request.
    #[derive(Error, Debug)]
    pub enum AppError {
        #[error("Configuration error: {0}")]
        Config(#[from] ConfigError),

        #[error("Template error: {0}")]
        TemplateSyntax(#[from] handlebars::TemplateError),

        #[error("Render error: {0}")]
        Render(#[from] handlebars::RenderError),

        #[error("Malformed upload: {0}")]
        Multipart(#[from] axum::extract::multipart::MultipartError),
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = match &self {
                AppError::Multipart(e) => e.status(),
                AppError::Config { .. }
                | AppError::TemplateSyntax { .. }
                | AppError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };

            log::error!("request failed: {}", self);
            (status, self.to_string()).into_response()
        }
    }
}
