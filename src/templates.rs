#![cfg(feature = "web")]
//! Handlebars templates compiled into the binary.

use crate::error::AppError;
use handlebars::Handlebars;
use serde::Serialize;

pub const LAYOUT: &str = "layout";
pub const LOGIN: &str = "login";
pub const WORKSPACE: &str = "workspace";
pub const IMAGE_UPLOADER: &str = "image_uploader";
pub const LISTING_MAKER: &str = "listing_maker";
pub const IMAGE_OPTIMIZER: &str = "image_optimizer";
pub const LISTING_OPTIMIZER: &str = "listing_optimizer";
pub const KEYWORD_EXTRACTOR: &str = "keyword_extractor";
pub const CONFIGURATION: &str = "configuration";
pub const ACCESS_DENIED: &str = "access_denied";

const TEMPLATES: [(&str, &str); 10] = [
    (LAYOUT, include_str!("../templates/layout.hbs")),
    (LOGIN, include_str!("../templates/login.hbs")),
    (WORKSPACE, include_str!("../templates/workspace.hbs")),
    (IMAGE_UPLOADER, include_str!("../templates/image_uploader.hbs")),
    (LISTING_MAKER, include_str!("../templates/listing_maker.hbs")),
    (IMAGE_OPTIMIZER, include_str!("../templates/image_optimizer.hbs")),
    (LISTING_OPTIMIZER, include_str!("../templates/listing_optimizer.hbs")),
    (KEYWORD_EXTRACTOR, include_str!("../templates/keyword_extractor.hbs")),
    (CONFIGURATION, include_str!("../templates/configuration.hbs")),
    (ACCESS_DENIED, include_str!("../templates/access_denied.hbs")),
];

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown inline in a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Serialize)]
struct LayoutData<'a> {
    body: &'a str,
}

/// Registry of every page and fragment template.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.register_partial("notices", include_str!("../templates/notices.hbs"))?;
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    /// Render one template to an HTML fragment.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, AppError> {
        Ok(self.registry.render(name, data)?)
    }

    /// Wrap a fragment in the full HTML document.
    pub fn document(&self, body: &str) -> Result<String, AppError> {
        self.render(LAYOUT, &LayoutData { body })
    }
}
