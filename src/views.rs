#![cfg(feature = "web")]
//! Page rendering: the login form, the workspace shell and one renderer per
//! [`View`].

use crate::credentials::Account;
use crate::error::{AppError, ImageError};
use crate::router::{View, build_menu};
use crate::session::Session;
use crate::templates::{self, Notice, Pages};
use crate::tools::keywords;
use crate::tools::listing::{self, Category, ListingDraft};
use crate::tools::photo::{self, OptimizeSettings, OptimizedImage, Upload};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Read-only inputs every renderer may need.
pub struct ViewContext<'a> {
    pub pages: &'a Pages,
    pub accounts: &'a [Account],
    pub started_at: DateTime<Utc>,
}

/// Render `view` with empty inputs.
///
/// Every variant maps to exactly one renderer.
pub fn render(view: View, session: &Session, ctx: &ViewContext<'_>) -> Result<String, AppError> {
    match view {
        View::ImageUploader => image_uploader(ctx.pages, None),
        View::ListingMaker => listing_maker(ctx.pages, None),
        View::ImageOptimizer => image_optimizer(ctx.pages, None),
        View::ListingOptimizer => listing_optimizer(ctx.pages, None),
        View::KeywordExtractor => keyword_extractor(ctx.pages, None),
        View::Configuration => configuration(session, ctx),
    }
}

#[derive(Serialize)]
struct MenuItem {
    slug: &'static str,
    title: &'static str,
    active: bool,
}

/// Login page, optionally with a failed attempt's identifier and notices.
///
/// # Arguments
/// * `pages` - Template registry
/// * `user_id` - Identifier to pre-fill, empty for a blank form
/// * `notices` - Messages shown above the form
///
/// # Returns
/// * `Result<String, AppError>` - The full HTML document
pub fn login_page(pages: &Pages, user_id: &str, notices: &[Notice]) -> Result<String, AppError> {
    let body = pages.render(
        templates::LOGIN,
        &json!({ "user_id": user_id, "notices": notices }),
    )?;
    pages.document(&body)
}

/// Sidebar, menu and the selected view's content inside the full document.
pub fn workspace_page(
    pages: &Pages,
    session: &Session,
    selected: Option<View>,
    content: Option<String>,
) -> Result<String, AppError> {
    let menu: Vec<MenuItem> = build_menu(session)
        .into_iter()
        .map(|view| MenuItem {
            slug: view.slug(),
            title: view.title(),
            active: Some(view) == selected,
        })
        .collect();

    let body = pages.render(
        templates::WORKSPACE,
        &json!({
            "username": session.username().unwrap_or_default(),
            "menu": menu,
            "content": content,
        }),
    )?;
    pages.document(&body)
}

fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Image Uploader view
///
/// Shows the upload form, and for a submitted file either an inline preview
/// with its size or the reason it could not be loaded.
///
/// # Arguments
/// * `pages` - Template registry
/// * `upload` - The submitted file, `None` when the view is only opened
///
/// # Returns
/// * `Result<String, AppError>` - The rendered HTML fragment
pub fn image_uploader(pages: &Pages, upload: Option<&Upload>) -> Result<String, AppError> {
    let mut notices = Vec::new();
    let mut preview = None;

    if let Some(upload) = upload {
        match photo::decode_upload(upload) {
            Ok(decoded) => {
                preview = Some(data_uri(decoded.mime_type(), &upload.bytes));
                notices.push(Notice::success(format!(
                    "Image uploaded successfully! Original size: {:.2} MB",
                    upload.size_mb()
                )));
            }
            Err(e) => notices.push(Notice::error(e.to_string())),
        }
    }

    pages.render(
        templates::IMAGE_UPLOADER,
        &json!({ "preview": preview, "notices": notices }),
    )
}

#[derive(Serialize)]
struct CategoryOption {
    label: &'static str,
    selected: bool,
}

/// Listing Maker view
///
/// Re-renders the submitted draft in the form and, when the title and price
/// are valid, the generated listing preview.
///
/// # Arguments
/// * `pages` - Template registry
/// * `draft` - The submitted form, `None` when the view is only opened
///
/// # Returns
/// * `Result<String, AppError>` - The rendered HTML fragment
pub fn listing_maker(pages: &Pages, draft: Option<&ListingDraft>) -> Result<String, AppError> {
    let empty = ListingDraft::default();
    let current = draft.unwrap_or(&empty);

    let chosen = Category::from_label(&current.category).unwrap_or(Category::Electronics);
    let categories: Vec<CategoryOption> = Category::ALL
        .into_iter()
        .map(|c| CategoryOption {
            label: c.label(),
            selected: c == chosen,
        })
        .collect();

    let mut notices = Vec::new();
    let mut summary = None;
    if let Some(draft) = draft {
        match listing::summarize(draft) {
            Ok(s) => summary = Some(s),
            Err(issue) => notices.push(Notice::warning(issue.message())),
        }
    }

    let price = if current.price.is_empty() {
        format!("{:.2}", listing::MIN_PRICE)
    } else {
        current.price.clone()
    };

    pages.render(
        templates::LISTING_MAKER,
        &json!({
            "draft": current,
            "categories": categories,
            "price": price,
            "notices": notices,
            "summary": summary,
        }),
    )
}

/// Multipart fields of an optimizer submission.
#[derive(Debug, Default)]
pub struct OptimizerRequest {
    pub upload: Option<Upload>,
    pub quality: Option<String>,
    pub max_width: Option<String>,
}

impl OptimizerRequest {
    pub fn settings(&self) -> Result<OptimizeSettings, ImageError> {
        OptimizeSettings::parse(self.quality.as_deref(), self.max_width.as_deref())
    }

    /// Validate settings, then resize and recompress the upload.
    pub fn run(&self) -> Result<OptimizedImage, ImageError> {
        let settings = self.settings()?;
        let upload = self.upload.as_ref().ok_or(ImageError::Missing)?;
        photo::optimize(upload, settings)
    }
}

/// Image Optimizer view
///
/// # Arguments
/// * `pages` - Template registry
/// * `request` - The submitted upload and settings, `None` when the view is
///   only opened
///
/// # Returns
/// * `Result<String, AppError>` - The form, plus both previews and the new
///   size on success or an error notice on failure
pub fn image_optimizer(
    pages: &Pages,
    request: Option<&OptimizerRequest>,
) -> Result<String, AppError> {
    let settings = request
        .and_then(|r| r.settings().ok())
        .unwrap_or_default();

    let mut notices = Vec::new();
    let mut result = None;
    if let Some(request) = request {
        match request.run() {
            Ok(optimized) => {
                let original = request.upload.as_ref().map(|u| u.bytes.as_slice());
                let original_bytes = original.unwrap_or_default();
                notices.push(Notice::success("Optimization Complete!"));
                result = Some(json!({
                    "original_preview": data_uri(photo::sniff_mime_type(original_bytes), original_bytes),
                    "original_width": optimized.original_width,
                    "original_height": optimized.original_height,
                    "preview": data_uri("image/jpeg", &optimized.bytes),
                    "width": optimized.width,
                    "height": optimized.height,
                    "size_mb": format!("{:.2}", optimized.size_mb()),
                    "file_name": optimized.file_name,
                }));
            }
            Err(e) => notices.push(Notice::error(e.to_string())),
        }
    }

    pages.render(
        templates::IMAGE_OPTIMIZER,
        &json!({
            "min_quality": photo::MIN_QUALITY,
            "max_quality": photo::MAX_QUALITY,
            "quality": settings.quality(),
            "min_max_width": photo::MIN_MAX_WIDTH,
            "max_width": settings.max_width(),
            "notices": notices,
            "result": result,
        }),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingOptimizerForm {
    #[serde(default)]
    pub listing_text: String,
}

/// Listing Optimizer view
///
/// # Arguments
/// * `pages` - Template registry
/// * `listing_text` - The pasted listing, `None` when the view is only opened
///
/// # Returns
/// * `Result<String, AppError>` - The form and, for non-empty text, the
///   analysis results
pub fn listing_optimizer(pages: &Pages, listing_text: Option<&str>) -> Result<String, AppError> {
    let mut notices = Vec::new();
    let analysis = listing_text.and_then(listing::analyze);
    if listing_text.is_some() && analysis.is_none() {
        notices.push(Notice::warning("Please paste some listing text to analyze."));
    }

    pages.render(
        templates::LISTING_OPTIMIZER,
        &json!({
            "listing_text": listing_text.unwrap_or_default(),
            "notices": notices,
            "analysis": analysis,
        }),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordForm {
    #[serde(default)]
    pub seed_phrase: String,
}

/// Key Word Extractor view
///
/// # Arguments
/// * `pages` - Template registry
/// * `seed_phrase` - The submitted phrase, `None` when the view is only opened
///
/// # Returns
/// * `Result<String, AppError>` - The form and, for a non-empty phrase, the
///   keyword table
pub fn keyword_extractor(pages: &Pages, seed_phrase: Option<&str>) -> Result<String, AppError> {
    let mut notices = Vec::new();
    let rows = seed_phrase.and_then(keywords::extract);
    if seed_phrase.is_some() && rows.is_none() {
        notices.push(Notice::warning("Please enter a seed phrase."));
    }

    pages.render(
        templates::KEYWORD_EXTRACTOR,
        &json!({
            "seed_phrase": seed_phrase.unwrap_or_default(),
            "notices": notices,
            "keywords": rows,
        }),
    )
}

#[derive(Serialize)]
struct AccountRow<'a> {
    identifier: &'a str,
    role: &'static str,
}

/// Admin panel. Checks the admin flag itself, however the view was reached.
pub fn configuration(session: &Session, ctx: &ViewContext<'_>) -> Result<String, AppError> {
    let username = match session.username() {
        Some(username) if session.is_admin() => username,
        _ => return ctx.pages.render(templates::ACCESS_DENIED, &json!({})),
    };

    let accounts: Vec<AccountRow<'_>> = ctx
        .accounts
        .iter()
        .map(|a| AccountRow {
            identifier: &a.identifier,
            role: a.role(),
        })
        .collect();
    let system_log = format!(
        "{}: System started. User '{}' logged in.",
        ctx.started_at.format("%Y-%m-%d"),
        username
    );

    ctx.pages.render(
        templates::CONFIGURATION,
        &json!({
            "username": username,
            "accounts": accounts,
            "system_log": system_log,
        }),
    )
}
