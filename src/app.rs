#![cfg(feature = "web")]
//! HTTP surface: routing, session cookies and the auth middleware.

use axum::{
    Extension, Form, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::credentials::{Account, Authenticator};
use crate::error::AppError;
use crate::router::{Surface, View, dispatch, require_auth};
use crate::session::{LoginOutcome, Session, SessionStore};
use crate::templates::{Notice, Pages};
use crate::tools::listing::ListingDraft;
use crate::tools::photo::Upload;
use crate::views::{self, KeywordForm, ListingOptimizerForm, OptimizerRequest, ViewContext};

/// Cookie holding the opaque session id
pub const SESSION_COOKIE: &str = "session";

/// State shared by all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub authenticator: Arc<dyn Authenticator>,
    pub accounts: Vec<Account>,
    pub sessions: SessionStore,
    pub pages: Pages,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(mut config: AppConfig) -> Result<Self, AppError> {
        let authenticator = config.authenticator()?;
        let accounts = authenticator.accounts();
        if config.hash_secrets {
            for entry in &mut config.credentials {
                entry.secret.clear();
            }
        }
        Ok(Self {
            config,
            authenticator,
            accounts,
            sessions: SessionStore::new(),
            pages: Pages::new()?,
            started_at: Utc::now(),
        })
    }

    fn view_context(&self) -> ViewContext<'_> {
        ViewContext {
            pages: &self.pages,
            accounts: &self.accounts,
            started_at: self.started_at,
        }
    }

    /// The session behind the request's cookie, or a fresh one.
    fn session_for(&self, jar: &CookieJar) -> Session {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| self.sessions.get(cookie.value()))
            .unwrap_or_default()
    }
}

/// The caller's session, placed in request extensions by [`auth_gate`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub session: Session,
}

/// Build the application router.
///
/// The `/views/*` and `/api/optimize` routes sit behind [`auth_gate`];
/// `/`, `/login`, `/logout` and `/static` are public.
///
/// # Arguments
/// * `state` - Shared application state
///
/// # Returns
/// * `Router` - The complete router with body limit and request logging
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/views/image-uploader", post(submit_image_uploader))
        .route("/views/listing-maker", post(submit_listing_maker))
        .route("/views/image-optimizer", post(submit_image_optimizer))
        .route("/views/listing-optimizer", post(submit_listing_optimizer))
        .route("/views/keyword-extractor", post(submit_keyword_extractor))
        .route("/api/optimize", post(download_optimized))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_gate));

    Router::new()
        .route("/", get(home))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .merge(protected)
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start the web server
///
/// # Arguments
/// * `config` - Validated startup configuration
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Only returns on a bind or
///   serve failure
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Authentication middleware.
///
/// Lets the request through only for an authenticated session; everything
/// else goes back to the login page.
async fn auth_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.sessions.get(cookie.value()) {
            if require_auth(&session) == Surface::Workspace {
                request.extensions_mut().insert(CurrentSession {
                    id: cookie.value().to_string(),
                    session,
                });
                return next.run(request).await;
            }
        }
    }

    Redirect::to("/").into_response()
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    view: Option<String>,
}

/// Login form when logged out, otherwise the workspace with the selected view.
async fn home(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, AppError> {
    let session = state.session_for(&jar);

    match require_auth(&session) {
        Surface::Login => Ok(Html(views::login_page(&state.pages, "", &[])?)),
        Surface::Workspace => {
            let selected = query.view.as_deref().and_then(View::from_slug);
            let content = dispatch(selected, &session, &state.view_context())?;
            Ok(Html(views::workspace_page(
                &state.pages,
                &session,
                selected,
                content,
            )?))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    password: String,
}

/// Handle login form submissions.
///
/// A new session is only stored once a login succeeds. An already
/// authenticated session is redirected without re-checking credentials.
///
/// # Arguments
/// * `state` - Shared state with the authenticator and session store
/// * `jar` - Cookie jar containing the session cookie, if any
/// * `form` - Submitted `user_id` and `password`
///
/// # Returns
/// * `Response` - A redirect to `/` setting the session cookie on success,
///   or the login page with status 401 on failure
async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| state.sessions.contains(id));
    let auth = state.authenticator.as_ref();

    let (outcome, session_id) = match existing {
        Some(id) => {
            if state.sessions.get(&id).is_some_and(|s| s.is_authenticated()) {
                return Ok(Redirect::to("/").into_response());
            }
            let outcome = state
                .sessions
                .update(&id, |session| session.login(auth, &form.user_id, &form.password))
                .unwrap_or(LoginOutcome::InvalidCredentials);
            (outcome, Some(id))
        }
        None => {
            let mut session = Session::new();
            match session.login(auth, &form.user_id, &form.password) {
                LoginOutcome::Success => {
                    (LoginOutcome::Success, Some(state.sessions.insert(session)))
                }
                LoginOutcome::InvalidCredentials => (LoginOutcome::InvalidCredentials, None),
            }
        }
    };

    match (outcome, session_id) {
        (LoginOutcome::Success, Some(session_id)) => {
            let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
            cookie.set_path("/");
            cookie.set_http_only(true);
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        _ => {
            let page = views::login_page(
                &state.pages,
                &form.user_id,
                &[Notice::error("Invalid User ID or Password")],
            )?;
            Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response())
        }
    }
}

/// Handle user logout
///
/// Drops the caller's session from the store, clears the session cookie and
/// redirects to the login page. Logging out without a session is a no-op.
///
/// # Arguments
/// * `state` - Shared state holding the session store
/// * `jar` - Cookie jar containing the session cookie
///
/// # Returns
/// * `(CookieJar, Redirect)` - Cookie jar with the session cookie removed and
///   a redirect to `/`
async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(mut session) = state.sessions.remove(cookie.value()) {
            session.logout();
        }
    }

    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Redirect::to("/"))
}

fn workspace_response(
    state: &AppState,
    current: &CurrentSession,
    view: View,
    content: String,
) -> Result<Html<String>, AppError> {
    Ok(Html(views::workspace_page(
        &state.pages,
        &current.session,
        Some(view),
        Some(content),
    )?))
}

/// Multipart fields of the upload forms.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Upload>,
    quality: Option<String>,
    max_width: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?.to_vec();
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.image = Some(Upload::new(file_name, bytes));
                }
            }
            "quality" => form.quality = Some(field.text().await?),
            "max_width" => form.max_width = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn submit_image_uploader(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = read_upload_form(multipart).await?;
    let upload = form.image.unwrap_or_else(|| Upload::new("", Vec::new()));
    let content = views::image_uploader(&state.pages, Some(&upload))?;
    workspace_response(&state, &current, View::ImageUploader, content)
}

async fn submit_listing_maker(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Form(draft): Form<ListingDraft>,
) -> Result<Html<String>, AppError> {
    let content = views::listing_maker(&state.pages, Some(&draft))?;
    workspace_response(&state, &current, View::ListingMaker, content)
}

async fn submit_image_optimizer(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = read_upload_form(multipart).await?;
    let request = OptimizerRequest {
        upload: form.image,
        quality: form.quality,
        max_width: form.max_width,
    };
    let content = views::image_optimizer(&state.pages, Some(&request))?;
    workspace_response(&state, &current, View::ImageOptimizer, content)
}

async fn submit_listing_optimizer(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Form(form): Form<ListingOptimizerForm>,
) -> Result<Html<String>, AppError> {
    let content = views::listing_optimizer(&state.pages, Some(&form.listing_text))?;
    workspace_response(&state, &current, View::ListingOptimizer, content)
}

async fn submit_keyword_extractor(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    Form(form): Form<KeywordForm>,
) -> Result<Html<String>, AppError> {
    let content = views::keyword_extractor(&state.pages, Some(&form.seed_phrase))?;
    workspace_response(&state, &current, View::KeywordExtractor, content)
}

/// Return the optimized JPEG as a file download.
///
/// # Arguments
/// * `current` - The authenticated caller
/// * `multipart` - The `image`, `quality` and `max_width` fields
///
/// # Returns
/// * `Response` - The JPEG as an attachment named `optimized_{name}`, or
///   status 422 with the reason the image could not be optimized
async fn download_optimized(
    Extension(current): Extension<CurrentSession>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_upload_form(multipart).await?;
    let request = OptimizerRequest {
        upload: form.image,
        quality: form.quality,
        max_width: form.max_width,
    };

    let optimized = match request.run() {
        Ok(optimized) => optimized,
        Err(e) => {
            log::warn!("optimization for {} failed: {}", current.id, e);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response());
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        optimized.file_name.replace(['"', '\\'], "_"),
        urlencoding::encode(&optimized.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(optimized.bytes),
    )
        .into_response())
}
