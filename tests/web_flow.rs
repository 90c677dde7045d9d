//! End-to-end checks of the session gate and tab router over HTTP.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use sellerdesk::AppConfig;
use sellerdesk::app::{AppState, build_router};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "sellerdesk-test-boundary";

fn app() -> Router {
    app_with_state(AppConfig::default()).0
}

fn app_with_state(config: AppConfig) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).unwrap());
    (build_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_multipart(uri: &str, parts: &[(&str, Option<&str>, &[u8])], cookie: &str) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 160, 90]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Log in and return the `Cookie` header value for the new session.
async fn login(app: &Router, user_id: &str, password: &str) -> String {
    let response = send(
        app,
        post_form(
            "/login",
            &format!("user_id={}&password={}", user_id, password),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let pair = set_cookie.split(';').next().unwrap().trim().to_string();
    assert!(pair.starts_with("session="));
    pair
}

#[tokio::test]
async fn test_logged_out_home_shows_login_form() {
    let app = app();
    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Login Interface"));
    assert!(html.contains(r#"action="/login""#));
    assert!(!html.contains("Navigation"));
}

#[tokio::test]
async fn test_selected_view_is_ignored_while_logged_out() {
    let app = app();
    let html = body_text(send(&app, get("/?view=configuration", None)).await).await;
    assert!(html.contains("Login Interface"));
    assert!(!html.contains("Configuration"));
}

#[tokio::test]
async fn test_invalid_login_shows_error_without_session() {
    let app = app();
    let response = send(&app, post_form("/login", "user_id=User&password=wrong", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Invalid User ID or Password"));
    assert!(!html.contains("wrong"));
}

#[tokio::test]
async fn test_admin_sees_configuration_in_menu() {
    let app = app();
    let cookie = login(&app, "Globalite", "LalitaYadav").await;

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Welcome, Globalite"));

    let positions: Vec<usize> = [
        "view=image-uploader",
        "view=listing-maker",
        "view=image-optimizer",
        "view=listing-optimizer",
        "view=keyword-extractor",
        "view=configuration",
    ]
    .iter()
    .map(|needle| html.find(needle).expect(needle))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let html = body_text(send(&app, get("/?view=configuration", Some(&cookie))).await).await;
    assert!(html.contains("You have full access."));
    assert!(html.contains("Sub User"));
}

#[tokio::test]
async fn test_sub_user_is_denied_configuration() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Welcome, User"));
    assert!(html.contains("view=keyword-extractor"));
    assert!(!html.contains("view=configuration"));

    let html = body_text(send(&app, get("/?view=configuration", Some(&cookie))).await).await;
    assert!(html.contains("Access Denied"));
    assert!(!html.contains("API Key Management"));
}

#[tokio::test]
async fn test_unknown_view_renders_no_content() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let html = body_text(send(&app, get("/?view=reports", Some(&cookie))).await).await;
    assert!(html.contains("Select a view from the navigation."));
}

#[tokio::test]
async fn test_logout_returns_to_login_and_is_idempotent() {
    let app = app();
    let cookie = login(&app, "Globalite", "LalitaYadav").await;

    for _ in 0..2 {
        let response = send(&app, post_form("/logout", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Login Interface"));

    // the same browser can log in again as someone else
    let response = send(
        &app,
        post_form("/login", "user_id=User&password=Kuber", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().trim().to_string();

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Welcome, User"));
    assert!(!html.contains("view=configuration"));
}

#[tokio::test]
async fn test_logout_releases_session_and_clears_cookie() {
    let (app, state) = app_with_state(AppConfig::default());

    for _ in 0..20 {
        let cookie = login(&app, "User", "Kuber").await;
        assert_eq!(state.sessions.len(), 1);

        let response = send(&app, post_form("/logout", "", Some(&cookie))).await;
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("session=;"));
        assert!(set_cookie.contains("Max-Age=0"));

        assert!(state.sessions.is_empty());
    }
}

#[tokio::test]
async fn test_login_while_logged_in_keeps_current_user() {
    let (app, state) = app_with_state(AppConfig::default());
    let cookie = login(&app, "User", "Kuber").await;

    let response = send(
        &app,
        post_form(
            "/login",
            "user_id=Globalite&password=LalitaYadav",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(state.sessions.len(), 1);

    let html = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Welcome, User"));
    assert!(!html.contains("view=configuration"));
}

#[tokio::test]
async fn test_oversized_bodies_are_rejected() {
    let config = AppConfig {
        max_upload_bytes: 1024,
        ..AppConfig::default()
    };
    let (app, _) = app_with_state(config);
    let cookie = login(&app, "User", "Kuber").await;

    let seed = format!("seed_phrase={}", "a".repeat(4096));
    let response = send(
        &app,
        post_form("/views/keyword-extractor", &seed, Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let png = png_bytes(64, 64);
    let padding = vec![b'x'; 4096];
    let response = send(
        &app,
        post_multipart(
            "/views/image-uploader",
            &[
                ("image", Some("big.png"), png.as_slice()),
                ("notes", None, padding.as_slice()),
            ],
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app();
    let admin = login(&app, "Globalite", "LalitaYadav").await;
    let user = login(&app, "User", "Kuber").await;
    assert_ne!(admin, user);

    send(&app, post_form("/logout", "", Some(&user))).await;

    let html = body_text(send(&app, get("/", Some(&admin))).await).await;
    assert!(html.contains("Welcome, Globalite"));
}

#[tokio::test]
async fn test_view_submissions_require_login() {
    let app = app();
    let response = send(
        &app,
        post_form("/views/keyword-extractor", "seed_phrase=mug", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let response = send(
        &app,
        post_form(
            "/views/keyword-extractor",
            "seed_phrase=mug",
            Some("session=not-a-real-session"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_text_views_render_results() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let html = body_text(
        send(
            &app,
            post_form("/views/keyword-extractor", "seed_phrase=yoga+mat", Some(&cookie)),
        )
        .await,
    )
    .await;
    assert!(html.contains("yoga mat for sale"));

    let html = body_text(
        send(
            &app,
            post_form(
                "/views/listing-optimizer",
                "listing_text=This+product+is+great",
                Some(&cookie),
            ),
        )
        .await,
    )
    .await;
    assert!(html.contains("This high-quality product listing is great"));

    let html = body_text(
        send(
            &app,
            post_form(
                "/views/listing-maker",
                "title=Mug&description=Ceramic&category=Home+Goods&price=7",
                Some(&cookie),
            ),
        )
        .await,
    )
    .await;
    assert!(html.contains("Generated Listing Preview"));
    assert!(html.contains("$7.00"));
}

#[tokio::test]
async fn test_image_uploader_accepts_png_and_reports_garbage() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let png = png_bytes(32, 16);
    let html = body_text(
        send(
            &app,
            post_multipart(
                "/views/image-uploader",
                &[("image", Some("item.png"), png.as_slice())],
                &cookie,
            ),
        )
        .await,
    )
    .await;
    assert!(html.contains("Image uploaded successfully!"));
    assert!(html.contains("data:image/png;base64,"));

    let html = body_text(
        send(
            &app,
            post_multipart(
                "/views/image-uploader",
                &[("image", Some("item.jpg"), b"garbage".as_slice())],
                &cookie,
            ),
        )
        .await,
    )
    .await;
    assert!(html.contains("Error loading image"));
}

#[tokio::test]
async fn test_image_optimizer_page_shows_new_size() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let png = png_bytes(400, 300);
    let response = send(
        &app,
        post_multipart(
            "/views/image-optimizer",
            &[
                ("image", Some("chair.png"), png.as_slice()),
                ("quality", None, b"70".as_slice()),
                ("max_width", None, b"200".as_slice()),
            ],
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Optimization Complete!"));
    assert!(html.contains("Size: 400x300"));
    assert!(html.contains("New Size: 200x150"));
    assert!(html.contains(r#"download="optimized_chair.png""#));
}

#[tokio::test]
async fn test_optimize_download_returns_resized_jpeg() {
    let app = app();
    let cookie = login(&app, "Globalite", "LalitaYadav").await;

    let png = png_bytes(1500, 1001);
    let response = send(
        &app,
        post_multipart(
            "/api/optimize",
            &[("image", Some("banner.png"), png.as_slice()), ("quality", None, b"85".as_slice())],
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"optimized_banner.png\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1000, 667));
}

#[tokio::test]
async fn test_optimize_download_rejects_bad_quality() {
    let app = app();
    let cookie = login(&app, "User", "Kuber").await;

    let png = png_bytes(10, 10);
    let response = send(
        &app,
        post_multipart(
            "/api/optimize",
            &[("image", Some("tiny.png"), png.as_slice()), ("quality", None, b"99".as_slice())],
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("between 10 and 95"));
}
