//! Tab router: which views a session may pick, and which surface it sees.

use crate::session::Session;
use serde::Serialize;

/// A feature screen selectable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum View {
    ImageUploader,
    ListingMaker,
    ImageOptimizer,
    ListingOptimizer,
    KeywordExtractor,
    Configuration,
}

impl View {
    /// Views every authenticated user gets, in menu order.
    pub const BASE: [View; 5] = [
        View::ImageUploader,
        View::ListingMaker,
        View::ImageOptimizer,
        View::ListingOptimizer,
        View::KeywordExtractor,
    ];

    /// URL slug used in `/?view=` and the submission routes.
    pub fn slug(self) -> &'static str {
        match self {
            View::ImageUploader => "image-uploader",
            View::ListingMaker => "listing-maker",
            View::ImageOptimizer => "image-optimizer",
            View::ListingOptimizer => "listing-optimizer",
            View::KeywordExtractor => "keyword-extractor",
            View::Configuration => "configuration",
        }
    }

    /// Sidebar label.
    pub fn title(self) -> &'static str {
        match self {
            View::ImageUploader => "🖼️ Image Uploader",
            View::ListingMaker => "📝 Listing Maker",
            View::ImageOptimizer => "✨ Image Optimizer",
            View::ListingOptimizer => "📈 Listing Optimizer",
            View::KeywordExtractor => "🔍 Key Word Extractor",
            View::Configuration => "🔧 Configuration (Admin)",
        }
    }

    pub fn from_slug(slug: &str) -> Option<View> {
        View::BASE
            .into_iter()
            .chain(std::iter::once(View::Configuration))
            .find(|view| view.slug() == slug)
    }
}

/// The menu for `session`: the base views, plus `Configuration` last for admins.
///
/// # Arguments
/// * `session` - The caller's session
///
/// # Returns
/// * `Vec<View>` - Views in sidebar order
pub fn build_menu(session: &Session) -> Vec<View> {
    let mut menu = View::BASE.to_vec();
    if session.is_admin() {
        menu.push(View::Configuration);
    }
    menu
}

/// Top-level surface a session may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Only the login form
    Login,
    /// Menu, dispatched view and logout
    Workspace,
}

/// Decide which surface a session may see.
///
/// # Arguments
/// * `session` - The caller's session
///
/// # Returns
/// * `Surface::Workspace` - When the session is authenticated
/// * `Surface::Login` - Otherwise
pub fn require_auth(session: &Session) -> Surface {
    if session.is_authenticated() {
        Surface::Workspace
    } else {
        Surface::Login
    }
}

/// Render the selected view, or nothing when no view is selected.
#[cfg(feature = "web")]
pub fn dispatch(
    selected: Option<View>,
    session: &Session,
    ctx: &crate::views::ViewContext<'_>,
) -> Result<Option<String>, crate::error::AppError> {
    selected
        .map(|view| crate::views::render(view, session, ctx))
        .transpose()
}
