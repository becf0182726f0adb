use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post},
    Router,
};
use shared::UserType;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{require_role, require_session};
use crate::state::AppState;

mod admin;
pub mod auth;
mod checkout;
mod client;
mod content;
mod health;
mod org;
pub mod upload;
mod volunteer;

/// Multipart bodies carry a file of up to 10MB plus form overhead
const UPLOAD_BODY_LIMIT: usize = upload::MAX_FILE_SIZE + 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/admin", admin_routes(&state))
        .nest("/client", client_routes(&state))
        .nest("/org", org_routes(&state))
        .nest("/volunteer", volunteer_routes(&state))
        .nest("/utils", utils_routes(&state))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Require a live session, and when `role` is set, that session's role
fn guarded(router: Router<AppState>, state: &AppState, role: Option<UserType>) -> Router<AppState> {
    let router = match role {
        Some(role) => router.route_layer(from_fn(move |req: Request, next: Next| {
            require_role(role, req, next)
        })),
        None => router,
    };
    router.route_layer(from_fn_with_state(state.clone(), require_session))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/admins", post(admin::create_admin))
        .route("/clients", get(admin::list_clients).post(admin::create_client))
        .route(
            "/clients/:id",
            get(admin::get_client)
                .patch(admin::update_client)
                .delete(admin::delete_client),
        )
        .route(
            "/organizations",
            get(admin::list_organizations).post(admin::create_organization),
        )
        .route(
            "/organizations/:id",
            get(admin::get_organization)
                .patch(admin::update_organization)
                .delete(admin::delete_organization),
        )
        .route("/volunteers", get(admin::list_volunteers).post(admin::create_volunteer))
        .route(
            "/volunteers/:id",
            get(admin::get_volunteer)
                .patch(admin::update_volunteer)
                .delete(admin::delete_volunteer),
        )
        .route("/videos", get(admin::list_videos).post(admin::create_video))
        .route(
            "/videos/:id",
            get(admin::get_video)
                .patch(admin::update_video)
                .delete(admin::delete_video),
        )
        .route("/videos/:id/status", post(admin::set_video_status))
        .route("/media", get(admin::list_media).post(admin::create_media))
        .route(
            "/media/:id",
            get(admin::get_media)
                .patch(admin::update_media)
                .delete(admin::delete_media),
        )
        .route(
            "/testimonials",
            get(admin::list_testimonials).post(admin::create_testimonial),
        )
        .route(
            "/testimonials/:id",
            get(admin::get_testimonial)
                .patch(admin::update_testimonial)
                .delete(admin::delete_testimonial),
        )
        .route("/comments", get(admin::list_comments))
        .route("/comments/:id", axum::routing::delete(admin::delete_comment))
        .route("/stats", get(admin::stats))
        .route("/vimeo/videos", get(admin::list_vimeo_videos));

    Router::new()
        .route("/login", post(auth::admin_login))
        .merge(guarded(protected, state, Some(UserType::Admin)))
}

fn client_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/profile", get(client::get_profile).patch(client::update_profile))
        .route("/videos", get(client::list_videos))
        .route("/videos/:id", get(client::get_video))
        .route("/comments", post(client::create_comment))
        .route("/subscription", get(client::subscription));
    guarded(routes, state, Some(UserType::Client))
}

fn org_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/profile", get(org::get_profile).patch(org::update_profile))
        .route("/clients", get(org::list_clients).post(org::create_client));
    guarded(routes, state, Some(UserType::Organization))
}

fn volunteer_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/profile", get(volunteer::get_profile).patch(volunteer::update_profile))
        .route("/videos", get(volunteer::list_videos))
        .route("/videos/upload", post(volunteer::create_upload))
        .route(
            "/videos/:id/thumbnail",
            post(volunteer::upload_thumbnail).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );
    guarded(routes, state, Some(UserType::Volunteer))
}

fn utils_routes(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    Router::new()
        .route("/health", get(health::health_check))
        // Login
        .route("/otp/request", post(auth::otp_request))
        .route("/otp/verify", post(auth::otp_verify))
        // Payments
        .route("/verify-checkout", post(checkout::verify_checkout))
        .route("/signup/checkout", post(checkout::signup_checkout))
        .route("/signup/complete", post(checkout::signup_complete))
        // Public content
        .route("/testimonials", get(content::list_testimonials))
        .route("/media", get(content::list_media))
        .route("/comments", get(content::list_comments))
        .merge(guarded(authenticated, state, None))
}
