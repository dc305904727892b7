pub mod config;
pub mod counters;
pub mod entities;
pub mod error;
pub mod extract;
pub mod funding;
pub mod jobs;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};
use reqwest::Client;
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, RateLimit};
use crate::routes::{
    auth, blog, cattle, contacts, dashboard, investments, investors, orders, projects, uploads,
};
use crate::services::{
    storage::MAX_UPLOAD_BYTES, AuthProvider, Mailer, ObjectStore, ResendMailer, SupabaseAuth,
    SupabaseStorage,
};

/// Shared handler state. The delegated services sit behind trait objects.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
    pub auth: Arc<dyn AuthProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the production clients for the auth, storage and email services.
    pub fn from_config(db: DatabaseConnection, config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let auth = SupabaseAuth::new(
            client.clone(),
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.supabase_service_role_key,
        );
        let storage = SupabaseStorage::new(
            client.clone(),
            &config.supabase_url,
            &config.supabase_service_role_key,
            &config.storage_bucket,
        );
        let mailer = ResendMailer::new(client, config.resend_api_key.clone(), &config.mail_from);

        Ok(Self {
            db,
            mailer: Arc::new(mailer),
            auth: Arc::new(auth),
            storage: Arc::new(storage),
            config: Arc::new(config),
        })
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cattlefund API",
        version = "0.1.0",
        description = "Livestock sales and investment crowdfunding"
    ),
    modifiers(&BearerAuth),
    paths(
        health_check,
        dashboard::site_stats,
        dashboard::admin_dashboard,
        cattle::list_cattle,
        cattle::get_cattle,
        cattle::related_cattle,
        cattle::admin_list_cattle,
        cattle::create_cattle,
        cattle::update_cattle,
        cattle::delete_cattle,
        orders::place_order,
        orders::admin_list_orders,
        orders::update_order_status,
        projects::list_projects,
        projects::get_project,
        projects::record_project_view,
        projects::admin_list_projects,
        projects::create_project,
        projects::update_project,
        projects::delete_project,
        investments::submit_investment,
        investments::admin_list_investments,
        investments::create_investment,
        investments::update_investment,
        investments::delete_investment,
        investments::set_investment_status,
        investments::approve_investment,
        investments::reject_investment,
        auth::signup,
        auth::login,
        auth::change_password,
        investors::my_profile,
        investors::admin_list_investors,
        investors::create_investor,
        investors::update_investor,
        investors::delete_investor,
        contacts::submit_contact,
        contacts::admin_list_contacts,
        contacts::reply_to_contact,
        blog::list_posts,
        blog::get_post,
        blog::record_post_view,
        blog::admin_list_posts,
        blog::create_post,
        blog::update_post,
        blog::delete_post,
        uploads::upload_image
    ),
    components(schemas(
        routes::ActionResponse,
        cattle::CattleInput,
        orders::OrderRequest,
        orders::OrderStatusRequest,
        orders::OrderWithCattle,
        projects::ProjectInput,
        projects::ProjectList,
        projects::ProjectDetail,
        investments::InvestmentRequest,
        investments::AdminInvestmentInput,
        investments::StatusRequest,
        investments::InvestmentWithProject,
        funding::StatusChange,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::PasswordChangeRequest,
        investors::InvestorDashboard,
        investors::OwnInvestment,
        investors::InvestorInput,
        investors::InvestorSummary,
        contacts::ContactRequest,
        contacts::ReplyRequest,
        blog::BlogPostInput,
        uploads::UploadResponse,
        dashboard::SiteStats,
        dashboard::RecentInvestment,
        dashboard::AdminDashboard
    )),
    tags(
        (name = "cattlefund", description = "Catalogue, funding projects and back office")
    )
)]
pub struct ApiDoc;

/// Public routes that create records. These are the only ones put behind the rate limiter.
fn public_write_routes() -> Router<AppState> {
    Router::new()
        .route("/cattle/{id}/orders", post(orders::place_order))
        .route("/investments", post(investments::submit_investment))
        .route("/contact", post(contacts::submit_contact))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

fn rate_limited(routes: Router<AppState>, limit: &RateLimit) -> Router<AppState> {
    let period_ms = (60_000 / u64::from(limit.per_minute.max(1))).max(1);
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .period(Duration::from_millis(period_ms))
        .burst_size(limit.burst.max(1))
        .finish();

    match governor_conf {
        Some(conf) => {
            tracing::info!(per_minute = limit.per_minute, burst = limit.burst, "rate limiting public write routes");
            routes.layer(GovernorLayer {
                config: Arc::new(conf),
            })
        }
        None => {
            tracing::warn!("invalid rate limit settings, rate limiting disabled");
            routes
        }
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(dashboard::site_stats))
        .route("/cattle", get(cattle::list_cattle))
        .route("/cattle/{id}", get(cattle::get_cattle))
        .route("/cattle/{id}/related", get(cattle::related_cattle))
        .route("/projects", get(projects::list_projects))
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}/views", post(projects::record_project_view))
        .route("/blog", get(blog::list_posts))
        .route("/blog/{slug}", get(blog::get_post))
        // The router needs one parameter name per segment; the handler reads the post id.
        .route("/blog/{slug}/views", post(blog::record_post_view))
        .route("/auth/password", post(auth::change_password))
        .route("/investor/profile", get(investors::my_profile))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::admin_dashboard))
        .route("/cattle", get(cattle::admin_list_cattle).post(cattle::create_cattle))
        .route("/cattle/{id}", put(cattle::update_cattle).delete(cattle::delete_cattle))
        .route("/projects", get(projects::admin_list_projects).post(projects::create_project))
        .route("/projects/{id}", put(projects::update_project).delete(projects::delete_project))
        .route(
            "/investments",
            get(investments::admin_list_investments).post(investments::create_investment),
        )
        .route(
            "/investments/{id}",
            put(investments::update_investment).delete(investments::delete_investment),
        )
        .route("/investments/{id}/status", patch(investments::set_investment_status))
        .route("/investments/{id}/approve", post(investments::approve_investment))
        .route("/investments/{id}/reject", post(investments::reject_investment))
        .route(
            "/investors",
            get(investors::admin_list_investors).post(investors::create_investor),
        )
        .route(
            "/investors/{id}",
            put(investors::update_investor).delete(investors::delete_investor),
        )
        .route("/contacts", get(contacts::admin_list_contacts))
        .route("/contacts/{id}/reply", post(contacts::reply_to_contact))
        .route("/orders", get(orders::admin_list_orders))
        .route("/orders/{id}/status", patch(orders::update_order_status))
        .route("/blog", get(blog::admin_list_posts).post(blog::create_post))
        .route("/blog/{id}", put(blog::update_post).delete(blog::delete_post))
        .route(
            "/uploads",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
}

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let writes = match state.config.rate_limit.as_ref() {
        Some(limit) => rate_limited(public_write_routes(), limit),
        None => public_write_routes(),
    };

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(public_routes())
        .merge(writes)
        .nest("/admin", admin_routes())
        .with_state(state)
        .merge(docs_router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
