pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod users;
pub mod validation;

use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    authenticate, login_handler, logout_handler, me_handler, register_handler, AuthError,
    AuthService, Authenticator, PasswordService, RequireRoles, Role, TokenRevocationStore,
    TokenService, UserRepository,
};
use config::{AppConfig, Environment};
use users::{get_user_handler, update_role_handler};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::logout_handler,
        auth::handlers::me_handler,
        users::handlers::get_user_handler,
        users::handlers::update_role_handler,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::RegisterRequest,
            auth::models::RegisterResponse,
            auth::models::LoginRequest,
            auth::models::LoginResponse,
            auth::models::LoginUser,
            auth::models::LogoutResponse,
            auth::models::UserResponse,
            users::handlers::UpdateRoleRequest,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "users", description = "Role-gated user administration")
    ),
    info(
        title = "Kudos Wall API",
        version = "1.0.0",
        description = "Peer-recognition backend: authentication and role-based authorization"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub authenticator: Arc<Authenticator>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Wire the auth core from configuration and its two stores
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn TokenRevocationStore>,
    ) -> Result<Self, AuthError> {
        let password_service = PasswordService::new(config.hashing)?;
        Ok(Self::with_services(
            users,
            revocations,
            password_service,
            Arc::new(TokenService::new(&config.jwt_secret)),
            config.bootstrap_admin_enabled(),
        ))
    }

    pub fn with_services(
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn TokenRevocationStore>,
        password_service: PasswordService,
        token_service: Arc<TokenService>,
        bootstrap_admin: bool,
    ) -> Self {
        let auth_service = AuthService::new(
            users.clone(),
            revocations.clone(),
            password_service,
            token_service.clone(),
            bootstrap_admin,
        );
        let authenticator = Authenticator::new(token_service, revocations, users.clone());

        Self {
            auth_service: Arc::new(auth_service),
            authenticator: Arc::new(authenticator),
            users,
        }
    }
}

/// Creates and configures the application router
///
/// Protected routes layer the role gate inside `authenticate`, so the gate always
/// sees the principal attached by authentication.
pub fn create_router(state: AppState, environment: Environment) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_layer = middleware::from_fn_with_state(state.authenticator.clone(), authenticate);

    let public = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler));

    let authenticated = Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route_layer(auth_layer.clone());

    let leads_gate = RequireRoles::new(&[Role::TechLead, Role::Admin]);
    let leads = Router::new()
        .route("/users/:id", get(get_user_handler))
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            leads_gate.clone().middleware(req, next)
        }))
        .route_layer(auth_layer.clone());

    let admin_gate = RequireRoles::admin();
    let admins = Router::new()
        .route("/users/:id/role", patch(update_role_handler))
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            admin_gate.clone().middleware(req, next)
        }))
        .route_layer(auth_layer);

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .merge(authenticated)
        .merge(leads)
        .merge(admins)
        .layer(cors)
        .with_state(state);

    if environment.is_development() {
        router.layer(middleware::from_fn(error::expose_internal_errors))
    } else {
        router
    }
}
