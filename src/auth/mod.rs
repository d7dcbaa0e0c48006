// Authentication module
// JWT bearer authentication with registration, login, logout (token revocation)
// and role-based authorization

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod revocation;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, logout_handler, me_handler, register_handler};
pub use middleware::{authenticate, AuthenticatedUser, Authenticator, RequireRoles};
pub use models::{
    LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse, Role, User,
    UserResponse,
};
pub use password::PasswordService;
pub use repository::{PgUserRepository, UserRepository};
pub use revocation::{spawn_pruning_task, InMemoryRevocationStore, TokenRevocationStore};
pub use service::AuthService;
pub use token::TokenService;
