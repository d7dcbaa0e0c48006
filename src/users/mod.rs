// User administration endpoints, gated by role

pub mod handlers;

pub use handlers::{get_user_handler, update_role_handler, UpdateRoleRequest};
