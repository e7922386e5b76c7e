pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::{LoginRequest, RegisterRequest};
pub use handlers::{login, register, AuthScreen, AuthView};
pub use repo_types::User;
pub use services::AuthError;
