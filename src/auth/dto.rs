use serde::Deserialize;

/// Fields of the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Fields of the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
