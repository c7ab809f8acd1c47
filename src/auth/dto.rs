use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

/// Token pair + user object returned by the remote auth endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signup responds with a nested session when email confirmation is off;
/// with confirmation on there is no session yet and the user must confirm
/// before logging in.
#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub session: Option<TokenPair>,
}
