use tracing::{info, warn};

use crate::error::AuthError;
use crate::gateway::{Envelope, TodoGateway};
use crate::models::{Credentials, Registration};

const LOGIN_FALLBACK: &str = "An unexpected error occurred!";
const REGISTER_FALLBACK: &str = "An error occurred during sign up.";

/// Authenticates against the gateway. On success the session lives in the gateway's client.
pub async fn login<G: TodoGateway + ?Sized>(gateway: &G, credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.email.is_empty() {
        return Err(AuthError::Invalid("Email is required".into()));
    }
    if credentials.password.is_empty() {
        return Err(AuthError::Invalid("Password is required".into()));
    }

    let envelope = gateway.login(credentials).await;
    if envelope.success {
        info!(email = %credentials.email, "logged in");
        return Ok(());
    }
    Err(rejection(&envelope, LOGIN_FALLBACK))
}

/// Creates an account. `confirm_password` must match before anything is sent.
pub async fn register<G: TodoGateway + ?Sized>(
    gateway: &G,
    registration: &Registration,
    confirm_password: &str,
) -> Result<(), AuthError> {
    if registration.name.is_empty() {
        return Err(AuthError::Invalid("Username is required".into()));
    }
    if registration.email.is_empty() {
        return Err(AuthError::Invalid("Email is required".into()));
    }
    if registration.password.is_empty() {
        return Err(AuthError::Invalid("Password is required".into()));
    }
    if confirm_password.is_empty() {
        return Err(AuthError::Invalid("Please confirm your password".into()));
    }
    if confirm_password != registration.password {
        return Err(AuthError::Invalid("Passwords do not match".into()));
    }

    let envelope = gateway.register(registration).await;
    if envelope.success {
        info!(email = %registration.email, "account registered");
        return Ok(());
    }
    Err(rejection(&envelope, REGISTER_FALLBACK))
}

fn rejection(envelope: &Envelope, fallback: &str) -> AuthError {
    let message = envelope
        .error_message()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    warn!(status = ?envelope.status, %message, "authentication rejected");
    AuthError::Rejected(message)
}
