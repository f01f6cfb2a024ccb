use serde::Serialize;

use crate::{core::errors::AppResult, security::keyring};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSessionTokenResponse {
    pub stored: bool,
}

pub fn login(token: &str) -> AppResult<SetSessionTokenResponse> {
    keyring::set_session_token(token)?;
    tracing::info!("session token stored");
    Ok(SetSessionTokenResponse { stored: true })
}

pub fn logout() -> AppResult<SetSessionTokenResponse> {
    keyring::clear_session_token()?;
    Ok(SetSessionTokenResponse { stored: false })
}
