use crate::core::errors::{AppError, AppResult};

const SERVICE: &str = "docsight";
const ACCOUNT: &str = "session";

fn entry() -> AppResult<keyring::Entry> {
    keyring::Entry::new(SERVICE, ACCOUNT).map_err(|err| AppError::Internal(err.to_string()))
}

pub fn set_session_token(token: &str) -> AppResult<()> {
    if token.trim().is_empty() {
        return Err(AppError::InvalidInput("session token cannot be empty".to_string()));
    }
    entry()?
        .set_password(token.trim())
        .map_err(|err| AppError::Internal(err.to_string()))
}

pub fn get_session_token() -> AppResult<String> {
    entry()?.get_password().map_err(|_err| AppError::Authentication)
}

pub fn clear_session_token() -> AppResult<()> {
    match entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(AppError::Internal(err.to_string())),
    }
}
