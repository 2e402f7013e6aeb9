//! Basic authentication against a single configured account.
//!
//! The password is configured only as an argon2 PHC string. Any failed check
//! is a bare [`ApiError::Unauthorized`]; the reason goes to the debug log.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use lakeline_core::store::CatalogStore;

use crate::{AppState, error::ApiError};

/// The account requests must authenticate as.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  pub password_hash: String,
}

/// Extracting this succeeds only for an authenticated request. Holds the
/// caller's username.
pub struct Authenticated(pub String);

/// Decode `Authorization: Basic <base64(user:password)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let text = String::from_utf8(decoded).ok()?;
  let (user, password) = text.split_once(':')?;
  Some((user.to_owned(), password.to_owned()))
}

/// Authenticate the request headers, returning the username.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<String, ApiError> {
  let (username, password) = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;
  if username != config.username {
    tracing::debug!(%username, "rejected credentials for unknown user");
    return Err(ApiError::Unauthorized);
  }

  let Ok(hash) = PasswordHash::new(&config.password_hash) else {
    tracing::error!("auth_password_hash is not a valid PHC string; every login will fail");
    return Err(ApiError::Unauthorized);
  };
  if Argon2::default()
    .verify_password(password.as_bytes(), &hash)
    .is_err()
  {
    tracing::debug!(%username, "rejected password");
    return Err(ApiError::Unauthorized);
  }
  Ok(username)
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: CatalogStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig {
      username:      "user".to_string(),
      password_hash: hash,
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    let user = verify_auth(&headers(&basic("user", "secret")), &cfg).unwrap();
    assert_eq!(user, "user");
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("user", "wrong")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn wrong_user() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("admin", "secret")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(verify_auth(&HeaderMap::new(), &cfg), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn password_may_contain_colons() {
    let cfg = config("a:b");
    assert!(verify_auth(&headers(&basic("user", "a:b")), &cfg).is_ok());
  }

  #[test]
  fn bearer_scheme_is_rejected() {
    let cfg = config("secret");
    let res = verify_auth(&headers("Bearer abc"), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }
}
