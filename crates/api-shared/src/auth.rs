use http::header::AUTHORIZATION;
use http::HeaderMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header is not a bearer token")]
    Malformed,
}

/// Extracts the bearer token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; the token must be non-empty.
///
/// # Errors
///
/// Returns [`AuthError::Missing`] if there is no header, and [`AuthError::Malformed`] if it is
/// not valid ASCII, uses another scheme, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(&headers("bearer xyz")), Ok("xyz"));
    }

    #[test]
    fn rejects_missing_and_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::Missing));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer ")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::Malformed));
    }
}
