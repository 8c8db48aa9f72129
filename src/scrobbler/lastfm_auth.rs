// Last.fm web authorization
// auth.getToken -> user approves on last.fm -> auth.getSession

use super::lastfm::{LastFm, LastFmError};
use super::traits::{Session, WebAuth, WebAuthRequest};
use serde::Deserialize;

const AUTH_PAGE: &str = "https://www.last.fm/api/auth/";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: SessionBody,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    name: String,
    key: String,
}

/// Page where the user grants access to `token`
pub fn auth_url(api_key: &str, token: &str) -> String {
    format!("{}?api_key={}&token={}", AUTH_PAGE, api_key, token)
}

impl WebAuth for LastFm {
    fn web_auth_request(&self) -> Result<WebAuthRequest, LastFmError> {
        let response: TokenResponse = self.call("auth.getToken", &[], true)?;
        Ok(WebAuthRequest {
            url: auth_url(self.api_key(), &response.token),
            token: response.token,
        })
    }

    fn session_from_token(&self, request: &WebAuthRequest) -> Result<Session, LastFmError> {
        let response: SessionResponse =
            self.call("auth.getSession", &[("token", request.token.as_str())], true)?;
        Ok(Session {
            name: response.session.name,
            key: response.session.key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrobbler::lastfm::parse_response;

    #[test]
    fn auth_url_carries_key_and_token() {
        assert_eq!(
            auth_url("KEY", "TOKEN"),
            "https://www.last.fm/api/auth/?api_key=KEY&token=TOKEN"
        );
    }

    #[test]
    fn session_body_is_decoded() {
        let response: SessionResponse = parse_response(
            r#"{"session":{"name":"alice","key":"d580d57f32848f5dcf574d1ce18d78b2","subscriber":0}}"#,
        )
        .unwrap();
        assert_eq!(response.session.name, "alice");
        assert_eq!(response.session.key, "d580d57f32848f5dcf574d1ce18d78b2");
    }

    #[test]
    fn unauthorized_token_is_pending() {
        let err = parse_response::<SessionResponse>(
            r#"{"message":"Unauthorized Token - This token has not been issued","error":14}"#,
        )
        .unwrap_err();
        assert!(err.is_pending_authorization());
    }
}
