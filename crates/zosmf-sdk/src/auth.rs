//! Clients for the `/zosmf/services/authenticate` endpoint.
//!
//! * `POST` trades the basic credential for a token cookie
//! * `DELETE` invalidates a previously issued token
//! * `PUT` changes the password of a user known to the security product
//!
//! Password material never survives into errors or logs: server replies
//! from the password-change flow are scrubbed before they are returned.

use crate::error::{ApiErrorBody, Result, ZosmfError};
use crate::session::{ZosmfAuth, ZosmfSession};
use reqwest::header::SET_COOKIE;
use reqwest::Method;
use serde::Serialize;

const RESOURCE: &str = "/zosmf/services/authenticate";

/// Cookie name of the JSON web token issued by current z/OSMF levels.
pub const TOKEN_TYPE_JWT: &str = "jwtToken";

/// Cookie name of the LTPA token issued by older configurations.
pub const TOKEN_TYPE_LTPA: &str = "LtpaToken2";

/// Replacement written over password values in surfaced errors.
pub const PASSWORD_MASK: &str = "****";

/// Token returned by a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token_type: String,
    pub token_value: String,
}

impl IssuedToken {
    /// Turn the token into the credential form replayed on later requests.
    pub fn into_auth(self) -> ZosmfAuth {
        ZosmfAuth::Token {
            token_type: self.token_type,
            token_value: self.token_value,
        }
    }
}

/// Log in with the session's basic credential and return the token the
/// server set. Prefers `jwtToken` and falls back to `LtpaToken2`.
pub async fn login(session: &ZosmfSession) -> Result<IssuedToken> {
    let ZosmfAuth::Basic { user, .. } = session.auth() else {
        return Err(ZosmfError::validation(
            "login requires a user and password on the session",
        ));
    };
    let user = user.clone();
    let response = session.send(session.request(Method::POST, RESOURCE)?).await?;
    let token = extract_token(response.headers()).ok_or_else(|| {
        ZosmfError::invalid_response(
            "z/OSMF accepted the login but returned no jwtToken or LtpaToken2 cookie",
        )
    })?;
    tracing::info!(user = %user, token_type = %token.token_type, "login succeeded");
    Ok(token)
}

/// Invalidate the session's token. The session must be authenticating
/// with the token that is being revoked.
pub async fn logout(session: &ZosmfSession) -> Result<()> {
    let ZosmfAuth::Token { token_type, .. } = session.auth() else {
        return Err(ZosmfError::validation(
            "logout requires a token credential on the session",
        ));
    };
    let token_type = token_type.clone();
    session
        .send_discard(session.request(Method::DELETE, RESOURCE)?)
        .await?;
    tracing::info!(token_type = %token_type, "logout succeeded");
    Ok(())
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    #[serde(rename = "userID")]
    user_id: &'a str,
    #[serde(rename = "oldPwd")]
    old_pwd: &'a str,
    #[serde(rename = "newPwd")]
    new_pwd: &'a str,
}

/// Change `user_id`'s password on the security product behind z/OSMF.
///
/// On failure the server reply is surfaced with both password values
/// replaced by [`PASSWORD_MASK`] wherever they appear; the user ID is
/// left readable. The well-known `rc 8, reason 2` outcome gains detail
/// lines naming its usual causes.
pub async fn change_password(
    session: &ZosmfSession,
    user_id: &str,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(ZosmfError::validation("user ID must not be blank"));
    }
    if old_password.is_empty() || new_password.is_empty() {
        return Err(ZosmfError::validation(
            "old and new passwords must not be blank",
        ));
    }
    let payload = ChangePasswordRequest {
        user_id,
        old_pwd: old_password,
        new_pwd: new_password,
    };
    let builder = session.request(Method::PUT, RESOURCE)?.json(&payload);
    match session.send_discard(builder).await {
        Ok(()) => {
            tracing::info!(user = %user_id, "password changed");
            Ok(())
        }
        Err(ZosmfError::Api { status, mut body }) => {
            scrub_passwords(&mut body, &[old_password, new_password]);
            if body.rc == Some(8) && body.reason == Some(2) {
                let details = body.details.get_or_insert_with(Vec::new);
                details.push(
                    "The current password is incorrect, or the new password does not meet the \
                     installation's password rules."
                        .to_string(),
                );
                details.push(
                    "Verify the current password and choose a new value the security product \
                     will accept."
                        .to_string(),
                );
            }
            Err(ZosmfError::Api { status, body })
        }
        Err(other) => Err(other),
    }
}

/// Overwrite password fields and any literal password occurrences in the
/// textual parts of a server error document.
fn scrub_passwords(body: &mut ApiErrorBody, secrets: &[&str]) {
    for key in ["oldPwd", "newPwd"] {
        if let Some(value) = body.extra.get_mut(key) {
            *value = serde_json::Value::String(PASSWORD_MASK.to_string());
        }
    }
    if let Some(message) = body.message.take() {
        body.message = Some(mask_occurrences(&message, secrets));
    }
    if let Some(stack) = body.stack.take() {
        body.stack = Some(mask_occurrences(&stack, secrets));
    }
    if let Some(details) = &mut body.details {
        for line in details.iter_mut() {
            *line = mask_occurrences(line, secrets);
        }
    }
}

fn mask_occurrences(text: &str, secrets: &[&str]) -> String {
    let mut masked = text.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            masked = masked.replace(secret, PASSWORD_MASK);
        }
    }
    masked
}

/// Pick the session token out of the login response cookies.
fn extract_token(headers: &reqwest::header::HeaderMap) -> Option<IssuedToken> {
    let mut fallback = None;
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        let Some((name, rest)) = raw.split_once('=') else {
            continue;
        };
        let token_value = rest.split(';').next().unwrap_or(rest).trim().to_string();
        if token_value.is_empty() {
            continue;
        }
        match name.trim() {
            TOKEN_TYPE_JWT => {
                return Some(IssuedToken {
                    token_type: TOKEN_TYPE_JWT.to_string(),
                    token_value,
                })
            }
            TOKEN_TYPE_LTPA => {
                fallback = Some(IssuedToken {
                    token_type: TOKEN_TYPE_LTPA.to_string(),
                    token_value,
                })
            }
            _ => {}
        }
    }
    fallback
}
