//! Target resolution
//!
//! Turns a user-supplied target specification into immutable connection
//! parameters. Accepted forms: a full URL, `host:port`, or a bare host
//! (defaulting to http on port 80).

use redfox_common::Target;
use tracing::debug;
use url::Url;

use crate::error::{EngineError, EngineResult};

/// Default form field names when the caller does not override them.
pub const DEFAULT_USERNAME_FIELD: &str = "username";
pub const DEFAULT_PASSWORD_FIELD: &str = "password";

/// Resolve `input` into a [`Target`] carrying the given form fields.
pub fn resolve_target(
    input: &str,
    username_field: &str,
    password_field: &str,
) -> EngineResult<Target> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_target(input, "empty target"));
    }

    // Bare host or host:port gets an http scheme prepended.
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| EngineError::invalid_target(input, e.to_string()))?;

    let scheme = parsed.scheme().to_string();
    if scheme != "http" && scheme != "https" {
        return Err(EngineError::invalid_target(
            input,
            format!("unsupported scheme '{scheme}'"),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| EngineError::invalid_target(input, "missing host"))?
        .to_string();

    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| EngineError::invalid_target(input, "cannot determine port"))?;

    let path = match parsed.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };

    let default_port = (scheme == "http" && port == 80) || (scheme == "https" && port == 443);
    let url = if default_port {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}:{port}{path}")
    };

    let target = Target {
        scheme,
        host,
        port,
        path,
        url,
        username_field: username_field.to_string(),
        password_field: password_field.to_string(),
    };
    debug!(target = %target, "resolved target");
    Ok(target)
}
