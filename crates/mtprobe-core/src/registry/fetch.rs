//! Download the bootstrap document over HTTP(S).

use std::time::Duration;

use super::{parse_bootstrap, Bootstrap, RegistryError};

/// GETs the bootstrap document and parses it. Non-2xx responses are fatal.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch_bootstrap(url: &str, timeout: Duration) -> Result<Bootstrap, RegistryError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout.saturating_mul(6))?;
    easy.accept_encoding("")?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(RegistryError::Http {
            url: url.to_string(),
            status,
        });
    }
    tracing::debug!(url, bytes = body.len(), "fetched registry document");
    parse_bootstrap(&body)
}
