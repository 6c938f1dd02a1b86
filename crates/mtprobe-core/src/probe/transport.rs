//! Outbound request seam: the `Transport` trait and its libcurl implementation.
//!
//! Network failures are values, not errors: every request yields an
//! `Exchange` that the dispatcher classifies into a `ProbeOutcome`.

use std::fmt;
use std::time::Duration;

/// Bodies larger than this are cut off while reading; probe pages are small.
const MAX_BODY_BYTES: usize = 1 << 20;

/// Which phase of a request ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// No connection was established in time.
    Connect,
    /// Connected, but the response did not arrive in time.
    Read,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutKind::Connect => f.write_str("connect"),
            TimeoutKind::Read => f.write_str("read"),
        }
    }
}

/// Tagged result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    Response {
        status: u16,
        body: Vec<u8>,
        content_type: Option<String>,
    },
    Timeout(TimeoutKind),
    /// Any other transport failure, with a human-readable detail.
    Failed(String),
}

/// A single GET with one Accept header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub accept: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

/// Performs probe requests. Implementations block; the dispatcher runs them
/// on the blocking pool.
pub trait Transport: Send + Sync {
    fn get(&self, request: &ProbeRequest) -> Exchange;
}

/// libcurl-backed transport. Follows redirects like a browser would.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

impl Transport for CurlTransport {
    fn get(&self, request: &ProbeRequest) -> Exchange {
        let mut easy = curl::easy::Easy::new();
        match perform(&mut easy, request) {
            Ok(exchange) => exchange,
            Err(e) => {
                let connected = easy
                    .connect_time()
                    .map(|d| !d.is_zero())
                    .unwrap_or(false);
                classify_curl_error(&e, connected)
            }
        }
    }
}

fn perform(easy: &mut curl::easy::Easy, request: &ProbeRequest) -> Result<Exchange, curl::Error> {
    let mut body: Vec<u8> = Vec::new();

    easy.url(&request.url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(5)?;
    easy.connect_timeout(request.connect_timeout)?;
    easy.timeout(request.timeout)?;

    let mut list = curl::easy::List::new();
    list.append(&format!("Accept: {}", request.accept.trim()))?;
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let room = MAX_BODY_BYTES.saturating_sub(body.len());
            body.extend_from_slice(&data[..data.len().min(room)]);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    let content_type = easy.content_type()?.map(str::to_string);
    Ok(Exchange::Response {
        status: u16::try_from(status).unwrap_or(0),
        body,
        content_type,
    })
}

/// Map a curl failure onto the exchange taxonomy.
pub fn classify_curl_error(e: &curl::Error, connected: bool) -> Exchange {
    if e.is_operation_timedout() {
        let kind = if connected {
            TimeoutKind::Read
        } else {
            TimeoutKind::Connect
        };
        return Exchange::Timeout(kind);
    }
    Exchange::Failed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // CURLE_OPERATION_TIMEDOUT, CURLE_COULDNT_RESOLVE_HOST, CURLE_COULDNT_CONNECT
    const TIMEDOUT: i32 = 28;
    const RESOLVE: i32 = 6;
    const CONNECT: i32 = 7;

    #[test]
    fn timeout_split_by_connection_phase() {
        let e = curl::Error::new(TIMEDOUT as _);
        assert_eq!(
            classify_curl_error(&e, false),
            Exchange::Timeout(TimeoutKind::Connect)
        );
        assert_eq!(
            classify_curl_error(&e, true),
            Exchange::Timeout(TimeoutKind::Read)
        );
    }

    #[test]
    fn other_failures_are_generic_errors() {
        for code in [RESOLVE, CONNECT] {
            let e = curl::Error::new(code as _);
            assert!(matches!(classify_curl_error(&e, false), Exchange::Failed(_)));
        }
    }

    #[test]
    fn refused_connection_is_failed_exchange() {
        // Bind then drop to get a local port with nothing listening.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let exchange = CurlTransport.get(&ProbeRequest {
            url: format!("http://127.0.0.1:{port}/help"),
            accept: "application/rdap+json".to_string(),
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(2),
        });
        assert!(matches!(exchange, Exchange::Failed(_)));
    }
}
