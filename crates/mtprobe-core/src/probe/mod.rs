//! Probe dispatch: one GET per Accept-header variant against a server's
//! help path, each result classified into a `ProbeOutcome`.
//!
//! Uses the curl crate (libcurl) behind the `Transport` trait so the
//! scheduler can be driven by a scripted transport in tests.

mod dispatch;
mod outcome;
mod transport;
mod variant;

pub use dispatch::{probe_url, DispatchSettings, Dispatcher, ProbeSet};
pub use outcome::{ProbeOutcome, StatusMarker, CONFORMANCE_KEY};
pub use transport::{
    classify_curl_error, CurlTransport, Exchange, ProbeRequest, TimeoutKind, Transport,
};
pub use variant::{ProbeVariant, VariantCatalog};
