//! Redfish access layer: transport seam, session management and resource fetching.

pub mod client;
pub mod fetcher;
pub mod session;
pub mod transport;

pub use client::{Credentials, RedfishClient, Target, REDFISH_ROOT};
pub use fetcher::{AuthOverride, FetchOutcome, STATUS_TIMEOUT, STATUS_UNREACHABLE};
pub use session::{AuthMode, Session, SessionResult};
pub use transport::{RedfishTransport, ReqwestTransport, RequestAuth, TransportError, TransportResponse};
