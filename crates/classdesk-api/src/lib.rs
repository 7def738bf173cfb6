// classdesk-api: async HTTP client and session store for the Classdesk admin API

pub mod auth;
pub mod client;
pub mod error;
pub mod session;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use error::{AuthError, Error};
pub use reqwest::Method;
pub use session::{Session, SessionStore};
pub use transport::{TlsMode, TransportConfig};
