//! Request signing for the desk's authenticated venues.
//!
//! Each venue authenticates with a different scheme. A [`Credential`] names
//! its scheme; [`Signer::new`] parses the key material once and
//! [`Signer::sign`] turns a [`RequestDescriptor`] into the exact header set
//! the venue expects.
//!
//! ```ignore
//! use tradedesk_auth::{Credential, RequestDescriptor, Signer, SigningScheme};
//!
//! let credential = Credential::new("key-id", pem, SigningScheme::RsaPss);
//! let signer = Signer::new(&credential)?;
//! let headers = signer.sign(&RequestDescriptor::get("/trade-api/v2/portfolio/balance"))?;
//! ```
//!
//! Key material is never logged and is redacted from `Debug` output.

pub mod credential;
pub mod ed25519;
pub mod error;
pub mod headers;
pub mod hmac;
pub mod jwt;
pub mod request;
pub mod rsa_pss;
pub mod signer;

pub use credential::{expand_escaped_newlines, Credential, SigningScheme};
pub use error::{Result, SigningError};
pub use headers::SignedHeaders;
pub use request::{FreshClock, Method, RequestDescriptor};
pub use signer::{sign, Signer};
