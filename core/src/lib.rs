//! Request construction, SigV4 signing and ordered batch execution.
//!
//! # Overview
//! A `Spec` declares named request targets. A `Runner` resolves the targets
//! to run, builds each request from its route, headers and JSON body, signs
//! it with AWS SigV4 when asked, and sends it through a blocking
//! `HttpClient`. Results come back in execution order.
//!
//! # Design
//! - Everything is synchronous; requests go out one at a time.
//! - `HttpClient::send` never errors. Transport failures are data inside a
//!   `RequestResult`; build and sign failures abort the run.
//! - A `Runner` is single-use.

pub mod builder;
pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod runner;
pub mod signer;
pub mod types;

pub use builder::{build_request, normalize_route};
pub use client::{ClientConfig, HttpClient, RequestResult, DEFAULT_TIMEOUT};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use http::{HeaderSet, HttpMethod, HttpRequest, HttpResponse};
pub use runner::{RunState, Runner};
pub use signer::{sign_request, SigV4Signer};
pub use types::{AwsSignConfig, RequestTarget, Spec};
