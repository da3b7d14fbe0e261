// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # xapi HTTP
//!
//! The authenticated request pipeline for the X API.
//!
//! A call flows through four stages:
//!
//! - [`RequestBuilder`] - default headers, query normalization, `Authorization`
//! - [`Connection`] - sends the request with timeouts and optional proxy
//! - [`RedirectHandler`] - follows 3xx hops, re-signing each one
//! - [`ResponseParser`] - JSON body or a typed [`HttpError`]
//!
//! [`Client`] wires them together behind `get`/`post`/`put`/`delete`.
//!
//! ## Authentication
//!
//! The [`auth`] module holds OAuth 1.0a, OAuth 2.0 and bearer token
//! authenticators. [`Authenticator::from_credentials`] picks one with the
//! precedence OAuth 1.0a > OAuth 2.0 > bearer.
//!
//! ## Example
//!
//! ```ignore
//! use xapi_core::Credentials;
//! use xapi_http::Client;
//!
//! let client = Client::with_credentials(Credentials::bearer("token"))?;
//! let user = client.get("users/by/username/xdevelopers").await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod encoding;
pub mod error;
pub mod redirect;
pub mod request;
pub mod response;
pub mod retry;


// Errors
pub use error::{ErrorKind, HttpError, XError};

// Authentication
pub use auth::{Authenticator, BearerAuthenticator, OAuth1Authenticator, OAuth2Authenticator};

// Pipeline
pub use client::Client;
pub use config::ClientConfig;
pub use connection::Connection;
pub use redirect::RedirectHandler;
pub use request::{HttpMethod, Request, RequestBuilder};
pub use response::{Response, ResponseParser};
pub use retry::RetryPolicy;
