//! Request surface of the labeling service.
//!
//! [`Dispatcher`] maps gateway-style events (`httpMethod`, `pathParameters`,
//! `body`) onto an [`ApiHandler`] and always answers with a
//! [`GatewayResponse`] envelope. With the `http` feature, [`HttpApi`] mounts
//! the same dispatcher on an axum router.

mod error;
pub use error::{ApiError, ErrorBody};

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::ServiceAdapter;

mod dispatch;
pub use dispatch::{DispatchConfig, Dispatcher, GatewayRequest, GatewayResponse};

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;
