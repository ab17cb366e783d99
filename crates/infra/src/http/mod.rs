//! HTTP transport
//!
//! Thin wrapper over `reqwest` issuing one request per acquired connection,
//! with redirect following disabled and the correlation id attached to every
//! call.

pub mod client;

pub use client::{
    base_url, HttpClient, HttpClientBuilder, HttpResponse, CORRELATION_ID_HEADER,
    CURRENT_UTC_DATE_HEADER, ROOT_ACTIVITY_ID_HEADER,
};
