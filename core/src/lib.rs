//! Client core for the hospital management REST backend.
//!
//! # Overview
//! Three layers, bottom-up:
//! - `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values
//!   without touching the network (host-does-IO). `Api` runs them through a
//!   `Transport` and exposes typed resource groups.
//! - `ApiQuery` / `ApiMutation` turn any envelope-returning call into a
//!   `{ data, loading, error }` cell, with stale responses discarded by
//!   generation and an optional shared `QueryCache`.
//! - `hooks` binds the two: one named constructor per screen-level read or
//!   write (`use_patients`, `use_create_staff`, ...).
//!
//! # Design
//! - Record shapes belong to the backend; `types` names the displayed fields
//!   and passes the rest through.
//! - Drafts are validated before sending; everything else is left to the
//!   backend and surfaces as an error message.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod drafts;
pub mod envelope;
pub mod error;
pub mod hooks;
pub mod http;
pub mod resource;
pub mod schedule;
pub mod types;

pub use api::{Api, ResourceGroup};
pub use cache::QueryCache;
pub use client::{cache_key, routes, ApiClient, SearchParams};
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use resource::{ApiMutation, ApiQuery, ResourceState};
pub use schedule::{bucket_by_day, DateRange, ScheduleFilter};
