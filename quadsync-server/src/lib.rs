//! # quadsync-server
//!
//! Webhook driver for the reconciliation engine: an HTTP endpoint that
//! accepts HMAC-signed GitHub push events, filters them against the
//! configured allow-lists, and funnels the survivors into engine passes.
//!
//! Two layers of coalescing keep bursty pushes cheap: a latest-wins
//! [`debounce::Debouncer`] absorbs rapid event trains into one trigger, and
//! the [`single_flight::SingleFlight`] gate serializes passes while queuing
//! at most one re-run for triggers that land mid-pass.

pub mod debounce;
pub mod error;
pub mod server;
pub mod signature;
pub mod single_flight;

pub use error::ServeError;
pub use server::WebhookServer;
