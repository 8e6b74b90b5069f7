//! # Shipping Adapter
//!
//! Client-side adapter from the order domain to the shipping service's
//! delivery-estimate RPC:
//! - Order → wire request translation with fail-fast product code validation
//! - Bounded retries with linear backoff on transient gRPC failures
//! - Caller-controlled cancellation and deadlines across all retries
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          ShippingEstimateAdapter             │
//! │   build_request ──► RetryPolicy::execute     │
//! └──────────────────────┬───────────────────────┘
//!                        │ CallContext
//!              ┌─────────▼──────────┐
//!              │ ShippingConnector  │  (port)
//!              └─────────┬──────────┘
//!                        │
//!              ┌─────────▼──────────┐
//!              │ GrpcShippingConn.  │──► shipping.ShippingService
//!              └────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod adapter;
pub mod config;
pub mod connector;
pub mod context;
pub mod error;
pub mod metrics;
pub mod proto;
pub mod retry;
pub mod types;

pub use adapter::{build_request, ShippingEstimateAdapter};
pub use config::AdapterConfig;
pub use connector::{GrpcShippingConnector, ShippingConnector};
pub use context::{CallContext, ContextError};
pub use error::{Error, Result};
pub use retry::{Backoff, RetryPolicy};
pub use types::{Order, OrderItem};

/// Default retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default backoff increment (seconds)
pub const DEFAULT_BACKOFF_STEP_SECONDS: u64 = 1;
