//! HTTP middleware components.

pub mod internal_auth;
pub mod logging;
pub mod metrics;
pub mod trace_id;

pub use internal_auth::require_internal_secret;
pub use logging::init_logging;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
