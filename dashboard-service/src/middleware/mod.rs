//! Transport-level middleware: request tracking and security headers.
//!
//! The Request Gate itself (signed-request verification) lives in
//! [`crate::request_gate`] since it needs access to the Auth Core and is
//! wired as an `axum::middleware::from_fn_with_state`, not a generic tower
//! layer.

pub mod request_tracking;
pub mod security_headers;

pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    RequestTrackingConfig, PROPAGATE_HEADERS, SENSITIVE_HEADERS,
};
pub use security_headers::apply_security_headers;
