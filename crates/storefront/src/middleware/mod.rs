//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Cart lock (serializes writes that share a session cookie)
//! 5. Session layer (tower-sessions, holds the cart)
//! 6. Security headers

pub mod request_id;
pub mod security_headers;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{
    SESSION_COOKIE_NAME, cart_lock_middleware, create_session_layer, session_layer,
};
