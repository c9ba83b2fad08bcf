// Copyright (c) 2021 MASSA LABS <info@massa.net>
//! Structured trace events for state transitions.
//!
//! ```
//! use quorum_logging::quorum_trace;
//! quorum_trace!("staking.delegate", { "delegator": "a", "amount": 10 });
//! ```

// re-exported so that callers of the macro do not need their own dependencies
#[doc(hidden)]
pub use serde_json as __serde_json;
#[doc(hidden)]
pub use tracing as __tracing;

/// Emits a `trace!` record tagged `quorum_trace:<event>` with a JSON payload
#[macro_export]
macro_rules! quorum_trace {
    ($evt:expr, $params:tt) => {
        $crate::__tracing::trace!(
            "quorum_trace:{}:{}",
            $evt,
            $crate::__serde_json::json!($params)
        );
    };
}
