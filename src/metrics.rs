// SPDX-License-Identifier: MIT

//! Process-wide error counters
//!
//! Render and evaluation failures are counted here in addition to being
//! logged and re-raised. The counters are monotonic for the lifetime of
//! the process.

use std::sync::atomic::{AtomicU64, Ordering};

static TEMPLATE_ERRORS: AtomicU64 = AtomicU64::new(0);
static EVALUATION_ERRORS: AtomicU64 = AtomicU64::new(0);

/// Record one template render/coercion failure
pub fn count_template_error() {
    TEMPLATE_ERRORS.fetch_add(1, Ordering::Relaxed);
}

/// Record one requirement evaluation failure
pub fn count_evaluation_error() {
    EVALUATION_ERRORS.fetch_add(1, Ordering::Relaxed);
}

/// Total template render/coercion failures so far
pub fn template_errors() -> u64 {
    TEMPLATE_ERRORS.load(Ordering::Relaxed)
}

/// Total requirement evaluation failures so far
pub fn evaluation_errors() -> u64 {
    EVALUATION_ERRORS.load(Ordering::Relaxed)
}
