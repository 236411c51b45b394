//! Per-request extraction metrics.

use std::time::Duration;

/// Metrics collected during one structured-report request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetrics {
    /// Logical backend requests made (1, or 2 when the reformat prompt was used).
    pub backend_requests: usize,
    /// Whether the reformat re-prompt was sent.
    pub reprompted: bool,
    /// Whether the accepted answer needed the trailing-comma repair pass.
    pub repaired: bool,
    /// Wall-clock time elapsed, including retry backoff.
    pub wall_time: Duration,
    /// Estimated input tokens sent to the backend.
    pub estimated_input_tokens: usize,
    /// Estimated output tokens received from the backend.
    pub estimated_output_tokens: usize,
}

/// Rough token count for a character count, rounded up at four characters per token.
pub(crate) const fn chars_to_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}
