//! [`Profiler`] backed by `tracing` spans.

use std::time::Instant;

use bouncer_sdk::{Profiler, ProfilerSpan};

/// Records each evaluation as a `bouncer.profile` span and emits the elapsed
/// time when the span ends. The evaluation's own spans and events nest under
/// it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProfiler;

impl TracingProfiler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Profiler for TracingProfiler {
    fn create(&self, label: &str) -> Box<dyn ProfilerSpan> {
        Box::new(TracingSpan {
            span: tracing::info_span!("bouncer.profile", label = %label),
            started: Instant::now(),
        })
    }
}

struct TracingSpan {
    span: tracing::Span,
    started: Instant,
}

impl ProfilerSpan for TracingSpan {
    fn end(self: Box<Self>) {
        let elapsed_us = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);
        tracing::debug!(parent: &self.span, elapsed_us, "profiler span ended");
    }

    fn tracing_span(&self) -> Option<tracing::Span> {
        Some(self.span.clone())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[traced_test]
    #[test]
    fn span_end_is_logged_with_label() {
        let span = TracingProfiler::new().create("Authorizing edit-post");
        span.end();

        assert!(logs_contain("profiler span ended"));
        assert!(logs_contain("Authorizing edit-post"));
    }
}
