//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the sampling core and its
//! observers. Implementations live in other crates or in the caller.

/// Observer of a running chain
///
/// Invoked from inside the sampling loop, so implementations must return
/// quickly and never block. Observers have no control over the chain.
pub trait ProgressSink {
    /// Percentage of the target sample count reached, in `[0, 100]`
    fn on_progress(&mut self, percent: f64);

    /// Free-form status line (run started, bounds chosen, run finished)
    fn on_status(&mut self, _line: &str) {}
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _percent: f64) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(f64),
{
    fn on_progress(&mut self, percent: f64) {
        self(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: f64| seen.push(p);
            sink.on_progress(10.0);
            sink.on_status("ignored");
            sink.on_progress(20.0);
        }
        assert_eq!(seen, vec![10.0, 20.0]);
    }
}
