//! Output capture for `console.log` lines.
//!
//! Every execution gets its own [`CapturedOutput`], handed explicitly to the
//! engine as the backing store of `console.log`. Nothing global is swapped,
//! so concurrent executions cannot see each other's lines.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Lines {
    lines: Vec<String>,
    sealed: bool,
}

/// An ordered, shareable buffer of captured output lines.
///
/// Once sealed, further writes are dropped. The executor seals the buffer
/// when it stops waiting for a run, so a worker that keeps going after its
/// deadline cannot change output that was already handed back.
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput {
    inner: Arc<Mutex<Lines>>,
}

impl CapturedOutput {
    /// Create a new, empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Lines> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one line. Returns `false` if the buffer is sealed.
    pub fn push(&self, line: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if inner.sealed {
            return false;
        }
        inner.lines.push(line.into());
        true
    }

    /// Stop accepting lines.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Check if the buffer has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Get a copy of the captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.clone()
    }

    /// Seal the buffer and take its lines.
    pub fn finish(&self) -> Vec<String> {
        let mut inner = self.lock();
        inner.sealed = true;
        std::mem::take(&mut inner.lines)
    }

    /// Get the number of captured lines.
    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    /// Check if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Seals the buffer when dropped, including when the owning future is
/// cancelled mid-run.
struct SealOnDrop(CapturedOutput);

impl Drop for SealOnDrop {
    fn drop(&mut self) {
        self.0.seal();
    }
}

/// Run `f` against a fresh capture buffer and return its result together
/// with every line captured while it ran.
///
/// The buffer is sealed once `f` settles, whether it succeeded or failed, and
/// also if the returned future is dropped before completion.
pub async fn with_captured_output<F, Fut, R>(f: F) -> (R, Vec<String>)
where
    F: FnOnce(CapturedOutput) -> Fut,
    Fut: Future<Output = R>,
{
    let guard = SealOnDrop(CapturedOutput::new());
    let value = f(guard.0.clone()).await;
    let lines = guard.0.finish();
    (value, lines)
}
