//! Stream lifecycle.
//!
//! Streams move through `Open -> Closing -> Closed` exactly once. Data
//! operations are only legal while open.

use crate::error::{Result, ZstdsError};
use tracing::debug;

/// Lifecycle state of a stream or transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Accepting data operations.
    #[default]
    Open,
    /// `close` is in progress.
    Closing,
    /// Terminal state.
    Closed,
}

/// Open/closed state machine guarding a stream.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: StreamState,
}

impl Lifecycle {
    /// Create a guard in the open state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether data operations are allowed.
    pub fn is_open(&self) -> bool {
        self.state == StreamState::Open
    }

    /// Whether the terminal transition has happened.
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Fail with [`ZstdsError::UsedAfterClose`] unless open.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ZstdsError::UsedAfterClose)
        }
    }

    /// Enter `Closing`. Only one close may ever begin.
    pub fn begin_close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = StreamState::Closing;
        Ok(())
    }

    /// Enter `Closed`.
    pub fn finish_close(&mut self) {
        self.state = StreamState::Closed;
    }
}

/// A stream that can be closed.
pub trait Close {
    /// Release the stream's resources. Closing twice succeeds.
    fn close(&mut self) -> Result<()>;

    /// Whether `close` has completed.
    fn is_closed(&self) -> bool;
}

/// Run `f` against `stream`, then close it on every exit path.
///
/// When both `f` and `close` fail, the error from `f` is returned and the
/// close error is logged.
///
/// # Example
///
/// ```rust
/// use zstds_core::lifecycle::{Close, scoped};
/// use zstds_core::Result;
///
/// struct Handle(bool);
///
/// impl Close for Handle {
///     fn close(&mut self) -> Result<()> {
///         self.0 = true;
///         Ok(())
///     }
///
///     fn is_closed(&self) -> bool {
///         self.0
///     }
/// }
///
/// let value = scoped(Handle(false), |_| Ok(42)).unwrap();
/// assert_eq!(value, 42);
/// ```
pub fn scoped<S, T, F>(mut stream: S, f: F) -> Result<T>
where
    S: Close,
    F: FnOnce(&mut S) -> Result<T>,
{
    let outcome = f(&mut stream);
    let closed = stream.close();

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            debug!(error = %close_err, "close failed after scoped operation error");
            Err(err)
        }
    }
}
