//! Interactive confirmation for destructive calls.
//!
//! Deleting a record asks the user first unless confirmation is disabled
//! through [`WorkbenchConfig::prompt_on_delete`](crate::WorkbenchConfig::prompt_on_delete)
//! or per call. The [`Prompt`] trait is the line-reading capability; tests
//! substitute a scripted one.
//!
//! # Example
//!
//! ```rust
//! use std::io;
//! use std::sync::Arc;
//! use workbench_api::confirm::{ConfirmationGate, Prompt};
//!
//! #[derive(Debug)]
//! struct AlwaysYes;
//!
//! impl Prompt for AlwaysYes {
//!     fn read_line(&self, _message: &str) -> io::Result<String> {
//!         Ok("y".to_string())
//!     }
//! }
//!
//! let gate = ConfirmationGate::new(Arc::new(AlwaysYes));
//! assert!(gate.confirm("delete investigations 1").is_ok());
//! ```

use std::fmt::Debug;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::rest::ConfirmationError;

/// Number of unrecognised answers tolerated before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Reads one line of user input after showing `message`.
pub trait Prompt: Send + Sync + Debug {
    /// Shows `message` and returns the line the user typed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the input cannot be read.
    fn read_line(&self, message: &str) -> io::Result<String>;
}

/// Prompts on stdout and reads from stdin.
///
/// The read blocks. [`ConfirmationGate`] moves it off the async worker when
/// running on a multi-threaded Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn read_line(&self, message: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Asks for a yes/no answer before a destructive call.
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    prompt: Arc<dyn Prompt>,
    max_attempts: u32,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(Arc::new(StdinPrompt))
    }
}

impl ConfirmationGate {
    /// Creates a gate that asks through `prompt`.
    #[must_use]
    pub fn new(prompt: Arc<dyn Prompt>) -> Self {
        Self {
            prompt,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the number of attempts (at least one).
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Asks whether to proceed with `action`.
    ///
    /// `y`/`yes` proceeds, `n`/`no` declines, anything else asks again.
    /// Each prompt runs through [`tokio::task::block_in_place`] on a
    /// multi-threaded runtime, so other tasks keep running while the user
    /// answers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmationError::Declined`] on a no,
    /// [`ConfirmationError::NotConfirmed`] once the attempts run out, and
    /// [`ConfirmationError::Unreadable`] if the prompt fails.
    pub fn confirm(&self, action: &str) -> Result<(), ConfirmationError> {
        let message = format!("Are you sure you want to {action}? [y/n]: ");
        for attempt in 1..=self.max_attempts {
            let answer = run_blocking(|| self.prompt.read_line(&message))
                .map_err(|e| ConfirmationError::Unreadable {
                    reason: e.to_string(),
                })?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => {
                    tracing::info!(action, "Delete confirmed");
                    return Ok(());
                }
                "n" | "no" => {
                    tracing::info!(action, "Delete declined");
                    return Err(ConfirmationError::Declined);
                }
                other => {
                    tracing::debug!(attempt, answer = other, "Unrecognised confirmation answer");
                }
            }
        }
        tracing::info!(action, attempts = self.max_attempts, "Delete not confirmed");
        Err(ConfirmationError::NotConfirmed {
            attempts: self.max_attempts,
        })
    }
}

/// Runs a blocking call, handing the worker thread back to the runtime first
/// when that is possible.
///
/// A current-thread runtime cannot give up its only worker, so the call runs
/// in place there, as it does outside any runtime.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}
