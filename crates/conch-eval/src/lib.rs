//! Command evaluation for the conch REPL server.
//!
//! The server treats evaluation as a collaborator: it hands one complete
//! command to an [`Evaluator`] together with the server-wide [`Namespace`]
//! and an [`OutputCapture`] that stands in for the session's standard output
//! and error streams. The capture only exists for the duration of a single
//! call, so nothing an evaluator writes can leak into another session.
//!
//! The namespace is deliberately shared by every connected client. A value
//! bound by one session is visible to the next command of any other session.
//!
//! [`ExpressionEvaluator`] is the default implementation: a small
//! line-oriented expression language with assignment, arithmetic, strings and
//! a handful of builtins.

mod capture;
mod error;
mod interpreter;
mod lexer;
mod namespace;
mod parser;

pub use capture::{MAX_CAPTURE_BYTES, OutputCapture, Stream};
pub use error::{EvalError, EvalFault};
pub use interpreter::ExpressionEvaluator;
pub use namespace::{Namespace, Value};

/// Executes commands against a persistent, shared namespace.
///
/// Ordinary command failures (unknown names, syntax errors) are part of the
/// session and must be written to `capture`; an `Err` is reserved for faults
/// that leave the evaluator unable to serve the session at all.
pub trait Evaluator {
    /// Evaluates `command`, writing any output into `capture`.
    fn evaluate(
        &mut self,
        command: &str,
        namespace: &mut Namespace,
        capture: &mut OutputCapture,
    ) -> Result<(), EvalFault>;

    /// Evaluates `command` and returns everything it wrote.
    fn evaluate_captured(
        &mut self,
        command: &str,
        namespace: &mut Namespace,
    ) -> Result<String, EvalFault> {
        let mut capture = OutputCapture::new();
        self.evaluate(command, namespace, &mut capture)?;
        Ok(capture.into_string())
    }
}

impl<E> Evaluator for Box<E>
where
    E: Evaluator + ?Sized,
{
    fn evaluate(
        &mut self,
        command: &str,
        namespace: &mut Namespace,
        capture: &mut OutputCapture,
    ) -> Result<(), EvalFault> {
        (**self).evaluate(command, namespace, capture)
    }
}
