//! Error types for command evaluation.
//!
//! [`EvalError`] describes a command that failed in an ordinary way; the
//! evaluator reports it to the user and the session carries on.
//! [`EvalFault`] is the only error an [`Evaluator`](crate::Evaluator) returns
//! and means the session cannot continue.

use thiserror::Error;

/// Ordinary failures reported back to the user as captured output.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    /// The command could not be parsed.
    #[error("invalid syntax: {message}")]
    Syntax {
        /// Parser diagnostic.
        message: String,
    },
    /// A name was read before it was bound.
    #[error("name '{name}' is not defined")]
    UndefinedName {
        /// Missing name.
        name: String,
    },
    /// An operator or builtin received values it cannot combine.
    #[error("unsupported operand types for {operation}: {left} and {right}")]
    OperandTypes {
        /// Operator symbol or builtin name.
        operation: String,
        /// Type of the left operand.
        left: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },
    /// A value had the wrong type or shape for a builtin.
    #[error("{message}")]
    Value {
        /// Description of the problem.
        message: String,
    },
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Integer arithmetic overflowed `i64`.
    #[error("integer overflow in {operation}")]
    Overflow {
        /// Operator that overflowed.
        operation: &'static str,
    },
    /// The called function does not exist.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name.
        name: String,
    },
    /// A builtin was called with the wrong number of arguments.
    #[error("{name}() takes {expected} argument(s) but {given} were given")]
    Arity {
        /// Builtin name.
        name: &'static str,
        /// Accepted argument count.
        expected: usize,
        /// Supplied argument count.
        given: usize,
    },
    /// The command printed more than one evaluation may capture.
    #[error("output too large")]
    OutputTooLarge,
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }
}

/// The evaluator could not serve the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("evaluator fault: {message}")]
pub struct EvalFault {
    message: String,
}

impl EvalFault {
    /// Builds a fault with a diagnostic message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
