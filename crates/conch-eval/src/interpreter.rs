//! Default [`Evaluator`]: a small line-oriented expression language.
//!
//! Each non-blank line of a command is one statement, evaluated in order.
//! Bare expressions echo their value (unless it is `none`), so `1+1` prints
//! `2`. The first failing line writes `error: <message>` to the error stream
//! and the remaining lines are skipped.
//!
//! Output stays inside the capture's byte budget. Echoes and `print` leave
//! room for one error line, so a command that prints too much still ends
//! with `error: output too large`.

use std::cmp::Ordering;

use tracing::trace;

use crate::capture::OutputCapture;
use crate::error::{EvalError, EvalFault};
use crate::lexer::tokenize;
use crate::namespace::{Namespace, Value};
use crate::parser::{BinaryOp, Expr, Statement, UnaryOp, parse_statement};
use crate::Evaluator;

const EVAL_TARGET: &str = "conch_eval::interpreter";
const MAX_STRING_BYTES: usize = 1024 * 1024;
const ERROR_RESERVE: usize = 256;

/// Evaluates arithmetic, string and assignment statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Evaluator for ExpressionEvaluator {
    fn evaluate(
        &mut self,
        command: &str,
        namespace: &mut Namespace,
        capture: &mut OutputCapture,
    ) -> Result<(), EvalFault> {
        for line in command.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if let Err(error) = run_line(line, namespace, capture) {
                trace!(target: EVAL_TARGET, %error, "statement failed");
                report(capture, &error);
                break;
            }
        }
        Ok(())
    }
}

fn report(capture: &mut OutputCapture, error: &EvalError) {
    let mut message = format!("error: {error}");
    if message.len() >= capture.remaining() {
        message = format!("error: {}", EvalError::OutputTooLarge);
    }
    capture.stderr().line(&message);
}

fn emit(capture: &mut OutputCapture, text: &str) -> Result<(), EvalError> {
    if text.len() + 1 + ERROR_RESERVE > capture.remaining() {
        return Err(EvalError::OutputTooLarge);
    }
    capture.stdout().line(text);
    Ok(())
}

fn run_line(
    line: &str,
    namespace: &mut Namespace,
    capture: &mut OutputCapture,
) -> Result<(), EvalError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(());
    }
    match parse_statement(tokens)? {
        Statement::Assign { name, value } => {
            let value = eval(&value, namespace, capture)?;
            namespace.set(name, value);
        }
        Statement::Delete { name } => {
            if namespace.remove(&name).is_none() {
                return Err(EvalError::UndefinedName { name });
            }
        }
        Statement::Expr(expr) => {
            let value = eval(&expr, namespace, capture)?;
            if value != Value::None {
                emit(capture, &value.repr())?;
            }
        }
    }
    Ok(())
}

fn eval(
    expr: &Expr,
    namespace: &Namespace,
    capture: &mut OutputCapture,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(value) => Ok(Value::Int(*value)),
        Expr::Float(value) => Ok(Value::Float(*value)),
        Expr::Str(value) => Ok(Value::Str(value.clone())),
        Expr::Bool(value) => Ok(Value::Bool(*value)),
        Expr::None => Ok(Value::None),
        Expr::Name(name) => namespace
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedName { name: name.clone() }),
        Expr::Unary { op, operand } => unary(*op, eval(operand, namespace, capture)?),
        Expr::Binary { op, left, right } => {
            let left = eval(left, namespace, capture)?;
            let right = eval(right, namespace, capture)?;
            binary(*op, left, right)
        }
        Expr::And(left, right) => {
            let left = eval(left, namespace, capture)?;
            if left.is_truthy() {
                eval(right, namespace, capture)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = eval(left, namespace, capture)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(right, namespace, capture)
            }
        }
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, namespace, capture))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, values, namespace, capture)
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(value)) => value
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow { operation: "-" }),
        (UnaryOp::Neg, Value::Float(value)) => Ok(Value::Float(-value)),
        (UnaryOp::Pos, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (op, value) => Err(EvalError::value(format!(
            "bad operand type for unary {}: {}",
            match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not",
            },
            value.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, &left, &right),
        _ => arithmetic(op, left, right),
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => as_float(*a) == *b,
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => match (number(left), number(right)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(operand_error(op, left, right)),
        },
    };
    let Some(ordering) = ordering else {
        // NaN compares false against everything.
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            bounded_string(joined)
        }
        (Value::Str(text), Value::Int(count)) | (Value::Int(count), Value::Str(text))
            if op == BinaryOp::Mul =>
        {
            repeat(text, *count)
        }
        _ => match (number(&left), number(&right)) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b),
            _ => Err(operand_error(op, &left, &right)),
        },
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = EvalError::Overflow {
        operation: op.symbol(),
    };
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_arithmetic(op, as_float(a), as_float(b)),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b).map(|quotient| {
                if a % b != 0 && (a < 0) != (b < 0) {
                    quotient - 1
                } else {
                    quotient
                }
            })
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b).map(|remainder| {
                if remainder != 0 && (remainder < 0) != (b < 0) {
                    remainder + b
                } else {
                    remainder
                }
            })
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_arithmetic(op, as_float(a), as_float(b));
            }
            u32::try_from(b).ok().and_then(|exponent| a.checked_pow(exponent))
        }
        _ => return Err(EvalError::value(format!("unsupported operator {}", op.symbol()))),
    };
    result.map(Value::Int).ok_or(overflow)
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::DivisionByZero);
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow => a.powf(b),
        _ => return Err(EvalError::value(format!("unsupported operator {}", op.symbol()))),
    };
    Ok(Value::Float(result))
}

fn repeat(text: &str, count: i64) -> Result<Value, EvalError> {
    let count = usize::try_from(count).unwrap_or(0);
    if text.len().saturating_mul(count) > MAX_STRING_BYTES {
        return Err(EvalError::value("string result too large"));
    }
    Ok(Value::Str(text.repeat(count)))
}

fn bounded_string(text: String) -> Result<Value, EvalError> {
    if text.len() > MAX_STRING_BYTES {
        return Err(EvalError::value("string result too large"));
    }
    Ok(Value::Str(text))
}

#[expect(
    clippy::cast_precision_loss,
    reason = "mixed int/float arithmetic promotes to f64"
)]
const fn as_float(value: i64) -> f64 {
    value as f64
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(value) => Some(as_float(*value)),
        Value::Float(value) => Some(*value),
        _ => None,
    }
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::OperandTypes {
        operation: op.symbol().to_owned(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn call(
    name: &str,
    args: Vec<Value>,
    namespace: &Namespace,
    capture: &mut OutputCapture,
) -> Result<Value, EvalError> {
    match name {
        "print" => {
            let budget = capture.remaining().saturating_sub(ERROR_RESERVE);
            let mut text = String::new();
            for (index, arg) in args.iter().enumerate() {
                if index > 0 {
                    text.push(' ');
                }
                text.push_str(&arg.to_string());
                if text.len() >= budget {
                    return Err(EvalError::OutputTooLarge);
                }
            }
            emit(capture, &text)?;
            Ok(Value::None)
        }
        "names" => {
            expect_arity("names", &args, 0)?;
            Ok(Value::Str(namespace.names().collect::<Vec<_>>().join(" ")))
        }
        "len" => match single("len", args)? {
            Value::Str(text) => Ok(Value::Int(
                i64::try_from(text.chars().count()).unwrap_or(i64::MAX),
            )),
            other => Err(EvalError::value(format!(
                "object of type {} has no len()",
                other.type_name()
            ))),
        },
        "str" => Ok(Value::Str(single("str", args)?.to_string())),
        "int" => to_int(single("int", args)?),
        "float" => to_float(single("float", args)?),
        "abs" => match single("abs", args)? {
            Value::Int(value) => value
                .checked_abs()
                .map(Value::Int)
                .ok_or(EvalError::Overflow { operation: "abs" }),
            Value::Float(value) => Ok(Value::Float(value.abs())),
            other => Err(EvalError::value(format!(
                "bad operand type for abs(): {}",
                other.type_name()
            ))),
        },
        "type" => Ok(Value::Str(single("type", args)?.type_name().to_owned())),
        _ => Err(EvalError::UnknownFunction {
            name: name.to_owned(),
        }),
    }
}

fn expect_arity(name: &'static str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name,
            expected,
            given: args.len(),
        })
    }
}

fn single(name: &'static str, args: Vec<Value>) -> Result<Value, EvalError> {
    expect_arity(name, &args, 1)?;
    args.into_iter().next().ok_or(EvalError::Arity {
        name,
        expected: 1,
        given: 0,
    })
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast"
)]
fn to_int(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(value) => Ok(Value::Int(value)),
        Value::Bool(value) => Ok(Value::Int(i64::from(value))),
        Value::Float(value) if value.is_finite() && value.abs() < 9.2e18 => {
            Ok(Value::Int(value.trunc() as i64))
        }
        Value::Float(_) => Err(EvalError::value("cannot convert float to int")),
        Value::Str(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::value(format!("invalid literal for int(): '{text}'"))),
        Value::None => Err(EvalError::value("int() argument must not be none")),
    }
}

fn to_float(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Float(value) => Ok(Value::Float(value)),
        Value::Int(value) => Ok(Value::Float(as_float(value))),
        Value::Bool(value) => Ok(Value::Float(if value { 1.0 } else { 0.0 })),
        Value::Str(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::value(format!("could not convert string to float: '{text}'"))),
        Value::None => Err(EvalError::value("float() argument must not be none")),
    }
}
