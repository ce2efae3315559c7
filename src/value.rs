use crate::ast::BinaryOperator;
use crate::callable::Callable;
use crate::error::{ArithmeticError, Fault, RuntimeError};
use std::fmt;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Clone)]
pub enum Value {
    Void,
    Boolean(bool),
    Integer(i32),
    String(String),
    Function(Rc<dyn Callable>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Void,
    Boolean,
    Integer,
    String,
    Function,
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Boolean(x) => write!(f, "{}", x),
            Value::Integer(x) => write!(f, "{}", x),
            Value::String(x) => write!(f, "{}", x),
            Value::Function(x) => write!(f, "{}", x.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "[void]"),
            Value::Boolean(x) => write!(f, "[bool]{}", x),
            Value::Integer(x) => write!(f, "[int]{}", x),
            Value::String(x) => write!(f, "[string]{}", x),
            Value::Function(x) => match x.params() {
                Some(params) => write!(f, "[function]{}({})", x.name(), params.join(", ")),
                None => write!(f, "[function]{}", x.name()),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => same_callable(l, r),
            _ => false,
        }
    }
}

// Compares the data pointers only; vtable pointers of one type may differ
// between codegen units.
fn same_callable(l: &Rc<dyn Callable>, r: &Rc<dyn Callable>) -> bool {
    Rc::as_ptr(l) as *const u8 == Rc::as_ptr(r) as *const u8
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// Integers are themselves, booleans are 1 or 0, everything else is 0.
    pub fn to_integer(&self) -> i32 {
        match self {
            Value::Integer(x) => *x,
            Value::Boolean(x) => *x as i32,
            Value::Void | Value::String(_) | Value::Function(_) => 0,
        }
    }

    /// Only `true` itself is true.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Boolean(x) => *x,
            _ => false,
        }
    }

    fn is_textual(&self) -> bool {
        matches!(self, Value::String(_) | Value::Function(_))
    }

    pub fn apply(&self, operator: BinaryOperator, rhs: &Value) -> Result<Value, Fault> {
        match operator {
            BinaryOperator::Add => Ok(self.add(rhs)),
            BinaryOperator::Subtract => self.subtract(rhs),
            BinaryOperator::Multiply => self.multiply(rhs),
            BinaryOperator::Divide => self.divide(rhs),
            BinaryOperator::Modulus => self.remainder(rhs),
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => self.compare(operator, rhs),
            BinaryOperator::Equal => Ok(Value::Boolean(self == rhs)),
            BinaryOperator::NotEqual => Ok(Value::Boolean(self != rhs)),
            BinaryOperator::And => Ok(Value::Boolean(self.to_boolean() && rhs.to_boolean())),
            BinaryOperator::Or => Ok(Value::Boolean(self.to_boolean() || rhs.to_boolean())),
            // Storing a value needs a variable on the left, not a value.
            BinaryOperator::Assign => Err(RuntimeError::InvalidLvalue.into()),
        }
    }

    pub fn add(&self, rhs: &Value) -> Value {
        if self.is_textual() {
            Value::String(format!("{}{}", self, rhs))
        } else {
            Value::Integer(self.to_integer().wrapping_add(rhs.to_integer()))
        }
    }

    pub fn subtract(&self, rhs: &Value) -> Result<Value, Fault> {
        let (l, r) = self.integers(BinaryOperator::Subtract, rhs)?;
        Ok(Value::Integer(l.wrapping_sub(r)))
    }

    pub fn multiply(&self, rhs: &Value) -> Result<Value, Fault> {
        if !self.is_textual() {
            return Ok(Value::Integer(
                self.to_integer().wrapping_mul(rhs.to_integer()),
            ));
        }
        match rhs {
            Value::Integer(count) if *count < 0 => Err(RuntimeError::NegativeRepeat(*count).into()),
            Value::Integer(count) => Ok(Value::String(self.to_string().repeat(*count as usize))),
            _ => Err(self.mismatch(BinaryOperator::Multiply, rhs)),
        }
    }

    pub fn divide(&self, rhs: &Value) -> Result<Value, Fault> {
        let (l, r) = self.integers(BinaryOperator::Divide, rhs)?;
        checked(l, r, i32::checked_div)
    }

    pub fn remainder(&self, rhs: &Value) -> Result<Value, Fault> {
        let (l, r) = self.integers(BinaryOperator::Modulus, rhs)?;
        checked(l, r, i32::checked_rem)
    }

    fn compare(&self, operator: BinaryOperator, rhs: &Value) -> Result<Value, Fault> {
        let (l, r) = self.integers(operator, rhs)?;
        let result = match operator {
            BinaryOperator::Less => l < r,
            BinaryOperator::Greater => l > r,
            BinaryOperator::LessEqual => l <= r,
            _ => l >= r,
        };
        Ok(Value::Boolean(result))
    }

    fn integers(&self, operator: BinaryOperator, rhs: &Value) -> Result<(i32, i32), Fault> {
        match (self, rhs) {
            (Value::Integer(l), Value::Integer(r)) => Ok((*l, *r)),
            _ => Err(self.mismatch(operator, rhs)),
        }
    }

    fn mismatch(&self, operator: BinaryOperator, rhs: &Value) -> Fault {
        RuntimeError::TypeMismatch {
            operator,
            left: self.kind(),
            right: rhs.kind(),
        }
        .into()
    }
}

// Division and remainder share their failure modes: a zero divisor, and
// i32::MIN by -1, which is the only other case `checked_*` rejects.
fn checked(l: i32, r: i32, op: fn(i32, i32) -> Option<i32>) -> Result<Value, Fault> {
    if r == 0 {
        return Err(ArithmeticError::DivideByZero.into());
    }
    op(l, r)
        .map(Value::Integer)
        .ok_or_else(|| ArithmeticError::Overflow.into())
}
