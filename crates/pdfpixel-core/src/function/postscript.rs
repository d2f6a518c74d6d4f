//! Type 4 PostScript calculator functions
//!
//! The program text is parsed once into a tree of [`Node`]s. Procedures
//! are shared `Arc` slices, so pushing one onto the operand stack is a
//! reference-count bump.

use std::cmp::Ordering::{Equal, Greater, Less};
use std::sync::Arc;

use log::trace;

use crate::error::{Error, Result};

/// Operand stack limit from the PDF reference
pub const MAX_STACK_DEPTH: usize = 100;

/// A value on the operand stack
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
    Proc(Arc<[Node]>),
}

impl Value {
    /// Numeric value, or `None` for booleans and procedures
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A parsed program element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Push(Value),
    Op(Operator),
}

macro_rules! operators {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Operators of the PostScript calculator subset
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Operator {
            $($variant),*
        }

        impl Operator {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }
        }
    };
}

operators! {
    Abs => "abs", Add => "add", Atan => "atan", Ceiling => "ceiling", Cos => "cos",
    Cvi => "cvi", Cvr => "cvr", Div => "div", Exp => "exp", Floor => "floor",
    Idiv => "idiv", Ln => "ln", Log => "log", Mod => "mod", Mul => "mul",
    Neg => "neg", Round => "round", Sin => "sin", Sqrt => "sqrt", Sub => "sub",
    Truncate => "truncate",
    Eq => "eq", Ne => "ne", Gt => "gt", Ge => "ge", Lt => "lt", Le => "le",
    And => "and", Or => "or", Xor => "xor", Not => "not", Bitshift => "bitshift",
    Dup => "dup", Exch => "exch", Pop => "pop", Roll => "roll", Index => "index",
    Copy => "copy", Clear => "clear",
    If => "if", IfElse => "ifelse", Exec => "exec",
}

/// A parsed calculator program
#[derive(Debug, Clone, PartialEq)]
pub struct PostScriptProgram {
    nodes: Arc<[Node]>,
}

impl PostScriptProgram {
    /// Parse program text. Both `{ 2 3 add }` and the bare `2 3 add` are
    /// accepted.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source);
        let mut pos = 0;
        let nodes = parse_sequence(&tokens, &mut pos, 0)?;
        if pos != tokens.len() {
            return Err(Error::PostScriptSyntax("unbalanced '}'".into()));
        }
        // unwrap a single outer procedure
        if let [Node::Push(Value::Proc(body))] = nodes.as_slice() {
            return Ok(Self { nodes: body.clone() });
        }
        Ok(Self { nodes: nodes.into() })
    }

    /// Run the program against `stack`
    pub fn execute(&self, stack: &mut Vec<Value>) -> Result<()> {
        run(&self.nodes, stack)
    }

    /// Push `inputs` (first deepest), run, and return the final stack
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Vec<Value>> {
        let mut stack: Vec<Value> = inputs.iter().map(|&v| Value::Real(v)).collect();
        self.execute(&mut stack)?;
        Ok(stack)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Word(&'a str),
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b'}' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'%' => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            c if c.is_ascii_whitespace() || c == 0 => i += 1,
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'{' | b'}' | b'%' | 0)
                {
                    i += 1;
                }
                tokens.push(Token::Word(&source[start..i]));
            }
        }
    }
    tokens
}

/// Nesting limit for procedure bodies
const MAX_NESTING: usize = 64;

fn parse_sequence(tokens: &[Token<'_>], pos: &mut usize, depth: usize) -> Result<Vec<Node>> {
    if depth > MAX_NESTING {
        return Err(Error::PostScriptSyntax("procedures nested too deeply".into()));
    }
    let mut nodes = Vec::new();
    while let Some(token) = tokens.get(*pos) {
        match token {
            Token::Open => {
                *pos += 1;
                let body = parse_sequence(tokens, pos, depth + 1)?;
                if tokens.get(*pos) != Some(&Token::Close) {
                    return Err(Error::PostScriptSyntax("missing '}'".into()));
                }
                *pos += 1;
                nodes.push(Node::Push(Value::Proc(body.into())));
            }
            Token::Close => return Ok(nodes),
            Token::Word(word) => {
                nodes.push(parse_word(word)?);
                *pos += 1;
            }
        }
    }
    Ok(nodes)
}

fn parse_word(word: &str) -> Result<Node> {
    match word {
        "true" => return Ok(Node::Push(Value::Bool(true))),
        "false" => return Ok(Node::Push(Value::Bool(false))),
        _ => {}
    }
    if let Some(op) = Operator::from_name(word) {
        return Ok(Node::Op(op));
    }
    if let Ok(i) = word.parse::<i64>() {
        return Ok(Node::Push(Value::Int(i)));
    }
    if let Ok(r) = word.parse::<f64>() {
        if r.is_finite() {
            return Ok(Node::Push(Value::Real(r)));
        }
    }
    if word.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        return Err(Error::PostScriptSyntax(format!("malformed number '{word}'")));
    }
    Err(Error::UnsupportedOperator(word.to_string()))
}

fn run(nodes: &[Node], stack: &mut Vec<Value>) -> Result<()> {
    for node in nodes {
        match node {
            Node::Push(value) => {
                if stack.len() >= MAX_STACK_DEPTH {
                    return Err(Error::InvalidFunction("PostScript stack overflow".into()));
                }
                stack.push(value.clone());
            }
            Node::Op(op) => apply(*op, stack)?,
        }
    }
    Ok(())
}

fn require(stack: &[Value], op: Operator, n: usize) -> Result<()> {
    if stack.len() < n {
        return Err(Error::StackUnderflow {
            operator: op.name(),
            required: n,
            actual: stack.len(),
        });
    }
    Ok(())
}

fn pop_value(stack: &mut Vec<Value>, op: Operator) -> Result<Value> {
    stack.pop().ok_or(Error::StackUnderflow {
        operator: op.name(),
        required: 1,
        actual: 0,
    })
}

fn pop_number(stack: &mut Vec<Value>, op: Operator) -> Result<f64> {
    pop_value(stack, op)?.as_number().ok_or(Error::TypeCheck(op.name()))
}

/// Pop an integer operand. Function inputs arrive as reals, so a real
/// with no fractional part is accepted too.
fn pop_int(stack: &mut Vec<Value>, op: Operator) -> Result<i64> {
    match pop_value(stack, op)? {
        Value::Int(i) => Ok(i),
        Value::Real(r) if r.fract() == 0.0 && r.abs() <= i64::MAX as f64 => Ok(r as i64),
        _ => Err(Error::TypeCheck(op.name())),
    }
}

fn pop_bool(stack: &mut Vec<Value>, op: Operator) -> Result<bool> {
    match pop_value(stack, op)? {
        Value::Bool(b) => Ok(b),
        _ => Err(Error::TypeCheck(op.name())),
    }
}

fn pop_proc(stack: &mut Vec<Value>, op: Operator) -> Result<Arc<[Node]>> {
    match pop_value(stack, op)? {
        Value::Proc(p) => Ok(p),
        _ => Err(Error::TypeCheck(op.name())),
    }
}

/// Integer result when it fits, otherwise a real
fn int_or_real(value: Option<i64>, fallback: f64) -> Value {
    value.map_or(Value::Real(fallback), Value::Int)
}

fn real(v: f64) -> Result<Value> {
    if v.is_finite() {
        Ok(Value::Real(v))
    } else {
        Err(Error::InvalidFunction(format!("PostScript undefined result {v}")))
    }
}

fn arithmetic(op: Operator, a: Value, b: Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(match op {
            Operator::Add => int_or_real(x.checked_add(y), x as f64 + y as f64),
            Operator::Sub => int_or_real(x.checked_sub(y), x as f64 - y as f64),
            _ => int_or_real(x.checked_mul(y), x as f64 * y as f64),
        }),
        (a, b) => {
            let x = a.as_number().ok_or(Error::TypeCheck(op.name()))?;
            let y = b.as_number().ok_or(Error::TypeCheck(op.name()))?;
            real(match op {
                Operator::Add => x + y,
                Operator::Sub => x - y,
                _ => x * y,
            })
        }
    }
}

fn compare(op: Operator, a: &Value, b: &Value) -> Result<bool> {
    let ordering = match (a, b) {
        (Value::Bool(x), Value::Bool(y)) if matches!(op, Operator::Eq | Operator::Ne) => {
            return Ok((x == y) == (op == Operator::Eq));
        }
        _ => {
            let x = a.as_number().ok_or(Error::TypeCheck(op.name()))?;
            let y = b.as_number().ok_or(Error::TypeCheck(op.name()))?;
            x.partial_cmp(&y)
        }
    };
    Ok(match op {
        Operator::Eq => ordering == Some(Equal),
        Operator::Ne => ordering != Some(Equal),
        Operator::Gt => ordering == Some(Greater),
        Operator::Ge => matches!(ordering, Some(Greater | Equal)),
        Operator::Lt => ordering == Some(Less),
        _ => matches!(ordering, Some(Less | Equal)),
    })
}

/// Apply a rounding function, keeping integers as they are
fn rounding(value: Value, op: Operator, f: fn(f64) -> f64) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Real(r) => Ok(Value::Real(f(r))),
        _ => Err(Error::TypeCheck(op.name())),
    }
}

fn apply(op: Operator, stack: &mut Vec<Value>) -> Result<()> {
    use Operator::*;

    let arity = match op {
        Clear => 0,
        IfElse => 3,
        Add | Sub | Mul | Div | Idiv | Mod | Atan | Exp | Eq | Ne | Gt | Ge | Lt | Le | And
        | Or | Xor | Bitshift | Exch | Roll | If => 2,
        _ => 1,
    };
    require(stack, op, arity)?;

    let result = match op {
        Add | Sub | Mul => {
            let b = pop_value(stack, op)?;
            let a = pop_value(stack, op)?;
            arithmetic(op, a, b)?
        }
        Div => {
            let b = pop_number(stack, op)?;
            let a = pop_number(stack, op)?;
            if b == 0.0 {
                return Err(Error::InvalidFunction("PostScript division by zero".into()));
            }
            real(a / b)?
        }
        Idiv | Mod => {
            let b = pop_int(stack, op)?;
            let a = pop_int(stack, op)?;
            if b == 0 {
                return Err(Error::InvalidFunction("PostScript division by zero".into()));
            }
            Value::Int(if op == Idiv { a.wrapping_div(b) } else { a.wrapping_rem(b) })
        }
        Atan => {
            let den = pop_number(stack, op)?;
            let num = pop_number(stack, op)?;
            if num == 0.0 && den == 0.0 {
                return Err(Error::InvalidFunction("PostScript atan of 0 0".into()));
            }
            let deg = num.atan2(den).to_degrees();
            Value::Real(if deg < 0.0 { deg + 360.0 } else { deg })
        }
        Exp => {
            let e = pop_number(stack, op)?;
            let base = pop_number(stack, op)?;
            real(base.powf(e))?
        }
        Abs | Neg => match pop_value(stack, op)? {
            Value::Int(i) => {
                let v = if op == Abs { i.checked_abs() } else { i.checked_neg() };
                int_or_real(v, if op == Abs { (i as f64).abs() } else { -(i as f64) })
            }
            Value::Real(r) => Value::Real(if op == Abs { r.abs() } else { -r }),
            _ => return Err(Error::TypeCheck(op.name())),
        },
        Ceiling => rounding(pop_value(stack, op)?, op, f64::ceil)?,
        Floor => rounding(pop_value(stack, op)?, op, f64::floor)?,
        Round => rounding(pop_value(stack, op)?, op, |r| (r + 0.5).floor())?,
        Truncate => rounding(pop_value(stack, op)?, op, f64::trunc)?,
        Cos => Value::Real(pop_number(stack, op)?.to_radians().cos()),
        Sin => Value::Real(pop_number(stack, op)?.to_radians().sin()),
        Sqrt => {
            let v = pop_number(stack, op)?;
            if v < 0.0 {
                return Err(Error::InvalidFunction("PostScript sqrt of a negative".into()));
            }
            Value::Real(v.sqrt())
        }
        Ln | Log => {
            let v = pop_number(stack, op)?;
            if v <= 0.0 {
                return Err(Error::InvalidFunction(format!("PostScript {} of {v}", op.name())));
            }
            Value::Real(if op == Ln { v.ln() } else { v.log10() })
        }
        Cvi => {
            let v = pop_number(stack, op)?.trunc();
            if v.abs() > i64::MAX as f64 {
                return Err(Error::InvalidFunction("PostScript cvi out of range".into()));
            }
            Value::Int(v as i64)
        }
        Cvr => Value::Real(pop_number(stack, op)?),
        Eq | Ne | Gt | Ge | Lt | Le => {
            let b = pop_value(stack, op)?;
            let a = pop_value(stack, op)?;
            Value::Bool(compare(op, &a, &b)?)
        }
        And | Or | Xor => {
            let b = pop_value(stack, op)?;
            let a = pop_value(stack, op)?;
            match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => Value::Bool(match op {
                    And => x && y,
                    Or => x || y,
                    _ => x ^ y,
                }),
                (Value::Int(x), Value::Int(y)) => Value::Int(match op {
                    And => x & y,
                    Or => x | y,
                    _ => x ^ y,
                }),
                _ => return Err(Error::TypeCheck(op.name())),
            }
        }
        Not => match pop_value(stack, op)? {
            Value::Bool(b) => Value::Bool(!b),
            Value::Int(i) => Value::Int(!i),
            _ => return Err(Error::TypeCheck(op.name())),
        },
        Bitshift => {
            let shift = pop_int(stack, op)?;
            let v = pop_int(stack, op)? as i32;
            Value::Int(match shift {
                s if s >= 32 || s <= -32 => 0,
                s if s >= 0 => (v as u32).wrapping_shl(s as u32) as i32 as i64,
                s => (v as u32 >> (-s) as u32) as i32 as i64,
            })
        }
        Dup => stack[stack.len() - 1].clone(),
        Exch => {
            let n = stack.len();
            stack.swap(n - 1, n - 2);
            return Ok(());
        }
        Pop => {
            stack.pop();
            return Ok(());
        }
        Roll => {
            let j = pop_int(stack, op)?;
            let n = pop_int(stack, op)?;
            if n < 0 {
                return Err(Error::InvalidFunction("PostScript roll with negative count".into()));
            }
            let n = n as usize;
            require(stack, op, n)?;
            if n > 0 {
                let start = stack.len() - n;
                let shift = j.rem_euclid(n as i64) as usize;
                stack[start..].rotate_right(shift);
            }
            return Ok(());
        }
        Index => {
            let n = pop_int(stack, op)?;
            let depth = usize::try_from(n).map_err(|_| Error::TypeCheck(op.name()))?;
            require(stack, op, depth + 1)?;
            stack[stack.len() - 1 - depth].clone()
        }
        Copy => {
            let n = pop_int(stack, op)?;
            let n = usize::try_from(n).map_err(|_| Error::TypeCheck(op.name()))?;
            require(stack, op, n)?;
            if stack.len() + n > MAX_STACK_DEPTH {
                return Err(Error::InvalidFunction("PostScript stack overflow".into()));
            }
            let start = stack.len() - n;
            stack.extend_from_within(start..);
            return Ok(());
        }
        Clear => {
            stack.clear();
            return Ok(());
        }
        If => {
            let body = pop_proc(stack, op)?;
            if pop_bool(stack, op)? {
                run(&body, stack)?;
            }
            return Ok(());
        }
        IfElse => {
            let else_body = pop_proc(stack, op)?;
            let then_body = pop_proc(stack, op)?;
            let cond = pop_bool(stack, op)?;
            trace!("ifelse taking the {} branch", if cond { "then" } else { "else" });
            run(if cond { &then_body } else { &else_body }, stack)?;
            return Ok(());
        }
        Exec => {
            let body = pop_proc(stack, op)?;
            run(&body, stack)?;
            return Ok(());
        }
    };
    if stack.len() >= MAX_STACK_DEPTH {
        return Err(Error::InvalidFunction("PostScript stack overflow".into()));
    }
    stack.push(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(source: &str) -> Value {
        let program = PostScriptProgram::parse(source).unwrap();
        program.evaluate(&[]).unwrap().pop().unwrap()
    }

    #[test]
    fn test_add() {
        assert_eq!(top("2 3 add"), Value::Int(5));
        assert_eq!(top("{ 2 3 add }"), Value::Int(5));
    }

    #[test]
    fn test_ifelse() {
        assert_eq!(top("1 0 gt { 10 } { 20 } ifelse"), Value::Int(10));
        assert_eq!(top("1 0 lt { 10 } { 20 } ifelse"), Value::Int(20));
    }

    #[test]
    fn test_underflow_names_operator() {
        let program = PostScriptProgram::parse("add").unwrap();
        match program.evaluate(&[]) {
            Err(Error::StackUnderflow {
                operator,
                required,
                actual,
            }) => assert_eq!((operator, required, actual), ("add", 2, 0)),
            other => panic!("expected underflow, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_operator_rejected_at_parse() {
        assert!(matches!(
            PostScriptProgram::parse("{ 1 2 frobnicate }"),
            Err(Error::UnsupportedOperator(name)) if name == "frobnicate"
        ));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(PostScriptProgram::parse("{ 1 2 add"), Err(Error::PostScriptSyntax(_))));
        assert!(matches!(PostScriptProgram::parse("1 2 add }"), Err(Error::PostScriptSyntax(_))));
    }

    #[test]
    fn test_inputs_first_deepest() {
        let program = PostScriptProgram::parse("{ sub }").unwrap();
        let stack = program.evaluate(&[5.0, 2.0]).unwrap();
        assert_eq!(stack, vec![Value::Real(3.0)]);
    }

    #[test]
    fn test_stack_operators() {
        assert_eq!(top("1 2 3 3 1 roll pop pop"), Value::Int(3));
        assert_eq!(top("1 2 3 3 -1 roll"), Value::Int(1));
        assert_eq!(top("7 8 9 2 index"), Value::Int(7));
        let program = PostScriptProgram::parse("1 2 2 copy").unwrap();
        assert_eq!(program.evaluate(&[]).unwrap().len(), 4);
        assert_eq!(top("1 2 exch"), Value::Int(1));
        let program = PostScriptProgram::parse("1 2 clear").unwrap();
        assert!(program.evaluate(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_math_operators() {
        assert_eq!(top("7 2 idiv"), Value::Int(3));
        assert_eq!(top("-7 2 mod"), Value::Int(-1));
        assert_eq!(top("1 2 div"), Value::Real(0.5));
        assert_eq!(top("2.5 round"), Value::Real(3.0));
        assert_eq!(top("-2.5 round"), Value::Real(-2.0));
        assert_eq!(top("3.7 cvi"), Value::Int(3));
        assert_eq!(top("1 3 bitshift"), Value::Int(8));
        assert_eq!(top("8 -2 bitshift"), Value::Int(2));
        assert_eq!(top("0 1 atan"), Value::Real(0.0));
        let Value::Real(deg) = top("1 0 atan") else {
            panic!("atan returns a real");
        };
        assert!((deg - 90.0).abs() < 1e-9);
        assert_eq!(top("-1 0 atan").as_number().map(|d| d.round()), Some(270.0));
        assert_eq!(top("true false xor"), Value::Bool(true));
        assert_eq!(top("5 3 and"), Value::Int(1));
    }

    #[test]
    fn test_type_check() {
        let program = PostScriptProgram::parse("true 1 add").unwrap();
        assert!(matches!(program.evaluate(&[]), Err(Error::TypeCheck("add"))));
        let program = PostScriptProgram::parse("1.5 2 idiv").unwrap();
        assert!(matches!(program.evaluate(&[]), Err(Error::TypeCheck("idiv"))));
        let program = PostScriptProgram::parse("7 0.5 mod").unwrap();
        assert!(matches!(program.evaluate(&[]), Err(Error::TypeCheck("mod"))));
    }

    #[test]
    fn test_integral_reals_as_integers() {
        assert_eq!(top("7.0 2 idiv"), Value::Int(3));
        assert_eq!(top("7 2.0 mod"), Value::Int(1));
        assert_eq!(top("1.0 3 bitshift"), Value::Int(8));
        assert_eq!(top("7 8 9 2.0 index"), Value::Int(7));
        let program = PostScriptProgram::parse("2 mod").unwrap();
        assert_eq!(program.evaluate(&[5.0]).unwrap(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_division_by_zero() {
        let program = PostScriptProgram::parse("1 0 div").unwrap();
        assert!(program.evaluate(&[]).is_err());
    }

    #[test]
    fn test_exec_and_if() {
        assert_eq!(top("{ 4 5 mul } exec"), Value::Int(20));
        assert_eq!(top("1 true { 1 add } if"), Value::Int(2));
        assert_eq!(top("1 false { 1 add } if"), Value::Int(1));
    }
}
