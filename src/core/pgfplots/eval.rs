//! Arithmetic expression evaluator for chart previews and domain bounds.
//!
//! Expressions use the editor convention (radians, `log` = natural log).
//! They are compiled once into an [`Expr`] tree and then evaluated per
//! sample point.

use crate::utils::error::{TranscodeError, TranscodeResult};

/// Nesting limit for parentheses, unary signs and function calls.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
    Sign,
    Deg,
    Rad,
    Min,
    Max,
    Pow,
    Mod,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "sec" => Func::Sec,
            "csc" => Func::Csc,
            "cot" => Func::Cot,
            "asin" | "arcsin" => Func::Asin,
            "acos" | "arccos" => Func::Acos,
            "atan" | "arctan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "log2" => Func::Log2,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "sign" => Func::Sign,
            "deg" => Func::Deg,
            "rad" => Func::Rad,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            "mod" => Func::Mod,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Func::Min | Func::Max | Func::Pow | Func::Mod => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            Func::Sin => a.sin(),
            Func::Cos => a.cos(),
            Func::Tan => a.tan(),
            Func::Sec => 1.0 / a.cos(),
            Func::Csc => 1.0 / a.sin(),
            Func::Cot => 1.0 / a.tan(),
            Func::Asin => a.asin(),
            Func::Acos => a.acos(),
            Func::Atan => a.atan(),
            Func::Sinh => a.sinh(),
            Func::Cosh => a.cosh(),
            Func::Tanh => a.tanh(),
            Func::Exp => a.exp(),
            Func::Ln => a.ln(),
            Func::Log10 => a.log10(),
            Func::Log2 => a.log2(),
            Func::Sqrt => a.sqrt(),
            Func::Abs => a.abs(),
            Func::Floor => a.floor(),
            Func::Ceil => a.ceil(),
            Func::Round => a.round(),
            Func::Sign => {
                if a == 0.0 {
                    0.0
                } else {
                    a.signum()
                }
            }
            Func::Deg => a.to_degrees(),
            Func::Rad => a.to_radians(),
            Func::Min => a.min(b),
            Func::Max => a.max(b),
            Func::Pow => a.powf(b),
            Func::Mod => a % b,
        }
    }
}

/// Compiled expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    X,
    Y,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Evaluate at `(x, y)`. Domain errors yield NaN or infinities.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        match self {
            Expr::Num(v) => *v,
            Expr::X => x,
            Expr::Y => y,
            Expr::Neg(inner) => -inner.eval(x, y),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(x, y), rhs.eval(x, y));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, args) => {
                let values: Vec<f64> = args.iter().map(|a| a.eval(x, y)).collect();
                func.apply(&values)
            }
        }
    }

    pub fn uses_y(&self) -> bool {
        match self {
            Expr::Y => true,
            Expr::Num(_) | Expr::X => false,
            Expr::Neg(inner) => inner.uses_y(),
            Expr::Binary(_, lhs, rhs) => lhs.uses_y() || rhs.uses_y(),
            Expr::Call(_, args) => args.iter().any(Expr::uses_y),
        }
    }
}

/// Compile an expression.
pub fn compile(source: &str) -> TranscodeResult<Expr> {
    let mut parser = Parser {
        chars: source.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(TranscodeError::invalid(format!(
            "unexpected '{}' at {} in '{}'",
            parser.chars[parser.pos], parser.pos, source
        )));
    }
    Ok(expr)
}

/// Evaluate a constant expression such as a domain bound (`-2*pi`).
pub fn eval_constant(source: &str) -> Option<f64> {
    let expr = compile(source).ok()?;
    let value = expr.eval(0.0, 0.0);
    value.is_finite().then_some(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, what: &str) -> TranscodeError {
        TranscodeError::invalid(format!("{} at position {}", what, self.pos))
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<F>(&mut self, f: F) -> TranscodeResult<Expr>
    where
        F: FnOnce(&mut Self) -> TranscodeResult<Expr>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> TranscodeResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some('+') => BinOp::Add,
                Some('-') => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // term := unary (('*' | '/') unary | implicit unary)*
    fn term(&mut self) -> TranscodeResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    BinOp::Mul
                }
                Some('/') => {
                    self.pos += 1;
                    BinOp::Div
                }
                // `2x`, `3(x+1)`, `x y`
                Some(c) if c.is_ascii_alphanumeric() || c == '(' || c == '.' => BinOp::Mul,
                _ => return Ok(lhs),
            };
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> TranscodeResult<Expr> {
        self.nested(Self::signed)
    }

    fn signed(&mut self) -> TranscodeResult<Expr> {
        if self.eat('-') {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    // power := primary ('^' unary)?   (right associative)
    fn power(&mut self) -> TranscodeResult<Expr> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> TranscodeResult<Expr> {
        self.nested(Self::atom)
    }

    fn atom(&mut self) -> TranscodeResult<Expr> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.expr()?;
                if !self.eat(')') {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some('{') => {
                self.pos += 1;
                let inner = self.expr()?;
                if !self.eat('}') {
                    return Err(self.error("expected '}'"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '\\' => self.identifier(),
            Some(c) => Err(self.error(&format!("unexpected '{}'", c))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn number(&mut self) -> TranscodeResult<Expr> {
        let start = self.pos;
        while self.pos < self.chars.len()
            && (self.chars[self.pos].is_ascii_digit() || self.chars[self.pos] == '.')
        {
            self.pos += 1;
        }
        // Exponent part, only when digits follow (`2e3`, not `2e` = 2*e).
        if self.pos < self.chars.len() && matches!(self.chars[self.pos], 'e' | 'E') {
            let mut look = self.pos + 1;
            if look < self.chars.len() && matches!(self.chars[look], '+' | '-') {
                look += 1;
            }
            if look < self.chars.len() && self.chars[look].is_ascii_digit() {
                self.pos = look;
                while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Expr::Num)
            .map_err(|_| self.error(&format!("bad number '{}'", text)))
    }

    fn identifier(&mut self) -> TranscodeResult<Expr> {
        // A leading backslash (`\pi`) is accepted and ignored.
        if self.chars.get(self.pos) == Some(&'\\') {
            self.pos += 1;
        }
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_alphanumeric() {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.as_str() {
            "x" | "t" => return Ok(Expr::X),
            "y" => return Ok(Expr::Y),
            "pi" => return Ok(Expr::Num(std::f64::consts::PI)),
            "e" => return Ok(Expr::Num(std::f64::consts::E)),
            _ => {}
        }
        let func = Func::lookup(&name)
            .ok_or_else(|| self.error(&format!("unknown identifier '{}'", name)))?;
        let args = if self.eat('(') {
            let mut args = vec![self.expr()?];
            while self.eat(',') {
                args.push(self.expr()?);
            }
            if !self.eat(')') {
                return Err(self.error("expected ')'"));
            }
            args
        } else {
            // `sin x`
            vec![self.power()?]
        };
        if args.len() != func.arity() {
            return Err(self.error(&format!(
                "'{}' takes {} argument(s), got {}",
                name,
                func.arity(),
                args.len()
            )));
        }
        Ok(Expr::Call(func, args))
    }
}
