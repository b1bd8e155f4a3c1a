use crate::traits::Scalar;
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;

/// OpCodes for the Stack-based Virtual Machine.
/// The VM operates on a stack of `Scalar` values (f64, Dual or HyperDual).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes the value of a variable (by index) onto the stack.
    /// Indices follow the variable names given to the `Compiler`.
    LoadVar(usize),
    /// Pushes the value of a parameter (by index) onto the stack.
    LoadParam(usize),
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    /// Pops top value (a), pushes -a.
    Neg,
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Returns true if any instruction reads the variable `index`.
    pub fn uses_var(&self, index: usize) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, OpCode::LoadVar(i) if *i == index))
    }
}

/// Stack-based Virtual Machine for evaluating expressions.
///
/// The VM is stateless; `execute` takes all necessary context:
/// - `bytecode`: Instructions to run.
/// - `vars`: Variable values (read-only).
/// - `params`: Parameter values (read-only).
/// - `stack`: A mutable buffer for intermediate computations.
pub struct VM;

impl VM {
    /// Executes the bytecode and returns the single value left on the stack.
    ///
    /// # Type Parameters
    /// * `T`: The scalar type (e.g., `f64`, `Dual` or `HyperDual`).
    pub fn execute<T: Scalar>(
        bytecode: &Bytecode,
        vars: &[T],
        params: &[T],
        stack: &mut Vec<T>,
    ) -> Result<T> {
        stack.clear();

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(val) => {
                    let value =
                        T::from_f64(*val).ok_or_else(|| anyhow!("Unrepresentable constant {val}"))?;
                    stack.push(value);
                }
                OpCode::LoadVar(idx) => {
                    let value = vars
                        .get(*idx)
                        .ok_or_else(|| anyhow!("Variable index {idx} out of range"))?;
                    stack.push(*value);
                }
                OpCode::LoadParam(idx) => {
                    let value = params
                        .get(*idx)
                        .ok_or_else(|| anyhow!("Parameter index {idx} out of range"))?;
                    stack.push(*value);
                }
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Pow => {
                    let b = pop(stack)?;
                    let a = pop(stack)?;
                    stack.push(match op {
                        OpCode::Add => a + b,
                        OpCode::Sub => a - b,
                        OpCode::Mul => a * b,
                        OpCode::Div => a / b,
                        _ => a.powf(b),
                    });
                }
                OpCode::Sin => {
                    let a = pop(stack)?;
                    stack.push(a.sin());
                }
                OpCode::Cos => {
                    let a = pop(stack)?;
                    stack.push(a.cos());
                }
                OpCode::Tan => {
                    let a = pop(stack)?;
                    stack.push(a.tan());
                }
                OpCode::Exp => {
                    let a = pop(stack)?;
                    stack.push(a.exp());
                }
                OpCode::Log => {
                    let a = pop(stack)?;
                    stack.push(a.ln());
                }
                OpCode::Sqrt => {
                    let a = pop(stack)?;
                    stack.push(a.sqrt());
                }
                OpCode::Neg => {
                    let a = pop(stack)?;
                    stack.push(-a);
                }
            }
        }

        let result = pop(stack)?;
        if !stack.is_empty() {
            bail!("Malformed bytecode: {} values left on the stack", stack.len());
        }
        Ok(result)
    }
}

fn pop<T: Scalar>(stack: &mut Vec<T>) -> Result<T> {
    stack
        .pop()
        .ok_or_else(|| anyhow!("Malformed bytecode: stack underflow"))
}

// --- AST & Parser ---

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary(Box<Expr>, char, Box<Expr>), // char is operator +, -, *, /, ^
    Unary(char, Box<Expr>),             // -
    Call(String, Box<Expr>),            // functions like sin(x)
}

/// Compiles an AST (`Expr`) into `Bytecode`.
/// Resolves variable and parameter names to indices.
pub struct Compiler {
    pub var_map: HashMap<String, usize>,
    pub param_map: HashMap<String, usize>,
}

impl Compiler {
    pub fn new(var_names: &[&str], param_names: &[&str]) -> Self {
        let var_map = var_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        let param_map = param_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { var_map, param_map }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<()> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                if let Some(&idx) = self.var_map.get(name) {
                    ops.push(OpCode::LoadVar(idx));
                } else if let Some(&idx) = self.param_map.get(name) {
                    ops.push(OpCode::LoadParam(idx));
                } else {
                    bail!("Unknown variable or parameter: {}", name);
                }
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                ops.push(match op {
                    '+' => OpCode::Add,
                    '-' => OpCode::Sub,
                    '*' => OpCode::Mul,
                    '/' => OpCode::Div,
                    '^' => OpCode::Pow,
                    _ => bail!("Unknown binary operator: {}", op),
                });
            }
            Expr::Unary(op, operand) => {
                self.compile_recursive(operand, ops)?;
                match op {
                    '-' => ops.push(OpCode::Neg),
                    _ => bail!("Unknown unary operator: {}", op),
                }
            }
            Expr::Call(func, arg) => {
                self.compile_recursive(arg, ops)?;
                ops.push(match func.as_str() {
                    "sin" => OpCode::Sin,
                    "cos" => OpCode::Cos,
                    "tan" => OpCode::Tan,
                    "exp" => OpCode::Exp,
                    "log" => OpCode::Log,
                    "sqrt" => OpCode::Sqrt,
                    _ => bail!("Unknown function: {}", func),
                });
            }
        }
        Ok(())
    }
}

// --- Simple Parser ---

/// Parses a string expression into an AST.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        bail!("Unexpected trailing input at token {:?}", token);
    }
    Ok(expr)
}

/// Parses and compiles `input` in one step.
pub fn compile(input: &str, var_names: &[&str], param_names: &[&str]) -> Result<Bytecode> {
    let expr = parse(input).with_context(|| format!("Failed to parse \"{input}\""))?;
    Compiler::new(var_names, param_names)
        .compile(&expr)
        .with_context(|| format!("Failed to compile \"{input}\""))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else if (d == 'e' || d == 'E') && !num_str.contains(['e', 'E']) {
                    num_str.push(d);
                    chars.next();
                    if let Some(&sign) = chars.peek() {
                        if sign == '+' || sign == '-' {
                            num_str.push(sign);
                            chars.next();
                        }
                    }
                } else {
                    break;
                }
            }
            let value = num_str
                .parse()
                .with_context(|| format!("Invalid number literal \"{num_str}\""))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            tokens.push(match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => bail!("Unexpected character '{}'", c),
            });
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).cloned()
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => '+',
                Token::Minus => '-',
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => '*',
                Token::Slash => '/',
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // -x^2 is -(x^2)
    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary('-', Box::new(expr)));
        }
        self.parse_power()
    }

    // right associative: a^b^c is a^(b^c)
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), '^', Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume(); // eat '('
                    let arg = self.parse_expression()?;
                    self.expect_closing()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_closing()?;
                Ok(expr)
            }
            Some(token) => bail!("Unexpected token {:?}", token),
            None => bail!("Unexpected end of expression"),
        }
    }

    fn expect_closing(&mut self) -> Result<()> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => bail!("Expected ')'"),
        }
    }
}
