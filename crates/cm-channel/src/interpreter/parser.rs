//! Recursive-descent parser producing the statement list of a script.
//!
//! Precedence, lowest first: `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, unary `- !`.

use super::lexer::{Token, TokenKind};
use super::{ScriptError, ScriptValue};

/// Maximum expression nesting depth.
///
/// Bounds both the parenthesis and unary recursion of the parser and the
/// height of every parsed expression tree.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(ScriptValue),
    Ident {
        name: String,
        offset: usize,
    },
    Unary {
        op: UnaryOp,
        offset: usize,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        offset: usize,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Return(Option<Expr>),
    Throw(Expr),
}

/// Parse a token stream into statements.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, ScriptError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.program()
}

/// An expression with the height of its tree.
///
/// Evaluation and drop both recurse over the tree, so its height is
/// bounded by [`MAX_DEPTH`] no matter how the nesting was written:
/// parentheses, unary operators, or long operator chains.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn parent_height(offset: usize, lhs: &Node, rhs: &Node) -> Result<usize, ScriptError> {
        Self::checked_height(offset, lhs.height.max(rhs.height) + 1)
    }

    fn checked_height(offset: usize, height: usize) -> Result<usize, ScriptError> {
        if height > MAX_DEPTH {
            return Err(ScriptError::syntax(offset, "expression nested too deeply"));
        }
        Ok(height)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn program(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        let mut statements = Vec::new();

        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.check(&TokenKind::Eof) {
                return Ok(statements);
            }

            statements.push(self.statement()?);

            if !self.eat(&TokenKind::Semicolon) && !self.check(&TokenKind::Eof) {
                let token = self.peek();
                return Err(ScriptError::syntax(
                    token.offset,
                    format!("expected ';' but found {:?}", token.kind),
                ));
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        if self.eat(&TokenKind::Return) {
            if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::Eof) {
                return Ok(Stmt::Return(None));
            }
            return Ok(Stmt::Return(Some(self.expression()?.expr)));
        }

        if self.check(&TokenKind::Throw) {
            let offset = self.advance().offset;
            if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::Eof) {
                return Err(ScriptError::syntax(offset, "throw requires an expression"));
            }
            return Ok(Stmt::Throw(self.expression()?.expr));
        }

        Ok(Stmt::Expr(self.expression()?.expr))
    }

    fn expression(&mut self) -> Result<Node, ScriptError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ScriptError::syntax(
                self.peek().offset,
                "expression nested too deeply",
            ));
        }
        let node = self.or();
        self.depth -= 1;
        node
    }

    fn or(&mut self) -> Result<Node, ScriptError> {
        self.logical_level(Self::and, TokenKind::OrOr, LogicalOp::Or)
    }

    fn and(&mut self) -> Result<Node, ScriptError> {
        self.logical_level(Self::equality, TokenKind::AndAnd, LogicalOp::And)
    }

    fn logical_level(
        &mut self,
        next: fn(&mut Self) -> Result<Node, ScriptError>,
        token: TokenKind,
        op: LogicalOp,
    ) -> Result<Node, ScriptError> {
        let mut lhs = next(self)?;
        while self.check(&token) {
            let offset = self.advance().offset;
            let rhs = next(self)?;
            let height = Node::parent_height(offset, &lhs, &rhs)?;
            lhs = Node {
                expr: Expr::Logical {
                    op,
                    lhs: Box::new(lhs.expr),
                    rhs: Box::new(rhs.expr),
                },
                height,
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Node, ScriptError> {
        self.binary_level(Self::comparison, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Node, ScriptError> {
        self.binary_level(Self::additive, |kind| match kind {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Node, ScriptError> {
        self.binary_level(Self::multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Node, ScriptError> {
        self.binary_level(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Node, ScriptError>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Node, ScriptError> {
        let mut lhs = next(self)?;
        while let Some(op) = operator(&self.peek().kind) {
            let offset = self.advance().offset;
            let rhs = next(self)?;
            let height = Node::parent_height(offset, &lhs, &rhs)?;
            lhs = Node {
                expr: Expr::Binary {
                    op,
                    offset,
                    lhs: Box::new(lhs.expr),
                    rhs: Box::new(rhs.expr),
                },
                height,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, ScriptError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.primary(),
        };
        let offset = self.advance().offset;

        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ScriptError::syntax(offset, "expression nested too deeply"));
        }
        let operand = self.unary();
        self.depth -= 1;

        let operand = operand?;
        let height = Node::checked_height(offset, operand.height + 1)?;
        Ok(Node {
            expr: Expr::Unary {
                op,
                offset,
                operand: Box::new(operand.expr),
            },
            height,
        })
    }

    fn primary(&mut self) -> Result<Node, ScriptError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Literal(ScriptValue::Number(n)),
            TokenKind::Str(s) => Expr::Literal(ScriptValue::Str(s)),
            TokenKind::True => Expr::Literal(ScriptValue::Bool(true)),
            TokenKind::False => Expr::Literal(ScriptValue::Bool(false)),
            TokenKind::Null => Expr::Literal(ScriptValue::Null),
            TokenKind::Ident(name) => Expr::Ident {
                name,
                offset: token.offset,
            },
            TokenKind::LParen => {
                let inner = self.expression()?;
                if !self.eat(&TokenKind::RParen) {
                    return Err(ScriptError::syntax(self.peek().offset, "expected ')'"));
                }
                return Ok(inner);
            }
            TokenKind::Eof => {
                return Err(ScriptError::syntax(
                    token.offset,
                    "unexpected end of script",
                ))
            }
            other => {
                return Err(ScriptError::syntax(
                    token.offset,
                    format!("unexpected token {:?}", other),
                ))
            }
        };
        Ok(Node { expr, height: 1 })
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}
