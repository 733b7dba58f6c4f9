use crate::error::HostParseError;

use super::ast::{AssignOp, BinOp, Expr, Place, Stmt, Swizzle, TypeName};
use super::lexer::{Lexer, Token, TokenWithPos};
use super::Section;

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<TokenWithPos>,
    pos: usize,
    section: Section,
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPos>, section: Section) -> Self {
        Self { tokens, pos: 0, section }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1))
    }

    fn peek(&self) -> &Token {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, message: impl Into<String>) -> HostParseError {
        let (line, col) = self.current_pos();
        HostParseError::Syntax { section: self.section, line, col, message: message.into() }
    }

    fn expect(&mut self, expected: Token) -> Result<(), HostParseError> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {expected:?}, got {:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, HostParseError> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            tok => Err(self.err(format!("expected identifier, got {tok:?}"))),
        }
    }

    fn expect_swizzle(&mut self) -> Result<Swizzle, HostParseError> {
        let text = self.expect_ident()?;
        Swizzle::parse(&text).ok_or_else(|| self.err(format!("invalid swizzle .{text}")))
    }

    // ── Statements ────────────────────────────────────────────────────────

    pub fn parse_body(&mut self) -> Result<Vec<Stmt>, HostParseError> {
        let mut stmts = Vec::new();
        while self.peek() != &Token::Eof {
            if self.peek() == &Token::Semi {
                self.advance();
                continue;
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt, HostParseError> {
        let stmt = if self.at_declaration() {
            self.parse_declaration()?
        } else if self.at_assignment() {
            self.parse_assignment()?
        } else {
            Stmt::Expr(self.parse_expr()?)
        };
        self.expect(Token::Semi)?;
        Ok(stmt)
    }

    /// `[const|static] TYPE name ...`
    fn at_declaration(&self) -> bool {
        let skip = match self.peek() {
            Token::Ident(q) if q == "const" || q == "static" => 1,
            _ => 0,
        };
        matches!(
            (self.peek_ahead(skip), self.peek_ahead(skip + 1)),
            (Token::Ident(ty), Token::Ident(_)) if TypeName::from_keyword(ty).is_some()
        )
    }

    /// `name OP=` or `name.swz OP=`
    fn at_assignment(&self) -> bool {
        let op_at = match (self.peek(), self.peek_ahead(1)) {
            (Token::Ident(_), Token::Dot) => 3,
            (Token::Ident(_), _) => 1,
            _ => return false,
        };
        assign_op(self.peek_ahead(op_at)).is_some()
    }

    fn parse_declaration(&mut self) -> Result<Stmt, HostParseError> {
        if matches!(self.peek(), Token::Ident(q) if q == "const" || q == "static") {
            self.advance();
        }
        let keyword = self.expect_ident()?;
        let ty = TypeName::from_keyword(&keyword)
            .ok_or_else(|| self.err(format!("unknown type {keyword}")))?;
        let name = self.expect_ident()?;
        let init = if self.peek() == &Token::Assign {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::Declare { ty, name, init })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, HostParseError> {
        let name = self.expect_ident()?;
        let swizzle = if self.peek() == &Token::Dot {
            self.advance();
            Some(self.expect_swizzle()?)
        } else {
            None
        };
        let op = assign_op(self.peek()).ok_or_else(|| self.err("expected assignment"))?;
        self.advance();
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { target: Place { name, swizzle }, op, value })
    }

    // ── Expressions ───────────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, HostParseError> {
        let cond = self.parse_comparison()?;
        if self.peek() != &Token::Question {
            return Ok(cond);
        }
        self.advance();
        let then = self.parse_expr()?;
        self.expect(Token::Colon)?;
        let otherwise = self.parse_expr()?;
        Ok(Expr::Select {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr, HostParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::Ne,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, HostParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, HostParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, HostParseError> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, HostParseError> {
        let mut expr = self.parse_primary()?;
        while self.peek() == &Token::Dot {
            self.advance();
            let swizzle = self.expect_swizzle()?;
            expr = Expr::Swizzle { base: Box::new(expr), swizzle };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, HostParseError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if self.peek() == &Token::LParen => {
                let args = self.parse_args()?;
                Ok(match TypeName::from_keyword(&name) {
                    Some(ty) => Expr::Construct { ty, args },
                    None => Expr::Call { name, args },
                })
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            tok => Err(self.err(format!("expected an expression, got {tok:?}"))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, HostParseError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == &Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                tok => return Err(self.err(format!("expected ',' or ')', got {tok:?}"))),
            }
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    Some(match token {
        Token::Assign => AssignOp::Set,
        Token::PlusAssign => AssignOp::Add,
        Token::MinusAssign => AssignOp::Sub,
        Token::StarAssign => AssignOp::Mul,
        Token::SlashAssign => AssignOp::Div,
        _ => return None,
    })
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parses one function body of host code.
pub fn parse_body(src: &str, section: Section) -> Result<Vec<Stmt>, HostParseError> {
    let tokens = Lexer::new(src, section).tokenize()?;
    Parser::new(tokens, section).parse_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Stmt> {
        parse_body(src, Section::Distance).unwrap()
    }

    fn var(name: &str) -> Expr {
        Expr::Var(name.into())
    }

    fn syntax_error(src: &str) -> (usize, usize, String) {
        match parse_body(src, Section::Material).unwrap_err() {
            HostParseError::Syntax { line, col, message, .. } => (line, col, message),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn declaration_with_call() {
        assert_eq!(
            parse("float distance = sphereSD(position, radius);"),
            vec![Stmt::Declare {
                ty: TypeName::FLOAT,
                name: "distance".into(),
                init: Some(Expr::Call {
                    name: "sphereSD".into(),
                    args: vec![var("position"), var("radius")],
                }),
            }]
        );
    }

    #[test]
    fn const_declaration_without_initializer() {
        assert_eq!(
            parse("const float3 p;"),
            vec![Stmt::Declare { ty: TypeName::FLOAT3, name: "p".into(), init: None }]
        );
    }

    #[test]
    fn constructor_is_not_a_call() {
        let stmts = parse("float4 c = float4(p, 1);");
        let Stmt::Declare { init: Some(Expr::Construct { ty, args }), .. } = &stmts[0] else {
            panic!("{stmts:?}");
        };
        assert_eq!(*ty, TypeName::FLOAT4);
        assert_eq!(args, &vec![var("p"), Expr::Number(1.0)]);
    }

    #[test]
    fn compound_and_swizzled_assignment() {
        assert_eq!(
            parse("d -= 1; p.xz = q.zx;"),
            vec![
                Stmt::Assign {
                    target: Place { name: "d".into(), swizzle: None },
                    op: AssignOp::Sub,
                    value: Expr::Number(1.0),
                },
                Stmt::Assign {
                    target: Place { name: "p".into(), swizzle: Swizzle::parse("xz") },
                    op: AssignOp::Set,
                    value: Expr::Swizzle {
                        base: Box::new(var("q")),
                        swizzle: Swizzle::parse("zx").unwrap(),
                    },
                },
            ]
        );
    }

    #[test]
    fn precedence_and_associativity() {
        let stmts = parse("x = a - b - c * d;");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        // (a - b) - (c * d)
        assert_eq!(
            value,
            &binary(
                BinOp::Sub,
                binary(BinOp::Sub, var("a"), var("b")),
                binary(BinOp::Mul, var("c"), var("d")),
            )
        );
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiply() {
        let stmts = parse("x = -a * b;");
        let Stmt::Assign { value, .. } = &stmts[0] else { panic!() };
        assert_eq!(value, &binary(BinOp::Mul, Expr::Neg(Box::new(var("a"))), var("b")));
    }

    #[test]
    fn select_nests_to_the_right() {
        let stmts = parse("x = a < b ? 1 : c > d ? 2 : 3;");
        let Stmt::Assign { value: Expr::Select { otherwise, .. }, .. } = &stmts[0] else {
            panic!()
        };
        assert!(matches!(**otherwise, Expr::Select { .. }));
    }

    #[test]
    fn expression_statement_and_empty_statements() {
        assert_eq!(
            parse(";; hook(position);"),
            vec![Stmt::Expr(Expr::Call { name: "hook".into(), args: vec![var("position")] })]
        );
    }

    #[test]
    fn chained_swizzles() {
        let stmts = parse("float y = c.rgb.g;");
        let Stmt::Declare { init: Some(Expr::Swizzle { base, .. }), .. } = &stmts[0] else {
            panic!()
        };
        assert!(matches!(**base, Expr::Swizzle { .. }));
    }

    #[test]
    fn missing_semicolon_reports_position() {
        let (line, col, message) = syntax_error("float a = 1\nfloat b = 2;");
        assert_eq!((line, col), (2, 1));
        assert!(message.starts_with("expected Semi"), "{message}");
    }

    #[test]
    fn bad_swizzle_is_rejected() {
        let (_, _, message) = syntax_error("float a = p.origin;");
        assert_eq!(message, "invalid swizzle .origin");
    }

    #[test]
    fn unclosed_call() {
        let (_, _, message) = syntax_error("float a = min(1, 2;");
        assert!(message.starts_with("expected ',' or ')'"), "{message}");
    }
}
