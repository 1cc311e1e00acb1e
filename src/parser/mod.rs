pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use crate::typeck::types::TypeDesc;
use ast::*;

/// One parsed source file: its import directives and the contracts it defines.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub imports: Vec<Spanned<String>>,
    pub contracts: Vec<Contract>,
}

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self { tokens, source, pos: 0 }
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|tok| std::mem::discriminant(&tok.node) == std::mem::discriminant(expected))
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected) => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                let name = self.source[tok.span.start..tok.span.end].to_string();
                self.pos += 1;
                Ok(Spanned::new(name, tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    pub fn parse_file(&mut self) -> Result<SourceFile, CompileError> {
        let mut file = SourceFile::default();

        while self.peek_is(&Token::Import) {
            file.imports.push(self.parse_import()?);
        }

        while self.peek().is_some() {
            file.contracts.push(self.parse_contract()?);
        }

        if file.contracts.is_empty() {
            return Err(CompileError::syntax("expected contract, found end of file", self.eof_span()));
        }
        Ok(file)
    }

    fn parse_import(&mut self) -> Result<Spanned<String>, CompileError> {
        let start = self.expect(&Token::Import)?;
        match self.advance().cloned() {
            Some(Spanned { node: Token::StringLit(bytes), span }) => {
                let span = start.to(span);
                let path = String::from_utf8(bytes)
                    .map_err(|_| CompileError::syntax("import path is not valid UTF-8", span))?;
                Ok(Spanned::new(path, span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected import path string, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected import path string, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn parse_contract(&mut self) -> Result<Contract, CompileError> {
        let start = self.expect(&Token::Contract)?;
        let name = self.expect_ident()?;
        let params = self.parse_param_list()?;

        self.expect(&Token::Locks)?;
        let amount = self.expect_ident()?;
        self.expect(&Token::Of)?;
        let asset = self.expect_ident()?;

        self.expect(&Token::LBrace)?;
        let mut clauses = Vec::new();
        while !self.peek_is(&Token::RBrace) {
            clauses.push(self.parse_clause()?);
        }
        let end = self.expect(&Token::RBrace)?;

        Ok(Contract {
            name: name.node,
            params,
            clauses,
            value: ValueInfo {
                name: amount.node.clone(),
                amount: amount.node,
                asset: asset.node,
                ..ValueInfo::default()
            },
            span: start.to(end),
            ..Contract::default()
        })
    }

    fn parse_clause(&mut self) -> Result<Clause, CompileError> {
        let start = self.expect(&Token::Clause)?;
        let name = self.expect_ident()?;
        let params = self.parse_param_list()?;
        let statements = self.parse_block()?;
        Ok(Clause {
            name: name.node,
            params,
            statements,
            span: start.to(Span::new(self.prev_end(), self.prev_end())),
            ..Clause::default()
        })
    }

    /// `( a, b: Integer, c: PublicKey )`; names before a colon share its type.
    fn parse_param_list(&mut self) -> Result<Vec<Param>, CompileError> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if self.peek_is(&Token::RParen) {
            self.advance();
            return Ok(params);
        }
        loop {
            let mut names = vec![self.expect_ident()?];
            while self.peek_is(&Token::Comma) {
                self.advance();
                names.push(self.expect_ident()?);
            }
            self.expect(&Token::Colon)?;
            let ty = self.parse_type()?;
            params.extend(names.into_iter().map(|n| Param::new(n.node, ty, n.span)));

            if self.peek_is(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    fn parse_type(&mut self) -> Result<TypeDesc, CompileError> {
        let name = self.expect_ident()?;
        let mut span = name.span;
        let inner = if self.peek_is(&Token::LParen) {
            self.advance();
            let inner = self.expect_ident()?;
            span = span.to(self.expect(&Token::RParen)?);
            Some(inner.node)
        } else {
            None
        };
        TypeDesc::from_name(&name.node, inner.as_deref()).ok_or_else(|| {
            let text = match &inner {
                Some(i) => format!("{}({i})", name.node),
                None => name.node.clone(),
            };
            CompileError::syntax(format!("unknown type {text}"), span)
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Spanned<Stmt>>, CompileError> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.peek_is(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("expected }, found end of file", self.eof_span()));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let Some(tok) = self.advance().cloned() else {
            return Err(CompileError::syntax("expected statement, found end of file", self.eof_span()));
        };
        let start = tok.span;
        let stmt = match &tok.node {
            Token::Verify => Stmt::Verify(self.parse_expr(0)?),
            Token::Lock => {
                let amount = self.parse_expr(0)?;
                self.expect(&Token::Of)?;
                let asset = self.parse_expr(0)?;
                self.expect(&Token::With)?;
                let program = self.parse_expr(0)?;
                Stmt::Lock { amount, asset, program, index: 0 }
            }
            Token::Unlock => {
                let amount = self.parse_expr(0)?;
                self.expect(&Token::Of)?;
                let asset = self.parse_expr(0)?;
                Stmt::Unlock { amount, asset }
            }
            Token::Define => {
                let name = self.expect_ident()?;
                self.expect(&Token::Colon)?;
                let ty = self.parse_type()?;
                self.expect(&Token::Eq)?;
                let expr = self.parse_expr(0)?;
                Stmt::Define { var: Param::new(name.node, ty, name.span), expr }
            }
            Token::Assign => {
                let target = self.expect_ident()?;
                self.expect(&Token::Eq)?;
                let expr = self.parse_expr(0)?;
                Stmt::Assign { target, expr }
            }
            Token::If => {
                let cond = self.parse_expr(0)?;
                let then_body = self.parse_block()?;
                let else_body = if self.peek_is(&Token::Else) {
                    self.advance();
                    self.parse_block()?
                } else {
                    Vec::new()
                };
                Stmt::If { cond, then_body, else_body }
            }
            other => {
                return Err(CompileError::syntax(
                    format!("expected statement, found {other}"),
                    start,
                ));
            }
        };
        let span = start.to(Span::new(self.prev_end(), self.prev_end()));
        Ok(Spanned::new(stmt, span))
    }

    /// Precedence climbing; every binary operator is left-associative.
    fn parse_expr(&mut self, min_prec: u8) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_unary()?;

        loop {
            let Some(op) = self.peek().and_then(|t| binop_for(&t.node)) else { break };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let op = match self.peek().map(|t| &t.node) {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Tilde) => UnaryOp::Invert,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.tokens[self.pos].span;
        self.advance();

        if op == UnaryOp::Neg {
            if let Some(Spanned { node: Token::IntLit(n), span }) = self.peek() {
                let (n, span) = (*n, *span);
                self.advance();
                return Ok(Spanned::new(Expr::Int(-n), start.to(span)));
            }
        }

        let operand = self.parse_unary()?;
        let span = start.to(operand.span);
        Ok(Spanned::new(Expr::Unary { op, operand: Box::new(operand) }, span))
    }

    fn parse_postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.parse_atom()?;
        while self.peek_is(&Token::LParen) {
            self.advance();
            let args = self.parse_args(&Token::RParen)?;
            let end = self.expect(&Token::RParen)?;
            let span = expr.span.to(end);
            expr = Spanned::new(Expr::Call { callee: Box::new(expr), args }, span);
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to (not including) `close`.
    fn parse_args(&mut self, close: &Token) -> Result<Vec<Spanned<Expr>>, CompileError> {
        let mut args = Vec::new();
        while !self.peek_is(close) {
            if !args.is_empty() {
                self.expect(&Token::Comma)?;
            }
            args.push(self.parse_expr(0)?);
        }
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let Some(tok) = self.advance().cloned() else {
            return Err(CompileError::syntax("expected expression, found end of file", self.eof_span()));
        };
        let span = tok.span;
        let expr = match &tok.node {
            Token::Ident => Expr::Var(self.source[span.start..span.end].to_string()),
            Token::IntLit(n) => Expr::Int(*n),
            Token::HexLit(bytes) | Token::StringLit(bytes) => Expr::Bytes(bytes.clone()),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::LBracket => {
                let elems = self.parse_args(&Token::RBracket)?;
                let end = self.expect(&Token::RBracket)?;
                return Ok(Spanned::new(Expr::List(elems), span.to(end)));
            }
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            other => {
                return Err(CompileError::syntax(format!("expected expression, found {other}"), span));
            }
        };
        Ok(Spanned::new(expr, span))
    }
}

fn binop_for(tok: &Token) -> Option<BinOp> {
    let op = match tok {
        Token::PipePipe => BinOp::Or,
        Token::AmpAmp => BinOp::And,
        Token::Gt => BinOp::Gt,
        Token::Lt => BinOp::Lt,
        Token::GtEq => BinOp::GtEq,
        Token::LtEq => BinOp::LtEq,
        Token::EqEq => BinOp::Eq,
        Token::BangEq => BinOp::Neq,
        Token::Caret => BinOp::BitXor,
        Token::Pipe => BinOp::BitOr,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Amp => BinOp::BitAnd,
        Token::Shl => BinOp::Shl,
        Token::Shr => BinOp::Shr,
        Token::Percent => BinOp::Mod,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        _ => return None,
    };
    Some(op)
}

/// Lexes and parses a single source file without resolving its imports.
pub fn parse(source: &str) -> Result<SourceFile, CompileError> {
    let tokens = crate::lexer::lex(source)?;
    Parser::new(&tokens, source).parse_file()
}
