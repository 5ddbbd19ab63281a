use crate::core::diag::{Position, Span};
use crate::core::lexer::{Token, TokenKind, TokenKind as TK};
use crate::core::tree::*;

mod errors;

pub use errors::{ParseError, ParseErrorKind};

/// Recursive-descent parser over the lexed token stream of one source unit.
///
/// The token slice must end with an `Eof` token. Type annotations and base
/// class lists are kept as source text slices, not parsed structures: the
/// downstream checks care about their presence, not their meaning.
pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    last_end: Position,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
            last_end: Position::start(),
        }
    }

    fn curr(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &'a Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'a Token {
        let tok = self.curr();
        // Layout tokens sit at the start of the following line; letting them
        // move `last_end` would drag span ends past the construct's own text.
        if !matches!(tok.kind, TK::Newline | TK::Indent | TK::Dedent | TK::Eof) {
            self.last_end = tok.span.end;
        }
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.curr().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, ParseError> {
        if self.curr().kind == kind {
            Ok(self.advance())
        } else {
            let found = self.curr().clone();
            let span = found.span;
            Err(ParseErrorKind::ExpectedToken(kind, found).at(span))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match &self.curr().kind {
            TK::Ident(name) => {
                let name = name.clone();
                let span = self.curr().span;
                self.advance();
                Ok((name, span))
            }
            _ => {
                let found = self.curr().clone();
                let span = found.span;
                Err(ParseErrorKind::ExpectedIdent(found).at(span))
            }
        }
    }

    fn at_stmt_end(&self) -> bool {
        matches!(
            self.curr().kind,
            TK::Newline | TK::Semicolon | TK::Dedent | TK::Eof
        )
    }

    fn skip_newlines(&mut self) {
        while self.curr().kind == TK::Newline {
            self.advance();
        }
    }

    /// Consumes the rest of the logical line, newline included.
    fn consume_line(&mut self) {
        while !matches!(self.curr().kind, TK::Newline | TK::Eof) {
            self.advance();
        }
        self.eat(TK::Newline);
    }

    /// Source text from the current token up to (not including) the first
    /// bracket-depth-zero stop token or end of line.
    fn text_until(&mut self, stops: &[TokenKind]) -> (String, Span) {
        let start = self.curr().span.start;
        let mut depth = 0usize;
        loop {
            let kind = &self.curr().kind;
            if *kind == TK::Eof {
                break;
            }
            if depth == 0 && (stops.contains(kind) || *kind == TK::Newline) {
                break;
            }
            match kind {
                TK::LParen | TK::LBracket | TK::LBrace => depth += 1,
                TK::RParen | TK::RBracket | TK::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
        let end = self.last_end;
        let text = if end.offset > start.offset {
            self.source[start.offset..end.offset].trim().to_string()
        } else {
            String::new()
        };
        (text, Span::new(start, end))
    }

    // --- Unit ---

    pub fn parse(&mut self) -> Result<UnitTree, ParseError> {
        self.skip_newlines();

        // Import lines ahead of the definition are preserved textually by the
        // conversion patterns; here they only need to be stepped over.
        while matches!(self.curr().kind, TK::KwImport | TK::KwFrom) {
            self.consume_line();
            self.skip_newlines();
        }

        let deco_start = self.consume_decorators();
        let unit = match self.curr().kind {
            TK::KwDef => UnitTree::Function(self.parse_func_def(false, deco_start)?),
            TK::KwClass => UnitTree::Class(self.parse_class_def(deco_start)?),
            _ => {
                let found = self.curr().clone();
                let span = found.span;
                return Err(ParseErrorKind::ExpectedUnitDef(found).at(span));
            }
        };

        // Trailing material (usage examples, additional blocks) is outside
        // the unit contract; skip it rather than failing the whole unit.
        while self.curr().kind != TK::Eof {
            self.advance();
        }
        Ok(unit)
    }

    fn consume_decorators(&mut self) -> Option<Position> {
        let mut start = None;
        while self.curr().kind == TK::At {
            if start.is_none() {
                start = Some(self.curr().span.start);
            }
            self.consume_line();
            self.skip_newlines();
        }
        start
    }

    // --- Definitions ---

    fn parse_func_def(
        &mut self,
        is_method: bool,
        deco_start: Option<Position>,
    ) -> Result<FunctionDef, ParseError> {
        let header_start = deco_start.unwrap_or(self.curr().span.start);
        self.expect(TK::KwDef)?;
        let (name, _) = self.expect_ident()?;
        self.expect(TK::LParen)?;
        let params = self.parse_params()?;
        self.expect(TK::RParen)?;

        let return_annotation = if self.eat(TK::Arrow) {
            let (text, _) = self.text_until(&[TK::Colon]);
            Some(text)
        } else {
            None
        };

        let colon = self.expect(TK::Colon)?;
        let header_span = Span::new(header_start, colon.span.end);

        let (docstring, body) = self.parse_def_body()?;
        Ok(FunctionDef {
            name,
            params,
            return_annotation,
            docstring,
            body,
            is_method,
            header_span,
            span: Span::new(header_start, self.last_end),
        })
    }

    fn parse_def_body(&mut self) -> Result<(Option<DocString>, Vec<Stmt>), ParseError> {
        if !self.eat(TK::Newline) {
            // Single-line body: `def f(): return x`
            let body = self.parse_simple_line()?;
            return Ok((None, body));
        }

        if self.curr().kind != TK::Indent {
            let found = self.curr().clone();
            let span = found.span;
            return Err(ParseErrorKind::ExpectedBlock(found).at(span));
        }
        self.advance();

        let docstring = self.try_docstring();
        let mut body = Vec::new();
        while !matches!(self.curr().kind, TK::Dedent | TK::Eof) {
            self.parse_stmt_into(&mut body)?;
        }
        self.eat(TK::Dedent);
        Ok((docstring, body))
    }

    fn try_docstring(&mut self) -> Option<DocString> {
        if let TK::StrLit(text) = &self.curr().kind {
            if matches!(self.peek().kind, TK::Newline | TK::Dedent | TK::Eof) {
                let doc = DocString {
                    text: text.clone(),
                    span: self.curr().span,
                };
                self.advance();
                self.eat(TK::Newline);
                return Some(doc);
            }
        }
        None
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        while self.curr().kind != TK::RParen {
            let start = self.curr().span.start;
            let mut prefix = String::new();
            if self.eat(TK::DoubleStar) {
                prefix.push_str("**");
            } else if self.eat(TK::Star) {
                // Bare `*` is a keyword-only marker, not a parameter.
                if matches!(self.curr().kind, TK::Comma | TK::RParen) {
                    self.eat(TK::Comma);
                    continue;
                }
                prefix.push('*');
            }

            let name = match &self.curr().kind {
                TK::Ident(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                _ => {
                    let found = self.curr().clone();
                    let span = found.span;
                    return Err(ParseErrorKind::ExpectedParam(found).at(span));
                }
            };

            let annotation = if self.eat(TK::Colon) {
                let (text, _) = self.text_until(&[TK::Comma, TK::RParen, TK::Assign]);
                Some(text)
            } else {
                None
            };

            let has_default = if self.eat(TK::Assign) {
                let (_, _) = self.text_until(&[TK::Comma, TK::RParen]);
                true
            } else {
                false
            };

            params.push(Param {
                name: format!("{prefix}{name}"),
                annotation,
                has_default,
                span: Span::new(start, self.last_end),
            });

            if !self.eat(TK::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class_def(&mut self, deco_start: Option<Position>) -> Result<ClassDef, ParseError> {
        let header_start = deco_start.unwrap_or(self.curr().span.start);
        self.expect(TK::KwClass)?;
        let (name, _) = self.expect_ident()?;

        let mut bases = Vec::new();
        if self.eat(TK::LParen) {
            while self.curr().kind != TK::RParen {
                let (text, _) = self.text_until(&[TK::Comma, TK::RParen]);
                if !text.is_empty() {
                    bases.push(text);
                }
                if !self.eat(TK::Comma) {
                    break;
                }
            }
            self.expect(TK::RParen)?;
        }

        let colon = self.expect(TK::Colon)?;
        let header_span = Span::new(header_start, colon.span.end);
        self.expect(TK::Newline)?;
        if self.curr().kind != TK::Indent {
            let found = self.curr().clone();
            let span = found.span;
            return Err(ParseErrorKind::ExpectedBlock(found).at(span));
        }
        self.advance();

        let docstring = self.try_docstring();
        let mut methods = Vec::new();
        let mut body = Vec::new();
        while !matches!(self.curr().kind, TK::Dedent | TK::Eof) {
            if matches!(self.curr().kind, TK::At | TK::KwDef) {
                let deco = self.consume_decorators();
                methods.push(self.parse_func_def(true, deco)?);
            } else {
                self.parse_stmt_into(&mut body)?;
            }
        }
        self.eat(TK::Dedent);

        Ok(ClassDef {
            name,
            bases,
            docstring,
            methods,
            body,
            header_span,
            span: Span::new(header_start, self.last_end),
        })
    }

    // --- Statements ---

    fn parse_stmt_into(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        match self.curr().kind {
            TK::KwIf | TK::KwWhile | TK::KwFor | TK::KwTry | TK::KwWith | TK::KwDef | TK::At => {
                out.push(self.parse_compound_stmt()?);
            }
            TK::Newline => {
                self.advance();
            }
            _ => {
                out.extend(self.parse_simple_line()?);
            }
        }
        Ok(())
    }

    fn parse_compound_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.curr().span.start;
        let kind = match self.curr().kind {
            TK::At | TK::KwDef => {
                let deco = self.consume_decorators();
                let def = self.parse_func_def(false, deco.or(Some(start)))?;
                StmtKind::FuncDef(Box::new(def))
            }
            TK::KwIf => {
                self.advance();
                let mut arms = Vec::new();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                arms.push((Some(cond), body));
                loop {
                    if self.eat(TK::KwElif) {
                        let cond = self.parse_expr()?;
                        let body = self.parse_block()?;
                        arms.push((Some(cond), body));
                    } else if self.eat(TK::KwElse) {
                        let body = self.parse_block()?;
                        arms.push((None, body));
                        break;
                    } else {
                        break;
                    }
                }
                StmtKind::If { arms }
            }
            TK::KwWhile => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TK::KwFor => {
                self.advance();
                let target = self.parse_for_target()?;
                self.expect(TK::KwIn)?;
                let iter = self.parse_testlist()?;
                let body = self.parse_block()?;
                let else_body = if self.eat(TK::KwElse) {
                    self.parse_block()?
                } else {
                    Vec::new()
                };
                StmtKind::For {
                    target,
                    iter,
                    body,
                    else_body,
                }
            }
            TK::KwTry => {
                self.advance();
                let mut body = self.parse_block()?;
                let mut handlers = Vec::new();
                while self.curr().kind == TK::KwExcept {
                    let handler_start = self.curr().span.start;
                    self.advance();
                    if !matches!(self.curr().kind, TK::Colon) {
                        let _ = self.parse_expr()?;
                        if self.eat(TK::KwAs) {
                            let _ = self.expect_ident()?;
                        }
                    }
                    let handler_body = self.parse_block()?;
                    handlers.push(ExceptHandler {
                        body: handler_body,
                        span: Span::new(handler_start, self.last_end),
                    });
                }
                if self.eat(TK::KwElse) {
                    // try/else runs when no exception fired; fold it into the
                    // protected body for structural purposes.
                    body.extend(self.parse_block()?);
                }
                let finally_body = if self.eat(TK::KwFinally) {
                    self.parse_block()?
                } else {
                    Vec::new()
                };
                StmtKind::Try {
                    body,
                    handlers,
                    finally_body,
                }
            }
            TK::KwWith => {
                self.advance();
                loop {
                    let _ = self.parse_expr()?;
                    if self.eat(TK::KwAs) {
                        let _ = self.parse_postfix()?;
                    }
                    if !self.eat(TK::Comma) {
                        break;
                    }
                }
                let body = self.parse_block()?;
                StmtKind::With { body }
            }
            _ => {
                let found = self.curr().clone();
                let span = found.span;
                return Err(ParseErrorKind::ExpectedStmt(found).at(span));
            }
        };
        Ok(Stmt {
            kind,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TK::Colon)?;
        if !self.eat(TK::Newline) {
            return self.parse_simple_line();
        }
        if self.curr().kind != TK::Indent {
            let found = self.curr().clone();
            let span = found.span;
            return Err(ParseErrorKind::ExpectedBlock(found).at(span));
        }
        self.advance();
        let mut stmts = Vec::new();
        while !matches!(self.curr().kind, TK::Dedent | TK::Eof) {
            self.parse_stmt_into(&mut stmts)?;
        }
        self.eat(TK::Dedent);
        Ok(stmts)
    }

    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = vec![self.parse_simple_stmt()?];
        while self.eat(TK::Semicolon) {
            if self.at_stmt_end() {
                break;
            }
            stmts.push(self.parse_simple_stmt()?);
        }
        self.eat(TK::Newline);
        Ok(stmts)
    }

    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.curr().span.start;
        let kind = match self.curr().kind {
            TK::KwReturn => {
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_testlist()?)
                };
                StmtKind::Return(value)
            }
            TK::KwRaise => {
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    let value = self.parse_expr()?;
                    if self.eat(TK::KwFrom) {
                        let _ = self.parse_expr()?;
                    }
                    Some(value)
                };
                StmtKind::Raise(value)
            }
            TK::KwAssert => {
                self.advance();
                let cond = self.parse_expr()?;
                if self.eat(TK::Comma) {
                    let _ = self.parse_expr()?;
                }
                StmtKind::Assert(cond)
            }
            TK::KwPass => {
                self.advance();
                StmtKind::Pass
            }
            TK::KwBreak => {
                self.advance();
                StmtKind::Break
            }
            TK::KwContinue => {
                self.advance();
                StmtKind::Continue
            }
            TK::KwImport | TK::KwFrom => {
                while !self.at_stmt_end() {
                    self.advance();
                }
                StmtKind::Import
            }
            _ => {
                let first = self.parse_testlist()?;
                match self.curr().kind {
                    TK::Assign => {
                        let mut targets = vec![first];
                        loop {
                            self.advance();
                            let next = self.parse_testlist()?;
                            if self.curr().kind == TK::Assign {
                                targets.push(next);
                            } else {
                                return Ok(Stmt {
                                    kind: StmtKind::Assign {
                                        targets,
                                        value: next,
                                        augmented: None,
                                    },
                                    span: Span::new(start, self.last_end),
                                });
                            }
                        }
                    }
                    TK::PlusAssign | TK::MinusAssign | TK::StarAssign | TK::SlashAssign => {
                        let op = match self.curr().kind {
                            TK::PlusAssign => BinaryOp::Add,
                            TK::MinusAssign => BinaryOp::Sub,
                            TK::StarAssign => BinaryOp::Mul,
                            _ => BinaryOp::Div,
                        };
                        self.advance();
                        let value = self.parse_testlist()?;
                        StmtKind::Assign {
                            targets: vec![first],
                            value,
                            augmented: Some(op),
                        }
                    }
                    _ => StmtKind::Expr(first),
                }
            }
        };
        Ok(Stmt {
            kind,
            span: Span::new(start, self.last_end),
        })
    }

    // --- Expressions ---

    /// Loop/comprehension binding target: comma-joined postfix expressions.
    /// `in` is the clause separator after a target, so this skips the
    /// comparison layer entirely rather than parsing it as `CompareOp::In`.
    fn parse_for_target(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let first = self.parse_postfix()?;
        if self.curr().kind != TK::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TK::Comma) {
            if self.curr().kind == TK::KwIn {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        Ok(Expr {
            kind: ExprKind::Tuple(items),
            span: Span::new(start, self.last_end),
        })
    }

    /// Comma-joined expression list; two or more elements become a tuple.
    fn parse_testlist(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let first = self.parse_expr()?;
        if self.curr().kind != TK::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TK::Comma) {
            if self.at_stmt_end() || matches!(self.curr().kind, TK::Assign | TK::RParen) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr {
            kind: ExprKind::Tuple(items),
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        match self.curr().kind {
            TK::KwLambda => {
                self.advance();
                while !matches!(self.curr().kind, TK::Colon | TK::Newline | TK::Eof) {
                    self.advance();
                }
                self.expect(TK::Colon)?;
                let body = self.parse_expr()?;
                return Ok(Expr {
                    kind: ExprKind::Lambda {
                        body: Box::new(body),
                    },
                    span: Span::new(start, self.last_end),
                });
            }
            TK::KwYield => {
                self.advance();
                let value = if self.at_stmt_end() || matches!(self.curr().kind, TK::RParen) {
                    None
                } else {
                    Some(Box::new(self.parse_testlist()?))
                };
                return Ok(Expr {
                    kind: ExprKind::Yield(value),
                    span: Span::new(start, self.last_end),
                });
            }
            _ => {}
        }

        let expr = self.parse_or()?;
        if self.curr().kind == TK::KwIf {
            self.advance();
            let cond = self.parse_or()?;
            self.expect(TK::KwElse)?;
            let or_else = self.parse_expr()?;
            return Ok(Expr {
                kind: ExprKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(expr),
                    or_else: Box::new(or_else),
                },
                span: Span::new(start, self.last_end),
            });
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut lhs = self.parse_and()?;
        while self.eat(TK::KwOr) {
            let rhs = self.parse_and()?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: Span::new(start, self.last_end),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut lhs = self.parse_not()?;
        while self.eat(TK::KwAnd) {
            let rhs = self.parse_not()?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: Span::new(start, self.last_end),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        if self.eat(TK::KwNot) {
            let operand = self.parse_not()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span: Span::new(start, self.last_end),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut lhs = self.parse_arith()?;
        loop {
            let op = match self.curr().kind {
                TK::EqEq => CompareOp::Eq,
                TK::NotEq => CompareOp::NotEq,
                TK::Lt => CompareOp::Lt,
                TK::LtEq => CompareOp::LtEq,
                TK::Gt => CompareOp::Gt,
                TK::GtEq => CompareOp::GtEq,
                TK::KwIn => CompareOp::In,
                TK::KwIs => {
                    self.advance();
                    let op = if self.eat(TK::KwNot) {
                        CompareOp::IsNot
                    } else {
                        CompareOp::Is
                    };
                    let rhs = self.parse_arith()?;
                    lhs = Expr {
                        kind: ExprKind::Compare {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        span: Span::new(start, self.last_end),
                    };
                    continue;
                }
                TK::KwNot => {
                    if self.peek().kind == TK::KwIn {
                        self.advance();
                        self.advance();
                        let rhs = self.parse_arith()?;
                        lhs = Expr {
                            kind: ExprKind::Compare {
                                op: CompareOp::NotIn,
                                lhs: Box::new(lhs),
                                rhs: Box::new(rhs),
                            },
                            span: Span::new(start, self.last_end),
                        };
                        continue;
                    }
                    break;
                }
                _ => break,
            };
            self.advance();
            let rhs = self.parse_arith()?;
            lhs = Expr {
                kind: ExprKind::Compare {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: Span::new(start, self.last_end),
            };
        }
        Ok(lhs)
    }

    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.curr().kind {
                TK::Plus => BinaryOp::Add,
                TK::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: Span::new(start, self.last_end),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.curr().kind {
                TK::Star => BinaryOp::Mul,
                TK::Slash => BinaryOp::Div,
                TK::DoubleSlash => BinaryOp::FloorDiv,
                TK::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span: Span::new(start, self.last_end),
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let op = match self.curr().kind {
            TK::Minus => Some(UnaryOp::Neg),
            TK::Plus => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_factor()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span: Span::new(start, self.last_end),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let base = self.parse_postfix()?;
        if self.eat(TK::DoubleStar) {
            let exp = self.parse_factor()?;
            return Ok(Expr {
                kind: ExprKind::Binary {
                    op: BinaryOp::Pow,
                    lhs: Box::new(base),
                    rhs: Box::new(exp),
                },
                span: Span::new(start, self.last_end),
            });
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let mut expr = self.parse_primary()?;
        loop {
            match self.curr().kind {
                TK::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    self.expect(TK::RParen)?;
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span: Span::new(start, self.last_end),
                    };
                }
                TK::Dot => {
                    self.advance();
                    let (attr, _) = self.expect_ident()?;
                    expr = Expr {
                        kind: ExprKind::Attribute {
                            target: Box::new(expr),
                            attr,
                        },
                        span: Span::new(start, self.last_end),
                    };
                }
                TK::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr, start)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while self.curr().kind != TK::RParen {
            let start = self.curr().span.start;
            if matches!(self.curr().kind, TK::Star | TK::DoubleStar) {
                self.advance();
                let inner = self.parse_expr()?;
                args.push(Expr {
                    kind: ExprKind::Starred(Box::new(inner)),
                    span: Span::new(start, self.last_end),
                });
            } else {
                let mut arg = self.parse_expr()?;
                if matches!(arg.kind, ExprKind::Name(_)) && self.curr().kind == TK::Assign {
                    // Keyword argument: only its value is structurally relevant.
                    self.advance();
                    arg = self.parse_expr()?;
                }
                if self.curr().kind == TK::KwFor {
                    arg = self.parse_comprehension_tail(arg, start)?;
                }
                args.push(arg);
            }
            if !self.eat(TK::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn parse_comprehension_tail(&mut self, elem: Expr, start: Position) -> Result<Expr, ParseError> {
        self.expect(TK::KwFor)?;
        let _target = self.parse_for_target()?;
        self.expect(TK::KwIn)?;
        let iter = self.parse_or()?;
        let mut cond = None;
        loop {
            if self.eat(TK::KwIf) {
                cond = Some(Box::new(self.parse_or()?));
            } else if self.curr().kind == TK::KwFor {
                self.advance();
                let _ = self.parse_for_target()?;
                self.expect(TK::KwIn)?;
                let _ = self.parse_or()?;
            } else {
                break;
            }
        }
        Ok(Expr {
            kind: ExprKind::Comprehension {
                elem: Box::new(elem),
                iter: Box::new(iter),
                cond,
            },
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_subscript(&mut self, target: Expr, start: Position) -> Result<Expr, ParseError> {
        let mut parts: Vec<Option<Expr>> = Vec::new();
        let mut saw_colon = false;
        let mut expecting = true;
        loop {
            match self.curr().kind {
                TK::RBracket => {
                    if expecting && saw_colon {
                        parts.push(None);
                    }
                    self.advance();
                    break;
                }
                TK::Colon => {
                    if expecting {
                        parts.push(None);
                    }
                    saw_colon = true;
                    expecting = true;
                    self.advance();
                }
                TK::Comma => {
                    self.advance();
                    expecting = true;
                }
                _ => {
                    parts.push(Some(self.parse_expr()?));
                    expecting = false;
                }
            }
        }

        let kind = if !saw_colon && parts.len() == 1 {
            let index = parts.into_iter().next().unwrap().unwrap();
            ExprKind::Index {
                target: Box::new(target),
                index: Box::new(index),
            }
        } else {
            ExprKind::Slice {
                target: Box::new(target),
                parts,
            }
        };
        Ok(Expr {
            kind,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.curr().span.start;
        let kind = match &self.curr().kind {
            TK::IntLit(value) => {
                let value = *value;
                self.advance();
                ExprKind::Int(value)
            }
            TK::FloatLit(text) => {
                let text = text.clone();
                self.advance();
                ExprKind::Float(text)
            }
            TK::StrLit(text) => {
                let mut text = text.clone();
                self.advance();
                // Adjacent string literals concatenate.
                while let TK::StrLit(next) = &self.curr().kind {
                    text.push_str(next);
                    self.advance();
                }
                ExprKind::Str(text)
            }
            TK::KwTrue => {
                self.advance();
                ExprKind::Bool(true)
            }
            TK::KwFalse => {
                self.advance();
                ExprKind::Bool(false)
            }
            TK::KwNone => {
                self.advance();
                ExprKind::NoneLit
            }
            TK::Ident(name) => {
                let name = name.clone();
                self.advance();
                ExprKind::Name(name)
            }
            TK::LParen => {
                self.advance();
                if self.eat(TK::RParen) {
                    return Ok(Expr {
                        kind: ExprKind::Tuple(Vec::new()),
                        span: Span::new(start, self.last_end),
                    });
                }
                let inner = self.parse_testlist()?;
                let inner = if self.curr().kind == TK::KwFor {
                    self.parse_comprehension_tail(inner, start)?
                } else {
                    inner
                };
                self.expect(TK::RParen)?;
                return Ok(inner);
            }
            TK::LBracket => {
                self.advance();
                if self.eat(TK::RBracket) {
                    return Ok(Expr {
                        kind: ExprKind::List(Vec::new()),
                        span: Span::new(start, self.last_end),
                    });
                }
                let first = self.parse_expr()?;
                if self.curr().kind == TK::KwFor {
                    let comp = self.parse_comprehension_tail(first, start)?;
                    self.expect(TK::RBracket)?;
                    return Ok(comp);
                }
                let mut items = vec![first];
                while self.eat(TK::Comma) {
                    if self.curr().kind == TK::RBracket {
                        break;
                    }
                    items.push(self.parse_expr()?);
                }
                self.expect(TK::RBracket)?;
                return Ok(Expr {
                    kind: ExprKind::List(items),
                    span: Span::new(start, self.last_end),
                });
            }
            TK::LBrace => {
                self.advance();
                return self.parse_brace(start);
            }
            _ => {
                let found = self.curr().clone();
                let span = found.span;
                return Err(ParseErrorKind::ExpectedPrimary(found).at(span));
            }
        };
        Ok(Expr {
            kind,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_brace(&mut self, start: Position) -> Result<Expr, ParseError> {
        if self.eat(TK::RBrace) {
            return Ok(Expr {
                kind: ExprKind::Dict(Vec::new()),
                span: Span::new(start, self.last_end),
            });
        }

        if matches!(self.curr().kind, TK::DoubleStar) {
            self.advance();
            let inner = self.parse_expr()?;
            let mut pairs = Vec::new();
            let key = Expr {
                kind: ExprKind::Starred(Box::new(inner)),
                span: Span::new(start, self.last_end),
            };
            let none = Expr {
                kind: ExprKind::NoneLit,
                span: Span::new(start, self.last_end),
            };
            pairs.push((key, none));
            while self.eat(TK::Comma) {
                if self.curr().kind == TK::RBrace {
                    break;
                }
                let key = self.parse_expr()?;
                self.expect(TK::Colon)?;
                let value = self.parse_expr()?;
                pairs.push((key, value));
            }
            self.expect(TK::RBrace)?;
            return Ok(Expr {
                kind: ExprKind::Dict(pairs),
                span: Span::new(start, self.last_end),
            });
        }

        let first = self.parse_expr()?;
        if self.eat(TK::Colon) {
            let value = self.parse_expr()?;
            if self.curr().kind == TK::KwFor {
                // Dict comprehension: element is the key/value pair.
                let pair = Expr {
                    kind: ExprKind::Tuple(vec![first, value]),
                    span: Span::new(start, self.last_end),
                };
                let comp = self.parse_comprehension_tail(pair, start)?;
                self.expect(TK::RBrace)?;
                return Ok(comp);
            }
            let mut pairs = vec![(first, value)];
            while self.eat(TK::Comma) {
                if self.curr().kind == TK::RBrace {
                    break;
                }
                let key = self.parse_expr()?;
                self.expect(TK::Colon)?;
                let value = self.parse_expr()?;
                pairs.push((key, value));
            }
            self.expect(TK::RBrace)?;
            return Ok(Expr {
                kind: ExprKind::Dict(pairs),
                span: Span::new(start, self.last_end),
            });
        }

        if self.curr().kind == TK::KwFor {
            let comp = self.parse_comprehension_tail(first, start)?;
            self.expect(TK::RBrace)?;
            return Ok(comp);
        }

        // Set literal; structurally interchangeable with a list.
        let mut items = vec![first];
        while self.eat(TK::Comma) {
            if self.curr().kind == TK::RBrace {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.expect(TK::RBrace)?;
        Ok(Expr {
            kind: ExprKind::List(items),
            span: Span::new(start, self.last_end),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/parse/t_parser.rs"]
mod tests;
