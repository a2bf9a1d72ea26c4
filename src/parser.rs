use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;

use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::lexer::{LexError, Lexer, Token};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParserError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{reason}, found {found}")]
    Syntax { reason: &'static str, found: Token },
}

pub type PartialParseResult = Result<Expression, ParserError>;

lazy_static! {
    static ref BINOP_PRECEDENCE: HashMap<char, u32> = {
        let mut operator_precedence = HashMap::new();
        operator_precedence.insert('<', 10);
        operator_precedence.insert('+', 20);
        operator_precedence.insert('-', 20);
        operator_precedence.insert('*', 40);
        operator_precedence.insert('/', 40);
        operator_precedence
    };
}

/// Operator and binding strength if `token` is a binary operator. Higher binds
/// tighter; `None` means "not a binary operator" and always ends an expression.
pub fn binary_operator(token: &Token) -> Option<(char, u32)> {
    match token {
        Token::Operator(op) => BINOP_PRECEDENCE.get(op).map(|&pr| (*op, pr)),
        _ => None,
    }
}

pub fn precedence(token: &Token) -> Option<u32> {
    binary_operator(token).map(|(_, pr)| pr)
}

/// Recursive descent parser pulling tokens from a [`Lexer`] one at a time.
///
/// `current` is the single token of lookahead every production dispatches on.
/// It starts out as `Eof` until the first [`Parser::advance`], and after a
/// lexical error it still holds the token before the bad character until the
/// next successful advance.
///
/// Nesting depth is not limited: every parenthesis or call level is a level
/// of native recursion, so deeply enough nested input overflows the stack.
pub struct Parser<I> {
    lexer: Lexer<I>,
    current: Token,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(input: I) -> Self {
        Self {
            lexer: Lexer::new(input),
            current: Token::Eof,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn advance(&mut self) -> Result<&Token, ParserError> {
        self.current = self.lexer.next_token()?;
        Ok(&self.current)
    }

    fn syntax_error<T>(&self, reason: &'static str) -> Result<T, ParserError> {
        Err(ParserError::Syntax {
            reason,
            found: self.current.clone(),
        })
    }

    fn parse_number(&mut self, num: f64) -> PartialParseResult {
        self.advance()?;
        Ok(Expression::Literal(num))
    }

    fn parse_identifier(&mut self, ident: String) -> PartialParseResult {
        self.advance()?;
        if self.current != Token::OpenParen {
            return Ok(Expression::Variable(ident));
        }
        self.advance()?;

        let mut args = Vec::new();
        if self.current != Token::CloseParen {
            loop {
                args.push(self.parse_expr()?);
                match self.current {
                    Token::CloseParen => break,
                    Token::Comma => {
                        self.advance()?;
                    }
                    _ => return self.syntax_error("expected ')' or ',' in argument list"),
                }
            }
        }
        self.advance()?;

        Ok(Expression::Call(ident, args))
    }

    fn parse_nested(&mut self) -> PartialParseResult {
        self.advance()?;
        let res = self.parse_expr()?;
        if self.current != Token::CloseParen {
            return self.syntax_error("expected ')'");
        }
        self.advance()?;
        Ok(res)
    }

    fn parse_primary(&mut self) -> PartialParseResult {
        match &self.current {
            Token::Number(num) => {
                let num = *num;
                self.parse_number(num)
            }
            Token::Ident(ident) => {
                let ident = ident.clone();
                self.parse_identifier(ident)
            }
            Token::OpenParen => self.parse_nested(),
            _ => self.syntax_error("unexpected token, expected an expression"),
        }
    }

    /// Precedence climbing. Folds `lhs op primary ...` while the operator binds
    /// at least `expr_precedence`; a strictly tighter operator after the right
    /// operand gets that operand first, so equal precedence chains fold left.
    fn parse_bin_op_rhs(&mut self, expr_precedence: u32, lhs: Expression) -> PartialParseResult {
        let mut result = lhs;

        loop {
            let (operator, precedence) = match binary_operator(&self.current) {
                Some((op, pr)) if pr >= expr_precedence => (op, pr),
                _ => return Ok(result),
            };
            self.advance()?;

            let mut rhs = self.parse_primary()?;

            match binary_operator(&self.current) {
                Some((_, next_precedence)) if precedence < next_precedence => {
                    rhs = self.parse_bin_op_rhs(precedence + 1, rhs)?
                }
                _ => (),
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expr(&mut self) -> PartialParseResult {
        let lhs = self.parse_primary()?;

        let expr = self.parse_bin_op_rhs(0, lhs)?;
        Ok(expr)
    }

    /// `name ( arg* )`, argument names back to back with no separator.
    pub fn parse_prototype(&mut self) -> Result<Prototype, ParserError> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return self.syntax_error("expected function name in prototype"),
        };
        self.advance()?;

        if self.current != Token::OpenParen {
            return self.syntax_error("expected '(' in prototype");
        }

        let mut args = Vec::new();
        while let Token::Ident(arg) = self.advance()? {
            args.push(arg.clone());
        }
        if self.current != Token::CloseParen {
            return self.syntax_error("expected ')' in prototype");
        }
        self.advance()?;

        Ok(Prototype { name, args })
    }

    pub fn parse_definition(&mut self) -> Result<Function, ParserError> {
        self.advance()?;
        let prototype = self.parse_prototype()?;
        let body = self.parse_expr()?;
        debug!("parsed definition of {}", prototype.name);
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParserError> {
        self.advance()?;
        let prototype = self.parse_prototype()?;
        debug!("parsed extern {}", prototype.name);
        Ok(prototype)
    }

    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParserError> {
        let body = self.parse_expr()?;
        debug!("parsed top level expression");
        Ok(Function::anonymous(body))
    }

    /// One definition, extern or bare expression, chosen by the current token.
    pub fn parse_construct(&mut self) -> Result<ASTNode, ParserError> {
        match self.current {
            Token::Def => self.parse_definition().map(ASTNode::Function),
            Token::Extern => self.parse_extern().map(ASTNode::Extern),
            _ => self.parse_top_level_expr().map(ASTNode::Function),
        }
    }
}

/// parse a whole program, giving up at the first error
pub fn parse_str(source: &str) -> Result<Vec<ASTNode>, ParserError> {
    let mut parser = Parser::new(source.chars());
    parser.advance()?;

    let mut ast = Vec::new();
    loop {
        match parser.current() {
            Token::Eof => break,
            Token::Delimiter => {
                parser.advance()?;
            }
            _ => ast.push(parser.parse_construct()?),
        }
    }

    Ok(ast)
}
