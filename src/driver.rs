use log::{debug, info, warn};

use crate::backend::Backend;
use crate::lexer::Token;
use crate::parser::{Parser, ParserError};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    AwaitingConstruct,
    /// The last construct failed; the next step drops one token first.
    Error,
    Done,
}

/// What happened to one top-level construct.
#[derive(Debug, PartialEq)]
pub enum Outcome<A, E> {
    /// Parsed and taken by the backend.
    Accepted(A),
    /// Parsed, but the backend refused it.
    Rejected(E),
    /// Did not parse. Whatever was built of it is gone.
    Failed(ParserError),
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// The top-level read loop. Each call to `next` reads one definition, extern
/// or bare expression, hands it to the backend and reports what happened.
/// Separators are skipped silently and iteration ends at end of input.
///
/// A failed construct never stops the loop: the driver moves to
/// [`State::Error`], and the following step skips exactly one token before
/// trying again. After a lexical error the bad character is already gone, so
/// that skip lands on the token right after it.
pub struct Driver<I, B> {
    parser: Parser<I>,
    backend: B,
    state: State,
    primed: bool,
    summary: Summary,
}

impl<I, B> Driver<I, B>
where
    I: Iterator<Item = char>,
    B: Backend,
{
    pub fn new(input: I, backend: B) -> Self {
        Self {
            parser: Parser::new(input),
            backend,
            state: State::AwaitingConstruct,
            primed: false,
            summary: Summary::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Drive to the end of input, passing every outcome to `report`.
    pub fn run(
        &mut self,
        mut report: impl FnMut(Outcome<B::Artifact, B::Error>),
    ) -> Summary {
        while let Some(outcome) = self.step() {
            report(outcome);
        }
        self.summary
    }

    fn fail(&mut self, err: ParserError) -> Outcome<B::Artifact, B::Error> {
        debug!("construct failed: {}", err);
        self.state = State::Error;
        self.summary.failed += 1;
        Outcome::Failed(err)
    }

    fn step(&mut self) -> Option<Outcome<B::Artifact, B::Error>> {
        match self.state {
            State::Done => return None,
            State::Error => {
                warn!("resynchronizing, dropping one token");
                if let Err(e) = self.parser.advance() {
                    return Some(self.fail(e));
                }
                self.state = State::AwaitingConstruct;
            }
            State::AwaitingConstruct => {}
        }

        if !self.primed {
            self.primed = true;
            if let Err(e) = self.parser.advance() {
                return Some(self.fail(e));
            }
        }

        loop {
            match self.parser.current() {
                Token::Eof => {
                    debug!("end of input");
                    self.state = State::Done;
                    return None;
                }
                Token::Delimiter => {
                    if let Err(e) = self.parser.advance() {
                        return Some(self.fail(e));
                    }
                }
                _ => break,
            }
        }

        let node = match self.parser.parse_construct() {
            Ok(node) => node,
            Err(e) => return Some(self.fail(e)),
        };

        info!("handing {} to backend", node);
        Some(match self.backend.accept(node) {
            Ok(artifact) => {
                self.summary.accepted += 1;
                Outcome::Accepted(artifact)
            }
            Err(e) => {
                self.summary.rejected += 1;
                Outcome::Rejected(e)
            }
        })
    }
}

impl<I, B> Iterator for Driver<I, B>
where
    I: Iterator<Item = char>,
    B: Backend,
{
    type Item = Outcome<B::Artifact, B::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::ast::{ASTNode, Expression, Function, Prototype};
    use crate::lexer::LexError;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Collect(Vec<ASTNode>);

    impl Backend for Collect {
        type Artifact = usize;
        type Error = Infallible;

        fn accept(&mut self, node: ASTNode) -> Result<usize, Infallible> {
            self.0.push(node);
            Ok(self.0.len())
        }
    }

    fn drive(
        source: &str,
    ) -> (Vec<Outcome<usize, Infallible>>, Driver<std::str::Chars<'_>, Collect>) {
        let mut driver = Driver::new(source.chars(), Collect::default());
        let outcomes = driver.by_ref().collect();
        (outcomes, driver)
    }

    fn syntax(reason: &'static str, found: Token) -> Outcome<usize, Infallible> {
        Outcome::Failed(ParserError::Syntax { reason, found })
    }

    #[test]
    fn constructs_in_source_order() {
        let (outcomes, driver) = drive("extern sin(x); def f(a) sin(a); f(1)");
        assert_eq!(
            outcomes,
            vec![Outcome::Accepted(1), Outcome::Accepted(2), Outcome::Accepted(3)]
        );
        assert_eq!(driver.state(), State::Done);

        let nodes = driver.into_backend().0;
        assert!(matches!(nodes[0], ASTNode::Extern(_)));
        assert!(matches!(&nodes[1], ASTNode::Function(f) if f.prototype.name == "f"));
        assert!(matches!(&nodes[2], ASTNode::Function(f) if f.prototype.is_anonymous()));
    }

    #[test]
    fn recovers_after_unterminated_paren() {
        let (outcomes, driver) = drive("(1+2;\ndef foo(x) x");
        assert_eq!(
            outcomes,
            vec![syntax("expected ')'", Token::Delimiter), Outcome::Accepted(1)]
        );
        assert_eq!(
            driver.backend().0,
            vec![ASTNode::Function(Function {
                prototype: Prototype {
                    name: "foo".to_string(),
                    args: vec!["x".to_string()],
                },
                body: Expression::Variable("x".to_string()),
            })]
        );
        assert_eq!(
            driver.summary(),
            Summary {
                accepted: 1,
                rejected: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn lexical_error_skips_character() {
        let (outcomes, driver) = drive("1 $ 2");
        assert_eq!(
            outcomes,
            vec![
                Outcome::Failed(ParserError::Lex(LexError::UnknownCharacter('$'))),
                Outcome::Accepted(1),
            ]
        );
        assert_eq!(
            driver.backend().0,
            vec![ASTNode::Function(Function::anonymous(Expression::Literal(2.0)))]
        );
    }

    #[test]
    fn back_to_back_bad_characters() {
        let (outcomes, _) = drive("$@ 7");
        assert_eq!(
            outcomes,
            vec![
                Outcome::Failed(ParserError::Lex(LexError::UnknownCharacter('$'))),
                Outcome::Failed(ParserError::Lex(LexError::UnknownCharacter('@'))),
                Outcome::Accepted(1),
            ]
        );
    }

    #[test]
    fn error_state_between_steps() {
        let mut driver = Driver::new(") 1".chars(), Collect::default());
        assert_eq!(
            driver.next(),
            Some(syntax(
                "unexpected token, expected an expression",
                Token::CloseParen
            ))
        );
        assert_eq!(driver.state(), State::Error);
        assert_eq!(driver.next(), Some(Outcome::Accepted(1)));
        assert_eq!(driver.state(), State::AwaitingConstruct);
        assert_eq!(driver.next(), None);
        assert_eq!(driver.state(), State::Done);
        assert_eq!(driver.next(), None);
    }

    #[test]
    fn separators_and_comments_only() {
        let (outcomes, driver) = drive(";;; # nothing here\n;");
        assert!(outcomes.is_empty());
        assert_eq!(driver.summary(), Summary::default());
    }

    #[test]
    fn failure_at_end_of_input() {
        let (outcomes, driver) = drive("def f(x)");
        assert_eq!(
            outcomes,
            vec![syntax(
                "unexpected token, expected an expression",
                Token::Eof
            )]
        );
        assert_eq!(driver.state(), State::Done);
    }

    #[test]
    fn run_reports_everything() {
        let mut driver = Driver::new("1; (; 2".chars(), Collect::default());
        let mut seen = Vec::new();
        let summary = driver.run(|outcome| seen.push(outcome));
        assert_eq!(seen.len(), 3);
        assert_eq!(
            summary,
            Summary {
                accepted: 2,
                rejected: 0,
                failed: 1
            }
        );
    }
}
