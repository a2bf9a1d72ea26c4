use std::collections::{HashMap, HashSet};

use log::debug;

use crate::ast::{ASTNode, Expression, Function, Prototype};

/// Whatever turns finished top-level nodes into something runnable. The
/// node is handed over by value; anything kept past `accept` is the
/// backend's to own.
pub trait Backend {
    type Artifact;
    type Error: std::error::Error;

    fn accept(&mut self, node: ASTNode) -> Result<Self::Artifact, Self::Error>;
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("unknown variable referenced {0}")]
    UnknownVariable(String),
    #[error("unknown function {0}")]
    UnknownFunction(String),
    #[error("invalid number of args in call {0} expected {1} found {2}")]
    InvalidCall(String, usize, usize),
    #[error("duplicate parameter {1} in prototype {0}")]
    DuplicateParameter(String, String),
    #[error("{0} redeclared with {2} args, previously declared with {1}")]
    Redeclaration(String, usize, usize),
}

/// Prints each node as an s-expression listing line.
///
/// With checks on, names are resolved the way a code generator resolves them
/// against its module: calls against every prototype declared so far,
/// variables against the enclosing function's parameters.
#[derive(Debug)]
pub struct Listing {
    functions: HashMap<String, Prototype>,
    named_values: HashSet<String>,
    check: bool,
}

impl Default for Listing {
    fn default() -> Self {
        Self::new()
    }
}

impl Listing {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            named_values: HashSet::new(),
            check: true,
        }
    }

    /// listing only, no name resolution
    pub fn unchecked() -> Self {
        Self {
            check: false,
            ..Self::new()
        }
    }

    /// whether `name` has been declared by an extern or definition
    pub fn declared(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn check_expr(&self, expr: &Expression) -> Result<(), BackendError> {
        match expr {
            Expression::Literal(_) => Ok(()),
            Expression::Variable(name) => {
                if self.named_values.contains(name) {
                    Ok(())
                } else {
                    Err(BackendError::UnknownVariable(name.clone()))
                }
            }
            Expression::Binary(_, left, right) => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            Expression::Call(callee, args) => match self.functions.get(callee) {
                Some(proto) => {
                    if proto.args.len() != args.len() {
                        return Err(BackendError::InvalidCall(
                            callee.clone(),
                            proto.args.len(),
                            args.len(),
                        ));
                    }

                    for arg in args {
                        self.check_expr(arg)?;
                    }
                    Ok(())
                }
                None => Err(BackendError::UnknownFunction(callee.clone())),
            },
        }
    }

    /// Declare `proto`. Returns whether it was newly added.
    fn compile_proto(&mut self, proto: &Prototype) -> Result<bool, BackendError> {
        let mut seen = HashSet::with_capacity(proto.args.len());
        for arg in &proto.args {
            if !seen.insert(arg) {
                return Err(BackendError::DuplicateParameter(
                    proto.name.clone(),
                    arg.clone(),
                ));
            }
        }

        if proto.is_anonymous() {
            return Ok(false);
        }

        match self.functions.get(&proto.name) {
            Some(existing) if existing.args.len() != proto.args.len() => {
                Err(BackendError::Redeclaration(
                    proto.name.clone(),
                    existing.args.len(),
                    proto.args.len(),
                ))
            }
            Some(_) => Ok(false),
            None => {
                debug!("declared {}", proto.name);
                self.functions.insert(proto.name.clone(), proto.clone());
                Ok(true)
            }
        }
    }

    fn compile_fn(&mut self, function: &Function) -> Result<(), BackendError> {
        let Function {
            prototype: proto,
            body,
        } = function;
        let added = self.compile_proto(proto)?;

        self.named_values.clear();
        self.named_values.extend(proto.args.iter().cloned());

        if let Err(e) = self.check_expr(body) {
            if added {
                self.functions.remove(&proto.name);
            }
            return Err(e);
        }

        Ok(())
    }
}

impl Backend for Listing {
    type Artifact = String;
    type Error = BackendError;

    fn accept(&mut self, node: ASTNode) -> Result<String, BackendError> {
        if self.check {
            match &node {
                ASTNode::Function(func) => self.compile_fn(func)?,
                ASTNode::Extern(proto) => {
                    self.compile_proto(proto)?;
                }
            }
        }

        Ok(node.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use pretty_assertions::assert_eq;

    fn run(listing: &mut Listing, source: &str) -> Vec<Result<String, BackendError>> {
        parse_str(source)
            .unwrap()
            .into_iter()
            .map(|node| listing.accept(node))
            .collect()
    }

    #[test]
    fn listing_works() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "extern sin(x); def thing(x) sin(x) * x; thing(2)");
        assert_eq!(
            res,
            vec![
                Ok("(extern sin (x))".to_string()),
                Ok("(def thing (x) (* (sin x) x))".to_string()),
                Ok("(eval (thing 2))".to_string()),
            ]
        );
        assert!(listing.declared("sin"));
        assert!(listing.declared("thing"));
        assert!(!listing.declared(""));
    }

    #[test]
    fn unknown_names() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "def f(x) y; g(1); x");
        assert_eq!(
            res,
            vec![
                Err(BackendError::UnknownVariable("y".to_string())),
                Err(BackendError::UnknownFunction("g".to_string())),
                Err(BackendError::UnknownVariable("x".to_string())),
            ]
        );
        // a function whose body failed is not left declared
        assert!(!listing.declared("f"));
    }

    #[test]
    fn recursion_resolves() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "def fib(n) fib(n-1) + fib(n-2)");
        assert!(res[0].is_ok());
    }

    #[test]
    fn argument_count() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "extern pow(a b); pow(1)");
        assert_eq!(
            res[1],
            Err(BackendError::InvalidCall("pow".to_string(), 2, 1))
        );
    }

    #[test]
    fn duplicate_parameter() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "def f(x x) x");
        assert_eq!(
            res,
            vec![Err(BackendError::DuplicateParameter(
                "f".to_string(),
                "x".to_string()
            ))]
        );
    }

    #[test]
    fn redeclaration() {
        let mut listing = Listing::new();
        let res = run(&mut listing, "extern f(a); def f(b) b; extern f(a b)");
        assert!(res[0].is_ok());
        assert!(res[1].is_ok());
        assert_eq!(
            res[2],
            Err(BackendError::Redeclaration("f".to_string(), 1, 2))
        );
    }

    #[test]
    fn unchecked_only_prints() {
        let mut listing = Listing::unchecked();
        let res = run(&mut listing, "def f(x x) y; g(1)");
        assert_eq!(
            res,
            vec![
                Ok("(def f (x x) y)".to_string()),
                Ok("(eval (g 1))".to_string()),
            ]
        );
    }
}
