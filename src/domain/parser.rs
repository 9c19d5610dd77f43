//! Precondition language parser
//!
//! Grammar (whitespace-tolerant):
//!
//! ```text
//! precondition = *SP [ or_expr ]
//! or_expr      = and_expr ( "||" and_expr )*
//! and_expr     = primary  ( "&&" primary )*
//! primary      = "(" precondition ")"
//!              | "\complete(" ( "*" | node_id ) ")"
//!              | "\exec(" node_id ")"
//!              | "!" precondition
//!              | "\true"
//! node_id      = 1*( DIGIT | ALPHA | "_" | "-" | "." )
//! ```
//!
//! `&&` binds tighter than `||`. `!` negates the whole precondition that
//! follows it, so `!\exec(A) && \exec(B)` is `!(\exec(A) && \exec(B))`.
//! Blank input means `\true`.

use thiserror::Error;

use super::id::{DeliverableId, ProcessId};
use super::precondition::Precondition;
use super::scan::Scanner;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Syntax error at offset {position} in '{input}': expected {expected}")]
pub struct SyntaxError {
    /// The full text that failed to parse
    pub input: String,
    /// Byte offset where parsing stopped
    pub position: usize,
    /// What the parser was looking for
    pub expected: &'static str,
}

/// Parses a precondition cell
///
/// `context` is the process whose row the cell belongs to; `\complete(*)`
/// refers to it.
pub fn parse_precondition(text: &str, context: &ProcessId) -> Result<Precondition, SyntaxError> {
    let mut parser = Parser {
        scan: Scanner::new(text),
        context,
    };

    let precondition = parser.precondition()?;
    if !parser.scan.is_at_end() {
        return Err(parser.error("end of input"));
    }

    Ok(precondition)
}

struct Parser<'a> {
    scan: Scanner<'a>,
    context: &'a ProcessId,
}

impl Parser<'_> {
    fn error(&self, expected: &'static str) -> SyntaxError {
        SyntaxError {
            input: self.scan.input().to_string(),
            position: self.scan.position(),
            expected,
        }
    }

    fn expect(&mut self, token: &str, expected: &'static str) -> Result<(), SyntaxError> {
        if self.scan.eat_token(token) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn starts_primary(&self) -> bool {
        let rest = self.scan.rest();
        ["(", "!", "\\complete(", "\\exec(", "\\true"]
            .iter()
            .any(|token| rest.starts_with(token))
    }

    fn precondition(&mut self) -> Result<Precondition, SyntaxError> {
        self.scan.skip_spaces();
        if !self.starts_primary() {
            return Ok(Precondition::True);
        }
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Precondition, SyntaxError> {
        let mut children = vec![self.and_expr()?];
        while self.scan.eat_token("||") {
            children.push(self.and_expr()?);
        }

        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Precondition::Or { children }
        })
    }

    fn and_expr(&mut self) -> Result<Precondition, SyntaxError> {
        let mut children = vec![self.primary()?];
        while self.scan.eat_token("&&") {
            children.push(self.primary()?);
        }

        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Precondition::And { children }
        })
    }

    fn primary(&mut self) -> Result<Precondition, SyntaxError> {
        if self.scan.eat_token("(") {
            let inner = self.precondition()?;
            self.expect(")", "')'")?;
            return Ok(inner);
        }

        if self.scan.eat_token("\\complete(") {
            let precondition = if self.scan.eat_token("*") {
                Precondition::AllReachableFeedbackSourcesCompleted {
                    context: self.context.clone(),
                }
            } else {
                let source = self
                    .scan
                    .node_id()
                    .ok_or_else(|| self.error("deliverable id or '*'"))?;
                Precondition::FeedbackSourceCompleted {
                    source: DeliverableId::new(source),
                }
            };
            self.expect(")", "')'")?;
            return Ok(precondition);
        }

        if self.scan.eat_token("\\exec(") {
            let target = self.scan.node_id().ok_or_else(|| self.error("process id"))?;
            self.expect(")", "')'")?;
            return Ok(Precondition::Executable {
                target: ProcessId::new(target),
            });
        }

        if self.scan.eat_token("!") {
            let child = self.precondition()?;
            return Ok(Precondition::Not {
                child: Box::new(child),
            });
        }

        if self.scan.eat_token("\\true") {
            return Ok(Precondition::True);
        }

        Err(self.error("'(', '!', '\\complete(', '\\exec(' or '\\true'"))
    }
}
