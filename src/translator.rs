//! Turns validated source text into a statement tree.
//!
//! Each non-blank, non-comment line is parsed on its own. Block structure is
//! rebuilt purely from indentation with a stack of open blocks:
//!
//! - before a line is placed, every open block whose header indent is greater
//!   than or equal to the line's indent is closed (a sibling at the header's
//!   own indent closes it too);
//! - a block header opens a new block at the line's indent;
//! - at end of input every remaining block is closed, innermost first.
//!
//! `elif`/`else` headers extend the `if` chain that was just closed at the
//! same level.

use thiserror::Error;

use crate::ast::{ConditionalBranch, Program, Statement};
use crate::parser::{self, BlockHeader, Line, ParseError};
use crate::validator::is_skipped;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslateError {
    #[error("Syntax error on line {line}: {source}")]
    Parse { line: usize, source: ParseError },
    #[error("Syntax error on line {line}: '{keyword}' without a matching 'if'")]
    DanglingBranch { line: usize, keyword: &'static str },
    #[error("Syntax error on line {line}: '{keyword}' outside loop")]
    OutsideLoop { line: usize, keyword: &'static str },
    #[error("Syntax error on line {line}: blocks nested more than {limit} levels deep")]
    TooDeeplyNested { line: usize, limit: usize },
}

impl TranslateError {
    pub fn line(&self) -> usize {
        match self {
            TranslateError::Parse { line, .. }
            | TranslateError::DanglingBranch { line, .. }
            | TranslateError::OutsideLoop { line, .. }
            | TranslateError::TooDeeplyNested { line, .. } => *line,
        }
    }

    /// Column within the trimmed line, when the parser pinned one down.
    pub fn column(&self) -> Option<usize> {
        match self {
            TranslateError::Parse { source, .. } => source.column(),
            _ => None,
        }
    }
}

/// Most blocks that may be open at once. Execution recurses once per block.
pub const MAX_BLOCK_DEPTH: usize = 100;

/// Translated program plus block accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub program: Program,
    pub blocks_opened: usize,
    pub blocks_closed: usize,
}

struct LineRecord<'a> {
    number: usize,
    raw: &'a str,
    trimmed: &'a str,
    indent: usize,
}

impl<'a> LineRecord<'a> {
    fn new(number: usize, raw: &'a str) -> Self {
        Self {
            number,
            raw,
            trimmed: raw.trim(),
            indent: raw.chars().take_while(|c| c.is_whitespace()).count(),
        }
    }
}

struct OpenBlock {
    indent: usize,
    line: usize,
    header: BlockHeader,
    body: Vec<Statement>,
}

#[derive(Default)]
pub struct Translator {
    root: Vec<Statement>,
    stack: Vec<OpenBlock>,
    blocks_opened: usize,
    blocks_closed: usize,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, source: &str) -> Result<Translation, TranslateError> {
        let mut lines = 0;
        for (index, raw) in source.split('\n').enumerate() {
            let record = LineRecord::new(index + 1, raw);
            if is_skipped(record.trimmed) {
                continue;
            }
            lines += 1;
            self.translate_line(&record)?;
        }

        while let Some(block) = self.stack.pop() {
            self.close_block(block)?;
        }

        tracing::debug!(
            lines,
            blocks_opened = self.blocks_opened,
            blocks_closed = self.blocks_closed,
            "translated source"
        );
        Ok(Translation {
            program: Program {
                statements: self.root,
            },
            blocks_opened: self.blocks_opened,
            blocks_closed: self.blocks_closed,
        })
    }

    fn translate_line(&mut self, record: &LineRecord<'_>) -> Result<(), TranslateError> {
        while let Some(top) = self.stack.last() {
            if top.indent < record.indent {
                break;
            }
            if let Some(block) = self.stack.pop() {
                self.close_block(block)?;
            }
        }

        let line = parser::parse_line(record.trimmed, record.number).map_err(|source| {
            TranslateError::Parse {
                line: record.number,
                source,
            }
        })?;
        tracing::trace!(line = record.number, indent = record.indent, raw = record.raw, "parsed line");

        match line {
            Line::Header(header) => self.open_block(record, header),
            Line::Simple(statement) => {
                let loop_keyword = match statement {
                    Statement::Break => Some("break"),
                    Statement::Continue => Some("continue"),
                    _ => None,
                };
                if let Some(keyword) = loop_keyword
                    && !self.in_loop()
                {
                    return Err(TranslateError::OutsideLoop {
                        line: record.number,
                        keyword,
                    });
                }
                self.current_body().push(statement);
                Ok(())
            }
        }
    }

    fn open_block(
        &mut self,
        record: &LineRecord<'_>,
        header: BlockHeader,
    ) -> Result<(), TranslateError> {
        if matches!(header, BlockHeader::Elif { .. } | BlockHeader::Else)
            && open_if_chain(self.current_body()).is_none()
        {
            return Err(TranslateError::DanglingBranch {
                line: record.number,
                keyword: header.keyword(),
            });
        }
        if self.stack.len() >= MAX_BLOCK_DEPTH {
            return Err(TranslateError::TooDeeplyNested {
                line: record.number,
                limit: MAX_BLOCK_DEPTH,
            });
        }
        self.blocks_opened += 1;
        self.stack.push(OpenBlock {
            indent: record.indent,
            line: record.number,
            header,
            body: Vec::new(),
        });
        Ok(())
    }

    fn close_block(&mut self, block: OpenBlock) -> Result<(), TranslateError> {
        self.blocks_closed += 1;
        tracing::trace!(line = block.line, indent = block.indent, "closed block");

        let OpenBlock {
            line, header, body, ..
        } = block;
        let statement = match header {
            BlockHeader::For { target, iterable } => Statement::For {
                target,
                iterable,
                body,
            },
            BlockHeader::While { condition } => Statement::While { condition, body },
            BlockHeader::If { condition } => Statement::If {
                branches: vec![ConditionalBranch { condition, body }],
                else_body: None,
            },
            BlockHeader::Elif { condition } => {
                let (branches, _) = open_if_chain(self.current_body())
                    .ok_or(TranslateError::DanglingBranch {
                        line,
                        keyword: "elif",
                    })?;
                branches.push(ConditionalBranch { condition, body });
                return Ok(());
            }
            BlockHeader::Else => {
                let (_, else_body) = open_if_chain(self.current_body())
                    .ok_or(TranslateError::DanglingBranch {
                        line,
                        keyword: "else",
                    })?;
                *else_body = Some(body);
                return Ok(());
            }
        };
        self.current_body().push(statement);
        Ok(())
    }

    fn current_body(&mut self) -> &mut Vec<Statement> {
        match self.stack.last_mut() {
            Some(block) => &mut block.body,
            None => &mut self.root,
        }
    }

    fn in_loop(&self) -> bool {
        self.stack.iter().any(|block| {
            matches!(
                block.header,
                BlockHeader::For { .. } | BlockHeader::While { .. }
            )
        })
    }
}

/// The branches and else slot of the trailing `if` in `body`, if that `if`
/// has no `else` yet.
fn open_if_chain(
    body: &mut [Statement],
) -> Option<(&mut Vec<ConditionalBranch>, &mut Option<Vec<Statement>>)> {
    match body.last_mut() {
        Some(Statement::If {
            branches,
            else_body,
        }) if else_body.is_none() => Some((branches, else_body)),
        _ => None,
    }
}

pub fn translate(source: &str) -> Result<Translation, TranslateError> {
    Translator::new().translate(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOperator, Expression};
    use indoc::indoc;

    fn identifier(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn int(value: i64) -> Expression {
        Expression::Integer(value)
    }

    fn print(args: Vec<Expression>) -> Statement {
        Statement::Expr(Expression::Call {
            callee: Box::new(identifier("print")),
            args,
        })
    }

    fn compare(name: &str, op: CompareOperator, value: i64) -> Expression {
        Expression::Compare {
            left: Box::new(identifier(name)),
            comparisons: vec![(op, int(value))],
        }
    }

    fn statements(source: &str) -> Vec<Statement> {
        translate(source)
            .expect("translate failed")
            .program
            .statements
    }

    #[test]
    fn nests_for_body_by_indentation() {
        let source = indoc! {"
            for i in range(3):
                print(i)
            print('done')
        "};
        assert_eq!(
            statements(source),
            vec![
                Statement::For {
                    target: "i".to_string(),
                    iterable: Expression::Call {
                        callee: Box::new(identifier("range")),
                        args: vec![int(3)],
                    },
                    body: vec![print(vec![identifier("i")])],
                },
                print(vec![Expression::String("done".to_string())]),
            ]
        );
    }

    #[test]
    fn builds_if_elif_else_chain() {
        let source = indoc! {"
            if x > 3:
                print('big')
            elif x > 1:
                print('medium')
            else:
                print('small')
        "};
        assert_eq!(
            statements(source),
            vec![Statement::If {
                branches: vec![
                    ConditionalBranch {
                        condition: compare("x", CompareOperator::Greater, 3),
                        body: vec![print(vec![Expression::String("big".to_string())])],
                    },
                    ConditionalBranch {
                        condition: compare("x", CompareOperator::Greater, 1),
                        body: vec![print(vec![Expression::String("medium".to_string())])],
                    },
                ],
                else_body: Some(vec![print(vec![Expression::String("small".to_string())])]),
            }]
        );
    }

    #[test]
    fn sibling_at_header_indent_closes_block() {
        let source = indoc! {"
            for i in range(3):
            print(i)
        "};
        let translation = translate(source).expect("translate failed");
        assert_eq!(translation.blocks_opened, 1);
        assert_eq!(translation.blocks_closed, 1);
        assert!(matches!(
            &translation.program.statements[..],
            [Statement::For { body, .. }, Statement::Expr(_)] if body.is_empty()
        ));
    }

    #[test]
    fn dedent_closes_every_deeper_block() {
        let source = indoc! {"
            for i in range(2):
                for j in range(2):
                    if i == j:
                        print(i)
            print('end')
        "};
        let translation = translate(source).expect("translate failed");
        assert_eq!(translation.blocks_opened, 3);
        assert_eq!(translation.blocks_closed, 3);
        assert_eq!(translation.program.statements.len(), 2);
    }

    #[test]
    fn unwinds_open_blocks_at_end_of_input() {
        let source = "while x < 3:\n    if x:\n        x += 1";
        let translation = translate(source).expect("translate failed");
        assert_eq!(translation.blocks_opened, 2);
        assert_eq!(translation.blocks_closed, 2);
        assert_eq!(translation.program.statements.len(), 1);
    }

    #[test]
    fn deeper_indent_without_header_stays_in_current_block() {
        let source = "x = 1\n    y = 2\nprint(x)";
        assert_eq!(statements(source).len(), 3);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let source = indoc! {"
            # heading

            for i in range(2):
                # inside

                print(i)
        "};
        let statements = statements(source);
        assert!(matches!(
            &statements[..],
            [Statement::For { body, .. }] if body.len() == 1
        ));
    }

    #[test]
    fn else_attaches_to_if_closed_by_dedent() {
        let source = indoc! {"
            for i in range(3):
                if i == 0:
                    print('zero')
                else:
                    print(i)
        "};
        let statements = statements(source);
        let [Statement::For { body, .. }] = &statements[..] else {
            panic!("expected a single for loop, got {statements:?}");
        };
        assert!(matches!(
            &body[..],
            [Statement::If { branches, else_body: Some(_) }] if branches.len() == 1
        ));
    }

    #[test]
    fn errors_on_else_without_if() {
        let err = translate("x = 1\nelse:\n    print(x)").expect_err("expected dangling else");
        assert_eq!(
            err.to_string(),
            "Syntax error on line 2: 'else' without a matching 'if'"
        );
    }

    #[test]
    fn errors_on_elif_after_else() {
        let source = indoc! {"
            if x:
                print(1)
            else:
                print(2)
            elif y:
                print(3)
        "};
        let err = translate(source).expect_err("expected dangling elif");
        assert_eq!(
            err,
            TranslateError::DanglingBranch {
                line: 5,
                keyword: "elif"
            }
        );
    }

    #[test]
    fn errors_on_break_outside_loop() {
        let source = "if True:\n    break";
        let err = translate(source).expect_err("expected break outside loop");
        assert_eq!(
            err.to_string(),
            "Syntax error on line 2: 'break' outside loop"
        );
    }

    #[test]
    fn reports_parse_errors_with_line_number() {
        let err = translate("x = 1\ny = = 2").expect_err("expected parse failure");
        assert_eq!(err.line(), 2);
        assert_eq!(
            err.to_string(),
            "Syntax error on line 2: Expected expression, got '='"
        );
    }

    #[test]
    fn parse_errors_keep_the_offending_column() {
        let err = translate("x = 1\ny = = 2").expect_err("expected parse failure");
        assert_eq!(err.column(), Some(4));
    }

    #[test]
    fn rejects_blocks_nested_past_the_limit() {
        let mut source = String::new();
        for depth in 0..MAX_BLOCK_DEPTH + 20 {
            source.push_str(&format!("{}if True:\n", "    ".repeat(depth)));
        }
        source.push_str(&format!("{}pass\n", "    ".repeat(MAX_BLOCK_DEPTH + 20)));

        let err = translate(&source).expect_err("expected nesting failure");
        assert_eq!(
            err,
            TranslateError::TooDeeplyNested {
                line: MAX_BLOCK_DEPTH + 1,
                limit: MAX_BLOCK_DEPTH,
            }
        );
    }
}
