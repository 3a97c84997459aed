//! Validator, translator and sandboxed executor for a small Python-shaped
//! teaching language.
//!
//! [`run`] is the single entry point: it validates the source line by line,
//! rebuilds the block structure from indentation, executes the result with
//! `print` and `range` as the only intrinsics, and always returns a
//! [`RunResult`].

use serde::Serialize;
use tracing::debug;

pub mod ast;
pub mod builtins;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod translator;
pub mod validator;

pub use config::RunConfig;
pub use error::Error;

use interpreter::Interpreter;

/// Outcome of one run: either output lines or a single error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub output: Vec<String>,
    pub error: Option<String>,
}

impl RunResult {
    pub fn success(output: Vec<String>) -> Self {
        Self {
            output,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            output: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when the run succeeded and printed exactly `expected`, line for line.
    pub fn matches<S: AsRef<str>>(&self, expected: &[S]) -> bool {
        self.is_success()
            && self.output.len() == expected.len()
            && self
                .output
                .iter()
                .zip(expected)
                .all(|(actual, expected)| actual == expected.as_ref())
    }
}

impl From<Result<Vec<String>, Error>> for RunResult {
    fn from(result: Result<Vec<String>, Error>) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(error) => Self::failure(error.to_string()),
        }
    }
}

/// Runs the full pipeline and reports failures as typed errors.
///
/// Output printed before a runtime error is discarded.
pub fn execute(source: &str, config: &RunConfig) -> Result<Vec<String>, Error> {
    let result = run_stages(source, config);
    if let Err(error) = &result {
        debug!(line = error.line(), column = error.column(), "run failed: {error}");
    }
    result
}

fn run_stages(source: &str, config: &RunConfig) -> Result<Vec<String>, Error> {
    validator::validate(source)?;
    let translation = translator::translate(source)?;
    let output = Interpreter::new(*config).run(&translation.program)?;
    Ok(output)
}

pub fn run(source: &str) -> RunResult {
    run_with_config(source, &RunConfig::default())
}

pub fn run_with_config(source: &str, config: &RunConfig) -> RunResult {
    execute(source, config).into()
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn reports_missing_colon_with_line_number() {
        let result = run("for i in range(3)\n    print(i)");
        assert_eq!(
            result,
            RunResult::failure("Syntax error on line 1: Missing colon (:) at end of line")
        );
    }

    #[test]
    fn prints_each_value_of_a_range() {
        assert_eq!(
            run("for i in range(3):\n    print(i)"),
            RunResult::success(vec!["0".into(), "1".into(), "2".into()])
        );
    }

    #[test]
    fn takes_the_matching_branch_of_if_else() {
        let source = indoc! {"
            x = 5
            if x > 3:
                print('big')
            else:
                print('small')
        "};
        assert_eq!(run(source), RunResult::success(vec!["big".into()]));
    }

    #[test]
    fn counts_down_with_negative_step() {
        let result = run("for i in range(5, 0, -1):\n    print(i)");
        assert!(result.matches(&["5", "4", "3", "2", "1"]));
    }

    #[test]
    fn reports_unmatched_quote() {
        let result = run("x = 1\nprint('hi)");
        assert_eq!(
            result.error.as_deref(),
            Some("Syntax error on line 2: Unmatched single quote (')")
        );
        assert!(result.output.is_empty());
    }

    #[test]
    fn discards_output_printed_before_a_runtime_error() {
        let source = indoc! {"
            print('before')
            print(missing)
        "};
        assert_eq!(
            run(source),
            RunResult::failure("Undefined variable 'missing'")
        );
    }

    #[test]
    fn structural_errors_carry_line_numbers() {
        let source = indoc! {"
            x = 1
            else:
                print(x)
        "};
        assert_eq!(
            run(source).error.as_deref(),
            Some("Syntax error on line 2: 'else' without a matching 'if'")
        );
    }

    #[test]
    fn runs_nested_loops_with_string_methods() {
        let source = indoc! {"
            # triangle
            for row in range(1, 4):
                line = ''
                for col in range(row):
                    line += '*'
                print(line.strip())
            word = '  done  '
            if 'one' in word:
                print(word.strip().upper())
        "};
        assert!(run(source).matches(&["*", "**", "***", "DONE"]));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let source = indoc! {"
            total = 0
            for i in range(4):
                total += i
            print(total)
        "};
        let first = run(source);
        let second = run(source);
        assert_eq!(first, second);
        assert!(first.matches(&["6"]));
    }

    #[test]
    fn limits_in_config_become_errors() {
        let config = RunConfig::default().with_step_limit(50);
        let result = run_with_config("while True:\n    pass", &config);
        assert_eq!(result.error.as_deref(), Some("Step limit of 50 exceeded"));

        let config = RunConfig::default().with_range_limit(5);
        let result = run_with_config("print(range(6))", &config);
        assert_eq!(
            result.error.as_deref(),
            Some("range() of length 6 exceeds limit 5")
        );
    }

    #[test]
    fn oversized_sequences_are_errors_by_default() {
        let result = run("print('ab' * 9223372036854775807)");
        assert_eq!(
            result,
            RunResult::failure("Sequence of length 18446744073709551614 cannot be allocated")
        );

        let result = run("items = [0] * 9223372036854775807\nprint(items)");
        assert_eq!(
            result.error.as_deref(),
            Some("Sequence of length 9223372036854775807 cannot be allocated")
        );

        let result = run("for i in range(9223372036854775807):\n    print(i)");
        assert_eq!(
            result.error.as_deref(),
            Some("range() of length 9223372036854775807 cannot be allocated")
        );
        assert!(result.output.is_empty());
    }

    #[test]
    fn sequence_limit_rejects_long_products() {
        let config = RunConfig::default().with_sequence_limit(6);
        let result = run_with_config("print('ab' * 3)\nprint('ab' * 4)", &config);
        assert_eq!(
            result,
            RunResult::failure("Sequence of length 8 exceeds limit 6")
        );
    }

    #[test]
    fn zero_step_range_is_empty_when_counting_up() {
        let source = indoc! {"
            for i in range(0, 5, 0):
                print(i)
            print('done')
        "};
        assert!(run(source).matches(&["done"]));

        let result = run("for i in range(5, 0, 0):\n    print(i)");
        assert_eq!(
            result.error.as_deref(),
            Some("range() with step 0 from 5 never reaches 0")
        );
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let source = format!("print({}1{})", "(".repeat(3000), ")".repeat(3000));
        let error = execute(&source, &RunConfig::default()).expect_err("expected nesting error");
        assert_eq!(error.line(), Some(1));
        assert_eq!(
            error.to_string(),
            "Syntax error on line 1: Expression nested more than 100 levels deep"
        );

        let result = run(&format!("x = {}1", "not ".repeat(3000)));
        assert_eq!(
            result.error.as_deref(),
            Some("Syntax error on line 1: Expression nested more than 100 levels deep")
        );
    }

    #[test]
    fn parse_errors_expose_their_column() {
        let error = execute("x = 1\nprint(1 2)", &RunConfig::default())
            .expect_err("expected parse failure");
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.column(), Some(8));
    }

    #[test]
    fn matches_requires_success_and_equal_lines() {
        let result = RunResult::success(vec!["a".into(), "b".into()]);
        assert!(result.matches(&["a", "b"]));
        assert!(!result.matches(&["a"]));
        assert!(!result.matches(&["a", "c"]));
        assert!(!RunResult::failure("boom").matches::<&str>(&[]));
    }

    #[test]
    fn serialises_to_output_and_error_fields() {
        let json = serde_json::to_string(&RunResult::success(vec!["1".into()]))
            .expect("serialise success");
        assert_eq!(json, r#"{"output":["1"],"error":null}"#);
        let json = serde_json::to_string(&RunResult::failure("bad")).expect("serialise failure");
        assert_eq!(json, r#"{"output":[],"error":"bad"}"#);
    }
}
