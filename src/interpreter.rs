use tracing::debug;

use crate::ast::Program;
use crate::config::RunConfig;

mod error;
mod runtime;
mod value;

pub use error::InterpreterError;
use runtime::{ExecResult, InterpreterRuntime};
use value::Value;

/// Tree-walking executor for translated programs.
///
/// Each call to [`Interpreter::run`] starts from an empty variable scope, so
/// nothing assigned by one run is visible to the next.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: RunConfig,
}

impl Interpreter {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Executes `program` and returns the lines captured from `print`.
    pub fn run(&self, program: &Program) -> Result<Vec<String>, InterpreterError> {
        // run -> exec_block -> exec_statement -> eval_expression -> call_value
        let mut runtime = InterpreterRuntime::new(self.config);
        let outcome = runtime.exec_block(&program.statements);
        debug!(
            steps = runtime.steps(),
            lines = runtime.output.len(),
            failed = outcome.is_err(),
            "program finished"
        );
        match outcome? {
            ExecResult::Normal => Ok(runtime.output),
            ExecResult::Break => Err(InterpreterError::LoopControlOutsideLoop { keyword: "break" }),
            ExecResult::Continue => Err(InterpreterError::LoopControlOutsideLoop {
                keyword: "continue",
            }),
        }
    }
}
