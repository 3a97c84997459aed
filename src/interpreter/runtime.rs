use std::collections::HashMap;

use crate::ast::{ConditionalBranch, Expression, LogicalOperator, Statement, UnaryOperator};
use crate::builtins::{self, BuiltinFunction};
use crate::config::RunConfig;

use super::value::StringMethod;
use super::{InterpreterError, Value};

type EvalResult<T> = std::result::Result<T, InterpreterError>;

/// Control-flow marker for statement execution.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ExecResult {
    Normal,
    Break,
    Continue,
}

/// Flat variable scope. Every name assigned during a run is global.
#[derive(Debug, Default)]
pub(super) struct Environment {
    globals: HashMap<String, Value>,
}

impl Environment {
    fn load(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    fn store(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_string(), value);
    }
}

/// Runtime executor for statements and expressions of a single run.
pub(super) struct InterpreterRuntime {
    pub(super) environment: Environment,
    pub(super) output: Vec<String>,
    steps: u64,
    config: RunConfig,
}

impl InterpreterRuntime {
    pub(super) fn new(config: RunConfig) -> Self {
        Self {
            environment: Environment::default(),
            output: Vec::new(),
            steps: 0,
            config,
        }
    }

    pub(super) fn steps(&self) -> u64 {
        self.steps
    }

    /// Counts one unit of work against the configured step limit.
    fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if let Some(limit) = self.config.step_limit
            && self.steps > limit
        {
            return Err(InterpreterError::StepLimitExceeded { limit });
        }
        Ok(())
    }

    pub(super) fn exec_block(&mut self, body: &[Statement]) -> EvalResult<ExecResult> {
        for statement in body {
            match self.exec_statement(statement)? {
                ExecResult::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(ExecResult::Normal)
    }

    fn exec_statement(&mut self, statement: &Statement) -> EvalResult<ExecResult> {
        self.tick()?;
        match statement {
            Statement::Assign { name, value } => {
                let value = self.eval_expression(value)?;
                self.environment.store(name, value);
                Ok(ExecResult::Normal)
            }
            Statement::AugAssign { name, op, value } => {
                let current = self.lookup(name)?;
                let value = self.eval_expression(value)?;
                let updated = current.binary(*op, &value, self.config.sequence_limit)?;
                self.environment.store(name, updated);
                Ok(ExecResult::Normal)
            }
            Statement::For {
                target,
                iterable,
                body,
            } => {
                let items = self.eval_expression(iterable)?.iterate()?;
                for item in items {
                    self.tick()?;
                    self.environment.store(target, item);
                    if self.exec_block(body)? == ExecResult::Break {
                        break;
                    }
                }
                Ok(ExecResult::Normal)
            }
            Statement::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    self.tick()?;
                    if self.exec_block(body)? == ExecResult::Break {
                        break;
                    }
                }
                Ok(ExecResult::Normal)
            }
            Statement::If {
                branches,
                else_body,
            } => {
                for ConditionalBranch { condition, body } in branches {
                    if self.eval_expression(condition)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body),
                    None => Ok(ExecResult::Normal),
                }
            }
            Statement::Break => Ok(ExecResult::Break),
            Statement::Continue => Ok(ExecResult::Continue),
            Statement::Pass => Ok(ExecResult::Normal),
            Statement::Expr(expr) => {
                self.eval_expression(expr)?;
                Ok(ExecResult::Normal)
            }
        }
    }

    /// Resolves a name against assigned variables first, then intrinsics.
    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.environment.load(name) {
            return Ok(value.clone());
        }
        BuiltinFunction::from_name(name)
            .map(Value::BuiltinFunction)
            .ok_or_else(|| InterpreterError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn eval_expression(&mut self, expr: &Expression) -> EvalResult<Value> {
        match expr {
            Expression::Integer(value) => Ok(Value::Integer(*value)),
            Expression::Float(value) => Ok(Value::Float(*value)),
            Expression::String(value) => Ok(Value::String(value.clone())),
            Expression::Boolean(value) => Ok(Value::Boolean(*value)),
            Expression::None => Ok(Value::None),
            Expression::Identifier(name) => self.lookup(name),
            Expression::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element)?);
                }
                Ok(Value::List(values))
            }
            Expression::Index { object, index } => {
                let object = self.eval_expression(object)?;
                let index = self.eval_expression(index)?;
                object.index(&index)
            }
            Expression::Attribute { object, name } => {
                let object = self.eval_expression(object)?;
                match (&object, StringMethod::from_name(name)) {
                    (Value::String(receiver), Some(method)) => Ok(Value::BoundMethod {
                        receiver: receiver.clone(),
                        method,
                    }),
                    _ => Err(InterpreterError::UnknownAttribute {
                        attribute: name.clone(),
                        type_name: object.type_name(),
                    }),
                }
            }
            Expression::Call { callee, args } => {
                let callee = self.eval_expression(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expression(arg)?);
                }
                self.call_value(callee, values)
            }
            Expression::Unary { op, operand } => {
                let operand = self.eval_expression(operand)?;
                match op {
                    UnaryOperator::Negate => operand.negate(),
                    UnaryOperator::Plus => operand.unary_plus(),
                    UnaryOperator::Not => Ok(Value::Boolean(!operand.is_truthy())),
                }
            }
            Expression::BinaryOp { left, op, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                left.binary(*op, &right, self.config.sequence_limit)
            }
            Expression::Compare { left, comparisons } => {
                let mut current = self.eval_expression(left)?;
                for (op, right) in comparisons {
                    let right = self.eval_expression(right)?;
                    if !current.compare(*op, &right)? {
                        return Ok(Value::Boolean(false));
                    }
                    current = right;
                }
                Ok(Value::Boolean(true))
            }
            Expression::Logical { left, op, right } => {
                // Short-circuits and yields the deciding operand, not a bool.
                let left = self.eval_expression(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOperator::And, false) | (LogicalOperator::Or, true) => Ok(left),
                    _ => self.eval_expression(right),
                }
            }
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::BuiltinFunction(BuiltinFunction::Print) => {
                let line = args
                    .iter()
                    .map(Value::to_output)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.output.push(line);
                Ok(Value::None)
            }
            Value::BuiltinFunction(BuiltinFunction::Range) => {
                let bounds = args
                    .iter()
                    .map(Value::as_int)
                    .collect::<EvalResult<Vec<_>>>()?;
                let values = builtins::range(&bounds, self.config.range_limit)?;
                Ok(Value::List(values.into_iter().map(Value::Integer).collect()))
            }
            Value::BoundMethod { receiver, method } => {
                if !args.is_empty() {
                    return Err(InterpreterError::MethodArityMismatch {
                        method: method.name(),
                        expected: 0,
                        found: args.len(),
                    });
                }
                Ok(Value::String(method.apply(&receiver)))
            }
            other => Err(InterpreterError::ObjectNotCallable {
                type_name: other.type_name(),
            }),
        }
    }
}
