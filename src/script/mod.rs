//! Script interpreter driving bound classes
//!
//! A [`Session`] keeps the variables of one script or REPL run. Variables hold
//! either plain JSON values or [`Instance`]s; assignment copies, and `del` or
//! reassignment drops the previous binding.

pub mod parser;

use crate::host::{ClassRegistry, Instance};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub use parser::{parse_statement, Expr, ParseError, Statement};

/// Errors raised while running a script. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: syntax error: {error}")]
    Syntax { line: usize, error: ParseError },

    #[error("line {line}: undefined variable '{name}'")]
    UndefinedVariable { line: usize, name: String },

    #[error("line {line}: {message}")]
    Runtime { line: usize, message: String },
}

impl ScriptError {
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Syntax { line, .. }
            | ScriptError::UndefinedVariable { line, .. }
            | ScriptError::Runtime { line, .. } => *line,
        }
    }
}

/// What a variable holds
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Object(Instance),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(value) => write!(f, "{}", format_value(value)),
            Binding::Object(instance) => write!(f, "{}", instance),
        }
    }
}

/// Render a value the way `print` shows it
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluation failure before a line number is attached
enum EvalError {
    Undefined(String),
    Runtime(String),
}

impl EvalError {
    fn at(self, line: usize) -> ScriptError {
        match self {
            EvalError::Undefined(name) => ScriptError::UndefinedVariable { line, name },
            EvalError::Runtime(message) => ScriptError::Runtime { line, message },
        }
    }
}

impl From<anyhow::Error> for EvalError {
    fn from(err: anyhow::Error) -> Self {
        EvalError::Runtime(format!("{:#}", err))
    }
}

pub struct Session {
    registry: ClassRegistry,
    vars: BTreeMap<String, Binding>,
}

impl Session {
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry,
            vars: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.vars.get(name)
    }

    /// Variables in name order
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.vars.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    /// Forget every variable
    pub fn reset(&mut self) {
        self.vars.clear();
    }

    /// Parse and run one line, returning what it printed
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Result<Option<String>, ScriptError> {
        let statement = parse_statement(line).map_err(|error| ScriptError::Syntax {
            line: line_no,
            error,
        })?;
        self.execute(&statement).map_err(|e| e.at(line_no))
    }

    /// Run a whole script, stopping at the first error
    pub fn run_source(&mut self, source: &str) -> Result<Vec<String>, ScriptError> {
        let mut printed = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if let Some(out) = self.run_line(idx + 1, line)? {
                printed.push(out);
            }
        }
        Ok(printed)
    }

    fn execute(&mut self, statement: &Statement) -> Result<Option<String>, EvalError> {
        match statement {
            Statement::Empty => Ok(None),
            Statement::Assign { name, value } => {
                let binding = self.eval(value)?;
                debug!(variable = %name, "assigning");
                self.vars.insert(name.clone(), binding);
                Ok(None)
            }
            Statement::Expr(expr) => {
                self.eval(expr)?;
                Ok(None)
            }
            Statement::Print(exprs) => {
                let mut parts = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    parts.push(self.eval(expr)?.to_string());
                }
                Ok(Some(parts.join(" ")))
            }
            Statement::Delete(name) => match self.vars.remove(name) {
                Some(_) => Ok(None),
                None => Err(EvalError::Undefined(name.clone())),
            },
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Binding, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(Binding::Value(value.clone())),
            Expr::Variable(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Construct { class, args } => {
                let args = self.eval_args(args)?;
                let class = self.registry.class(class)?;
                Ok(Binding::Object(class.construct(&args)?))
            }
            Expr::MethodCall {
                target,
                method,
                args,
            } => {
                let args = self.eval_args(args)?;
                let instance = match self.vars.get_mut(target) {
                    Some(Binding::Object(instance)) => instance,
                    Some(Binding::Value(value)) => {
                        return Err(EvalError::Runtime(format!(
                            "'{}' is {}, which has no method '{}'",
                            target,
                            format_value(value),
                            method
                        )))
                    }
                    None => return Err(EvalError::Undefined(target.clone())),
                };
                Ok(Binding::Value(instance.call(method, &args)?))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
        let mut values = Vec::with_capacity(args.len());
        for (idx, arg) in args.iter().enumerate() {
            match self.eval(arg)? {
                Binding::Value(value) => values.push(value),
                Binding::Object(instance) => {
                    return Err(EvalError::Runtime(format!(
                        "argument {} is a {} instance; only values can be passed",
                        idx + 1,
                        instance.class_name()
                    )))
                }
            }
        }
        Ok(values)
    }
}
