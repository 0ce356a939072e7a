//! Expression trees built from formula text.
//!
//! An [`ExpressionTree`] is built once per formula: the text is tokenized,
//! converted to postfix order and folded into a tree of [`ExpressionNode`]s.
//! Variable bindings live next to the tree and can be changed between
//! evaluations without rebuilding it.
//!
//! ```
//! use exprsheet::domain::ExpressionTree;
//!
//! let mut tree = ExpressionTree::new("(A1+2)*b").unwrap();
//! tree.set_variable("A1", 4.0);
//! tree.set_variable("b", 0.5);
//! assert_eq!(tree.evaluate().unwrap(), 3.0);
//! ```

use std::collections::BTreeMap;

use super::errors::{FormulaError, FormulaResult};
use super::operators::{OperatorRegistry, OperatorSpec};
use super::postfix::to_postfix;
use super::tokenizer::{tokenize, Token};

/// A node of an expression tree. Interior nodes own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    Constant(f64),
    Variable(String),
    BinaryOp {
        op: OperatorSpec,
        left: Box<ExpressionNode>,
        right: Box<ExpressionNode>,
    },
}

/// A parsed formula together with the values bound to its variables.
#[derive(Debug, Clone)]
pub struct ExpressionTree {
    root: ExpressionNode,
    variables: BTreeMap<String, f64>,
}

impl ExpressionTree {
    /// Builds a tree using the shared operator registry.
    pub fn new(expression: &str) -> FormulaResult<Self> {
        Self::with_registry(expression, OperatorRegistry::global())
    }

    /// Builds a tree using the given operator registry.
    ///
    /// Every distinct identifier becomes a variable bound to `0.0`.
    pub fn with_registry(expression: &str, registry: &OperatorRegistry) -> FormulaResult<Self> {
        let tokens = tokenize(expression, registry)?;
        if tokens.is_empty() {
            return Err(FormulaError::MalformedExpression("empty expression".to_string()));
        }
        let postfix = to_postfix(tokens, registry)?;

        let mut variables = BTreeMap::new();
        let mut stack: Vec<ExpressionNode> = Vec::new();

        for token in postfix {
            match token {
                Token::Number(value) => stack.push(ExpressionNode::Constant(value)),
                Token::Identifier(name) => {
                    variables.entry(name.clone()).or_insert(0.0);
                    stack.push(ExpressionNode::Variable(name));
                }
                Token::Operator(symbol) => {
                    let op = *registry.get(symbol).ok_or_else(|| {
                        FormulaError::MalformedExpression(format!("unknown operator '{symbol}'"))
                    })?;
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(missing_operand());
                    };
                    stack.push(ExpressionNode::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(FormulaError::MalformedExpression(
                        "parenthesis left in postfix output".to_string(),
                    ));
                }
            }
        }

        let root = stack.pop().ok_or_else(missing_operand)?;
        if !stack.is_empty() {
            return Err(missing_operand());
        }

        Ok(Self { root, variables })
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.root
    }

    /// Binds a value to a variable, adding the binding if it is new.
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }

    /// Current value bound to `name`, if the tree knows it.
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Names of the free variables of the formula, each listed once, sorted.
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Evaluates the tree against the current bindings.
    ///
    /// Arithmetic is plain IEEE-754 `f64`: dividing by zero yields infinity
    /// (or NaN for `0/0`) rather than an error.
    pub fn evaluate(&self) -> FormulaResult<f64> {
        enum Step<'a> {
            Visit(&'a ExpressionNode),
            Apply(&'a OperatorSpec),
        }

        let mut steps = vec![Step::Visit(&self.root)];
        let mut values: Vec<f64> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(ExpressionNode::Constant(value)) => values.push(*value),
                Step::Visit(ExpressionNode::Variable(name)) => {
                    let value = self
                        .variable(name)
                        .ok_or_else(|| FormulaError::UnboundVariable(name.clone()))?;
                    values.push(value);
                }
                Step::Visit(ExpressionNode::BinaryOp { op, left, right }) => {
                    steps.push(Step::Apply(op));
                    steps.push(Step::Visit(right.as_ref()));
                    steps.push(Step::Visit(left.as_ref()));
                }
                Step::Apply(op) => {
                    let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
                        return Err(missing_operand());
                    };
                    values.push((op.apply)(left, right));
                }
            }
        }

        values.pop().ok_or_else(missing_operand)
    }
}

fn missing_operand() -> FormulaError {
    FormulaError::MalformedExpression("expected operand (operator operand)*".to_string())
}
