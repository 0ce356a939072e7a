//! exprtree - interactive expression tree evaluator
//!
//! Builds an expression tree from an arithmetic expression, lets the user
//! bind values to its variables and evaluates it.

use std::io::{self, BufRead, Write};

use clap::Parser;

use exprsheet::domain::{format_number, ExpressionTree, FormulaError};
use exprsheet::infrastructure::logging;

#[derive(Parser, Debug)]
#[command(name = "exprtree")]
#[command(version, about = "Evaluate arithmetic expressions with variables")]
struct Cli {
    /// Starting expression
    #[arg(default_value = "A1+12+C1")]
    expression: String,
}

/// Short name of the failure kind shown before the message.
fn error_kind(err: &FormulaError) -> &'static str {
    match err {
        FormulaError::ParenthesisMismatch(_) => "parenthesis mismatch",
        FormulaError::MalformedExpression(_) => "malformed expression",
        FormulaError::UnboundVariable(_) => "unbound variable",
    }
}

struct Session<R, W> {
    input: R,
    output: W,
    expression: String,
    tree: ExpressionTree,
}

impl<R: BufRead, W: Write> Session<R, W> {
    fn new(input: R, output: W, expression: String) -> Result<Self, FormulaError> {
        let tree = ExpressionTree::new(&expression)?;
        Ok(Self { input, output, expression, tree })
    }

    /// Reads one trimmed line, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Menu (current expression= {})", self.expression)?;
        writeln!(self.output, "1 = Enter a new expression")?;
        writeln!(self.output, "2 = Set a variable value")?;
        writeln!(self.output, "3 = Evaluate tree")?;
        writeln!(self.output, "4 = Quit")
    }

    fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.read_line("")? else {
                return Ok(());
            };

            match choice.as_str() {
                "1" => {
                    let Some(expression) = self.read_line("Enter new expression: ")? else {
                        return Ok(());
                    };
                    self.replace_expression(expression)?;
                }
                "2" => {
                    let Some(name) = self.read_line("Enter variable name: ")? else {
                        return Ok(());
                    };
                    let Some(raw) = self.read_line("Enter variable value: ")? else {
                        return Ok(());
                    };
                    self.set_variable(&name, &raw)?;
                }
                "3" => match self.tree.evaluate() {
                    Ok(value) => writeln!(self.output, "{}", format_number(value))?,
                    Err(err) => writeln!(self.output, "Error ({}): {}", error_kind(&err), err)?,
                },
                "4" => return Ok(()),
                _ => {}
            }
        }
    }

    /// Swaps in a new tree. A failed parse keeps the current one.
    fn replace_expression(&mut self, expression: String) -> io::Result<()> {
        match ExpressionTree::new(&expression) {
            Ok(tree) => {
                tracing::debug!(expression = %expression, variables = ?tree.variable_names(), "built expression tree");
                self.tree = tree;
                self.expression = expression;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(expression = %expression, error = %err, "rejected expression");
                writeln!(self.output, "Error ({}): {}", error_kind(&err), err)
            }
        }
    }

    fn set_variable(&mut self, name: &str, raw: &str) -> io::Result<()> {
        let value = match raw.parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                writeln!(self.output, "Not a number: {raw:?}, using 0")?;
                0.0
            }
        };
        self.tree.set_variable(name, value);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_stderr();
    let cli = Cli::parse();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), stdout.lock(), cli.expression)?;
    session.run()?;
    Ok(())
}
