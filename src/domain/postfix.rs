//! Infix to postfix conversion (shunting-yard).

use super::errors::{FormulaError, FormulaResult, Unbalanced};
use super::operators::OperatorRegistry;
use super::tokenizer::Token;

/// Checks that parenthesis nesting never goes negative and ends at zero.
pub fn check_parentheses(tokens: &[Token]) -> FormulaResult<()> {
    let mut depth: usize = 0;
    for token in tokens {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(FormulaError::ParenthesisMismatch(Unbalanced::Closing))?;
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(FormulaError::ParenthesisMismatch(Unbalanced::Opening));
    }
    Ok(())
}

/// Reorders infix tokens into postfix order.
///
/// On an operator, every stacked operator with greater or equal precedence is
/// emitted first, which makes equal-precedence chains left-associative.
/// Parentheses never appear in the output.
pub fn to_postfix(tokens: Vec<Token>, registry: &OperatorRegistry) -> FormulaResult<Vec<Token>> {
    check_parentheses(&tokens)?;

    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) | Token::Identifier(_) => output.push(token),
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(FormulaError::ParenthesisMismatch(Unbalanced::Closing)),
                }
            },
            Token::Operator(symbol) => {
                let incoming = precedence_of(registry, symbol)?;
                while let Some(Token::Operator(top)) = stack.last() {
                    if precedence_of(registry, *top)? < incoming {
                        break;
                    }
                    if let Some(op) = stack.pop() {
                        output.push(op);
                    }
                }
                stack.push(Token::Operator(symbol));
            }
        }
    }

    while let Some(token) = stack.pop() {
        if token == Token::LeftParen {
            return Err(FormulaError::ParenthesisMismatch(Unbalanced::Opening));
        }
        output.push(token);
    }

    Ok(output)
}

fn precedence_of(registry: &OperatorRegistry, symbol: char) -> FormulaResult<u8> {
    registry
        .get(symbol)
        .map(|spec| spec.precedence)
        .ok_or_else(|| FormulaError::MalformedExpression(format!("unknown operator '{symbol}'")))
}
