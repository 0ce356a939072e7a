//! Binary operator registry.
//!
//! Every operator the formula language understands is described by a plain
//! [`OperatorSpec`] record. The tokenizer, the postfix converter and the tree
//! builder only ever consult an [`OperatorRegistry`], so adding an operator
//! means adding one row to [`BUILTIN_OPERATORS`] (or registering it on a
//! custom registry) and nothing else.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Evaluation rule of a binary operator.
pub type OperatorFn = fn(f64, f64) -> f64;

/// Symbol, precedence and evaluation rule of one binary operator.
///
/// Higher precedence binds tighter. All operators are left-associative.
#[derive(Clone, Copy)]
pub struct OperatorSpec {
    pub symbol: char,
    pub precedence: u8,
    pub apply: OperatorFn,
}

impl OperatorSpec {
    pub const fn new(symbol: char, precedence: u8, apply: OperatorFn) -> Self {
        Self { symbol, precedence, apply }
    }
}

impl std::fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("symbol", &self.symbol)
            .field("precedence", &self.precedence)
            .finish()
    }
}

impl PartialEq for OperatorSpec {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.precedence == other.precedence
    }
}

/// The operators loaded into the process-wide registry.
pub const BUILTIN_OPERATORS: &[OperatorSpec] = &[
    OperatorSpec::new('+', 0, |a, b| a + b),
    OperatorSpec::new('-', 0, |a, b| a - b),
    OperatorSpec::new('*', 1, |a, b| a * b),
    OperatorSpec::new('/', 1, |a, b| a / b),
];

static GLOBAL_REGISTRY: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::new);

/// Lookup table from operator symbol to its [`OperatorSpec`].
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<char, OperatorSpec>,
}

impl OperatorRegistry {
    /// Creates a registry holding the built-in operators.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for spec in BUILTIN_OPERATORS {
            registry.register(*spec);
        }
        registry
    }

    /// Creates a registry with no operators at all.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// The shared registry built once from [`BUILTIN_OPERATORS`].
    pub fn global() -> &'static OperatorRegistry {
        &GLOBAL_REGISTRY
    }

    /// Registers an operator, replacing any previous one with the same symbol.
    pub fn register(&mut self, spec: OperatorSpec) {
        self.operators.insert(spec.symbol, spec);
    }

    pub fn get(&self, symbol: char) -> Option<&OperatorSpec> {
        self.operators.get(&symbol)
    }

    pub fn is_operator(&self, symbol: char) -> bool {
        self.operators.contains_key(&symbol)
    }

    /// Registered symbols in ascending order.
    pub fn symbols(&self) -> Vec<char> {
        let mut symbols: Vec<char> = self.operators.keys().copied().collect();
        symbols.sort_unstable();
        symbols
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_operators() {
        let registry = OperatorRegistry::global();
        assert_eq!(registry.symbols(), vec!['*', '+', '-', '/']);

        let add = registry.get('+').unwrap();
        assert_eq!(add.precedence, 0);
        assert_eq!((add.apply)(2.0, 3.0), 5.0);

        let sub = registry.get('-').unwrap();
        assert_eq!(sub.precedence, 0);
        assert_eq!((sub.apply)(2.0, 3.0), -1.0);

        let mul = registry.get('*').unwrap();
        assert_eq!(mul.precedence, 1);
        assert_eq!((mul.apply)(2.0, 3.0), 6.0);

        let div = registry.get('/').unwrap();
        assert_eq!(div.precedence, 1);
        assert_eq!((div.apply)(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_unknown_operator() {
        let registry = OperatorRegistry::new();
        assert!(registry.get('%').is_none());
        assert!(!registry.is_operator('^'));
        assert!(!OperatorRegistry::empty().is_operator('+'));
    }

    #[test]
    fn test_register_custom_operator() {
        let mut registry = OperatorRegistry::new();
        registry.register(OperatorSpec::new('%', 1, |a, b| a % b));

        assert!(registry.is_operator('%'));
        let modulo = registry.get('%').unwrap();
        assert_eq!((modulo.apply)(10.0, 3.0), 1.0);
        // The shared registry is untouched.
        assert!(!OperatorRegistry::global().is_operator('%'));
    }
}
