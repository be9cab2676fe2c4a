//! L-system grammar engine for procedural plant generation.
//!
//! An L-system rewrites a starting string (the axiom) by applying production
//! rules to every symbol for a number of iterations. The resulting string is
//! interpreted elsewhere as turtle-graphics commands to build branch
//! geometry.
//!
//! Rules are kept in an *ordered* table: for each symbol the first rule in
//! table order whose predecessor matches is applied, and symbols without a
//! matching rule pass through unchanged. Duplicate predecessors are legal;
//! later duplicates are shadowed and never fire.
//!
//! # Example
//!
//! ```
//! use verdant_lsystem::{LSystem, Rule};
//!
//! let lsystem = LSystem::new("X")
//!     .with_rule(Rule::new('X', "F[+X][-X]FX"))
//!     .with_rule(Rule::new('F', "FF"));
//!
//! let symbols = lsystem.generate(4);
//! assert!(symbols.len() > 100);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

/// A production rule mapping one symbol to a replacement string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    /// The symbol to replace.
    pub predecessor: char,
    /// The replacement string.
    pub successor: String,
}

impl Rule {
    /// Creates a rule replacing `predecessor` with `successor`.
    pub fn new(predecessor: char, successor: &str) -> Self {
        Self {
            predecessor,
            successor: successor.to_string(),
        }
    }
}

/// A one-shot symbol removal applied during a specific rewrite pass.
///
/// Iterations are 1-based: `Prune::at(1, 'F')` removes every `F` while the
/// first rewritten string is being produced, so nothing derived from those
/// occurrences ever appears in later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prune {
    /// The 1-based iteration during which the symbol is removed.
    pub iteration: usize,
    /// The symbol to remove.
    pub symbol: char,
}

impl Prune {
    /// Creates a prune of `symbol` at the given 1-based iteration.
    pub fn at(iteration: usize, symbol: char) -> Self {
        Self { iteration, symbol }
    }
}

/// Error returned by [`LSystem::generate_bounded`] when an expansion grows
/// past the configured symbol cap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expansion exceeded {max} symbols at iteration {iteration} ({len} symbols)")]
pub struct CapacityError {
    /// The 1-based iteration whose output overflowed the cap.
    pub iteration: usize,
    /// Length of the overflowing string.
    pub len: usize,
    /// The configured cap.
    pub max: usize,
}

/// An L-system definition: axiom, ordered rule table, optional prune.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LSystem {
    /// The starting string.
    pub axiom: String,
    /// Production rules, in match-priority order.
    rules: Vec<Rule>,
    /// Optional one-shot symbol removal.
    prune: Option<Prune>,
}

impl LSystem {
    /// Creates a new L-system with the given axiom and no rules.
    pub fn new(axiom: &str) -> Self {
        Self {
            axiom: axiom.to_string(),
            rules: Vec::new(),
            prune: None,
        }
    }

    /// Appends a production rule. Order is significant: the first matching
    /// rule wins.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Sets the prune applied during generation.
    pub fn with_prune(mut self, prune: Prune) -> Self {
        self.prune = Some(prune);
        self
    }

    /// Returns the rule table in match-priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the configured prune, if any.
    pub fn prune(&self) -> Option<Prune> {
        self.prune
    }

    /// Generates the L-system string after `iterations` rewrite passes.
    ///
    /// Zero iterations returns the axiom unchanged. Output length grows
    /// multiplicatively per pass; callers are responsible for keeping
    /// `iterations` small or using [`generate_bounded`](Self::generate_bounded).
    pub fn generate(&self, iterations: usize) -> String {
        let mut current = self.axiom.clone();
        for pass in 1..=iterations {
            current = self.rewrite_pass(&current, self.prune_symbol_for(pass));
        }
        current
    }

    /// Like [`generate`](Self::generate), but fails fast once a pass produces
    /// more than `max_symbols` symbols.
    pub fn generate_bounded(
        &self,
        iterations: usize,
        max_symbols: usize,
    ) -> Result<String, CapacityError> {
        let mut current = self.axiom.clone();
        for pass in 1..=iterations {
            current = self.rewrite_pass(&current, self.prune_symbol_for(pass));
            let len = current.chars().count();
            if len > max_symbols {
                return Err(CapacityError {
                    iteration: pass,
                    len,
                    max: max_symbols,
                });
            }
        }
        Ok(current)
    }

    /// Applies the rule table once to an arbitrary string, without pruning.
    ///
    /// `generate(k + 1)` equals `rewrite_once(&generate(k))` whenever no
    /// prune is scheduled at iteration `k + 1`.
    pub fn rewrite_once(&self, input: &str) -> String {
        self.rewrite_pass(input, None)
    }

    /// Estimates the output length after `iterations` passes, assuming each
    /// pass roughly doubles the string.
    pub fn estimate_len(&self, iterations: usize) -> usize {
        self.axiom
            .chars()
            .count()
            .saturating_mul(2usize.saturating_pow(iterations as u32))
    }

    fn prune_symbol_for(&self, pass: usize) -> Option<char> {
        self.prune
            .filter(|p| p.iteration == pass)
            .map(|p| p.symbol)
    }

    fn rewrite_pass(&self, input: &str, prune: Option<char>) -> String {
        let mut next = String::with_capacity(input.len() * 2);

        for c in input.chars() {
            // A pruned symbol vanishes: no replacement, no pass-through.
            if prune == Some(c) {
                continue;
            }

            match self.rules.iter().find(|r| r.predecessor == c) {
                Some(rule) => next.push_str(&rule.successor),
                None => next.push(c),
            }
        }

        next
    }
}

/// Preset L-systems for common plant shapes.
pub mod presets {
    use super::{LSystem, Rule};

    /// Simple branching tree.
    pub fn simple_tree() -> LSystem {
        LSystem::new("X")
            .with_rule(Rule::new('X', "F[+X][-X]FX"))
            .with_rule(Rule::new('F', "FF"))
    }

    /// Binary tree with alternating branches.
    pub fn binary_tree() -> LSystem {
        LSystem::new("X")
            .with_rule(Rule::new('X', "F[+X]F[-X]+X"))
            .with_rule(Rule::new('F', "FF"))
    }

    /// Classic fractal plant.
    pub fn fractal_plant() -> LSystem {
        LSystem::new("X")
            .with_rule(Rule::new('X', "F+[[X]-X]-F[-FX]+X"))
            .with_rule(Rule::new('F', "FF"))
    }

    /// Shrub carrying leaf (`L`) and flower (`O`) attachment symbols on its
    /// side branches.
    pub fn flowering_shrub() -> LSystem {
        LSystem::new("X")
            .with_rule(Rule::new('X', "F[+XL][-XO]FX"))
            .with_rule(Rule::new('F', "F!F"))
    }
}
