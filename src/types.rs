// src/types.rs

use std::fmt;
use std::str::FromStr;

/// How a single command line is started and whether its pid is remembered.
///
/// - `OneOff` (`$`): stdio inherited, pid never recorded.
/// - `Sustained` (`%`): detached background process with stdio discarded.
/// - `WrappedInteractive` (`@`): detached, stdio inherited, and on Windows
///   kept inside a persistent `cmd /k` shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPolicy {
    OneOff,
    Sustained,
    WrappedInteractive,
}

impl ExecutionPolicy {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '$' => Some(ExecutionPolicy::OneOff),
            '%' => Some(ExecutionPolicy::Sustained),
            '@' => Some(ExecutionPolicy::WrappedInteractive),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            ExecutionPolicy::OneOff => '$',
            ExecutionPolicy::Sustained => '%',
            ExecutionPolicy::WrappedInteractive => '@',
        }
    }

    /// Whether the launched pid is persisted in the registry.
    pub fn is_tracked(self) -> bool {
        !matches!(self, ExecutionPolicy::OneOff)
    }
}

impl fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionPolicy::OneOff => "one-off",
            ExecutionPolicy::Sustained => "sustained",
            ExecutionPolicy::WrappedInteractive => "wrapped-interactive",
        };
        f.write_str(name)
    }
}

/// Which blocks an operation applies to: one by name, or `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Block(String),
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("block name must not be empty".to_string());
        }
        if s == "all" {
            Ok(Selector::All)
        } else {
            Ok(Selector::Block(s.to_string()))
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str("all"),
            Selector::Block(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_off_is_untracked() {
        assert!(!ExecutionPolicy::OneOff.is_tracked());
        assert!(ExecutionPolicy::Sustained.is_tracked());
        assert!(ExecutionPolicy::WrappedInteractive.is_tracked());
    }

    #[test]
    fn symbols_map_both_ways() {
        for symbol in ['$', '%', '@'] {
            let policy = ExecutionPolicy::from_symbol(symbol).unwrap();
            assert_eq!(policy.symbol(), symbol);
        }
        assert_eq!(ExecutionPolicy::from_symbol('#'), None);
    }

    #[test]
    fn selector_parses_all_keyword() {
        assert_eq!("all".parse::<Selector>().unwrap(), Selector::All);
        assert_eq!(
            " dev ".parse::<Selector>().unwrap(),
            Selector::Block("dev".to_string())
        );
        assert!("".parse::<Selector>().is_err());
    }
}
