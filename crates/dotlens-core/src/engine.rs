//! Layout engine selection.
//!
//! The names match external configuration strings (snake_case), so both
//! enums deserialize directly from the `[layout]` table of a config file and
//! parse from command line flags.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Where layout runs.
///
/// # Variants
///
/// - `External` - Spawn a Graphviz command and read its xdot output (default)
/// - `Embedded` - Lay out in-process with the layered (Sugiyama) algorithm
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMethod {
    #[default]
    External,
    Embedded,
}

impl FromStr for LayoutMethod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" => Ok(Self::External),
            "embedded" => Ok(Self::Embedded),
            _ => Err("Unsupported layout method"),
        }
    }
}

impl From<LayoutMethod> for &'static str {
    fn from(val: LayoutMethod) -> Self {
        match val {
            LayoutMethod::External => "external",
            LayoutMethod::Embedded => "embedded",
        }
    }
}

impl fmt::Display for LayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Graphviz layout programs known by name.
///
/// `Auto` picks `dot` for directed graphs and `neato` otherwise.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    #[default]
    Auto,
    Dot,
    Neato,
    Twopi,
    Fdp,
    Circo,
}

impl LayoutAlgorithm {
    /// Resolves `Auto` against the graph kind.
    pub fn resolve(self, directed: bool) -> Self {
        match self {
            Self::Auto if directed => Self::Dot,
            Self::Auto => Self::Neato,
            other => other,
        }
    }

    /// The command line that produces xdot for this algorithm.
    pub fn command(self, directed: bool) -> String {
        let program: &'static str = self.resolve(directed).into();
        format!("{program} -Txdot")
    }
}

impl FromStr for LayoutAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "dot" => Ok(Self::Dot),
            "neato" => Ok(Self::Neato),
            "twopi" => Ok(Self::Twopi),
            "fdp" => Ok(Self::Fdp),
            "circo" => Ok(Self::Circo),
            _ => Err("Unsupported layout algorithm"),
        }
    }
}

impl From<LayoutAlgorithm> for &'static str {
    fn from(val: LayoutAlgorithm) -> Self {
        match val {
            LayoutAlgorithm::Auto => "auto",
            LayoutAlgorithm::Dot => "dot",
            LayoutAlgorithm::Neato => "neato",
            LayoutAlgorithm::Twopi => "twopi",
            LayoutAlgorithm::Fdp => "fdp",
            LayoutAlgorithm::Circo => "circo",
        }
    }
}

impl fmt::Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("embedded".parse(), Ok(LayoutMethod::Embedded));
        assert!("graphviz".parse::<LayoutMethod>().is_err());
        assert_eq!(LayoutMethod::default().to_string(), "external");
    }

    #[test]
    fn test_algorithm_command() {
        assert_eq!(LayoutAlgorithm::Auto.command(true), "dot -Txdot");
        assert_eq!(LayoutAlgorithm::Auto.command(false), "neato -Txdot");
        assert_eq!(LayoutAlgorithm::Circo.command(true), "circo -Txdot");
    }
}
