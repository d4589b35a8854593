//! CLI value enums.

use clap::ValueEnum;

/// What `export` writes to stdout
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormatArg {
    /// Graphviz DOT source
    #[default]
    Dot,
    /// Node and edge lists as JSON
    Json,
}

impl std::fmt::Display for ExportFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dot => write!(f, "dot"),
            Self::Json => write!(f, "json"),
        }
    }
}
