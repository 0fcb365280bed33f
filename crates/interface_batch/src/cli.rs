//! Command line arguments of the `underwrite` binary

use std::path::PathBuf;

use clap::Parser;

/// Stdin marker accepted in place of an input path
pub const STDIN: &str = "-";

/// Evaluate a JSON array of insurance applications
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "underwrite")]
#[command(about = "Evaluate a JSON array of insurance applications")]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input file, or `-` to read from stdin
    pub input: String,
}

impl Cli {
    /// True when applications are read from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input == STDIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_only() {
        let cli = Cli::try_parse_from(["underwrite", "applications.json"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.input, "applications.json");
        assert!(!cli.reads_stdin());
    }

    #[test]
    fn test_config_and_stdin() {
        let cli = Cli::try_parse_from(["underwrite", "-c", "underwriting.toml", "-"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("underwriting.toml")));
        assert!(cli.reads_stdin());

        let cli = Cli::try_parse_from(["underwrite", "--config", "u.json", "in.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("u.json")));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["underwrite"]).is_err());
        assert!(Cli::try_parse_from(["underwrite", "a.json", "b.json"]).is_err());
    }
}
