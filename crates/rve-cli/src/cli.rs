use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rve")]
#[command(author, version, about = "Periodic boundary conditions and homogenization for RVE test cases")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load test cases and run their parameter checks
    Check {
        /// Test case JSON files
        #[arg(required = true)]
        cases: Vec<PathBuf>,
    },

    /// Print the deformation tensor of every load case
    Tensors {
        /// Test case JSON file
        case: PathBuf,

        /// Node deck; defaults to the node file named by the test case
        #[arg(long)]
        mesh: Option<PathBuf>,

        /// Print the tensors as a JSON array (null marks a free component)
        #[arg(long)]
        json: bool,
    },

    /// Write periodic constraint equations and load-case steps for CalculiX
    Deck {
        /// Test case JSON file
        case: PathBuf,

        /// Node deck; defaults to the node file named by the test case
        #[arg(long)]
        mesh: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Homogenize captured retained-node results and save the report
    Homogenize {
        /// Test case JSON file
        case: PathBuf,

        /// Captured results JSON file
        #[arg(long)]
        results: PathBuf,

        /// Also write full results and debug tensors as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_verbosity_after_subcommand() {
        let cli = Cli::parse_from(["rve", "deck", "case.json", "--mesh", "mesh.inp", "-vv"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Deck { case, mesh, output } => {
                assert_eq!(case, PathBuf::from("case.json"));
                assert_eq!(mesh, Some(PathBuf::from("mesh.inp")));
                assert!(output.is_none());
            }
            _ => panic!("expected deck command"),
        }
    }

    #[test]
    fn tensors_json_flag_defaults_off() {
        let cli = Cli::parse_from(["rve", "tensors", "case.json"]);
        assert!(matches!(cli.command, Commands::Tensors { json: false, .. }));
        let cli = Cli::parse_from(["rve", "tensors", "case.json", "--json"]);
        assert!(matches!(cli.command, Commands::Tensors { json: true, .. }));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["rve", "-q", "-v", "check", "a.json"]).is_err());
    }
}
