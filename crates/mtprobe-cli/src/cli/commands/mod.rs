//! CLI command handlers, one file per subcommand.

mod completions;
mod run;
mod servers;
mod variants;

pub use completions::run_completions;
pub use run::run_probe;
pub use servers::run_servers;
pub use variants::run_variants;
