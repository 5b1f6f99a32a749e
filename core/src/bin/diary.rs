//! diary binary - classify a project's files and keep the project map current.

use clap::Parser;
use diary::cli::{run, Cli, OutputFormat};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli) {
        if format == OutputFormat::Json {
            let body = serde_json::json!({ "error": e, "recoverable": e.is_recoverable() });
            println!("{body}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
