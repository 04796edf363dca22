//! `jstr` — validate a JSON document against a Schematron-style schema.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "jstr", version, about = "Validate a JSON document against a Schematron-style schema")]
struct Cli {
    /// Schematron schema file (JSON)
    #[arg(long)]
    schema: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("jstr: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> jstr::Result<bool> {
    let schema_text = fs::read_to_string(&cli.schema)?;
    let schema: serde_json::Value = serde_json::from_str(&schema_text)?;

    let mut data_text = String::new();
    io::stdin().read_to_string(&mut data_text)?;
    let data: serde_json::Value = serde_json::from_str(&data_text)?;

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    jstr::schematron::eval(&schema, &data, &mut lock)
}
