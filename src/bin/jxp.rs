//! `jxp` — evaluate an XPath 1.0 expression against a JSON document.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use jstr::{Document, Env, Expression, Value};

#[derive(Parser)]
#[command(name = "jxp", version, about = "Evaluate an XPath 1.0 expression against a JSON document")]
struct Cli {
    /// XPath expression to evaluate
    #[arg(long)]
    xpath: String,

    /// JSON file to read the document from; reads stdin if omitted
    #[arg(long)]
    json: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jxp: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> jstr::Result<()> {
    let input = match &cli.json {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let json: serde_json::Value = serde_json::from_str(&input)?;
    let doc = Document::new(json);

    let expr = Expression::new(&cli.xpath)?;
    let env = Env::new(&doc, Value::single_node(doc.root_id()));
    let value = expr.eval(&env)?;

    println!("{}", render(&value, &doc));
    Ok(())
}

fn render(value: &Value, doc: &Document) -> String {
    match value {
        Value::Number(n) => jstr::value::format_number(*n),
        Value::Boolean(b) => b.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::NodeSet(ids) => {
            let items: Vec<String> = ids.iter().map(|id| doc.get_string(*id)).map(|s| format!("{s:?}")).collect();
            format!("[{}]", items.join(", "))
        }
    }
}
