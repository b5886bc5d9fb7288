use crate::cli::OutputFormat;
use colored::Colorize;
use serde_json::Value;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => print_error(&format!("Failed to render output: {e}")),
        },
        OutputFormat::Text => print_fields(value, 0),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_fields(value: &Value, indent: usize) {
    let prefix = " ".repeat(indent);
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                if val.is_object() {
                    println!("{prefix}{}:", key.cyan());
                    print_fields(val, indent + 2);
                } else {
                    println!("{prefix}{}: {}", key.cyan(), scalar(val));
                }
            }
        }
        other => println!("{prefix}{}", scalar(other)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
