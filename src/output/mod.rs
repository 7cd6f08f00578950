//! Output formatters for reports, mutant lists and type tables.
//!
//! Every formatter works on the `serde_json::Value` form of the data, so
//! any serializable result renders in all three formats. Arrays of
//! records become tables; nested records inside a row are flattened into
//! dotted columns (`location.start.line`).

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::OutputFormat;
use crate::core::Result;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Markdown,
    Text,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Markdown => Format::Markdown,
            OutputFormat::Text => Format::Text,
        }
    }
}

impl Format {
    pub fn format_value<W: Write>(&self, value: &Value, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)?;
                writeln!(writer)?;
            }
            Format::Markdown => write_markdown(value, writer, 1)?,
            Format::Text => write_text(value, writer, 0)?,
        }
        Ok(())
    }

    pub fn format<T: Serialize, W: Write>(&self, data: &T, writer: &mut W) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.format_value(&value, writer)
    }
}

fn write_markdown<W: Write>(value: &Value, writer: &mut W, level: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            // Scalars first so a record reads as a header block.
            for (key, val) in map.iter().filter(|(_, v)| !is_nested(v)) {
                writeln!(writer, "**{}**: {}\n", title(key), scalar(key, val, false))?;
            }
            for (key, val) in map.iter().filter(|(_, v)| is_nested(v)) {
                writeln!(writer, "{} {}\n", "#".repeat(level.min(6)), title(key))?;
                write_markdown(val, writer, level + 1)?;
            }
        }
        Value::Array(items) if items.is_empty() => writeln!(writer, "_No items_\n")?,
        Value::Array(items) => match rows(items) {
            Some((headers, rows)) => write_table(&headers, &rows, writer)?,
            None => {
                for item in items {
                    write_markdown(item, writer, level)?;
                }
            }
        },
        other => writeln!(writer, "{}\n", scalar("", other, false))?,
    }
    Ok(())
}

fn write_table<W: Write>(headers: &[String], rows: &[Map<String, Value>], writer: &mut W) -> Result<()> {
    let header_line: Vec<_> = headers.iter().map(|h| title(h)).collect();
    writeln!(writer, "| {} |", header_line.join(" | "))?;
    writeln!(writer, "|{}", " --- |".repeat(headers.len()))?;
    for row in rows {
        let cells: Vec<_> = headers
            .iter()
            .map(|h| {
                let cell = scalar(h, row.get(h).unwrap_or(&Value::Null), false);
                cell.replace('|', "\\|").replace('\n', " ")
            })
            .collect();
        writeln!(writer, "| {} |", cells.join(" | "))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_text<W: Write>(value: &Value, writer: &mut W, indent: usize) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if is_nested(val) {
                    writeln!(writer, "{pad}{}:", title(key))?;
                    write_text(val, writer, indent + 1)?;
                } else {
                    writeln!(writer, "{pad}{}: {}", title(key), scalar(key, val, true))?;
                }
            }
        }
        Value::Array(items) => match rows(items) {
            Some((headers, rows)) => {
                for row in rows {
                    let line: Vec<_> = headers
                        .iter()
                        .filter_map(|h| {
                            let val = row.get(h)?;
                            (!val.is_null()).then(|| format!("{h}={}", scalar(h, val, true)))
                        })
                        .collect();
                    writeln!(writer, "{pad}- {}", line.join(" "))?;
                }
            }
            None => {
                for (i, item) in items.iter().enumerate() {
                    writeln!(writer, "{pad}[{i}]")?;
                    write_text(item, writer, indent + 1)?;
                }
            }
        },
        other => writeln!(writer, "{pad}{}", scalar("", other, true))?,
    }
    Ok(())
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Flatten an array of records into table rows, or `None` if any item is
/// not a record or holds an array.
fn rows(items: &[Value]) -> Option<(Vec<String>, Vec<Map<String, Value>>)> {
    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(map) = item else {
            return None;
        };
        let mut row = Map::new();
        flatten("", map, &mut row)?;
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        rows.push(row);
    }
    (!rows.is_empty()).then_some((headers, rows))
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Map<String, Value>) -> Option<()> {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out)?,
            Value::Array(_) => return None,
            _ => {
                out.insert(name, val.clone());
            }
        }
    }
    Some(())
}

fn title(key: &str) -> String {
    key.split(['_', '.'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn scalar(key: &str, value: &Value, colorize: bool) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{f:.2}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    };
    if colorize && key == "status" {
        status_color(&text)
    } else {
        text
    }
}

fn status_color(status: &str) -> String {
    match status {
        "killed" => status.green().to_string(),
        "survived" => status.red().bold().to_string(),
        "compile_error" => status.yellow().to_string(),
        "runtime_error" => status.magenta().to_string(),
        _ => status.dimmed().to_string(),
    }
}
