use crate::api::error::GatewayError;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use serde_json::Value;

pub struct DisplayFormatter;

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_table(&self, headers: &[String], rows: &[Vec<String>]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));

        for row in rows {
            table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
        }

        table.to_string()
    }

    /// Renders a backend payload: arrays of objects as a table, anything else
    /// as pretty JSON. Columns follow the records in order; within one record
    /// the keys come out sorted.
    pub fn format_payload(&self, title: &str, payload: &Value) -> String {
        let mut output = vec![self.format_header(title)];

        match payload.as_array() {
            Some(items) if items.is_empty() => output.push("(no records)".dimmed().to_string()),
            Some(items) if items.iter().all(Value::is_object) => {
                let headers = collect_columns(items);
                let rows: Vec<Vec<String>> = items
                    .iter()
                    .map(|item| {
                        headers
                            .iter()
                            .map(|column| format_cell(item.get(column)))
                            .collect()
                    })
                    .collect();
                output.push(self.format_table(&headers, &rows));
                output.push(format!("{} record(s)", items.len()));
            }
            _ => output.push(serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())),
        }

        output.join("\n")
    }

    pub fn format_error(&self, err: &GatewayError) -> String {
        if err.is_cancelled() {
            return err.to_string().dimmed().to_string();
        }
        let detail = match err.status() {
            Some(status) => format!("HTTP {}: {}", status, err.payload()),
            None => err.to_string(),
        };
        format!("Error: {}", detail).red().to_string()
    }
}

fn collect_columns(items: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for object in items.iter().filter_map(Value::as_object) {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_sorted_per_record_then_appended() {
        let items = vec![
            json!({ "name": "Ada", "id": 1 }),
            json!({ "id": 2, "email": "b@example.com", "affiliation": "MDCAN" }),
        ];
        assert_eq!(collect_columns(&items), vec!["id", "name", "affiliation", "email"]);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(&json!(null))), "");
        assert_eq!(format_cell(Some(&json!("Ada"))), "Ada");
        assert_eq!(format_cell(Some(&json!(true))), "true");
    }

    #[test]
    fn test_format_payload_table_and_scalar() {
        colored::control::set_override(false);
        let display = DisplayFormatter::new();

        let table = display.format_payload(
            "Participants",
            &json!([{ "name": "Ada", "certificate_sent": false }]),
        );
        assert!(table.contains("Participants"));
        assert!(table.contains("Ada"));
        assert!(table.contains("1 record(s)"));

        let stats = display.format_payload("Stats", &json!({ "total": 12 }));
        assert!(stats.contains("\"total\": 12"));

        let empty = display.format_payload("Programs", &json!([]));
        assert!(empty.contains("(no records)"));
    }

    #[test]
    fn test_format_error() {
        colored::control::set_override(false);
        let display = DisplayFormatter::new();

        let http = GatewayError::Http {
            status: 404,
            body: json!({ "error": "not found" }),
        };
        assert_eq!(display.format_error(&http), r#"Error: HTTP 404: {"error":"not found"}"#);

        let cancelled = GatewayError::Cancelled("superseded".to_string());
        assert_eq!(display.format_error(&cancelled), "Request cancelled: superseded");
    }
}
