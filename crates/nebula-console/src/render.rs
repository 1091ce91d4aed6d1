//! Text rendering for query results.
//!
//! Values are rendered with an explicit depth budget: once it runs out the
//! remaining subtree is replaced by `...`. Tables are rendered as fixed-width
//! ASCII grids followed by a row/column summary.
//!
//! Container output keeps the historical console format, including the comma
//! after the last element (`[1,2,3,]`), and map keys are always quoted.

use std::time::Duration;

use nebula_console_client::{DataSet, ExecutionResponse, NullKind, Value};

/// Depth budget used for every table cell.
pub const MAX_RENDER_DEPTH: usize = 256;

/// Indent between a column delimiter and the cell content.
const ALIGN: usize = 2;
const HEADER_CHAR: char = '=';
const ROW_CHAR: char = '-';
const COL_DELIMITER: char = '|';
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one value.
pub fn render(value: &Value, depth: usize) -> String {
    if depth == 0 {
        return "...".to_string();
    }

    match value {
        Value::Null(kind) => null_token(*kind).to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(bytes) => format!("\"{}\"", String::from_utf8_lossy(bytes)),
        Value::Date(d) => format!("{}-{}-{}", d.year, d.month, d.day),
        Value::DateTime(t) => format!(
            "{}-{}-{} {}:{}:{}:{}",
            t.year, t.month, t.day, t.hour, t.minute, t.sec, t.microsec
        ),
        Value::Vertex(v) => String::from_utf8_lossy(&v.vid).into_owned(),
        Value::Edge(e) => format!(
            "{}-[{}]->{}@{}",
            String::from_utf8_lossy(&e.src),
            e.name,
            String::from_utf8_lossy(&e.dst),
            e.ranking
        ),
        Value::Path(p) => {
            let mut out = String::from_utf8_lossy(&p.src.vid).into_owned();
            for step in &p.steps {
                out.push_str(&format!(
                    "-[{}]->{}@{}",
                    step.name,
                    String::from_utf8_lossy(&step.dst.vid),
                    step.ranking
                ));
            }
            out
        }
        Value::List(items) => render_sequence('[', ']', items, depth),
        Value::Set(items) => render_sequence('{', '}', items, depth),
        Value::Map(kvs) => {
            let mut out = String::from("{");
            for (k, v) in kvs {
                out.push('"');
                out.push_str(k);
                out.push_str("\":");
                out.push_str(&render(v, depth - 1));
                out.push(',');
            }
            out.push('}');
            out
        }
    }
}

fn null_token(kind: NullKind) -> &'static str {
    match kind {
        NullKind::Null => "NULL",
        NullKind::NaN => "NaN",
        NullKind::BadData => "BAD_DATA",
        NullKind::BadType => "BAD_TYPE",
    }
}

fn render_sequence(open: char, close: char, items: &[Value], depth: usize) -> String {
    let mut out = String::new();
    out.push(open);
    for item in items {
        out.push_str(&render(item, depth - 1));
        out.push(',');
    }
    out.push(close);
    out
}

/// Shortest round-trip float formatting in `%g` style.
///
/// Plain decimal notation is used while the decimal exponent is within
/// `[-4, 6)`; outside that range the mantissa is printed with an explicit
/// sign and at least two exponent digits (`1e+06`, `2.5e-07`).
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let sci = format!("{f:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return f.to_string();
    };
    let exp: i32 = match exp.parse() {
        Ok(exp) => exp,
        Err(_) => return f.to_string(),
    };

    if (-4..6).contains(&exp) {
        f.to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

/// Render one data set as a grid.
pub fn render_table(table: &DataSet) -> String {
    let columns = table.column_names.len();
    let mut widths: Vec<usize> = table
        .column_names
        .iter()
        .map(|name| name.chars().count())
        .collect();

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| {
                    row.values
                        .get(i)
                        .map(|v| render(v, MAX_RENDER_DEPTH))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    //          values            + two indents         + '|' per column + closing '|'
    let total = widths.iter().sum::<usize>() + columns * ALIGN * 2 + columns + 1;
    let header_line: String = std::iter::repeat(HEADER_CHAR).take(total).collect();
    let row_line: String = std::iter::repeat(ROW_CHAR).take(total).collect();

    let mut out = String::new();
    out.push_str(&header_line);
    out.push('\n');
    push_row(&mut out, &table.column_names, &widths);
    out.push_str(&header_line);
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
        out.push_str(&row_line);
        out.push('\n');
    }
    out.push_str(&format!(
        "Got {} rows, {} columns.\n",
        table.rows.len(),
        columns
    ));
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    for (cell, width) in cells.iter().zip(widths) {
        out.push(COL_DELIMITER);
        out.push_str(&" ".repeat(ALIGN));
        out.push_str(cell);
        let len = cell.chars().count();
        if len < width + ALIGN {
            out.push_str(&" ".repeat(width + ALIGN - len));
        }
    }
    out.push(COL_DELIMITER);
    out.push('\n');
}

/// Everything printed for one executed statement.
///
/// A failed statement prints its error annotation. A successful one prints
/// its tables and the server/round-trip latency pair. Both end with a local
/// timestamp.
pub fn render_response(resp: &ExecutionResponse, elapsed: Duration) -> String {
    let mut out = String::new();
    if resp.is_succeeded() {
        for table in &resp.data {
            out.push_str(&render_table(table));
        }
        out.push_str(&format!(
            "time spent {}/{} us\n",
            resp.latency_in_us,
            elapsed.as_micros()
        ));
    } else {
        match resp.error_msg.as_deref().filter(|m| !m.is_empty()) {
            Some(msg) => out.push_str(&format!("[ERROR ({})]: {msg}\n", resp.error_code)),
            None => out.push_str(&format!("[ERROR ({})]\n", resp.error_code)),
        }
    }
    out.push_str(&chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());
    out.push('\n');
    out
}
