//! Result data model.
//!
//! A [`Value`] is one database value as returned by the server. Exactly one
//! variant is populated. Containers nest arbitrarily, so consumers that walk a
//! value recursively must bound their own depth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error code the server reports for a successful execution.
pub const SUCCEEDED: i32 = 0;

/// The flavours of null a server can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullKind {
    /// Plain unset value.
    Null,
    NaN,
    BadData,
    BadType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub year: i16,
    pub month: i8,
    pub day: i8,
}

/// Calendar timestamp exactly as stored by the server (no timezone attached).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    pub year: i16,
    pub month: i8,
    pub day: i8,
    pub hour: i8,
    pub minute: i8,
    pub sec: i8,
    pub microsec: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub vid: Vec<u8>,
}

impl Vertex {
    pub fn new(vid: impl Into<Vec<u8>>) -> Self {
        Self { vid: vid.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: Vec<u8>,
    pub dst: Vec<u8>,
    /// Edge type name.
    pub name: String,
    pub ranking: i64,
}

/// One hop of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub dst: Vertex,
    pub ranking: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub src: Vertex,
    pub steps: Vec<Step>,
}

/// One database value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null(NullKind),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Raw string bytes; not guaranteed to be UTF-8.
    Str(Vec<u8>),
    Date(Date),
    DateTime(DateTime),
    Vertex(Vertex),
    Edge(Edge),
    Path(Path),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Set semantics are the server's business; duplicates are kept as sent.
    Set(Vec<Value>),
}

impl Value {
    pub fn str(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Str(bytes.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

/// One tabular result set. Every row is expected to have one value per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl DataSet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            column_names: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rows.push(Row {
            values: values.into_iter().collect(),
        });
        self
    }
}

/// The server's answer to one executed statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub error_code: i32,
    /// Server-side execution latency in microseconds.
    pub latency_in_us: i64,
    #[serde(default)]
    pub data: Vec<DataSet>,
    /// Namespace the session is bound to after this statement, if reported.
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl ExecutionResponse {
    pub fn is_succeeded(&self) -> bool {
        self.error_code == SUCCEEDED
    }
}
