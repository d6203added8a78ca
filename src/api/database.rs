//! Purpose: Table CRUD over the REST dialect (`rest/v1/<table>`).
//! Exports: `RestClient::{table_url, select, insert, update, delete}` (inherent methods).
//! Role: Database service built on `QuerySpec` + the codec.
//! Invariants: Update and delete require at least one filter.
//! Invariants: Rows are returned only when the backend echoes them (reads or `return=representation`).
#![allow(clippy::result_large_err)]

use url::Url;

use super::remote::{ApiResult, Payload, RestClient};
use crate::core::encode::{encode, encode_map};
use crate::core::error::{Error, ErrorKind};
use crate::core::query::{QueryParams, QuerySpec};
use crate::core::value::{Map, Value};

const REST_PREFIX: [&str; 2] = ["rest", "v1"];
const RETURN_MINIMAL: &str = "return=minimal";

impl RestClient {
    /// Request URL for `table` with the query applied; `prefer` stays out of it.
    pub fn table_url(&self, table: &str, query: &QuerySpec) -> ApiResult<Url> {
        self.endpoint_with_query(&table_path(table)?, &query.build())
    }

    pub fn select(&self, table: &str, query: &QuerySpec) -> ApiResult<Vec<Value>> {
        let url = self.table_url(table, query)?;
        let headers = self.read_headers();
        let body = self.call_value("GET", &url, &headers, Payload::Empty)?;
        rows_from(body, table)
    }

    pub fn insert(
        &self,
        table: &str,
        rows: &[Map],
        return_representation: bool,
    ) -> ApiResult<Vec<Value>> {
        let payload = match rows {
            [] => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("insert into {table} needs at least one row")));
            }
            [row] => encode_map(row)?,
            many => {
                let items = many.iter().cloned().map(Value::Object).collect();
                encode(&Value::Array(items))?
            }
        };
        let params = QuerySpec::new()
            .return_representation(return_representation)
            .build();
        self.write("POST", table, &params, Payload::Json(payload))
    }

    pub fn update(&self, table: &str, query: &QuerySpec, changes: &Map) -> ApiResult<Vec<Value>> {
        require_filters("update", table, query)?;
        let payload = encode_map(changes)?;
        self.write("PATCH", table, &query.build(), Payload::Json(payload))
    }

    pub fn delete(&self, table: &str, query: &QuerySpec) -> ApiResult<Vec<Value>> {
        require_filters("delete", table, query)?;
        self.write("DELETE", table, &query.build(), Payload::Empty)
    }

    fn write(
        &self,
        method: &str,
        table: &str,
        params: &QueryParams,
        payload: Payload<'_>,
    ) -> ApiResult<Vec<Value>> {
        let url = self.endpoint_with_query(&table_path(table)?, params)?;
        let mut headers = vec![("Prefer", params.prefer().unwrap_or(RETURN_MINIMAL))];
        if let Some(schema) = self.config().schema() {
            headers.push(("Content-Profile", schema));
        }
        let body = self.call_value(method, &url, &headers, payload)?;
        rows_from(body, table)
    }

    fn read_headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Accept", "application/json")];
        if let Some(schema) = self.config().schema() {
            headers.push(("Accept-Profile", schema));
        }
        headers
    }
}

fn table_path(table: &str) -> ApiResult<[&str; 3]> {
    if table.is_empty() || table.contains('/') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid table name `{table}`")));
    }
    Ok([REST_PREFIX[0], REST_PREFIX[1], table])
}

fn require_filters(operation: &str, table: &str, query: &QuerySpec) -> ApiResult<()> {
    if query.has_filters() {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!("{operation} on {table} requires at least one filter"))
        .with_hint("Add a filter such as `id=eq.<value>`; unfiltered writes touch every row."))
}

fn rows_from(body: Value, table: &str) -> ApiResult<Vec<Value>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => Ok(rows),
        Value::Object(row) => Ok(vec![Value::Object(row)]),
        other => Err(Error::new(ErrorKind::Decode).with_message(format!(
            "expected rows from {table}, got {}",
            other.type_name()
        ))),
    }
}
