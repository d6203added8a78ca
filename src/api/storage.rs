//! Purpose: Object storage calls against `storage/v1`.
//! Exports: `StorageObject` and `RestClient` storage methods.
//! Role: Storage service; listing reads element slices with the legacy accessors.
//! Invariants: Object paths are split on `/` so each segment is percent-encoded on its own.
#![allow(clippy::result_large_err)]

use super::remote::{ApiResult, Payload, RestClient};
use crate::core::encode::encode_map;
use crate::core::error::{Error, ErrorKind};
use crate::core::legacy::{extract_array_elements, extract_property};
use crate::core::value::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageObject {
    pub name: String,
    pub id: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub updated_at: Option<String>,
}

impl StorageObject {
    /// Reads one raw listing element. Folder placeholders have a `null` id and
    /// no metadata.
    pub fn from_element(element: &str) -> Option<Self> {
        let name = extract_property(element, "name")?;
        Some(Self {
            name,
            id: extract_property(element, "id").filter(|id| id != "null"),
            size: extract_property(element, "size").and_then(|raw| raw.parse().ok()),
            content_type: extract_property(element, "mimetype").filter(|mime| mime != "null"),
            updated_at: extract_property(element, "updated_at").filter(|at| at != "null"),
        })
    }
}

impl RestClient {
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        limit: u64,
    ) -> ApiResult<Vec<StorageObject>> {
        ensure_segment("bucket", bucket)?;
        let url = self.endpoint(&["storage", "v1", "object", "list", bucket])?;
        let sort = Map::new().with("column", "name").with("order", "asc");
        let body = encode_map(
            &Map::new()
                .with("prefix", prefix)
                .with("limit", limit)
                .with("offset", 0u64)
                .with("sortBy", sort),
        )?;
        let text = self.call_text("POST", &url, &[], Payload::Json(body))?;
        Ok(extract_array_elements(&text)
            .iter()
            .filter_map(|element| StorageObject::from_element(element))
            .collect())
    }

    /// Returns the stored key (`<bucket>/<path>`).
    pub fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
        upsert: bool,
    ) -> ApiResult<String> {
        let url = self.object_url(bucket, path)?;
        let upsert = if upsert { "true" } else { "false" };
        let text = self.call_text(
            "POST",
            &url,
            &[("x-upsert", upsert)],
            Payload::Bytes { data, content_type },
        )?;
        Ok(extract_property(&text, "Key").unwrap_or_else(|| format!("{bucket}/{path}")))
    }

    pub fn download_object(&self, bucket: &str, path: &str) -> ApiResult<Vec<u8>> {
        let url = self.object_url(bucket, path)?;
        self.call_bytes("GET", &url)
    }

    pub fn remove_objects(&self, bucket: &str, paths: &[&str]) -> ApiResult<()> {
        ensure_segment("bucket", bucket)?;
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.endpoint(&["storage", "v1", "object", bucket])?;
        let prefixes: Vec<Value> = paths.iter().map(|path| Value::from(*path)).collect();
        let body = encode_map(&Map::new().with("prefixes", prefixes))?;
        self.call_text("DELETE", &url, &[], Payload::Json(body))?;
        Ok(())
    }

    fn object_url(&self, bucket: &str, path: &str) -> ApiResult<url::Url> {
        ensure_segment("bucket", bucket)?;
        let parts = object_path_segments(path)?;
        let mut segments = vec!["storage", "v1", "object", bucket];
        segments.extend(parts);
        self.endpoint(&segments)
    }
}

fn ensure_segment(what: &str, value: &str) -> ApiResult<()> {
    if value.is_empty() || value.contains('/') {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("invalid {what} `{value}`")));
    }
    Ok(())
}

fn object_path_segments(path: &str) -> ApiResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|part| matches!(*part, "." | "..")) {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("invalid object path `{path}`")));
    }
    Ok(segments)
}
