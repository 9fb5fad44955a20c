//! File attachments over the connect/files REST surface.
//!
//! Uploads go out as two-part multipart requests (a `json` metadata
//! part plus the `fileData` binary part). These calls do not use the
//! per-call reconnect loop; they refresh the session preemptively via
//! [`Connection::ensure_fresh`] instead.

use std::path::Path;

use serde_json::{json, Value};

use sfb_core::payload::FieldValues;

use crate::client::{
    send, ApiBody, Connection, Method, MultipartPayload, ObjectClient, Session,
};
use crate::error::{Error, Result};

const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded file as the remote side sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// ContentDocument id.
    pub id: String,
    /// Relative download URL of the current version, when reported.
    pub download_url: Option<String>,
}

/// File upload/linking operations over a [`Connection`].
pub struct FilesClient<'a> {
    conn: &'a Connection,
}

impl<'a> FilesClient<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        FilesClient { conn }
    }

    fn files_base(&self, session: &Session) -> String {
        format!("{}/connect/files", self.conn.api_base(session))
    }

    /// Upload a file from disk. The title defaults to the file stem.
    /// Offline mode is a no-op returning `None`.
    pub fn upload_file(
        &self,
        path: &Path,
        title: Option<&str>,
        existing_id: Option<&str>,
    ) -> Result<Option<FileHandle>> {
        if self.conn.is_offline() {
            return Ok(None);
        }
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Upload(format!("unusable file name: {}", path.display())))?;
        let stem = path.file_stem().and_then(|n| n.to_str()).unwrap_or(file_name);
        self.upload_file_obj(title.unwrap_or(stem), file_name, data, existing_id)
    }

    /// Upload in-memory file content, creating a new file or a new
    /// version of `existing_id`. An existing id that no longer resolves
    /// remotely falls back to a fresh upload.
    pub fn upload_file_obj(
        &self,
        title: &str,
        file_name: &str,
        data: Vec<u8>,
        existing_id: Option<&str>,
    ) -> Result<Option<FileHandle>> {
        if self.conn.is_offline() {
            return Ok(None);
        }
        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string());

        let target = match existing_id {
            Some(id) if self.file_exists(id)? => Some(id),
            _ => None,
        };
        match target {
            Some(id) => self.update_file(id, title, file_name, &mime_type, data).map(Some),
            None => self.attach_new_file(title, file_name, &mime_type, data).map(Some),
        }
    }

    /// Whether a previously stored file id still resolves remotely.
    fn file_exists(&self, file_id: &str) -> Result<bool> {
        let session = self.conn.ensure_fresh()?;
        let url = format!("{}/{}", self.files_base(&session), file_id);
        match send(self.conn, &session, Method::Get, url, ApiBody::None) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// First upload of a file, owned by the API user.
    pub fn attach_new_file(
        &self,
        title: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<FileHandle> {
        let session = self.conn.ensure_fresh()?;
        let url = format!("{}/users/me", self.files_base(&session));
        self.post_multipart(&session, url, title, file_name, mime_type, data)
    }

    /// Upload a new version of an existing file.
    pub fn update_file(
        &self,
        file_id: &str,
        title: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<FileHandle> {
        let session = self.conn.ensure_fresh()?;
        let url = format!("{}/{}", self.files_base(&session), file_id);
        self.post_multipart(&session, url, title, file_name, mime_type, data)
    }

    fn post_multipart(
        &self,
        session: &Session,
        url: String,
        title: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<FileHandle> {
        tracing::debug!(title, file_name, mime_type, size = data.len(), "uploading file");
        let body = ApiBody::Multipart(MultipartPayload {
            meta: json!({"title": title}),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data,
        });
        let response = send(self.conn, session, Method::Post, url, body).map_err(|e| {
            tracing::error!(title, error = %e, "file upload failed");
            e
        })?;
        let body = response.json().map_err(Error::from)?;
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Upload(format!("upload response missing `id` for `{}`", title)))?;
        Ok(FileHandle {
            id: id.to_string(),
            download_url: body
                .get("downloadUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Share a file to a record, visible to all viewers of the record.
    /// Linking twice is a no-op.
    pub fn link_to_record(&self, file_id: &str, record_id: &str) -> Result<()> {
        if self.conn.is_offline() {
            return Ok(());
        }
        let links = ObjectClient::new(self.conn, "ContentDocumentLink");
        let soql = format!(
            "SELECT Id FROM ContentDocumentLink WHERE ContentDocumentId = '{}' AND LinkedEntityId = '{}'",
            file_id, record_id
        );
        if !links.query(&soql)?.records.is_empty() {
            return Ok(());
        }
        let mut fields = FieldValues::new();
        fields.insert("ContentDocumentId".to_string(), Value::String(file_id.to_string()));
        fields.insert("LinkedEntityId".to_string(), Value::String(record_id.to_string()));
        fields.insert("ShareType".to_string(), Value::String("V".to_string()));
        links.create(&fields)?;
        Ok(())
    }

    /// Find a file already attached to a record by its title.
    pub fn find_attach_file_by_title(
        &self,
        record_id: &str,
        title: &str,
    ) -> Result<Option<String>> {
        if self.conn.is_offline() {
            return Ok(None);
        }
        let links = ObjectClient::new(self.conn, "ContentDocumentLink");
        let soql = format!(
            "SELECT ContentDocumentId, ContentDocument.Title FROM ContentDocumentLink WHERE LinkedEntityId = '{}'",
            record_id
        );
        for row in links.query_all(&soql)?.records {
            let row_title = row
                .get("ContentDocument")
                .and_then(|d| d.get("Title"))
                .and_then(Value::as_str);
            if row_title == Some(title) {
                return Ok(row
                    .get("ContentDocumentId")
                    .and_then(Value::as_str)
                    .map(str::to_string));
            }
        }
        Ok(None)
    }

    /// The download URL of a file's newest version.
    pub fn first_file_link(&self, file_id: &str) -> Result<Option<String>> {
        if self.conn.is_offline() {
            return Ok(None);
        }
        let session = self.conn.ensure_fresh()?;
        let url = format!("{}/{}", self.files_base(&session), file_id);
        let response = match send(self.conn, &session, Method::Get, url, ApiBody::None) {
            Ok(r) => r,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let body = response.json().map_err(Error::from)?;
        Ok(body
            .get("downloadUrl")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Fetch a (relative) download URL to a local file.
    pub fn download_to_path(&self, download_url: &str, path: &Path) -> Result<()> {
        if self.conn.is_offline() {
            return Ok(());
        }
        let session = self.conn.ensure_fresh()?;
        let url = if download_url.starts_with("http") {
            download_url.to_string()
        } else {
            format!("{}{}", session.instance_url, download_url)
        };
        let response = send(self.conn, &session, Method::Get, url, ApiBody::None)?;
        std::fs::write(path, response.body)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
