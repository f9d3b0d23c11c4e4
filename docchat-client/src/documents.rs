//! Document endpoints: listing, upload, text-to-document, deletion, preview URL.

use docchat_types::{ApiError, CreateDocumentFromText, Document};

use crate::client::DocChat;
use crate::error::map_reqwest_error;

const LIST_FAILED: &str = "Failed to list documents";
const UPLOAD_FAILED: &str = "Upload failed";
const CREATE_FAILED: &str = "Failed to create document";
const DELETE_FAILED: &str = "Failed to delete document";

/// Content type the backend accepts for a filename, by extension.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

impl DocChat {
    /// List every uploaded document, newest first.
    pub async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        let url = self.api_url("/documents");
        tracing::debug!(url = %url, "listing documents");
        self.send_json(self.client.get(&url), LIST_FAILED).await
    }

    /// Upload a PDF or DOCX file for indexing.
    pub async fn upload_document(
        &self,
        filename: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<Document, ApiError> {
        let filename = filename.into();
        let bytes = bytes.into();
        let url = self.api_url("/documents");
        tracing::debug!(url = %url, filename = %filename, size = bytes.len(), "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str(content_type_for(&filename))
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        self.send_json(self.client.post(&url).multipart(form), UPLOAD_FAILED)
            .await
    }

    /// Render text (for example, a drafted answer) into a new document.
    pub async fn create_document_from_text(
        &self,
        content: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<Document, ApiError> {
        let url = self.api_url("/documents/from-text");
        let body = CreateDocumentFromText {
            content: content.into(),
            filename: filename.into(),
        };
        tracing::debug!(url = %url, filename = %body.filename, "creating document from text");
        self.send_json(self.client.post(&url).json(&body), CREATE_FAILED)
            .await
    }

    /// Delete a document and its indexed excerpts.
    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let url = self.api_url(&format!("/documents/{id}"));
        tracing::debug!(url = %url, "deleting document");
        self.send_checked(self.client.delete(&url), DELETE_FAILED)
            .await
            .map(drop)
    }

    /// URL serving the original file, for inline previews.
    #[must_use]
    pub fn document_file_url(&self, id: &str) -> String {
        self.api_url(&format!("/documents/{id}/file"))
    }
}
