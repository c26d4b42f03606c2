// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dataset catalogue endpoints.

use bytes::Bytes;
use datalens_core::dataset::{
    Dataset, DatasetListQuery, DatasetSearchQuery, DatasetSheet, DatasetUpdate, DatasetVersion,
    Page, SearchSuggestion, SheetPreview,
};
use datalens_core::DatalensError;
use reqwest::multipart::{Form, Part};

use crate::client::ApiClient;
use crate::request::ApiRequest;

/// A file to upload as a new dataset.
#[derive(Debug, Clone)]
pub struct DatasetUpload {
    pub file_name: String,
    pub content: Bytes,
    /// MIME type of `content`; `application/octet-stream` when unset.
    pub content_type: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl DatasetUpload {
    fn into_form(self) -> Result<Form, DatalensError> {
        if self.name.trim().is_empty() {
            return Err(DatalensError::invalid("dataset name must not be empty"));
        }
        if self.content.is_empty() {
            return Err(DatalensError::invalid(format!("`{}` is empty", self.file_name)));
        }

        let mime = self
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let file = Part::bytes(self.content.to_vec())
            .file_name(self.file_name)
            .mime_str(mime)
            .map_err(|e| DatalensError::invalid(format!("invalid content type `{mime}`: {e}")))?;

        let mut form = Form::new().part("file", file).text("name", self.name);
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if !self.tags.is_empty() {
            form = form.text("tags", self.tags.join(","));
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DatasetsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DatasetsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &DatasetListQuery) -> Result<Vec<Dataset>, DatalensError> {
        let request = ApiRequest::get("/datasets").query_from(query)?;
        self.client.request_json(request).await
    }

    pub async fn get(&self, dataset_id: i64) -> Result<Dataset, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!("/datasets/{dataset_id}")))
            .await
    }

    pub async fn update(
        &self,
        dataset_id: i64,
        update: &DatasetUpdate,
    ) -> Result<Dataset, DatalensError> {
        if update.is_empty() {
            return Err(DatalensError::invalid("nothing to update"));
        }
        let request = ApiRequest::patch(format!("/datasets/{dataset_id}")).json(update)?;
        self.client.request_json(request).await
    }

    pub async fn upload(&self, upload: DatasetUpload) -> Result<Dataset, DatalensError> {
        let request = ApiRequest::post("/datasets/upload").multipart(upload.into_form()?);
        self.client.request_json(request).await
    }

    pub async fn search(&self, query: &DatasetSearchQuery) -> Result<Page<Dataset>, DatalensError> {
        if query.query.trim().is_empty() {
            return Err(DatalensError::invalid("search query must not be empty"));
        }
        let request = ApiRequest::get("/datasets/search").query_from(query)?;
        self.client.request_json(request).await
    }

    /// Autocomplete suggestions for a partial query.
    pub async fn suggest(
        &self,
        partial: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SearchSuggestion>, DatalensError> {
        let request = ApiRequest::get("/datasets/search/suggest")
            .query("q", partial)
            .query_opt("limit", limit);
        self.client.request_json(request).await
    }

    pub async fn tags(&self) -> Result<Vec<String>, DatalensError> {
        self.client.request_json(ApiRequest::get("/datasets/tags")).await
    }

    pub async fn versions(&self, dataset_id: i64) -> Result<Vec<DatasetVersion>, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!("/datasets/{dataset_id}/versions")))
            .await
    }

    pub async fn version(
        &self,
        dataset_id: i64,
        version_id: i64,
    ) -> Result<DatasetVersion, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!(
                "/datasets/{dataset_id}/versions/{version_id}"
            )))
            .await
    }

    pub async fn sheets(
        &self,
        dataset_id: i64,
        version_id: i64,
    ) -> Result<Vec<DatasetSheet>, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!(
                "/datasets/{dataset_id}/versions/{version_id}/sheets"
            )))
            .await
    }

    /// First rows of one sheet; the default sheet when `sheet` is `None`.
    pub async fn sheet_preview(
        &self,
        dataset_id: i64,
        version_id: i64,
        sheet: Option<&str>,
        limit: Option<u32>,
    ) -> Result<SheetPreview, DatalensError> {
        let request = ApiRequest::get(format!(
            "/datasets/{dataset_id}/versions/{version_id}/preview"
        ))
        .query_opt("sheet", sheet)
        .query_opt("limit", limit);
        self.client.request_json(request).await
    }

    /// Raw file contents of a version.
    pub async fn download(&self, dataset_id: i64, version_id: i64) -> Result<Bytes, DatalensError> {
        self.client
            .request(ApiRequest::get(format!(
                "/datasets/{dataset_id}/versions/{version_id}/download"
            )))
            .await?
            .into_bytes()
    }
}
