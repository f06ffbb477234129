//! Upload provider HTTP client

use serde::Serialize;

use super::credential::CredentialCell;
use super::{BlobConfig, BlobError, BlobStore};

const API_KEY_HEADER: &str = "x-uploadthing-api-key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFilesRequest<'a> {
    file_keys: [&'a str; 1],
}

/// [`BlobStore`] backed by the upload provider's REST API
///
/// Authenticates with whatever credential is active in the
/// [`CredentialCell`] at call time.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    delete_url: String,
    cell: CredentialCell,
}

impl HttpBlobStore {
    pub fn new(config: &BlobConfig, cell: CredentialCell) -> Result<Self, BlobError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BlobError::Request(e.to_string()))?;

        Ok(Self {
            client,
            delete_url: delete_url(&config.api_base_url),
            cell,
        })
    }
}

fn delete_url(base: &str) -> String {
    format!("{}/v6/deleteFiles", base.trim_end_matches('/'))
}

impl BlobStore for HttpBlobStore {
    async fn delete_by_key(&self, key: &str) -> Result<(), BlobError> {
        let credential = self.cell.current().ok_or(BlobError::NoActiveCredential)?;

        let response = self
            .client
            .post(&self.delete_url)
            .header(API_KEY_HEADER, credential)
            .json(&DeleteFilesRequest { file_keys: [key] })
            .send()
            .await
            .map_err(|e| BlobError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
