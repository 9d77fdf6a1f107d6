use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use tokio::sync::OnceCell;
use crate::error::{Error, Result};
use crate::interfaces::RawSource;

/// Raw transaction log stored as an object in a Google Cloud Storage bucket.
///
/// The client is built on first load. Without an endpoint override it
/// authenticates with the ambient Google credentials; with one (a local
/// emulator, a test server) requests go out anonymously.
pub struct BucketStorage {
    bucket: String,
    object: String,
    endpoint: Option<String>,
    client: OnceCell<Client>,
}

impl BucketStorage {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        BucketStorage {
            bucket: bucket.into(),
            object: object.into(),
            endpoint: None,
            client: OnceCell::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|e| !e.is_empty());
        self
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let config = match &self.endpoint {
                    Some(endpoint) => {
                        tracing::debug!(endpoint = %endpoint, "Using custom storage endpoint");
                        ClientConfig {
                            storage_endpoint: endpoint.trim_end_matches('/').to_string(),
                            ..ClientConfig::default()
                        }
                        .anonymous()
                    }
                    None => ClientConfig::default()
                        .with_auth()
                        .await
                        .map_err(|e| Error::Source(format!("creating storage client: {}", e)))?,
                };

                tracing::debug!("Storage client created");
                Ok::<_, Error>(Client::new(config))
            })
            .await
    }
}

#[async_trait]
impl RawSource for BucketStorage {
    async fn load(&self) -> Result<Vec<u8>> {
        let client = self.client().await?;

        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: self.object.clone(),
            ..Default::default()
        };

        let data = client
            .download_object(&request, &Range::default())
            .await
            .map_err(|e| Error::Source(format!("reading gs://{}/{}: {}", self.bucket, self.object, e)))?;

        tracing::info!(bucket = %self.bucket, object = %self.object, bytes = data.len(), "Loaded raw log");
        Ok(data)
    }
}
