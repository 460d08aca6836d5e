use crate::remote::error::TransportError;
use crate::remote::transport::{BaseData, ClimateListing, ClimateTransport};
use crate::source::{CsvSource, RawRecord};
use crate::types::location::Location;
use crate::types::time_step::TimeStep;
use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::task;
use tokio_util::io::StreamReader;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const QUERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Climate service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Service base URL, without trailing slash (default: `http://localhost:8080/api`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Field separator of the CSV value downloads (default: `,`)
    #[serde(default = "default_csv_separator")]
    pub csv_separator: char,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_csv_separator() -> char {
    ','
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            csv_separator: default_csv_separator(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AltitudeResponse {
    altitude: Option<f64>,
}

/// [`ClimateTransport`] over HTTP.
///
/// | Operation | Request | Response |
/// |---|---|---|
/// | list | `GET {base}/climates[?tag=]` | JSON `[{"name", "id"}]` |
/// | records | `GET {base}/climates/{id}/values?start=&end=&step=` | CSV, optionally gzipped |
/// | base data | `GET {base}/climates/{id}` | JSON `{"location"}` |
/// | altitude | `GET {base}/altitude?lat=&lon=` | JSON `{"altitude"}` |
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TransportError::ClientBuild)?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(TransportConfig::default())
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn csv_separator(&self) -> u8 {
        u8::try_from(self.config.csv_separator).unwrap_or(b',')
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, TransportError> {
        info!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::NetworkRequest(url.to_string(), e))?;

        match response.error_for_status() {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(match e.status() {
                    Some(status) => TransportError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => TransportError::NetworkRequest(url.to_string(), e),
                })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let bytes = self
            .get(url, query)
            .await?
            .bytes()
            .await
            .map_err(|e| TransportError::NetworkRequest(url.to_string(), e))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::JsonParse(url.to_string(), e))
    }

    async fn download(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, TransportError> {
        let stream = self
            .get(url, query)
            .await?
            .bytes_stream()
            .map_err(io::Error::other);
        let body = read_body(StreamReader::new(stream)).await?;
        info!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Reads a whole response body, gunzipping it if it starts with the gzip magic bytes.
async fn read_body<R: AsyncBufRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    if reader.fill_buf().await?.starts_with(&GZIP_MAGIC) {
        GzipDecoder::new(reader).read_to_end(&mut body).await?;
    } else {
        reader.read_to_end(&mut body).await?;
    }
    Ok(body)
}

#[async_trait]
impl ClimateTransport for HttpTransport {
    async fn list_climates(&self, tag: Option<&str>) -> Result<Vec<ClimateListing>, TransportError> {
        let query: Vec<(&str, String)> = tag.map(|tag| ("tag", tag.to_string())).into_iter().collect();
        self.get_json(&self.url("climates"), &query).await
    }

    async fn fetch_records(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        time_step: TimeStep,
    ) -> Result<Vec<RawRecord>, TransportError> {
        let url = self.url(&format!("climates/{id}/values"));
        let query = [
            ("start", start.format(QUERY_TIMESTAMP_FORMAT).to_string()),
            ("end", end.format(QUERY_TIMESTAMP_FORMAT).to_string()),
            ("step", time_step.path_segment().to_string()),
        ];
        let bytes = self.download(&url, &query).await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let separator = self.csv_separator();
        task::spawn_blocking(move || {
            CsvSource::from_bytes(&bytes, separator)
                .map(|rows| rows.collect::<Vec<RawRecord>>())
                .map_err(|source| TransportError::Records { url, source })
        })
        .await?
    }

    async fn fetch_base_data(&self, id: &str) -> Result<BaseData, TransportError> {
        self.get_json(&self.url(&format!("climates/{id}")), &[]).await
    }

    async fn fetch_altitude(&self, location: &Location) -> Result<Option<f64>, TransportError> {
        let (Some(latitude), Some(longitude)) = (location.latitude, location.longitude) else {
            return Ok(None);
        };
        let query = [("lat", latitude.to_string()), ("lon", longitude.to_string())];
        let response: AltitudeResponse = self.get_json(&self.url("altitude"), &query).await?;
        Ok(response.altitude)
    }
}
