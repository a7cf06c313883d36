// reqwest implementation of the dashboard backend API
//
// Endpoints:
//   GET  /api/datasets
//   GET  /api/datasets/{id}/suggestions
//   POST /api/datasets/{id}/analyze

use crate::api::DashboardApi;
use crate::types::{
    AnalysisRequest, AnalysisResult, AppError, AppResult, Catalog, DatasetId, Operation,
};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("smartviz/", env!("CARGO_PKG_VERSION"));

pub struct HttpApiClient {
    client: Client,
    base_url: Url,
}

// FastAPI-style error body
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpApiClient {
    /// Create a client for the backend rooted at `base_url`
    pub fn new(base_url: &str) -> AppResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| AppError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn decode<T: DeserializeOwned>(
        operation: Operation,
        response: Result<Response, reqwest::Error>,
    ) -> AppResult<T> {
        let response = response.map_err(|e| AppError::network(operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    detail: serde_json::Value::String(s),
                }) => s,
                Ok(ErrorBody { detail }) => detail.to_string(),
                Err(_) => body,
            };
            return Err(AppError::network(
                operation,
                format!("HTTP {}: {}", status, detail),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::network(operation, format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl DashboardApi for HttpApiClient {
    async fn list_datasets(&self) -> AppResult<Vec<DatasetId>> {
        let url = self.endpoint(&["api", "datasets"]);
        info!(url = %url, "Listing datasets");

        let response = self.client.get(url).send().await;
        let datasets: Vec<DatasetId> = Self::decode(Operation::ListDatasets, response).await?;

        debug!(count = datasets.len(), "Datasets received");
        Ok(datasets)
    }

    async fn get_suggestions(&self, dataset: &DatasetId) -> AppResult<Catalog> {
        let url = self.endpoint(&["api", "datasets", dataset.as_str(), "suggestions"]);
        info!(dataset = %dataset, "Fetching suggestions");

        let response = self.client.get(url).send().await;
        let catalog: Catalog = Self::decode(Operation::GetSuggestions, response).await?;

        debug!(
            dataset = %dataset,
            suggestions = catalog.suggestions.len(),
            columns = catalog.columns.len(),
            "Suggestions received"
        );
        Ok(catalog)
    }

    async fn analyze(
        &self,
        dataset: &DatasetId,
        request: &AnalysisRequest,
    ) -> AppResult<AnalysisResult> {
        let url = self.endpoint(&["api", "datasets", dataset.as_str(), "analyze"]);
        info!(
            dataset = %dataset,
            kind = %request.kind,
            column = %request.column,
            group_by = %request.group_by_col,
            "Requesting analysis"
        );

        let response = self.client.post(url).json(request).send().await;
        let result: AnalysisResult = Self::decode(Operation::Analyze, response).await?;

        debug!(
            chart_type = %result.chart_type,
            categories = result.labels.len(),
            "Analysis received"
        );
        Ok(result)
    }
}
