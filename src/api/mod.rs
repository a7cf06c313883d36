// Backend API abstraction layer

pub mod client;

pub use client::HttpApiClient;

use async_trait::async_trait;
use crate::types::{AnalysisRequest, AnalysisResult, AppResult, Catalog, DatasetId};

/// The three backend calls the dashboard depends on
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_datasets(&self) -> AppResult<Vec<DatasetId>>;

    async fn get_suggestions(&self, dataset: &DatasetId) -> AppResult<Catalog>;

    async fn analyze(
        &self,
        dataset: &DatasetId,
        request: &AnalysisRequest,
    ) -> AppResult<AnalysisResult>;
}
