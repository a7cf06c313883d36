//! Headless driver
//!
//! Runs the selection workflow by awaiting each backend call inline. The TUI
//! issues the same tickets from spawned tasks instead.

use std::sync::Arc;

use crate::api::DashboardApi;
use crate::chart::ChartSpec;
use crate::types::{AppError, AppResult, Catalog, DatasetId, Suggestion};
use crate::workflow::{Workflow, WorkflowState};

pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    workflow: Workflow,
}

impl Dashboard {
    pub fn new(api: Arc<dyn DashboardApi>, workflow: Workflow) -> Self {
        Self { api, workflow }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn state(&self) -> &WorkflowState {
        self.workflow.state()
    }

    /// Fetch the dataset list; an empty slice means none or a reported failure
    pub async fn load_datasets(&mut self) -> &[DatasetId] {
        let result = self.api.list_datasets().await;
        self.workflow.apply_datasets(result);
        self.workflow.datasets()
    }

    /// Select a dataset and wait for its suggestions
    pub async fn select_dataset(&mut self, dataset: DatasetId) -> Option<&Catalog> {
        let ticket = self.workflow.select_dataset(dataset);
        let result = self.api.get_suggestions(&ticket.dataset).await;
        self.workflow.apply_suggestions(ticket.tag, result);
        self.workflow
            .state()
            .session()
            .and_then(|s| s.catalog.as_ref())
    }

    /// Run the analysis for `suggestion`; `Ok(None)` means the request failed and was reported
    pub async fn select_suggestion(
        &mut self,
        suggestion: &Suggestion,
    ) -> AppResult<Option<&ChartSpec>> {
        let ticket = self.workflow.select_suggestion(suggestion)?;
        let result = self.api.analyze(&ticket.dataset, &ticket.request).await;
        self.workflow.apply_analysis(ticket.tag, result);
        Ok(match self.workflow.state() {
            WorkflowState::AnalysisReady { chart, .. } => Some(chart),
            _ => None,
        })
    }

    /// Look up a suggestion of the selected dataset by id
    pub fn suggestion(&self, suggestion_id: &str) -> AppResult<Suggestion> {
        let session = self
            .workflow
            .state()
            .session()
            .ok_or(AppError::NoDatasetSelected)?;
        session
            .catalog
            .as_ref()
            .and_then(|c| c.find(suggestion_id))
            .cloned()
            .ok_or_else(|| AppError::UnknownSuggestion(suggestion_id.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{AnalysisRequest, AnalysisResult, ChartKind, Operation};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory backend keyed by dataset id
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub datasets: Option<Vec<DatasetId>>,
        pub catalogs: HashMap<String, Catalog>,
        pub results: HashMap<String, AnalysisResult>,
        pub requests: Mutex<Vec<AnalysisRequest>>,
    }

    impl FakeApi {
        pub(crate) fn housing() -> Self {
            let mut api = FakeApi {
                datasets: Some(vec![
                    DatasetId::from("housing_prices"),
                    DatasetId::from("single_column"),
                ]),
                ..Default::default()
            };
            api.catalogs.insert(
                "housing_prices".to_string(),
                Catalog {
                    suggestions: vec![
                        Suggestion {
                            id: "sum_price".to_string(),
                            text: "Sum of 'price' per group".to_string(),
                            kind: "group_sum".to_string(),
                            column: "price".to_string(),
                        },
                        Suggestion {
                            id: "count_city".to_string(),
                            text: "Count per 'city'".to_string(),
                            kind: "value_counts".to_string(),
                            column: "city".to_string(),
                        },
                    ],
                    columns: vec!["city".to_string(), "price".to_string()],
                },
            );
            api.catalogs.insert(
                "single_column".to_string(),
                Catalog {
                    suggestions: vec![Suggestion {
                        id: "count_city".to_string(),
                        text: "Count per 'city'".to_string(),
                        kind: "value_counts".to_string(),
                        column: "city".to_string(),
                    }],
                    columns: vec!["city".to_string()],
                },
            );
            api.results.insert(
                "group_sum".to_string(),
                AnalysisResult {
                    chart_type: "bar".to_string(),
                    title: "Analysis of 'price' by 'city'".to_string(),
                    labels: vec!["Da Nang".to_string(), "Hanoi".to_string()],
                    data: vec![120.0, 340.5],
                },
            );
            api.results.insert(
                "value_counts".to_string(),
                AnalysisResult {
                    chart_type: "pie".to_string(),
                    title: "Analysis of 'city' by 'price'".to_string(),
                    labels: vec!["Hanoi".to_string(), "Hue".to_string(), "Vinh".to_string()],
                    data: vec![5.0, 3.0, 2.0],
                },
            );
            api
        }
    }

    #[async_trait]
    impl DashboardApi for FakeApi {
        async fn list_datasets(&self) -> AppResult<Vec<DatasetId>> {
            self.datasets
                .clone()
                .ok_or_else(|| AppError::network(Operation::ListDatasets, "connection refused"))
        }

        async fn get_suggestions(&self, dataset: &DatasetId) -> AppResult<Catalog> {
            self.catalogs
                .get(dataset.as_str())
                .cloned()
                .ok_or_else(|| AppError::network(Operation::GetSuggestions, "HTTP 404 Not Found"))
        }

        async fn analyze(
            &self,
            _dataset: &DatasetId,
            request: &AnalysisRequest,
        ) -> AppResult<AnalysisResult> {
            self.requests.lock().unwrap().push(request.clone());
            self.results
                .get(&request.kind)
                .cloned()
                .ok_or_else(|| AppError::network(Operation::Analyze, "HTTP 400 Bad Request"))
        }
    }

    fn dashboard(api: FakeApi) -> Dashboard {
        Dashboard::new(Arc::new(api), Workflow::default())
    }

    #[tokio::test]
    async fn test_full_selection_flow() {
        let mut dash = dashboard(FakeApi::housing());

        let datasets = dash.load_datasets().await.to_vec();
        assert_eq!(datasets.len(), 2);

        let catalog = dash
            .select_dataset(datasets[0].clone())
            .await
            .cloned()
            .unwrap();
        assert_eq!(catalog.suggestions.len(), 2);

        let suggestion = dash.suggestion("count_city").unwrap();
        let chart = dash.select_suggestion(&suggestion).await.unwrap().unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.labels, vec!["Hanoi", "Hue", "Vinh"]);
        assert_eq!(chart.series.background_colors.len(), 3);
    }

    #[tokio::test]
    async fn test_group_by_column_sent_to_backend() {
        let api = Arc::new(FakeApi::housing());
        let mut dash = Dashboard::new(api.clone(), Workflow::default());
        dash.select_dataset(DatasetId::from("housing_prices")).await;
        let suggestion = dash.suggestion("sum_price").unwrap();
        dash.select_suggestion(&suggestion).await.unwrap();

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].column, "price");
        assert_eq!(requests[0].group_by_col, "city");
    }

    #[tokio::test]
    async fn test_no_grouping_column_makes_no_request() {
        let api = Arc::new(FakeApi::housing());
        let mut dash = Dashboard::new(api.clone(), Workflow::default());
        dash.select_dataset(DatasetId::from("single_column")).await;
        let suggestion = dash.suggestion("count_city").unwrap();

        let err = dash.select_suggestion(&suggestion).await.unwrap_err();
        assert!(matches!(err, AppError::NoGroupingColumn { .. }));
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_silent() {
        let mut dash = dashboard(FakeApi::default());
        assert!(dash.load_datasets().await.is_empty());

        let catalog = dash.select_dataset(DatasetId::from("ghost")).await.cloned();
        assert_eq!(catalog, Some(Catalog::default()));
        assert!(!dash.workflow().is_loading());
        assert_eq!(dash.workflow().reporter().notices().count(), 2);
    }

    #[test]
    fn test_reselecting_dataset_drops_chart() {
        let mut dash = dashboard(FakeApi::housing());
        tokio_test::block_on(async {
            dash.select_dataset(DatasetId::from("housing_prices")).await;
            let suggestion = dash.suggestion("sum_price").unwrap();
            dash.select_suggestion(&suggestion).await.unwrap();
            assert!(dash.state().chart().is_some());

            dash.select_dataset(DatasetId::from("housing_prices")).await;
        });
        assert!(dash.state().chart().is_none());
        assert!(dash.state().active_suggestion().is_none());
    }

    #[tokio::test]
    async fn test_unknown_suggestion() {
        let mut dash = dashboard(FakeApi::housing());
        assert!(matches!(dash.suggestion("x"), Err(AppError::NoDatasetSelected)));

        dash.select_dataset(DatasetId::from("housing_prices")).await;
        assert!(matches!(
            dash.suggestion("nope"),
            Err(AppError::UnknownSuggestion(ref id)) if id == "nope"
        ));
    }
}
