//! Selection Workflow
//!
//! The dashboard's single source of truth: which dataset is selected, its
//! suggestions and columns, and the state of the current analysis.
//!
//! ```text
//!  Idle ──select_dataset──▶ DatasetSelected ──select_suggestion──▶ AnalysisLoading
//!                              ▲                                      │
//!                              │ select_dataset        apply_analysis │
//!                              │                                      ▼
//!                              └──────────────── AnalysisReady / AnalysisFailed
//! ```
//!
//! Transitions that need the backend return a ticket tagged with the current
//! generation. The caller performs the request and hands the result back to
//! `apply_*`; results carrying an outdated tag are dropped.

use crate::chart::{to_chart_spec, ChartSpec};
use crate::report::Reporter;
use crate::types::{
    AnalysisRequest, AnalysisResult, AppError, AppResult, Catalog, DatasetId, Suggestion,
};
use tracing::{debug, info};

/// Generation a request was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag(u64);

/// Suggestions fetch to perform after `select_dataset`
#[derive(Debug, Clone)]
pub struct SuggestionsTicket {
    pub tag: RequestTag,
    pub dataset: DatasetId,
}

/// Analysis request to perform after `select_suggestion`
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub tag: RequestTag,
    pub dataset: DatasetId,
    pub suggestion: Suggestion,
    pub request: AnalysisRequest,
}

/// Whether a response was applied or dropped as outdated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

/// The selected dataset; `catalog` is `None` while suggestions are loading
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub dataset: DatasetId,
    pub catalog: Option<Catalog>,
}

impl Session {
    pub fn suggestions(&self) -> &[Suggestion] {
        self.catalog
            .as_ref()
            .map(|c| c.suggestions.as_slice())
            .unwrap_or_default()
    }

    pub fn columns(&self) -> &[String] {
        self.catalog
            .as_ref()
            .map(|c| c.columns.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    DatasetSelected {
        session: Session,
    },
    AnalysisLoading {
        session: Session,
        suggestion: Suggestion,
        previous: Option<ChartSpec>,
    },
    AnalysisReady {
        session: Session,
        suggestion: Suggestion,
        chart: ChartSpec,
    },
    /// Keeps showing whatever chart was on screen before the request
    AnalysisFailed {
        session: Session,
        suggestion: Suggestion,
        previous: Option<ChartSpec>,
    },
}

impl WorkflowState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::DatasetSelected { session }
            | WorkflowState::AnalysisLoading { session, .. }
            | WorkflowState::AnalysisReady { session, .. }
            | WorkflowState::AnalysisFailed { session, .. } => Some(session),
        }
    }

    pub fn selected_dataset(&self) -> Option<&DatasetId> {
        self.session().map(|s| &s.dataset)
    }

    /// Suggestion whose analysis is loading or on screen
    pub fn active_suggestion(&self) -> Option<&Suggestion> {
        match self {
            WorkflowState::Idle | WorkflowState::DatasetSelected { .. } => None,
            WorkflowState::AnalysisLoading { suggestion, .. }
            | WorkflowState::AnalysisReady { suggestion, .. }
            | WorkflowState::AnalysisFailed { suggestion, .. } => Some(suggestion),
        }
    }

    /// Chart to display, if any
    pub fn chart(&self) -> Option<&ChartSpec> {
        match self {
            WorkflowState::Idle | WorkflowState::DatasetSelected { .. } => None,
            WorkflowState::AnalysisReady { chart, .. } => Some(chart),
            WorkflowState::AnalysisLoading { previous, .. }
            | WorkflowState::AnalysisFailed { previous, .. } => previous.as_ref(),
        }
    }

    /// True while a request for the current selection is outstanding
    pub fn is_loading(&self) -> bool {
        match self {
            WorkflowState::DatasetSelected { session } => session.catalog.is_none(),
            WorkflowState::AnalysisLoading { .. } => true,
            _ => false,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::DatasetSelected { .. } => "dataset-selected",
            WorkflowState::AnalysisLoading { .. } => "analysis-loading",
            WorkflowState::AnalysisReady { .. } => "analysis-ready",
            WorkflowState::AnalysisFailed { .. } => "analysis-failed",
        }
    }
}

/// First column that differs from the analyzed one
pub fn group_by_column<'a>(columns: &'a [String], column: &str) -> AppResult<&'a str> {
    columns
        .iter()
        .map(String::as_str)
        .find(|c| *c != column)
        .ok_or_else(|| AppError::NoGroupingColumn {
            column: column.to_string(),
        })
}

/// Dataset list plus the selection state machine
#[derive(Debug, Default)]
pub struct Workflow {
    datasets: Vec<DatasetId>,
    state: WorkflowState,
    generation: u64,
    reporter: Reporter,
}

impl Workflow {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            datasets: Vec::new(),
            state: WorkflowState::Idle,
            generation: 0,
            reporter,
        }
    }

    pub fn datasets(&self) -> &[DatasetId] {
        &self.datasets
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    fn next_tag(&mut self) -> RequestTag {
        self.generation += 1;
        RequestTag(self.generation)
    }

    fn is_current(&self, tag: RequestTag) -> bool {
        tag.0 == self.generation
    }

    /// Store the startup dataset list; on failure the list stays empty
    pub fn apply_datasets(&mut self, result: AppResult<Vec<DatasetId>>) {
        match result {
            Ok(datasets) => {
                info!(count = datasets.len(), "Datasets loaded");
                self.datasets = datasets;
            }
            Err(e) => self.reporter.report(&e),
        }
    }

    /// Select `dataset`, dropping the chart and suggestions of the previous one
    pub fn select_dataset(&mut self, dataset: DatasetId) -> SuggestionsTicket {
        let tag = self.next_tag();
        info!(dataset = %dataset, generation = tag.0, "Dataset selected");

        self.state = WorkflowState::DatasetSelected {
            session: Session {
                dataset: dataset.clone(),
                catalog: None,
            },
        };

        SuggestionsTicket { tag, dataset }
    }

    pub fn apply_suggestions(&mut self, tag: RequestTag, result: AppResult<Catalog>) -> Applied {
        if !self.is_current(tag) {
            debug!(
                tag = tag.0,
                generation = self.generation,
                state = self.state.name(),
                "Dropping stale suggestions"
            );
            return Applied::Stale;
        }
        let WorkflowState::DatasetSelected { session } = &mut self.state else {
            return Applied::Stale;
        };

        match result {
            Ok(catalog) => {
                info!(
                    dataset = %session.dataset,
                    suggestions = catalog.suggestions.len(),
                    "Suggestions loaded"
                );
                session.catalog = Some(catalog);
            }
            Err(e) => {
                self.reporter.report(&e);
                session.catalog = Some(Catalog::default());
            }
        }
        Applied::Current
    }

    /// Start an analysis for `suggestion`.
    ///
    /// Fails without touching state when no dataset is selected or when the
    /// dataset has no column to group by.
    pub fn select_suggestion(&mut self, suggestion: &Suggestion) -> AppResult<AnalysisTicket> {
        let session = self.state.session().ok_or(AppError::NoDatasetSelected)?;
        let group_by_col = group_by_column(session.columns(), &suggestion.column)?.to_string();

        let request = AnalysisRequest {
            kind: suggestion.kind.clone(),
            column: suggestion.column.clone(),
            group_by_col,
        };

        let previous = self.state.chart().cloned();
        let session = match std::mem::take(&mut self.state) {
            WorkflowState::Idle => return Err(AppError::NoDatasetSelected),
            WorkflowState::DatasetSelected { session }
            | WorkflowState::AnalysisLoading { session, .. }
            | WorkflowState::AnalysisReady { session, .. }
            | WorkflowState::AnalysisFailed { session, .. } => session,
        };

        let tag = self.next_tag();
        info!(
            dataset = %session.dataset,
            suggestion = %suggestion.id,
            group_by = %request.group_by_col,
            generation = tag.0,
            "Suggestion selected"
        );

        let dataset = session.dataset.clone();
        self.state = WorkflowState::AnalysisLoading {
            session,
            suggestion: suggestion.clone(),
            previous,
        };

        Ok(AnalysisTicket {
            tag,
            dataset,
            suggestion: suggestion.clone(),
            request,
        })
    }

    pub fn apply_analysis(&mut self, tag: RequestTag, result: AppResult<AnalysisResult>) -> Applied {
        if !self.is_current(tag) {
            debug!(
                tag = tag.0,
                generation = self.generation,
                state = self.state.name(),
                "Dropping stale analysis"
            );
            return Applied::Stale;
        }
        if !matches!(self.state, WorkflowState::AnalysisLoading { .. }) {
            debug!(state = self.state.name(), "No analysis outstanding");
            return Applied::Stale;
        }
        let WorkflowState::AnalysisLoading {
            session,
            suggestion,
            previous,
        } = std::mem::take(&mut self.state)
        else {
            return Applied::Stale;
        };

        let chart = result.and_then(|r| to_chart_spec(&r));
        self.state = match chart {
            Ok(chart) => {
                info!(
                    suggestion = %suggestion.id,
                    kind = %chart.kind,
                    categories = chart.labels.len(),
                    "Analysis ready"
                );
                WorkflowState::AnalysisReady {
                    session,
                    suggestion,
                    chart,
                }
            }
            Err(e) => {
                self.reporter.report(&e);
                WorkflowState::AnalysisFailed {
                    session,
                    suggestion,
                    previous,
                }
            }
        };
        Applied::Current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChartKind, Operation};

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn suggestion(id: &str, kind: &str, column: &str) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            text: format!("Analyze {}", column),
            kind: kind.to_string(),
            column: column.to_string(),
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            suggestions: vec![
                suggestion("sum_price", "group_sum", "price"),
                suggestion("count_city", "value_counts", "city"),
            ],
            columns: columns(&["city", "price"]),
        }
    }

    fn bar_result(title: &str) -> AnalysisResult {
        AnalysisResult {
            chart_type: "bar".to_string(),
            title: title.to_string(),
            labels: columns(&["Hanoi", "Hue"]),
            data: vec![3.0, 4.0],
        }
    }

    /// Workflow with `dataset` selected and its catalog loaded
    fn browsing(dataset: &str) -> Workflow {
        let mut workflow = Workflow::default();
        let ticket = workflow.select_dataset(DatasetId::from(dataset));
        assert_eq!(workflow.apply_suggestions(ticket.tag, Ok(catalog())), Applied::Current);
        workflow
    }

    #[test]
    fn test_group_by_column_first_match() {
        let cols = columns(&["age", "income"]);
        assert_eq!(group_by_column(&cols, "age").unwrap(), "income");
        assert_eq!(group_by_column(&cols, "income").unwrap(), "age");
        assert_eq!(group_by_column(&cols, "other").unwrap(), "age");
    }

    #[test]
    fn test_group_by_column_none_available() {
        assert!(matches!(
            group_by_column(&columns(&["age"]), "age"),
            Err(AppError::NoGroupingColumn { ref column }) if column == "age"
        ));
        assert!(matches!(
            group_by_column(&columns(&["age", "age"]), "age"),
            Err(AppError::NoGroupingColumn { .. })
        ));
        assert!(group_by_column(&[], "age").is_err());
    }

    #[test]
    fn test_datasets_failure_leaves_list_empty() {
        let mut workflow = Workflow::default();
        workflow.apply_datasets(Err(AppError::network(Operation::ListDatasets, "down")));
        assert!(workflow.datasets().is_empty());
        assert!(workflow.reporter().latest().is_some());

        workflow.apply_datasets(Ok(vec![DatasetId::from("a"), DatasetId::from("b")]));
        assert_eq!(workflow.datasets(), &[DatasetId::from("a"), DatasetId::from("b")]);
    }

    #[test]
    fn test_select_dataset_loads_suggestions() {
        let mut workflow = Workflow::default();
        assert!(!workflow.is_loading());

        let ticket = workflow.select_dataset(DatasetId::from("housing_prices"));
        assert_eq!(ticket.dataset, DatasetId::from("housing_prices"));
        assert!(workflow.is_loading());
        assert_eq!(workflow.state().name(), "dataset-selected");
        assert!(workflow.state().session().unwrap().suggestions().is_empty());

        workflow.apply_suggestions(ticket.tag, Ok(catalog()));
        assert!(!workflow.is_loading());
        let session = workflow.state().session().unwrap();
        assert_eq!(session.suggestions().len(), 2);
        assert_eq!(session.columns(), columns(&["city", "price"]).as_slice());
    }

    #[test]
    fn test_select_dataset_clears_chart_immediately() {
        let mut workflow = browsing("housing_prices");
        let s = catalog().suggestions[0].clone();
        let ticket = workflow.select_suggestion(&s).unwrap();
        workflow.apply_analysis(ticket.tag, Ok(bar_result("first")));
        assert!(workflow.state().chart().is_some());

        workflow.select_dataset(DatasetId::from("sales"));
        assert!(workflow.state().chart().is_none());
        assert!(workflow.state().session().unwrap().catalog.is_none());
        assert_eq!(
            workflow.state().selected_dataset(),
            Some(&DatasetId::from("sales"))
        );
    }

    #[test]
    fn test_stale_suggestions_are_dropped() {
        let mut workflow = Workflow::default();
        let first = workflow.select_dataset(DatasetId::from("a"));
        let second = workflow.select_dataset(DatasetId::from("b"));

        workflow.apply_suggestions(second.tag, Ok(catalog()));
        let late = Catalog {
            suggestions: vec![suggestion("from_a", "group_avg", "x")],
            columns: columns(&["x", "y"]),
        };
        assert_eq!(workflow.apply_suggestions(first.tag, Ok(late)), Applied::Stale);

        let session = workflow.state().session().unwrap();
        assert_eq!(session.dataset, DatasetId::from("b"));
        assert_eq!(session.suggestions()[0].id, "sum_price");
    }

    #[test]
    fn test_stale_suggestions_do_not_clear_loading() {
        let mut workflow = Workflow::default();
        let first = workflow.select_dataset(DatasetId::from("a"));
        workflow.select_dataset(DatasetId::from("b"));

        workflow.apply_suggestions(first.tag, Ok(catalog()));
        assert!(workflow.is_loading());
    }

    #[test]
    fn test_suggestions_failure_clears_loading() {
        let mut workflow = Workflow::default();
        let ticket = workflow.select_dataset(DatasetId::from("a"));
        workflow.apply_suggestions(
            ticket.tag,
            Err(AppError::network(Operation::GetSuggestions, "timeout")),
        );

        assert!(!workflow.is_loading());
        assert!(workflow.state().session().unwrap().suggestions().is_empty());
        assert!(workflow.reporter().latest().unwrap().message.contains("timeout"));
    }

    #[test]
    fn test_select_suggestion_builds_request() {
        let mut workflow = browsing("housing_prices");
        let ticket = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap();

        assert_eq!(ticket.dataset, DatasetId::from("housing_prices"));
        assert_eq!(
            ticket.request,
            AnalysisRequest {
                kind: "group_sum".to_string(),
                column: "price".to_string(),
                group_by_col: "city".to_string(),
            }
        );
        assert!(workflow.is_loading());
        assert_eq!(workflow.state().name(), "analysis-loading");
    }

    #[test]
    fn test_select_suggestion_without_grouping_column() {
        let mut workflow = Workflow::default();
        let ticket = workflow.select_dataset(DatasetId::from("single"));
        workflow.apply_suggestions(
            ticket.tag,
            Ok(Catalog {
                suggestions: vec![suggestion("count_age", "value_counts", "age")],
                columns: columns(&["age"]),
            }),
        );
        let before = workflow.state().clone();

        let err = workflow
            .select_suggestion(&suggestion("count_age", "value_counts", "age"))
            .unwrap_err();
        assert!(matches!(err, AppError::NoGroupingColumn { .. }));
        assert_eq!(workflow.state(), &before);
        assert!(!workflow.is_loading());
    }

    #[test]
    fn test_select_suggestion_when_idle() {
        let mut workflow = Workflow::default();
        let err = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap_err();
        assert!(matches!(err, AppError::NoDatasetSelected));
        assert_eq!(workflow.state(), &WorkflowState::Idle);
    }

    #[test]
    fn test_analysis_ready() {
        let mut workflow = browsing("housing_prices");
        let ticket = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap();

        assert_eq!(
            workflow.apply_analysis(ticket.tag, Ok(bar_result("Price by city"))),
            Applied::Current
        );
        assert!(!workflow.is_loading());
        let chart = workflow.state().chart().unwrap();
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Price by city");
        assert_eq!(workflow.state().active_suggestion().unwrap().id, "sum_price");
    }

    #[test]
    fn test_analysis_failure_keeps_previous_chart() {
        let mut workflow = browsing("housing_prices");
        let s = suggestion("sum_price", "group_sum", "price");
        let ticket = workflow.select_suggestion(&s).unwrap();
        workflow.apply_analysis(ticket.tag, Ok(bar_result("first")));

        let ticket = workflow.select_suggestion(&s).unwrap();
        assert_eq!(workflow.state().chart().unwrap().title, "first");
        workflow.apply_analysis(ticket.tag, Err(AppError::network(Operation::Analyze, "500")));

        assert_eq!(workflow.state().name(), "analysis-failed");
        assert!(!workflow.is_loading());
        assert_eq!(workflow.state().chart().unwrap().title, "first");
    }

    #[test]
    fn test_analysis_failure_without_previous_shows_nothing() {
        let mut workflow = browsing("housing_prices");
        let ticket = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap();
        let mut result = bar_result("weird");
        result.chart_type = "scatter".to_string();
        workflow.apply_analysis(ticket.tag, Ok(result));

        assert_eq!(workflow.state().name(), "analysis-failed");
        assert!(workflow.state().chart().is_none());
        assert!(workflow
            .reporter()
            .latest()
            .unwrap()
            .message
            .contains("scatter"));
    }

    #[test]
    fn test_overlapping_analyses_keep_latest() {
        let mut workflow = browsing("housing_prices");
        let first = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap();
        let second = workflow
            .select_suggestion(&suggestion("count_city", "value_counts", "city"))
            .unwrap();

        let mut pie = bar_result("second");
        pie.chart_type = "pie".to_string();
        assert_eq!(workflow.apply_analysis(second.tag, Ok(pie)), Applied::Current);
        assert_eq!(
            workflow.apply_analysis(first.tag, Ok(bar_result("first"))),
            Applied::Stale
        );

        let chart = workflow.state().chart().unwrap();
        assert_eq!(chart.title, "second");
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(workflow.state().active_suggestion().unwrap().id, "count_city");
    }

    #[test]
    fn test_analysis_for_previous_dataset_is_dropped() {
        let mut workflow = browsing("housing_prices");
        let ticket = workflow
            .select_suggestion(&suggestion("sum_price", "group_sum", "price"))
            .unwrap();
        workflow.select_dataset(DatasetId::from("sales"));

        assert_eq!(
            workflow.apply_analysis(ticket.tag, Ok(bar_result("old"))),
            Applied::Stale
        );
        assert!(workflow.state().chart().is_none());
        assert!(workflow.is_loading());
    }
}
