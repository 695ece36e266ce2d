use crate::record::Analysis;

/// Messages from the classifier worker back to the UI thread. The channel
/// is one-way; the app drains it at the top of every frame.
#[derive(Debug, Clone)]
pub enum AppEvent {
    AnalysisReady(Analysis),
    AnalysisFailed(String),
}
