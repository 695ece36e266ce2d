use crate::record::store::RecordStore;
use crate::record::{self, Analysis, AnalysisRecord};

/// What the result panel currently shows.
///
/// `Unsaved` is the only state with a live save affordance; once the
/// analysis is persisted, or when a stored record is brought back up, the
/// slot is already covered by the collection and saving is off the table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkspaceState {
    #[default]
    Empty,
    Unsaved(Analysis),
    Saved(Analysis),
}

impl WorkspaceState {
    pub fn displayed(&self) -> Option<&Analysis> {
        match self {
            WorkspaceState::Empty => None,
            WorkspaceState::Unsaved(analysis) | WorkspaceState::Saved(analysis) => Some(analysis),
        }
    }

    pub fn is_unsaved(&self) -> bool {
        matches!(self, WorkspaceState::Unsaved(_))
    }
}

/// Reconciles the transient analysis slot with the record store. Holds a
/// cached copy of the collection and re-reads it from the store after every
/// mutation; the store never pushes updates.
pub struct Workspace {
    store: RecordStore,
    records: Vec<AnalysisRecord>,
    state: WorkspaceState,
}

impl Workspace {
    pub fn new(store: RecordStore) -> Self {
        let records = store.load_all();
        Self {
            store,
            records,
            state: WorkspaceState::Empty,
        }
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Sidebar order: descending by id, newest first. Recomputed on every
    /// call; the persisted collection keeps insertion order.
    pub fn entries_newest_first(&self) -> Vec<&AnalysisRecord> {
        let mut entries: Vec<&AnalysisRecord> = self.records.iter().collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }

    /// A successful submission replaces whatever the slot held before.
    pub fn present(&mut self, analysis: Analysis) {
        self.state = WorkspaceState::Unsaved(analysis);
    }

    /// Persists the fresh analysis as a new record and returns its id.
    /// No-op unless the workspace holds an unsaved result.
    pub fn save_current(&mut self, date: String) -> Option<u64> {
        let analysis = match &self.state {
            WorkspaceState::Unsaved(analysis) => analysis.clone(),
            _ => return None,
        };

        let mut records = self.store.load_all();
        let id = record::next_id(&records);
        records.push(AnalysisRecord {
            id,
            date,
            title: analysis.title.clone(),
            classification: analysis.classification.clone(),
            response: analysis.response.clone(),
            original_text: analysis.original_text.clone(),
        });
        self.store.save_all(&records);
        self.reload();

        self.state = WorkspaceState::Saved(analysis);
        Some(id)
    }

    /// Brings a stored record back into the result panel. A lookup miss
    /// (the record raced with a delete) is a silent no-op.
    pub fn select(&mut self, id: u64) -> bool {
        let Some(record) = self.records.iter().find(|record| record.id == id) else {
            return false;
        };

        self.state = WorkspaceState::Saved(Analysis::from(record));
        true
    }

    /// Removes a record unconditionally and reports whether the workspace
    /// was reset: when the text currently shown in the form equals the
    /// deleted record's original text, the whole workspace goes back to
    /// Empty. The link is content equality, not an id reference.
    pub fn delete(&mut self, id: u64, displayed_text: &str) -> bool {
        let deleted_text = self
            .records
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.original_text.clone());

        self.store.delete_by_id(id);
        self.reload();

        match deleted_text {
            Some(text) if text == displayed_text => {
                self.state = WorkspaceState::Empty;
                true
            }
            _ => false,
        }
    }

    /// Unconditional reset, regardless of the current state.
    pub fn clear(&mut self) {
        self.state = WorkspaceState::Empty;
    }

    fn reload(&mut self) {
        self.records = self.store.load_all();
    }
}
