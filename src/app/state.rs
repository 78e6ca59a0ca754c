use crate::analysis::{
    normalize, Action, AnalysisDispatcher, AnalysisResponse, ArtifactRef, DisplayModel,
    DownloadCoordinator, FileHandle, FileSession, FileValidator, Generation, RequestToken,
    Severity, StatusChannel, StatusNotice, WorkerEvent, WorkflowError,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Summary,
    Details,
}

/// Artifact of the last successful analysis, with the action that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LastAnalysis {
    pub action: Action,
    pub artifact: Option<ArtifactRef>,
}

/// Single owner of the workflow state. The UI only goes through these
/// transitions; worker replies come back through `events`.
#[derive(Debug)]
pub struct WorkflowState {
    session: FileSession,
    status: StatusChannel,
    dispatcher: AnalysisDispatcher,
    downloader: DownloadCoordinator,
    events: Receiver<WorkerEvent>,
    analysis_generation: Generation,
    download_generation: Generation,
    sheets_generation: Generation,
    pending_analysis: Option<(RequestToken, Action)>,
    pending_download: Option<RequestToken>,
    display: Option<DisplayModel>,
    last_analysis: Option<LastAnalysis>,
    last_download: Option<PathBuf>,
    sheets: Vec<String>,
    selected_sheet: Option<String>,
    pub active_tab: ResultTab,
}

impl WorkflowState {
    pub fn new(
        dispatcher: AnalysisDispatcher,
        downloader: DownloadCoordinator,
        events: Receiver<WorkerEvent>,
    ) -> Self {
        Self {
            session: FileSession::default(),
            status: StatusChannel::default(),
            dispatcher,
            downloader,
            events,
            analysis_generation: Generation::default(),
            download_generation: Generation::default(),
            sheets_generation: Generation::default(),
            pending_analysis: None,
            pending_download: None,
            display: None,
            last_analysis: None,
            last_download: None,
            sheets: Vec::new(),
            selected_sheet: None,
            active_tab: ResultTab::default(),
        }
    }

    /// Offers a picked or dropped file. Rejected files leave every piece of
    /// state untouched.
    pub fn offer_file(&mut self, file: FileHandle) -> Result<(), WorkflowError> {
        if !FileValidator::validate(&file) {
            log::debug!("Ignoring unsupported file '{}'", file.name);
            return Err(WorkflowError::ValidationRejected);
        }
        self.reset_results();
        self.reset_sheets();
        self.session.select(file, &mut self.status);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.reset_results();
        self.reset_sheets();
        self.session.clear(&mut self.status);
    }

    /// Requests the worksheet names of the held file. Until they arrive, or
    /// if the service cannot list them, analyses go out without a sheet.
    pub fn load_sheets(&mut self) -> Option<RequestToken> {
        let file = self.session.file()?;
        let token = self.sheets_generation.advance();
        Some(self.dispatcher.load_sheets(file, token))
    }

    /// Switches the analysed worksheet. Results for the previous sheet are
    /// hidden. Unknown names are ignored.
    pub fn select_sheet(&mut self, name: &str) -> bool {
        if !self.sheets.iter().any(|s| s == name)
            || self.selected_sheet.as_deref() == Some(name)
        {
            return false;
        }
        log::info!("Selected sheet '{}'", name);
        self.reset_results();
        self.selected_sheet = Some(name.to_string());
        true
    }

    /// Starts an analysis. A request still in flight is superseded: its
    /// reply will be discarded when it arrives.
    pub fn run_action(&mut self, action: Action) -> Result<RequestToken, WorkflowError> {
        let token = self.analysis_generation.advance();
        let token = self
            .dispatcher
            .run(
                &self.session,
                action,
                self.selected_sheet.clone(),
                token,
                &mut self.status,
            )?;
        if let Some((previous, _)) = self.pending_analysis.replace((token, action)) {
            log::info!("Superseding in-flight analysis {:?}", previous);
        }
        self.last_analysis = None;
        self.last_download = None;
        Ok(token)
    }

    pub fn start_download(&mut self) -> Result<RequestToken, WorkflowError> {
        let (artifact, action) = match &self.last_analysis {
            Some(last) => (last.artifact.as_ref(), last.action),
            None => (None, Action::DetectErrors),
        };
        let token = self.download_generation.advance();
        let token = self
            .downloader
            .download(artifact, action, token, &mut self.status)?;
        self.pending_download = Some(token);
        Ok(token)
    }

    /// Drains worker replies. Returns true when anything was applied.
    pub fn poll(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events.try_recv() {
            applied |= self.apply_event(event);
        }
        applied
    }

    pub fn apply_event(&mut self, event: WorkerEvent) -> bool {
        match event {
            WorkerEvent::Analysis { token, outcome } => {
                if !self.analysis_generation.is_current(token) {
                    log::debug!("Discarding stale analysis reply {:?}", token);
                    return false;
                }
                let action = self.pending_analysis.take().map(|(_, action)| action);
                match (outcome, action) {
                    (Ok(response), Some(action)) => self.apply_analysis(response, action),
                    (Ok(_), None) => {
                        log::error!("Analysis reply {:?} without a recorded action", token);
                        return false;
                    }
                    (Err(err), _) => {
                        log::warn!("Analysis failed: {}", err);
                        self.status.set(err.to_string(), Severity::Error);
                    }
                }
                true
            }
            WorkerEvent::Download { token, outcome } => {
                if !self.download_generation.is_current(token) {
                    log::debug!("Discarding stale download reply {:?}", token);
                    return false;
                }
                self.pending_download = None;
                match outcome {
                    Ok(path) => {
                        self.status.set("Téléchargement terminé", Severity::Success);
                        self.last_download = Some(path);
                    }
                    Err(err) => {
                        log::warn!("Download failed: {}", err);
                        self.status.set(err.to_string(), Severity::Error);
                    }
                }
                true
            }
            WorkerEvent::Sheets { token, outcome } => {
                if !self.sheets_generation.is_current(token) {
                    log::debug!("Discarding stale sheet list {:?}", token);
                    return false;
                }
                match outcome {
                    Ok(sheets) => {
                        log::info!("Workbook has {} sheet(s)", sheets.len());
                        self.selected_sheet = sheets.first().cloned();
                        self.sheets = sheets;
                    }
                    Err(err) => log::warn!("Sheet list unavailable: {}", err),
                }
                true
            }
        }
    }

    fn apply_analysis(&mut self, response: AnalysisResponse, action: Action) {
        let display = normalize(&response.result, action);
        log::info!("Analysis '{}' finished: {}", action, display.summary.text);
        self.last_analysis = if display.download_enabled {
            Some(LastAnalysis {
                action,
                artifact: response.artifact,
            })
        } else {
            None
        };
        self.display = Some(display);
        self.active_tab = ResultTab::Summary;
        self.status.set("Analyse terminée avec succès", Severity::Success);
    }

    /// Hides results and makes every outstanding reply stale.
    fn reset_results(&mut self) {
        self.analysis_generation.invalidate();
        self.download_generation.invalidate();
        self.pending_analysis = None;
        self.pending_download = None;
        self.display = None;
        self.last_analysis = None;
        self.last_download = None;
        self.active_tab = ResultTab::default();
    }

    fn reset_sheets(&mut self) {
        self.sheets_generation.invalidate();
        self.sheets.clear();
        self.selected_sheet = None;
    }

    pub fn file(&self) -> Option<&FileHandle> {
        self.session.file()
    }

    pub fn status(&self) -> &StatusNotice {
        self.status.current()
    }

    pub fn display(&self) -> Option<&DisplayModel> {
        self.display.as_ref()
    }

    /// True only while the current results carry an artifact and no request
    /// is in flight.
    pub fn can_download(&self) -> bool {
        self.display.as_ref().is_some_and(|d| d.download_enabled)
            && self
                .last_analysis
                .as_ref()
                .is_some_and(|last| last.artifact.is_some())
            && self.pending_analysis.is_none()
            && self.pending_download.is_none()
    }

    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    pub fn selected_sheet(&self) -> Option<&str> {
        self.selected_sheet.as_deref()
    }

    pub fn last_download(&self) -> Option<&Path> {
        self.last_download.as_deref()
    }

    pub fn download_dir(&self) -> &Path {
        self.downloader.download_dir()
    }

    pub fn is_analyzing(&self) -> bool {
        self.pending_analysis.is_some()
    }

    pub fn is_downloading(&self) -> bool {
        self.pending_download.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, AnalyzeReply, ErrorRecord};
    use crate::testing::FakeService;
    use serde_json::json;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn errors_reply() -> AnalyzeReply {
        serde_json::from_value(json!({
            "results": {"errors": [
                {"Ligne": 2, "Colonne": "Age", "Valeur": null, "Problème": "negative"},
                {"Ligne": 5, "Colonne": "Age", "Valeur": "x", "Problème": "non-numeric"}
            ]},
            "file": "504b0304"
        }))
        .unwrap()
    }

    fn workflow(service: FakeService) -> (WorkflowState, Arc<FakeService>, TempDir) {
        let service = Arc::new(service);
        let dir = tempdir().unwrap();
        let (sender, receiver) = mpsc::channel();
        let dispatcher = AnalysisDispatcher::new(service.clone(), sender.clone());
        let downloader = DownloadCoordinator::new(service.clone(), sender, dir.path().to_path_buf());
        (WorkflowState::new(dispatcher, downloader, receiver), service, dir)
    }

    fn sheet() -> FileHandle {
        FileHandle::new("sites.xlsx", 2048, "/data/sites.xlsx")
    }

    fn next_event(state: &WorkflowState) -> WorkerEvent {
        state.events.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    fn one_error_response() -> AnalysisResponse {
        AnalysisResponse {
            result: AnalysisResult::ErrorReport {
                errors: vec![ErrorRecord {
                    line: 3,
                    column: "PIRE".to_string(),
                    value: None,
                    problem: "vide".to_string(),
                }],
            },
            artifact: Some(ArtifactRef::new("ab")),
        }
    }

    #[test]
    fn rejected_file_changes_nothing() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        let err = state
            .offer_file(FileHandle::new("notes.txt", 10, "/data/notes.txt"))
            .unwrap_err();
        assert_eq!(err, WorkflowError::ValidationRejected);
        assert!(state.file().is_none());
        assert_eq!(state.status(), &StatusNotice::default());
    }

    #[test]
    fn accepted_file_is_ready() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        assert_eq!(state.file().map(|f| f.name.as_str()), Some("sites.xlsx"));
        assert_eq!(state.status().severity, Severity::Success);
    }

    #[test]
    fn action_without_file_is_refused() {
        let (mut state, service, _dir) = workflow(FakeService::default());
        assert_eq!(
            state.run_action(Action::DetectErrors),
            Err(WorkflowError::NoFileSelected)
        );
        assert_eq!(state.status().severity, Severity::Error);
        assert!(!state.is_analyzing());
        assert_eq!(service.analyze_calls(), 0);
    }

    #[test]
    fn successful_analysis_is_rendered() {
        let (mut state, _, _dir) =
            workflow(FakeService::default().with_analyze_reply(Ok(errors_reply())));
        state.offer_file(sheet()).unwrap();
        state.run_action(Action::DetectErrors).unwrap();
        assert!(state.is_analyzing());
        assert_eq!(state.status().severity, Severity::Loading);

        let event = next_event(&state);
        assert!(state.apply_event(event));

        let display = state.display().unwrap();
        assert_eq!(display.summary.text, "2 erreurs détectées");
        assert_eq!(display.groups[0].headline(), "Age — 2 erreurs");
        assert!(state.can_download());
        assert!(!state.is_analyzing());
        assert_eq!(state.status().text, "Analyse terminée avec succès");
    }

    #[test]
    fn service_error_is_surfaced_verbatim() {
        let service = FakeService::default().with_analyze_reply(Ok(serde_json::from_value(
            json!({"error": "Colonne 'Latitude' introuvable"}),
        )
        .unwrap()));
        let (mut state, _, _dir) = workflow(service);
        state.offer_file(sheet()).unwrap();
        state.run_action(Action::DetectDuplicates).unwrap();

        let event = next_event(&state);
        state.apply_event(event);
        assert_eq!(state.status().severity, Severity::Error);
        assert_eq!(state.status().text, "Colonne 'Latitude' introuvable");
        assert!(state.display().is_none());
        assert!(!state.can_download());
    }

    #[test]
    fn clear_hides_results_and_drops_late_replies() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.clear_file();

        assert!(!state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        }));
        assert!(state.file().is_none());
        assert!(state.display().is_none());
        assert_eq!(state.status().severity, Severity::Idle);
    }

    #[test]
    fn clear_after_results_hides_them() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });
        assert!(state.display().is_some());

        state.clear_file();
        assert!(state.display().is_none());
        assert!(!state.can_download());
    }

    #[test]
    fn latest_request_wins() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let first = state.run_action(Action::DetectErrors).unwrap();
        let second = state.run_action(Action::DetectErrors).unwrap();

        assert!(!state.apply_event(WorkerEvent::Analysis {
            token: first,
            outcome: Ok(one_error_response()),
        }));
        assert!(state.display().is_none());
        assert!(state.is_analyzing());

        assert!(state.apply_event(WorkerEvent::Analysis {
            token: second,
            outcome: Ok(one_error_response()),
        }));
        assert_eq!(state.display().unwrap().summary.text, "1 erreur détectée");
    }

    #[test]
    fn new_selection_drops_previous_results() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });

        state
            .offer_file(FileHandle::new("autre.xls", 99, "/data/autre.xls"))
            .unwrap();
        assert!(state.display().is_none());
        assert_eq!(state.start_download(), Err(WorkflowError::NoArtifact));
    }

    #[test]
    fn empty_result_disables_download() {
        let (mut state, service, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectDuplicates).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(AnalysisResponse {
                result: AnalysisResult::Empty {
                    message: "no issues".to_string(),
                },
                artifact: None,
            }),
        });

        let display = state.display().unwrap();
        assert!(display.table.is_none());
        assert!(!state.can_download());
        assert_eq!(state.start_download(), Err(WorkflowError::NoArtifact));
        assert_eq!(state.status().text, "Aucune donnée à télécharger");
        assert_eq!(service.download_calls(), 0);
    }

    #[test]
    fn download_without_analysis_issues_no_request() {
        let (mut state, service, _dir) = workflow(FakeService::default());
        assert_eq!(state.start_download(), Err(WorkflowError::NoArtifact));
        assert!(!state.is_downloading());
        assert_eq!(service.download_calls(), 0);
    }

    #[test]
    fn rerun_invalidates_previous_artifact() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });
        assert!(state.can_download());

        state.run_action(Action::DetectDuplicates).unwrap();
        assert!(!state.can_download());
        assert_eq!(state.start_download(), Err(WorkflowError::NoArtifact));
    }

    #[test]
    fn failed_rerun_keeps_download_disabled() {
        let (mut state, service, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });
        assert!(state.can_download());

        let token = state.run_action(Action::DetectErrors).unwrap();
        assert!(state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Err(WorkflowError::Transport("statut 500".to_string())),
        }));

        assert_eq!(state.status().text, "Erreur lors du traitement: statut 500");
        assert!(state.display().is_some());
        assert!(!state.can_download());
        assert_eq!(state.start_download(), Err(WorkflowError::NoArtifact));
        assert_eq!(service.download_calls(), 0);
    }

    #[test]
    fn sheet_names_arrive_and_first_is_selected() {
        let service = FakeService::default()
            .with_sheets_reply(Ok(vec!["Synthèse".to_string(), "Trimestriel".to_string()]))
            .with_analyze_reply(Ok(errors_reply()));
        let (mut state, service, _dir) = workflow(service);
        state.offer_file(sheet()).unwrap();
        assert!(state.load_sheets().is_some());

        let event = next_event(&state);
        assert!(state.apply_event(event));
        assert_eq!(state.sheets(), ["Synthèse", "Trimestriel"]);
        assert_eq!(state.selected_sheet(), Some("Synthèse"));

        assert!(state.select_sheet("Trimestriel"));
        assert!(!state.select_sheet("Inconnue"));
        state.run_action(Action::DetectErrors).unwrap();
        let event = next_event(&state);
        state.apply_event(event);
        assert_eq!(service.last_sheet(), Some("Trimestriel".to_string()));
    }

    #[test]
    fn unavailable_sheet_list_sends_no_sheet() {
        let service = FakeService::default().with_analyze_reply(Ok(errors_reply()));
        let (mut state, service, _dir) = workflow(service);
        state.offer_file(sheet()).unwrap();
        state.load_sheets();

        let event = next_event(&state);
        assert!(state.apply_event(event));
        assert!(state.sheets().is_empty());
        assert_eq!(state.status().text, "Fichier prêt pour analyse");

        state.run_action(Action::DetectErrors).unwrap();
        let event = next_event(&state);
        state.apply_event(event);
        assert_eq!(service.last_sheet(), None);
        assert!(state.display().is_some());
    }

    #[test]
    fn sheet_list_for_replaced_file_is_discarded() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        assert_eq!(state.load_sheets(), None);
        state.offer_file(sheet()).unwrap();
        let token = state.load_sheets().unwrap();
        state
            .offer_file(FileHandle::new("autre.xls", 99, "/data/autre.xls"))
            .unwrap();

        assert!(!state.apply_event(WorkerEvent::Sheets {
            token,
            outcome: Ok(vec!["Feuil1".to_string()]),
        }));
        assert!(state.sheets().is_empty());
        assert_eq!(state.selected_sheet(), None);
    }

    #[test]
    fn switching_sheet_hides_previous_results() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.load_sheets().unwrap();
        state.apply_event(WorkerEvent::Sheets {
            token,
            outcome: Ok(vec!["A".to_string(), "B".to_string()]),
        });
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });
        assert!(state.display().is_some());

        assert!(!state.select_sheet("A"));
        assert!(state.display().is_some());
        assert!(state.select_sheet("B"));
        assert!(state.display().is_none());
        assert!(!state.can_download());
        assert_eq!(state.sheets(), ["A", "B"]);
    }

    #[test]
    fn download_saves_file_and_reports_success() {
        let service = FakeService::default()
            .with_analyze_reply(Ok(errors_reply()))
            .with_download_reply(Ok(b"PK".to_vec()));
        let (mut state, service, dir) = workflow(service);
        state.offer_file(sheet()).unwrap();
        state.run_action(Action::DetectErrors).unwrap();
        let event = next_event(&state);
        state.apply_event(event);

        state.start_download().unwrap();
        assert!(state.is_downloading());
        assert!(!state.can_download());
        let event = next_event(&state);
        assert!(state.apply_event(event));

        assert_eq!(state.status().text, "Téléchargement terminé");
        let saved = state.last_download().unwrap();
        assert!(saved.starts_with(dir.path()));
        assert!(saved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("resultats_detect_errors_"));
        assert_eq!(service.download_calls(), 1);
    }

    #[test]
    fn failed_download_reports_message() {
        let (mut state, _, _dir) = workflow(FakeService::default());
        state.offer_file(sheet()).unwrap();
        let token = state.run_action(Action::DetectErrors).unwrap();
        state.apply_event(WorkerEvent::Analysis {
            token,
            outcome: Ok(one_error_response()),
        });

        let token = state.start_download().unwrap();
        state.apply_event(WorkerEvent::Download {
            token,
            outcome: Err(WorkflowError::Download("Erreur lors du téléchargement".to_string())),
        });
        assert_eq!(state.status().severity, Severity::Error);
        assert_eq!(state.status().text, "Erreur lors du téléchargement");
        assert!(state.last_download().is_none());
    }
}
