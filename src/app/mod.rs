mod state;
mod ui;

use crate::analysis::{
    Action, AnalysisDispatcher, AnalysisService, DownloadCoordinator, FileHandle,
};
use eframe::{egui, App};
pub use state::{ResultTab, WorkflowState};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

pub struct SheetChecker {
    state: WorkflowState,
    drop_hover: bool,
}

impl SheetChecker {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        service: Arc<dyn AnalysisService>,
        download_dir: PathBuf,
    ) -> Self {
        log::info!("Initializing SheetChecker");
        let (sender, receiver) = std_mpsc::channel();
        let dispatcher = AnalysisDispatcher::new(Arc::clone(&service), sender.clone());
        let downloader = DownloadCoordinator::new(service, sender, download_dir);
        Self {
            state: WorkflowState::new(dispatcher, downloader, receiver),
            drop_hover: false,
        }
    }

    pub fn pick_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Excel", &["xlsx", "xls"])
            .pick_file()
        else {
            return;
        };
        self.offer_path(path, None);
    }

    fn offer_path(&mut self, path: PathBuf, mime: Option<String>) {
        let handle = match FileHandle::from_path(&path) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Cannot read metadata of {:?}: {}", path, e);
                return;
            }
        };
        let handle = match mime {
            Some(mime) => handle.with_mime(mime),
            None => handle,
        };
        // Unsupported files are ignored without a notice.
        if self.state.offer_file(handle).is_ok() {
            self.state.load_sheets();
        }
    }

    pub fn run_action(&mut self, action: Action) {
        if let Err(e) = self.state.run_action(action) {
            log::debug!("Analysis not started: {}", e);
        }
    }

    pub fn start_download(&mut self) {
        if let Err(e) = self.state.start_download() {
            log::debug!("Download not started: {}", e);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.first().cloned(),
            )
        });
        self.drop_hover = hovering;

        if let Some(file) = dropped {
            match file.path {
                Some(path) => {
                    let mime = Some(file.mime).filter(|m| !m.is_empty());
                    self.offer_path(path, mime);
                }
                None => log::debug!("Dropped item '{}' has no path, ignoring", file.name),
            }
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        self.handle_dropped_files(ctx);

        if self.state.poll() {
            ctx.request_repaint();
        }

        // Keep polling while a worker may still report back.
        if self.state.is_analyzing() || self.state.is_downloading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl App for SheetChecker {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
