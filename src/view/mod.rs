//! The matting view: two image panes, three actions and a settings form.
//!
//! Everything here is UI-toolkit agnostic. A frontend renders from the
//! accessors, forwards clicks to the action methods and calls [`MattingView::poll`]
//! once per frame to pick up finished backend work.

mod dialog;
mod toast;

pub use dialog::{FieldErrors, SettingsDialog, API_KEY_REQUIRED, SAVE_PATH_REQUIRED};
pub use toast::{Toast, ToastKind, ToastQueue, DEFAULT_TOAST_TTL};

use log::{debug, error, info, warn};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::backend::{Backend, BackendError, ImageRecord, MattingRequest};
use crate::settings::{Settings, SettingsStore};

pub const CUTOUT_SUCCEEDED: &str = "处理完成";
pub const SAVE_SETTINGS_FAILED: &str = "保存设置失败";

/// User-facing failures; the display strings are the toast texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("请设置保存路径和API Key")]
    ConfigurationMissing,
    #[error("抠图失败")]
    CutoutFailed,
    #[error("请上传图片")]
    NoSourceImage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub source_image: ImageRecord,
    pub result_image: ImageRecord,
    pub is_spinner_visible: bool,
}

/// Build the matting request, refusing an empty source before incomplete settings.
pub fn cutout_request(
    source_path: &str,
    settings: Option<Settings>,
) -> Result<MattingRequest, ViewError> {
    if source_path.is_empty() {
        return Err(ViewError::NoSourceImage);
    }
    let settings = settings
        .filter(Settings::is_complete)
        .ok_or(ViewError::ConfigurationMissing)?;

    Ok(MattingRequest {
        file_path: source_path.to_string(),
        save_path: settings.save_path,
        api_key: settings.api_key,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum JobKind {
    OpenImage,
    PickSavePath { session: u64 },
    /// `source` is the path of the image the cutout was started on
    Cutout { source: String },
}

impl JobKind {
    fn name(&self) -> &'static str {
        match self {
            JobKind::OpenImage => "open-image",
            JobKind::PickSavePath { .. } => "pick-save-path",
            JobKind::Cutout { .. } => "cutout",
        }
    }

    /// Outcome reported when the worker went away without answering.
    fn disconnected(&self) -> JobOutcome {
        match self {
            JobKind::OpenImage => JobOutcome::ImageOpened(Err(BackendError::Disconnected)),
            JobKind::PickSavePath { session } => JobOutcome::SavePathPicked {
                session: *session,
                result: Err(BackendError::Disconnected),
            },
            JobKind::Cutout { source } => JobOutcome::CutoutFinished {
                source: source.clone(),
                result: Err(BackendError::Disconnected),
            },
        }
    }
}

#[derive(Debug)]
enum JobOutcome {
    ImageOpened(Result<ImageRecord, BackendError>),
    SavePathPicked {
        session: u64,
        result: Result<String, BackendError>,
    },
    CutoutFinished {
        source: String,
        result: Result<ImageRecord, BackendError>,
    },
}

struct PendingJob {
    kind: JobKind,
    receiver: Receiver<JobOutcome>,
}

pub struct MattingView {
    backend: Arc<dyn Backend>,
    settings: Box<dyn SettingsStore>,
    state: ViewState,
    dialog: SettingsDialog,
    toasts: ToastQueue,
    // Each job owns the sender of its channel; dropping the view drops the
    // receivers and late replies go nowhere.
    pending: Vec<PendingJob>,
}

impl MattingView {
    pub fn new(backend: Arc<dyn Backend>, settings: impl SettingsStore + 'static) -> Self {
        Self {
            backend,
            settings: Box::new(settings),
            state: ViewState::default(),
            dialog: SettingsDialog::default(),
            toasts: ToastQueue::default(),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn dialog(&self) -> &SettingsDialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut SettingsDialog {
        &mut self.dialog
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// True while any backend command is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_cutout_in_flight(&self) -> bool {
        self.has_pending(|kind| matches!(kind, JobKind::Cutout { .. }))
    }

    pub fn is_opening_image(&self) -> bool {
        self.has_pending(|kind| *kind == JobKind::OpenImage)
    }

    fn has_pending(&self, pred: impl Fn(&JobKind) -> bool) -> bool {
        self.pending.iter().any(|job| pred(&job.kind))
    }

    /// Ask the backend for a new source image.
    pub fn open_image(&mut self) {
        if self.is_opening_image() {
            debug!("Image picker already open, ignoring");
            return;
        }
        self.spawn(JobKind::OpenImage, |backend| {
            JobOutcome::ImageOpened(backend.open_image())
        });
    }

    /// Check the cutout preconditions, in order, without touching the backend.
    pub fn prepare_cutout(&self) -> Result<MattingRequest, ViewError> {
        if self.state.source_image.image_path.is_empty() {
            return Err(ViewError::NoSourceImage);
        }
        cutout_request(&self.state.source_image.image_path, self.load_settings())
    }

    /// Run background removal on the current source image.
    pub fn cutout(&mut self) {
        if self.is_cutout_in_flight() {
            debug!("Cutout already in flight, ignoring");
            return;
        }

        let request = match self.prepare_cutout() {
            Ok(request) => request,
            Err(err) => {
                info!("Cutout refused: {:?}", err);
                self.toasts.error(err.to_string());
                return;
            }
        };

        self.state.is_spinner_visible = true;
        let source = request.file_path.clone();
        self.spawn(JobKind::Cutout { source: source.clone() }, move |backend| {
            JobOutcome::CutoutFinished {
                source,
                result: backend.matting_image(&request),
            }
        });
    }

    pub fn open_settings(&mut self) {
        let persisted = self.load_settings();
        self.dialog.open(persisted);
    }

    /// Ask the backend for a save directory; only meaningful while the form is open.
    pub fn pick_save_path(&mut self) {
        if !self.dialog.is_open() {
            return;
        }
        if self.has_pending(|kind| matches!(kind, JobKind::PickSavePath { .. })) {
            debug!("Folder picker already open, ignoring");
            return;
        }
        let session = self.dialog.session();
        self.spawn(JobKind::PickSavePath { session }, move |backend| {
            JobOutcome::SavePathPicked {
                session,
                result: backend.save_matting_image_path(),
            }
        });
    }

    /// Validate and persist the draft. Returns whether the dialog closed.
    pub fn confirm_settings(&mut self) -> bool {
        let Some(settings) = self.dialog.validate() else {
            debug!("Settings form has errors: {:?}", self.dialog.errors());
            return false;
        };

        match self.settings.save(&settings) {
            Ok(()) => {
                info!("Settings saved (save path: {})", settings.save_path);
                self.dialog.close();
                true
            }
            Err(err) => {
                error!("Failed to save settings: {}", err);
                self.toasts.error(SAVE_SETTINGS_FAILED);
                false
            }
        }
    }

    pub fn cancel_settings(&mut self) {
        self.dialog.reset_and_close();
    }

    /// Apply every backend reply that has arrived. Never blocks.
    pub fn poll(&mut self) {
        let mut finished = Vec::new();
        self.pending.retain(|job| match job.receiver.try_recv() {
            Ok(outcome) => {
                finished.push(outcome);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                finished.push(job.kind.disconnected());
                false
            }
        });

        for outcome in finished {
            self.apply(outcome);
        }
    }

    /// Poll until nothing is pending or `timeout` elapses. Returns whether idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if self.pending.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn load_settings(&self) -> Option<Settings> {
        match self.settings.load() {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Ignoring unreadable settings: {}", err);
                None
            }
        }
    }

    fn spawn<F>(&mut self, kind: JobKind, job: F)
    where
        F: FnOnce(&dyn Backend) -> JobOutcome + Send + 'static,
    {
        let (tx, rx) = channel();
        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name(format!("matting-{}", kind.name()))
            .spawn(move || {
                let _ = tx.send(job(backend.as_ref()));
            });

        match spawned {
            Ok(_) => self.pending.push(PendingJob { kind, receiver: rx }),
            Err(err) => {
                error!("Failed to start {} worker: {}", kind.name(), err);
                let outcome = kind.disconnected();
                self.apply(outcome);
            }
        }
    }

    fn apply(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::ImageOpened(Ok(record)) => {
                if record.is_empty() {
                    debug!("No image selected");
                    return;
                }
                info!("Loaded source image {}", record.image_path);
                self.state.result_image = ImageRecord::default();
                self.state.source_image = record;
            }
            JobOutcome::ImageOpened(Err(err)) => {
                warn!("Opening image failed: {}", err);
            }
            JobOutcome::SavePathPicked { session, result } => match result {
                Ok(path) if path.is_empty() => debug!("No save path selected"),
                Ok(path) if !self.dialog.is_open() || self.dialog.session() != session => {
                    debug!("Dropping save path {} picked for a closed dialog", path);
                }
                Ok(path) => self.dialog.set_picked_save_path(path),
                Err(err) => warn!("Picking save path failed: {}", err),
            },
            JobOutcome::CutoutFinished { source, result } => {
                self.state.is_spinner_visible = false;
                if source != self.state.source_image.image_path {
                    debug!(
                        "Dropping cutout of {}, source is now {:?}",
                        source, self.state.source_image.image_path
                    );
                    return;
                }
                match result {
                    Ok(record) => {
                        info!("Cutout finished: {}", record.image_path);
                        self.state.result_image = record;
                        self.toasts.success(CUTOUT_SUCCEEDED);
                    }
                    Err(err) => {
                        error!("Cutout failed: {}", err);
                        self.toasts.error(ViewError::CutoutFailed.to_string());
                    }
                }
            }
        }
    }
}
