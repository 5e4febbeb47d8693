//! The editing session.
//!
//! [`EditSession`] owns the loaded document, the current [`EditRecipe`], the
//! undo history and the export settings, and is the only thing that draws to
//! the caller's [`Surface`].
//!
//! ## States
//!
//! ```text
//!            load ok                 begin_load / begin_export
//!   Empty ───────────▶ Ready ─────────────────────────────────▶ Processing
//!     ▲                  │ ▲                                        │
//!     └── delete_image ──┘ └──────── complete_load / complete_export ┘
//! ```
//!
//! While a job is in flight every mutating call fails with
//! [`EditError::OperationInProgress`]. Without a document they fail with
//! [`EditError::NoDocument`]. A failing call never changes anything.
//!
//! ## Rendering
//!
//! Every committed edit re-renders the frame from the untouched original
//! (see [`render`]), stores `(recipe, frame)` as one history entry and redraws
//! the surface. Undo and redo swap in a stored entry without rendering.
//!
//! ## Jobs
//!
//! Decode and encode run on the rayon pool. `begin_*` returns a [`Pending`]
//! handle and puts the session in `Processing`; `complete_*` waits for the
//! worker and applies its result. `load_image` and `export` do both in one call.
//! Dropping the handle abandons the result: the session stays `Processing`
//! until the worker finishes, then goes back to where it was.

use crate::config::EditorConfig;
use crate::document::{ImageDocument, decode_document};
use crate::history::{History, HistoryError};
use crate::imaging::{
    CropRect, DecodeError, EditRecipe, EncodeError, ExportOutcome, ExportSettings, FilterKind,
    FilterSettings, ImageCodec, RenderError, RenderOptions, ResizeSettings, RustCodec,
    SearchPolicy, TargetSizeUnmet, TransformOperation, export_bitmap, render, transform_crop,
    transformed_dimensions,
};
use crate::presets::find_preset;
use crate::surface::Surface;
use image::RgbaImage;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak, mpsc};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Failed to load image: {0}")]
    Decode(#[from] DecodeError),
    #[error("Failed to export image: {0}")]
    Encode(#[from] EncodeError),
    #[error("No image loaded")]
    NoDocument,
    #[error("Unknown social media preset: {0}")]
    UnknownPreset(String),
    #[error("Another operation is in progress")]
    OperationInProgress,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("{filter} must be between 0 and 100, got {value}")]
    InvalidFilterValue { filter: FilterKind, value: u8 },
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Job does not belong to this session or was already completed")]
    UnknownJob,
}

impl From<HistoryError> for EditError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NothingToUndo => Self::NothingToUndo,
            HistoryError::NothingToRedo => Self::NothingToRedo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Ready,
    Processing,
}

/// What the caller needs to refresh its controls after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Current frame dimensions, `None` without a document.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_len: usize,
}

/// One history entry: the settings and the frame they rendered to.
#[derive(Debug, Clone)]
pub struct EditSnapshot {
    pub recipe: EditRecipe,
    pub frame: Arc<RgbaImage>,
}

/// Encoded bytes ready to be written out by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    /// Suggested name, `<file_stem>.<extension>`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub warning: Option<TargetSizeUnmet>,
}

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Handle to a decode or encode running on the rayon pool.
#[derive(Debug)]
pub struct Pending<T> {
    ticket: u64,
    receiver: mpsc::Receiver<T>,
    ready: Option<T>,
    _alive: Arc<()>,
}

impl<T> Pending<T> {
    /// Check for the result without blocking.
    pub fn poll(&mut self) -> bool {
        if self.ready.is_none() {
            self.ready = self.receiver.try_recv().ok();
        }
        self.ready.is_some()
    }

    /// `None` if the worker went away without sending.
    fn wait(mut self) -> Option<T> {
        self.ready.take().or_else(|| self.receiver.recv().ok())
    }
}

pub type LoadJob = Pending<Result<ImageDocument, DecodeError>>;
pub type ExportJob = Pending<Result<ExportOutcome, EncodeError>>;

/// The job the session is waiting on.
#[derive(Debug)]
struct InFlight {
    ticket: u64,
    handle: Weak<()>,
    worker: Weak<()>,
}

impl InFlight {
    /// Blocking until claimed, or until the handle is gone and the worker is done.
    fn is_active(&self) -> bool {
        self.handle.strong_count() > 0 || self.worker.strong_count() > 0
    }
}

/// Last export, reused by `download_image` while frame and settings match.
#[derive(Debug)]
struct CachedExport {
    frame: Arc<RgbaImage>,
    settings: ExportSettings,
    outcome: ExportOutcome,
}

pub struct EditSession<'s> {
    codec: Arc<dyn ImageCodec>,
    options: RenderOptions,
    policy: SearchPolicy,
    file_stem: String,
    surface: Option<&'s mut dyn Surface>,
    document: Option<ImageDocument>,
    recipe: EditRecipe,
    history: History<EditSnapshot>,
    selected_tool: FilterKind,
    export_settings: ExportSettings,
    in_flight: Option<InFlight>,
    last_export: Option<CachedExport>,
}

impl<'s> EditSession<'s> {
    /// Session using the built-in [`RustCodec`].
    pub fn new(config: &EditorConfig) -> Self {
        let codec = RustCodec::with_avif_speed(config.export.avif_speed);
        Self::with_codec(config, Arc::new(codec))
    }

    pub fn with_codec(config: &EditorConfig, codec: Arc<dyn ImageCodec>) -> Self {
        Self {
            codec,
            options: config.render_options(),
            policy: config.search_policy(),
            file_stem: config.export.file_stem.clone(),
            surface: None,
            document: None,
            recipe: EditRecipe::default(),
            history: History::new(config.history.max_entries),
            selected_tool: FilterKind::Brightness,
            export_settings: config.default_export_settings(),
            in_flight: None,
            last_export: None,
        }
    }

    // =========================================================================
    // Surface
    // =========================================================================

    /// Attach the caller's surface and draw the current frame, if any.
    pub fn initialize_canvas(&mut self, surface: &'s mut dyn Surface) {
        self.surface = Some(surface);
        self.redraw();
    }

    /// Detach the surface, handing the borrow back.
    pub fn release_canvas(&mut self) -> Option<&'s mut dyn Surface> {
        self.surface.take()
    }

    fn redraw(&mut self) {
        if let (Some(surface), Some(document)) = (self.surface.as_deref_mut(), &self.document) {
            surface.draw(document.current());
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        if self.is_processing() {
            SessionState::Processing
        } else if self.document.is_some() {
            SessionState::Ready
        } else {
            SessionState::Empty
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.as_ref().is_some_and(InFlight::is_active)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state(),
            width: self.document.as_ref().map(ImageDocument::width),
            height: self.document.as_ref().map(ImageDocument::height),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            history_len: self.history.len(),
        }
    }

    pub fn document(&self) -> Option<&ImageDocument> {
        self.document.as_ref()
    }

    pub fn recipe(&self) -> &EditRecipe {
        &self.recipe
    }

    pub fn filters(&self) -> &FilterSettings {
        &self.recipe.filters
    }

    pub fn transforms(&self) -> &[TransformOperation] {
        &self.recipe.transforms
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.recipe.crop
    }

    /// `None` while the frame keeps its native dimensions.
    pub fn resize_settings(&self) -> Option<ResizeSettings> {
        self.recipe.resize
    }

    pub fn export_settings(&self) -> &ExportSettings {
        &self.export_settings
    }

    pub fn selected_tool(&self) -> FilterKind {
        self.selected_tool
    }

    /// Value of the selected filter, for a single slider control.
    pub fn selected_value(&self) -> u8 {
        self.recipe.filters.get(self.selected_tool)
    }

    pub fn can_undo(&self) -> bool {
        self.document.is_some() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.document.is_some() && self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // =========================================================================
    // Gates
    // =========================================================================

    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.is_processing() {
            return Err(EditError::OperationInProgress);
        }
        Ok(())
    }

    fn ensure_editable(&self) -> Result<&ImageDocument, EditError> {
        self.ensure_idle()?;
        self.document.as_ref().ok_or(EditError::NoDocument)
    }

    fn spawn<T, F>(&mut self, work: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        let alive = Arc::new(());
        let worker = Arc::new(());
        self.in_flight = Some(InFlight {
            ticket,
            handle: Arc::downgrade(&alive),
            worker: Arc::downgrade(&worker),
        });
        rayon::spawn(move || {
            // The receiver is gone only if the handle was dropped.
            let _ = sender.send(work());
            drop(worker);
        });
        Pending {
            ticket,
            receiver,
            ready: None,
            _alive: alive,
        }
    }

    fn claim<T>(&mut self, job: &Pending<T>) -> Result<(), EditError> {
        if self.in_flight.as_ref().map(|in_flight| in_flight.ticket) != Some(job.ticket) {
            return Err(EditError::UnknownJob);
        }
        self.in_flight = None;
        Ok(())
    }

    // =========================================================================
    // Load / delete
    // =========================================================================

    /// Decode `bytes` and replace the current document.
    pub fn load_image(&mut self, bytes: Vec<u8>, mime_type: &str) -> Result<SessionStatus, EditError> {
        let job = self.begin_load(bytes, mime_type)?;
        self.complete_load(job)
    }

    /// Start decoding on the worker pool. The session is `Processing` until
    /// [`complete_load`](Self::complete_load) is called with the returned job.
    pub fn begin_load(&mut self, bytes: Vec<u8>, mime_type: &str) -> Result<LoadJob, EditError> {
        self.ensure_idle()?;
        let codec = Arc::clone(&self.codec);
        let mime_type = mime_type.to_string();
        let max_dimension = self.options.max_dimension;
        debug!(len = bytes.len(), %mime_type, "load started");
        Ok(self.spawn(move || decode_document(codec.as_ref(), &bytes, &mime_type, max_dimension)))
    }

    /// Wait for a load and install the document. On failure the previous
    /// document, if any, stays loaded and untouched.
    pub fn complete_load(&mut self, job: LoadJob) -> Result<SessionStatus, EditError> {
        self.claim(&job)?;
        let document = job.wait().unwrap_or_else(|| Err(DecodeError::WorkerLost))?;
        debug!(
            width = document.width(),
            height = document.height(),
            "image loaded"
        );

        self.recipe = EditRecipe::default();
        self.history.reset(EditSnapshot {
            recipe: self.recipe.clone(),
            frame: Arc::clone(document.current()),
        });
        self.document = Some(document);
        self.last_export = None;
        self.redraw();
        Ok(self.status())
    }

    /// Drop the document and its history and blank the surface.
    pub fn delete_image(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        self.document = None;
        self.recipe = EditRecipe::default();
        self.history.clear();
        self.last_export = None;
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.clear();
        }
        debug!("image deleted");
        Ok(self.status())
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Render `recipe`, make it current and record it in history.
    fn commit(&mut self, recipe: EditRecipe) -> Result<SessionStatus, EditError> {
        let document = self.document.as_mut().ok_or(EditError::NoDocument)?;
        let frame = Arc::new(render(document.original(), &recipe, &self.options)?);
        document.set_current(Arc::clone(&frame));
        self.history.commit(EditSnapshot {
            recipe: recipe.clone(),
            frame,
        });
        self.recipe = recipe;
        self.redraw();
        debug!(
            cursor = self.history.cursor(),
            entries = self.history.len(),
            "committed edit"
        );
        Ok(self.status())
    }

    /// Choose which filter [`set_selected_filter`](Self::set_selected_filter)
    /// edits. Touches neither pixels nor history.
    pub fn select_tool(&mut self, kind: FilterKind) {
        self.selected_tool = kind;
    }

    pub fn set_filter(&mut self, kind: FilterKind, value: u8) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let mut recipe = self.recipe.clone();
        if !recipe.filters.set(kind, value) {
            return Err(EditError::InvalidFilterValue {
                filter: kind,
                value,
            });
        }
        self.commit(recipe)
    }

    pub fn set_selected_filter(&mut self, value: u8) -> Result<SessionStatus, EditError> {
        self.set_filter(self.selected_tool, value)
    }

    /// Put every filter back to neutral. Geometry is kept.
    pub fn reset_filters(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let recipe = EditRecipe {
            filters: FilterSettings::default(),
            ..self.recipe.clone()
        };
        self.commit(recipe)
    }

    /// Append a rotation or flip.
    ///
    /// An existing crop is carried through the transform so it keeps framing
    /// the same content, and a quarter turn swaps an explicit resize.
    pub fn apply_transform(&mut self, op: TransformOperation) -> Result<SessionStatus, EditError> {
        let document = self.ensure_editable()?;
        let (frame_w, frame_h) = self
            .recipe
            .transforms
            .iter()
            .fold(document.original_dimensions(), |(w, h), t| {
                transformed_dimensions(w, h, *t)
            });

        let mut recipe = self.recipe.clone();
        recipe.crop = recipe
            .crop
            .map(|rect| transform_crop(rect, frame_w, frame_h, op));
        if op.swaps_dimensions() {
            recipe.resize = recipe.resize.map(ResizeSettings::rotated);
        }
        recipe.transforms.push(op);
        self.commit(recipe)
    }

    pub fn apply_resize(&mut self, settings: ResizeSettings) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        settings.validate().map_err(EditError::InvalidSettings)?;
        let recipe = EditRecipe {
            resize: Some(settings),
            ..self.recipe.clone()
        };
        self.commit(recipe)
    }

    /// Return to the native dimensions of the (cropped) frame.
    pub fn clear_resize(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let recipe = EditRecipe {
            resize: None,
            ..self.recipe.clone()
        };
        self.commit(recipe)
    }

    /// Crop in the coordinates of the transformed, not yet resized, frame.
    pub fn apply_crop(&mut self, rect: CropRect) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let recipe = EditRecipe {
            crop: Some(rect),
            ..self.recipe.clone()
        };
        self.commit(recipe)
    }

    pub fn clear_crop(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let recipe = EditRecipe {
            crop: None,
            ..self.recipe.clone()
        };
        self.commit(recipe)
    }

    /// Resize to a preset's exact dimensions, cover-scaling and centre-cropping.
    pub fn apply_social_media_preset(&mut self, name: &str) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let preset = find_preset(name).ok_or_else(|| EditError::UnknownPreset(name.to_string()))?;
        debug!(preset = preset.name, "applying preset");
        self.apply_resize(ResizeSettings::exact_fill(preset.width, preset.height))
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn undo(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let snapshot = self.history.undo()?.clone();
        self.restore(snapshot);
        Ok(self.status())
    }

    pub fn redo(&mut self) -> Result<SessionStatus, EditError> {
        self.ensure_editable()?;
        let snapshot = self.history.redo()?.clone();
        self.restore(snapshot);
        Ok(self.status())
    }

    fn restore(&mut self, snapshot: EditSnapshot) {
        if let Some(document) = self.document.as_mut() {
            document.set_current(snapshot.frame);
        }
        self.recipe = snapshot.recipe;
        self.redraw();
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Replace the export settings. Allowed without a document.
    pub fn set_export_settings(&mut self, settings: ExportSettings) -> Result<(), EditError> {
        self.ensure_idle()?;
        settings.validate().map_err(EditError::InvalidSettings)?;
        self.export_settings = settings;
        Ok(())
    }

    /// Encode the current frame with the current export settings.
    pub fn export(&mut self) -> Result<ExportOutcome, EditError> {
        let job = self.begin_export()?;
        self.complete_export(job)
    }

    pub fn begin_export(&mut self) -> Result<ExportJob, EditError> {
        let frame = Arc::clone(self.ensure_editable()?.current());
        let codec = Arc::clone(&self.codec);
        let settings = self.export_settings;
        let policy = self.policy;
        debug!(format = ?settings.format, target = ?settings.target_bytes(), "export started");
        Ok(self.spawn(move || export_bitmap(codec.as_ref(), &frame, &settings, &policy)))
    }

    pub fn complete_export(&mut self, job: ExportJob) -> Result<ExportOutcome, EditError> {
        self.claim(&job)?;
        let outcome = job.wait().unwrap_or_else(|| Err(EncodeError::WorkerLost))?;
        debug!(
            len = outcome.len(),
            attempts = outcome.attempts,
            unmet = outcome.warning.is_some(),
            "export finished"
        );
        if let Some(document) = &self.document {
            self.last_export = Some(CachedExport {
                frame: Arc::clone(document.current()),
                settings: self.export_settings,
                outcome: outcome.clone(),
            });
        }
        Ok(outcome)
    }

    /// The bytes to save: the last export if nothing changed since, otherwise
    /// a fresh one.
    pub fn download_image(&mut self) -> Result<ExportedFile, EditError> {
        let current = Arc::clone(self.ensure_editable()?.current());
        let cached = self.last_export.as_ref().filter(|cache| {
            Arc::ptr_eq(&cache.frame, &current) && cache.settings == self.export_settings
        });
        let outcome = match cached {
            Some(cache) => {
                debug!("reusing last export");
                cache.outcome.clone()
            }
            None => self.export()?,
        };
        Ok(ExportedFile {
            file_name: format!("{}.{}", self.file_stem, outcome.format.extension()),
            mime_type: outcome.format.mime_type(),
            bytes: outcome.bytes,
            warning: outcome.warning,
        })
    }
}
