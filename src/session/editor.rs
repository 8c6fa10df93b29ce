use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::assets::cache::ImageCache;
use crate::assets::source::AssetSource;
use crate::composition::format::{FormatKey, output_filename};
use crate::composition::layers::{
    BACKGROUND_LAYER, BODY_LAYER, LAYER_ORDER, OVERLAY_FOLDER, is_drawable,
};
use crate::composition::scene::BackgroundMode;
use crate::foundation::config::EditorConfig;
use crate::foundation::error::{RascalsError, RascalsResult};
use crate::metadata::resolver::{MetadataFetchError, MetadataResolver};
use crate::presets::table::PresetTable;
use crate::render::compositor::{CompositeReport, Compositor, CompositorSettings};
use crate::render::cpu::CpuSurface;
use crate::render::encode::{encode_png, write_png};
use crate::render::scheduler::RenderScheduler;
use crate::session::history::{History, HistorySnapshot};
use crate::session::persist::{KeyValueStore, load_state, save_state};
use crate::session::share::{apply_shared, decode_share_url, encode_share_url};
use crate::session::state::EditingState;

/// Placeholder shown for a layer without a value.
pub const MISSING_TRAIT: &str = "—";

/// Progress of the current build, as shown in the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading { token: u32 },
    Compositing { token: u32 },
    Ready { token: u32, skipped: usize },
    Missing { token: u32, reason: String },
    Failed { reason: String },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Idle"),
            Status::Loading { .. } => f.write_str("Loading metadata…"),
            Status::Compositing { .. } => f.write_str("Compositing…"),
            Status::Ready { token, skipped: 0 } => write!(f, "Built #{token} · ready"),
            Status::Ready { token, skipped } => {
                write!(f, "Built #{token} · ready ({skipped} layers missing)")
            }
            Status::Missing { token, reason } => write!(f, "Missing #{token} · {reason}"),
            Status::Failed { reason } => write!(f, "Failed · {reason}"),
        }
    }
}

/// Result of one frame tick.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Nothing was scheduled.
    Idle,
    Rendered(CompositeReport),
    /// Metadata for the active token could not be resolved; nothing was drawn.
    Missing(MetadataFetchError),
}

/// Header shown above the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputMeta {
    pub name: String,
    pub size: String,
    pub background: String,
}

/// One editing session: state, persistence, share link, render loop and history.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    state: EditingState,
    store: Arc<dyn KeyValueStore>,
    scheduler: RenderScheduler,
    resolver: MetadataResolver,
    compositor: Compositor,
    history: History,
    status: Status,
    share_base: Url,
    share_url: Url,
    last_png: Option<Arc<[u8]>>,
}

impl Editor {
    /// Start a session: restore persisted state, apply `share` on top, load presets and
    /// schedule the first render.
    #[tracing::instrument(skip(config, source, store))]
    pub async fn open(
        config: EditorConfig,
        source: Arc<dyn AssetSource>,
        store: Arc<dyn KeyValueStore>,
        share: Option<&Url>,
    ) -> RascalsResult<Self> {
        config.validate()?;
        let share_base = Url::parse(&config.share_base_url)
            .map_err(|e| RascalsError::validation(format!("share_base_url: {e}")))?;

        let mut state = load_state(store.as_ref());
        if let Some(shared) = share.and_then(decode_share_url) {
            apply_shared(&mut state, &shared);
        }
        save_state(store.as_ref(), &state);

        state.presets = PresetTable::load_or_default(
            source.as_ref(),
            &config.presets_location,
            config.fetch_timeout(),
        )
        .await;

        let resolver = MetadataResolver::new(
            source.clone(),
            config.metadata_template.clone(),
            config.fetch_timeout(),
        );
        let compositor = Compositor::new(
            Arc::new(ImageCache::new(source)),
            CompositorSettings {
                layers_base: config.layers_base.clone(),
                custom_backgrounds_base: config.custom_backgrounds_base.clone(),
                base_fill: config.base_fill,
            },
        );

        let share_url = encode_share_url(&share_base, &state);
        let editor = Self {
            config,
            state,
            store,
            scheduler: RenderScheduler::new(),
            resolver,
            compositor,
            history: History::new(),
            status: Status::Idle,
            share_base,
            share_url,
            last_png: None,
        };
        editor.scheduler.schedule();
        tracing::info!(
            format = %editor.state.format,
            token = editor.state.token,
            background = editor.state.background.as_str(),
            "editor session opened"
        );
        Ok(editor)
    }

    pub fn state(&self) -> &EditingState {
        &self.state
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn share_url(&self) -> &Url {
        &self.share_url
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// PNG bytes of the latest successful render.
    pub fn last_png(&self) -> Option<&[u8]> {
        self.last_png.as_deref()
    }

    fn committed(&mut self, changed: bool) -> bool {
        if changed {
            save_state(self.store.as_ref(), &self.state);
            self.share_url = encode_share_url(&self.share_base, &self.state);
            self.scheduler.schedule();
        }
        changed
    }

    pub fn select_format(&mut self, format: FormatKey) -> bool {
        let changed = self.state.set_format(format);
        self.committed(changed)
    }

    pub fn set_token(&mut self, id: i64) -> bool {
        let changed = self.state.set_token(id);
        self.committed(changed)
    }

    pub fn step_token(&mut self, delta: i64) -> bool {
        let changed = self.state.step_token(delta);
        self.committed(changed)
    }

    pub fn shuffle_token(&mut self) -> bool {
        let changed = self.state.shuffle_token(&mut rand::thread_rng());
        self.committed(changed)
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) -> bool {
        let changed = self.state.set_background_mode(mode);
        self.committed(changed)
    }

    /// Pick a catalog background for the active format. Does not change the background mode.
    pub fn select_custom_background(&mut self, file: &str) -> RascalsResult<bool> {
        let spec = self.state.format.spec();
        if spec.background(file).is_none() {
            return Err(RascalsError::validation(format!(
                "'{file}' is not a {} background",
                spec.name
            )));
        }
        let changed = self.state.select_custom(file);
        Ok(self.committed(changed))
    }

    pub fn step_background(&mut self, delta: isize) -> bool {
        let changed = self.state.step_background(delta);
        self.committed(changed)
    }

    pub fn shuffle_background(&mut self) -> bool {
        let changed = self.state.shuffle_background(&mut rand::thread_rng());
        self.committed(changed)
    }

    pub fn set_overlay(&mut self, on: bool) -> bool {
        let changed = self.state.set_overlay(on);
        self.committed(changed)
    }

    /// Apply a share link on top of the current state.
    pub fn apply_share_url(&mut self, url: &Url) -> bool {
        let Some(shared) = decode_share_url(url) else {
            return false;
        };
        let before = self.state.clone();
        apply_shared(&mut self.state, &shared);
        let changed = before != self.state;
        self.committed(changed)
    }

    /// Put the editor back into the state of history entry `index` (0 = newest).
    pub fn restore_history(&mut self, index: usize) -> RascalsResult<()> {
        let snap = self.history.get(index).cloned().ok_or_else(|| {
            RascalsError::validation(format!(
                "history has {} entries, no entry {index}",
                self.history.len()
            ))
        })?;
        self.state.format = snap.format;
        self.state.token = snap.token;
        self.state.background = snap.background;
        self.state.overlay = snap.overlay;
        if snap.background == BackgroundMode::Custom
            && let Some(file) = snap.custom_file
        {
            self.state.selected_custom.insert(snap.format, file);
        }
        self.committed(true);
        Ok(())
    }

    /// Render now if a render is pending.
    pub async fn on_frame(&mut self) -> RascalsResult<FrameOutcome> {
        if !self.scheduler.take() {
            return Ok(FrameOutcome::Idle);
        }
        self.render_now().await
    }

    /// Wait for the next scheduled render, let the frame interval pass, then render.
    pub async fn next_frame(&mut self) -> RascalsResult<FrameOutcome> {
        self.scheduler.wait().await;
        tokio::time::sleep(self.config.frame_interval()).await;
        self.on_frame().await
    }

    /// Run frames until nothing is pending; returns the last outcome.
    pub async fn settle(&mut self) -> RascalsResult<FrameOutcome> {
        let mut last = FrameOutcome::Idle;
        while self.scheduler.is_pending() {
            last = self.next_frame().await?;
        }
        Ok(last)
    }

    #[tracing::instrument(skip(self), fields(token = self.state.token, format = %self.state.format))]
    async fn render_now(&mut self) -> RascalsResult<FrameOutcome> {
        let token = self.state.token;

        let record_is_current = self
            .state
            .last_record
            .as_ref()
            .is_some_and(|r| r.id == token);
        if !record_is_current {
            self.status = Status::Loading { token };
            match self.resolver.fetch_record(token).await {
                Ok(record) => self.state.last_record = Some(record),
                Err(e) => {
                    tracing::warn!(token, error = %e, "metadata missing; composite skipped");
                    self.state.last_record = None;
                    self.status = Status::Missing {
                        token: e.id(),
                        reason: e.to_string(),
                    };
                    return Ok(FrameOutcome::Missing(e));
                }
            }
        }
        let Some(record) = self.state.last_record.clone() else {
            return Ok(FrameOutcome::Idle);
        };

        self.status = Status::Compositing { token };
        let scene = self.state.scene();
        let spec = scene.format.spec();
        let composite = async {
            let mut surface = CpuSurface::new(spec.width, spec.height)?;
            let report = self
                .compositor
                .render(&mut surface, &scene, &self.state.presets, &record)
                .await?;
            let png = encode_png(&surface.finish())?;
            Ok::<_, RascalsError>((report, png))
        };
        let (report, png) = match composite.await {
            Ok(out) => out,
            Err(e) => {
                self.status = Status::Failed {
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };

        let png: Arc<[u8]> = Arc::from(png);
        self.history.push(HistorySnapshot {
            png: png.clone(),
            token,
            format: scene.format,
            background: scene.background,
            custom_file: scene.custom_background().map(str::to_string),
            overlay: scene.overlay,
        });
        self.last_png = Some(png);
        self.share_url = encode_share_url(&self.share_base, &self.state);
        self.status = Status::Ready {
            token,
            skipped: report.skipped.len(),
        };
        tracing::info!(drawn = report.drawn.len(), skipped = report.skipped.len(), "render ready");
        Ok(FrameOutcome::Rendered(report))
    }

    /// File name the current render exports under.
    pub fn export_filename(&self) -> String {
        output_filename(&self.config.output_prefix, self.state.token, self.state.format)
    }

    /// Write the latest render into `dir`; returns the written path.
    pub fn export(&self, dir: &Path) -> RascalsResult<PathBuf> {
        let png = self
            .last_png
            .as_deref()
            .ok_or_else(|| RascalsError::validation("nothing rendered yet"))?;
        let path = dir.join(self.export_filename());
        write_png(&path, png)?;
        tracing::info!(path = %path.display(), "render exported");
        Ok(path)
    }

    /// Layer → value rows for the active token; `—` marks empty layers.
    pub fn traits_listing(&self) -> Vec<(String, String)> {
        let value_of = |key: &str| -> String {
            self.state
                .last_record
                .as_ref()
                .and_then(|r| r.get(key))
                .filter(|v| is_drawable(Some(*v)))
                .map(str::to_string)
                .unwrap_or_else(|| MISSING_TRAIT.to_string())
        };
        let mut rows: Vec<(String, String)> = LAYER_ORDER
            .iter()
            .filter(|l| l.key != BACKGROUND_LAYER)
            .map(|l| (l.key.to_string(), value_of(l.key)))
            .collect();
        if self.state.overlay {
            rows.push((OVERLAY_FOLDER.to_string(), value_of(BODY_LAYER)));
        }
        rows
    }

    pub fn output_meta(&self) -> OutputMeta {
        let spec = self.state.format.spec();
        let background = match self.state.background {
            BackgroundMode::Custom => {
                format!("Custom BG: {}", self.state.custom_for(self.state.format))
            }
            BackgroundMode::Disabled => "No Background".to_string(),
            BackgroundMode::FromToken => "NFT Background".to_string(),
        };
        OutputMeta {
            name: format!("{} #{}", spec.name, self.state.token),
            size: format!("{} × {}", spec.width, spec.height),
            background,
        }
    }

    pub fn background_label(&self) -> &'static str {
        self.state.background_label()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
