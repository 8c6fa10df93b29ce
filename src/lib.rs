//! Rascals is a layered trait compositor for the Rascals token collection.
//!
//! One token's trait art is stacked onto a fixed-size canvas in one of three output formats,
//! placed by a merged hierarchy of preset overrides. An [`Editor`] session wraps the pipeline:
//!
//! - Restore persisted state and apply a share link
//! - Change format, token, background and overlay through named actions
//! - Render coalesced frames, keep a bounded history and export PNGs
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod composition;
pub(crate) mod metadata;
pub(crate) mod presets;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::config::EditorConfig;
pub use crate::foundation::core::{
    Affine, Point, Rect, Rgba8, TOKEN_MAX, TOKEN_MIN, Vec2, clamp_token, parse_token,
};
pub use crate::foundation::error::{RascalsError, RascalsResult};

pub use crate::assets::cache::{ImageCache, ImageHandle, ImageLoad};
pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::json::{JsonLoadError, load_json, strip_json_comments};
pub use crate::assets::source::{
    AssetError, AssetSource, FsSource, HttpSource, MemorySource, source_for_root,
};
pub use crate::composition::format::{CustomBackground, FormatKey, FormatSpec, output_filename};
pub use crate::composition::layers::{LAYER_ORDER, LayerDef};
pub use crate::composition::scene::{BackgroundMode, Scene};
pub use crate::metadata::resolver::{
    MetadataFetchError, MetadataResolver, TraitRecord, record_from_json,
};
pub use crate::presets::resolve::resolve;
pub use crate::presets::table::{PresetOverride, PresetTable, ResolvedPreset};
pub use crate::render::compositor::{
    AUTHORING_SIZE, CompositeReport, Compositor, CompositorSettings, Placement, PlannedDraw,
};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::encode::{encode_png, png_data_url, write_png};
pub use crate::render::scheduler::RenderScheduler;
pub use crate::render::surface::{DrawCommand, FrameRGBA, RecordingSurface, Surface};
pub use crate::session::editor::{Editor, FrameOutcome, OutputMeta, Status};
pub use crate::session::history::{HISTORY_CAPACITY, History, HistorySnapshot};
pub use crate::session::persist::{FileStore, KeyValueStore, MemoryStore, STATE_KEY};
pub use crate::session::share::{SharedState, decode_share_url, encode_share_url};
pub use crate::session::state::EditingState;
