use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use rascals::{
    BackgroundMode, Editor, EditorConfig, FileStore, FormatKey, FrameOutcome, KeyValueStore,
    MemoryStore,
};

#[derive(Parser, Debug)]
#[command(name = "rascals", version, about = "Headless Rascals editor")]
struct Cli {
    /// JSON config file; flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Asset root: local directory or http(s) base URL.
    #[arg(long, global = true)]
    asset_root: Option<String>,

    /// File persisting editor state between runs.
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Keep state in memory only.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Log level (RUST_LOG takes precedence).
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply actions, render and export a PNG.
    Render(RenderArgs),
    /// Print the resolved character placement for the current state.
    Resolve(EditArgs),
    /// Apply actions and print the share link without rendering.
    Link(EditArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    edit: EditArgs,

    /// Directory the PNG is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Share link to apply on top of the persisted state.
    #[arg(long)]
    url: Option<Url>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    #[arg(long)]
    token: Option<i64>,

    /// Move the token by this many steps.
    #[arg(long, allow_hyphen_values = true)]
    step_token: Option<i64>,

    #[arg(long)]
    shuffle_token: bool,

    #[arg(long, value_enum)]
    background: Option<BackgroundArg>,

    /// Custom background file of the active format.
    #[arg(long)]
    custom: Option<String>,

    /// Step through the custom background catalog.
    #[arg(long, allow_hyphen_values = true)]
    step_background: Option<isize>,

    #[arg(long)]
    shuffle_background: bool,

    /// Per-body overlay on/off.
    #[arg(long, action = clap::ArgAction::Set)]
    overlay: Option<bool>,

    /// Restore history entry N (0 = newest) of this run after the first render.
    #[arg(long)]
    restore: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Square,
    Phonesaver,
    Raid,
}

impl From<FormatArg> for FormatKey {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Square => FormatKey::Square,
            FormatArg::Phonesaver => FormatKey::PhoneSaver,
            FormatArg::Raid => FormatKey::Raid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackgroundArg {
    Nft,
    Custom,
    None,
}

impl From<BackgroundArg> for BackgroundMode {
    fn from(v: BackgroundArg) -> Self {
        match v {
            BackgroundArg::Nft => BackgroundMode::FromToken,
            BackgroundArg::Custom => BackgroundMode::Custom,
            BackgroundArg::None => BackgroundMode::Disabled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(v: LogLevel) -> Self {
        match v {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(cli.log_level).into())
        .from_env_lossy();
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    let store: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(config.storage_path.clone()))
    };

    match cli.cmd {
        Command::Render(args) => cmd_render(config, store, args).await,
        Command::Resolve(args) => cmd_resolve(config, store, args).await,
        Command::Link(args) => cmd_link(config, store, args).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => EditorConfig::default(),
    };
    if let Some(root) = &cli.asset_root {
        config.asset_root = root.clone();
    }
    if let Some(state) = &cli.state {
        config.storage_path = state.clone();
    }
    config.validate().context("invalid config")?;
    Ok(config)
}

async fn open_editor(
    config: EditorConfig,
    store: Arc<dyn KeyValueStore>,
    args: &EditArgs,
) -> anyhow::Result<Editor> {
    let source = config.asset_source();
    let mut editor = Editor::open(config, source, store, args.url.as_ref())
        .await
        .context("open editor session")?;

    if let Some(format) = args.format {
        editor.select_format(format.into());
    }
    if let Some(token) = args.token {
        editor.set_token(token);
    }
    if let Some(delta) = args.step_token {
        editor.step_token(delta);
    }
    if args.shuffle_token {
        editor.shuffle_token();
    }
    if let Some(mode) = args.background {
        editor.set_background_mode(mode.into());
    }
    if let Some(file) = &args.custom {
        editor
            .select_custom_background(file)
            .context("select custom background")?;
    }
    if let Some(delta) = args.step_background {
        editor.step_background(delta);
    }
    if args.shuffle_background {
        editor.shuffle_background();
    }
    if let Some(on) = args.overlay {
        editor.set_overlay(on);
    }
    Ok(editor)
}

async fn render_pending(editor: &mut Editor) -> anyhow::Result<()> {
    match editor.settle().await.context("render")? {
        FrameOutcome::Missing(e) => Err(anyhow::Error::new(e).context("token metadata missing")),
        FrameOutcome::Rendered(_) | FrameOutcome::Idle => Ok(()),
    }
}

async fn cmd_render(
    config: EditorConfig,
    store: Arc<dyn KeyValueStore>,
    args: RenderArgs,
) -> anyhow::Result<()> {
    let mut editor = open_editor(config, store, &args.edit).await?;
    render_pending(&mut editor).await?;

    if let Some(index) = args.edit.restore {
        editor.restore_history(index).context("restore history")?;
        render_pending(&mut editor).await?;
    }

    let path = editor
        .export(&args.out_dir)
        .with_context(|| format!("export into '{}'", args.out_dir.display()))?;
    print_summary(&editor, Some(&path));
    Ok(())
}

async fn cmd_resolve(
    config: EditorConfig,
    store: Arc<dyn KeyValueStore>,
    args: EditArgs,
) -> anyhow::Result<()> {
    let mut editor = open_editor(config, store, &args).await?;
    let report = match editor.settle().await.context("render")? {
        FrameOutcome::Rendered(report) => report,
        FrameOutcome::Missing(e) => {
            return Err(anyhow::Error::new(e).context("token metadata missing"));
        }
        FrameOutcome::Idle => anyhow::bail!("nothing was rendered"),
    };
    let out = serde_json::json!({
        "format": editor.state().format,
        "token": editor.state().token,
        "backgroundMode": editor.state().background,
        "preset": report.preset,
        "drawn": report.drawn,
        "skipped": report.skipped.iter().map(|(loc, _)| loc).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn cmd_link(
    config: EditorConfig,
    store: Arc<dyn KeyValueStore>,
    args: EditArgs,
) -> anyhow::Result<()> {
    let editor = open_editor(config, store, &args).await?;
    println!("{}", editor.share_url());
    Ok(())
}

fn print_summary(editor: &Editor, written: Option<&Path>) {
    let meta = editor.output_meta();
    if let Some(path) = written {
        println!("wrote {}", path.display());
    }
    println!("{} · {} · {}", meta.name, meta.size, meta.background);
    println!("background: {}", editor.background_label());
    println!("status: {}", editor.status());
    println!("share: {}", editor.share_url());
    for (layer, value) in editor.traits_listing() {
        println!("  {layer}: {value}");
    }
    for (i, snap) in editor.history().iter().enumerate() {
        println!("history[{i}]: {}", snap.label());
    }
}
