use std::cell::RefCell;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use quill_common::telemetry::{self, TelemetryConfig};
use quill_common::{HttpImageUploader, ImageBlob, ParseError, QuillConfig};
use quill_compose::{ComposeForm, DraftProps, TracingNotifier, UploadPipeline};
use quill_editor_core::{Editor, PreviewRenderer, Selection, TokenKind, insert};
use quill_renderer::{DefaultEmbedDetector, Layout, Panel, PostRecord, present};

#[derive(Parser)]
#[command(version, about = "Quill - markdown post composer", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a quill.toml config file
    #[arg(long, env = "QUILL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file the way the editor preview does
    Preview {
        file: PathBuf,

        /// Print word count and reading time to stderr
        #[arg(long)]
        stats: bool,
    },
    /// Insert a markdown token into a file's contents and print the result
    Insert {
        file: PathBuf,

        /// h1-h6, b, i, q, link or image
        #[arg(long)]
        token: TokenKind,

        /// Selection start in chars (default: end of file)
        #[arg(long)]
        start: Option<usize>,

        /// Selection end in chars (default: same as start)
        #[arg(long)]
        end: Option<usize>,
    },
    /// Validate a draft JSON file and print the submission it would produce
    Check { draft: PathBuf },
    /// Upload images to the image host and print the markdown for them
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Upload as this user instead of the configured one
        #[arg(long)]
        user: Option<String>,
    },
    /// Render a stored post record as a feed item
    Feed {
        record: PathBuf,

        /// "list" for the list layout, anything else for cards
        #[arg(long)]
        layout: Option<String>,

        /// Open one of the detail panels
        #[arg(long, value_enum)]
        panel: Option<PanelArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PanelArg {
    Comments,
    Likes,
    Payout,
}

impl From<PanelArg> for Panel {
    fn from(arg: PanelArg) -> Self {
        match arg {
            PanelArg::Comments => Panel::Comments,
            PanelArg::Likes => Panel::Likes,
            PanelArg::Payout => Panel::Payout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    dotenvy::dotenv().ok();
    telemetry::init(TelemetryConfig::from_env("quill"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => QuillConfig::load(path)?,
        None => QuillConfig::default(),
    };

    match cli.command {
        Commands::Preview { file, stats } => preview(&file, stats, &config)?,
        Commands::Insert {
            file,
            token,
            start,
            end,
        } => insert_token(&file, token, start, end)?,
        Commands::Check { draft } => check(&draft, &config)?,
        Commands::Upload { files, user } => upload(files, user, config).await?,
        Commands::Feed {
            record,
            layout,
            panel,
        } => feed(&record, layout, panel, &config)?,
    }

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read {}", path.display()))
}

fn preview(file: &Path, stats: bool, config: &QuillConfig) -> Result<()> {
    let source = read(file)?;
    let mut editor = Editor::with_config(PreviewRenderer::new(), config.editor.clone());
    editor.attach(&source);

    print!("{}", editor.html());
    if stats {
        eprintln!("{} ({} rows)", editor.reading_stats(), editor.rows());
    }
    Ok(())
}

fn insert_token(file: &Path, token: TokenKind, start: Option<usize>, end: Option<usize>) -> Result<()> {
    let source = read(file)?;
    let start = start.unwrap_or_else(|| source.chars().count());
    let selection = Selection::new(start, end.unwrap_or(start));

    let (out, next) = insert(&source, selection, token);
    print!("{}", out);
    eprintln!("selection: {}", next);
    Ok(())
}

fn check(path: &Path, config: &QuillConfig) -> Result<()> {
    let source = read(path)?;
    let props: DraftProps = serde_json::from_str(&source).map_err(|e| {
        ParseError::json(e, path.display().to_string(), source.clone())
            .with_advice("expected a draft object: title, topics, body, reward, upvote, draftId")
    })?;

    let editor = Editor::with_config(PreviewRenderer::new(), config.editor.clone());
    let mut form = ComposeForm::new(editor, props);
    form.mount();

    let submission = form.check()?;
    println!("{}", serde_json::to_string_pretty(&submission).into_diagnostic()?);
    Ok(())
}

async fn upload(files: Vec<PathBuf>, user: Option<String>, config: QuillConfig) -> Result<()> {
    let mut upload_config = config.upload;
    if let Some(user) = user {
        upload_config.username = user;
    }

    let mut blobs = Vec::with_capacity(files.len());
    for path in &files {
        let data = tokio::fs::read(path)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        blobs.push(ImageBlob::sniffed(name, data));
    }

    let uploader = HttpImageUploader::new(&upload_config)?;
    tracing::info!(endpoint = %uploader.endpoint(), files = blobs.len(), "uploading");
    let mut pipeline = UploadPipeline::with_config(uploader, TracingNotifier, &upload_config);
    let mut editor = Editor::with_config(PreviewRenderer::new(), config.editor);
    editor.attach("");
    let editor = RefCell::new(editor);

    let report = pipeline.upload_batch(&editor, blobs).await;
    print!("{}", editor.borrow().body().unwrap_or_default());

    let missing = report.failed + report.rejected;
    if missing > 0 {
        return Err(miette::miette!(
            "{} of {} images were not uploaded",
            missing,
            files.len()
        ));
    }
    Ok(())
}

fn feed(path: &Path, layout: Option<String>, panel: Option<PanelArg>, config: &QuillConfig) -> Result<()> {
    let source = read(path)?;
    let post: PostRecord = serde_json::from_str(&source)
        .map_err(|e| ParseError::json(e, path.display().to_string(), source.clone()))?;

    let layout = Layout::from_app_layout(layout.as_deref().unwrap_or(&config.feed.layout));
    let panel = panel.map(Panel::from).unwrap_or_default();
    let item = present(&post, layout, panel, &DefaultEmbedDetector, &config.feed);
    print!("{}", item.to_html());
    Ok(())
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
