use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use newtab::api;
use newtab::assets::AssetLoader;
use newtab::models::AppConfig;
use newtab::server;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "newtab")]
#[command(about = "Newtab - bookmark grid new-tab page with favicons and background theming")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print brightness and average color of an image
    Analyze {
        /// Image file (PNG, JPEG, GIF, WebP, BMP, ...)
        file: PathBuf,
    },
    /// Resolve the favicon for a page URL using the configured cache and sources
    Favicon {
        /// Page URL
        url: String,
    },
    /// List a bookmark folder, starting from the root folder
    Bookmarks {
        /// Folder titles to descend into, in order
        path: Vec<String>,
    },
    /// Write the default config.yaml for customization
    Init {
        /// Target path (defaults to CONFIG_FILE or ./config.yaml)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Newtab API",
        description = "Bookmark grid new-tab page: favicons, background theming, bookmark browsing",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_favicon,
        api::handle_get_background,
        api::handle_set_background,
        api::handle_reset_background,
        api::handle_set_fit,
        api::handle_background_image,
        api::handle_root_folder,
        api::handle_folder,
        api::handle_update_bookmark,
    ),
    components(schemas(
        api::FaviconResponse,
        api::BackgroundResponse,
        api::FitRequest,
        newtab::rendering::Presentation,
        newtab::models::FitMode,
        newtab::models::Rgb,
        newtab::models::Bookmark,
        newtab::models::BookmarkChanges,
        newtab::models::BookmarkKind,
        newtab::services::FolderView,
        newtab::services::GridEntry,
        newtab::services::PreviewItem,
    )),
    tags(
        (name = "Favicons", description = "Favicon resolution with per-origin caching"),
        (name = "Background", description = "Background image, theming and fit"),
        (name = "Bookmarks", description = "Folder views and bookmark edits")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Analyze { file }) => run_analyze_command(&file),
        Some(Commands::Favicon { url }) => run_favicon_command(&url).await,
        Some(Commands::Bookmarks { path }) => run_bookmarks_command(&path).await,
        Some(Commands::Init { output, force }) => run_init_command(output, force),
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str, with_time: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);
    if with_time {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }
}

fn load_config() -> AppConfig {
    let loader = AssetLoader::from_env();
    AppConfig::load_from_assets(&loader).with_env_overrides()
}

/// Analyze an image file (no server needed)
fn run_analyze_command(file: &Path) -> anyhow::Result<()> {
    init_tracing("newtab=warn", false);

    let bytes = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", file.display()))?;
    let stats = newtab::rendering::analyze(&bytes)?;

    println!("File:              {}", file.display());
    println!("Average luminance: {:.2}", stats.average_luminance);
    println!("Average color:     {}", stats.average_color);
    println!(
        "Classification:    {}",
        if stats.is_dark() { "dark" } else { "light" }
    );
    Ok(())
}

/// Resolve one favicon against the persistent cache
async fn run_favicon_command(url: &str) -> anyhow::Result<()> {
    init_tracing("newtab=warn", false);

    let config = load_config();
    let state = server::create_app_state(config).await?;

    match state.favicons.resolve(Some(url)).await {
        Some(icon) => {
            println!("{}", icon.as_str());
            Ok(())
        }
        None => {
            eprintln!("No favicon found for {url}");
            std::process::exit(1);
        }
    }
}

/// Print a folder view, descending by folder titles
async fn run_bookmarks_command(path: &[String]) -> anyhow::Result<()> {
    use newtab::services::FolderNavigator;

    init_tracing("newtab=warn", false);

    let config = load_config();
    let state = server::create_app_state(config).await?;
    let browser = &state.bookmarks;

    let root = browser.root_view().await?;
    let mut nav = FolderNavigator::new(root.id.clone(), root.title.clone());
    let mut view = root;

    for title in path {
        let folder = view
            .entries
            .iter()
            .find(|e| e.kind == newtab::models::BookmarkKind::Folder && &e.title == title)
            .ok_or_else(|| anyhow::anyhow!("No folder {title:?} in {:?}", nav.current_title()))?;
        nav.enter(folder.id.clone(), folder.title.clone());
        view = browser.folder(nav.current_id()).await?;
    }

    let crumbs = if nav.can_go_back() {
        format!("{} level(s) below the root", nav.depth())
    } else {
        "root".to_string()
    };
    println!("{} ({crumbs})\n", nav.current_title());

    for entry in &view.entries {
        match &entry.url {
            Some(url) => println!("  [{}] {}  {}", entry.placeholder, entry.title, url),
            None => {
                let preview: Vec<&str> = entry.preview.iter().map(|p| p.title.as_str()).collect();
                println!("  [+] {}/  {}", entry.title, preview.join(", "));
            }
        }
    }
    if view.entries.is_empty() {
        println!("  (empty)");
    }
    Ok(())
}

fn run_init_command(output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let loader = AssetLoader::from_env();
    let target = output
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.yaml"));

    if loader.init(Some(&target), force)? {
        println!("Wrote {}", target.display());
    } else {
        println!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }
    Ok(())
}

fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let data_dir = std::env::var("DATA_DIR").ok();
    let static_dir = std::env::var("STATIC_DIR").ok();

    println!("Newtab v{VERSION}");
    println!("Bookmark grid new-tab page with favicons and background theming\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr
            .as_deref()
            .unwrap_or(&format!("{DEFAULT_BIND_ADDR} (default)"))
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  DATA_DIR    = {}",
        data_dir.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  STATIC_DIR  = {}",
        static_dir.as_deref().unwrap_or("(not set)")
    );

    let loader = AssetLoader::from_env();
    let config = AppConfig::load_from_assets(&loader).with_env_overrides();

    println!("\nConfiguration:");
    println!("  config    = {}", loader.config_source());
    println!("  data dir  = {}", config.storage.data_dir.display());
    println!(
        "  bookmarks = {}",
        config
            .bookmarks
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in empty tree".to_string())
    );
    println!("  favicon sources:");
    for source in &config.favicon.sources {
        println!("    - {}", source.name());
    }

    println!("\nCommands:");
    println!("  newtab serve             Start the HTTP server");
    println!("  newtab analyze <file>    Print image brightness and color");
    println!("  newtab favicon <url>     Resolve a favicon");
    println!("  newtab bookmarks [path]  List a bookmark folder");
    println!("  newtab init              Write config.yaml for customization");
}

async fn run_server() -> anyhow::Result<()> {
    init_tracing("newtab=debug,tower_http=debug", true);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let static_dir = std::env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./static"));

    let loader = AssetLoader::from_env();
    tracing::info!(config = %loader.config_source(), "Config source");

    let config = AppConfig::load_from_assets(&loader).with_env_overrides();
    let state = server::create_app_state(config).await?;

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // The new-tab page itself
        .fallback_service(ServeDir::new(&static_dir));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        static_dir = %static_dir.display(),
        "Newtab server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
