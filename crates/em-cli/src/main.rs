//! CLI entry point for the emote registry.
//!
//! Loads a channel's emotes from a fixture directory laid out by provider
//! and lets you inspect the result.
//!
//! # Usage
//!
//! ```bash
//! emotes [OPTIONS] <COMMAND>
//!
//! # Switch to a channel and show what each provider contributed
//! emotes switch --channel 12345 --name forsen
//!
//! # Look up an emote by name or id
//! emotes lookup catJAM --channel 12345
//!
//! # Render chat text to HTML
//! emotes render --channel 12345 "catJAM in chat Kappa"
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use em_core::{Config, Emote, SizeKey};
use em_store::{AssetStore, Badge, BadgeIndex, ElementHandle, EmoteStore, Renderer, TwitchEmoteRef};
use em_sync::{
    standard_sources, AggregationReport, Aggregator, ChannelRef, NoSubscriptions, ScopeSwitcher,
    SourceOutcome, SwitchOutcome, SwitchRequest,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Inspect channel emotes aggregated from several providers.
///
/// Provider payloads are read from a fixture directory with one
/// subdirectory per provider (`7tv`, `ffz`, `bttv`), each holding
/// `<channel id>.json` and `global.json`.
#[derive(Parser)]
#[command(name = "emotes", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true, env = "EMOTES_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Fixture directory with provider payloads.
    ///
    /// Defaults to `./fixtures` if not specified.
    #[arg(short, long, global = true, env = "EMOTES_FIXTURES")]
    fixtures: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Target channel, shared by every command.
#[derive(clap::Args)]
struct ChannelArgs {
    /// Channel id. Also the scope name its emotes are installed under.
    #[arg(long)]
    channel: String,

    /// Channel login, used in logs.
    #[arg(long, default_value = "")]
    name: String,
}

impl ChannelArgs {
    fn to_ref(&self) -> ChannelRef {
        ChannelRef::new(self.channel.clone(), self.name.clone())
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Switch to a channel and report what each provider contributed.
    Switch {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Other scope name to clear before loading.
        #[arg(long)]
        alias: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Switch to a channel, then look up an emote by name or id.
    Lookup {
        /// Emote name or id.
        query: String,

        #[command(flatten)]
        channel: ChannelArgs,

        /// Image size to resolve.
        #[arg(long, default_value = "1")]
        size: SizeKey,
    },

    /// Switch to a channel and dump every installed set as JSON.
    Dump {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Switch to a channel and render chat text to HTML.
    Render {
        #[command(flatten)]
        channel: ChannelArgs,

        /// Chat text.
        #[arg(required = true)]
        text: Vec<String>,

        /// Native emotes present in the message, as `<id>=<name>`.
        #[arg(long = "native", value_name = "ID=NAME")]
        native: Vec<String>,

        /// Author login or id, for badges.
        #[arg(long)]
        user: Option<String>,

        /// Wrap the fragment in a full HTML page.
        #[arg(long)]
        standalone: bool,

        /// Image size to use.
        #[arg(long, default_value = "1")]
        size: SizeKey,
    },
}

/// Output format for reports.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable table.
    Text,
    /// JSON.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so that
/// command output stays readable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads and validates the configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds invalid options.
fn load_config(cli: &Cli) -> color_eyre::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Resolves the fixture directory and checks that it exists.
fn fixture_dir(cli: &Cli) -> color_eyre::Result<Utf8PathBuf> {
    let path = cli
        .fixtures
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from("./fixtures"));

    if !path.exists() {
        return Err(color_eyre::eyre::eyre!(
            "Fixture directory does not exist: {path}"
        ));
    }
    if !path.is_dir() {
        return Err(color_eyre::eyre::eyre!(
            "Fixture path is not a directory: {path}"
        ));
    }
    Ok(path)
}

/// Everything a command needs.
struct App {
    store: Arc<EmoteStore>,
    switcher: ScopeSwitcher,
    assets: AssetStore,
    badges: BadgeIndex,
}

impl App {
    /// Wires the store, the standard sources and the switcher together, and
    /// loads the optional `assets.json` and `badges.json` fixtures.
    fn new(config: &Config, fixtures: &Utf8Path) -> color_eyre::Result<Self> {
        let store = Arc::new(EmoteStore::new(config.store.clone()));
        let aggregator = Aggregator::new(
            Arc::clone(&store),
            standard_sources(fixtures),
            config.aggregator,
        );
        let switcher = ScopeSwitcher::new(
            Arc::new(aggregator),
            Arc::new(NoSubscriptions),
            config.switcher,
        );

        let assets = AssetStore::new();
        if let Some(map) = read_optional::<std::collections::BTreeMap<String, String>>(
            &fixtures.join("assets.json"),
        )? {
            assets.init(map);
            debug!(assets = assets.len(), "Loaded assets");
        }

        let badges = read_optional::<Vec<Badge>>(&fixtures.join("badges.json"))?
            .map(BadgeIndex::new)
            .unwrap_or_default();
        if !badges.is_empty() {
            info!(badges = badges.len(), "Loaded badges");
        }

        Ok(Self {
            store,
            switcher,
            assets,
            badges,
        })
    }

    /// Switches to `channel`, failing if its emotes could not be loaded.
    async fn switch(
        &self,
        channel: ChannelRef,
        alias: Option<String>,
    ) -> color_eyre::Result<AggregationReport> {
        let request = SwitchRequest { channel, alias };
        let scope = request.channel.id.clone();
        match self.switcher.switch(request).await {
            SwitchOutcome::Switched(report) => {
                debug!(stats = ?self.switcher.aggregator().stats().snapshot(), "Switch complete");
                Ok(report)
            }
            SwitchOutcome::Failed(err) => {
                if let Some(report) = err.report() {
                    print_report(report);
                }
                Err(color_eyre::eyre::eyre!(
                    "Failed to load emotes for channel {scope}: {err}"
                ))
            }
            SwitchOutcome::Superseded { generation } => Err(color_eyre::eyre::eyre!(
                "Switch to {scope} (generation {generation}) was superseded"
            )),
        }
    }
}

/// Reads a JSON file if it exists.
fn read_optional<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> color_eyre::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path.as_std_path())?;
    let value = serde_json::from_str(&content)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to parse {path}: {e}"))?;
    Ok(Some(value))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Switches to a channel and prints the per-source report.
async fn run_switch(
    app: &App,
    channel: &ChannelArgs,
    alias: Option<String>,
    format: OutputFormat,
) -> color_eyre::Result<()> {
    info!(channel = %channel.channel, "Switching channel");
    let report = app.switch(channel.to_ref(), alias).await?;

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }
    Ok(())
}

/// Looks up one emote across every scope.
async fn run_lookup(
    app: &App,
    query: &str,
    channel: &ChannelArgs,
    size: SizeKey,
) -> color_eyre::Result<()> {
    #[derive(serde::Serialize)]
    struct Lookup<'a> {
        scope: &'a str,
        url: &'a str,
        emote: &'a em_core::RawEmoteRecord,
    }

    app.switch(channel.to_ref(), None).await?;

    let Some(found) = app.store.find_emote(query) else {
        return Err(color_eyre::eyre::eyre!("No emote matching '{query}'"));
    };

    let url = found.emote.cdn(size);
    let lookup = Lookup {
        scope: &found.scope,
        url: &*url,
        emote: found.emote.resolve(),
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", serde_json::to_string_pretty(&lookup)?)?;
    Ok(())
}

/// Dumps every installed set.
async fn run_dump(
    app: &App,
    channel: &ChannelArgs,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    app.switch(channel.to_ref(), None).await?;

    let sets: Vec<_> = app.store.snapshot().values().map(|set| set.resolve()).collect();
    let content = serde_json::to_string_pretty(&sets)?;

    if let Some(output_path) = output {
        std::fs::write(output_path.as_std_path(), &content)?;
        info!(path = %output_path, sets = sets.len(), "Dump written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{content}")?;
    }
    Ok(())
}

/// Options for [`run_render`].
struct RenderArgs<'a> {
    text: &'a [String],
    native: &'a [String],
    user: Option<&'a str>,
    standalone: bool,
    size: SizeKey,
}

/// Renders chat text, replacing emote words with images.
async fn run_render(app: &App, channel: &ChannelArgs, args: RenderArgs<'_>) -> color_eyre::Result<()> {
    app.switch(channel.to_ref(), None).await?;

    for entry in args.native {
        let Some((id, name)) = entry.split_once('=') else {
            warn!(native = %entry, "Ignoring native emote without '='");
            continue;
        };
        app.store.from_twitch_emote(&TwitchEmoteRef {
            emote_id: Some(id.to_owned()),
            alt: name.to_owned(),
        });
    }

    let renderer = HtmlRenderer { size: args.size };
    let mut parts = Vec::new();

    if let Some(user) = args.user {
        for badge in app.badges.badges_for(user) {
            parts.push(render_badge(badge));
        }
    }

    for word in args.text.iter().flat_map(|t| t.split_whitespace()) {
        match app.store.find_emote(word) {
            Some(found) => {
                let handle = app.store.element_for(&found.scope, &found.emote, &renderer);
                parts.push(
                    handle
                        .downcast_ref::<String>()
                        .cloned()
                        .unwrap_or_else(|| escape_html(word)),
                );
            }
            None => parts.push(escape_html(word)),
        }
    }

    let fragment = parts.join(" ");
    debug!(elements = app.store.elements().len(), "Rendered message");

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if args.standalone {
        writeln!(handle, "<!DOCTYPE html>")?;
        writeln!(handle, "<html><head><meta charset=\"utf-8\">")?;
        if let Some(logo) = app.assets.get("logo") {
            writeln!(handle, "<link rel=\"icon\" href=\"{}\">", escape_html(&logo))?;
        }
        writeln!(handle, "</head><body><p>{fragment}</p></body></html>")?;
    } else {
        writeln!(handle, "{fragment}")?;
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Renders emotes as `<img>` markup.
struct HtmlRenderer {
    size: SizeKey,
}

impl Renderer for HtmlRenderer {
    fn render(&self, emote: &Emote) -> ElementHandle {
        let class = if emote.is_zero_width() {
            "emote zero-width"
        } else {
            "emote"
        };
        let name = escape_html(emote.name());
        ElementHandle::new(format!(
            "<img class=\"{class}\" src=\"{}\" alt=\"{name}\" title=\"{name}\" data-provider=\"{}\">",
            escape_html(&emote.cdn(self.size)),
            emote.provider().slug(),
        ))
    }
}

/// Renders a badge as `<img>` markup.
fn render_badge(badge: &Badge) -> String {
    let src = badge.urls.last().map_or("", |(_, url)| url.as_str());
    format!(
        "<img class=\"badge\" src=\"{}\" alt=\"{}\" title=\"{}\">",
        escape_html(src),
        escape_html(&badge.name),
        escape_html(&badge.tooltip),
    )
}

/// Prints a per-source report table.
fn print_report(report: &AggregationReport) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Channel {}", report.scope);
    let _ = writeln!(handle, "==================");
    for source in &report.sources {
        let status = match &source.outcome {
            SourceOutcome::Loaded { records } => format!("{records} records"),
            SourceOutcome::Failed { error, .. } => format!("failed: {error}"),
        };
        let _ = writeln!(
            handle,
            "  {:<14} {:<8} {status}",
            source.source,
            source.scope.as_str()
        );
    }
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Records fetched: {}", report.total_records());
    let _ = writeln!(handle, "Emotes installed: {}", report.installed);
    let _ = writeln!(handle, "Failed sources:  {}", report.failed_count());
}

/// Escapes a string for HTML text and attribute output.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Build the application context
    let config = load_config(&cli)?;
    let fixtures = fixture_dir(&cli)?;
    let app = App::new(&config, &fixtures)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Switch {
            channel,
            alias,
            format,
        } => run_switch(&app, channel, alias.clone(), *format).await,
        Commands::Lookup {
            query,
            channel,
            size,
        } => run_lookup(&app, query, channel, *size).await,
        Commands::Dump { channel, output } => run_dump(&app, channel, output.as_deref()).await,
        Commands::Render {
            channel,
            text,
            native,
            user,
            standalone,
            size,
        } => {
            let args = RenderArgs {
                text,
                native,
                user: user.as_deref(),
                standalone: *standalone,
                size: *size,
            };
            run_render(&app, channel, args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_core::{Provider, RawEmoteRecord, Visibility};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("catJAM"), "catJAM");
    }

    #[test]
    fn test_html_renderer_marks_zero_width() {
        let renderer = HtmlRenderer { size: SizeKey::Two };
        let emote = Emote::new(
            RawEmoteRecord::new("1", "SteerR", Provider::SevenTv)
                .with_visibility(Visibility::ZERO_WIDTH)
                .with_url("2", "https://cdn/1/2x"),
        );
        let handle = renderer.render(&emote);
        let html = handle.downcast_ref::<String>().unwrap();
        assert!(html.contains("class=\"emote zero-width\""));
        assert!(html.contains("src=\"https://cdn/1/2x\""));
        assert!(html.contains("data-provider=\"7tv\""));
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "emotes",
            "render",
            "--channel",
            "12345",
            "--native",
            "25=Kappa",
            "--size",
            "3",
            "hello",
            "Kappa",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                channel,
                text,
                native,
                size,
                ..
            } => {
                assert_eq!(channel.channel, "12345");
                assert_eq!(text, ["hello", "Kappa"]);
                assert_eq!(native, ["25=Kappa"]);
                assert_eq!(size, SizeKey::Three);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_size() {
        assert!(
            Cli::try_parse_from(["emotes", "lookup", "x", "--channel", "1", "--size", "9"]).is_err()
        );
    }
}
