//! Mentorgraph CLI: command-line front end for the mentorship graph
//!
//! Connects to a running mentorship API through `RemoteClient` and renders the
//! same filtered dataset as a table, a gallery or a laid-out graph.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use mentorgraph::view::{SortKey, TableSort};
use mentorgraph::{
    Config, Dataset, FileChannel, FilterCriteria, GraphCommand, PersonId, RefreshKind, RefreshOutcome,
    RemoteClient, Rendered, Role, RoleScope, SyncController, SyncNotice, Tag, TagAssigner, ViewCoordinator, ViewMode,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::Level;

#[derive(Parser)]
#[command(name = "mentorgraph", version, about = "Mentorship relationship graph CLI")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, global = true, env = "MENTORGRAPH_URL")]
    url: Option<String>,

    /// YAML configuration file
    #[arg(long, global = true, env = "MENTORGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Free-text search over name, email, university and mentor name
    #[arg(long, global = true)]
    search: Option<String>,

    /// Which roles to keep: all, mentor or mentee
    #[arg(long, global = true)]
    scope: Option<RoleScope>,

    #[arg(long, global = true)]
    university: Option<String>,

    /// Mentor name (applies to mentees)
    #[arg(long, global = true)]
    mentor: Option<String>,

    /// Tag id or name
    #[arg(long, global = true)]
    has_tag: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_term: self.search.clone(),
            role: self.scope.unwrap_or_default(),
            university: self.university.clone(),
            mentor_name: self.mentor.clone(),
            tag: self.has_tag.clone(),
        }
    }
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Mentor table with expandable mentee rows
    Table {
        /// Mentor id to expand (repeatable)
        #[arg(long, value_name = "ID")]
        expand: Vec<String>,

        /// name, university or degree
        #[arg(long, default_value = "name")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// One card per person
    Gallery,
    /// Spider layout positions after applying graph commands
    Graph {
        /// zoomIn, zoomOut, center, fit or reset (repeatable, default fit)
        #[arg(long = "cmd", value_name = "COMMAND")]
        commands: Vec<GraphCommand>,
    },
    /// Replace a person's tag set
    Tags {
        /// Person id
        id: String,

        /// mentor or mentee
        #[arg(long)]
        role: Role,

        /// Tag id to assign (repeatable; none clears the set)
        #[arg(long = "tag", value_name = "TAG_ID")]
        tags: Vec<String>,

        /// Cross-tab marker file to notify other sessions
        #[arg(long)]
        marker: Option<PathBuf>,
    },
    /// Poll for changes and print banners
    Watch {
        /// Poll period in seconds (defaults to the config value)
        #[arg(long)]
        interval: Option<u64>,

        /// Cross-tab marker file shared with other sessions
        #[arg(long)]
        marker: Option<PathBuf>,

        /// Apply new data as soon as it is announced
        #[arg(long)]
        apply: bool,
    },
    /// Relationship graph statistics
    Stats,
}

/// One connected session: client, views and sync controller
struct Session {
    client: Arc<RemoteClient>,
    coordinator: Arc<RwLock<ViewCoordinator>>,
    sync: Arc<SyncController>,
    config: Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let marker = match &cli.command {
        Commands::Tags { marker, .. } | Commands::Watch { marker, .. } => marker.clone(),
        _ => None,
    };
    let session = open(&cli, marker).await?;

    match cli.command {
        Commands::Table { expand, sort, desc } => run_table(&session, expand, sort, desc, &cli.format).await,
        Commands::Gallery => run_gallery(&session, &cli.format).await,
        Commands::Graph { commands } => run_graph(&session, commands, &cli.format).await,
        Commands::Tags { id, role, tags, .. } => run_tags(&session, id, role, tags, &cli.format).await,
        Commands::Watch { interval, apply, .. } => run_watch(&session, interval, apply).await,
        Commands::Stats => run_stats(&session, &cli.format).await,
    }
}

async fn open(cli: &Cli, marker: Option<PathBuf>) -> Result<Session> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(url) = &cli.url {
        config.api.base_url = url.clone();
    }

    let client = Arc::new(RemoteClient::new(config.api.clone())?);
    let coordinator = Arc::new(RwLock::new(ViewCoordinator::new(&config)));
    coordinator.write().await.set_criteria(cli.filters.criteria());

    let mut sync = SyncController::new(client.clone(), coordinator.clone());
    if let Some(path) = marker.or_else(|| config.sync.marker_path.clone()) {
        sync = sync.with_channel(Arc::new(FileChannel::new(path)));
    }
    let sync = Arc::new(sync);

    if let RefreshOutcome::Failed(message) = sync.refresh(RefreshKind::Manual).await {
        bail!("could not load data from {}: {}", client.base_url(), message);
    }

    Ok(Session {
        client,
        coordinator,
        sync,
        config,
    })
}

async fn render(session: &Session, mode: ViewMode) -> Rendered {
    let mut coordinator = session.coordinator.write().await;
    coordinator.set_mode(mode);
    if mode == ViewMode::Spider {
        coordinator.load_graph();
    }
    coordinator.render()
}

async fn run_table(
    session: &Session,
    expand: Vec<String>,
    sort: SortKey,
    descending: bool,
    format: &OutputFormat,
) -> Result<()> {
    {
        let mut coordinator = session.coordinator.write().await;
        for id in &expand {
            coordinator.toggle_expanded(&PersonId::new(id.as_str()));
        }
        coordinator.set_sort(TableSort { key: sort, descending });
    }

    let Rendered::Table(page) = render(session, ViewMode::Table).await else {
        bail!("table view unavailable");
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let mut rows = Vec::new();
    for row in &page.mentors {
        rows.push(vec![
            "mentor".to_string(),
            row.mentor.id.to_string(),
            row.mentor.name.clone(),
            row.mentor.university.clone().unwrap_or_default(),
            row.degree.to_string(),
            tag_names(&row.mentor.tags),
        ]);
        for mentee in &row.mentees {
            rows.push(vec![
                "  mentee".to_string(),
                mentee.id.to_string(),
                format!("  {}", mentee.name),
                mentee.university.clone().unwrap_or_default(),
                String::new(),
                tag_names(&mentee.tags),
            ]);
        }
    }
    for row in &page.mentees {
        rows.push(vec![
            "mentee".to_string(),
            row.mentee.id.to_string(),
            row.mentee.name.clone(),
            row.mentee.university.clone().unwrap_or_default(),
            row.mentor_name.clone().unwrap_or_else(|| "unassigned".to_string()),
            tag_names(&row.mentee.tags),
        ]);
    }

    print_rows(&["role", "id", "name", "university", "mentees/mentor", "tags"], rows, format);
    Ok(())
}

async fn run_gallery(session: &Session, format: &OutputFormat) -> Result<()> {
    let Rendered::Gallery(cards) = render(session, ViewMode::Gallery).await else {
        bail!("gallery view unavailable");
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    let rows = cards
        .iter()
        .map(|card| {
            vec![
                card.key.to_string(),
                card.name.clone(),
                card.university.clone().unwrap_or_default(),
                card.caption.clone(),
                tag_names(&card.tags),
            ]
        })
        .collect();
    print_rows(&["key", "name", "university", "caption", "tags"], rows, format);
    Ok(())
}

async fn run_graph(session: &Session, commands: Vec<GraphCommand>, format: &OutputFormat) -> Result<()> {
    let commands = if commands.is_empty() {
        vec![GraphCommand::Fit]
    } else {
        commands
    };

    {
        let mut coordinator = session.coordinator.write().await;
        coordinator.set_mode(ViewMode::Spider);
        coordinator.load_graph();
        for command in commands {
            coordinator.commands().publish(command);
        }
    }

    let Rendered::Graph(frame) = render(session, ViewMode::Spider).await else {
        bail!("graph view unavailable");
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    let rows = frame
        .nodes
        .iter()
        .map(|node| {
            vec![
                node.key.to_string(),
                node.label.clone(),
                format!("{:.1}", node.position.x),
                format!("{:.1}", node.position.y),
                format!("{:.1}", node.radius),
            ]
        })
        .collect();
    print_rows(&["node", "label", "x", "y", "radius"], rows, format);
    if let OutputFormat::Table = format {
        println!(
            "{} edge(s), scale {:.3}, translate ({:.1}, {:.1})",
            frame.edges.len(),
            frame.scale,
            frame.translate.x,
            frame.translate.y
        );
    }
    Ok(())
}

async fn run_tags(session: &Session, id: String, role: Role, tag_ids: Vec<String>, format: &OutputFormat) -> Result<()> {
    let tags = {
        let coordinator = session.coordinator.read().await;
        resolve_tags(coordinator.dataset(), &tag_ids)
    };

    let assigner = TagAssigner::new(session.client.clone(), session.coordinator.clone())
        .with_announcer(session.sync.announcer());
    let confirmed = assigner.assign_tags(&PersonId::new(id.as_str()), role, tags).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&confirmed)?),
        _ => {
            let rows = confirmed
                .iter()
                .map(|t| vec![t.id.to_string(), t.name.clone(), t.color.clone()])
                .collect();
            print_rows(&["id", "name", "color"], rows, format);
        }
    }
    Ok(())
}

async fn run_watch(session: &Session, interval: Option<u64>, apply: bool) -> Result<()> {
    let interval = interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or_else(|| session.config.sync.poll_interval())
        .context("polling is disabled; pass --interval")?;

    let mut notices = session.sync.notices().subscribe();
    let poller = Arc::clone(&session.sync).spawn_polling(interval);
    println!("Watching {} every {}s (Ctrl-C to stop)", session.client.base_url(), interval.as_secs());

    loop {
        tokio::select! {
            notice = notices.recv() => {
                let Some(notice) = notice else { break };
                println!("[{}] {}", notice_label(notice), notice);
                if apply {
                    let applied = match notice {
                        SyncNotice::NewDataAvailable => session.sync.apply_pending().await,
                        SyncNotice::ChangedElsewhere => session.sync.confirm_banner().await == RefreshOutcome::Applied,
                    };
                    if applied {
                        let coordinator = session.coordinator.read().await;
                        let dataset = coordinator.dataset();
                        println!("Applied: {} mentor(s), {} mentee(s)", dataset.mentors.len(), dataset.mentees.len());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.abort();
    Ok(())
}

async fn run_stats(session: &Session, format: &OutputFormat) -> Result<()> {
    let stats = {
        let coordinator = session.coordinator.read().await;
        coordinator.workspace().graph().statistics()
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => {
            println!("Mentors:    {}", stats.mentor_count);
            println!("Mentees:    {}", stats.mentee_count);
            println!("Edges:      {}", stats.edge_count);
            println!("Unassigned: {}", stats.unassigned_count);
            println!("Max degree: {}", stats.max_degree);
        }
    }
    Ok(())
}

fn notice_label(notice: SyncNotice) -> &'static str {
    match notice {
        SyncNotice::NewDataAvailable => "new data",
        SyncNotice::ChangedElsewhere => "changed elsewhere",
    }
}

/// Look tag ids up among the tags already in use; unknown ids are sent as-is
/// and the server decides
fn resolve_tags(dataset: &Dataset, ids: &[String]) -> Vec<Tag> {
    let known: Vec<&Tag> = dataset
        .mentors
        .iter()
        .flat_map(|m| m.tags.iter())
        .chain(dataset.mentees.iter().flat_map(|m| m.tags.iter()))
        .collect();
    ids.iter()
        .map(|id| {
            known
                .iter()
                .find(|t| t.id.as_str() == id.as_str())
                .map(|t| (*t).clone())
                .unwrap_or_else(|| Tag::new(id.as_str(), id.as_str(), ""))
        })
        .collect()
}

fn tag_names(tags: &[Tag]) -> String {
    tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn print_rows(headers: &[&str], rows: Vec<Vec<String>>, format: &OutputFormat) {
    match format {
        OutputFormat::Csv => {
            println!("{}", headers.join(","));
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|v| format_csv_value(v)).collect();
                println!("{}", cells.join(","));
            }
        }
        _ => {
            if rows.is_empty() {
                println!("(no results)");
                return;
            }
            let count = rows.len();
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(headers.to_vec());
            for row in rows {
                table.add_row(row);
            }
            println!("{}", table);
            println!("{} row(s)", count);
        }
    }
}

fn format_csv_value(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
