use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use weather_core::{
    AppEvent, Config, Dispatched, FileStore, HistoryEntry, HistoryManager, KeyValueStore,
    MemoryStore, WeatherApp, service_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather search with history")]
pub struct Cli {
    /// Keep search history in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and endpoint.
    Configure,

    /// Show current weather for a location and record it in history.
    Show {
        /// City or location name, e.g. "Paris" or "New York,US".
        #[arg(required = true, num_args = 1..)]
        location: Vec<String>,
    },

    /// Inspect or edit past searches.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Prompt-driven search session.
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List past searches, newest first.
    List,

    /// Delete one entry by list number, id, or id prefix.
    Delete { entry: String },

    /// Search again for an entry without adding a new one.
    Replay { entry: String },

    /// Remove every entry.
    Clear,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure => configure(config_or_default(Config::load()))?,
            Command::Show { location } => {
                let config = Config::load()?;
                let mut app = open_app(&config, self.open_store(&config)?).await?;

                let location = location.join(" ");
                output::print_loading(&location);
                let out = app.dispatch(AppEvent::Search(location)).await;
                report(out)?;
            }
            Command::History { action } => {
                // Only replay talks to the network; the rest must work with a broken config.
                let config = match action {
                    HistoryCommand::Replay { .. } => Config::load()?,
                    _ => config_or_default(Config::load()),
                };
                let store = self.open_store(&config)?;
                run_history(action, &config, store).await?;
            }
            Command::Interactive => {
                let config = Config::load()?;
                let app = open_app(&config, self.open_store(&config)?).await?;
                interactive(app).await?;
            }
        }

        Ok(())
    }

    fn open_store(&self, config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }
        let dir = config.resolved_data_dir()?;
        tracing::debug!(dir = %dir.display(), "using history directory");
        Ok(Arc::new(FileStore::new(dir)))
    }
}

async fn open_app(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<WeatherApp> {
    let service = service_from_config(config)?;
    Ok(WeatherApp::open(service, store, config.timeout()).await)
}

/// An unreadable config file is replaced by defaults so it can be rewritten.
fn config_or_default(loaded: anyhow::Result<Config>) -> Config {
    loaded.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable config, using defaults");
        Config::default()
    })
}

fn configure(config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let base_url = Text::new("Endpoint:")
        .with_default(&config.base_url)
        .prompt()
        .context("Failed to read endpoint")?;

    apply_configuration(config, &api_key, &base_url).save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn apply_configuration(mut config: Config, api_key: &str, base_url: &str) -> Config {
    config.set_api_key(api_key.trim().to_string());
    config.base_url = base_url.trim().to_string();
    config
}

async fn run_history(
    action: &HistoryCommand,
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<()> {
    match action {
        HistoryCommand::List => {
            let history = HistoryManager::open(store).await;
            output::print_history(history.entries());
        }
        HistoryCommand::Delete { entry } => match delete_entry(store, entry).await? {
            Some(found) => println!("Deleted {}", found.location),
            None => println!("No history entry matches '{entry}'."),
        },
        HistoryCommand::Replay { entry } => {
            let mut app = open_app(config, store).await?;
            let Some(found) = resolve_entry(app.history().entries(), entry) else {
                bail!("No history entry matches '{entry}'.");
            };
            output::print_loading(&found.location);
            report(app.dispatch(AppEvent::SelectHistory(found.id)).await)?;
        }
        HistoryCommand::Clear => {
            clear_history(store).await?;
            println!("History cleared.");
        }
    }
    Ok(())
}

/// Deletes the entry `key` resolves to. A failed write is an error here,
/// unlike in the manager itself.
async fn delete_entry(
    store: Arc<dyn KeyValueStore>,
    key: &str,
) -> anyhow::Result<Option<HistoryEntry>> {
    let mut history = HistoryManager::open(store).await;
    let Some(found) = resolve_entry(history.entries(), key) else {
        return Ok(None);
    };
    history.delete(&found.id).await;
    history.persist().await.context("Failed to save history")?;
    Ok(Some(found))
}

async fn clear_history(store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let mut history = HistoryManager::open(store).await;
    history.clear().await;
    history.persist().await.context("Failed to save history")?;
    Ok(())
}

/// Matches a 1-based list number, an exact id, or a unique id prefix.
fn resolve_entry(entries: &[HistoryEntry], key: &str) -> Option<HistoryEntry> {
    if let Ok(n) = key.parse::<usize>()
        && let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i))
    {
        return Some(entry.clone());
    }

    if let Some(entry) = entries.iter().find(|e| e.id == key) {
        return Some(entry.clone());
    }

    let mut prefixed = entries.iter().filter(|e| e.id.starts_with(key));
    match (prefixed.next(), prefixed.next()) {
        (Some(entry), None) if !key.is_empty() => Some(entry.clone()),
        _ => None,
    }
}

fn report(out: Dispatched) -> anyhow::Result<()> {
    match out {
        Dispatched::Searched { outcome, .. } => {
            if !output::print_outcome(&outcome) {
                bail!("Search did not complete");
            }
        }
        Dispatched::Ignored => bail!("That history entry no longer exists"),
        Dispatched::Deleted(_) | Dispatched::Cleared => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    Search,
    History,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Search => "Search",
            MenuItem::History => "History",
            MenuItem::Quit => "Quit",
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryAction {
    Show,
    Delete,
    Back,
}

impl fmt::Display for EntryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryAction::Show => "Show weather",
            EntryAction::Delete => "Delete",
            EntryAction::Back => "Back",
        })
    }
}

struct EntryChoice(HistoryEntry);

impl fmt::Display for EntryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.location)
    }
}

async fn interactive(mut app: WeatherApp) -> anyhow::Result<()> {
    loop {
        let menu = vec![MenuItem::Search, MenuItem::History, MenuItem::Quit];
        let Some(choice) = cancellable(Select::new("What next?", menu).prompt())? else {
            return Ok(());
        };

        match choice {
            MenuItem::Search => {
                let Some(location) = cancellable(Text::new("City:").prompt())? else {
                    continue;
                };
                output::print_loading(&location);
                if let Dispatched::Searched { outcome, .. } =
                    app.dispatch(AppEvent::Search(location)).await
                {
                    output::print_outcome(&outcome);
                }
            }
            MenuItem::History => {
                let entries: Vec<EntryChoice> =
                    app.history().entries().iter().cloned().map(EntryChoice).collect();
                if entries.is_empty() {
                    println!("No searches yet.");
                    continue;
                }

                let Some(EntryChoice(entry)) =
                    cancellable(Select::new("Past searches:", entries).prompt())?
                else {
                    continue;
                };

                let actions = vec![EntryAction::Show, EntryAction::Delete, EntryAction::Back];
                let action = cancellable(Select::new(&entry.location, actions).prompt())?;

                match action {
                    Some(EntryAction::Show) => {
                        output::print_loading(&entry.location);
                        if let Dispatched::Searched { outcome, .. } =
                            app.dispatch(AppEvent::SelectHistory(entry.id)).await
                        {
                            output::print_outcome(&outcome);
                        }
                    }
                    Some(EntryAction::Delete) => {
                        app.dispatch(AppEvent::DeleteHistory(entry.id)).await;
                        println!("Deleted {}", entry.location);
                    }
                    Some(EntryAction::Back) | None => {}
                }
            }
            MenuItem::Quit => return Ok(()),
        }
    }
}

/// Esc and Ctrl-C at a prompt mean "go back", not failure.
fn cancellable<T>(res: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
