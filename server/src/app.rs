//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, DEFAULT_CLEANUP_DAYS, ENV_LOG, TOPIC_SENSOR_MESSAGES};
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::topics::{Topic, TopicService};
use crate::data::{ReadingRepository, SensorMessage, SqliteService};
use crate::domain::retention::start_retention_task;
use crate::domain::{IngestionDispatcher, ReadingCorrelator};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub store: Arc<SqliteService>,
    pub topics: Arc<TopicService>,
    /// Raw sensor messages; fed by the publish bridge, drained by the dispatcher
    pub sensor_topic: Topic<SensorMessage>,
    pub correlator: Arc<ReadingCorrelator>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System {
                command: system_cmd,
            }) => {
                return Self::handle_system_command(&cli_config, system_cmd).await;
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;

        let store = Arc::new(
            SqliteService::init(storage.db_path())
                .await
                .with_context(|| {
                    format!("Failed to open database: {}", storage.db_path().display())
                })?,
        );

        let topics = Arc::new(TopicService::new());
        let sensor_topic = topics
            .topic::<SensorMessage>(TOPIC_SENSOR_MESSAGES)
            .map_err(|e| anyhow::anyhow!("Failed to create sensor topic: {}", e))?;

        let correlator = Arc::new(ReadingCorrelator::new(config.ingestion.merge_policy));
        let shutdown = ShutdownService::new(topics.clone(), store.clone());

        Ok(Self {
            shutdown,
            config,
            storage,
            store,
            topics,
            sensor_topic,
            correlator,
        })
    }

    async fn handle_system_command(cli: &CliConfig, cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Cleanup { days, yes } => Self::cleanup_readings(cli, days, yes).await,
        }
    }

    async fn cleanup_readings(cli: &CliConfig, days: u32, skip_confirm: bool) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let db_path = AppStorage::db_path_for(&config, &AppStorage::resolve_data_dir());

        if !db_path.exists() {
            println!(
                "Nothing to clean up. Database does not exist: {}",
                db_path.display()
            );
            return Ok(());
        }

        let days = if days == 0 { DEFAULT_CLEANUP_DAYS } else { days };
        println!("This will permanently delete readings older than {days} days from:");
        println!("  {}", db_path.display());

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        let store = SqliteService::init(&db_path)
            .await
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        let deleted = store
            .prune_older_than(days)
            .await
            .context("Failed to delete old readings")?;
        if let Err(e) = store.checkpoint().await {
            tracing::warn!(error = %e, "SQLite checkpoint failed");
        }
        store.close().await;

        println!("Deleted {deleted} records older than {days} days");
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers before anything can block
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await?;

        banner::print_banner(&app.config, app.storage.db_path());

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) -> Result<()> {
        self.shutdown
            .register(self.store.start_checkpoint_task(self.shutdown.subscribe()))
            .await;

        if let Some(h) = start_retention_task(
            self.store.clone(),
            &self.config.retention,
            self.shutdown.subscribe(),
        ) {
            self.shutdown.register(h).await;
        }

        let subscriber = self
            .sensor_topic
            .stream_subscribe()
            .context("Failed to attach ingestion dispatcher")?;
        let dispatcher = IngestionDispatcher::new(
            self.config.ingestion.topics.clone(),
            self.correlator.clone(),
            self.store.clone(),
        );
        self.shutdown
            .register(dispatcher.start(subscriber, self.shutdown.subscribe()))
            .await;

        tracing::info!(
            topics = ?self.config.ingestion.topics.names(),
            merge_policy = self.config.ingestion.merge_policy.as_str(),
            "Ingestion dispatcher subscribed"
        );
        Ok(())
    }
}
