//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::PdsClient;
use crate::config::ClientConfig;
use crate::engine::{PaginationOptions, RunState};
use crate::error::{Error, Result};
use crate::types::{AccumulatorMode, Environment};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

/// How often a streaming `paginate` polls for new results
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Search {
                query_json,
                paginate,
            } => self.search(query_json, *paginate).await,
            Commands::Paginate {
                query_json,
                mode,
                backlog_limit,
                session_timeout,
                wait,
            } => {
                let mut options = PaginationOptions::new(mode.parse::<AccumulatorMode>()?)
                    .wait(*wait);
                if let Some(limit) = backlog_limit {
                    options = options.with_backlog_limit(*limit);
                }
                if let Some(secs) = session_timeout {
                    options = options.with_session_timeout(Duration::from_secs(*secs));
                }
                self.paginate(query_json, options).await
            }
            Commands::Environments => {
                self.environments();
                Ok(())
            }
        }
    }

    /// Build the client configuration
    ///
    /// File first, then `PDS_APIKEY` / `PDS_ENVIRONMENT`, then flags.
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_yaml_file(path)?,
            None => ClientConfig::default(),
        }
        .with_env_overrides();

        if let Some(key) = &self.cli.api_key {
            config = config.with_api_key(key.clone());
        }
        if let Some(name) = &self.cli.environment {
            config = config.with_environment(Environment::from_name(name));
        }
        if let Some(url) = &self.cli.base_url {
            config = config.with_base_url(url.clone());
        }
        Ok(config)
    }

    fn client(&self) -> Result<PdsClient> {
        PdsClient::new(self.load_config()?)
    }

    fn parse_query(query_json: &str) -> Result<Value> {
        serde_json::from_str(query_json)
            .map_err(|e| Error::config(format!("Invalid query JSON: {e}")))
    }

    /// Run one search
    async fn search(&self, query_json: &str, paginate: bool) -> Result<()> {
        let query = Self::parse_query(query_json)?;
        let mut client = self.client()?;
        let page = client.search(&query, paginate).await?;
        self.output_message(&serde_json::to_value(&page)?);
        Ok(())
    }

    /// Retrieve every page, printing batches as they arrive
    async fn paginate(&self, query_json: &str, options: PaginationOptions) -> Result<()> {
        let query = Self::parse_query(query_json)?;
        let mut client = self.client()?;

        client.start_pagination(&query, options).await?;

        loop {
            while let Some(batch) = client.next_results() {
                self.output_message(&Value::Array(batch));
            }
            if !client.is_paginating() {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        client.wait_for_completion().await?;
        let rest = client.drain_results();
        if !rest.is_empty() {
            self.output_message(&Value::Array(rest));
        }

        let state = client.run_state();
        let progress = client.progress().unwrap_or_default();
        info!(
            "Pagination {}: {} pages, {} records of {}",
            state, progress.pages_fetched, progress.records_fetched, progress.total_count
        );

        match (state, client.last_error()) {
            (RunState::Failed, Some(e)) => Err(Error::RunFailed {
                message: e.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// List environments
    fn environments(&self) {
        for env in Environment::ALL {
            self.output_message(&json!({
                "name": env.name(),
                "url": env.base_url(),
            }));
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
