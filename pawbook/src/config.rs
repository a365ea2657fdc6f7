//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` and can be set via the
//! `-f` flag or `PAWBOOK_CONFIG`. Sources are merged in order (later wins):
//!
//! 1. **YAML config file** - base configuration
//! 2. **Environment variables** - `PAWBOOK_`-prefixed, double underscore for
//!    nesting (`PAWBOOK_STORE__TYPE=postgres` sets `store.type`)
//! 3. **DATABASE_URL** - special case: overrides `store.url` if set
//!
//! The `venues` section is a static venue directory for deployments where
//! venue management runs elsewhere and this process only needs the capacity
//! fields; production setups can swap in their own [`VenueDirectory`].

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::store::memory::MemorySlotStore;
use crate::store::postgres::PostgresSlotStore;
use crate::store::SlotStore;
use crate::venue::{StaticVenueDirectory, Venue, VenueDirectory};

/// CLI arguments: config file selection plus the operational subcommands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PAWBOOK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without running a command.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate slot rows for a venue over a date range
    Generate {
        #[arg(long)]
        venue: Uuid,
        #[arg(long)]
        start_date: NaiveDate,
        /// Defaults to start date plus the configured initial window
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Destructively reset existing rows instead of only filling gaps
        #[arg(long)]
        overwrite: bool,
    },
    /// Show venues with open capacity on a date
    Availability {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Show every slot row for a venue over a date range
    VenueSlots {
        #[arg(long)]
        venue: Uuid,
        #[arg(long)]
        start_date: NaiveDate,
        /// Defaults to the start date
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub generation: GenerationConfig,
    /// Static venue directory entries
    pub venues: Vec<Venue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub kind: StoreKind,
    /// PostgreSQL connection URL; required when `type` is `postgres`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Days of slots created when no explicit end date is given
    /// (venue onboarding window)
    pub initial_window_days: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { initial_window_days: 30 }
    }
}

impl Config {
    /// Load configuration from the YAML file and environment
    pub fn load(args: &Args) -> Result<Self> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PAWBOOK_").split("__"))
            .extract()
            .map_err(|e| Error::Other(anyhow::Error::from(e)))?;

        // DATABASE_URL takes precedence over the file, matching common
        // deployment conventions
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.store.url = Some(url);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.kind == StoreKind::Postgres && self.store.url.is_none() {
            return Err(Error::Other(anyhow::anyhow!(
                "store.type is postgres but no store.url or DATABASE_URL is set"
            )));
        }
        for venue in &self.venues {
            if venue.capacity < 1 {
                return Err(Error::Other(anyhow::anyhow!(
                    "venue {} has capacity {}, must be at least 1",
                    venue.id,
                    venue.capacity
                )));
            }
            if venue.slot_duration == 0 {
                return Err(Error::Other(anyhow::anyhow!(
                    "venue {} has a zero slot_duration",
                    venue.id
                )));
            }
        }
        Ok(())
    }

    /// Build the configured store backend
    pub async fn build_store(&self) -> Result<Arc<dyn SlotStore>> {
        match self.store.kind {
            StoreKind::Memory => Ok(Arc::new(MemorySlotStore::new())),
            StoreKind::Postgres => {
                // validate() guarantees the url is present
                let url = self.store.url.as_deref().expect("validated store.url");
                Ok(Arc::new(PostgresSlotStore::connect(url).await?))
            }
        }
    }

    /// Directory over the statically configured venues
    pub fn venue_directory(&self) -> Arc<dyn VenueDirectory> {
        Arc::new(StaticVenueDirectory::new(self.venues.iter().cloned()))
    }
}
