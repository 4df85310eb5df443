use std::{path::Path, time::Duration};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use indexmap::IndexMap;
use prettytable::{format::FormatBuilder, row, Cell, Row, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};
use vidrank_sdk::{
    metadata::youtube::DEFAULT_OEMBED_ENDPOINT, ServiceType, SortDirection, SortField, SortSpec,
};

/// Prefix of the environment variables overriding the config file.
pub const ENV_PREFIX: &str = "VIDRANK_";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Table.
    #[default]
    Table,
    /// JSON.
    Json,
}

/// Options for rendering a list of items.
#[derive(Debug, Default, Clone)]
pub struct DisplayOptions {
    projection: IndexMap<String, String>,
    empty_message: Option<String>,
}

impl DisplayOptions {
    /// Only show the given keys, under the given column names.
    pub fn table_projection(
        keys: impl IntoIterator<Item = (impl ToString, impl ToString)>,
    ) -> Self {
        Self {
            projection: keys
                .into_iter()
                .map(|(key, name)| (key.to_string(), name.to_string()))
                .collect(),
            empty_message: None,
        }
    }

    /// Message shown in place of an empty table.
    pub fn empty_message(mut self, message: impl ToString) -> Self {
        self.empty_message = Some(message.to_string());
        self
    }
}

impl OutputFormat {
    /// Render a list of JSON objects.
    pub fn display_many(
        &self,
        items: impl IntoIterator<Item = Value>,
        options: DisplayOptions,
    ) -> eyre::Result<String> {
        let items = items.into_iter().collect::<Vec<_>>();
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(&items)?),
            Self::Table => {
                if items.is_empty() {
                    if let Some(message) = options.empty_message {
                        return Ok(message);
                    }
                }
                let mut table = Table::new();
                table.set_format(table_format());
                table.set_titles(Row::new(
                    options
                        .projection
                        .values()
                        .map(|name| Cell::new(name))
                        .collect(),
                ));
                for item in &items {
                    table.add_row(Row::new(
                        options
                            .projection
                            .keys()
                            .map(|key| Cell::new(&cell_text(item.get(key))))
                            .collect(),
                    ));
                }
                Ok(table.to_string())
            }
        }
    }

    /// Render a single labelled value.
    pub fn display_value_with_label(
        &self,
        label: &str,
        value: impl Serialize,
    ) -> eyre::Result<String> {
        let value = serde_json::to_value(value)?;
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                label: value,
            }))?),
            Self::Table => {
                let mut table = Table::new();
                table.set_format(table_format());
                table.add_row(row![label, cell_text(Some(&value))]);
                Ok(table.to_string())
            }
        }
    }

    /// Render the fields of one JSON object, one per row.
    pub fn display_object(&self, object: Value) -> eyre::Result<String> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(&object)?),
            Self::Table => {
                let mut table = Table::new();
                table.set_format(table_format());
                if let Value::Object(map) = &object {
                    for (key, value) in map {
                        table.add_row(row![key, cell_text(Some(value))]);
                    }
                }
                Ok(table.to_string())
            }
        }
    }
}

fn table_format() -> prettytable::format::TableFormat {
    FormatBuilder::new().padding(0, 2).build()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Sort section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Field to sort by.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

/// Metadata section.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// oEmbed endpoint.
    pub endpoint: String,
    /// How long `show --fetch-titles` waits for titles.
    #[serde_as(as = "DisplayFromStr")]
    pub wait: humantime::Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            wait: Duration::from_secs(5).into(),
        }
    }
}

/// Config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account to project the leaderboard for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Service type to show.
    pub service_type: ServiceType,
    /// Output format.
    pub output: OutputFormat,
    /// Sort.
    pub sort: SortConfig,
    /// Metadata.
    pub metadata: MetadataConfig,
}

impl Config {
    /// Load the config file at `path` and apply `VIDRANK_*` overrides.
    ///
    /// A missing file is treated as empty. Nested keys are separated by `__`
    /// in variable names, e.g. `VIDRANK_SORT__FIELD`.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::file(path)))
    }

    fn from_figment(figment: Figment) -> eyre::Result<Self> {
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Get the default sort spec.
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::new(self.sort.field, self.sort.direction)
    }

    /// Get the output format.
    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Get the configured account.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// How long to wait for titles.
    pub fn metadata_wait(&self) -> Duration {
        *self.metadata.wait
    }
}
