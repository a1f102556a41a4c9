use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskmenu_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "taskmenu", author, version, about, long_about = None)]
pub struct Cli {
    /// Run one action and exit; without a command the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskmenu add "Buy milk" --deadline 2025-12-24
    Add {
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, value_name = "DATE")]
        deadline: Option<String>,
    },
    /// List tasks
    ///
    /// Example: taskmenu list --sort-by deadline --order desc
    /// Example: taskmenu list --status incomplete
    List {
        #[arg(long, value_name = "FIELD")]
        sort_by: Option<String>,
        #[arg(long, value_name = "ORDER")]
        order: Option<String>,
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Show details of a task
    ///
    /// Example: taskmenu show 1
    Show { id: u64 },
    /// Mark a task as completed
    ///
    /// Example: taskmenu done 1
    Done { id: u64 },
    /// Mark a task as not completed
    ///
    /// Example: taskmenu undone 1
    Undone { id: u64 },
    /// Change a task's title, description or deadline
    ///
    /// Example: taskmenu update 1 --title "Buy oat milk" --clear-deadline
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, value_name = "DATE", conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Delete a task
    ///
    /// Example: taskmenu delete 1
    Delete { id: u64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Completed,
    Incomplete,
    All,
}

impl StatusFilter {
    pub fn completed(self) -> Option<bool> {
        match self {
            Self::Completed => Some(true),
            Self::Incomplete => Some(false),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    StorePath,
    SortBy,
    SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "sort_by" | "sort" => ConfigOverrideTarget::SortBy,
        "sort_order" | "order" => ConfigOverrideTarget::SortOrder,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override '{field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::SortBy => overrides.sort_by = Some(parsed.value),
            ConfigOverrideTarget::SortOrder => overrides.sort_order = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, StatusFilter, collect_overrides, parse_config_override,
    };
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Sort-By = deadline ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::SortBy);
        assert_eq!(parsed.value, "deadline");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_value() {
        let err = parse_config_override("theme=  ").unwrap_err();
        assert!(err.contains("needs a value"));
    }

    #[test]
    fn collect_overrides_keeps_last_value() {
        let raw = vec![
            "theme=light".to_string(),
            "store_path=/tmp/a.json".to_string(),
            "theme=noir".to_string(),
        ];

        let overrides = collect_overrides(&raw).unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.store_path, Some(PathBuf::from("/tmp/a.json")));
        assert!(overrides.sort_by.is_none());
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["taskmenu"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn list_defaults_to_all_statuses() {
        let cli = Cli::try_parse_from(["taskmenu", "list", "--sort-by", "deadline"]).unwrap();

        match cli.command {
            Some(Command::List {
                sort_by,
                order,
                status,
            }) => {
                assert_eq!(sort_by.as_deref(), Some("deadline"));
                assert!(order.is_none());
                assert_eq!(status, StatusFilter::All);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_rejects_conflicting_description_flags() {
        let result = Cli::try_parse_from([
            "taskmenu",
            "update",
            "1",
            "--description",
            "x",
            "--clear-description",
        ]);
        assert!(result.is_err());
    }
}
