use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::launch_options::{ActiveOption, LaunchOptions, Scope};
use crate::profiles::{Profile, ProfileManager};
use crate::schema::{OptionKind, OptionSchema, ToolConfig};
use crate::settings::Settings;
use crate::software::{self, WhichProbe};
use crate::validation::option_warnings;

#[derive(Parser)]
#[command(
    name = "sforge",
    author,
    version,
    about = "SteamForge - Steam launch options builder",
    long_about = "Build, parse and store Steam launch option strings for MangoHud, Gamescope, DXVK, Proton and friends"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Write logs to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, conflicts_with = "log_file", help = "Disable logging to a file")]
    pub no_log_file: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generate a launch options string")]
    Generate {
        #[arg(long, help = "Start from a saved profile")]
        profile: Option<String>,

        #[arg(long, help = "Enable a tool (repeatable)")]
        enable: Vec<String>,

        #[arg(
            long,
            allow_hyphen_values = true,
            help = "Set an option: Tool:KEY=VALUE, Tool:KEY, KEY=VALUE or KEY (repeatable)"
        )]
        set: Vec<String>,
    },

    #[command(about = "Parse an existing launch options string")]
    Parse {
        #[arg(allow_hyphen_values = true, help = "Launch options string, quoted")]
        launch_options: String,

        #[arg(long, help = "Save the parsed options as a profile")]
        save_as: Option<String>,

        #[arg(long, default_value = "", help = "Description for the saved profile")]
        description: String,
    },

    #[command(about = "Manage saved profiles")]
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    #[command(about = "Manage application settings")]
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },

    #[command(about = "List supported tools and their options")]
    Tools {
        #[arg(help = "Show the options of a single tool")]
        name: Option<String>,
    },

    #[command(about = "Check installed software and the Steam directory")]
    Check,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List all profiles")]
    List,

    #[command(about = "Show profile details")]
    Show {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Create a profile")]
    Create {
        #[arg(help = "Profile name")]
        name: String,

        #[arg(long, allow_hyphen_values = true, help = "Launch options string to store")]
        from: Option<String>,

        #[arg(long, default_value = "", help = "Profile description")]
        description: String,
    },

    #[command(about = "Replace a profile's options")]
    Update {
        #[arg(help = "Profile name")]
        name: String,

        #[arg(long, allow_hyphen_values = true, help = "Launch options string to store")]
        from: String,
    },

    #[command(about = "Rename a profile")]
    Rename {
        #[arg(help = "Current name")]
        old: String,

        #[arg(help = "New name")]
        new: String,
    },

    #[command(about = "Delete a profile")]
    Delete {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Import a profile from a JSON file")]
    Import {
        #[arg(help = "Profile file path")]
        path: PathBuf,
    },

    #[command(about = "Export a profile to a JSON file")]
    Export {
        #[arg(help = "Profile name")]
        name: String,

        #[arg(help = "Destination file path")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Show all settings")]
    List,

    #[command(about = "Get a setting")]
    Get {
        #[arg(help = "Setting key")]
        key: String,
    },

    #[command(about = "Set a setting (JSON values are stored as such)")]
    Set {
        #[arg(help = "Setting key")]
        key: String,

        #[arg(allow_hyphen_values = true, help = "Setting value")]
        value: String,
    },

    #[command(about = "Remove a setting")]
    Unset {
        #[arg(help = "Setting key")]
        key: String,
    },

    #[command(about = "Remove all settings")]
    Clear,

    #[command(about = "Back up the settings file")]
    Backup {
        #[arg(long, help = "Backup directory")]
        dir: Option<PathBuf>,
    },
}

/// One `--set` argument.
#[derive(Debug, PartialEq)]
struct SetArg {
    tool: Option<String>,
    key: String,
    value: Option<String>,
}

fn parse_set_arg(raw: &str) -> Result<SetArg> {
    let (tool, rest) = match raw.split_once(':') {
        Some((tool, rest)) => (Some(tool.trim().to_string()), rest),
        None => (None, raw),
    };
    let (key, value) = match rest.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.to_string())),
        None => (rest.trim(), None),
    };
    if key.is_empty() {
        bail!("Missing option key in '{}'", raw);
    }
    Ok(SetArg {
        tool,
        key: key.to_string(),
        value,
    })
}

impl Cli {
    pub fn execute(self, config: &AppConfig) -> Result<()> {
        let schema = OptionSchema::builtin().context("Built-in option schema is inconsistent")?;

        match self.command {
            Commands::Generate { profile, enable, set } => {
                handle_generate(config, &schema, profile, enable, set)
            }
            Commands::Parse { launch_options, save_as, description } => {
                handle_parse(config, &schema, &launch_options, save_as, &description)
            }
            Commands::Profile { action } => handle_profile_command(config, &schema, action),
            Commands::Settings { action } => handle_settings_command(config, action),
            Commands::Tools { name } => handle_tools(&schema, name),
            Commands::Check => handle_check(&schema),
        }
    }
}

fn open_profiles(config: &AppConfig, schema: &OptionSchema) -> Result<ProfileManager> {
    ProfileManager::new(&config.paths.profiles_dir, schema).with_context(|| {
        format!("Failed to open profiles in {}", config.paths.profiles_dir.display())
    })
}

fn parse_into_model(schema: &OptionSchema, launch_options: &str) -> Result<LaunchOptions> {
    let mut options = LaunchOptions::new();
    options
        .parse_command(launch_options, schema)
        .context("Could not parse launch options")?;
    Ok(options)
}

fn print_warnings(options: &LaunchOptions, schema: &OptionSchema) {
    for warning in option_warnings(options, schema) {
        eprintln!("{} {}", "⚠️".yellow(), warning.yellow());
    }
}

fn print_active(active: &[ActiveOption]) {
    if active.is_empty() {
        println!("  {}", "No options set".dimmed());
        return;
    }
    let mut current_scope = "";
    for option in active {
        if option.scope != current_scope {
            println!("  {}:", option.scope.bold().blue());
            current_scope = &option.scope;
        }
        println!("    {} = {}", option.key.cyan(), option.value.green());
    }
}

fn handle_generate(
    config: &AppConfig,
    schema: &OptionSchema,
    profile: Option<String>,
    enable: Vec<String>,
    set: Vec<String>,
) -> Result<()> {
    let mut options = match profile {
        Some(name) => open_profiles(config, schema)?
            .get_profile(&name)
            .map(|p| p.launch_options.clone())
            .ok_or_else(|| anyhow!("Profile not found: {}", name))?,
        None => LaunchOptions::new(),
    };

    for name in &enable {
        let tool = schema
            .find_tool(name)
            .ok_or_else(|| anyhow!("Unknown tool: {}", name))?;
        options.set_enabled(&tool.name, true);
    }

    for raw in &set {
        let arg = parse_set_arg(raw)?;
        let scope = match arg.tool.as_deref() {
            Some(tool) => Scope::Tool(tool),
            None => Scope::General,
        };
        options
            .assign(schema, scope, &arg.key, arg.value.as_deref())
            .with_context(|| format!("Cannot apply --set {}", raw))?;
    }

    println!("{}", options.generate_command(schema)?);
    print_warnings(&options, schema);
    Ok(())
}

fn handle_parse(
    config: &AppConfig,
    schema: &OptionSchema,
    launch_options: &str,
    save_as: Option<String>,
    description: &str,
) -> Result<()> {
    let options = parse_into_model(schema, launch_options)?;

    println!("{}", "🔍 Detected options:".bold().cyan());
    print_active(&options.active_options(schema));
    println!("\n{} {}", "Regenerated:".bold(), options.generate_command(schema)?.green());
    print_warnings(&options, schema);

    if let Some(name) = save_as {
        let mut manager = open_profiles(config, schema)?;
        manager.create_profile(&name, description, &options)?;
        println!("{} Saved profile {}", "✅".green(), name.cyan());
    }
    Ok(())
}

fn print_profile(profile: &Profile, schema: &OptionSchema) -> Result<()> {
    println!("{}", profile.name.bold().cyan());
    if !profile.description.is_empty() {
        println!("  {}", profile.description);
    }
    println!(
        "  Created: {}  Updated: {}",
        profile.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string().dimmed(),
        profile.updated_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    println!("  {}", profile.launch_options.generate_command(schema)?.green());
    print_active(&profile.launch_options.active_options(schema));
    Ok(())
}

fn handle_profile_command(config: &AppConfig, schema: &OptionSchema, action: ProfileCommands) -> Result<()> {
    let mut manager = open_profiles(config, schema)?;

    match action {
        ProfileCommands::List => {
            let profiles = manager.profiles();
            if profiles.is_empty() {
                println!("No profiles saved yet. Create one with 'sforge profile create'.");
                return Ok(());
            }
            println!("{}", "📁 Profiles:".bold().cyan());
            for profile in &profiles {
                if profile.description.is_empty() {
                    println!("  {}", profile.name.cyan());
                } else {
                    println!("  {} - {}", profile.name.cyan(), profile.description.dimmed());
                }
            }
            println!("\n{} {} profiles", "📊".bold(), profiles.len().to_string().bold().green());
            Ok(())
        }
        ProfileCommands::Show { name } => {
            let profile = manager
                .get_profile(&name)
                .ok_or_else(|| anyhow!("Profile not found: {}", name))?;
            print_profile(profile, schema)
        }
        ProfileCommands::Create { name, from, description } => {
            let options = match from {
                Some(launch_options) => parse_into_model(schema, &launch_options)?,
                None => LaunchOptions::new(),
            };
            manager.create_profile(&name, &description, &options)?;
            println!("{} Created profile {}", "✅".green(), name.cyan());
            Ok(())
        }
        ProfileCommands::Update { name, from } => {
            let options = parse_into_model(schema, &from)?;
            manager.update_profile(&name, &options)?;
            println!("{} Updated profile {}", "✅".green(), name.cyan());
            Ok(())
        }
        ProfileCommands::Rename { old, new } => {
            manager.rename_profile(&old, &new)?;
            println!("{} Renamed {} to {}", "✅".green(), old.cyan(), new.cyan());
            Ok(())
        }
        ProfileCommands::Delete { name } => {
            if manager.delete_profile(&name)? {
                println!("{} Deleted profile {}", "🗑️", name.cyan());
                Ok(())
            } else {
                bail!("Profile not found: {}", name)
            }
        }
        ProfileCommands::Import { path } => {
            let profile = manager
                .import_profile(&path)
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("{} Imported profile {}", "✅".green(), profile.name.cyan());
            Ok(())
        }
        ProfileCommands::Export { name, path } => {
            manager.export_profile(&name, &path)?;
            println!("{} Exported {} to {}", "✅".green(), name.cyan(), path.display());
            Ok(())
        }
    }
}

fn handle_settings_command(config: &AppConfig, action: SettingsCommands) -> Result<()> {
    let mut settings = Settings::load(&config.paths.settings_file)
        .with_context(|| format!("Failed to load {}", config.paths.settings_file.display()))?;

    match action {
        SettingsCommands::List => {
            println!("{} {}", "⚙️  Settings:".bold().cyan(), settings.path().display().to_string().dimmed());
            for (key, value) in settings.iter() {
                println!("  {} = {}", key.cyan(), value.to_string().green());
            }
            if settings.keys().next().is_none() {
                println!("  {}", "No settings stored".dimmed());
            }
            Ok(())
        }
        SettingsCommands::Get { key } => {
            let value = settings
                .get(&key)
                .ok_or_else(|| anyhow!("Setting not found: {}", key))?;
            match settings.get_str(&key) {
                Some(text) => println!("{}", text),
                None => println!("{}", value),
            }
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value.clone()));
            settings.set(&key, parsed)?;
            println!("{} Set {} = {}", "✅".green(), key.cyan(), value.green());
            Ok(())
        }
        SettingsCommands::Unset { key } => {
            if settings.delete(&key)? {
                println!("{} Removed {}", "🗑️", key.cyan());
            } else {
                println!("Setting {} was not set", key.yellow());
            }
            Ok(())
        }
        SettingsCommands::Clear => {
            settings.clear()?;
            println!("{} Cleared all settings", "🗑️");
            Ok(())
        }
        SettingsCommands::Backup { dir } => {
            let backup = settings.create_backup(dir.as_deref())?;
            println!("{} Backup written to {}", "✅".green(), backup.display());
            Ok(())
        }
    }
}

fn describe_kind(kind: &OptionKind) -> String {
    match kind {
        OptionKind::Toggle => "toggle".to_string(),
        OptionKind::Input { placeholder, .. } if placeholder.is_empty() => "input".to_string(),
        OptionKind::Input { placeholder, .. } => format!("input ({})", placeholder),
        OptionKind::Dropdown { options, default, .. } => {
            format!("one of {} [default {}]", options.join("|"), default)
        }
        OptionKind::Slider { min, max } => format!("slider {}..{}", min, max),
    }
}

fn print_tool(tool: &ToolConfig) {
    println!("{} - {}", tool.name.bold().blue(), tool.enable_label);
    println!("  {}", tool.enable_tooltip.dimmed());
    if let Some(prefix) = &tool.command_prefix {
        let suffix = tool.command_suffix.as_deref().unwrap_or("");
        println!("  Command: {} ... {}", prefix.cyan(), suffix.cyan());
    }
    if let Some(software) = &tool.software_requirement {
        println!("  Requires: {}", software.yellow());
    }
    for option in &tool.options {
        println!(
            "    {} {} {}",
            option.key.cyan(),
            describe_kind(&option.kind).dimmed(),
            option.description
        );
    }
}

fn handle_tools(schema: &OptionSchema, name: Option<String>) -> Result<()> {
    match name {
        Some(name) if name.eq_ignore_ascii_case("general") => {
            let general = schema.general();
            println!("{}", "General".bold().blue());
            for option in general.toggles.iter().chain(&general.inputs).chain(&general.dropdowns) {
                println!(
                    "    {} {} {}",
                    option.key.cyan(),
                    describe_kind(&option.kind).dimmed(),
                    option.description
                );
            }
        }
        Some(name) => {
            let tool = schema
                .find_tool(&name)
                .ok_or_else(|| anyhow!("Unknown tool: {}", name))?;
            print_tool(tool);
        }
        None => {
            println!("{}", "🧰 Supported tools:".bold().cyan());
            for tool in schema.tools() {
                println!(
                    "  {} {} - {}",
                    tool.name.bold().blue(),
                    format!("({} options)", tool.options.len()).dimmed(),
                    tool.enable_tooltip
                );
            }
            println!("\nUse 'sforge tools <NAME>' for details, or 'sforge tools general'.");
        }
    }
    Ok(())
}

fn handle_check(schema: &OptionSchema) -> Result<()> {
    println!("{}", "🔧 Software check:".bold().cyan());
    for status in software::requirement_status(schema, &WhichProbe) {
        let icon = if status.present { "✅" } else { "❌" };
        println!("  {} {} ({})", icon, status.tool, status.software.dimmed());
    }

    let missing = software::missing_requirements(schema, &WhichProbe);
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(|s| s.tool.as_str()).collect();
        println!("\n{} Missing software for: {}", "⚠️".yellow(), names.join(", ").yellow());
    }

    match software::steam_root_directory() {
        Some(path) => println!("\n{} Steam found at {}", "✅".green(), path.display()),
        None => println!("\n{} Steam installation not found", "❌".red()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_arguments() {
        assert_eq!(
            parse_set_arg("Gamescope:-W=2560").unwrap(),
            SetArg { tool: Some("Gamescope".into()), key: "-W".into(), value: Some("2560".into()) }
        );
        assert_eq!(
            parse_set_arg("MangoHud:MANGOHUD").unwrap(),
            SetArg { tool: Some("MangoHud".into()), key: "MANGOHUD".into(), value: None }
        );
        assert_eq!(
            parse_set_arg("+fps_max=144").unwrap(),
            SetArg { tool: None, key: "+fps_max".into(), value: Some("144".into()) }
        );
        assert_eq!(
            parse_set_arg("MangoHud:MANGOHUD_CONFIG=fps,gpu_temp=1").unwrap().value.as_deref(),
            Some("fps,gpu_temp=1")
        );
        assert!(parse_set_arg("Wine:=1").is_err());
    }

    #[test]
    fn generate_arguments_accept_flag_shaped_values() {
        let cli = Cli::try_parse_from([
            "sforge", "generate", "--enable", "gamescope", "--set", "-novid", "--set", "Gamescope:-W=2560",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { enable, set, .. } => {
                assert_eq!(enable, vec!["gamescope"]);
                assert_eq!(set, vec!["-novid", "Gamescope:-W=2560"]);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn parse_takes_the_whole_string() {
        let cli = Cli::try_parse_from(["sforge", "parse", "MANGOHUD=1 mangohud %command%"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse { ref launch_options, .. } if launch_options.starts_with("MANGOHUD=1")));
    }
}
