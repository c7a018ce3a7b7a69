//! Declarative option schema shared by generation, parsing and the front end.
//!
//! Every option carries its own kind. Emission is decided by the key alone:
//! a key beginning with `-` is a command-line flag, any other key is an
//! environment variable.

use std::collections::{HashMap, HashSet};

use crate::error::{LaunchError, Result};

pub fn is_flag(key: &str) -> bool {
    key.starts_with('-')
}

/// Shape of free-text input, used to pick a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Path,
    Integer,
    Number,
    Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    Toggle,
    Input {
        placeholder: String,
        value_kind: InputKind,
    },
    Dropdown {
        label: String,
        options: Vec<String>,
        tooltip: String,
        default: String,
    },
    Slider {
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionClass {
    Toggle,
    Input,
    Dropdown,
    Slider,
}

impl OptionKind {
    pub fn class(&self) -> OptionClass {
        match self {
            OptionKind::Toggle => OptionClass::Toggle,
            OptionKind::Input { .. } => OptionClass::Input,
            OptionKind::Dropdown { .. } => OptionClass::Dropdown,
            OptionKind::Slider { .. } => OptionClass::Slider,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub key: String,
    pub description: String,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn toggle(key: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            kind: OptionKind::Toggle,
        }
    }

    pub fn input(key: &str, description: &str, placeholder: &str) -> Self {
        Self::typed_input(key, description, placeholder, InputKind::Text)
    }

    pub fn typed_input(key: &str, description: &str, placeholder: &str, value_kind: InputKind) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            kind: OptionKind::Input {
                placeholder: placeholder.to_string(),
                value_kind,
            },
        }
    }

    pub fn dropdown(key: &str, label: &str, options: &[&str], tooltip: &str, default: &str) -> Self {
        Self {
            key: key.to_string(),
            description: tooltip.to_string(),
            kind: OptionKind::Dropdown {
                label: label.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
                tooltip: tooltip.to_string(),
                default: default.to_string(),
            },
        }
    }

    pub fn slider(key: &str, description: &str, min: f64, max: f64) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            kind: OptionKind::Slider { min, max },
        }
    }

    pub fn class(&self) -> OptionClass {
        self.kind.class()
    }

    pub fn is_flag(&self) -> bool {
        is_flag(&self.key)
    }
}

/// One independently enable-able tool block.
///
/// A toggle whose key equals `command_prefix` is the tool's prefix toggle:
/// it is carried by the prefix token and never emitted as an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub name: String,
    pub enable_label: String,
    pub enable_tooltip: String,
    pub command_prefix: Option<String>,
    pub command_suffix: Option<String>,
    pub software_requirement: Option<String>,
    pub options: Vec<OptionSpec>,
}

impl ToolConfig {
    pub fn new(name: &str, enable_tooltip: &str) -> Self {
        Self {
            name: name.to_string(),
            enable_label: format!("Enable {}", name),
            enable_tooltip: enable_tooltip.to_string(),
            command_prefix: None,
            command_suffix: None,
            software_requirement: None,
            options: Vec::new(),
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.command_prefix = Some(prefix.to_string());
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.command_suffix = Some(suffix.to_string());
        self
    }

    pub fn requires(mut self, software: &str) -> Self {
        self.software_requirement = Some(software.to_string());
        self
    }

    pub fn with(mut self, options: impl IntoIterator<Item = OptionSpec>) -> Self {
        self.options.extend(options);
        self
    }

    fn of_class(&self, class: OptionClass) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter().filter(move |o| o.class() == class)
    }

    pub fn toggles(&self) -> impl Iterator<Item = &OptionSpec> {
        self.of_class(OptionClass::Toggle)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &OptionSpec> {
        self.of_class(OptionClass::Input)
    }

    pub fn dropdowns(&self) -> impl Iterator<Item = &OptionSpec> {
        self.of_class(OptionClass::Dropdown)
    }

    pub fn sliders(&self) -> impl Iterator<Item = &OptionSpec> {
        self.of_class(OptionClass::Slider)
    }

    pub fn option(&self, key: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn is_prefix_toggle(&self, key: &str) -> bool {
        self.command_prefix.as_deref() == Some(key)
            && self.option(key).map(|o| o.class()) == Some(OptionClass::Toggle)
    }

    pub fn prefix_toggle(&self) -> Option<&str> {
        self.command_prefix
            .as_deref()
            .filter(|prefix| self.is_prefix_toggle(prefix))
    }
}

/// The unscoped category: bare game arguments, no enable flag, no prefix.
///
/// Each dropdown is gated by an enable toggle stored in `general_toggles`
/// under the dropdown's own key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralOptions {
    pub toggles: Vec<OptionSpec>,
    pub inputs: Vec<OptionSpec>,
    pub dropdowns: Vec<OptionSpec>,
}

impl GeneralOptions {
    pub fn toggle(&self, key: &str) -> Option<&OptionSpec> {
        self.toggles.iter().find(|o| o.key == key)
    }

    pub fn input(&self, key: &str) -> Option<&OptionSpec> {
        self.inputs.iter().find(|o| o.key == key)
    }

    pub fn dropdown(&self, key: &str) -> Option<&OptionSpec> {
        self.dropdowns.iter().find(|o| o.key == key)
    }

    pub fn option(&self, key: &str) -> Option<&OptionSpec> {
        self.toggle(key)
            .or_else(|| self.input(key))
            .or_else(|| self.dropdown(key))
    }

    fn all(&self) -> impl Iterator<Item = &OptionSpec> {
        self.toggles
            .iter()
            .chain(self.inputs.iter())
            .chain(self.dropdowns.iter())
    }
}

#[derive(Debug, Clone)]
pub struct OptionSchema {
    general: GeneralOptions,
    tools: Vec<ToolConfig>,
    env_index: HashMap<String, usize>,
    flag_toggle_index: HashMap<String, usize>,
    prefix_index: HashMap<String, usize>,
    suffixes: HashSet<String>,
}

impl OptionSchema {
    /// Builds the schema and its reverse indexes, rejecting key collisions.
    pub fn new(general: GeneralOptions, tools: Vec<ToolConfig>) -> Result<Self> {
        let mut seen_general = HashSet::new();
        for option in general.all() {
            if !seen_general.insert(option.key.as_str()) {
                return Err(LaunchError::SchemaConflict(format!(
                    "General option '{}' declared twice",
                    option.key
                )));
            }
        }

        let mut env_index = HashMap::new();
        let mut flag_index: HashMap<String, usize> = HashMap::new();
        let mut flag_toggle_index = HashMap::new();
        let mut prefix_index = HashMap::new();
        let mut suffixes = HashSet::new();
        let mut tool_names = HashSet::new();

        for (idx, tool) in tools.iter().enumerate() {
            if !tool_names.insert(tool.name.as_str()) {
                return Err(LaunchError::SchemaConflict(format!(
                    "tool '{}' declared twice",
                    tool.name
                )));
            }

            let mut local = HashSet::new();
            for option in &tool.options {
                if !local.insert(option.key.as_str()) {
                    return Err(LaunchError::SchemaConflict(format!(
                        "option '{}' declared twice in {}",
                        option.key, tool.name
                    )));
                }
                if tool.is_prefix_toggle(&option.key) {
                    continue;
                }

                let index = if option.is_flag() { &mut flag_index } else { &mut env_index };
                if let Some(previous) = index.insert(option.key.clone(), idx) {
                    return Err(LaunchError::SchemaConflict(format!(
                        "option '{}' declared by both {} and {}",
                        option.key, tools[previous].name, tool.name
                    )));
                }
                if option.is_flag() && option.class() == OptionClass::Toggle {
                    flag_toggle_index.insert(option.key.clone(), idx);
                }
            }

            if let Some(prefix) = &tool.command_prefix {
                if let Some(previous) = prefix_index.insert(prefix.clone(), idx) {
                    return Err(LaunchError::SchemaConflict(format!(
                        "command prefix '{}' declared by both {} and {}",
                        prefix, tools[previous].name, tool.name
                    )));
                }
            }
            if let Some(suffix) = &tool.command_suffix {
                suffixes.insert(suffix.clone());
            }
        }

        Ok(Self {
            general,
            tools,
            env_index,
            flag_toggle_index,
            prefix_index,
            suffixes,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(crate::catalog::general_options(), crate::catalog::builtin_tools())
    }

    pub fn general(&self) -> &GeneralOptions {
        &self.general
    }

    pub fn tools(&self) -> &[ToolConfig] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Case-insensitive lookup for front-end input.
    pub fn find_tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tool(name)
            .or_else(|| self.tools.iter().find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    /// Resolves an environment variable name to its owning tool and option.
    pub fn env_option(&self, key: &str) -> Option<(&ToolConfig, &OptionSpec)> {
        let tool = &self.tools[*self.env_index.get(key)?];
        tool.option(key).map(|option| (tool, option))
    }

    /// Resolves a flag-shaped toggle declared under some tool.
    pub fn flag_toggle_owner(&self, key: &str) -> Option<&ToolConfig> {
        self.flag_toggle_index.get(key).map(|idx| &self.tools[*idx])
    }

    pub fn tool_by_prefix(&self, token: &str) -> Option<&ToolConfig> {
        self.prefix_index.get(token).map(|idx| &self.tools[*idx])
    }

    pub fn is_suffix(&self, token: &str) -> bool {
        self.suffixes.contains(token)
    }
}
