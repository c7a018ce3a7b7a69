//! The editable launch-options model and its conversion to and from a Steam
//! launch string.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LaunchError, Result};
use crate::schema::{is_flag, OptionClass, OptionKind, OptionSchema, OptionSpec, ToolConfig};

pub const COMMAND_PLACEHOLDER: &str = "%command%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    General,
    Tool(&'a str),
}

/// A single active value, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveOption {
    pub scope: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOptions {
    pub general_toggles: BTreeMap<String, bool>,
    pub general_inputs: BTreeMap<String, String>,
    pub general_dropdowns: BTreeMap<String, String>,
    pub tab_enabled: BTreeMap<String, bool>,
    pub tab_toggles: BTreeMap<String, BTreeMap<String, bool>>,
    pub tab_inputs: BTreeMap<String, BTreeMap<String, String>>,
    pub tab_dropdowns: BTreeMap<String, BTreeMap<String, String>>,
    pub tab_sliders: BTreeMap<String, BTreeMap<String, f64>>,
}

fn looks_like_flag(token: &str) -> bool {
    token.starts_with('-') || token.starts_with('+')
}

fn quote(value: &str) -> Result<Cow<'_, str>> {
    shlex::try_quote(value).map_err(|_| LaunchError::Unquotable(value.to_string()))
}

fn assignment(key: &str, value: &str) -> Result<String> {
    Ok(format!("{}={}", key, quote(value)?))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

fn retain_tool_map<V>(
    map: &mut BTreeMap<String, BTreeMap<String, V>>,
    schema: &OptionSchema,
    class: OptionClass,
) {
    map.retain(|tool_name, values| {
        let Some(tool) = schema.tool(tool_name) else {
            return false;
        };
        values.retain(|key, _| tool.option(key).map(OptionSpec::class) == Some(class));
        !values.is_empty()
    });
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.general_toggles.clear();
        self.general_inputs.clear();
        self.general_dropdowns.clear();
        self.tab_enabled.clear();
        self.tab_toggles.clear();
        self.tab_inputs.clear();
        self.tab_dropdowns.clear();
        self.tab_sliders.clear();
    }

    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Loads a stored model, dropping keys the schema no longer declares.
    pub fn from_dict(value: serde_json::Value, schema: &OptionSchema) -> Result<Self> {
        let mut options: LaunchOptions = serde_json::from_value(value)?;
        options.retain_known(schema);
        Ok(options)
    }

    fn option_count(&self) -> usize {
        fn nested<V>(map: &BTreeMap<String, BTreeMap<String, V>>) -> usize {
            map.values().map(BTreeMap::len).sum()
        }
        self.general_toggles.len()
            + self.general_inputs.len()
            + self.general_dropdowns.len()
            + self.tab_enabled.len()
            + nested(&self.tab_toggles)
            + nested(&self.tab_inputs)
            + nested(&self.tab_dropdowns)
            + nested(&self.tab_sliders)
    }

    pub fn retain_known(&mut self, schema: &OptionSchema) {
        let before = self.option_count();
        let general = schema.general();

        self.general_toggles
            .retain(|key, _| general.toggle(key).is_some() || general.dropdown(key).is_some());
        self.general_inputs.retain(|key, _| general.input(key).is_some());
        self.general_dropdowns.retain(|key, _| general.dropdown(key).is_some());
        self.tab_enabled.retain(|tool, _| schema.tool(tool).is_some());
        retain_tool_map(&mut self.tab_toggles, schema, OptionClass::Toggle);
        retain_tool_map(&mut self.tab_inputs, schema, OptionClass::Input);
        retain_tool_map(&mut self.tab_dropdowns, schema, OptionClass::Dropdown);
        retain_tool_map(&mut self.tab_sliders, schema, OptionClass::Slider);

        let dropped = before - self.option_count();
        if dropped > 0 {
            debug!("Dropped {} stale launch option entries", dropped);
        }
    }

    pub fn is_enabled(&self, tool: &str) -> bool {
        self.tab_enabled.get(tool).copied().unwrap_or(false)
    }

    pub fn toggle(&self, scope: Scope<'_>, key: &str) -> bool {
        let value = match scope {
            Scope::General => self.general_toggles.get(key),
            Scope::Tool(tool) => self.tab_toggles.get(tool).and_then(|m| m.get(key)),
        };
        value.copied().unwrap_or(false)
    }

    pub fn input(&self, scope: Scope<'_>, key: &str) -> Option<&str> {
        let value = match scope {
            Scope::General => self.general_inputs.get(key),
            Scope::Tool(tool) => self.tab_inputs.get(tool).and_then(|m| m.get(key)),
        };
        value.map(String::as_str)
    }

    pub fn dropdown(&self, scope: Scope<'_>, key: &str) -> Option<&str> {
        let value = match scope {
            Scope::General => self.general_dropdowns.get(key),
            Scope::Tool(tool) => self.tab_dropdowns.get(tool).and_then(|m| m.get(key)),
        };
        value.map(String::as_str)
    }

    pub fn slider(&self, tool: &str, key: &str) -> f64 {
        self.tab_sliders
            .get(tool)
            .and_then(|m| m.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_enabled(&mut self, tool: &str, enabled: bool) {
        self.tab_enabled.insert(tool.to_string(), enabled);
    }

    pub fn set_toggle(&mut self, tool: &str, key: &str, value: bool) {
        self.toggles_mut(tool).insert(key.to_string(), value);
    }

    pub fn set_input(&mut self, tool: &str, key: &str, value: impl Into<String>) {
        self.inputs_mut(tool).insert(key.to_string(), value.into());
    }

    pub fn set_dropdown(&mut self, tool: &str, key: &str, value: impl Into<String>) {
        self.dropdowns_mut(tool).insert(key.to_string(), value.into());
    }

    pub fn set_slider(&mut self, tool: &str, key: &str, value: f64) {
        self.sliders_mut(tool).insert(key.to_string(), value);
    }

    pub fn set_general_toggle(&mut self, key: &str, value: bool) {
        self.general_toggles.insert(key.to_string(), value);
    }

    pub fn set_general_input(&mut self, key: &str, value: impl Into<String>) {
        self.general_inputs.insert(key.to_string(), value.into());
    }

    /// Selects a General dropdown value and activates its enable toggle.
    pub fn set_general_dropdown(&mut self, key: &str, value: impl Into<String>) {
        self.general_dropdowns.insert(key.to_string(), value.into());
        self.general_toggles.insert(key.to_string(), true);
    }

    /// Sets an option from front-end text, parsed according to its schema kind.
    ///
    /// A missing `raw` value means "switch on" and is only valid for toggles
    /// and for enabling a General dropdown with its default. Assigning any tool
    /// option also enables that tool.
    pub fn assign(
        &mut self,
        schema: &OptionSchema,
        scope: Scope<'_>,
        key: &str,
        raw: Option<&str>,
    ) -> Result<()> {
        match scope {
            Scope::General => {
                let general = schema.general();
                let option = general.option(key).ok_or_else(|| LaunchError::UnknownOption {
                    scope: "General".to_string(),
                    key: key.to_string(),
                })?;
                match (&option.kind, raw) {
                    (OptionKind::Toggle, raw) => {
                        let value = crate::validation::parse_toggle(raw.unwrap_or("1"))
                            .ok_or_else(|| LaunchError::invalid(key, "expected on/off"))?;
                        self.set_general_toggle(key, value);
                    }
                    (OptionKind::Dropdown { .. }, None) => self.set_general_toggle(key, true),
                    (_, None) => return Err(LaunchError::invalid(key, "a value is required")),
                    (OptionKind::Dropdown { .. }, Some(raw)) => {
                        crate::validation::validate_option_value(option, raw)?;
                        self.set_general_dropdown(key, raw);
                    }
                    (_, Some(raw)) => {
                        crate::validation::validate_option_value(option, raw)?;
                        self.set_general_input(key, raw);
                    }
                }
            }
            Scope::Tool(name) => {
                let tool = schema
                    .find_tool(name)
                    .ok_or_else(|| LaunchError::UnknownTool(name.to_string()))?;
                let option = tool.option(key).ok_or_else(|| LaunchError::UnknownOption {
                    scope: tool.name.clone(),
                    key: key.to_string(),
                })?;
                let tool_name = tool.name.as_str();
                match (&option.kind, raw) {
                    (OptionKind::Toggle, raw) => {
                        let value = crate::validation::parse_toggle(raw.unwrap_or("1"))
                            .ok_or_else(|| LaunchError::invalid(key, "expected on/off"))?;
                        self.set_toggle(tool_name, key, value);
                    }
                    (_, None) => return Err(LaunchError::invalid(key, "a value is required")),
                    (kind, Some(raw)) => {
                        crate::validation::validate_option_value(option, raw)?;
                        match kind {
                            OptionKind::Input { .. } => self.set_input(tool_name, key, raw),
                            OptionKind::Dropdown { .. } => self.set_dropdown(tool_name, key, raw),
                            _ => {
                                let value = raw
                                    .parse::<f64>()
                                    .map_err(|_| LaunchError::invalid(key, "expected a number"))?;
                                self.set_slider(tool_name, key, value);
                            }
                        }
                    }
                }
                self.set_enabled(tool_name, true);
            }
        }
        Ok(())
    }

    fn toggles_mut(&mut self, tool: &str) -> &mut BTreeMap<String, bool> {
        self.tab_toggles.entry(tool.to_string()).or_default()
    }

    fn inputs_mut(&mut self, tool: &str) -> &mut BTreeMap<String, String> {
        self.tab_inputs.entry(tool.to_string()).or_default()
    }

    fn dropdowns_mut(&mut self, tool: &str) -> &mut BTreeMap<String, String> {
        self.tab_dropdowns.entry(tool.to_string()).or_default()
    }

    fn sliders_mut(&mut self, tool: &str) -> &mut BTreeMap<String, f64> {
        self.tab_sliders.entry(tool.to_string()).or_default()
    }

    /// Renders the model as a Steam launch-options string.
    ///
    /// Environment assignments come first, then each enabled tool's prefix,
    /// flags and suffix in schema order, then General flags, then
    /// `%command%`. A slider at exactly zero counts as unset.
    pub fn generate_command(&self, schema: &OptionSchema) -> Result<String> {
        let mut env = Vec::new();
        let mut command = Vec::new();

        for tool in schema.tools() {
            if !self.is_enabled(&tool.name) {
                continue;
            }
            let scope = Scope::Tool(&tool.name);
            let mut flags = Vec::new();

            for option in tool.toggles() {
                if tool.is_prefix_toggle(&option.key) || !self.toggle(scope, &option.key) {
                    continue;
                }
                if option.is_flag() {
                    flags.push(option.key.clone());
                } else {
                    env.push(format!("{}=1", option.key));
                }
            }

            let valued = tool
                .inputs()
                .map(|o| (o, self.input(scope, &o.key)))
                .chain(tool.dropdowns().map(|o| (o, self.dropdown(scope, &o.key))));
            for (option, value) in valued {
                let Some(value) = value.filter(|v| !v.is_empty()) else {
                    continue;
                };
                if option.is_flag() {
                    flags.push(option.key.clone());
                    flags.push(quote(value)?.into_owned());
                } else {
                    env.push(assignment(&option.key, value)?);
                }
            }

            for option in tool.sliders() {
                let value = format!("{:.2}", self.slider(&tool.name, &option.key));
                if value.parse::<f64>().is_ok_and(|v| v == 0.0) {
                    continue;
                }
                if option.is_flag() {
                    flags.push(option.key.clone());
                    flags.push(value);
                } else {
                    env.push(format!("{}={}", option.key, value));
                }
            }

            command.extend(tool.command_prefix.iter().cloned());
            command.extend(flags);
            command.extend(tool.command_suffix.iter().cloned());
        }

        let general = schema.general();
        for option in &general.toggles {
            if self.toggle(Scope::General, &option.key) {
                command.push(option.key.clone());
            }
        }
        for option in &general.inputs {
            if let Some(value) = non_empty(self.general_inputs.get(&option.key)) {
                command.push(option.key.clone());
                command.push(quote(value)?.into_owned());
            }
        }
        for option in &general.dropdowns {
            if !self.toggle(Scope::General, &option.key) {
                continue;
            }
            let fallback = match &option.kind {
                OptionKind::Dropdown { default, .. } => Some(default.as_str()),
                _ => None,
            };
            let value = non_empty(self.general_dropdowns.get(&option.key))
                .or(fallback.filter(|d| !d.is_empty()));
            if let Some(value) = value {
                command.push(option.key.clone());
                command.push(quote(value)?.into_owned());
            }
        }

        let mut parts = env;
        parts.extend(command);
        parts.push(COMMAND_PLACEHOLDER.to_string());
        Ok(parts.join(" "))
    }

    /// Replaces the model with the options detected in `command`.
    ///
    /// Unknown keys, unrecognized flags and unparsable slider values are
    /// skipped. Only a tokenization failure is reported, and in that case the
    /// model is left untouched.
    pub fn parse_command(&mut self, command: &str, schema: &OptionSchema) -> Result<()> {
        let stripped = command.replace(COMMAND_PLACEHOLDER, " ");
        let tokens = shlex::split(&stripped).ok_or_else(|| {
            LaunchError::Tokenize(format!("unbalanced quotes in '{}'", command.trim()))
        })?;

        self.reset();

        let mut assignments = Vec::new();
        let mut flags = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() && !is_flag(key) => {
                    assignments.push((key.to_string(), value.to_string()));
                }
                _ => flags.push(token),
            }
        }

        for (key, value) in assignments {
            self.apply_assignment(schema, key, value);
        }

        let general = schema.general();
        let mut i = 0;
        while i < flags.len() {
            let token = flags[i].as_str();
            i += 1;

            if let Some(tool) = schema.tool_by_prefix(token) {
                self.set_enabled(&tool.name, true);
                if let Some(key) = tool.prefix_toggle() {
                    self.set_toggle(&tool.name, key, true);
                }
                if let Some(suffix) = tool.command_suffix.as_deref() {
                    i = self.parse_scoped(tool, suffix, &flags, i);
                }
            } else if general.toggle(token).is_some() {
                self.set_general_toggle(token, true);
            } else if general.input(token).is_some() {
                if let Some(value) = flags.get(i).filter(|v| !looks_like_flag(v)) {
                    self.set_general_input(token, value.as_str());
                    i += 1;
                }
            } else if general.dropdown(token).is_some() {
                if let Some(value) = flags.get(i).filter(|v| !looks_like_flag(v)) {
                    self.set_general_dropdown(token, value.as_str());
                    i += 1;
                }
            } else if let Some(tool) = schema.flag_toggle_owner(token) {
                self.set_toggle(&tool.name, token, true);
                self.set_enabled(&tool.name, true);
            } else if !schema.is_suffix(token) {
                debug!("Ignoring unrecognized launch option '{}'", token);
            }
        }

        Ok(())
    }

    fn apply_assignment(&mut self, schema: &OptionSchema, key: String, value: String) {
        let Some((tool, option)) = schema.env_option(&key) else {
            debug!("Ignoring unknown environment variable '{}'", key);
            return;
        };
        let tool_name = tool.name.as_str();

        match option.class() {
            OptionClass::Toggle => {
                if value == "1" {
                    self.set_toggle(tool_name, &key, true);
                }
            }
            OptionClass::Input => self.set_input(tool_name, &key, value),
            OptionClass::Dropdown => self.set_dropdown(tool_name, &key, value),
            OptionClass::Slider => match value.parse::<f64>() {
                Ok(number) if number.is_finite() => self.set_slider(tool_name, &key, number),
                _ => {
                    warn!("Invalid slider value for {}: {}", key, value);
                    return;
                }
            },
        }
        self.set_enabled(tool_name, true);
    }

    /// Consumes a suffix-terminated tool scope starting at `start`, returning
    /// the index just past the suffix.
    fn parse_scoped(&mut self, tool: &ToolConfig, suffix: &str, flags: &[String], start: usize) -> usize {
        let mut i = start;
        while i < flags.len() {
            let token = flags[i].as_str();
            i += 1;
            if token == suffix {
                break;
            }

            let Some(option) = tool.option(token).filter(|o| o.is_flag()) else {
                debug!("Ignoring unrecognized {} option '{}'", tool.name, token);
                continue;
            };
            if option.class() == OptionClass::Toggle {
                self.set_toggle(&tool.name, token, true);
                continue;
            }

            let Some(value) = flags.get(i).filter(|v| v.as_str() != suffix && !is_flag(v)) else {
                continue;
            };
            i += 1;
            match option.class() {
                OptionClass::Input => self.set_input(&tool.name, token, value.as_str()),
                OptionClass::Dropdown => self.set_dropdown(&tool.name, token, value.as_str()),
                _ => match value.parse::<f64>() {
                    Ok(number) if number.is_finite() => self.set_slider(&tool.name, token, number),
                    _ => warn!("Invalid slider value for {}: {}", token, value),
                },
            }
        }
        i
    }

    /// Lists the values that would contribute to the generated string.
    pub fn active_options(&self, schema: &OptionSchema) -> Vec<ActiveOption> {
        let mut active = Vec::new();
        let mut push = |scope: &str, key: &str, value: String| {
            active.push(ActiveOption {
                scope: scope.to_string(),
                key: key.to_string(),
                value,
            })
        };

        let general = schema.general();
        for option in &general.toggles {
            if self.toggle(Scope::General, &option.key) {
                push("General", &option.key, "on".to_string());
            }
        }
        for option in &general.inputs {
            if let Some(value) = non_empty(self.general_inputs.get(&option.key)) {
                push("General", &option.key, value.to_string());
            }
        }
        for option in &general.dropdowns {
            if self.toggle(Scope::General, &option.key) {
                let value = self.dropdown(Scope::General, &option.key).unwrap_or("default");
                push("General", &option.key, value.to_string());
            }
        }

        for tool in schema.tools() {
            if !self.is_enabled(&tool.name) {
                continue;
            }
            let scope = Scope::Tool(&tool.name);
            for option in &tool.options {
                let value = match option.class() {
                    OptionClass::Toggle => self.toggle(scope, &option.key).then(|| "on".to_string()),
                    OptionClass::Input => self
                        .input(scope, &option.key)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                    OptionClass::Dropdown => self
                        .dropdown(scope, &option.key)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                    OptionClass::Slider => {
                        let value = self.slider(&tool.name, &option.key);
                        (value != 0.0).then(|| format!("{:.2}", value))
                    }
                };
                if let Some(value) = value {
                    push(&tool.name, &option.key, value);
                }
            }
        }

        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> OptionSchema {
        OptionSchema::builtin().unwrap()
    }

    fn parsed(command: &str) -> LaunchOptions {
        let mut options = LaunchOptions::new();
        options.parse_command(command, &schema()).unwrap();
        options
    }

    #[test]
    fn reset_model_generates_bare_placeholder() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("MangoHud", true);
        options.set_general_toggle("-fullscreen", true);
        options.reset();
        assert_eq!(options.generate_command(&schema).unwrap(), "%command%");
    }

    #[test]
    fn disabled_tool_contributes_nothing() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_toggle("MangoHud", "MANGOHUD", true);
        options.set_input("MangoHud", "MANGOHUD_FPS_LIMIT", "60");
        options.set_slider("vkBasalt", "VKBASALT_CAS_SHARPNESS", 0.5);
        options.set_toggle("Gamescope", "-f", true);
        options.set_input("Gamescope", "-W", "1920");
        options.set_enabled("MangoHud", false);
        options.set_enabled("Gamescope", false);

        assert_eq!(options.generate_command(&schema).unwrap(), "%command%");
    }

    #[test]
    fn gamemode_round_trip() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("GameMode", true);
        options.set_toggle("GameMode", "gamemoderun", true);
        assert_eq!(options.generate_command(&schema).unwrap(), "gamemoderun %command%");

        let back = parsed("gamemoderun %command%");
        assert!(back.is_enabled("GameMode"));
        assert!(back.toggle(Scope::Tool("GameMode"), "gamemoderun"));
        assert_eq!(back, options);
    }

    #[test]
    fn mangohud_environment_round_trip() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("MangoHud", true);
        options.set_toggle("MangoHud", "MANGOHUD", true);
        options.set_input("MangoHud", "MANGOHUD_FPS_LIMIT", "60");

        let command = options.generate_command(&schema).unwrap();
        assert_eq!(command, "MANGOHUD=1 MANGOHUD_FPS_LIMIT=60 mangohud %command%");

        let back = parsed(&command);
        assert!(back.is_enabled("MangoHud"));
        assert!(back.toggle(Scope::Tool("MangoHud"), "MANGOHUD"));
        assert_eq!(back.input(Scope::Tool("MangoHud"), "MANGOHUD_FPS_LIMIT"), Some("60"));
    }

    #[test]
    fn gamescope_flags_stay_in_their_scope() {
        let options = parsed("gamescope -f -W 1920 -- %command%");

        assert!(options.is_enabled("Gamescope"));
        assert!(options.toggle(Scope::Tool("Gamescope"), "-f"));
        assert_eq!(options.input(Scope::Tool("Gamescope"), "-W"), Some("1920"));
        assert!(options.general_toggles.is_empty());
        assert!(options.general_inputs.is_empty());
        assert_eq!(options.tab_enabled.len(), 1);
        assert_eq!(options.tab_inputs.len(), 1);
    }

    #[test]
    fn flags_after_the_suffix_are_general() {
        let options = parsed("gamescope -W 2560 -- %command% -w 1920 -novid");
        assert_eq!(options.input(Scope::Tool("Gamescope"), "-W"), Some("2560"));
        assert_eq!(options.input(Scope::Tool("Gamescope"), "-w"), None);
        assert_eq!(options.input(Scope::General, "-w"), Some("1920"));
        assert!(options.toggle(Scope::General, "-novid"));
    }

    #[test]
    fn unknown_variables_are_ignored() {
        let options = parsed("UNKNOWN_VAR=foo %command%");
        assert_eq!(options, LaunchOptions::default());
    }

    #[test]
    fn zero_slider_is_omitted() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("vkBasalt", true);
        options.set_slider("vkBasalt", "VKBASALT_CAS_SHARPNESS", 0.0);
        assert_eq!(options.generate_command(&schema).unwrap(), "%command%");

        options.set_slider("vkBasalt", "VKBASALT_CAS_SHARPNESS", 0.004);
        assert_eq!(options.generate_command(&schema).unwrap(), "%command%");

        options.set_slider("vkBasalt", "VKBASALT_CAS_SHARPNESS", 0.01);
        assert_eq!(
            options.generate_command(&schema).unwrap(),
            "VKBASALT_CAS_SHARPNESS=0.01 %command%"
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected_without_touching_the_model() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_general_toggle("-console", true);

        let err = options
            .parse_command("WINEDEBUG=\"unterminated %command%", &schema)
            .unwrap_err();
        assert!(matches!(err, LaunchError::Tokenize(_)));
        assert!(options.toggle(Scope::General, "-console"));
    }

    #[test]
    fn values_with_spaces_survive_quoting() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("Wine", true);
        options.set_input("Wine", "WINEPREFIX", "/home/me/My Games/prefix");
        options.set_general_input("-debug_file", "/tmp/debug log.txt");

        let command = options.generate_command(&schema).unwrap();
        assert!(!command.contains("WINEPREFIX=/home/me/My Games"));

        let back = parsed(&command);
        assert_eq!(
            back.input(Scope::Tool("Wine"), "WINEPREFIX"),
            Some("/home/me/My Games/prefix")
        );
        assert_eq!(back.input(Scope::General, "-debug_file"), Some("/tmp/debug log.txt"));
    }

    #[test]
    fn command_tokens_follow_schema_order() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.set_enabled("Gamescope", true);
        options.set_toggle("Gamescope", "-f", true);
        options.set_input("Gamescope", "-W", "2560");
        options.set_dropdown("Gamescope", "-F", "fsr");
        options.set_enabled("GameMode", true);
        options.set_enabled("DXVK", true);
        options.set_toggle("DXVK", "DXVK_ASYNC", true);
        options.set_general_toggle("-fullscreen", true);
        options.set_general_input("-w", "1920");
        options.set_general_dropdown("-dxlevel", "95");

        assert_eq!(
            options.generate_command(&schema).unwrap(),
            "DXVK_ASYNC=1 gamemoderun gamescope -f -W 2560 -F fsr -- -fullscreen -w 1920 -dxlevel 95 %command%"
        );
    }

    #[test]
    fn dxlevel_requires_its_enable_toggle() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options.general_dropdowns.insert("-dxlevel".to_string(), "81".to_string());
        assert_eq!(options.generate_command(&schema).unwrap(), "%command%");

        options.general_dropdowns.clear();
        options.set_general_toggle("-dxlevel", true);
        assert_eq!(options.generate_command(&schema).unwrap(), "-dxlevel 90 %command%");
    }

    #[test]
    fn general_input_without_value_stays_unset() {
        let options = parsed("-w -fullscreen %command%");
        assert_eq!(options.input(Scope::General, "-w"), None);
        assert!(options.toggle(Scope::General, "-fullscreen"));
    }

    #[test]
    fn prefix_alone_enables_tool() {
        let options = parsed("mangohud %command%");
        assert!(options.is_enabled("MangoHud"));
        assert!(options.tab_toggles.is_empty());
    }

    #[test]
    fn toggle_assignment_other_than_one_stays_off() {
        let options = parsed("MANGOHUD=0 %command%");
        assert!(options.is_enabled("MangoHud"));
        assert!(!options.toggle(Scope::Tool("MangoHud"), "MANGOHUD"));
    }

    #[test]
    fn bad_slider_value_is_skipped() {
        let options = parsed("VKBASALT_CAS_SHARPNESS=sharp ENABLE_VKBASALT=1 %command%");
        assert!(options.tab_sliders.is_empty());
        assert!(options.toggle(Scope::Tool("vkBasalt"), "ENABLE_VKBASALT"));
    }

    #[test]
    fn slider_assignment_parses_as_float() {
        let options = parsed("VKBASALT_CAS_SHARPNESS=0.75 %command%");
        assert!(options.is_enabled("vkBasalt"));
        assert_eq!(options.slider("vkBasalt", "VKBASALT_CAS_SHARPNESS"), 0.75);
    }

    #[test]
    fn stray_tool_flag_enables_its_tool() {
        let options = parsed("-f %command%");
        assert!(options.is_enabled("Gamescope"));
        assert!(options.toggle(Scope::Tool("Gamescope"), "-f"));
    }

    #[test]
    fn dropdown_values_are_kept_verbatim() {
        let options = parsed("DXVK_LOG_LEVEL=chatty %command%");
        assert_eq!(options.dropdown(Scope::Tool("DXVK"), "DXVK_LOG_LEVEL"), Some("chatty"));
    }

    #[test]
    fn stale_keys_are_dropped_on_load() {
        let schema = schema();
        let value = serde_json::json!({
            "general_toggles": {"-fullscreen": true, "-oldflag": true},
            "tab_enabled": {"MangoHud": true, "RemovedTool": true},
            "tab_toggles": {"MangoHud": {"MANGOHUD": true, "MANGOHUD_GONE": true}},
            "tab_sliders": {"RemovedTool": {"X": 1.0}}
        });

        let options = LaunchOptions::from_dict(value, &schema).unwrap();
        assert_eq!(options.general_toggles.len(), 1);
        assert_eq!(options.tab_enabled.keys().collect::<Vec<_>>(), vec!["MangoHud"]);
        assert_eq!(options.tab_toggles["MangoHud"].len(), 1);
        assert!(options.tab_sliders.is_empty());
    }

    #[test]
    fn dict_form_has_every_section() {
        let value = LaunchOptions::new().to_dict().unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "general_toggles",
            "general_inputs",
            "general_dropdowns",
            "tab_enabled",
            "tab_toggles",
            "tab_inputs",
            "tab_dropdowns",
            "tab_sliders",
        ] {
            assert!(object.contains_key(key), "{}", key);
        }
    }

    #[test]
    fn assign_parses_by_option_kind() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        options
            .assign(&schema, Scope::Tool("mangohud"), "MANGOHUD_FPS_LIMIT", Some("90"))
            .unwrap();
        options
            .assign(&schema, Scope::Tool("vkBasalt"), "VKBASALT_CAS_SHARPNESS", Some("0.4"))
            .unwrap();
        options.assign(&schema, Scope::General, "-novid", None).unwrap();
        options.assign(&schema, Scope::General, "-dxlevel", Some("81")).unwrap();

        assert!(options.is_enabled("MangoHud"));
        assert_eq!(options.slider("vkBasalt", "VKBASALT_CAS_SHARPNESS"), 0.4);
        assert_eq!(
            options.generate_command(&schema).unwrap(),
            "MANGOHUD_FPS_LIMIT=90 VKBASALT_CAS_SHARPNESS=0.40 mangohud -novid -dxlevel 81 %command%"
        );
    }

    #[test]
    fn assign_rejects_bad_input() {
        let schema = schema();
        let mut options = LaunchOptions::new();
        assert!(matches!(
            options.assign(&schema, Scope::Tool("Nope"), "X", Some("1")),
            Err(LaunchError::UnknownTool(_))
        ));
        assert!(matches!(
            options.assign(&schema, Scope::Tool("DXVK"), "DXVK_LOG_LEVEL", Some("chatty")),
            Err(LaunchError::InvalidValue { .. })
        ));
        assert!(matches!(
            options.assign(&schema, Scope::Tool("vkBasalt"), "VKBASALT_CAS_SHARPNESS", Some("2.5")),
            Err(LaunchError::InvalidValue { .. })
        ));
        assert!(options.tab_enabled.is_empty());
    }

    #[test]
    fn active_options_follow_schema_order() {
        let options = parsed("MANGOHUD=1 gamemoderun %command% -novid");
        let active: Vec<_> = options
            .active_options(&schema())
            .into_iter()
            .map(|o| format!("{}:{}", o.scope, o.key))
            .collect();
        assert_eq!(active, vec!["General:-novid", "MangoHud:MANGOHUD", "GameMode:gamemoderun"]);
    }
}
