use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LaunchError, Result};
use crate::launch_options::{LaunchOptions, Scope};
use crate::schema::{InputKind, OptionKind, OptionSchema, OptionSpec};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid color pattern"));

const MAX_RESOLUTION: i64 = 16384;

pub fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

/// Empty values are valid everywhere: they mean "use the default".
pub fn validate_path(key: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Ok(());
    }
    let path = expand_home(raw);
    if !path.exists() {
        return Err(LaunchError::invalid(key, format!("path does not exist: {}", path.display())));
    }
    Ok(())
}

pub fn validate_number(key: &str, raw: &str, min: Option<f64>, max: Option<f64>) -> Result<()> {
    if raw.is_empty() {
        return Ok(());
    }
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| LaunchError::invalid(key, "value must be a number"))?;
    if !value.is_finite() {
        return Err(LaunchError::invalid(key, "value must be a number"));
    }
    if let Some(min) = min.filter(|min| value < *min) {
        return Err(LaunchError::invalid(key, format!("value must be at least {}", min)));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(LaunchError::invalid(key, format!("value must be at most {}", max)));
    }
    Ok(())
}

pub fn validate_integer(key: &str, raw: &str, min: Option<i64>, max: Option<i64>) -> Result<()> {
    if raw.is_empty() {
        return Ok(());
    }
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| LaunchError::invalid(key, "value must be an integer"))?;
    if let Some(min) = min.filter(|min| value < *min) {
        return Err(LaunchError::invalid(key, format!("value must be at least {}", min)));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(LaunchError::invalid(key, format!("value must be at most {}", max)));
    }
    Ok(())
}

pub fn validate_color(key: &str, raw: &str) -> Result<()> {
    if raw.is_empty() || HEX_COLOR.is_match(raw) {
        Ok(())
    } else {
        Err(LaunchError::invalid(key, "color must be in hex format (e.g., #FF0000)"))
    }
}

pub fn validate_resolution(width: &str, height: &str) -> Result<()> {
    validate_integer("width", width, Some(1), Some(MAX_RESOLUTION))?;
    validate_integer("height", height, Some(1), Some(MAX_RESOLUTION))
}

/// Checks front-end text against the option's declared constraints.
///
/// Path inputs are not checked for existence here; a profile may target
/// another machine. `option_warnings` reports missing paths instead.
pub fn validate_option_value(option: &OptionSpec, raw: &str) -> Result<()> {
    let key = option.key.as_str();
    match &option.kind {
        OptionKind::Toggle => parse_toggle(raw)
            .map(|_| ())
            .ok_or_else(|| LaunchError::invalid(key, "expected on/off")),
        OptionKind::Input { value_kind, .. } => match value_kind {
            InputKind::Text | InputKind::Path => Ok(()),
            InputKind::Integer => validate_integer(key, raw, None, None),
            InputKind::Number => validate_number(key, raw, None, None),
            InputKind::Color => validate_color(key, raw),
        },
        OptionKind::Dropdown { options, .. } => {
            if options.iter().any(|o| o == raw) {
                Ok(())
            } else {
                Err(LaunchError::invalid(key, format!("expected one of: {}", options.join(", "))))
            }
        }
        OptionKind::Slider { min, max } => {
            if raw.is_empty() {
                return Err(LaunchError::invalid(key, "a value is required"));
            }
            validate_number(key, raw, Some(*min), Some(*max))
        }
    }
}

fn value_warning(option: &OptionSpec, value: &str) -> Option<String> {
    let result = match &option.kind {
        OptionKind::Input {
            value_kind: InputKind::Path,
            ..
        } => validate_path(&option.key, value),
        _ => validate_option_value(option, value),
    };
    result.err().map(|e| e.to_string())
}

/// Conflicting or questionable settings in the current model.
pub fn option_warnings(options: &LaunchOptions, schema: &OptionSchema) -> Vec<String> {
    let on = |key: &str| options.toggle(Scope::General, key);
    let mut warnings = Vec::new();

    if on("-fullscreen") && on("-windowed") {
        warnings.push("Conflicting options: -fullscreen and -windowed cannot be used together".to_string());
    }
    if on("-fullscreen") && on("-nofullscreen") {
        warnings.push("Conflicting options: -fullscreen and -nofullscreen cannot be used together".to_string());
    }
    let priorities: Vec<_> = ["-high", "-low", "-veryhigh", "-background"]
        .into_iter()
        .filter(|&key| on(key))
        .collect();
    if priorities.len() > 1 {
        warnings.push(format!("Conflicting priority options: {}", priorities.join(", ")));
    }
    if on("-nosound") && options.input(Scope::General, "-soundbuffer").is_some_and(|v| !v.is_empty()) {
        warnings.push("Conflicting sound options: -nosound will override -soundbuffer".to_string());
    }
    if on("-fullscreen") && on("-noborder") {
        warnings.push("Potentially unnecessary: -noborder has no effect in fullscreen mode".to_string());
    }

    let general = schema.general();
    for option in general.inputs.iter() {
        if let Some(value) = options.input(Scope::General, &option.key).filter(|v| !v.is_empty()) {
            warnings.extend(value_warning(option, value));
        }
    }
    if let (Some(width), Some(height)) = (
        options.input(Scope::General, "-w"),
        options.input(Scope::General, "-h"),
    ) {
        if let Err(e) = validate_resolution(width, height) {
            warnings.push(e.to_string());
        }
    }
    for option in general.dropdowns.iter() {
        if let Some(value) = options.dropdown(Scope::General, &option.key).filter(|v| !v.is_empty()) {
            warnings.extend(value_warning(option, value));
        }
    }

    for tool in schema.tools() {
        if !options.is_enabled(&tool.name) {
            continue;
        }
        let scope = Scope::Tool(&tool.name);
        for option in tool.inputs() {
            if let Some(value) = options.input(scope, &option.key).filter(|v| !v.is_empty()) {
                warnings.extend(value_warning(option, value).map(|w| format!("{}: {}", tool.name, w)));
            }
        }
        for option in tool.dropdowns() {
            if let Some(value) = options.dropdown(scope, &option.key).filter(|v| !v.is_empty()) {
                warnings.extend(value_warning(option, value).map(|w| format!("{}: {}", tool.name, w)));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_respect_bounds() {
        assert!(validate_number("x", "0.5", Some(0.0), Some(1.0)).is_ok());
        assert!(validate_number("x", "1.5", Some(0.0), Some(1.0)).is_err());
        assert!(validate_number("x", "abc", None, None).is_err());
        assert!(validate_number("x", "", Some(1.0), None).is_ok());
    }

    #[test]
    fn resolution_limits() {
        assert!(validate_resolution("1920", "1080").is_ok());
        assert!(validate_resolution("0", "1080").is_err());
        assert!(validate_resolution("1920", "99999").is_err());
    }

    #[test]
    fn colors_must_be_hex() {
        assert!(validate_color("c", "#FF0000").is_ok());
        assert!(validate_color("c", "#abc").is_ok());
        assert!(validate_color("c", "red").is_err());
    }

    #[test]
    fn missing_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_path("p", dir.path().to_str().unwrap()).is_ok());
        assert!(validate_path("p", &dir.path().join("missing").display().to_string()).is_err());
    }

    #[test]
    fn toggle_words() {
        assert_eq!(parse_toggle("On"), Some(true));
        assert_eq!(parse_toggle("0"), Some(false));
        assert_eq!(parse_toggle("maybe"), None);
    }

    #[test]
    fn warns_about_conflicting_general_flags() {
        let schema = OptionSchema::builtin().unwrap();
        let mut options = LaunchOptions::new();
        options.set_general_toggle("-fullscreen", true);
        options.set_general_toggle("-windowed", true);
        options.set_general_toggle("-high", true);
        options.set_general_toggle("-low", true);

        let warnings = option_warnings(&options, &schema);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("-high, -low"));
    }

    #[test]
    fn warns_about_parsed_values_outside_the_schema() {
        let schema = OptionSchema::builtin().unwrap();
        let mut options = LaunchOptions::new();
        options
            .parse_command("DXVK_LOG_LEVEL=chatty MANGOHUD_COLOR=red %command%", &schema)
            .unwrap();

        let warnings = option_warnings(&options, &schema);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.starts_with("MangoHud:")));
        assert!(warnings.iter().any(|w| w.starts_with("DXVK:")));
    }
}
