use std::path::PathBuf;

use tracing::debug;

use crate::schema::{OptionSchema, ToolConfig};

/// Answers whether a named program is installed.
#[cfg_attr(test, mockall::automock)]
pub trait SoftwareProbe {
    fn software_present(&self, name: &str) -> bool;
}

/// Looks programs up on `PATH`.
pub struct WhichProbe;

impl SoftwareProbe for WhichProbe {
    fn software_present(&self, name: &str) -> bool {
        match which::which(name) {
            Ok(path) => {
                debug!("Found {} at {}", name, path.display());
                true
            }
            Err(_) => false,
        }
    }
}

/// First existing Steam installation directory.
pub fn steam_root_directory() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".steam/steam"));
        candidates.push(home.join(".local/share/Steam"));
        candidates.push(home.join(".var/app/com.valvesoftware.Steam/data/Steam"));
    }
    candidates.push(PathBuf::from("/usr/share/steam"));
    candidates.push(PathBuf::from("/opt/steam"));

    candidates.into_iter().find(|path| path.is_dir())
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementStatus {
    pub tool: String,
    pub software: String,
    pub present: bool,
}

/// Status of every tool that declares a software requirement, in schema order.
pub fn requirement_status(schema: &OptionSchema, probe: &dyn SoftwareProbe) -> Vec<RequirementStatus> {
    schema
        .tools()
        .iter()
        .filter_map(|tool: &ToolConfig| {
            tool.software_requirement.as_ref().map(|software| RequirementStatus {
                tool: tool.name.clone(),
                software: software.clone(),
                present: probe.software_present(software),
            })
        })
        .collect()
}

pub fn missing_requirements(schema: &OptionSchema, probe: &dyn SoftwareProbe) -> Vec<RequirementStatus> {
    requirement_status(schema, probe)
        .into_iter()
        .filter(|status| !status.present)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn reports_missing_gamemode_daemon() {
        let schema = OptionSchema::builtin().unwrap();
        let mut probe = MockSoftwareProbe::new();
        probe
            .expect_software_present()
            .with(eq("gamemoded"))
            .times(1)
            .return_const(false);
        probe.expect_software_present().return_const(true);

        let missing = missing_requirements(&schema, &probe);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].tool, "GameMode");
        assert_eq!(missing[0].software, "gamemoded");
    }

    #[test]
    fn nothing_missing_when_everything_is_installed() {
        let schema = OptionSchema::builtin().unwrap();
        let mut probe = MockSoftwareProbe::new();
        probe.expect_software_present().return_const(true);

        assert!(missing_requirements(&schema, &probe).is_empty());
        assert!(requirement_status(&schema, &probe).iter().all(|s| s.present));
    }

    #[test]
    fn which_probe_rejects_nonsense_names() {
        assert!(!WhichProbe.software_present("definitely-not-a-real-binary-4f1c"));
    }
}
