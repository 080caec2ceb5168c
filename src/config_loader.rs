use crate::config::FabricConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Load and parse a fabric configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<FabricConfig> {
    info!("Loading fabric configuration from: {:?}", config_path);

    let content = fs::read_to_string(config_path)
        .wrap_err_with(|| format!("Failed to read fabric config '{}'", config_path.display()))?;

    // An empty file means "all defaults"
    if content.trim().is_empty() {
        return Ok(FabricConfig::default());
    }

    let config: FabricConfig = serde_yaml::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse fabric config '{}'", config_path.display()))?;

    Ok(config)
}

/// Values given explicitly on the command line. Each one replaces the
/// corresponding field of the loaded (or default) configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub spines: Option<usize>,
    pub leaf_pairs: Option<usize>,
    pub tors_per_pair: Option<usize>,
    pub servers_per_tor: Option<usize>,
    pub border_leafs: Option<usize>,
    pub routers: Option<usize>,
    pub bird_config_dir: Option<PathBuf>,
    pub bird_templates: Option<PathBuf>,
    pub external_network: bool,
    pub external_interface: Option<String>,
}

/// Apply CLI overrides to a fabric configuration and validate the result
pub fn apply_overrides(config: &mut FabricConfig, overrides: CliOverrides) -> Result<()> {
    fn set<T: std::fmt::Debug>(field: &str, target: &mut T, value: Option<T>) {
        if let Some(value) = value {
            debug!("Overriding {} with {:?}", field, value);
            *target = value;
        }
    }

    set("spines", &mut config.spines, overrides.spines);
    set("leaf_pairs", &mut config.leaf_pairs, overrides.leaf_pairs);
    set("tors_per_pair", &mut config.tors_per_pair, overrides.tors_per_pair);
    set("servers_per_tor", &mut config.servers_per_tor, overrides.servers_per_tor);
    set("border_leafs", &mut config.border_leafs, overrides.border_leafs);
    set("routers", &mut config.routers, overrides.routers);
    set("bird_config_dir", &mut config.bird_config_dir, overrides.bird_config_dir);
    set("bird_templates", &mut config.bird_templates, overrides.bird_templates);

    // A flag can only turn external networking on
    if overrides.external_network {
        config.external_network = true;
    }
    if overrides.external_interface.is_some() {
        config.external_interface = overrides.external_interface;
    }

    config.validate().wrap_err("Invalid fabric configuration")?;

    Ok(())
}

/// Resolve the effective configuration: the YAML file if one is given,
/// otherwise defaults, with CLI overrides applied on top
pub fn resolve_config(config_path: Option<&Path>, overrides: CliOverrides) -> Result<FabricConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => FabricConfig::default(),
    };

    apply_overrides(&mut config, overrides)?;

    info!(
        "Fabric: {} spines, {} leaf pairs, {} ToRs, {} servers, {} border leafs, {} routers",
        config.spines,
        config.leaf_pairs,
        config.total_tors(),
        config.total_servers(),
        config.border_leafs,
        config.routers
    );

    Ok(config)
}
