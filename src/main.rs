use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use closnet::config_loader::{self, CliOverrides};
use closnet::output::{self, DocumentFormat};
use closnet::template;
use closnet::topology;

/// Clos fabric generator for tinet labs with BGP unnumbered
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML fabric file; explicit flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of spine switches [default: 2]
    #[arg(long)]
    spines: Option<usize>,

    /// Number of leaf switch pairs [default: 1]
    #[arg(long)]
    leaf_pairs: Option<usize>,

    /// Number of ToR switches per leaf pair [default: 2]
    #[arg(long)]
    tors_per_pair: Option<usize>,

    /// Number of servers per ToR [default: 2]
    #[arg(long)]
    servers_per_tor: Option<usize>,

    /// Number of border leaf switches [default: 1]
    #[arg(long, alias = "border-leafs")]
    border_leaves: Option<usize>,

    /// Number of external routers [default: 1]
    #[arg(long)]
    routers: Option<usize>,

    /// Directory receiving the per-node BIRD configs [default: ./output]
    #[arg(long)]
    bird_config_dir: Option<PathBuf>,

    /// Per-role BIRD template document [default: templates.yaml]
    #[arg(long)]
    bird_templates: Option<PathBuf>,

    /// Attach routers to an external bridge with NAT towards the host
    #[arg(long)]
    external_network: bool,

    /// Host interface used for external connectivity
    #[arg(long)]
    external_interface: Option<String>,

    /// Write the topology document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Topology document format
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    format: DocumentFormat,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            spines: self.spines,
            leaf_pairs: self.leaf_pairs,
            tors_per_pair: self.tors_per_pair,
            servers_per_tor: self.servers_per_tor,
            border_leafs: self.border_leaves,
            routers: self.routers,
            bird_config_dir: self.bird_config_dir.clone(),
            bird_templates: self.bird_templates.clone(),
            external_network: self.external_network,
            external_interface: self.external_interface.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Logs go to stderr; stdout carries the topology document
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting closnet fabric generator");

    let config = config_loader::resolve_config(args.config.as_deref(), args.overrides())?;

    let templates = template::load_templates(&config.bird_templates)
        .wrap_err("Failed to load BIRD templates")?;

    let fabric = topology::build_fabric(&config, &templates).wrap_err("Failed to build fabric")?;
    info!(
        "Built {} nodes and {} links",
        fabric.nodes.len(),
        fabric.link_count
    );

    output::write_bird_configs(&config.bird_config_dir, fabric.bird_configs())
        .wrap_err("Failed to write BIRD configs")?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("Failed to create output file '{}'", path.display()))?;
            let mut writer = BufWriter::new(file);
            output::write_document(&mut writer, &fabric.document, args.format)
                .wrap_err_with(|| format!("Failed to write topology document to '{}'", path.display()))?;
            writer.flush()?;
            info!("Wrote topology document to {:?}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            output::write_document(&mut writer, &fabric.document, args.format)
                .wrap_err("Failed to write topology document to stdout")?;
            writer.flush()?;
        }
    }

    if let Some(external_interface) = config.external_interface().filter(|_| config.external_network) {
        eprintln!();
        eprintln!("External network enabled. Run on the host after 'tinet up':");
        for hint in output::host_setup_hints(external_interface) {
            eprintln!("  sudo {}", hint);
        }
    }

    Ok(())
}
