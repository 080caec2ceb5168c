//! Writing build results: per-node daemon configs, the topology document,
//! and the host-side setup hints for external networking.

use clap::ValueEnum;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::tinet::{TopologyDocument, EXTERNAL_BRIDGE, EXTERNAL_GATEWAY, EXTERNAL_PREFIX_LEN};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to create directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write topology document")]
    WriteDocument(#[source] std::io::Error),
    #[error("failed to serialize topology document as YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to serialize topology document as JSON")]
    Json(#[from] serde_json::Error),
}

/// Serialization format of the topology document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

/// Serialize the topology document
pub fn render_document(document: &TopologyDocument, format: DocumentFormat) -> Result<String, OutputError> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(document)?),
        DocumentFormat::Json => {
            let mut json = serde_json::to_string_pretty(document)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write the topology document to `writer`. The caller names the
/// destination when reporting errors.
pub fn write_document<W: Write>(
    writer: &mut W,
    document: &TopologyDocument,
    format: DocumentFormat,
) -> Result<(), OutputError> {
    let text = render_document(document, format)?;
    writer
        .write_all(text.as_bytes())
        .map_err(OutputError::WriteDocument)
}

/// Write one `{node}.conf` per node into `dir`, creating it if needed.
///
/// Returns the paths written, in input order.
pub fn write_bird_configs<'a, I>(dir: &Path, configs: I) -> Result<Vec<PathBuf>, OutputError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for (name, config) in configs {
        let path = dir.join(format!("{}.conf", name));
        fs::write(&path, config).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    info!("Wrote {} BIRD configs to {:?}", written.len(), dir);
    Ok(written)
}

/// Commands an operator runs on the host so routers on the external bridge
/// can reach the outside through `external_interface`
pub fn host_setup_hints(external_interface: &str) -> Vec<String> {
    let [a, b, c, _] = EXTERNAL_GATEWAY.octets();
    let subnet = format!("{}.{}.{}.0/{}", a, b, c, EXTERNAL_PREFIX_LEN);

    vec![
        format!("ip addr add {}/{} dev {}", EXTERNAL_GATEWAY, EXTERNAL_PREFIX_LEN, EXTERNAL_BRIDGE),
        format!("ip link set {} up", EXTERNAL_BRIDGE),
        format!(
            "iptables -t nat -A POSTROUTING -s {} -o {} -j MASQUERADE",
            subnet, external_interface
        ),
        format!(
            "iptables -A FORWARD -i {} -o {} -j ACCEPT",
            EXTERNAL_BRIDGE, external_interface
        ),
        format!(
            "iptables -A FORWARD -i {} -o {} -m state --state RELATED,ESTABLISHED -j ACCEPT",
            external_interface, EXTERNAL_BRIDGE
        ),
        "sysctl -w net.ipv4.ip_forward=1".to_string(),
    ]
}
