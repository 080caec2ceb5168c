//! Per-role BIRD configuration templates.
//!
//! The template document is a YAML mapping from role to a Tera template
//! body. Each body is rendered against the node's router ID, ASN and its
//! ordered BGP neighbor list.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::topology::NeighborDescriptor;

/// Fabric role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Spine,
    Leaf,
    BorderLeaf,
    Tor,
    Server,
    Router,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Spine,
        Role::Leaf,
        Role::BorderLeaf,
        Role::Tor,
        Role::Server,
        Role::Router,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Spine => "spine",
            Role::Leaf => "leaf",
            Role::BorderLeaf => "border-leaf",
            Role::Tor => "tor",
            Role::Server => "server",
            Role::Router => "router",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template bodies, one per role. Roles missing from the document render
/// as empty configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub spine: String,
    pub leaf: String,
    #[serde(rename = "bl", alias = "border-leaf", alias = "border_leaf")]
    pub border_leaf: String,
    pub tor: String,
    pub server: String,
    pub router: String,
}

/// Data a template body is rendered against
#[derive(Debug, Serialize)]
pub struct TemplateData<'a> {
    pub router_id: String,
    pub asn: u32,
    pub neighbors: &'a [NeighborDescriptor],
}

/// Template loading and rendering errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template document {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed template document {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to render {role} template")]
    Render {
        role: Role,
        #[source]
        source: tera::Error,
    },
}

impl Templates {
    /// Template body for a role
    pub fn body(&self, role: Role) -> &str {
        match role {
            Role::Spine => &self.spine,
            Role::Leaf => &self.leaf,
            Role::BorderLeaf => &self.border_leaf,
            Role::Tor => &self.tor,
            Role::Server => &self.server,
            Role::Router => &self.router,
        }
    }

    /// Use the same body for every role
    pub fn uniform(body: &str) -> Self {
        Self {
            spine: body.to_string(),
            leaf: body.to_string(),
            border_leaf: body.to_string(),
            tor: body.to_string(),
            server: body.to_string(),
            router: body.to_string(),
        }
    }

    /// Render the template for `role` against `data`.
    ///
    /// Parses the body on every call; builds go through [`TemplateRenderer`].
    pub fn render(&self, role: Role, data: &TemplateData<'_>) -> Result<String, TemplateError> {
        TemplateRenderer::new(self).render(role, data)
    }
}

/// Renders many nodes against one template document, parsing each role's
/// body the first time that role is rendered
pub struct TemplateRenderer<'a> {
    templates: &'a Templates,
    tera: Tera,
    parsed: HashSet<Role>,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(templates: &'a Templates) -> Self {
        Self {
            templates,
            tera: Tera::default(),
            parsed: HashSet::new(),
        }
    }

    /// Number of role bodies parsed so far
    pub fn parsed_roles(&self) -> usize {
        self.parsed.len()
    }

    pub fn render(&mut self, role: Role, data: &TemplateData<'_>) -> Result<String, TemplateError> {
        let render_err = |source| TemplateError::Render { role, source };

        if !self.parsed.contains(&role) {
            self.tera
                .add_raw_template(role.as_str(), self.templates.body(role))
                .map_err(render_err)?;
            self.parsed.insert(role);
        }

        let context = Context::from_serialize(data).map_err(render_err)?;
        self.tera.render(role.as_str(), &context).map_err(render_err)
    }
}

/// Load the template document from a YAML file
pub fn load_templates(path: &Path) -> Result<Templates, TemplateError> {
    info!("Loading templates from: {:?}", path);

    let file = File::open(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let templates: Templates = serde_yaml::from_reader(file).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    for role in Role::ALL {
        if templates.body(role).trim().is_empty() {
            warn!("No template for role '{}'; its nodes get empty configs", role);
        }
    }

    Ok(templates)
}
