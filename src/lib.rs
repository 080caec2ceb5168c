//! # Closnet - Clos fabric generator for tinet labs
//!
//! This library builds a fully addressed multi-tier Clos fabric from a few
//! size parameters and emits a tinet topology document plus one BIRD 2
//! configuration per node. Every session is eBGP over IPv6 link-local
//! addresses (BGP unnumbered).
//!
//! ## Overview
//!
//! The fabric is built tier by tier:
//!
//! spines → leaf pairs → border leafs → ToRs → servers → external routers
//!
//! Each link draws two values from a monotonically increasing counter. Each
//! value becomes a locally administered MAC address, and its EUI-64
//! link-local address is what the far side uses as its BGP neighbor. The
//! same parameters always produce byte-identical output.
//!
//! ## Architecture
//!
//! - `config`: Fabric sizing parameters and validation
//! - `config_loader`: Optional YAML fabric file and CLI overrides
//! - `addressing`: ASN, router ID, MAC and link-local allocation
//! - `template`: Node roles and per-role BIRD templates
//! - `tinet`: Topology document types and serialization
//! - `topology`: Link materializer, tier builder and document assembly
//! - `output`: Config file writer and host setup hints
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use closnet::{config::FabricConfig, output, template, topology};
//!
//! let config = FabricConfig::default();
//! let templates = template::load_templates(&config.bird_templates)?;
//! let fabric = topology::build_fabric(&config, &templates)?;
//!
//! output::write_bird_configs(&config.bird_config_dir, fabric.bird_configs())?;
//! output::write_document(&mut std::io::stdout(), &fabric.document, output::DocumentFormat::Yaml)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Lab Bring-up
//!
//! ```bash
//! closnet --spines 4 --leaf-pairs 2 > spec.yaml
//! tinet upconf -c spec.yaml | sudo sh -x
//! ```
//!
//! ## Error Handling
//!
//! Library modules return `thiserror` enums (`ValidationError`,
//! `AddressError`, `TemplateError`, `BuildError`, `OutputError`). The
//! `config_loader` module and the binary use `color_eyre` for reporting.

pub mod addressing;
pub mod config;
pub mod config_loader;
pub mod output;
pub mod template;
pub mod tinet;
pub mod topology;
