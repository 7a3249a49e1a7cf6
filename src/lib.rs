//! Splicing of embedded `<template>` tags into JavaScript and TypeScript syntax trees.
//!
//! A file is processed in one sequential pass:
//!
//! 1. the [scanner] finds every template region,
//! 2. the [rewriter] replaces each region with a same-length placeholder the host grammar
//!    accepts,
//! 3. the [host] parser parses the rewritten text,
//! 4. the [reconcile] step replaces each placeholder node with its template,
//! 5. a completion check makes sure no template was lost on the way.
//!
//! Any failure aborts the file; there is no partial result.

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod host;
pub mod occurrence;
pub mod reconcile;
pub mod rewriter;
pub mod scanner;
pub mod utils;

pub use config::{Config, ConfigError};
pub use error::{SourceLocation, SpliceError};
pub use host::{Dialect, HostNode, HostTree, SyntaxKind, SyntaxNode, TemplateMarker, TemplateNode};
pub use occurrence::{RawTemplate, TemplateKind};

use crate::host::{HostOptions, HostParser, TreeSitterHost};
use crate::reconcile::{DefaultTemplatePredicate, ExportDefaultPredicate, ReconcileReport};
use crate::rewriter::Placeholder;
use crate::scanner::{ContentTagParser, TemplateParser};
use serde::Serialize;
use std::ops::Range;
use std::path::Path;
use std::time::Instant;

/// A host tree with every template attached to its node.
#[derive(Debug, Clone, Serialize)]
pub struct SplicedDocument {
    pub file: String,
    pub dialect: Dialect,
    /// Number of templates found, equal to the number of template nodes in `tree`
    pub templates: usize,
    pub tree: HostTree,
    /// The text the host parser saw
    pub rewritten: String,
    /// Placeholder used for each template, in scan order
    pub placeholders: Vec<Placeholder>,
    /// How each template found its node
    pub report: ReconcileReport,
}

impl SplicedDocument {
    /// Template nodes in tree pre-order
    pub fn template_nodes(&self) -> impl Iterator<Item = &TemplateNode> {
        self.tree.template_nodes()
    }
}

/// The splicing pipeline with its collaborators.
pub struct Splicer {
    config: Config,
    template_parser: Box<dyn TemplateParser>,
    host_parser: Box<dyn HostParser>,
    default_predicate: Box<dyn DefaultTemplatePredicate>,
}

impl Splicer {
    pub fn new(config: Config) -> Self {
        let default_predicate = ExportDefaultPredicate {
            implicit_top_level: config.implicit_default_template,
        };
        Self {
            config,
            template_parser: Box::new(ContentTagParser),
            host_parser: Box::new(TreeSitterHost),
            default_predicate: Box::new(default_predicate),
        }
    }

    pub fn with_template_parser(mut self, parser: impl TemplateParser + 'static) -> Self {
        self.template_parser = Box::new(parser);
        self
    }

    pub fn with_host_parser(mut self, parser: impl HostParser + 'static) -> Self {
        self.host_parser = Box::new(parser);
        self
    }

    pub fn with_default_predicate(mut self, predicate: impl DefaultTemplatePredicate + 'static) -> Self {
        self.default_predicate = Box::new(predicate);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Splice the templates of one file. `file_path` picks the dialect when the config does
    /// not, and appears in diagnostics.
    pub fn splice(&self, source: &str, file_path: &str) -> Result<SplicedDocument, SpliceError> {
        let start = Instant::now();

        let templates = scanner::scan(self.template_parser.as_ref(), source, file_path)?;
        let scanned: Vec<Range<usize>> = templates.iter().map(|t| t.range.clone()).collect();

        let rewritten = rewriter::rewrite(source, templates)?;

        let dialect = self.config.dialect_for(Path::new(file_path));
        let options = HostOptions {
            dialect,
            file_path: file_path.to_string(),
        };
        let mut tree = self.host_parser.parse(&rewritten.text, &options)?;

        let report = reconcile::reconcile(&mut tree, rewritten.templates, self.default_predicate.as_ref())?;
        let templates = reconcile::verify_complete(&tree, &scanned)?;

        log::debug!(
            "{file_path}: spliced {templates} template(s) as {dialect}, {} via tolerance, in {:?}",
            report.tolerant_matches(),
            start.elapsed()
        );

        Ok(SplicedDocument {
            file: file_path.to_string(),
            dialect,
            templates,
            tree,
            rewritten: rewritten.text,
            placeholders: rewritten.placeholders,
            report,
        })
    }
}

impl Default for Splicer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Splice `source` with the default configuration.
pub fn splice(source: &str, file_path: &str) -> Result<SplicedDocument, SpliceError> {
    Splicer::default().splice(source, file_path)
}
