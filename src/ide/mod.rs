//! IDE features: high-level APIs for editor requests.
//!
//! This module sits between the semantic model (HIR) and whatever editor
//! protocol a client speaks. Each function corresponds to one request.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: Take a snapshot in, return data out
//! 2. **No protocol types**: Positions are our own, converted at the boundary
//! 3. **Composable**: Built on top of HIR resolution
//!
//! ## Usage
//!
//! ```
//! use nixref::ide::AnalysisHost;
//! use nixref::TextSize;
//!
//! let mut host = AnalysisHost::new();
//! let file = host.set_file_content("default.nix", "let pkgs = {}; in pkgs");
//!
//! let analysis = host.analysis();
//! let targets = analysis.goto_definition(file, TextSize::from(19));
//! assert_eq!(targets[0].name, "pkgs");
//! ```

mod analysis;
mod goto;
mod navigation;
mod references;
mod semantic_tokens;

pub use crate::hir::Presentation;
pub use analysis::{Analysis, AnalysisHost, FileData, LoadError};
pub use goto::goto_definition;
pub use navigation::NavigationTarget;
pub use references::{Reference, find_references};
pub use semantic_tokens::{SemanticToken, TokenType, semantic_tokens};
