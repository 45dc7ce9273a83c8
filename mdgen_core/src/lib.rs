//! `mdgen_core` turns markdown into HTML fragments that are safe to embed in
//! a [`minijinja`](https://docs.rs/minijinja) / Jinja host template, and
//! composes those fragments into pages.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   → Renderer (markdown → HTML, raw author HTML is encoded)
//!   → Escaper (HTML characters and template delimiters become character references; markup mode keeps the tags)
//!   → Fragment
//!   → Embedder (fills `{% block name %}` markers of a host template with fragments)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `mdgen.toml` (escape mode, build
//!   directories, template directory and `[data]` namespaces).
//! - [`build`]: Build pipeline. Finds markdown documents, skips those whose
//!   compiled output is already stamped with the same SHA-256, converts the
//!   rest.
//!
//! ## Key Types
//!
//! - [`Converter`]: Renders and escapes markdown according to an
//!   [`EscapeMode`].
//! - [`Renderer`]: The markdown rendering seam. [`MarkdownRenderer`] is the
//!   default implementation; any closure works as a stub.
//! - [`Fragment`]: Escaped HTML ready to be embedded.
//! - [`Template`]: A host template and the markers it declares.
//! - [`Page`]: Builder composing a template from a directory with blocks.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use mdgen_core::Converter;
//! use mdgen_core::Document;
//! use mdgen_core::EscapeMode;
//! use mdgen_core::Template;
//! use mdgen_core::embed;
//!
//! let converter = Converter::default().with_mode(EscapeMode::Markup);
//! let body = converter
//! 	.convert_document(&Document::new("Hello **{{ world }}**"))
//! 	.unwrap();
//!
//! let template = Template::parse(
//! 	"page",
//! 	"<main>{% block body %}{% endblock %}</main>",
//! )
//! .unwrap();
//! let fragments = HashMap::from([("body".to_string(), body)]);
//!
//! assert_eq!(
//! 	embed(&template, &fragments).unwrap(),
//! 	"<main><p>Hello <strong>&#123;&#123; world &#125;&#125;</strong></p></main>"
//! );
//! ```

pub use config::*;
pub use converter::*;
pub use embedder::*;
pub use error::*;
pub use escape::*;
pub use render::*;
pub use template::*;

pub mod build;
pub mod config;
mod converter;
mod embedder;
#[allow(unused_assignments)]
mod error;
mod escape;
mod render;
mod template;

#[cfg(test)]
mod __fixtures;
