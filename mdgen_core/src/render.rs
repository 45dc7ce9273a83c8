use markdown::CompileOptions;
use markdown::Options;
use markdown::ParseOptions;

use crate::MdgenError;
use crate::MdgenResult;

/// Turns markdown source into HTML.
///
/// The converter only depends on this trait, so the escaping and embedding
/// logic can be exercised with a stub. Any `Fn(&str) -> MdgenResult<String>`
/// closure is a renderer.
pub trait Renderer: Send + Sync {
	/// Render `markdown` to HTML. Failures are reported as
	/// [`MdgenError::Conversion`].
	fn render(&self, markdown: &str) -> MdgenResult<String>;
}

impl<F> Renderer for F
where
	F: Fn(&str) -> MdgenResult<String> + Send + Sync,
{
	fn render(&self, markdown: &str) -> MdgenResult<String> {
		self(markdown)
	}
}

/// The default [`Renderer`], backed by the [`markdown`] crate.
///
/// Raw HTML written by the author is never passed through: it is encoded as
/// text by the renderer itself.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
	gfm: bool,
}

impl Default for MarkdownRenderer {
	fn default() -> Self {
		Self { gfm: true }
	}
}

impl MarkdownRenderer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Toggle GitHub flavored markdown (tables, task lists, strikethrough,
	/// autolinks and footnotes). Enabled by default.
	#[must_use]
	pub fn with_gfm(mut self, gfm: bool) -> Self {
		self.gfm = gfm;
		self
	}

	pub fn gfm(&self) -> bool {
		self.gfm
	}

	fn options(&self) -> Options {
		let parse = if self.gfm {
			ParseOptions::gfm()
		} else {
			ParseOptions::default()
		};

		Options {
			parse,
			compile: CompileOptions {
				allow_dangerous_html: false,
				allow_dangerous_protocol: false,
				..CompileOptions::default()
			},
		}
	}
}

impl Renderer for MarkdownRenderer {
	fn render(&self, markdown: &str) -> MdgenResult<String> {
		markdown::to_html_with_options(markdown, &self.options())
			.map_err(|e| MdgenError::Conversion(e.to_string()))
	}
}
