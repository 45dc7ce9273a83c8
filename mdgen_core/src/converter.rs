use serde::Deserialize;
use serde::Serialize;

use crate::MdgenResult;
use crate::escape::escape_delimiters;
use crate::escape::escape_text;
use crate::render::MarkdownRenderer;
use crate::render::Renderer;

/// Controls which character classes are escaped in the rendered HTML.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
	/// Escape every HTML-significant character and every template delimiter.
	/// The output contains no raw markup and displays the generated HTML as
	/// literal text.
	#[default]
	Text,
	/// Keep the markup produced by the renderer and escape only template
	/// delimiters. Raw HTML typed by the author is already encoded by the
	/// renderer, so the only tags left are the ones markdown produced.
	Markup,
}

/// A markdown document waiting to be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	source: Option<String>,
	text: String,
}

impl Document {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			source: None,
			text: text.into(),
		}
	}

	/// Attach a source identity (usually a file path) used for traceability.
	#[must_use]
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	pub fn text(&self) -> &str {
		&self.text
	}
}

/// Escaped HTML ready to be embedded into a template.
///
/// A `Fragment` can only be built through an escaping path: either by
/// converting a [`Document`] or through [`Fragment::from_html`], which runs
/// the delimiter pass over the supplied HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
	source: Option<String>,
	html: String,
}

impl Fragment {
	/// Wrap already-rendered HTML, escaping any template delimiters it
	/// contains. Markup is preserved.
	pub fn from_html(html: &str) -> Self {
		Self {
			source: None,
			html: escape_delimiters(html),
		}
	}

	#[must_use]
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn source(&self) -> Option<&str> {
		self.source.as_deref()
	}

	pub fn html(&self) -> &str {
		&self.html
	}

	pub fn into_html(self) -> String {
		self.html
	}
}

/// Converts markdown into template-safe HTML.
pub struct Converter<R = MarkdownRenderer> {
	renderer: R,
	mode: EscapeMode,
}

impl Default for Converter {
	fn default() -> Self {
		Self::new(MarkdownRenderer::default())
	}
}

impl<R: Renderer> Converter<R> {
	pub fn new(renderer: R) -> Self {
		Self {
			renderer,
			mode: EscapeMode::default(),
		}
	}

	#[must_use]
	pub fn with_mode(mut self, mode: EscapeMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn mode(&self) -> EscapeMode {
		self.mode
	}

	/// Render `markdown` and escape the result according to the configured
	/// [`EscapeMode`]. Renderer failures are returned unchanged and no partial
	/// output is produced.
	pub fn convert(&self, markdown: &str) -> MdgenResult<String> {
		let html = self.renderer.render(markdown)?;
		tracing::debug!(
			input_len = markdown.len(),
			output_len = html.len(),
			mode = ?self.mode,
			"rendered markdown"
		);

		Ok(escape_html(&html, self.mode))
	}

	/// Convert a [`Document`] into a [`Fragment`] that keeps the document's
	/// source identity.
	pub fn convert_document(&self, document: &Document) -> MdgenResult<Fragment> {
		let html = self.convert(document.text())?;

		Ok(Fragment {
			source: document.source.clone(),
			html,
		})
	}
}

/// Apply the escaping pass for `mode` to rendered HTML.
pub fn escape_html(html: &str, mode: EscapeMode) -> String {
	match mode {
		EscapeMode::Markup => escape_delimiters(html),
		EscapeMode::Text => escape_text(html),
	}
}

/// Convert markdown with the default renderer in [`EscapeMode::Text`]. The
/// result contains neither raw HTML characters nor raw template delimiters.
///
/// ```rust
/// let html = mdgen_core::convert("Hello {{ name }}").unwrap();
/// assert_eq!(html, "&lt;p&gt;Hello &#123;&#123; name &#125;&#125;&lt;/p&gt;");
/// ```
pub fn convert(markdown: &str) -> MdgenResult<String> {
	Converter::default().convert(markdown)
}
