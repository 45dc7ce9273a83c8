use std::path::Path;

use logos::Logos;

use crate::MdgenError;
use crate::MdgenResult;

/// Raw tokens produced by logos for the statements of a host template. Text
/// outside of statements, expressions and comments is skipped by the walker.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[regex(r"\{%[-+]?")]
	StatementOpen,
	#[regex(r"[-+]?%\}")]
	StatementClose,
	#[regex(r"\{\{[-+]?")]
	ExpressionOpen,
	#[regex(r"[-+]?\}\}")]
	ExpressionClose,
	#[token("{#")]
	CommentOpen,
	#[token("#}")]
	CommentClose,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
}

/// Context states for the walker.
enum LexerContext {
	/// Plain template text.
	Outside,
	/// Inside `{# ... #}`.
	Comment,
	/// Inside `{{ ... }}`.
	Expression,
	/// Inside `{% ... %}`.
	Statement {
		/// Identifiers seen so far. Unrecognised input is recorded as an
		/// empty entry so it can never be mistaken for a block name.
		idents: Vec<String>,
		/// Byte offset of the opening `{%`.
		start: usize,
		/// Whether the statement was opened inside a raw section.
		in_raw: bool,
	},
	/// Inside `{% raw %}` ... `{% endraw %}`.
	Raw,
}

/// A named insertion point declared by a template with
/// `{% block name %}{% endblock %}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
	/// The block name.
	pub name: String,
	/// 1-indexed line of the opening `{%`.
	pub line: usize,
	/// 1-indexed column of the opening `{%`.
	pub column: usize,
	/// Byte offset of the opening `{%`.
	pub offset: usize,
}

/// A host template together with the markers it declares, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	name: String,
	source: String,
	markers: Vec<Marker>,
}

impl Template {
	/// Parse `source` and collect its markers. Fails with
	/// [`MdgenError::DuplicateMarker`] when a block name is declared twice and
	/// with [`MdgenError::NestedMarker`] when a block is opened inside another
	/// one.
	pub fn parse(name: impl Into<String>, source: impl Into<String>) -> MdgenResult<Self> {
		let source = source.into();
		let markers = scan_markers(&source)?;

		Ok(Self {
			name: name.into(),
			source,
			markers,
		})
	}

	/// Read and parse a template file. The file name becomes the template
	/// name.
	pub fn from_path(path: &Path) -> MdgenResult<Self> {
		let source = std::fs::read_to_string(path)?;
		let name = path
			.file_name()
			.map_or_else(|| path.display().to_string(), |name| {
				name.to_string_lossy().into_owned()
			});

		Self::parse(name, source)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn markers(&self) -> &[Marker] {
		&self.markers
	}

	/// Marker names in the order they appear.
	pub fn marker_names(&self) -> impl Iterator<Item = &str> {
		self.markers.iter().map(|marker| marker.name.as_str())
	}

	pub fn has_marker(&self, name: &str) -> bool {
		self.markers.iter().any(|marker| marker.name == name)
	}
}

fn scan_markers(source: &str) -> MdgenResult<Vec<Marker>> {
	let mut markers: Vec<Marker> = Vec::new();
	// Names of the blocks currently open, innermost last.
	let mut open_blocks: Vec<String> = Vec::new();
	let mut context = LexerContext::Outside;

	for (token, span) in RawToken::lexer(source).spanned() {
		let Ok(token) = token else {
			if let LexerContext::Statement { idents, .. } = &mut context {
				idents.push(String::new());
			}
			continue;
		};

		context = match (context, token) {
			(LexerContext::Outside, RawToken::StatementOpen) => {
				LexerContext::Statement {
					idents: Vec::new(),
					start: span.start,
					in_raw: false,
				}
			}
			(LexerContext::Raw, RawToken::StatementOpen) => {
				LexerContext::Statement {
					idents: Vec::new(),
					start: span.start,
					in_raw: true,
				}
			}
			(LexerContext::Outside, RawToken::CommentOpen) => LexerContext::Comment,
			(LexerContext::Comment, RawToken::CommentClose) => LexerContext::Outside,
			(LexerContext::Outside, RawToken::ExpressionOpen) => LexerContext::Expression,
			(LexerContext::Expression, RawToken::ExpressionClose) => LexerContext::Outside,
			(
				LexerContext::Statement {
					mut idents,
					start,
					in_raw,
				},
				RawToken::Ident,
			) => {
				idents.push(source[span].to_string());
				LexerContext::Statement {
					idents,
					start,
					in_raw,
				}
			}
			(
				LexerContext::Statement {
					idents,
					start,
					in_raw,
				},
				RawToken::StatementClose,
			) => {
				let keyword = idents.first().map(String::as_str);

				if in_raw {
					if keyword == Some("endraw") {
						LexerContext::Outside
					} else {
						LexerContext::Raw
					}
				} else if keyword == Some("raw") {
					LexerContext::Raw
				} else {
					match keyword {
						Some("block") => {
							let name = idents.get(1).cloned().unwrap_or_default();
							if !name.is_empty() {
								push_marker(&mut markers, &open_blocks, source, &name, start)?;
							}
							open_blocks.push(name);
						}
						Some("endblock") => {
							open_blocks.pop();
						}
						_ => {}
					}
					LexerContext::Outside
				}
			}
			(context, _) => context,
		};
	}

	Ok(markers)
}

fn push_marker(
	markers: &mut Vec<Marker>,
	open_blocks: &[String],
	source: &str,
	name: &str,
	offset: usize,
) -> MdgenResult<()> {
	let (line, column) = line_and_column(source, offset);

	if let Some(parent) = open_blocks.iter().rev().find(|parent| !parent.is_empty()) {
		return Err(MdgenError::NestedMarker {
			name: name.to_string(),
			parent: parent.clone(),
			line,
			column,
		});
	}

	if markers.iter().any(|marker| marker.name == name) {
		return Err(MdgenError::DuplicateMarker {
			name: name.to_string(),
			line,
			column,
		});
	}

	markers.push(Marker {
		name: name.to_string(),
		line,
		column,
		offset,
	});

	Ok(())
}

/// 1-indexed line and column (in characters) of a byte offset.
fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
	let before = &source[..offset];
	let line = before.matches('\n').count() + 1;
	let line_start = before.rfind('\n').map_or(0, |index| index + 1);
	let column = before[line_start..].chars().count() + 1;

	(line, column)
}
