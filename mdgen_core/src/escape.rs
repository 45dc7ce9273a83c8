//! Escaping of HTML-significant characters and template delimiters.
//!
//! The scanner is a flat [`logos`] tokenizer. Every byte of the input belongs
//! to exactly one token so the output can be rebuilt by mapping each token to
//! its replacement. Existing character references (`&amp;`, `&#123;`,
//! `&#x7B;`) are lexed as a single token and copied through untouched, which
//! makes both escaping passes idempotent.

use logos::Logos;

/// Replacement for every recognised template delimiter. The braces, percent
/// and hash characters are written as numeric character references so they
/// render identically but are never seen as template syntax.
pub const DELIMITER_ESCAPES: [(&str, &str); 6] = [
	("{{", "&#123;&#123;"),
	("}}", "&#125;&#125;"),
	("{%", "&#123;&#37;"),
	("%}", "&#37;&#125;"),
	("{#", "&#123;&#35;"),
	("#}", "&#35;&#125;"),
];

/// Replacement for every HTML-significant character.
pub const HTML_ESCAPES: [(&str, &str); 5] = [
	("<", "&lt;"),
	(">", "&gt;"),
	("&", "&amp;"),
	("\"", "&quot;"),
	("'", "&#39;"),
];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeToken {
	#[regex(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);")]
	CharacterReference,
	#[token("{{")]
	ExpressionOpen,
	#[token("}}")]
	ExpressionClose,
	#[token("{%")]
	StatementOpen,
	#[token("%}")]
	StatementClose,
	#[token("{#")]
	CommentOpen,
	#[token("#}")]
	CommentClose,
	#[token("<")]
	LessThan,
	#[token(">")]
	GreaterThan,
	#[token("&")]
	Ampersand,
	#[token("\"")]
	DoubleQuote,
	#[token("'")]
	SingleQuote,
	/// A lone `{`, `}`, `%` or `#` that doesn't start a delimiter.
	#[regex(r"[\{\}%#]")]
	Lone,
	#[regex(r#"[^\{\}%#<>&"']+"#)]
	Text,
}

impl EscapeToken {
	fn delimiter_replacement(self) -> Option<&'static str> {
		let index = match self {
			Self::ExpressionOpen => 0,
			Self::ExpressionClose => 1,
			Self::StatementOpen => 2,
			Self::StatementClose => 3,
			Self::CommentOpen => 4,
			Self::CommentClose => 5,
			_ => return None,
		};

		Some(DELIMITER_ESCAPES[index].1)
	}

	fn html_replacement(self) -> Option<&'static str> {
		let index = match self {
			Self::LessThan => 0,
			Self::GreaterThan => 1,
			Self::Ampersand => 2,
			Self::DoubleQuote => 3,
			Self::SingleQuote => 4,
			_ => return None,
		};

		Some(HTML_ESCAPES[index].1)
	}
}

/// Which character classes an escaping pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Classes {
	html: bool,
	delimiters: bool,
}

fn escape_with(input: &str, classes: Classes) -> String {
	let mut output = String::with_capacity(input.len() + input.len() / 8);

	for (token, span) in EscapeToken::lexer(input).spanned() {
		let slice = &input[span];
		// Every byte is covered by a token, so an error can only come from a
		// future token change. Copy it through rather than dropping input.
		let Ok(token) = token else {
			output.push_str(slice);
			continue;
		};

		let mut replacement = None;
		if classes.delimiters {
			replacement = token.delimiter_replacement();
		}
		if replacement.is_none() && classes.html {
			replacement = token.html_replacement();
		}

		output.push_str(replacement.unwrap_or(slice));
	}

	output
}

/// Escape both HTML-significant characters and template delimiters.
///
/// ```rust
/// use mdgen_core::escape_text;
///
/// assert_eq!(
/// 	escape_text("<b>{{ name }}</b>"),
/// 	"&lt;b&gt;&#123;&#123; name &#125;&#125;&lt;/b&gt;"
/// );
/// ```
pub fn escape_text(input: &str) -> String {
	escape_with(
		input,
		Classes {
			html: true,
			delimiters: true,
		},
	)
}

/// Escape only template delimiters, leaving markup intact.
pub fn escape_delimiters(input: &str) -> String {
	escape_with(
		input,
		Classes {
			html: false,
			delimiters: true,
		},
	)
}

/// Returns true if `input` contains a template delimiter that has not been
/// escaped.
pub fn has_raw_delimiters(input: &str) -> bool {
	EscapeToken::lexer(input).any(|token| {
		token
			.ok()
			.and_then(EscapeToken::delimiter_replacement)
			.is_some()
	})
}

/// Returns true if `input` contains an HTML-significant character that is
/// not part of a character reference.
pub fn has_raw_html(input: &str) -> bool {
	EscapeToken::lexer(input)
		.any(|token| token.ok().and_then(EscapeToken::html_replacement).is_some())
}
