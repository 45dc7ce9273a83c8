use std::path::Path;

use crate::MdgenError;
use crate::MdgenResult;

/// Wraps the markdown in a paragraph without interpreting it.
pub fn paragraph_renderer() -> impl Fn(&str) -> MdgenResult<String> + Send + Sync {
	|markdown: &str| Ok(format!("<p>{markdown}</p>"))
}

/// Always fails, like a renderer given input it can't process.
pub fn failing_renderer() -> impl Fn(&str) -> MdgenResult<String> + Send + Sync {
	|_: &str| Err(MdgenError::Conversion("unterminated construct".to_string()))
}

pub fn two_marker_template() -> &'static str {
	"<h1>{% block A %}{% endblock %}</h1>\n<div>{% block B %}{% endblock %}</div>\n"
}

pub fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}

	std::fs::write(path, content)
}
