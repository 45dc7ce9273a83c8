use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::EscapeMode;
use crate::MdgenError;
use crate::MdgenResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdgen.toml", ".mdgen.toml", ".config/mdgen.toml"];

/// A `[data]` entry: either a bare path whose extension names the format,
///
/// ```toml
/// [data]
/// site = "site.toml"
/// ```
///
/// or a table naming the format explicitly.
///
/// ```toml
/// [data]
/// release = { path = "release-info", format = "json" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum DataSource {
	ByExtension(PathBuf),
	WithFormat { path: PathBuf, format: String },
}

impl DataSource {
	pub fn path(&self) -> &Path {
		match self {
			Self::ByExtension(path) | Self::WithFormat { path, .. } => path,
		}
	}

	/// Lowercased format name. Empty when a bare path has no extension.
	pub fn format(&self) -> String {
		let format = match self {
			Self::ByExtension(path) => path.extension().map(|ext| ext.to_string_lossy()),
			Self::WithFormat { format, .. } => Some(format.trim().into()),
		};

		format.map(|name| name.to_ascii_lowercase()).unwrap_or_default()
	}
}

/// Configuration loaded from an `mdgen.toml` file.
///
/// ```toml
/// max_file_size = 10485760
///
/// [convert]
/// mode = "text"
/// gfm = true
///
/// [build]
/// source = "md"
/// output = "html"
/// patterns = ["**/*.md"]
/// extension = "html"
///
/// [templates]
/// path = "templates"
///
/// [data]
/// site = "site.toml"
/// ```
#[derive(Debug, Deserialize)]
pub struct MdgenConfig {
	/// How markdown is converted and escaped.
	#[serde(default)]
	pub convert: ConvertConfig,
	/// Where markdown sources are read from and HTML fragments written to.
	#[serde(default)]
	pub build: BuildConfig,
	/// Where host templates live.
	#[serde(default)]
	pub templates: TemplatesConfig,
	/// Map of namespace name to data file, exposed to host templates.
	#[serde(default)]
	pub data: HashMap<String, DataSource>,
	/// Maximum markdown file size in bytes. Larger files are rejected.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
}

impl Default for MdgenConfig {
	fn default() -> Self {
		Self {
			convert: ConvertConfig::default(),
			build: BuildConfig::default(),
			templates: TemplatesConfig::default(),
			data: HashMap::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

/// `[convert]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
	/// Escape mode applied to rendered HTML. Defaults to
	/// [`EscapeMode::Text`].
	#[serde(default)]
	pub mode: EscapeMode,
	/// Enable GitHub flavored markdown.
	#[serde(default = "default_true")]
	pub gfm: bool,
}

impl Default for ConvertConfig {
	fn default() -> Self {
		Self {
			mode: EscapeMode::default(),
			gfm: true,
		}
	}
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
	/// Directory holding markdown sources, relative to the project root.
	#[serde(default = "default_source_dir")]
	pub source: PathBuf,
	/// Directory compiled fragments are written to, relative to the project
	/// root.
	#[serde(default = "default_output_dir")]
	pub output: PathBuf,
	/// Glob patterns, relative to `source`, selecting the documents to build.
	#[serde(default = "default_patterns")]
	pub patterns: Vec<String>,
	/// File extension for compiled fragments.
	#[serde(default = "default_extension")]
	pub extension: String,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			source: default_source_dir(),
			output: default_output_dir(),
			patterns: default_patterns(),
			extension: default_extension(),
		}
	}
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
	/// Directory host templates are loaded from, relative to the project
	/// root.
	#[serde(default = "default_templates_dir")]
	pub path: PathBuf,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		Self {
			path: default_templates_dir(),
		}
	}
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

fn default_true() -> bool {
	true
}

fn default_source_dir() -> PathBuf {
	PathBuf::from("md")
}

fn default_output_dir() -> PathBuf {
	PathBuf::from("html")
}

fn default_patterns() -> Vec<String> {
	vec!["**/*.md".to_string()]
}

fn default_extension() -> String {
	"html".to_string()
}

fn default_templates_dir() -> PathBuf {
	PathBuf::from("templates")
}

impl MdgenConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> MdgenResult<Option<MdgenConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to defaults.
	pub fn load_or_default(root: &Path) -> MdgenResult<MdgenConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> MdgenResult<MdgenConfig> {
		toml::from_str(content).map_err(|e| MdgenError::ConfigParse(e.to_string()))
	}

	/// Read every `[data]` file relative to `root`, keyed by namespace.
	/// Namespaces are loaded in name order so the first failure is stable.
	pub fn load_data(&self, root: &Path) -> MdgenResult<HashMap<String, serde_json::Value>> {
		let mut sources: Vec<_> = self.data.iter().collect();
		sources.sort_by(|(a, _), (b, _)| a.cmp(b));

		sources
			.into_iter()
			.map(|(namespace, source)| {
				let shown_path = source.path().display().to_string();
				let content = std::fs::read_to_string(root.join(source.path())).map_err(|e| {
					MdgenError::DataFile {
						path: shown_path.clone(),
						reason: e.to_string(),
					}
				})?;
				let value = parse_data_file(&content, &source.format(), &shown_path)?;
				tracing::debug!(namespace = namespace.as_str(), path = %shown_path, "loaded data file");

				Ok((namespace.clone(), value))
			})
			.collect()
	}
}

/// Parse a data file into a JSON value according to `format`. `text` and
/// `txt` keep the content as a single string.
fn parse_data_file(
	content: &str,
	format: &str,
	path_display: &str,
) -> MdgenResult<serde_json::Value> {
	let invalid = |reason: String| {
		MdgenError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"text" | "txt" => Ok(serde_json::Value::String(content.to_string())),
		"json" => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| invalid(e.to_string())),
		"toml" => {
			let table: toml::Table = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
			toml_to_json(toml::Value::Table(table), path_display)
		}
		other => Err(MdgenError::UnsupportedDataFormat(other.to_string())),
	}
}

/// TOML has datetimes and non-finite floats, JSON has neither. Datetimes
/// become strings; NaN and infinities are rejected.
fn toml_to_json(value: toml::Value, path_display: &str) -> MdgenResult<serde_json::Value> {
	use serde_json::Value as Json;

	let json = match value {
		toml::Value::String(s) => Json::String(s),
		toml::Value::Integer(i) => Json::from(i),
		toml::Value::Boolean(b) => Json::Bool(b),
		toml::Value::Datetime(dt) => Json::String(dt.to_string()),
		toml::Value::Float(f) => {
			serde_json::Number::from_f64(f)
				.map(Json::Number)
				.ok_or_else(|| {
					MdgenError::UnconvertibleFloat {
						path: path_display.to_string(),
						value: f.to_string(),
					}
				})?
		}
		toml::Value::Array(items) => {
			Json::Array(
				items
					.into_iter()
					.map(|item| toml_to_json(item, path_display))
					.collect::<MdgenResult<_>>()?,
			)
		}
		toml::Value::Table(table) => {
			Json::Object(
				table
					.into_iter()
					.map(|(key, item)| Ok((key, toml_to_json(item, path_display)?)))
					.collect::<MdgenResult<_>>()?,
			)
		}
	};

	Ok(json)
}

/// Parse `name=value` pairs into string template variables.
pub fn parse_variables<'a>(
	pairs: impl IntoIterator<Item = &'a str>,
) -> MdgenResult<HashMap<String, serde_json::Value>> {
	pairs
		.into_iter()
		.map(|pair| {
			let (name, value) = split_pair(pair)?;
			Ok((name.to_string(), serde_json::Value::String(value.to_string())))
		})
		.collect()
}

/// Split a `name=value` pair. The name must be non-empty.
pub fn split_pair(pair: &str) -> MdgenResult<(&str, &str)> {
	match pair.split_once('=') {
		Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
		_ => Err(MdgenError::InvalidVariable(pair.to_string())),
	}
}
