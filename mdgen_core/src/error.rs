use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdgenError {
	#[error(transparent)]
	#[diagnostic(code(mdgen::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to convert markdown: {0}")]
	#[diagnostic(code(mdgen::conversion))]
	Conversion(String),

	#[error("missing fragment for marker(s): {}", format_names(.0))]
	#[diagnostic(
		code(mdgen::missing_fragment),
		help("supply a fragment for every `{{% block name %}}` marker declared by the template")
	)]
	MissingFragment(Vec<String>),

	#[error("duplicate marker `{name}` at line {line}, column {column}")]
	#[diagnostic(
		code(mdgen::duplicate_marker),
		help("each `{{% block name %}}` marker may appear only once per template")
	)]
	DuplicateMarker {
		name: String,
		line: usize,
		column: usize,
	},

	#[error("marker `{name}` at line {line}, column {column} is nested inside marker `{parent}`")]
	#[diagnostic(
		code(mdgen::nested_marker),
		help("close `{parent}` with `{{% endblock %}}` before opening `{name}`; a fragment replaces the whole block, so nested markers would never be filled")
	)]
	NestedMarker {
		name: String,
		parent: String,
		line: usize,
		column: usize,
	},

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(mdgen::template_render))]
	TemplateRender(String),

	#[error("template not found: `{0}`")]
	#[diagnostic(
		code(mdgen::template_not_found),
		help("templates are loaded from the `[templates] path` directory in mdgen.toml")
	)]
	TemplateNotFound(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdgen::config_parse),
		help("check that mdgen.toml is valid TOML with [convert], [build], [templates] and/or [data] sections")
	)]
	ConfigParse(String),

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(mdgen::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(mdgen::unsupported_format),
		help("supported formats: text, json, toml, yaml, yml")
	)]
	UnsupportedDataFormat(String),

	#[error("unconvertible float value in data file `{path}`: {value}")]
	#[diagnostic(
		code(mdgen::unconvertible_float),
		help("NaN and Infinity are not valid JSON numbers")
	)]
	UnconvertibleFloat { path: String, value: String },

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(mdgen::file_too_large),
		help("increase `max_file_size` in mdgen.toml or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("invalid variable `{0}`")]
	#[diagnostic(
		code(mdgen::invalid_variable),
		help("variables and blocks are passed as `name=value`")
	)]
	InvalidVariable(String),
}

fn format_names(names: &[String]) -> String {
	names
		.iter()
		.map(|name| format!("`{name}`"))
		.collect::<Vec<_>>()
		.join(", ")
}

pub type MdgenResult<T> = Result<T, MdgenError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
