use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;
use sha2::Digest;
use sha2::Sha256;

use crate::Converter;
use crate::Document;
use crate::Fragment;
use crate::MdgenError;
use crate::MdgenResult;
use crate::config::MdgenConfig;
use crate::config::split_pair;
use crate::render::Renderer;

/// Prefix of the stamp line written at the top of every compiled fragment.
pub const STAMP_PREFIX: &str = "<!-- mdgen:sha256:";
/// Suffix of the stamp line.
pub const STAMP_SUFFIX: &str = " -->";

/// Whether a compiled fragment matches its markdown source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
	/// The output file doesn't exist yet.
	Missing,
	/// The output file was compiled from a different version of the source.
	Stale,
	/// The output file is up to date.
	Fresh,
}

impl fmt::Display for BuildStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Missing => write!(f, "missing"),
			Self::Stale => write!(f, "stale"),
			Self::Fresh => write!(f, "fresh"),
		}
	}
}

/// A markdown document and the fragment it compiles to.
#[derive(Debug, Clone)]
pub struct BuildEntry {
	/// Path to the markdown source.
	pub source: PathBuf,
	/// Path to the compiled fragment.
	pub output: PathBuf,
	/// SHA-256 of the markdown source, hex encoded.
	pub hash: String,
	/// The markdown text `hash` was computed from. Compiling uses this text
	/// so the stamp always matches the converted content.
	pub markdown: String,
	pub status: BuildStatus,
}

impl BuildEntry {
	/// The first eight characters of the hash, for display.
	pub fn short_hash(&self) -> &str {
		&self.hash[..self.hash.len().min(8)]
	}
}

/// All documents found for a build, in case-insensitive path order.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
	pub entries: Vec<BuildEntry>,
}

impl BuildPlan {
	/// Entries whose output is missing or out of date.
	pub fn pending(&self) -> impl Iterator<Item = &BuildEntry> {
		self.entries
			.iter()
			.filter(|entry| entry.status != BuildStatus::Fresh)
	}

	/// Returns true when every output is up to date.
	pub fn is_fresh(&self) -> bool {
		self.pending().next().is_none()
	}
}

/// Result of running a build.
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
	/// Documents that were converted and written.
	pub compiled: Vec<BuildEntry>,
	/// Documents skipped because their output was already up to date.
	pub skipped: Vec<BuildEntry>,
}

/// Collect markdown documents under `source_dir` matching `patterns`,
/// sorted case-insensitively. Honors `.gitignore` files.
pub fn find_documents(source_dir: &Path, patterns: &[String]) -> MdgenResult<Vec<PathBuf>> {
	if !source_dir.is_dir() {
		return Ok(Vec::new());
	}

	let glob_set = build_glob_set(patterns)?;
	let mut documents = Vec::new();

	for entry in WalkBuilder::new(source_dir).require_git(false).build() {
		let entry = entry.map_err(|e| MdgenError::Io(std::io::Error::other(e.to_string())))?;
		let path = entry.path();
		if !path.is_file() {
			continue;
		}

		let relative = path.strip_prefix(source_dir).unwrap_or(path);
		if glob_set.is_match(relative) {
			documents.push(path.to_path_buf());
		}
	}

	documents.sort_by_key(|path| path.to_string_lossy().to_lowercase());

	Ok(documents)
}

fn build_glob_set(patterns: &[String]) -> MdgenResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| MdgenError::ConfigParse(e.to_string()))?;
		builder.add(glob);
	}

	builder
		.build()
		.map_err(|e| MdgenError::ConfigParse(e.to_string()))
}

/// Map `source_dir/<rel>.md` to `output_dir/<rel>.<extension>`.
pub fn output_path(
	source_dir: &Path,
	output_dir: &Path,
	document: &Path,
	extension: &str,
) -> PathBuf {
	let relative = document.strip_prefix(source_dir).unwrap_or(document);
	output_dir.join(relative).with_extension(extension)
}

/// SHA-256 digest of `content`, hex encoded.
pub fn document_hash(content: &[u8]) -> String {
	format!("{:x}", Sha256::digest(content))
}

/// Format the stamp line for `hash`.
pub fn stamp_line(hash: &str) -> String {
	format!("{STAMP_PREFIX}{hash}{STAMP_SUFFIX}")
}

/// Extract the hash from the stamp on the first line of `content`.
pub fn read_stamp(content: &str) -> Option<&str> {
	content
		.lines()
		.next()?
		.trim()
		.strip_prefix(STAMP_PREFIX)?
		.strip_suffix(STAMP_SUFFIX)
}

/// Remove a leading stamp line, if present.
pub fn strip_stamp(content: &str) -> &str {
	if read_stamp(content).is_none() {
		return content;
	}

	content
		.split_once('\n')
		.map_or("", |(_, rest)| rest)
}

fn read_source(path: &Path, max_file_size: u64) -> MdgenResult<Vec<u8>> {
	let size = std::fs::metadata(path)?.len();
	if size > max_file_size {
		tracing::warn!(path = %path.display(), size, limit = max_file_size, "file too large");
		return Err(MdgenError::FileTooLarge {
			path: path.display().to_string(),
			size,
			limit: max_file_size,
		});
	}

	Ok(std::fs::read(path)?)
}

/// Find every document for the project at `root` and compare it with its
/// compiled output.
pub fn plan_build(root: &Path, config: &MdgenConfig) -> MdgenResult<BuildPlan> {
	let source_dir = root.join(&config.build.source);
	let output_dir = root.join(&config.build.output);
	let mut entries = Vec::new();

	for source in find_documents(&source_dir, &config.build.patterns)? {
		let content = read_source(&source, config.max_file_size)?;
		let hash = document_hash(&content);
		let markdown = String::from_utf8(content)
			.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
		let output = output_path(&source_dir, &output_dir, &source, &config.build.extension);

		let status = match std::fs::read_to_string(&output) {
			Ok(existing) if read_stamp(&existing) == Some(hash.as_str()) => BuildStatus::Fresh,
			Ok(_) => BuildStatus::Stale,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BuildStatus::Missing,
			Err(e) => return Err(e.into()),
		};

		entries.push(BuildEntry {
			source,
			output,
			hash,
			markdown,
			status,
		});
	}

	Ok(BuildPlan { entries })
}

/// Convert a single entry and return the text that would be written to its
/// output file, stamp included. The source is not read again: the text
/// captured by [`plan_build`] is converted and stamped with its own hash.
pub fn compile_entry<R: Renderer>(
	entry: &BuildEntry,
	converter: &Converter<R>,
) -> MdgenResult<String> {
	let document = Document::new(entry.markdown.as_str())
		.with_source(entry.source.display().to_string());
	let fragment = converter.convert_document(&document)?;

	Ok(format!("{}\n{}", stamp_line(&entry.hash), fragment.html()))
}

/// Compile every pending entry of `plan` (every entry when `force` is set)
/// and write the outputs.
pub fn run_build<R: Renderer>(
	plan: &BuildPlan,
	converter: &Converter<R>,
	force: bool,
) -> MdgenResult<BuildResult> {
	let mut result = BuildResult::default();

	for entry in &plan.entries {
		if entry.status == BuildStatus::Fresh && !force {
			tracing::debug!(
				source = %entry.source.display(),
				hash = entry.short_hash(),
				output = %entry.output.display(),
				"skipping, already the latest version"
			);
			result.skipped.push(entry.clone());
			continue;
		}

		tracing::info!(
			source = %entry.source.display(),
			hash = entry.short_hash(),
			output = %entry.output.display(),
			"compiling"
		);

		let text = compile_entry(entry, converter)?;
		if let Some(parent) = entry.output.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&entry.output, text)?;
		result.compiled.push(entry.clone());
	}

	Ok(result)
}

/// Build a [`Converter`] from the `[convert]` section of `config`.
pub fn converter_from_config(config: &MdgenConfig) -> Converter {
	Converter::new(crate::MarkdownRenderer::new().with_gfm(config.convert.gfm))
		.with_mode(config.convert.mode)
}

/// Plan and run a build for the project at `root`.
pub fn build_project(root: &Path, config: &MdgenConfig, force: bool) -> MdgenResult<BuildResult> {
	let plan = plan_build(root, config)?;
	run_build(&plan, &converter_from_config(config), force)
}

/// Load a compiled fragment from disk. A leading stamp line is removed and
/// the delimiter pass is applied to the remaining HTML.
pub fn load_fragment(path: &Path) -> MdgenResult<Fragment> {
	let content = std::fs::read_to_string(path)?;

	Ok(Fragment::from_html(strip_stamp(&content)).with_source(path.display().to_string()))
}

/// Load the fragments named by `name=path` pairs. Paths are resolved against
/// `root`.
pub fn load_fragment_blocks<'a>(
	root: &Path,
	pairs: impl IntoIterator<Item = &'a str>,
) -> MdgenResult<Vec<(String, Fragment)>> {
	pairs
		.into_iter()
		.map(|pair| {
			let (name, path) = split_pair(pair)?;
			Ok((name.to_string(), load_fragment(&root.join(path))?))
		})
		.collect()
}
