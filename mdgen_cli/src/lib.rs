use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use mdgen_core::EscapeMode;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn markdown into HTML fragments that are safe to embed in Jinja templates.",
	long_about = "mdgen converts markdown documents into HTML fragments in which every template \
	              delimiter ({{ }}, {% %}, {# #}) is escaped, then composes those fragments into \
	              host templates by filling their `{% block name %}` markers.\n\nQuick start:\n  \
	              mdgen init      Create a sample project\n  mdgen build     Compile md/ into \
	              html/\n  mdgen compose   Fill a template with compiled fragments"
)]
pub struct MdgenCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output. Also raises the log level to `debug` unless
	/// `MDGEN_LOG` is set.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize mdgen in a project.
	///
	/// Creates `mdgen.toml`, a sample `md/index.md` document and a
	/// `templates/index.html` host template. Existing files are left alone.
	Init,
	/// Convert a single markdown document to escaped HTML.
	///
	/// Reads FILE (or stdin when omitted) and prints the HTML fragment. The
	/// escape mode defaults to the `[convert] mode` of `mdgen.toml`.
	Convert {
		/// Markdown file to convert. Reads stdin when omitted.
		file: Option<PathBuf>,

		/// Which characters to escape in the rendered HTML.
		#[arg(long, value_enum)]
		mode: Option<ModeArg>,

		/// Write the fragment to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Compile every markdown document of the project.
	///
	/// Documents are read from the `[build] source` directory and written to
	/// the `[build] output` directory. Each output starts with a stamp holding
	/// the SHA-256 of its source, and documents whose output already carries
	/// the current stamp are skipped.
	Build {
		/// Recompile every document, even when its output is up to date.
		#[arg(long, default_value_t = false)]
		force: bool,

		/// Only report outputs that are missing or stale. Exits with a
		/// non-zero status code when any are found.
		#[arg(long, default_value_t = false, conflicts_with_all = ["force", "watch"])]
		check: bool,

		/// With `--check`, show a diff between each stale output and what
		/// would be written.
		#[arg(long, default_value_t = false, requires = "check")]
		diff: bool,

		/// Watch the source directory and rebuild on changes.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Compose a page by filling a template's markers with fragments.
	///
	/// TEMPLATE is resolved against the `[templates] path` directory. Every
	/// marker the template declares must receive a block, and `[data]`
	/// namespaces from `mdgen.toml` are available as template variables.
	/// Block and output paths are relative to the project root.
	Compose {
		/// Template file name, relative to the templates directory.
		template: String,

		/// Fill marker NAME with the compiled fragment in FILE.
		#[arg(long = "block", short, value_name = "NAME=FILE")]
		blocks: Vec<String>,

		/// Extra template variable, as `key=value`.
		#[arg(long = "var", value_name = "KEY=VALUE")]
		vars: Vec<String>,

		/// Write the page to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// List the markers declared by a template.
	Markers {
		/// Template file name, relative to the templates directory.
		template: String,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
	/// Keep rendered markup and escape only template delimiters.
	Markup,
	/// Escape every HTML character and template delimiter.
	Text,
}

impl From<ModeArg> for EscapeMode {
	fn from(mode: ModeArg) -> Self {
		match mode {
			ModeArg::Markup => EscapeMode::Markup,
			ModeArg::Text => EscapeMode::Text,
		}
	}
}
