use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mdgen_cli::Commands;
use mdgen_cli::MdgenCli;
use mdgen_cli::ModeArg;
use mdgen_core::Document;
use mdgen_core::MdgenConfig;
use mdgen_core::MdgenError;
use mdgen_core::Page;
use mdgen_core::build;
use mdgen_core::build::BuildPlan;
use mdgen_core::build::BuildStatus;
use mdgen_core::build::load_fragment_blocks;
use mdgen_core::parse_variables;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = MdgenCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Convert { file, mode, output }) => {
			run_convert(&args, file.as_deref(), *mode, output.as_deref())
		}
		Some(Commands::Build {
			force,
			check,
			diff,
			watch,
		}) => run_build(&args, *force, *check, *diff, *watch),
		Some(Commands::Compose {
			template,
			blocks,
			vars,
			output,
		}) => run_compose(&args, template, blocks, vars, output.as_deref()),
		Some(Commands::Markers { template }) => run_markers(&args, template),
		None => {
			eprintln!("No subcommand specified. Run `mdgen --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<MdgenError>() {
			Ok(mdgen_err) => {
				let report: miette::Report = (*mdgen_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `MDGEN_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_env("MDGEN_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("debug")
		} else {
			EnvFilter::new("warn")
		}
	});

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.try_init();
}

fn resolve_root(args: &MdgenCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

const SAMPLE_CONFIG: &str = "# mdgen configuration\n\n[convert]\n# \"markup\" keeps rendered \
                             HTML and escapes template delimiters only.\n# \"text\" escapes \
                             every HTML character as well.\nmode = \"markup\"\n\n[build]\nsource \
                             = \"md\"\noutput = \"html\"\n\n[templates]\npath = \
                             \"templates\"\n\n# Map data files to template namespaces.\n# Values \
                             are available in templates as {{ namespace.key }}.\n# [data]\n# \
                             site = \"site.toml\"\n";

const SAMPLE_DOCUMENT: &str = "# Hello\n\nThis page was written in markdown. Template syntax \
                               such as `{{ name }}` is\nescaped, so it is displayed rather than \
                               evaluated.\n";

const SAMPLE_TEMPLATE: &str = "<!doctype html>\n<html>\n<body>\n<main>{% block body %}{% \
                               endblock %}</main>\n</body>\n</html>\n";

fn run_init(args: &MdgenCli) -> CliResult {
	let root = resolve_root(args);
	let files = [
		("mdgen.toml", SAMPLE_CONFIG),
		("md/index.md", SAMPLE_DOCUMENT),
		("templates/index.html", SAMPLE_TEMPLATE),
	];

	let mut created = 0;
	for (relative, content) in files {
		let path = root.join(relative);
		if path.exists() {
			println!("Already exists: {relative}");
			continue;
		}

		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, content)?;
		println!("Created {relative}");
		created += 1;
	}

	if created > 0 {
		println!();
		println!("Next steps:");
		println!("  1. Run `mdgen build` to compile md/ into html/");
		println!("  2. Run `mdgen compose index.html --block body=html/index.html`");
	}

	Ok(())
}

fn run_convert(
	args: &MdgenCli,
	file: Option<&Path>,
	mode: Option<ModeArg>,
	output: Option<&Path>,
) -> CliResult {
	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;
	let mut converter = build::converter_from_config(&config);
	if let Some(mode) = mode {
		converter = converter.with_mode(mode.into());
	}

	let document = match file {
		Some(path) => {
			let markdown = std::fs::read_to_string(path)?;
			Document::new(markdown).with_source(path.display().to_string())
		}
		None => {
			let mut markdown = String::new();
			std::io::stdin().read_to_string(&mut markdown)?;
			Document::new(markdown)
		}
	};

	let fragment = converter.convert_document(&document)?;

	match output {
		Some(path) => {
			if let Some(parent) = path.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::write(path, fragment.html())?;
			if args.verbose {
				println!("Wrote {}", path.display());
			}
		}
		None => println!("{}", fragment.html()),
	}

	Ok(())
}

fn run_build(args: &MdgenCli, force: bool, check: bool, diff: bool, watch: bool) -> CliResult {
	if check {
		let is_stale = run_check_once(args, diff)?;
		if is_stale {
			process::exit(1);
		}
		return Ok(());
	}

	run_build_once(args, force)?;

	if !watch {
		return Ok(());
	}

	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;
	let source_dir = root.join(&config.build.source);

	println!("\nWatching {} for changes... (press Ctrl+C to stop)", source_dir.display());

	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				tracing::debug!(kind = ?event.kind, paths = ?event.paths, "filesystem event");
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&source_dir, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, rebuilding...");
		if let Err(e) = run_build_once(args, false) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn run_build_once(args: &MdgenCli, force: bool) -> CliResult {
	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;
	let result = build::build_project(&root, &config, force)?;

	if result.compiled.is_empty() {
		if result.skipped.is_empty() {
			println!(
				"No markdown documents found in {}.",
				config.build.source.display()
			);
		} else {
			println!("All documents are already up to date.");
		}
		return Ok(());
	}

	println!(
		"Compiled {} document(s), skipped {}.",
		result.compiled.len(),
		result.skipped.len()
	);

	if args.verbose {
		for entry in &result.compiled {
			println!(
				"  {} {} -> {}",
				colored!(entry.short_hash(), yellow),
				make_relative(&entry.source, &root),
				make_relative(&entry.output, &root)
			);
		}
	}

	Ok(())
}

/// Report outputs that differ from their source and return whether any
/// were found.
fn run_check_once(args: &MdgenCli, show_diff: bool) -> CliResult<bool> {
	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;
	let plan = build::plan_build(&root, &config)?;

	if plan.is_fresh() {
		println!(
			"{}",
			colored!(
				format!("All {} output(s) are up to date.", plan.entries.len()),
				green
			)
		);
		return Ok(false);
	}

	print_stale(&plan, &root, &config, show_diff)?;

	Ok(true)
}

fn print_stale(plan: &BuildPlan, root: &Path, config: &MdgenConfig, show_diff: bool) -> CliResult {
	let converter = build::converter_from_config(config);
	let pending: Vec<_> = plan.pending().collect();

	eprintln!(
		"{}",
		colored!(
			format!("{} output(s) need rebuilding:", pending.len()),
			red
		)
	);

	for entry in pending {
		let status = match entry.status {
			BuildStatus::Missing => colored!(entry.status, red),
			_ => colored!(entry.status, yellow),
		};
		eprintln!(
			"  {} {} -> {}",
			status,
			make_relative(&entry.source, root),
			make_relative(&entry.output, root)
		);

		if show_diff {
			let current = std::fs::read_to_string(&entry.output).unwrap_or_default();
			let expected = build::compile_entry(entry, &converter)?;
			print_diff(&current, &expected);
		}
	}

	eprintln!();
	eprintln!("Run `mdgen build` to update them.");

	Ok(())
}

fn run_compose(
	args: &MdgenCli,
	template: &str,
	blocks: &[String],
	vars: &[String],
	output: Option<&Path>,
) -> CliResult {
	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;

	let mut page = Page::new(root.join(&config.templates.path), template);
	for (name, fragment) in load_fragment_blocks(&root, blocks.iter().map(String::as_str))? {
		page = page.add_block(name, fragment);
	}

	let mut data: HashMap<String, serde_json::Value> = config.load_data(&root)?;
	data.extend(parse_variables(vars.iter().map(String::as_str))?);

	let composition = page.compose(&data)?;

	for name in &composition.unused_fragments {
		eprintln!(
			"{} block `{name}` is not declared by {template}",
			colored!("warning:", yellow)
		);
	}

	match output {
		Some(path) => {
			let path = root.join(path);
			if let Some(parent) = path.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::write(&path, &composition.text)?;
			println!("Wrote {}", make_relative(&path, &root));
		}
		None => print!("{}", composition.text),
	}

	Ok(())
}

fn run_markers(args: &MdgenCli, template: &str) -> CliResult {
	let root = resolve_root(args);
	let config = MdgenConfig::load_or_default(&root)?;
	let template = Page::new(root.join(&config.templates.path), template).template()?;

	if template.markers().is_empty() {
		println!("{} declares no markers.", template.name());
		return Ok(());
	}

	println!("{}", colored!(template.name(), bold));
	for marker in template.markers() {
		println!("  {:<24} {}:{}", marker.name, marker.line, marker.column);
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("    {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("    {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("     {change}");
			}
		}
		if change.missing_newline() {
			eprintln!();
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
