mod common;

use mdgen_core::AnyEmptyResult;
use mdgen_core::build::document_hash;
use mdgen_core::build::read_stamp;
use mdgen_core::build::stamp_line;
use similar_asserts::assert_eq;

#[test]
fn build_compiles_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "md/index.md", "# Home\n")?;
	common::write_file(tmp.path(), "md/guide/intro.md", "Use `{{ var }}`.\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.arg("--verbose")
		.assert()
		.success()
		.stdout(predicates::str::contains("Compiled 2 document(s), skipped 0."))
		.stdout(predicates::str::contains("md/guide/intro.md -> html/guide/intro.html"));

	let intro = std::fs::read_to_string(tmp.path().join("html/guide/intro.html"))?;
	let hash = document_hash(b"Use `{{ var }}`.\n");
	assert_eq!(read_stamp(&intro), Some(hash.as_str()));
	assert_eq!(intro.lines().next(), Some(stamp_line(&hash).as_str()));
	assert!(
		intro.contains("&lt;code&gt;&#123;&#123; var &#125;&#125;&lt;/code&gt;"),
		"got {intro}"
	);

	Ok(())
}

#[test]
fn build_skips_fresh_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "md/index.md", "# Home\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("All documents are already up to date."));

	common::mdgen_cmd()
		.arg("build")
		.arg("--force")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Compiled 1 document(s), skipped 0."));

	Ok(())
}

#[test]
fn build_uses_configured_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"mdgen.toml",
		"[build]\nsource = \"docs\"\noutput = \"site\"\nextension = \"htm\"\n",
	)?;
	common::write_file(tmp.path(), "docs/a.md", "a\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(tmp.path().join("site/a.htm").is_file());

	Ok(())
}

#[test]
fn check_fails_when_outputs_are_stale() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "md/index.md", "# Home\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("1 output(s) need rebuilding"))
		.stderr(predicates::str::contains("missing md/index.md -> html/index.html"));

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::mdgen_cmd()
		.arg("build")
		.arg("--check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("All 1 output(s) are up to date."));

	common::write_file(tmp.path(), "md/index.md", "# Welcome\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("stale md/index.md"))
		.stderr(predicates::str::contains("-&lt;h1&gt;Home&lt;/h1&gt;"))
		.stderr(predicates::str::contains("+&lt;h1&gt;Welcome&lt;/h1&gt;"));

	Ok(())
}

#[test]
fn oversize_documents_fail_the_build() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "mdgen.toml", "max_file_size = 2\n")?;
	common::write_file(tmp.path(), "md/index.md", "# Home\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdgen::file_too_large"));

	Ok(())
}

#[test]
fn verbose_build_logs_progress() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "md/index.md", "# Home\n")?;

	common::mdgen_cmd()
		.arg("build")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("compiling"));

	Ok(())
}
