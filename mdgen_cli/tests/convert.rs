mod common;

use mdgen_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use similar_asserts::assert_eq;

#[test]
fn converts_file_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "page.md", "Hello **{{ name }}**\n")?;

	common::mdgen_cmd()
		.arg("convert")
		.arg(tmp.path().join("page.md"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"&lt;p&gt;Hello &lt;strong&gt;&#123;&#123; name &#125;&#125;&lt;/strong&gt;&lt;/p&gt;",
		));

	Ok(())
}

#[test]
fn converts_stdin() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdgen_cmd()
		.arg("convert")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("{% include 'secrets' %}")
		.assert()
		.success()
		.stdout(predicates::str::contains("&#123;&#37; include"))
		.stdout(predicates::str::contains("{%").not());

	Ok(())
}

#[rstest]
#[case::markup("markup", "<p>a &lt;b&gt;</p>")]
#[case::text("text", "&lt;p&gt;a &lt;b&gt;&lt;/p&gt;")]
fn mode_flag_selects_escaping(#[case] mode: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdgen_cmd()
		.arg("convert")
		.arg("--mode")
		.arg(mode)
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("a <b>")
		.assert()
		.success()
		.stdout(predicates::str::contains(expected));

	Ok(())
}

#[test]
fn mode_defaults_to_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "mdgen.toml", "[convert]\nmode = \"markup\"\n")?;

	common::mdgen_cmd()
		.arg("convert")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("plain")
		.assert()
		.success()
		.stdout(predicates::str::contains("<p>plain</p>"));

	Ok(())
}

#[test]
fn writes_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let output = tmp.path().join("out/page.html");

	common::mdgen_cmd()
		.arg("convert")
		.arg("--output")
		.arg(&output)
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("# Title")
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(&output)?, "&lt;h1&gt;Title&lt;/h1&gt;");

	Ok(())
}

#[test]
fn invalid_config_is_reported() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "mdgen.toml", "[convert]\nmode = \"loud\"\n")?;

	common::mdgen_cmd()
		.arg("convert")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("x")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdgen::config_parse"));

	Ok(())
}
