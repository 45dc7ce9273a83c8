mod common;

use mdgen_core::AnyEmptyResult;
use similar_asserts::assert_eq;

fn project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"templates/page.html",
		"<title>{{ site.title }} {{ subtitle }}</title>\n<h1>{% block A %}{% endblock \
		 %}</h1>\n<div>{% block B %}{% endblock %}</div>\n",
	)?;
	common::write_file(tmp.path(), "site.toml", "title = \"Docs\"\n")?;
	common::write_file(tmp.path(), "mdgen.toml", "[data]\nsite = \"site.toml\"\n")?;
	common::write_file(tmp.path(), "html/a.html", "<!-- mdgen:sha256:abc -->\n<p>x</p>")?;
	common::write_file(tmp.path(), "html/b.html", "y {{ injected }}")?;

	Ok(tmp)
}

#[test]
fn compose_fills_every_marker() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("page.html")
		.arg("--block")
		.arg("A=html/a.html")
		.arg("--block")
		.arg("B=html/b.html")
		.arg("--var")
		.arg("subtitle=Guide")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::diff(
			"<title>Docs Guide</title>\n<h1><p>x</p></h1>\n<div>y &#123;&#123; injected \
			 &#125;&#125;</div>\n",
		));

	Ok(())
}

#[test]
fn compose_reports_missing_fragments() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("page.html")
		.arg("--block")
		.arg("A=html/a.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdgen::missing_fragment"))
		.stderr(predicates::str::contains("`B`"));

	Ok(())
}

#[test]
fn compose_warns_about_unused_blocks() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("page.html")
		.arg("-b")
		.arg("A=html/a.html")
		.arg("-b")
		.arg("B=html/b.html")
		.arg("-b")
		.arg("C=html/b.html")
		.arg("--var")
		.arg("subtitle=Guide")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains(
			"warning: block `C` is not declared by page.html",
		));

	Ok(())
}

#[test]
fn compose_writes_output_file() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("page.html")
		.arg("-b")
		.arg("A=html/a.html")
		.arg("-b")
		.arg("B=html/b.html")
		.arg("--var")
		.arg("subtitle=Guide")
		.arg("--output")
		.arg("out/page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote out/page.html"));

	let page = std::fs::read_to_string(tmp.path().join("out/page.html"))?;
	assert_eq!(
		page,
		"<title>Docs Guide</title>\n<h1><p>x</p></h1>\n<div>y &#123;&#123; injected \
		 &#125;&#125;</div>\n"
	);

	Ok(())
}

#[test]
fn compose_rejects_undefined_variables() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("page.html")
		.arg("-b")
		.arg("A=html/a.html")
		.arg("-b")
		.arg("B=html/b.html")
		.arg("--output")
		.arg("out/page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdgen::template_render"));

	assert!(!tmp.path().join("out/page.html").exists());

	Ok(())
}

#[test]
fn compose_reports_missing_template() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("compose")
		.arg("nope.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdgen::template_not_found"));

	Ok(())
}

#[test]
fn markers_lists_template_markers() -> AnyEmptyResult {
	let tmp = project()?;

	common::mdgen_cmd()
		.arg("markers")
		.arg("page.html")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("page.html"))
		.stdout(predicates::str::is_match(r"A\s+2:5")?)
		.stdout(predicates::str::is_match(r"B\s+3:6")?);

	Ok(())
}
