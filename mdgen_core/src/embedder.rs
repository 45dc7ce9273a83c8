use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::Fragment;
use crate::MdgenError;
use crate::MdgenResult;
use crate::Template;

/// Template name used for the host template inside the environment.
const HOST_TEMPLATE: &str = "@host";
/// Template name used for the generated child template.
const PAGE_TEMPLATE: &str = "@page";
/// Context key holding the fragment text for each marker.
const FRAGMENTS_KEY: &str = "__mdgen_fragments";

/// The outcome of embedding fragments into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
	/// The composed text.
	pub text: String,
	/// Names of supplied fragments that the template never referenced.
	pub unused_fragments: Vec<String>,
}

/// Replace every marker in `template` with its fragment.
///
/// Each marker must have a fragment, otherwise the composition fails with
/// [`MdgenError::MissingFragment`] naming every unresolved marker. Fragments
/// that the template doesn't reference are ignored.
///
/// The host template text outside the markers is rendered as Jinja: comments
/// are dropped and every `{{ variable }}` must be defined. `embed` supplies no
/// variables, so a host that uses any fails with
/// [`MdgenError::TemplateRender`]. Use [`compose`] to pass data.
#[allow(clippy::implicit_hasher)]
pub fn embed(template: &Template, fragments: &HashMap<String, Fragment>) -> MdgenResult<String> {
	compose(template, fragments, &HashMap::new(), None).map(|composition| composition.text)
}

/// Like [`embed`], but also renders `data` as template variables and resolves
/// `{% extends %}` / `{% include %}` against `template_dir`. Undefined
/// variables are an error.
///
/// Fragment text is inserted verbatim: it is passed to the template engine as
/// a value, never parsed as template source.
#[allow(clippy::implicit_hasher)]
pub fn compose(
	template: &Template,
	fragments: &HashMap<String, Fragment>,
	data: &HashMap<String, serde_json::Value>,
	template_dir: Option<&Path>,
) -> MdgenResult<Composition> {
	let missing: Vec<String> = template
		.marker_names()
		.filter(|name| !fragments.contains_key(*name))
		.map(ToString::to_string)
		.collect();

	if !missing.is_empty() {
		return Err(MdgenError::MissingFragment(missing));
	}

	let mut unused_fragments: Vec<String> = fragments
		.keys()
		.filter(|name| !template.has_marker(name))
		.cloned()
		.collect();
	unused_fragments.sort();

	for name in &unused_fragments {
		tracing::debug!(
			template = template.name(),
			fragment = name.as_str(),
			"ignoring unused fragment"
		);
	}

	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
	env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
	if let Some(dir) = template_dir {
		env.set_loader(minijinja::path_loader(dir));
	}

	env.add_template_owned(HOST_TEMPLATE, template.source().to_string())
		.map_err(|e| MdgenError::TemplateRender(e.to_string()))?;
	env.add_template_owned(PAGE_TEMPLATE, page_source(template))
		.map_err(|e| MdgenError::TemplateRender(e.to_string()))?;

	let page = env
		.get_template(PAGE_TEMPLATE)
		.map_err(|e| MdgenError::TemplateRender(e.to_string()))?;

	let mut ctx: BTreeMap<String, minijinja::Value> = data
		.iter()
		.map(|(key, value)| (key.clone(), minijinja::Value::from_serialize(value)))
		.collect();
	let fragment_values: BTreeMap<&str, &str> = template
		.marker_names()
		.filter_map(|name| {
			fragments
				.get(name)
				.map(|fragment| (name, fragment.html()))
		})
		.collect();
	ctx.insert(
		FRAGMENTS_KEY.to_string(),
		minijinja::Value::from_serialize(&fragment_values),
	);

	let text = page
		.render(ctx)
		.map_err(|e| MdgenError::TemplateRender(e.to_string()))?;

	tracing::debug!(
		template = template.name(),
		markers = template.markers().len(),
		output_len = text.len(),
		"composed template"
	);

	Ok(Composition {
		text,
		unused_fragments,
	})
}

/// Build the child template that extends the host and fills each marker
/// with its fragment value.
fn page_source(template: &Template) -> String {
	let mut page = format!("{{% extends \"{HOST_TEMPLATE}\" %}}");

	for name in template.marker_names() {
		page.push_str(&format!(
			"{{% block {name} %}}{{{{ {FRAGMENTS_KEY}[\"{name}\"] }}}}{{% endblock %}}"
		));
	}

	page
}

/// Builder for composing a page out of a named template and a set of
/// blocks.
///
/// ```rust,no_run
/// use mdgen_core::Fragment;
/// use mdgen_core::Page;
///
/// let page = Page::new("templates", "index.html")
/// 	.add_block("b1", Fragment::from_html("<p>one</p>"))
/// 	.add_block("b2", Fragment::from_html("<p>two</p>"));
/// let html = page.render(&Default::default()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Page {
	template_dir: PathBuf,
	template_name: String,
	blocks: HashMap<String, Fragment>,
}

impl Page {
	pub fn new(template_dir: impl Into<PathBuf>, template_name: impl Into<String>) -> Self {
		Self {
			template_dir: template_dir.into(),
			template_name: template_name.into(),
			blocks: HashMap::new(),
		}
	}

	#[must_use]
	pub fn add_block(mut self, name: impl Into<String>, fragment: Fragment) -> Self {
		self.blocks.insert(name.into(), fragment);
		self
	}

	pub fn blocks(&self) -> &HashMap<String, Fragment> {
		&self.blocks
	}

	/// Load the host template from the template directory.
	pub fn template(&self) -> MdgenResult<Template> {
		let path = self.template_dir.join(&self.template_name);
		if !path.is_file() {
			return Err(MdgenError::TemplateNotFound(
				path.display().to_string(),
			));
		}

		Template::from_path(&path)
	}

	/// Compose the page, rendering `data` as template variables.
	#[allow(clippy::implicit_hasher)]
	pub fn render(&self, data: &HashMap<String, serde_json::Value>) -> MdgenResult<String> {
		self.compose(data).map(|composition| composition.text)
	}

	#[allow(clippy::implicit_hasher)]
	pub fn compose(&self, data: &HashMap<String, serde_json::Value>) -> MdgenResult<Composition> {
		let template = self.template()?;
		compose(&template, &self.blocks, data, Some(&self.template_dir))
	}
}
