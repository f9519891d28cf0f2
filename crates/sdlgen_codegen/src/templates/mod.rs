//! Template rendering for generated files.
//!
//! Templates are [tera] templates. Besides the tera builtins they get:
//! - `reserve_import(path=...)`: records a `use` for the file and renders
//!   nothing
//! - `raw_string`: renders text as a Rust raw string literal
//! - `snake_case`: converts an identifier to snake case
//!
//! Several templates may render into the same file. Their bodies are
//! concatenated behind a single header and import block.

mod escape;
mod imports;

pub use escape::raw_string_literal;
pub use imports::ImportCollector;

use crate::error::{CodegenError, Result};
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tera::{Context, Tera, Value};
use tracing::{debug, info};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by sdlgen. DO NOT EDIT.";

/// What to render and where.
pub struct Options<'a, T: Serialize> {
    pub template: &'a str,
    /// Template name used in error messages.
    pub name: &'a str,
    /// Output path, relative to the output directory.
    pub filename: PathBuf,
    /// Module the file belongs to.
    pub package_name: &'a str,
    pub data: &'a T,
}

#[derive(Debug, Clone, Default)]
struct RenderedFile {
    package_name: String,
    imports: ImportCollector,
    bodies: Vec<String>,
}

impl RenderedFile {
    fn contents(&self) -> String {
        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push('\n');
        out.push_str("// Module: ");
        out.push_str(&self.package_name);
        out.push_str("\n\n");
        if !self.imports.is_empty() {
            out.push_str(&self.imports.render());
            out.push('\n');
        }
        out.push_str(&self.bodies.join("\n"));
        out
    }
}

/// Collects rendered templates per output file.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    files: IndexMap<PathBuf, RenderedFile>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a template and appends the result to its output file.
    pub fn render<T: Serialize>(&mut self, options: Options<'_, T>) -> Result<()> {
        let render_error = |source| CodegenError::Render {
            template: options.name.to_string(),
            source,
        };

        let imports = Arc::new(Mutex::new(ImportCollector::new()));
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.register_function("reserve_import", reserve_import(Arc::clone(&imports)));
        tera.register_filter("raw_string", raw_string_filter);
        tera.register_filter("snake_case", snake_case_filter);
        tera.add_raw_template(options.name, options.template)
            .map_err(render_error)?;

        let context = Context::from_serialize(options.data).map_err(render_error)?;
        let body = tera.render(options.name, &context).map_err(render_error)?;
        drop(tera);

        let reserved = imports
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default();

        let file = self
            .files
            .entry(options.filename.clone())
            .or_insert_with(|| RenderedFile {
                package_name: options.package_name.to_string(),
                ..RenderedFile::default()
            });
        file.imports.merge(&reserved);
        file.bodies.push(tidy(&body));

        debug!(template = options.name, file = %options.filename.display(), "rendered");
        Ok(())
    }

    /// Output paths in render order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// The assembled contents of an output file.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.get(path.as_ref()).map(RenderedFile::contents)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every file below `dir`, creating directories as needed.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (relative, file) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| CodegenError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, file.contents()).map_err(|source| CodegenError::Io {
                path: path.clone(),
                source,
            })?;
            info!(file = %path.display(), "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

fn reserve_import(
    imports: Arc<Mutex<ImportCollector>>,
) -> impl Fn(&HashMap<String, Value>) -> tera::Result<Value> + Sync + Send {
    move |args| {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("reserve_import expects a string `path` argument"))?;
        imports
            .lock()
            .map_err(|_| tera::Error::msg("import collector is poisoned"))?
            .reserve(path);
        Ok(Value::String(String::new()))
    }
}

fn raw_string_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("raw_string expects a string"))?;
    Ok(Value::String(raw_string_literal(text)))
}

fn snake_case_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("snake_case expects a string"))?;
    Ok(Value::String(text.to_case(Case::Snake)))
}

/// Drops the blank lines that tags leave around a body and ends it with a
/// single newline.
fn tidy(body: &str) -> String {
    let mut out = body.trim_start_matches(['\n', '\r']).trim_end().to_string();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Greeting<'a> {
        name: &'a str,
        text: &'a str,
    }

    fn options<'a>(template: &'a str, data: &'a Greeting<'a>) -> Options<'a, Greeting<'a>> {
        Options {
            template,
            name: "greeting.rs",
            filename: PathBuf::from("greeting.rs"),
            package_name: "generated",
            data,
        }
    }

    #[test]
    fn test_render_with_imports_and_filters() {
        let data = Greeting {
            name: "findProductByUpc",
            text: r#"say "hi""#,
        };
        let template = "{{ reserve_import(path=\"crate::runtime::Context\") }}\n\n\n\
                        pub fn {{ name | snake_case }}(_ctx: &Context) -> &'static str {\n    \
                        {{ text | raw_string }}\n}\n";

        let mut renderer = Renderer::new();
        renderer.render(options(template, &data)).unwrap();

        let file = renderer.file("greeting.rs").unwrap();
        insta::assert_snapshot!(file.trim_end(), @r###"
        // Code generated by sdlgen. DO NOT EDIT.
        // Module: generated

        use crate::runtime::Context;

        pub fn find_product_by_upc(_ctx: &Context) -> &'static str {
            r#"say "hi""#
        }
        "###);
    }

    #[test]
    fn test_renders_into_same_file_are_concatenated() {
        let first = Greeting { name: "a", text: "" };
        let second = Greeting { name: "b", text: "" };
        let mut renderer = Renderer::new();
        renderer
            .render(options("{{ reserve_import(path=\"x::A\") }}const {{ name }}: u8 = 1;\n", &first))
            .unwrap();
        renderer
            .render(options("{{ reserve_import(path=\"x::B\") }}const {{ name }}: u8 = 2;\n", &second))
            .unwrap();

        assert_eq!(renderer.paths().count(), 1);
        assert_eq!(
            renderer.file("greeting.rs").unwrap(),
            format!("{GENERATED_HEADER}\n// Module: generated\n\nuse x::{{A, B}};\n\nconst a: u8 = 1;\n\nconst b: u8 = 2;\n")
        );
    }

    #[test]
    fn test_template_errors_name_the_template() {
        let data = Greeting { name: "a", text: "" };
        let err = Renderer::new()
            .render(options("{{ missing_value }}", &data))
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to render template 'greeting.rs'");
    }

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let data = Greeting { name: "a", text: "" };
        let mut renderer = Renderer::new();
        renderer
            .render(Options {
                filename: PathBuf::from("nested/out.rs"),
                ..options("const {{ name }}: u8 = 0;\n", &data)
            })
            .unwrap();

        let written = renderer.write_all(dir.path()).unwrap();
        assert_eq!(written, [dir.path().join("nested/out.rs")]);
        let contents = std::fs::read_to_string(&written[0]).unwrap();
        assert!(contents.starts_with(GENERATED_HEADER));
        assert!(contents.ends_with("const a: u8 = 0;\n"));
    }
}
