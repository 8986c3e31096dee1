//! Static page rendering
//!
//! Templates are plain HTML files with `{{ key }}` placeholders. Values are
//! HTML-escaped unless inserted raw (pre-built list markup, playlist JSON).
//! Unknown keys render as empty strings.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::OutputPaths;
use crate::models::{Catalog, Entity, EntityKind, PlaylistItem};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap();
}

/// Consumes a finished catalog and writes the site pages
pub trait Renderer {
    /// Returns the number of pages written
    fn render(&self, catalog: &Catalog, paths: &OutputPaths) -> Result<usize>;
}

/// Timestamp identifying one build, `YYYYMMDD-HHMMSS` local time
pub fn build_id() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Values available to one template
#[derive(Debug, Default)]
pub struct PageContext {
    values: HashMap<String, String>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an escaped value
    pub fn text(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), escape_html(value));
        self
    }

    /// Insert markup as-is
    pub fn raw(mut self, key: &str, value: String) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn fill(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                self.values.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

/// Playlist as JSON safe to embed in a `<script>` element
fn playlist_json(items: &[PlaylistItem]) -> Result<String> {
    let json = serde_json::to_string(items)?;
    Ok(json.replace("</", "<\\/"))
}

fn link_list<'a>(links: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut html = String::new();
    for (url, label) in links {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(url),
            escape_html(label)
        ));
    }
    html
}

/// Entities sorted by display name, then slug
fn sorted_by_name(entities: &std::collections::BTreeMap<String, Entity>) -> Vec<&Entity> {
    let mut sorted: Vec<&Entity> = entities.values().collect();
    sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.slug.cmp(&b.slug)));
    sorted
}

/// Renders `index.html`, `composer.html`, `performer.html` and `file.html`
/// from a template directory
pub struct TemplateRenderer {
    template_dir: PathBuf,
    build_id: String,
}

impl TemplateRenderer {
    pub fn new(template_dir: impl Into<PathBuf>, build_id: String) -> Self {
        Self {
            template_dir: template_dir.into(),
            build_id,
        }
    }

    fn load_template(&self, name: &str) -> Result<String> {
        let path = self.template_dir.join(name);
        fs::read_to_string(&path).with_context(|| format!("Failed to read template {}", path.display()))
    }

    fn write_page(&self, template: &str, context: PageContext, output: &Path) -> Result<()> {
        let html = context.text("build_id", &self.build_id).fill(template);
        fs::write(output, html).with_context(|| format!("Failed to write {}", output.display()))
    }

    fn entity_context(&self, catalog: &Catalog, entity: &Entity) -> Result<PageContext> {
        let works = link_list(
            entity
                .works
                .iter()
                .filter_map(|id| catalog.files.get(id))
                .map(|f| (f.page_url.as_str(), f.title.as_str())),
        );
        let playlist = catalog
            .playlists
            .get(&entity.playlist_key())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(PageContext::new()
            .text("name", &entity.name)
            .text("slug", &entity.slug)
            .text("kind", entity.kind.as_str())
            .text("summary", &entity.enrichment.summary)
            .text("image_url", entity.enrichment.image_url.as_deref().unwrap_or(""))
            .text("page_url", &entity.page_url)
            .text("work_count", &entity.works.len().to_string())
            .raw("work_list", works)
            .raw("playlist_json", playlist_json(playlist)?))
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, catalog: &Catalog, paths: &OutputPaths) -> Result<usize> {
        info!("Rendering all HTML pages...");
        let mut pages = 0;

        let index = self.load_template("index.html")?;
        let composers = sorted_by_name(&catalog.composers);
        let performers = sorted_by_name(&catalog.performers);
        let context = PageContext::new()
            .text("composer_count", &catalog.composers.len().to_string())
            .text("performer_count", &catalog.performers.len().to_string())
            .text("file_count", &catalog.files.len().to_string())
            .raw(
                "composer_list",
                link_list(composers.iter().map(|e| (e.page_url.as_str(), e.name.as_str()))),
            )
            .raw(
                "performer_list",
                link_list(performers.iter().map(|e| (e.page_url.as_str(), e.name.as_str()))),
            );
        self.write_page(&index, context, &paths.root().join("index.html"))?;
        pages += 1;

        for kind in [EntityKind::Composer, EntityKind::Performer] {
            let template = self.load_template(&format!("{}.html", kind))?;
            for (slug, entity) in catalog.entities(kind) {
                let context = self.entity_context(catalog, entity)?;
                self.write_page(&template, context, &paths.entity_page_path(kind, slug))?;
                pages += 1;
            }
        }

        let file_template = self.load_template("file.html")?;
        for (id, file) in &catalog.files {
            let composer = catalog.composers.get(&file.composer_slug);
            let performer = catalog.performers.get(&file.performer_slug);
            let playlist = [PlaylistItem {
                url: file.media_url.clone(),
                title: file.title.clone(),
            }];

            let context = PageContext::new()
                .text("file_id", id)
                .text("title", &file.title)
                .text("media_url", &file.media_url)
                .text("composer_name", composer.map(|e| e.name.as_str()).unwrap_or(""))
                .text("composer_url", composer.map(|e| e.page_url.as_str()).unwrap_or(""))
                .text("performer_name", performer.map(|e| e.name.as_str()).unwrap_or(""))
                .text("performer_url", performer.map(|e| e.page_url.as_str()).unwrap_or(""))
                .raw("playlist_json", playlist_json(&playlist)?);
            self.write_page(&file_template, context, &paths.file_page_path(id))?;
            pages += 1;
        }

        info!("Site generation complete: {} pages", pages);
        Ok(pages)
    }
}
