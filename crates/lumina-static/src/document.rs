//! Assembly of runnable documents from page fragments.

use minijinja::{context, Value};

use lumina_core::{PageSource, ViewerState};

use crate::templates::{ShellContext, TemplateEngine};

/// Utility-class styling engine every assembled document loads.
pub const TAILWIND_CDN_URL: &str = "https://cdn.tailwindcss.com";

/// Font stylesheet referenced by exported projects.
pub const INTER_FONT_URL: &str =
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap";

/// Sandbox flags for viewing generated content. Scripts run, but without
/// access to the embedding origin.
pub const VIEWER_SANDBOX: &str = "allow-scripts allow-popups allow-forms";

/// Errors that can occur while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Renders pages and the documents around them.
pub struct PageRenderer {
    templates: TemplateEngine,
}

impl PageRenderer {
    /// Create a renderer with the built-in templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            templates: TemplateEngine::new()?,
        })
    }

    /// Combine the fragments into one self-contained document.
    ///
    /// Markup goes in the body, the style fragment in a `<style>` block, the
    /// script fragment in a trailing `<script>` block.
    pub fn assemble(&self, source: &PageSource) -> Result<String, RenderError> {
        let html = self.templates.render(
            "preview.html",
            context! {
                title => &source.title,
                tailwind_url => TAILWIND_CDN_URL,
                markup => &source.markup,
                style => &source.style,
                script => &source.script,
            },
        )?;
        Ok(html)
    }

    /// Entry document of an exported project, linking `style.css` and `script.js`.
    pub fn project_index(&self, source: &PageSource) -> Result<String, RenderError> {
        let html = self.templates.render(
            "export.html",
            context! {
                title => &source.title,
                tailwind_url => TAILWIND_CDN_URL,
                font_url => INTER_FONT_URL,
                markup => &source.markup,
            },
        )?;
        Ok(html)
    }

    /// Page shown for a public link.
    ///
    /// A loaded page is embedded in a sandboxed frame; anything else renders
    /// the unavailable card with a link back to `home_url`.
    pub fn viewer(&self, state: &ViewerState, home_url: &str) -> Result<String, RenderError> {
        match state {
            ViewerState::Loaded(page) => {
                let document = self.assemble(&page.source)?;
                let html = self.templates.render(
                    "viewer.html",
                    context! {
                        title => page.title(),
                        document => document,
                        sandbox => VIEWER_SANDBOX,
                        home_url => home_url,
                    },
                )?;
                Ok(html)
            }
            ViewerState::Unavailable(message) => self.unavailable(message, home_url),
            ViewerState::Loading => self.unavailable("Loading Page...", home_url),
        }
    }

    fn unavailable(&self, message: &str, home_url: &str) -> Result<String, RenderError> {
        let html = self.templates.render(
            "unavailable.html",
            context! {
                message => message,
                home_url => home_url,
            },
        )?;
        Ok(html)
    }

    /// The application shell.
    pub fn shell(&self, ctx: &ShellContext) -> Result<String, RenderError> {
        Ok(self.templates.render("app.html", Value::from_serialize(ctx))?)
    }
}
