//! Document assembly and static export for Lumina pages.
//!
//! Turns the three page fragments into a runnable HTML document for preview
//! and public viewing, or into a downloadable project folder.

pub mod document;
pub mod export;
pub mod templates;

pub use document::{PageRenderer, RenderError, INTER_FONT_URL, TAILWIND_CDN_URL, VIEWER_SANDBOX};
pub use export::{sanitize_title, ExportError, ExportedProject, ProjectFile};
pub use templates::{ShellContext, ShellPage, TemplateEngine};
