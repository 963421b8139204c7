//! Export of a page as a standalone project folder.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use lumina_core::PageSource;

use crate::document::{PageRenderer, RenderError};

const FALLBACK_NAME: &str = "landingpage";
const EMPTY_STYLE: &str = "/* No custom CSS needed, Tailwind handles it */";
const EMPTY_SCRIPT: &str = "// No custom JS needed";
const ASSETS_README: &str =
    "Place your local images here and update the src attributes in index.html";

/// Errors that can occur during export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Folder name derived from a page title.
///
/// Lowercase ASCII letters and digits survive; everything else is dropped.
/// Falls back to `landingpage` when nothing is left.
pub fn sanitize_title(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// A single file of an exported project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Path relative to the project folder
    pub path: String,
    pub contents: String,
}

/// A page laid out as a static project.
#[derive(Debug, Clone)]
pub struct ExportedProject {
    /// Top-level folder name
    pub name: String,
    pub files: Vec<ProjectFile>,
}

impl ExportedProject {
    /// Lay out the project files for a page.
    pub fn build(renderer: &PageRenderer, source: &PageSource) -> Result<Self, ExportError> {
        let name = sanitize_title(&source.title);

        let style = if source.style.is_empty() {
            EMPTY_STYLE.to_string()
        } else {
            source.style.clone()
        };
        let script = if source.script.is_empty() {
            EMPTY_SCRIPT.to_string()
        } else {
            source.script.clone()
        };

        let files = vec![
            ProjectFile {
                path: "index.html".to_string(),
                contents: renderer.project_index(source)?,
            },
            ProjectFile {
                path: "style.css".to_string(),
                contents: style,
            },
            ProjectFile {
                path: "script.js".to_string(),
                contents: script,
            },
            ProjectFile {
                path: "assets/README.md".to_string(),
                contents: ASSETS_README.to_string(),
            },
        ];

        Ok(Self { name, files })
    }

    /// Download name of the archive.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.name)
    }

    /// Pack the project into a zip archive with one top-level folder.
    pub fn to_zip(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.add_directory(format!("{}/", self.name), options)?;
        writer.add_directory(format!("{}/assets/", self.name), options)?;

        for file in &self.files {
            writer.start_file(format!("{}/{}", self.name, file.path), options)?;
            writer
                .write_all(file.contents.as_bytes())
                .map_err(zip::result::ZipError::Io)?;
        }

        let cursor = writer.finish()?;
        tracing::debug!("Packed {} ({} files)", self.archive_name(), self.files.len());
        Ok(cursor.into_inner())
    }

    /// Write the project folder under `parent`. Returns the folder path.
    pub fn write_to(&self, parent: &Path) -> Result<PathBuf, ExportError> {
        let root = parent.join(&self.name);

        for file in &self.files {
            let path = root.join(&file.path);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, &file.contents)
                .map_err(|source| ExportError::Write { path, source })?;
        }

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    fn source(title: &str, style: &str, script: &str) -> PageSource {
        PageSource {
            title: title.to_string(),
            markup: "<main>Cafe</main>".to_string(),
            style: style.to_string(),
            script: script.to_string(),
        }
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(sanitize_title("My Café, Inc!"), "mycafinc");
        assert_eq!(sanitize_title("Pricing 2026"), "pricing2026");
        assert_eq!(sanitize_title("!!!"), "landingpage");
        assert_eq!(sanitize_title(""), "landingpage");
    }

    #[test]
    fn substitutes_placeholders_for_empty_fragments() {
        let renderer = PageRenderer::new().unwrap();

        let project = ExportedProject::build(&renderer, &source("Cafe", "", "")).unwrap();

        let paths: Vec<_> = project.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["index.html", "style.css", "script.js", "assets/README.md"]
        );
        assert_eq!(project.files[1].contents, EMPTY_STYLE);
        assert_eq!(project.files[2].contents, EMPTY_SCRIPT);
    }

    #[test]
    fn keeps_fragments_verbatim() {
        let renderer = PageRenderer::new().unwrap();

        let project =
            ExportedProject::build(&renderer, &source("Cafe", "h1 { color: red; }", "init();"))
                .unwrap();

        assert_eq!(project.files[1].contents, "h1 { color: red; }");
        assert_eq!(project.files[2].contents, "init();");
        assert!(project.files[0].contents.contains("<main>Cafe</main>"));
    }

    #[test]
    fn zip_has_single_top_level_folder() {
        let renderer = PageRenderer::new().unwrap();
        let project = ExportedProject::build(&renderer, &source("My Café, Inc!", "", "")).unwrap();

        assert_eq!(project.archive_name(), "mycafinc.zip");

        let bytes = project.to_zip().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        for i in 0..archive.len() {
            let entry = archive.by_index(i).unwrap();
            assert!(entry.name().starts_with("mycafinc/"), "{}", entry.name());
        }

        let mut readme = String::new();
        archive
            .by_name("mycafinc/assets/README.md")
            .unwrap()
            .read_to_string(&mut readme)
            .unwrap();
        assert_eq!(readme, ASSETS_README);

        let mut style = String::new();
        archive
            .by_name("mycafinc/style.css")
            .unwrap()
            .read_to_string(&mut style)
            .unwrap();
        assert_eq!(style, EMPTY_STYLE);
    }

    #[test]
    fn writes_project_folder() {
        let renderer = PageRenderer::new().unwrap();
        let project = ExportedProject::build(&renderer, &source("Cafe", "", "")).unwrap();
        let temp = TempDir::new().unwrap();

        let root = project.write_to(temp.path()).unwrap();

        assert_eq!(root, temp.path().join("cafe"));
        let mut written: Vec<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        written.sort();
        assert_eq!(
            written,
            vec!["assets/README.md", "index.html", "script.js", "style.css"]
        );
    }
}
