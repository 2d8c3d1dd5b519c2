//! Font lookup for the PDF backend.
//!
//! Papers are printed with the `Roboto` family unless the caller names
//! another one. The family is searched for in, in order, the directory named
//! by [`FONTS_DIR_ENV`], `assets/fonts` next to the running binary and
//! `assets/fonts` in the crate root. On Windows the system Arial family is
//! used when none of those hold the files.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Family printed when no other is configured.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the default font files.
pub const FONTS_DIR_ENV: &str = "EXAM_PAPER_FONTS_DIR";

/// Environment variable overriding where the system fallback fonts live.
pub const WINDOWS_FONTS_DIR_ENV: &str = "EXAM_PAPER_WINDOWS_FONTS_DIR";

const STYLE_SUFFIXES: [&str; 4] = ["Regular", "Bold", "Italic", "BoldItalic"];

/// Arial files in regular, bold, italic, bold italic order.
const SYSTEM_FALLBACK: (&str, [&str; 4]) = (
    "Arial",
    ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"],
);

fn non_empty_env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Ordered list of directories a font family is looked up in.
#[derive(Clone, Debug, Default)]
struct SearchPath {
    directories: Vec<PathBuf>,
}

impl SearchPath {
    fn standard() -> Self {
        let mut path = Self::default();
        if let Some(directory) = non_empty_env_path(FONTS_DIR_ENV) {
            path.push(directory);
        }
        if let Some(bin_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            path.push(bin_dir.join("assets/fonts"));
        }
        path.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
        path
    }

    fn push(&mut self, directory: PathBuf) {
        if !self.directories.contains(&directory) {
            self.directories.push(directory);
        }
    }

    /// Returns the first directory holding every style of `family`.
    fn locate(&self, family: &str) -> Result<PathBuf, Error> {
        let mut rejected = Vec::with_capacity(self.directories.len());

        for directory in &self.directories {
            if !directory.is_dir() {
                rejected.push(format!("{} (no such directory)", directory.display()));
                continue;
            }
            let missing = missing_font_files(directory, family);
            if missing.is_empty() {
                debug!("Using font family '{}' from {}", family, directory.display());
                return Ok(directory.clone());
            }
            let names: Vec<_> = missing
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy())
                .collect();
            rejected.push(format!("{} (missing {})", directory.display(), names.join(", ")));
        }

        let checked = if rejected.is_empty() {
            "nothing".to_owned()
        } else {
            rejected.join("; ")
        };
        Err(Error::new(
            format!(
                "Font family '{family}' not found; checked {checked}. Set {FONTS_DIR_ENV} to a directory holding {family}-Regular.ttf and its variants."
            ),
            io::Error::new(io::ErrorKind::NotFound, "font family not found"),
        ))
    }
}

/// Lists the files expected for `family` in `directory` that are not there.
pub fn missing_font_files(directory: &Path, family: &str) -> Vec<PathBuf> {
    STYLE_SUFFIXES
        .iter()
        .map(|suffix| directory.join(format!("{family}-{suffix}.ttf")))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

/// Loads `family` from `directory`, expecting `<family>-Regular.ttf` and the
/// bold, italic and bold italic variants next to it.
///
/// Secondary-language papers need a family that covers their script; pass
/// such a family here.
pub fn font_family_from(directory: &Path, family: &str) -> Result<FontFamily<FontData>, Error> {
    fonts::from_files(directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
        )
    })
}

fn system_font_directory() -> Option<PathBuf> {
    if let Some(directory) = non_empty_env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(directory);
    }
    if cfg!(windows) {
        ["WINDIR", "SystemRoot"]
            .into_iter()
            .find_map(non_empty_env_path)
            .map(|root| root.join("Fonts"))
    } else {
        None
    }
}

fn system_fallback_family() -> Result<FontFamily<FontData>, Error> {
    let (name, files) = SYSTEM_FALLBACK;
    let directory = system_font_directory().ok_or_else(|| {
        Error::new(
            format!("No system font directory is known for the '{name}' fallback"),
            io::Error::new(io::ErrorKind::NotFound, "system fonts not available"),
        )
    })?;

    let load = |file: &str| {
        let path = directory.join(file);
        FontData::load(&path, None).map_err(|err| {
            Error::new(
                format!("Failed to load {} from {}: {}", name, path.display(), err),
                io::Error::new(io::ErrorKind::NotFound, err.to_string()),
            )
        })
    };
    let [regular, bold, italic, bold_italic] = files;

    Ok(FontFamily {
        regular: load(regular)?,
        bold: load(bold)?,
        italic: load(italic)?,
        bold_italic: load(bold_italic)?,
    })
}

fn is_not_found(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if matches!(io_err.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
    )
}

/// Loads the default family, falling back to the system Arial family when
/// the default files cannot be found.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let err = match SearchPath::standard()
        .locate(DEFAULT_FONT_FAMILY_NAME)
        .and_then(|directory| font_family_from(&directory, DEFAULT_FONT_FAMILY_NAME))
    {
        Ok(family) => return Ok(family),
        Err(err) if is_not_found(&err) => err,
        Err(err) => return Err(err),
    };

    match system_fallback_family() {
        Ok(family) => {
            warn!("{err}; printing with the system '{}' family", SYSTEM_FALLBACK.0);
            Ok(family)
        }
        Err(fallback_err) => {
            warn!("{err}; system fallback failed: {fallback_err}");
            Err(err)
        }
    }
}

/// Indicates whether the default font family can be found on disk.
pub fn default_fonts_available() -> bool {
    SearchPath::standard()
        .locate(DEFAULT_FONT_FAMILY_NAME)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_listed_per_style() {
        let directory = Path::new("/__exam_paper_no_fonts__");
        let missing = missing_font_files(directory, "Noto");
        assert_eq!(missing.len(), 4);
        assert!(missing[0].ends_with("Noto-Regular.ttf"));
        assert!(missing[3].ends_with("Noto-BoldItalic.ttf"));
    }

    #[test]
    fn search_path_skips_duplicates() {
        let mut path = SearchPath::default();
        path.push(PathBuf::from("/a"));
        path.push(PathBuf::from("/b"));
        path.push(PathBuf::from("/a"));
        assert_eq!(path.directories, [PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn unknown_family_reports_checked_directories() {
        let mut path = SearchPath::default();
        path.push(PathBuf::from("/__exam_paper_no_fonts__"));
        let err = path.locate("__NoSuchFamily__").unwrap_err();
        assert!(is_not_found(&err));
        let message = err.to_string();
        assert!(message.contains("/__exam_paper_no_fonts__ (no such directory)"));
        assert!(message.contains(FONTS_DIR_ENV));
    }

    #[test]
    fn loading_from_missing_directory_fails() {
        assert!(font_family_from(Path::new("/__exam_paper_no_fonts__"), "Roboto").is_err());
    }
}
