//! The default resolver: plain local-filesystem paths.

use camino::Utf8Path;

use super::{Resolver, Target};
use crate::error::{SettingsError, SettingsResult};

/// Resolves `file://` locators (and scheme-less paths) against the local
/// filesystem, relative paths against the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl FileResolver {
    /// Creates the resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolver for FileResolver {
    fn schemes(&self) -> &'static [&'static str] {
        &["file"]
    }

    fn resolve(&self, target: &Target) -> SettingsResult<String> {
        let path = Utf8Path::new(target.path());
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SettingsError::NotFound {
                    locator: target.locator().to_owned(),
                })
            }
            Err(err) => Err(SettingsError::Io {
                path: path.to_string(),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::FileResolver;
    use crate::error::SettingsError;
    use crate::resolver::{Resolver, Target};

    #[test]
    fn reads_an_existing_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "config:\n  greet: Hello\n").expect("write");
        let locator = file.path().to_string_lossy().into_owned();
        let text = FileResolver::new()
            .resolve(&Target::parse(&locator, "file"))
            .expect("resolve");
        assert!(text.contains("greet: Hello"));
    }

    #[test]
    fn missing_files_surface_not_found() {
        let err = FileResolver::new()
            .resolve(&Target::parse("definitely-missing.yml", "file"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound { .. }));
    }
}
