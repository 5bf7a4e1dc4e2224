//! Translation table: language code → (key → localized string).
//!
//! Languages keep manifest order; the first one is the default language
//! used for un-prefixed requests.

use super::{SourceType, Translation};
use crate::config::ConfigError;
use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    languages: Vec<String>,
    strings: HashMap<String, HashMap<String, String>>,
}

impl TranslationTable {
    /// Load every declared translation, sources resolved against `root`.
    pub fn load(translations: &[Translation], root: &Path) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for translation in translations {
            let path = root.join(&translation.source);
            let content =
                fs::read_to_string(&path).map_err(|err| ConfigError::Io(path.clone(), err))?;
            let strings = parse_source(&content, translation.source_type, &path)?;
            table.insert(&translation.code, strings);
        }
        Ok(table)
    }

    pub fn insert(&mut self, code: &str, strings: HashMap<String, String>) {
        if !self.strings.contains_key(code) {
            self.languages.push(code.to_owned());
        }
        self.strings.insert(code.to_owned(), strings);
    }

    /// Language codes in declaration order
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn default_language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }

    /// Localized string for `key`, or `key` itself when missing.
    pub fn lookup<'a>(&'a self, code: &str, key: &'a str) -> &'a str {
        self.strings
            .get(code)
            .and_then(|strings| strings.get(key))
            .map_or(key, String::as_str)
    }
}

fn parse_source(
    content: &str,
    source_type: SourceType,
    path: &Path,
) -> Result<HashMap<String, String>, ConfigError> {
    // An empty file is an empty table rather than a parse error
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match source_type {
        SourceType::Yaml => {
            serde_yaml::from_str(content).map_err(|err| ConfigError::Yaml(path.to_path_buf(), err))
        }
        SourceType::Json => {
            serde_json::from_str(content).map_err(|err| ConfigError::Json(path.to_path_buf(), err))
        }
        SourceType::Toml => {
            toml::from_str(content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn translation(code: &str, source: &str, source_type: SourceType) -> Translation {
        Translation {
            code: code.into(),
            source: source.into(),
            source_type,
        }
    }

    #[test]
    fn test_load_all_formats() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("en.yaml"), "greeting: Hello\nbye: Bye\n").unwrap();
        fs::write(dir.path().join("es.json"), r#"{"greeting": "Hola"}"#).unwrap();
        fs::write(dir.path().join("fr.toml"), "greeting = \"Bonjour\"\n").unwrap();

        let table = TranslationTable::load(
            &[
                translation("en", "en.yaml", SourceType::Yaml),
                translation("es", "es.json", SourceType::Json),
                translation("fr", "fr.toml", SourceType::Toml),
            ],
            dir.path(),
        )
        .unwrap();

        assert_eq!(table.languages(), ["en", "es", "fr"]);
        assert_eq!(table.default_language(), Some("en"));
        assert_eq!(table.lookup("en", "greeting"), "Hello");
        assert_eq!(table.lookup("es", "greeting"), "Hola");
        assert_eq!(table.lookup("fr", "greeting"), "Bonjour");
    }

    #[test]
    fn test_missing_key_echoes_key() {
        let mut table = TranslationTable::default();
        table.insert("en", HashMap::from([("greeting".to_string(), "Hello".to_string())]));

        assert_eq!(table.lookup("en", "farewell"), "farewell");
        assert_eq!(table.lookup("de", "greeting"), "greeting");
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = TranslationTable::load(
            &[translation("en", "missing.yaml", SourceType::Yaml)],
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_malformed_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("en.json"), "{not json").unwrap();
        let err = TranslationTable::load(
            &[translation("en", "en.json", SourceType::Json)],
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(..)));
    }

    #[test]
    fn test_empty_source_is_empty_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("en.yaml"), "\n").unwrap();
        let table =
            TranslationTable::load(&[translation("en", "en.yaml", SourceType::Yaml)], dir.path())
                .unwrap();
        assert_eq!(table.lookup("en", "title"), "title");
    }
}
