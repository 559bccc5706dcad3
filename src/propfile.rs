// Property File Parser
// Parses simple key=value property files

use std::fs;
use std::path::Path;

/// Parse a property file string, invoking `handler` for each key-value pair.
///
/// Keys and values are trimmed. `#` starts a comment, on its own line or
/// after a value. Lines without `=` are skipped with a warning. The handler
/// receives the 1-based line number along with the pair.
pub fn parse_propfile(data: &str, handler: &mut dyn FnMut(usize, &str, &str)) {
    for (index, raw) in data.lines().enumerate() {
        let line = match raw.find('#') {
            Some(hash) => &raw[..hash],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    log::warn!("Value without key on line {}", index + 1);
                    continue;
                }
                handler(index + 1, key, value.trim());
            }
            None => log::warn!("Key without value on line {}", index + 1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("Property file not found: {0}")]
    FileNotFound(String),
    #[error("I/O error reading property file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One `key = value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// A parsed property file, entries kept in file order
#[derive(Debug, Clone, Default)]
pub struct PropertyFile {
    entries: Vec<Property>,
}

impl PropertyFile {
    pub fn parse(data: &str) -> Self {
        let mut entries = Vec::new();
        parse_propfile(data, &mut |line, key, value| {
            entries.push(Property {
                line,
                key: key.to_string(),
                value: value.to_string(),
            });
        });
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, PropertyError> {
        let data = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PropertyError::FileNotFound(path.display().to_string())
            } else {
                PropertyError::IoError {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;
        Ok(Self::parse(&data))
    }

    /// Last value given for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn entries(&self) -> &[Property] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple() {
        let props = PropertyFile::parse("key1=value1\nkey2 = value2\n");
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("key1"), Some("value1"));
        assert_eq!(props.get("key2"), Some("value2"));
    }

    #[test]
    fn test_parse_comments() {
        let props = PropertyFile::parse("# header\n\nvolume.fx = 40 # quieter\n   # indented\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("volume.fx"), Some("40"));
        assert_eq!(props.entries()[0].line, 3);
    }

    #[test]
    fn test_key_without_value_skipped() {
        let props = PropertyFile::parse("orphan\n= lonely\nkey=\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key"), Some(""));
    }

    #[test]
    fn test_last_value_wins() {
        let props = PropertyFile::parse("a=1\na=2\n");
        assert_eq!(props.get("a"), Some("2"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_value_keeps_inner_equals() {
        let props = PropertyFile::parse("expr = a=b\n");
        assert_eq!(props.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mixer.channels = 16").unwrap();
        let props = PropertyFile::load(file.path()).unwrap();
        assert_eq!(props.get("mixer.channels"), Some("16"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PropertyFile::load(Path::new("/nonexistent/audio.cfg")).unwrap_err();
        assert!(matches!(err, PropertyError::FileNotFound(_)));
    }
}
