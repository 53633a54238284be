//! `.env.local` assembly.
//!
//! The backend CLI writes its own deployment variables into the same file, so existing lines are
//! kept verbatim and new keys are only appended.
use indexmap::IndexMap;

pub const ENV_FILE: &str = ".env.local";

#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    /// Every line as it will be written back.
    lines: Vec<String>,
    values: IndexMap<String, String>,
}
impl EnvFile {
    pub fn parse(content: &str) -> Self {
        let mut env = Self::default();

        for raw in content.lines() {
            let trimmed = raw.trim_start();
            let assignment = trimmed
                .strip_prefix("export ")
                .unwrap_or(trimmed)
                .split_once('=')
                .filter(|(key, _)| !trimmed.starts_with('#') && is_key(key.trim()));

            if let Some((key, value)) = assignment {
                // first assignment wins, like most dotenv loaders
                env.values
                    .entry(key.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
            env.lines.push(raw.to_string());
        }

        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Appends `key=value` unless `key` is already present. Returns whether the file changed.
    pub fn set_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.values.contains_key(key) {
            return false;
        }

        let value = quote(value);
        self.lines.push(format!("{key}={value}"));
        self.values.insert(key.to_string(), value);

        true
    }

    pub fn render(&self) -> String {
        self.lines.iter().map(|line| format!("{line}\n")).collect()
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '#' || c == '"') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
