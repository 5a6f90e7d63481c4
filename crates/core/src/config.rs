//! Conversion targets and `.protoshift.toml` loading.

use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};

/// Name of the optional config file looked up next to the target document.
pub const CONFIG_FILE_NAME: &str = ".protoshift.toml";

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A constructor parameter that falls back to a fixed value when omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultParam {
    pub param: String,
    /// Field assigned from the parameter (`this.<field> = <param>;`).
    pub field: String,
    /// Expression used when the caller passes `undefined`.
    pub fallback: String,
}

impl DefaultParam {
    pub fn new(param: &str, fallback: &str) -> Self {
        Self { param: param.to_string(), field: param.to_string(), fallback: fallback.to_string() }
    }
}

/// Which class to convert and what its constructor must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub name: String,
    /// Exact constructor parameter list. `None` accepts any list.
    pub constructor_params: Option<String>,
    pub defaults: Vec<DefaultParam>,
    /// 0-based line the class end must come after. Cross-check only.
    pub expected_end_after: Option<usize>,
}

impl ClassSpec {
    /// A spec that accepts whatever the class declares.
    pub fn unconstrained(name: &str) -> Self {
        Self { name: name.to_string(), constructor_params: None, defaults: Vec::new(), expected_end_after: None }
    }

    pub fn default_for(&self, param: &str) -> Option<&DefaultParam> {
        self.defaults.iter().find(|d| d.param == param)
    }
}

/// Runtime configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub classes: Vec<ClassSpec>,
    /// Convert every `class Name {` found, not only the listed ones.
    pub convert_all: bool,
    /// Run the array-destructuring parameter rewrite afterwards.
    pub fix_destructuring: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            classes: vec![
                ClassSpec {
                    name: "DistributedLock".to_string(),
                    constructor_params: Some("resource, timeout".to_string()),
                    defaults: vec![DefaultParam::new("timeout", "30000")],
                    expected_end_after: None,
                },
                ClassSpec {
                    name: "Transaction".to_string(),
                    constructor_params: Some("spreadsheet".to_string()),
                    defaults: Vec::new(),
                    expected_end_after: None,
                },
            ],
            convert_all: false,
            fix_destructuring: false,
        }
    }
}

impl ConvertConfig {
    /// Spec for a class seen in the document, if it should be converted.
    pub fn spec_for(&self, name: &str) -> Option<Cow<'_, ClassSpec>> {
        match self.classes.iter().find(|c| c.name == name) {
            Some(spec) => Some(Cow::Borrowed(spec)),
            None if self.convert_all => Some(Cow::Owned(ClassSpec::unconstrained(name))),
            None => None,
        }
    }

    /// Restrict conversion to `names`. Names without a spec are added
    /// unconstrained.
    pub fn restrict_to(&mut self, names: &[String]) {
        self.classes.retain(|c| names.contains(&c.name));
        for name in names {
            if !self.classes.iter().any(|c| &c.name == name) {
                self.classes.push(ClassSpec::unconstrained(name));
            }
        }
        self.convert_all = false;
    }
}

// ---------------------------------------------------------------------------
// .protoshift.toml loading
// ---------------------------------------------------------------------------

const KNOWN_CONFIG_KEYS: &[&str] = &["convert_all", "fix_destructuring", "class"];
const KNOWN_CLASS_KEYS: &[&str] = &["name", "constructor_params", "expected_end_after", "default"];
const KNOWN_DEFAULT_KEYS: &[&str] = &["param", "field", "fallback"];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn warn_unknown_keys(table: &toml::Table, known: &[&str], section: &str) {
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        match known.iter().min_by_key(|k| edit_distance(key, k)) {
            Some(suggestion) if edit_distance(key, suggestion) <= 3 => warn!(
                key = key.as_str(),
                section,
                "Unknown key in {CONFIG_FILE_NAME}; did you mean '{suggestion}'?"
            ),
            _ => warn!(
                key = key.as_str(),
                section,
                "Unknown key in {CONFIG_FILE_NAME} (known keys: {})",
                known.join(", ")
            ),
        }
    }
}

fn required_str(table: &toml::Table, key: &str, section: &str) -> std::result::Result<String, String> {
    table
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| format!("{section} is missing string key '{key}'"))
}

fn parse_default(value: &toml::Value, class: &str) -> std::result::Result<DefaultParam, String> {
    let section = format!("class '{class}' default");
    let table = value.as_table().ok_or_else(|| format!("{section} must be a table"))?;
    warn_unknown_keys(table, KNOWN_DEFAULT_KEYS, &section);

    let param = required_str(table, "param", &section)?;
    let fallback = match table.get("fallback") {
        Some(toml::Value::String(s)) => s.clone(),
        Some(toml::Value::Integer(n)) => n.to_string(),
        Some(toml::Value::Float(n)) => n.to_string(),
        Some(toml::Value::Boolean(b)) => b.to_string(),
        _ => return Err(format!("{section} for '{param}' needs a 'fallback' value")),
    };
    let field = table.get("field").and_then(|v| v.as_str()).unwrap_or(param.as_str()).to_string();
    Ok(DefaultParam { param, field, fallback })
}

fn parse_class(value: &toml::Value) -> std::result::Result<ClassSpec, String> {
    let table = value.as_table().ok_or("each [[class]] entry must be a table")?;
    let name = required_str(table, "name", "[[class]]")?;
    warn_unknown_keys(table, KNOWN_CLASS_KEYS, &format!("class '{name}'"));

    let constructor_params = table.get("constructor_params").and_then(|v| v.as_str()).map(|s| s.to_string());
    let expected_end_after = match table.get("expected_end_after") {
        Some(v) => Some(
            v.as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| format!("class '{name}': expected_end_after must be a non-negative integer"))?,
        ),
        None => None,
    };
    let defaults = match table.get("default").and_then(|v| v.as_array()) {
        Some(entries) => entries.iter().map(|d| parse_default(d, &name)).collect::<std::result::Result<_, _>>()?,
        None => Vec::new(),
    };

    Ok(ClassSpec { name, constructor_params, defaults, expected_end_after })
}

/// Parse config text. Listed classes replace the built-in defaults.
pub fn parse_config(content: &str) -> std::result::Result<ConvertConfig, String> {
    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
    warn_unknown_keys(&table, KNOWN_CONFIG_KEYS, "top level");

    let mut config = ConvertConfig::default();
    if let Some(v) = table.get("convert_all").and_then(|v| v.as_bool()) {
        config.convert_all = v;
    }
    if let Some(v) = table.get("fix_destructuring").and_then(|v| v.as_bool()) {
        config.fix_destructuring = v;
    }
    if let Some(classes) = table.get("class").and_then(|v| v.as_array()) {
        config.classes = classes.iter().map(parse_class).collect::<std::result::Result<_, _>>()?;
    }
    Ok(config)
}

/// Load a config file passed explicitly. Any problem is an error.
pub fn load_config_file(path: &Path) -> Result<ConvertConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    parse_config(&content).map_err(|message| ConvertError::Config { path: path.to_path_buf(), message })
}

/// Load `.protoshift.toml` from `dir` if present.
///
/// Returns defaults when the file doesn't exist or can't be parsed, with a
/// warning in the latter case.
pub fn load_config(dir: &Path) -> ConvertConfig {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return ConvertConfig::default();
    }

    debug!(path = %path.display(), "Loading {CONFIG_FILE_NAME}");
    match load_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring {CONFIG_FILE_NAME}: {e}");
            ConvertConfig::default()
        }
    }
}
