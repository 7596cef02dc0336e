//! Rule catalog: the changelog entries a run matches against.
//!
//! The JSON layout is shared with existing changelog files, so field names
//! and value shapes (string-or-list, `"True"` flags) are kept as-is and
//! re-serialized in the same form.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::grammar::Language;

/// Abstract structural operation a pattern asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "function", alias = "function-call")]
    FunctionCall,
    #[serde(rename = "method", alias = "method-call")]
    MethodCall,
    #[serde(rename = "property", alias = "property-access")]
    PropertyAccess,
    #[serde(rename = "type", alias = "type-reference")]
    TypeReference,
    #[serde(rename = "import", alias = "import_dec", alias = "import_statement__name")]
    Import,
    #[serde(rename = "import_from_statement__module_name")]
    ImportFromModule,
    #[serde(rename = "import_from_statement__name")]
    ImportFromName,
    #[serde(rename = "function_arg", alias = "function-call-with-argument")]
    FunctionCallWithArgument,
    #[serde(rename = "method__kwarg", alias = "method-call-with-keyword-argument")]
    MethodCallWithKeywordArgument,
    #[serde(rename = "function__kwarg", alias = "function-call-with-keyword-argument")]
    FunctionCallWithKeywordArgument,
    #[serde(rename = "method__kwarg__type")]
    MethodCallWithKeywordArgumentValue,
    #[serde(rename = "function__kwarg__type")]
    FunctionCallWithKeywordArgumentValue,
}

/// How many match expressions an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(k) => write!(f, "{k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        OperationKind::FunctionCall,
        OperationKind::MethodCall,
        OperationKind::PropertyAccess,
        OperationKind::TypeReference,
        OperationKind::Import,
        OperationKind::ImportFromModule,
        OperationKind::ImportFromName,
        OperationKind::FunctionCallWithArgument,
        OperationKind::MethodCallWithKeywordArgument,
        OperationKind::FunctionCallWithKeywordArgument,
        OperationKind::MethodCallWithKeywordArgumentValue,
        OperationKind::FunctionCallWithKeywordArgumentValue,
    ];

    pub fn arity(&self) -> Arity {
        match self {
            OperationKind::FunctionCall
            | OperationKind::MethodCall
            | OperationKind::PropertyAccess
            | OperationKind::Import
            | OperationKind::ImportFromModule => Arity::Exactly(1),
            OperationKind::TypeReference => Arity::AtLeast(1),
            OperationKind::ImportFromName
            | OperationKind::FunctionCallWithArgument
            | OperationKind::MethodCallWithKeywordArgument
            | OperationKind::FunctionCallWithKeywordArgument => Arity::Exactly(2),
            OperationKind::MethodCallWithKeywordArgumentValue
            | OperationKind::FunctionCallWithKeywordArgumentValue => Arity::Exactly(3),
        }
    }

    /// The catalog tag this kind serializes to.
    pub fn tag(&self) -> &'static str {
        match self {
            OperationKind::FunctionCall => "function",
            OperationKind::MethodCall => "method",
            OperationKind::PropertyAccess => "property",
            OperationKind::TypeReference => "type",
            OperationKind::Import => "import",
            OperationKind::ImportFromModule => "import_from_statement__module_name",
            OperationKind::ImportFromName => "import_from_statement__name",
            OperationKind::FunctionCallWithArgument => "function_arg",
            OperationKind::MethodCallWithKeywordArgument => "method__kwarg",
            OperationKind::FunctionCallWithKeywordArgument => "function__kwarg",
            OperationKind::MethodCallWithKeywordArgumentValue => "method__kwarg__type",
            OperationKind::FunctionCallWithKeywordArgumentValue => "function__kwarg__type",
        }
    }
}

/// A string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(s) => std::slice::from_ref(s),
            OneOrMany::Many(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Structural match expression(s). A list is a multi-step query.
    #[serde(rename = "ts_pattern", default, skip_serializing_if = "Option::is_none")]
    pub structural: Option<OneOrMany>,

    #[serde(rename = "ts_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<OperationKind>,

    #[serde(
        rename = "ts_uniqueify",
        default,
        deserialize_with = "de_flag",
        serialize_with = "ser_flag",
        skip_serializing_if = "is_false"
    )]
    pub deduplicate: bool,

    /// Plain regex for the line-based fallback matcher.
    #[serde(rename = "re_pattern", default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub identifier: String,

    pub msg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<String>,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

impl Rule {
    /// Reference links, a single link normalized to a one-element list.
    pub fn links(&self) -> &[String] {
        self.refs.as_ref().map_or(&[], OneOrMany::as_slice)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    rules: Vec<Rule>,
}

impl Catalog {
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.identifier.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.identifier.clone()));
            }
        }
        Ok(Self { rules })
    }

    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        let rules: Vec<Rule> = serde_json::from_str(json).map_err(|source| ConfigError::Catalog {
            origin: origin.to_string(),
            source,
        })?;
        Self::from_rules(rules)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &json)
    }

    /// The changelog bundled for `language`.
    pub fn builtin(language: Language) -> Result<Self, ConfigError> {
        let json = match language {
            Language::Python => include_str!("resources/changelogs/python.json"),
            Language::Go => include_str!("resources/changelogs/go.json"),
            Language::JavaScript => include_str!("resources/changelogs/javascript.json"),
            Language::Java | Language::DotNet => {
                return Err(ConfigError::NoCatalog(language.name().to_string()));
            }
        };
        Self::from_json(&format!("built-in {language} changelog"), json)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, identifier: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rules)
    }
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

fn ser_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn is_false(value: &bool) -> bool {
    !*value
}
