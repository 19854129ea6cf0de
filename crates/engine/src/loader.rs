//! Declarative task source loader.
//!
//! Parses a YAML task list into an ordered sequence of [`Task`] values,
//! resolving every check entry through a [`CheckRegistry`]. Loading fails
//! closed: any malformed task or unresolvable check aborts the whole load.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;
use waypoint_core::{Form, InputTypes};

use crate::check::Check;
use crate::error::LoadError;
use crate::registry::CheckRegistry;

/// A named, ordered unit of required progress.
///
/// Created once at load time and immutable thereafter. Task order is
/// significant: it defines the gating sequence.
pub struct Task {
    /// Unique, stable identifier
    pub name: String,

    /// Display title
    pub title: String,

    /// Longer description shown to the learner
    pub description: String,

    /// Configured checks, in declared order
    pub checks: Vec<Box<dyn Check>>,

    /// Optional structured input form
    pub form: Option<Form>,
}

/// A parsed task source: document properties, config, and ordered tasks.
pub struct TaskSet {
    /// Document title
    pub title: String,

    /// Optional subtitle
    pub subtitle: String,

    /// Free-form scalar configuration (e.g. the `base_url` template)
    pub config: BTreeMap<String, String>,

    /// Tasks in declared order
    pub tasks: Vec<Task>,
}

impl TaskSet {
    /// Derive a target's base URL from the `base_url` config template.
    ///
    /// The template may contain a `{name}` placeholder, e.g.
    /// `https://{name}.example.com`.
    pub fn base_url_for(&self, name: &str) -> Option<String> {
        self.config
            .get("base_url")
            .map(|template| template.replace("{name}", name))
    }

    /// Find a task by name.
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// Parses a declarative task list, resolving check entries through a
/// [`CheckRegistry`].
pub struct TaskLoader<'a> {
    registry: &'a CheckRegistry,
    input_types: InputTypes,
}

impl<'a> TaskLoader<'a> {
    /// Create a loader backed by the given registry and the built-in form
    /// input types.
    pub fn new(registry: &'a CheckRegistry) -> Self {
        Self {
            registry,
            input_types: InputTypes::with_builtins(),
        }
    }

    /// Replace the form input-type table.
    pub fn with_input_types(mut self, input_types: InputTypes) -> Self {
        self.input_types = input_types;
        self
    }

    /// Load a task source from a file.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<TaskSet, LoadError> {
        let source = tokio::fs::read_to_string(path).await?;
        self.load_str(&source)
    }

    /// Load a task source from a string.
    pub fn load_str(&self, source: &str) -> Result<TaskSet, LoadError> {
        let doc: Value = serde_yaml::from_str(source)?;
        if !doc.is_mapping() {
            return Err(LoadError::InvalidDocument(
                "document root must be a mapping".to_string(),
            ));
        }

        let title = string_field(&doc, "title").ok_or_else(|| {
            LoadError::InvalidDocument("missing document `title`".to_string())
        })?;
        let subtitle = string_field(&doc, "subtitle").unwrap_or_default();
        let config = parse_config(&doc)?;

        let entries = doc
            .get("tasks")
            .and_then(Value::as_sequence)
            .ok_or_else(|| LoadError::InvalidDocument("missing `tasks` list".to_string()))?;

        let mut tasks: Vec<Task> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let task = self.parse_task(index, entry)?;
            if tasks.iter().any(|t| t.name == task.name) {
                return Err(LoadError::DuplicateTask(task.name));
            }
            tasks.push(task);
        }

        Ok(TaskSet {
            title,
            subtitle,
            config,
            tasks,
        })
    }

    fn parse_task(&self, index: usize, entry: &Value) -> Result<Task, LoadError> {
        if !entry.is_mapping() {
            return Err(LoadError::InvalidDocument(format!(
                "task {} must be a mapping",
                index
            )));
        }

        let name = string_field(entry, "name")
            .ok_or(LoadError::MissingField { index, field: "name" })?;
        let title = string_field(entry, "title")
            .ok_or(LoadError::MissingField { index, field: "title" })?;
        let description = string_field(entry, "description").ok_or(LoadError::MissingField {
            index,
            field: "description",
        })?;

        let check_entries = entry
            .get("checks")
            .and_then(Value::as_sequence)
            .ok_or(LoadError::MissingField {
                index,
                field: "checks",
            })?;

        let mut checks = Vec::with_capacity(check_entries.len());
        for check_entry in check_entries {
            checks.push(self.parse_check(check_entry)?);
        }

        let form = match entry.get("form") {
            Some(value) => Some(self.parse_form(&name, value)?),
            None => None,
        };

        Ok(Task {
            name,
            title,
            description,
            checks,
            form,
        })
    }

    /// Parse one check entry.
    ///
    /// Two shapes are accepted: a bare string naming a zero-argument check,
    /// and a single-key mapping whose key is the check name and whose value
    /// is the named constructor arguments. Anything else is rejected.
    fn parse_check(&self, entry: &Value) -> Result<Box<dyn Check>, LoadError> {
        let (name, args) = match entry {
            Value::String(name) => (name.clone(), Value::Null),
            Value::Mapping(mapping) if mapping.len() == 1 => match mapping.iter().next() {
                Some((key, value)) => {
                    let name = key.as_str().ok_or_else(|| LoadError::InvalidCheckSpec {
                        detail: "check name must be a string".to_string(),
                    })?;
                    (name.to_string(), value.clone())
                }
                None => {
                    return Err(LoadError::InvalidCheckSpec {
                        detail: "empty check mapping".to_string(),
                    })
                }
            },
            other => {
                return Err(LoadError::InvalidCheckSpec {
                    detail: format!("{:?}", other),
                })
            }
        };

        let factory = self.registry.resolve(&name)?;
        factory(args).map_err(|source| LoadError::BuildFailure { name, source })
    }

    fn parse_form(&self, task: &str, value: &Value) -> Result<Form, LoadError> {
        let form: Form = serde_yaml::from_value(value.clone())?;
        for input in &form.inputs {
            if !self.input_types.contains(&input.input_type) {
                return Err(LoadError::Form {
                    task: task.to_string(),
                    source: waypoint_core::FormError::UnknownInputType(
                        input.input_type.clone(),
                    ),
                });
            }
        }
        Ok(form)
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_config(doc: &Value) -> Result<BTreeMap<String, String>, LoadError> {
    let Some(section) = doc.get("config") else {
        return Ok(BTreeMap::new());
    };
    let mapping = section.as_mapping().ok_or_else(|| {
        LoadError::InvalidDocument("`config` must be a mapping".to_string())
    })?;

    let mut config = BTreeMap::new();
    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| {
                LoadError::InvalidDocument("config keys must be strings".to_string())
            })?
            .to_string();
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(LoadError::InvalidDocument(format!(
                    "config value for `{}` must be a scalar",
                    key
                )))
            }
        };
        config.insert(key, value);
    }
    Ok(config)
}
