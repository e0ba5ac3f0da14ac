//! Play and task values handed to callbacks by the playbook engine.
//!
//! These mirror the parts of the engine's objects the mailer reads. They are
//! plain data: the engine owns parsing, templating and variable precedence,
//! and hands the plugin already-resolved values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved variables, in definition order.
pub type Variables = IndexMap<String, serde_json::Value>;

/// Helper function for serde to check if Variables is empty
fn is_vars_empty(vars: &Variables) -> bool {
    vars.is_empty()
}

/// The play currently being executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Play {
    /// Name of the play
    pub name: String,

    /// Hosts targeted by the play
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Play variables as resolved by the engine
    #[serde(default, skip_serializing_if = "is_vars_empty")]
    pub vars: Variables,
}

impl Play {
    /// Creates a new play with the given name and no hosts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the target hosts.
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a play variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Returns a non-empty string variable.
    pub fn string_var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the administrator address from the `admin_email` variable.
    pub fn admin_email(&self) -> Option<&str> {
        self.string_var("admin_email")
    }

    /// Returns the report hostname from the `hostname` variable.
    pub fn hostname(&self) -> Option<&str> {
        self.string_var("hostname")
    }
}

/// A task (or handler) as seen by callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name
    #[serde(default)]
    pub name: String,

    /// Module the task invokes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Variable the task result is registered under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
}

impl Task {
    /// Creates a new task with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the module name.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the register name.
    pub fn with_register(mut self, register: impl Into<String>) -> Self {
        self.register = Some(register.into());
        self
    }

    /// Returns true if the task is registered under `name`.
    pub fn is_registered_as(&self, name: &str) -> bool {
        self.register.as_deref() == Some(name)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}", self.name)
        } else if let Some(action) = &self.action {
            write!(f, "{}", action)
        } else {
            write!(f, "unnamed task")
        }
    }
}
