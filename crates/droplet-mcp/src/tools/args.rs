//! Typed access to a tool call's dynamic argument map.
//!
//! Absent keys and explicit `null` are treated alike for optional
//! arguments. A present value of the wrong JSON type is reported as
//! [`ToolError::InvalidArgument`] instead of being silently dropped.

use super::dispatch::ToolError;
use crate::api::types::{BackupPolicyRequest, DropletCreateSshKey, ListOptions};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wraps a JSON value; anything but an object yields an empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Whether `name` is present as a key, whatever its value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    fn invalid(name: &str, expected: &str) -> ToolError {
        ToolError::InvalidArgument {
            name: name.to_string(),
            expected: expected.to_string(),
        }
    }

    fn missing(name: &str) -> ToolError {
        ToolError::MissingArgument(name.to_string())
    }

    // ── Scalars ─────────────────────────────────────────────────────

    pub fn opt_string(&self, name: &str) -> Result<Option<String>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(Self::invalid(name, "string")),
        }
    }

    pub fn string(&self, name: &str) -> Result<String, ToolError> {
        self.opt_string(name)?.ok_or_else(|| Self::missing(name))
    }

    pub fn opt_number(&self, name: &str) -> Result<Option<f64>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| Self::invalid(name, "number")),
        }
    }

    /// Numeric identifier; fractional parts are truncated.
    pub fn id(&self, name: &str) -> Result<i64, ToolError> {
        self.opt_number(name)?
            .map(|n| n as i64)
            .ok_or_else(|| Self::missing(name))
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| Self::invalid(name, "boolean")),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, ToolError> {
        Ok(self.opt_bool(name)?.unwrap_or(default))
    }

    // ── Lists ───────────────────────────────────────────────────────

    fn array(&self, name: &str) -> Result<Option<&Vec<Value>>, ToolError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(Self::invalid(name, "array")),
        }
    }

    /// Array whose entries must all be strings; empty strings are skipped.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ToolError> {
        let Some(items) = self.array(name)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) if s.is_empty() => {}
                Value::String(s) => out.push(s.clone()),
                _ => return Err(Self::invalid(name, "array of strings")),
            }
        }
        Ok(out)
    }

    /// Numbers become key IDs, non-empty strings fingerprints; anything
    /// else in the array is ignored.
    pub fn ssh_keys(&self, name: &str) -> Result<Vec<DropletCreateSshKey>, ToolError> {
        let Some(items) = self.array(name)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_f64().map(|f| DropletCreateSshKey::Id(f as i64)),
                Value::String(s) if !s.is_empty() => {
                    Some(DropletCreateSshKey::Fingerprint(s.clone()))
                }
                _ => None,
            })
            .collect())
    }

    /// Non-empty string entries; other entries are ignored.
    pub fn tags(&self, name: &str) -> Result<Vec<String>, ToolError> {
        let Some(items) = self.array(name)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    // ── Structured ──────────────────────────────────────────────────

    /// Parses a JSON-encoded backup policy string. An empty string counts
    /// as absent.
    pub fn backup_policy(&self, name: &str) -> Result<Option<BackupPolicyRequest>, ToolError> {
        match self.opt_string(name)? {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| ToolError::InvalidJson {
                    what: "backup policy",
                    reason: e.to_string(),
                }),
        }
    }

    /// `Page` / `PerPage`, falling back to the defaults when absent or
    /// not numeric.
    pub fn list_options(&self) -> ListOptions {
        let defaults = ListOptions::default();
        let read = |name: &str, fallback: i64| {
            self.get(name)
                .and_then(Value::as_f64)
                .map(|n| n as i64)
                .filter(|n| *n > 0)
                .unwrap_or(fallback)
        };
        ListOptions::new(
            read("Page", defaults.page),
            read("PerPage", defaults.per_page),
        )
    }
}

impl From<Option<Map<String, Value>>> for Arguments {
    fn from(map: Option<Map<String, Value>>) -> Self {
        Self(map.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Arguments {
        Arguments::from_value(v)
    }

    #[test]
    fn string_accessors() {
        let a = args(json!({"Name": "web", "Bad": 3, "Null": null}));
        assert_eq!(a.string("Name").unwrap(), "web");
        assert_eq!(a.opt_string("Missing").unwrap(), None);
        assert_eq!(a.opt_string("Null").unwrap(), None);
        assert!(matches!(
            a.string("Bad"),
            Err(ToolError::InvalidArgument { .. })
        ));
        assert!(matches!(
            a.string("Missing"),
            Err(ToolError::MissingArgument(_))
        ));
    }

    #[test]
    fn id_truncates_fraction() {
        let a = args(json!({"ID": 123.9, "Neg": -4.5}));
        assert_eq!(a.id("ID").unwrap(), 123);
        assert_eq!(a.id("Neg").unwrap(), -4);
    }

    #[test]
    fn id_rejects_strings() {
        let a = args(json!({"ID": "123"}));
        let err = a.id("ID").unwrap_err();
        assert_eq!(err.to_string(), "invalid argument ID: expected number");
    }

    #[test]
    fn bool_defaults() {
        let a = args(json!({"Backup": true, "IPv6": "yes"}));
        assert!(a.bool_or("Backup", false).unwrap());
        assert!(!a.bool_or("Monitoring", false).unwrap());
        assert!(a.bool_or("IPv6", false).is_err());
    }

    #[test]
    fn ssh_keys_mixed_entries() {
        let a = args(json!({"SSHKeys": [12345, "aa:bb:cc", "", true, null, 7.8]}));
        assert_eq!(
            a.ssh_keys("SSHKeys").unwrap(),
            vec![
                DropletCreateSshKey::Id(12345),
                DropletCreateSshKey::Fingerprint("aa:bb:cc".to_string()),
                DropletCreateSshKey::Id(7),
            ]
        );
        assert!(a.ssh_keys("Missing").unwrap().is_empty());
    }

    #[test]
    fn tags_skip_non_strings() {
        let a = args(json!({"Tags": ["web", 1, "", "prod"]}));
        assert_eq!(a.tags("Tags").unwrap(), vec!["web", "prod"]);
    }

    #[test]
    fn tags_must_be_array() {
        let a = args(json!({"Tags": "web"}));
        assert!(a.tags("Tags").is_err());
    }

    #[test]
    fn string_list_is_strict() {
        let a = args(json!({"Names": ["a", "", "b"], "Mixed": ["a", 1]}));
        assert_eq!(a.string_list("Names").unwrap(), vec!["a", "b"]);
        let err = a.string_list("Mixed").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument Mixed: expected array of strings"
        );
        assert!(a.string_list("Missing").unwrap().is_empty());
    }

    #[test]
    fn backup_policy_parses_json() {
        let a = args(json!({"BackupPolicy": r#"{"plan":"weekly","weekday":"SUN","hour":4}"#}));
        let policy = a.backup_policy("BackupPolicy").unwrap().unwrap();
        assert_eq!(policy.plan.as_deref(), Some("weekly"));
        assert_eq!(policy.hour, Some(4));
    }

    #[test]
    fn backup_policy_rejects_malformed_json() {
        let a = args(json!({"BackupPolicy": "{not json"}));
        let err = a.backup_policy("BackupPolicy").unwrap_err();
        assert!(err.to_string().starts_with("invalid backup policy json: "));
    }

    #[test]
    fn backup_policy_empty_is_absent() {
        let a = args(json!({"BackupPolicy": ""}));
        assert_eq!(a.backup_policy("BackupPolicy").unwrap(), None);
        assert_eq!(args(json!({})).backup_policy("BackupPolicy").unwrap(), None);
    }

    #[test]
    fn list_options_defaults_match_explicit() {
        let implicit = args(json!({})).list_options();
        let explicit = args(json!({"Page": 1, "PerPage": 50})).list_options();
        assert_eq!(implicit, explicit);
        assert_eq!(implicit, ListOptions::default());
    }

    #[test]
    fn list_options_lenient_on_bad_values() {
        let opts = args(json!({"Page": "two", "PerPage": 0})).list_options();
        assert_eq!(opts, ListOptions::default());
        let opts = args(json!({"Page": 3.0, "PerPage": 10})).list_options();
        assert_eq!(opts, ListOptions::new(3, 10));
    }

    #[test]
    fn non_object_value_is_empty() {
        assert_eq!(Arguments::from_value(json!([1, 2])), Arguments::default());
        assert_eq!(Arguments::from(None), Arguments::default());
    }
}
