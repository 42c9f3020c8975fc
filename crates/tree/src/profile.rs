use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const BUILTIN_DEFAULT: &str = include_str!("../../../profiles/default.json");
const BUILTIN_GRIEVANCES: &str = include_str!("../../../profiles/grievances.json");

/// Per-screen field names for the two backend payload shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeProfile {
    name: String,
    description: Option<String>,
    nested: NestedKeys,
    flat: FlatFields,
}

/// Reserved keys of the nested-object shape. Every other key is a child category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedKeys {
    /// Holds this level's own record ids
    pub records_key: String,
    /// Present in payloads but never a category
    pub ignored_key: String,
}

/// Field names of the flat dot-path shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatFields {
    pub root_key: String,
    pub titles_field: String,
    pub counts_field: String,
    pub records_field: String,
}

impl Default for NestedKeys {
    fn default() -> Self {
        Self {
            records_key: "_records".to_string(),
            ignored_key: "_count".to_string(),
        }
    }
}

impl Default for FlatFields {
    fn default() -> Self {
        Self {
            root_key: "0".to_string(),
            titles_field: "words".to_string(),
            counts_field: "count".to_string(),
            records_field: "reg_nos".to_string(),
        }
    }
}

impl Default for TreeProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            description: None,
            nested: NestedKeys::default(),
            flat: FlatFields::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawProfile {
    #[serde(default)]
    schema_version: Option<u32>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    nested: Option<RawNestedKeys>,
    #[serde(default)]
    flat: Option<RawFlatFields>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawNestedKeys {
    records_key: Option<String>,
    ignored_key: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawFlatFields {
    root_key: Option<String>,
    titles_field: Option<String>,
    counts_field: Option<String>,
    records_field: Option<String>,
}

impl TreeProfile {
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "default" => Self::from_bytes("default", BUILTIN_DEFAULT.as_bytes(), None).ok(),
            "grievances" => Self::from_bytes(
                "grievances",
                BUILTIN_GRIEVANCES.as_bytes(),
                Some("default"),
            )
            .ok(),
            _ => None,
        }
    }

    /// Builtin profile name or a path to a JSON profile on disk.
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        if let Some(profile) = Self::builtin(name_or_path) {
            return Ok(profile);
        }
        let path = Path::new(name_or_path);
        if path.is_file() {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(name_or_path);
            return Self::from_file(name, path);
        }
        Err(anyhow!(
            "Unknown profile '{name_or_path}' (builtin: default, grievances)"
        ))
    }

    pub fn from_file(profile_name: &str, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read profile file {}", path.display()))?;
        let base = if profile_name == "default" {
            None
        } else {
            Some("default")
        };
        Self::from_bytes(profile_name, &bytes, base)
    }

    pub fn from_bytes(profile_name: &str, bytes: &[u8], base: Option<&str>) -> Result<Self> {
        let raw = parse_raw(bytes)
            .with_context(|| format!("Profile '{profile_name}' is not valid JSON configuration"))?;
        let merged = match base {
            Some(base_name) => merge_raw_profiles(builtin_raw(base_name)?, raw),
            None => raw,
        };
        Self::from_raw(merged, profile_name)
    }

    fn from_raw(raw: RawProfile, fallback_name: &str) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != 1 {
                return Err(anyhow!(
                    "profile.schema_version {schema_version} is not supported (expected 1)"
                ));
            }
        }

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_string());

        let defaults = NestedKeys::default();
        let raw_nested = raw.nested.unwrap_or_default();
        let nested = NestedKeys {
            records_key: non_empty("nested.records_key", raw_nested.records_key)?
                .unwrap_or(defaults.records_key),
            ignored_key: non_empty("nested.ignored_key", raw_nested.ignored_key)?
                .unwrap_or(defaults.ignored_key),
        };
        if nested.records_key == nested.ignored_key {
            return Err(anyhow!(
                "nested.records_key and nested.ignored_key must differ (both '{}')",
                nested.records_key
            ));
        }

        let defaults = FlatFields::default();
        let raw_flat = raw.flat.unwrap_or_default();
        let flat = FlatFields {
            root_key: non_empty("flat.root_key", raw_flat.root_key)?.unwrap_or(defaults.root_key),
            titles_field: non_empty("flat.titles_field", raw_flat.titles_field)?
                .unwrap_or(defaults.titles_field),
            counts_field: non_empty("flat.counts_field", raw_flat.counts_field)?
                .unwrap_or(defaults.counts_field),
            records_field: non_empty("flat.records_field", raw_flat.records_field)?
                .unwrap_or(defaults.records_field),
        };

        Ok(Self {
            name,
            description: raw.description,
            nested,
            flat,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn nested(&self) -> &NestedKeys {
        &self.nested
    }

    pub fn flat(&self) -> &FlatFields {
        &self.flat
    }
}

fn non_empty(field: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(anyhow!("{field} must not be empty")),
        other => Ok(other),
    }
}

fn builtin_raw(name: &str) -> Result<RawProfile> {
    match name {
        "default" => parse_raw(BUILTIN_DEFAULT.as_bytes()),
        other => Err(anyhow!("Base profile '{other}' not bundled")),
    }
}

fn merge_raw_profiles(base: RawProfile, overlay: RawProfile) -> RawProfile {
    let nested = match (base.nested, overlay.nested) {
        (Some(b), Some(o)) => Some(RawNestedKeys {
            records_key: o.records_key.or(b.records_key),
            ignored_key: o.ignored_key.or(b.ignored_key),
        }),
        (b, o) => o.or(b),
    };
    let flat = match (base.flat, overlay.flat) {
        (Some(b), Some(o)) => Some(RawFlatFields {
            root_key: o.root_key.or(b.root_key),
            titles_field: o.titles_field.or(b.titles_field),
            counts_field: o.counts_field.or(b.counts_field),
            records_field: o.records_field.or(b.records_field),
        }),
        (b, o) => o.or(b),
    };

    RawProfile {
        schema_version: overlay.schema_version.or(base.schema_version),
        // The selected profile key names the result unless the overlay sets one.
        name: overlay.name,
        description: overlay.description.or(base.description),
        nested,
        flat,
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawProfile> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| anyhow!("Profile is not valid JSON: {err}"))?;
    validate_profile_value(&value)?;
    serde_json::from_value(value).map_err(|err| anyhow!("Profile parse error: {err}"))
}

fn validate_profile_value(value: &serde_json::Value) -> Result<()> {
    fn validate_object_keys(
        unknown: &mut Vec<String>,
        obj: &serde_json::Map<String, serde_json::Value>,
        base: &str,
        allowed: &[&str],
    ) {
        for key in obj.keys() {
            if !allowed.contains(&key.as_str()) {
                if base.is_empty() {
                    unknown.push(key.clone());
                } else {
                    unknown.push(format!("{base}.{key}"));
                }
            }
        }
    }

    let serde_json::Value::Object(root) = value else {
        return Err(anyhow!("Profile config must be a JSON object"));
    };

    let mut unknown = Vec::new();
    validate_object_keys(
        &mut unknown,
        root,
        "",
        &["schema_version", "name", "description", "nested", "flat"],
    );
    if let Some(serde_json::Value::Object(nested)) = root.get("nested") {
        validate_object_keys(
            &mut unknown,
            nested,
            "nested",
            &["records_key", "ignored_key"],
        );
    }
    if let Some(serde_json::Value::Object(flat)) = root.get("flat") {
        validate_object_keys(
            &mut unknown,
            flat,
            "flat",
            &["root_key", "titles_field", "counts_field", "records_field"],
        );
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Unknown profile fields: {}", unknown.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_builtin_default() {
        let profile = TreeProfile::builtin("default").unwrap();
        assert_eq!(profile.name(), "default");
        assert_eq!(profile, TreeProfile::default_with_description(profile.description()));
    }

    #[test]
    fn grievances_overlays_default() {
        let profile = TreeProfile::builtin("grievances").unwrap();
        assert_eq!(profile.name(), "grievances");
        assert_eq!(profile.nested().records_key, "registration_no");
        assert_eq!(profile.flat().records_field, "registration_no");
        // inherited
        assert_eq!(profile.flat().titles_field, "words");
        assert_eq!(profile.flat().root_key, "0");
    }

    #[test]
    fn profile_rejects_unknown_fields_with_paths() {
        let bytes = br#"
        {
          "schema_version": 1,
          "nested": { "records_key": "ids", "oops": true },
          "flat": { "titles": "words" }
        }
        "#;
        let err = TreeProfile::from_bytes("custom", bytes, None).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("nested.oops"), "{msg}");
        assert!(msg.contains("flat.titles"), "{msg}");
    }

    #[test]
    fn profile_rejects_unsupported_schema_version() {
        let bytes = br#"{ "schema_version": 2 }"#;
        let err = TreeProfile::from_bytes("custom", bytes, None).unwrap_err();
        assert!(format!("{err:#}").contains("profile.schema_version"));
    }

    #[test]
    fn profile_rejects_clashing_reserved_keys() {
        let bytes = br#"{ "nested": { "records_key": "x", "ignored_key": "x" } }"#;
        assert!(TreeProfile::from_bytes("custom", bytes, None).is_err());
    }

    #[test]
    fn resolve_reads_profile_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("topics.json");
        fs::write(&path, r#"{ "flat": { "counts_field": "totals" } }"#).unwrap();

        let profile = TreeProfile::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(profile.name(), "topics");
        assert_eq!(profile.flat().counts_field, "totals");
        assert_eq!(profile.nested().records_key, "_records");
    }

    #[test]
    fn resolve_unknown_name_fails() {
        assert!(TreeProfile::resolve("no-such-profile").is_err());
    }

    impl TreeProfile {
        fn default_with_description(description: Option<&str>) -> Self {
            Self {
                description: description.map(str::to_string),
                ..Self::default()
            }
        }
    }
}
