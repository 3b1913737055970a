//! # Composition Configuration
//!
//! Named TOML files from a configs folder, merged left to right, then
//! `key=value` overrides, deserialised into `ComposeConfig`.
//!
//! ```toml
//! solve_steps_large = 300
//! abort_unsatisfied_large = true
//! restrict_parent_rooms = ["Kitchen"]
//! lights_off_chance = 0.0
//! ```
//!
//! Keys ending in `_chance` set stage run probabilities. Any other
//! unrecognised key is kept in `extra` and handed to the collaborators.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hearth_domain::{Semantics, TagSet};
use hearth_solver::Restrictions;

use crate::error::{ConfigError, ConfigResult};

/// Suffix of per-stage chance keys.
const CHANCE_SUFFIX: &str = "_chance";

/// Every recognised setting of one composition run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Search steps per floor assignment.
    pub solve_steps_large: usize,
    /// Search steps per wall, ceiling and side assignment.
    pub solve_steps_medium: usize,
    /// Search steps per stacked or supported assignment.
    pub solve_steps_small: usize,
    /// Fail `solve_large` on an unsatisfied assignment.
    pub abort_unsatisfied_large: bool,
    /// Fail `solve_medium` on an unsatisfied assignment.
    pub abort_unsatisfied_medium: bool,
    /// Fail `solve_small` on an unsatisfied assignment.
    pub abort_unsatisfied_small: bool,
    /// Furnish only one randomly chosen supported room type.
    pub restrict_single_supported_roomtype: bool,
    /// Furnish at most this many rooms.
    pub solve_max_rooms: Option<usize>,
    /// Decorate at most this many parent objects per room.
    pub solve_max_parent_obj: Option<usize>,
    /// Only furnish rooms carrying these semantic tags.
    pub restrict_parent_rooms: Option<Vec<String>>,
    /// Only decorate parent objects carrying these semantic tags.
    pub restrict_parent_objs: Option<Vec<String>>,
    /// Only keep placement rules whose name contains one of these.
    pub constraint_filters: Option<Vec<String>>,
    /// Place a focus bottle on a random table or surface.
    pub add_bottle: bool,
    /// Make the cameras follow the bottle.
    pub focus_on_bottle: bool,
    /// Replace the camera with a top-down view.
    pub topview: bool,
    /// Top view tilt, degrees.
    pub topview_rot_x: f64,
    /// Top view heading, degrees.
    pub topview_rot_z: f64,
    /// Wall opacity in the top view.
    pub alpha_walls: f64,
    /// Everything else, including `<stage>_chance` keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            solve_steps_large: 300,
            solve_steps_medium: 150,
            solve_steps_small: 50,
            abort_unsatisfied_large: false,
            abort_unsatisfied_medium: false,
            abort_unsatisfied_small: false,
            restrict_single_supported_roomtype: false,
            solve_max_rooms: None,
            solve_max_parent_obj: None,
            restrict_parent_rooms: None,
            restrict_parent_objs: None,
            constraint_filters: None,
            add_bottle: true,
            focus_on_bottle: true,
            topview: false,
            topview_rot_x: 0.0,
            topview_rot_z: 0.0,
            alpha_walls: 1.0,
            extra: BTreeMap::new(),
        }
    }
}

impl ComposeConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the text is not valid or values have the wrong type.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `names` from `configs_folder`, merged left to right, then
    /// applies `overrides`.
    ///
    /// A name is looked up as `<name>.toml` unless it already ends in `.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or malformed, an override is
    /// not `key=value`, or the merged values do not fit.
    pub fn load(configs_folder: &Path, names: &[String], overrides: &[String]) -> ConfigResult<Self> {
        let mut merged = toml::Table::new();
        for name in names {
            let path = config_path(configs_folder, name);
            let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let table: toml::Table = toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), keys = table.len(), "loaded config file");
            merge(&mut merged, table);
        }
        for text in overrides {
            let (key, value) = parse_override(text)?;
            debug!(key = %key, value = %value, "applying override");
            merged.insert(key, value);
        }

        let config: Self = toml::Value::Table(merged).try_into()?;
        info!(
            configs = names.len(),
            overrides = overrides.len(),
            passthrough = config.extra.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Stage run probabilities from `<stage>_chance` keys.
    #[must_use]
    pub fn stage_chances(&self) -> Vec<(String, f64)> {
        self.extra
            .iter()
            .filter_map(|(key, value)| {
                let stage = key.strip_suffix(CHANCE_SUFFIX)?;
                let chance = match value {
                    toml::Value::Float(f) => *f,
                    toml::Value::Integer(i) => *i as f64,
                    _ => return None,
                };
                Some((stage.to_string(), chance))
            })
            .collect()
    }

    /// Passthrough keys that are not stage chances.
    #[must_use]
    pub fn passthrough(&self) -> BTreeMap<String, toml::Value> {
        self.extra
            .iter()
            .filter(|(key, _)| !key.ends_with(CHANCE_SUFFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Solver restrictions named by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `Tag` if a restriction names an unknown semantic tag.
    pub fn restrictions(&self) -> ConfigResult<Restrictions> {
        Ok(Restrictions {
            parent_rooms: self.restrict_parent_rooms.as_deref().map(parse_tags).transpose()?,
            parent_objs: self.restrict_parent_objs.as_deref().map(parse_tags).transpose()?,
            max_rooms: self.solve_max_rooms,
            max_parent_objs: self.solve_max_parent_obj,
            placement_filters: self.constraint_filters.clone(),
        })
    }
}

fn config_path(folder: &Path, name: &str) -> PathBuf {
    if Path::new(name).extension().is_some_and(|e| e == "toml") {
        folder.join(name)
    } else {
        folder.join(format!("{name}.toml"))
    }
}

/// Merges `src` into `dst`; nested tables merge key by key.
fn merge(dst: &mut toml::Table, src: toml::Table) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(toml::Value::Table(d)), toml::Value::Table(s)) => merge(d, s),
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

/// Parses `key=value`. The value is read as a TOML value, or kept as a
/// string if it is not one (`restrict=Kitchen`).
///
/// # Errors
///
/// Returns `Override` if there is no `=` or the key is empty.
pub fn parse_override(text: &str) -> ConfigResult<(String, toml::Value)> {
    let (key, raw) = text
        .split_once('=')
        .ok_or_else(|| ConfigError::Override(text.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::Override(text.to_string()));
    }
    let raw = raw.trim();
    let value = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn parse_tags(names: &[String]) -> ConfigResult<TagSet> {
    let mut tags = TagSet::new();
    for name in names {
        let kind: Semantics = name.parse()?;
        tags = tags.with(kind);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComposeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ComposeConfig::default());
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let config = ComposeConfig::from_toml_str(
            "solve_steps_small = 7\nlights_off_chance = 0.25\nfancy_lamps = true\n",
        )
        .unwrap();
        assert_eq!(config.solve_steps_small, 7);
        assert_eq!(config.stage_chances(), vec![("lights_off".to_string(), 0.25)]);
        let passthrough = config.passthrough();
        assert_eq!(passthrough.len(), 1);
        assert_eq!(passthrough.get("fancy_lamps"), Some(&toml::Value::Boolean(true)));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("solve_steps_large=12").unwrap(),
            ("solve_steps_large".to_string(), toml::Value::Integer(12))
        );
        assert_eq!(
            parse_override("topview = true").unwrap().1,
            toml::Value::Boolean(true)
        );
        assert_eq!(
            parse_override("room=Kitchen").unwrap().1,
            toml::Value::String("Kitchen".to_string())
        );
        assert!(matches!(parse_override("novalue"), Err(ConfigError::Override(_))));
        assert!(matches!(parse_override("=3"), Err(ConfigError::Override(_))));
    }

    #[test]
    fn test_restrictions() {
        let config = ComposeConfig::from_toml_str(
            "restrict_parent_rooms = [\"kitchen\"]\nsolve_max_rooms = 2\n",
        )
        .unwrap();
        let r = config.restrictions().unwrap();
        assert_eq!(r.parent_rooms, Some(TagSet::of([Semantics::Kitchen])));
        assert_eq!(r.max_rooms, Some(2));
        assert_eq!(r.parent_objs, None);

        let bad = ComposeConfig::from_toml_str("restrict_parent_objs = [\"Spaceship\"]\n").unwrap();
        assert!(matches!(bad.restrictions(), Err(ConfigError::Tag(_))));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(ComposeConfig::from_toml_str("solve_steps_large = \"many\"\n").is_err());
    }
}
