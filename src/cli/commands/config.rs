//! Config command: show resolved options and their sources.

use crate::cli::ConfigArgs;
use crate::config::{CliOverrides, ConfigSource, ResolvedConfig, load_config};
use crate::error::{PlotError, Result};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;

/// Execute the config command.
///
/// # Errors
///
/// Returns an error if the config file cannot be parsed or `--get` names an
/// unknown key.
pub fn execute(args: &ConfigArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let resolved = load_config(config_path, &CliOverrides::default())?;
    let values = flatten(&resolved)?;

    if let Some(key) = &args.get {
        let key = key.trim().to_lowercase().replace('_', "-");
        let value = values
            .get(&key)
            .ok_or_else(|| PlotError::Config(format!("unknown config key '{key}'")))?;
        if json {
            let mut single = serde_json::Map::new();
            single.insert(key.clone(), value.clone());
            println!("{}", serde_json::to_string_pretty(&Value::Object(single))?);
        } else {
            println!("{}", display_value(value));
        }
        return Ok(());
    }

    if json {
        let output = json!({
            "values": values,
            "sources": resolved.sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let width = values.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in &values {
        let source = resolved
            .sources
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default);
        println!("{key:<width$}  {:<24}  ({source})", display_value(value));
    }
    Ok(())
}

/// Resolved values as a flat `key -> value` map using config key spelling.
fn flatten(resolved: &ResolvedConfig) -> Result<BTreeMap<String, Value>> {
    let mut values = BTreeMap::new();

    let Value::Object(options) = serde_json::to_value(&resolved.options)? else {
        return Ok(values);
    };
    for (key, value) in options {
        values.insert(key.replace('_', "-"), value);
    }

    for factor in crate::model::Factor::ALL {
        values.insert(
            factor.as_str().to_string(),
            json!(resolved.factors.get(factor).join(",")),
        );
    }
    values.insert("rows".into(), json!(resolved.axes.rows));
    values.insert("cols".into(), json!(resolved.axes.cols));
    values.insert("figs".into(), json!(resolved.axes.figs));
    values.insert("layers".into(), json!(resolved.axes.layers));
    values.insert("data-dir".into(), json!(resolved.data_dir));
    values.insert("cache".into(), json!(resolved.cache_path));
    values.insert("out-dir".into(), json!(resolved.out_dir));
    values.insert("name".into(), json!(resolved.name));
    values.insert("format".into(), json!(resolved.format));
    Ok(values)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;

    #[test]
    fn flattened_keys_match_config_spelling() {
        let mut layer = ConfigLayer::default();
        layer.insert("best_of", "3");
        layer.insert("alg", "vbmc,bmc");
        let resolved = ResolvedConfig::from_layers(&[(ConfigSource::File, layer)]);
        let values = flatten(&resolved).unwrap();

        assert_eq!(values.get("best-of"), Some(&json!(3)));
        assert_eq!(values.get("alg"), Some(&json!("vbmc,bmc")));
        assert_eq!(values.get("rows"), Some(&json!("prob")));
        assert_eq!(values.get("figs"), Some(&Value::Null));
        assert!(values.contains_key("zero-floor"));
    }

    #[test]
    fn display_value_renders_missing_as_dash() {
        assert_eq!(display_value(&Value::Null), "-");
        assert_eq!(display_value(&json!("")), "-");
        assert_eq!(display_value(&json!("svg")), "svg");
        assert_eq!(display_value(&json!(0.25)), "0.25");
    }
}
