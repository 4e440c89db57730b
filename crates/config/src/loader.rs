use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::YutaConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "yuta.yaml",
    "yuta.yml",
    "yuta.json",
    "yuta.toml",
    "config.yaml",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<YutaConfig> {
    let raw = read_with_env(path)?;
    parse_config(&raw, path)
}

/// Load the config file as an untyped JSON value, after env substitution.
///
/// Used by the validator to spot unknown keys that serde silently ignores.
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let raw = read_with_env(path)?;
    parse_config_value(&raw, path)
}

/// Resolve the config path and load it.
///
/// Search order:
/// 1. `explicit` (from `--config` or `YUTA_CONFIG`)
/// 2. `./yuta.{yaml,yml,json,toml}`, then `./config.yaml`
/// 3. `~/.config/yuta/` with the same names
pub fn discover_and_load(explicit: Option<&Path>) -> Result<(PathBuf, YutaConfig)> {
    let path = find_config_file(explicit)?;
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((path, config))
}

/// Find the config file to use, honouring an explicit path first.
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::NotFound {
            searched: path.display().to_string(),
        });
    }

    let mut searched = Vec::new();
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(dir) = config_dir() {
        dirs.push(dir);
    }

    for dir in dirs {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Ok(p);
            }
            searched.push(p.display().to_string());
        }
    }

    Err(Error::NotFound {
        searched: searched.join(", "),
    })
}

/// Returns the user-global config directory (`~/.config/yuta/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "yuta").map(|d| d.config_dir().to_path_buf())
}

fn read_with_env(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(substitute_env(&raw))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("yaml")
}

fn parse_config(raw: &str, path: &Path) -> Result<YutaConfig> {
    let shown = path.display();
    match extension(path) {
        "yaml" | "yml" => serde_yaml::from_str(raw).with_context(|| format!("parse {shown}")),
        "json" => serde_json::from_str(raw).with_context(|| format!("parse {shown}")),
        "toml" => toml::from_str(raw).with_context(|| format!("parse {shown}")),
        ext => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let shown = path.display();
    match extension(path) {
        "yaml" | "yml" => {
            let v: serde_yaml::Value =
                serde_yaml::from_str(raw).with_context(|| format!("parse {shown}"))?;
            serde_json::to_value(v).with_context(|| format!("convert {shown}"))
        },
        "json" => serde_json::from_str(raw).with_context(|| format!("parse {shown}")),
        "toml" => {
            let v: toml::Value = toml::from_str(raw).with_context(|| format!("parse {shown}"))?;
            serde_json::to_value(v).with_context(|| format!("convert {shown}"))
        },
        ext => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::ClientType, std::io::Write};

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "yuta.yaml",
            "clients:\n  - username: bot\n    homeserverurl: https://m.org\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.clients.len(), 1);
        assert_eq!(cfg.clients[0].client_type, ClientType::Matrix);
    }

    #[test]
    fn loads_json_and_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        let json = write_file(&dir, "a.json", r#"{"server": {"port": 1234}}"#);
        assert_eq!(load_config(&json).unwrap().server.port, 1234);

        let toml = write_file(&dir, "b.toml", "[server]\nport = 4321\n");
        assert_eq!(load_config(&toml).unwrap().server.port, 4321);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "yuta.ini", "x=1");
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn invalid_yaml_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.yaml", "clients: [unclosed");
        let err = load_config(&path).unwrap_err().to_string();
        assert!(err.contains("broken.yaml"), "{err}");
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = find_config_file(Some(Path::new("/nonexistent/yuta.yaml"))).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "custom.yaml", "clients: []");
        let (found, _) = discover_and_load(Some(&path)).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn value_loader_keeps_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "yuta.yaml", "serverr:\n  port: 1\n");
        let value = load_config_value(&path).unwrap();
        assert!(value.get("serverr").is_some());
    }
}
