use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Bodies above this size are not read; accessors report `TooLarge`.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_max_head_bytes")]
    pub max_head_bytes: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_head_bytes() -> usize {
    64 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_bytes: default_max_body_bytes(),
            max_head_bytes: default_max_head_bytes(),
        }
    }
}

impl Config {
    /// Loads `FETCHLET_CONFIG` (YAML) if set, then applies the `LISTEN`
    /// override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("FETCHLET_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("parsing config file {path}"))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Replaces the port of `listen_addr`, keeping its host.
    pub fn with_port(mut self, port: u16) -> Self {
        let host = self
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.listen_addr = format!("{host}:{port}");
        self
    }
}
