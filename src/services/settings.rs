use crate::domain::models::{ProxyIdentity, Tier};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Relay settings, read once at startup from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reportsdir: PathBuf,
    pub spooldir: PathBuf,
    pub failed_dir: PathBuf,
    pub corrupted_dir: PathBuf,
    pub foreman_url: String,
    /// Upload read timeout in seconds. Unset keeps the transport default.
    pub timeout: Option<u64>,
    pub registered_proxy_name: Option<String>,
    pub registered_proxy_url: Option<String>,
    /// Program plus leading arguments; the staged archive path is appended.
    pub decompress_command: Vec<String>,
    pub ssl_ca: Option<PathBuf>,
    pub ssl_certificate: Option<PathBuf>,
    pub ssl_private_key: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reportsdir: PathBuf::from("/var/lib/foreman-proxy/openscap/reports"),
            spooldir: PathBuf::from("/var/spool/foreman-proxy/openscap"),
            failed_dir: PathBuf::from("/var/lib/foreman-proxy/openscap/failed"),
            corrupted_dir: PathBuf::from("/var/lib/foreman-proxy/openscap/corrupted"),
            foreman_url: "https://localhost".to_string(),
            timeout: None,
            registered_proxy_name: None,
            registered_proxy_url: None,
            decompress_command: vec!["bunzip2".to_string(), "-dc".to_string()],
            ssl_ca: None,
            ssl_certificate: None,
            ssl_private_key: None,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn tier_dir(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Reports => &self.reportsdir,
            Tier::Spool => &self.spooldir,
            Tier::Failed => &self.failed_dir,
            Tier::Corrupted => &self.corrupted_dir,
        }
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn proxy_identity(&self) -> ProxyIdentity {
        ProxyIdentity {
            name: self.registered_proxy_name.clone(),
            url: self.registered_proxy_url.clone(),
        }
    }
}

pub fn default_settings_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config/scap-relay/settings.toml"))
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid settings file {}: {}", path.display(), e))?;
    if settings.decompress_command.is_empty() {
        anyhow::bail!(
            "invalid settings file {}: decompress_command must name a program",
            path.display()
        );
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::{load_settings, Settings};
    use crate::domain::models::Tier;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(settings.decompress_command, vec!["bunzip2", "-dc"]);
        assert_eq!(settings.upload_timeout(), None);
        assert_eq!(
            settings.tier_dir(Tier::Spool),
            Path::new("/var/spool/foreman-proxy/openscap")
        );
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        std::fs::write(
            &path,
            "foreman_url = \"https://foreman.example.com/prefix\"\n\
             timeout = 45\n\
             registered_proxy_name = \"proxy-1\"\n\
             corrupted_dir = \"/srv/corrupted\"\n",
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.foreman_url, "https://foreman.example.com/prefix");
        assert_eq!(settings.upload_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(settings.proxy_identity().name.as_deref(), Some("proxy-1"));
        assert_eq!(settings.proxy_identity().url, None);
        assert_eq!(settings.tier_dir(Tier::Corrupted), Path::new("/srv/corrupted"));
        assert_eq!(settings.reportsdir, Settings::default().reportsdir);
    }

    #[test]
    fn empty_decompress_command_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        std::fs::write(&path, "decompress_command = []\n").unwrap();
        assert!(load_settings(&path).is_err());
    }
}
