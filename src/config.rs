use clap::ArgAction::Set;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;

/// Main configuration structure that can be loaded from CLI or a config file
///
/// Example configuration file content
/// # Video Generation Configuration
///
/// # Server configuration
/// host = "0.0.0.0"
/// listen_on_port = 5000
/// workspace = "./data"
///
/// # Served asset, looked up as <workspace>/static/<sample_video>
/// sample_video = "sample.mp4"
/// download_name = "generated-video.mp4"
///
/// # Echo the cause of unexpected failures back to callers
/// expose_internal_errors = false
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to bind on
    #[arg(long, default_value = "0.0.0.0")]
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Working directory, the static folder is created under it
    #[arg(short = 'w', long, default_value = ".")]
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// File name of the pre-provisioned video inside the static folder
    #[arg(short, long, default_value = "sample.mp4")]
    #[serde(default = "default_sample_video")]
    pub sample_video: String,

    /// Attachment filename announced to clients
    #[arg(short, long, default_value = "generated-video.mp4")]
    #[serde(default = "default_download_name")]
    pub download_name: String,

    /// Return the underlying error message in 500 responses
    #[arg(long, default_value_t = true, action = Set)]
    #[serde(default = "default_expose_internal_errors")]
    pub expose_internal_errors: bool,

    /// Configuration file path (CLI arguments left at their defaults are taken from it)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            listen_on_port: default_port(),
            workspace: default_workspace(),
            sample_video: default_sample_video(),
            download_name: default_download_name(),
            expose_internal_errors: default_expose_internal_errors(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        // If CLI value is default, use file value
        if self.host == default_host() {
            self.host = file_config.host;
        }
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.workspace == default_workspace() {
            self.workspace = file_config.workspace;
        }
        if self.sample_video == default_sample_video() {
            self.sample_video = file_config.sample_video;
        }
        if self.download_name == default_download_name() {
            self.download_name = file_config.download_name;
        }
        if self.expose_internal_errors == default_expose_internal_errors() {
            self.expose_internal_errors = file_config.expose_internal_errors;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Host cannot be empty"));
        }

        if !is_plain_file_name(&self.sample_video) {
            return Err(anyhow::anyhow!(
                "Invalid sample video name '{}': must be a plain file name",
                self.sample_video
            ));
        }

        if !is_plain_file_name(&self.download_name) {
            return Err(anyhow::anyhow!(
                "Invalid download name '{}': must be a plain file name",
                self.download_name
            ));
        }

        match mime_guess::from_path(&self.download_name).first() {
            Some(mime) if mime.type_().as_str() == "video" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Download name '{}' must have a video file extension",
                    self.download_name
                ));
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.listen_on_port)
    }
}

/// A single path component, so it can't escape the static folder
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name() == Some(OsStr::new(name))
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_workspace() -> String {
    ".".to_string()
}

fn default_sample_video() -> String {
    "sample.mp4".to_string()
}

fn default_download_name() -> String {
    "generated-video.mp4".to_string()
}

fn default_expose_internal_errors() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_from_cli() {
        let cli_content = [
            "CLI",
            "--host",
            "127.0.0.1",
            "--listen-on-port",
            "8080",
            "--workspace",
            "/tmp/test",
            "--sample-video",
            "demo.mp4",
            "--expose-internal-errors",
            "false",
        ];

        let config = Config::try_parse_from(cli_content).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.listen_on_port, 8080);
        assert_eq!(config.workspace, "/tmp/test");
        assert_eq!(config.sample_video, "demo.mp4");
        assert_eq!(config.download_name, "generated-video.mp4");
        assert!(!config.expose_internal_errors);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_cli_defaults_match_serde_defaults() {
        let cli = Config::try_parse_from(["CLI"]).unwrap();
        let file: Config = toml::from_str("").unwrap();

        assert_eq!(cli.host, file.host);
        assert_eq!(cli.listen_on_port, file.listen_on_port);
        assert_eq!(cli.workspace, file.workspace);
        assert_eq!(cli.sample_video, file.sample_video);
        assert_eq!(cli.download_name, file.download_name);
        assert_eq!(cli.expose_internal_errors, file.expose_internal_errors);
        assert_eq!(cli.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            listen_on_port = 8080
            workspace = "/srv/video"
            download_name = "clip.webm"
            expose_internal_errors = false
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.listen_on_port, 8080);
        assert_eq!(config.workspace, "/srv/video");
        assert_eq!(config.download_name, "clip.webm");
        assert_eq!(config.sample_video, "sample.mp4");
        assert!(!config.expose_internal_errors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_merge_prefers_cli() {
        let file_config = Config {
            listen_on_port: 7000,
            workspace: "/from/file".to_string(),
            expose_internal_errors: false,
            ..Default::default()
        };

        let cli_config = Config {
            listen_on_port: 9000,
            ..Default::default()
        };

        let merged = cli_config.merge_with_file(file_config);

        assert_eq!(merged.listen_on_port, 9000); // CLI value takes precedence
        assert_eq!(merged.workspace, "/from/file"); // File value used when CLI is default
        assert!(!merged.expose_internal_errors);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_paths() {
        for name in ["", ".", "..", "../sample.mp4", "nested/sample.mp4"] {
            let config = Config {
                sample_video: name.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn test_validate_rejects_non_video_download_name() {
        for name in ["video.txt", "noextension", "archive.zip"] {
            let config = Config {
                download_name: name.to_string(),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("video file extension"), "{err}");
        }
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = Config {
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
