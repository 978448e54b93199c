use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_FILE: &str = "places.json";
const DEFAULT_MEDIA_DIR: &str = "media";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Github,
    Local,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    pub repo: String,
    pub branch: String,
}

/// Process configuration, assembled once at startup and injected into the
/// backend. Business logic never reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub port: u16,
    /// Collection document path, relative to the store root.
    pub data_file: String,
    /// Store-relative directory ingested media is committed under.
    pub media_dir: String,
    /// Local backend root directory.
    pub data_dir: PathBuf,
    /// Remote backend settings; present iff `backend` is `Github`.
    pub github: Option<GithubConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = parse_backend(std::env::var("PLACES_BACKEND").ok().as_deref())?;

        let port = std::env::var("PLACES_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_file =
            std::env::var("PLACES_DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
        let media_dir =
            std::env::var("PLACES_MEDIA_DIR").unwrap_or_else(|_| DEFAULT_MEDIA_DIR.to_string());
        let data_dir = PathBuf::from(
            std::env::var("PLACES_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
        );

        let github = match backend {
            BackendKind::Github => Some(GithubConfig {
                token: require("GITHUB_TOKEN")?,
                repo: require("GITHUB_REPO")?,
                branch: std::env::var("GITHUB_BRANCH")
                    .unwrap_or_else(|_| DEFAULT_BRANCH.to_string()),
            }),
            BackendKind::Local => None,
        };

        Ok(Self {
            backend,
            port,
            data_file,
            media_dir,
            data_dir,
            github,
        })
    }
}

fn parse_backend(value: Option<&str>) -> anyhow::Result<BackendKind> {
    match value {
        Some("github") => Ok(BackendKind::Github),
        Some("local") | None => Ok(BackendKind::Local),
        Some(other) => anyhow::bail!("Unknown PLACES_BACKEND: {other}"),
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).unwrap_or_default();
    if value.is_empty() {
        anyhow::bail!("{name} must be set");
    }
    Ok(value)
}
