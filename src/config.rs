use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub static_dir: PathBuf,
    pub max_upload_size: usize,
    /// `requiresAuth` of the admin layout routes.
    pub require_auth: bool,
    pub session_idle: Duration,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    Memory,
    Firebase(FirebaseConfig),
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: String,
    pub storage_bucket: String,
    pub identity_url: String,
    pub token_url: String,
    pub firestore_url: String,
    pub storage_url: String,
    /// Emulators accept the `owner` bearer token and do not need a signed-in user.
    pub emulated: bool,
}

impl FirebaseConfig {
    /// Production endpoints for the given project.
    pub fn new(api_key: &str, project_id: &str) -> Self {
        FirebaseConfig {
            api_key: api_key.to_string(),
            project_id: project_id.to_string(),
            auth_domain: format!("{project_id}.firebaseapp.com"),
            storage_bucket: format!("{project_id}.appspot.com"),
            identity_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            token_url: "https://securetoken.googleapis.com/v1".to_string(),
            firestore_url: "https://firestore.googleapis.com/v1".to_string(),
            storage_url: "https://firebasestorage.googleapis.com/v0".to_string(),
            emulated: false,
        }
    }

    fn from_env() -> Result<Self, String> {
        let api_key = env_required("FIREBASE_API_KEY")?;
        let project_id = env_required("FIREBASE_PROJECT_ID")?;

        let mut config = FirebaseConfig::new(&api_key, &project_id);
        config.auth_domain = env_or("FIREBASE_AUTH_DOMAIN", &config.auth_domain);
        config.storage_bucket = env_or("FIREBASE_STORAGE_BUCKET", &config.storage_bucket);

        if let Ok(host) = std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            config.identity_url = format!("http://{host}/identitytoolkit.googleapis.com/v1");
            config.token_url = format!("http://{host}/securetoken.googleapis.com/v1");
            config.emulated = true;
        }
        if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
            config.firestore_url = format!("http://{host}/v1");
            config.emulated = true;
        }
        if let Ok(host) = std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            config.storage_url = format!("http://{host}/v0");
            config.emulated = true;
        }

        Ok(config)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("REALTY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid REALTY_HOST: {e}"))?;

        let port: u16 = env_or("REALTY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid REALTY_PORT: {e}"))?;

        let log_level = env_or("REALTY_LOG_LEVEL", "info");
        let static_dir = PathBuf::from(env_or("REALTY_STATIC_DIR", "dist"));

        let max_upload_size: usize = env_or("REALTY_MAX_UPLOAD_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid REALTY_MAX_UPLOAD_SIZE: {e}"))?;

        let require_auth = parse_bool("REALTY_REQUIRE_AUTH", &env_or("REALTY_REQUIRE_AUTH", "false"))?;

        let idle_secs: u64 = env_or("REALTY_SESSION_IDLE_SECS", "43200")
            .parse()
            .map_err(|e| format!("Invalid REALTY_SESSION_IDLE_SECS: {e}"))?;

        let backend = match env_or("REALTY_BACKEND", "firebase").as_str() {
            "firebase" => BackendConfig::Firebase(FirebaseConfig::from_env()?),
            "memory" => BackendConfig::Memory,
            other => return Err(format!("Invalid REALTY_BACKEND: {other}")),
        };

        Ok(Config {
            host,
            port,
            log_level,
            static_dir,
            max_upload_size,
            require_auth,
            session_idle: Duration::from_secs(idle_secs),
            backend,
        })
    }

    /// In-memory configuration used by tests and local demos.
    pub fn memory() -> Self {
        Config {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            log_level: "warn".to_string(),
            static_dir: PathBuf::from("dist"),
            max_upload_size: 10 * 1024 * 1024,
            require_auth: false,
            session_idle: Duration::from_secs(43200),
            backend: BackendConfig::Memory,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid {key}: {other}")),
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
