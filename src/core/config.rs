use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub imaging: ImagingConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Local filesystem layout for uploads
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Upload root, created if absent
    pub upload_dir: PathBuf,
    /// Name of the derivatives subdirectory inside the upload root
    pub derived_dir_name: String,
}

/// External image tool settings
#[derive(Debug, Clone)]
pub struct ImagingConfig {
    /// Command names probed in order at startup
    pub tool_candidates: Vec<String>,
    /// Upper bound on a single tool invocation
    pub tool_timeout: Duration,
    /// Thumbnails fit inside a square of this many pixels
    pub thumbnail_max_dimension: u32,
    /// Extension (without dot) of the web-friendly conversion
    pub web_format_extension: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            imaging: ImagingConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 100 * 1024 * 1024; // 100MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins =
            parse_list(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    const DEFAULT_UPLOAD_DIR: &'static str = "uploads";
    const DEFAULT_DERIVED_DIR_NAME: &'static str = "derived";

    pub fn from_env() -> Result<Self, String> {
        let upload_dir = env::var("UPLOAD_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_UPLOAD_DIR.to_string());

        let derived_dir_name = env::var("DERIVED_DIR_NAME")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_DERIVED_DIR_NAME.to_string());

        if derived_dir_name.contains(['/', '\\']) || derived_dir_name == ".." {
            return Err("DERIVED_DIR_NAME must be a single directory name".to_string());
        }

        Ok(Self {
            upload_dir: PathBuf::from(upload_dir),
            derived_dir_name,
        })
    }
}

impl ImagingConfig {
    const DEFAULT_TOOL_CANDIDATES: &'static str = "magick,convert";
    const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
    const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 800;
    const DEFAULT_WEB_FORMAT_EXTENSION: &'static str = "webp";

    pub fn from_env() -> Result<Self, String> {
        let tool_candidates = parse_list(
            &env::var("IMAGE_TOOL_CANDIDATES")
                .unwrap_or_else(|_| Self::DEFAULT_TOOL_CANDIDATES.to_string()),
        );

        let tool_timeout_secs = env::var("IMAGE_TOOL_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOOL_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "IMAGE_TOOL_TIMEOUT_SECS must be a valid number".to_string())?;

        let thumbnail_max_dimension = env::var("THUMBNAIL_MAX_DIMENSION")
            .unwrap_or_else(|_| Self::DEFAULT_THUMBNAIL_MAX_DIMENSION.to_string())
            .parse::<u32>()
            .map_err(|_| "THUMBNAIL_MAX_DIMENSION must be a valid number".to_string())?;

        if thumbnail_max_dimension == 0 {
            return Err("THUMBNAIL_MAX_DIMENSION must be greater than zero".to_string());
        }

        let web_format_extension = env::var("WEB_FORMAT_EXTENSION")
            .unwrap_or_else(|_| Self::DEFAULT_WEB_FORMAT_EXTENSION.to_string())
            .trim_start_matches('.')
            .to_lowercase();

        if web_format_extension.is_empty() {
            return Err("WEB_FORMAT_EXTENSION must not be empty".to_string());
        }

        Ok(Self {
            tool_candidates,
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            thumbnail_max_dimension,
            web_format_extension,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Phone Uploads API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Phone-tagged file uploads with image derivatives".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

/// Split a comma-separated value, dropping blank entries
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
