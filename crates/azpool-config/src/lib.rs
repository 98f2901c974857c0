pub mod error;
pub mod model;

pub use error::*;
pub use model::*;

use std::path::{Path, PathBuf};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = "azconfig.json";

/// azpoolの設定ディレクトリを取得（無ければ作成）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("azpool");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 AZPOOL_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: azconfig.json
/// 3. ./.azpool/azconfig.json
/// 4. ~/.config/azpool/azconfig.json (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("AZPOOL_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    let path = current_dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(path);
    }

    // 3. ./.azpool/ ディレクトリ内
    let path = current_dir.join(".azpool").join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(path);
    }

    // 4. グローバル設定
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("azpool").join(CONFIG_FILE_NAME);
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// `path` の設定を読み込んで検証
pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// 設定を整形済みJSONとして `path` に書き出す
pub fn save(path: &Path, config: &Config) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content + "\n")?;
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if config.subscription_id.trim().is_empty() {
        return Err(ConfigError::MissingField("subscription_id"));
    }
    if config.location.trim().is_empty() {
        return Err(ConfigError::MissingField("location"));
    }
    Ok(())
}
