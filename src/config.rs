use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub game: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 管理员白名单 (Telegram user id)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

/// 游戏数值配置, 全部带默认值, 可在 config.toml 中按需覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// 手动搜索基础冷却 (秒), VIP 按倍率折减
    #[serde(default = "default_search_cooldown")]
    pub search_cooldown_secs: i64,
    /// 每日奖励冷却 (秒)
    #[serde(default = "default_bonus_cooldown")]
    pub bonus_cooldown_secs: i64,
    /// 社区投稿冷却 (秒)
    #[serde(default = "default_submission_cooldown")]
    pub submission_cooldown_secs: i64,
    /// 单次搜索金币掉落区间 (septims)
    #[serde(default = "default_reward_min")]
    pub search_reward_min: i64,
    #[serde(default = "default_reward_max")]
    pub search_reward_max: i64,
    /// 每日奖励基础金额 (septims)
    #[serde(default = "default_bonus_amount")]
    pub bonus_amount: i64,
    /// 自动搜索每 24h 基础次数上限
    #[serde(default = "default_autosearch_limit")]
    pub autosearch_base_limit: i64,
}

fn default_search_cooldown() -> i64 {
    300
}
fn default_bonus_cooldown() -> i64 {
    86_400
}
fn default_submission_cooldown() -> i64 {
    21_600
}
fn default_reward_min() -> i64 {
    10
}
fn default_reward_max() -> i64 {
    50
}
fn default_bonus_amount() -> i64 {
    100
}
fn default_autosearch_limit() -> i64 {
    30
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            search_cooldown_secs: default_search_cooldown(),
            bonus_cooldown_secs: default_bonus_cooldown(),
            submission_cooldown_secs: default_submission_cooldown(),
            search_reward_min: default_reward_min(),
            search_reward_max: default_reward_max(),
            bonus_amount: default_bonus_amount(),
            autosearch_base_limit: default_autosearch_limit(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件, 不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: get_env("DATABASE_URL")
                            .unwrap_or_else(|| "sqlite://edrink.db?mode=rwc".to_string()),
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    admin: AdminConfig {
                        user_ids: get_env("ADMIN_USER_IDS")
                            .map(|v| {
                                v.split(',')
                                    .filter_map(|s| s.trim().parse::<i64>().ok())
                                    .collect()
                            })
                            .unwrap_or_default(),
                    },
                    game: GameConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖 (即便文件存在时也覆盖)
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT") {
            if let Ok(p) = v.parse() {
                config.server.port = p;
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_defaults() {
        let game = GameConfig::default();
        assert_eq!(game.search_cooldown_secs, 300);
        assert_eq!(game.bonus_cooldown_secs, 86_400);
        assert_eq!(game.autosearch_base_limit, 30);
        assert!(game.search_reward_min <= game.search_reward_max);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [game]
            search_cooldown_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.game.search_cooldown_secs, 60);
        // 未覆盖的字段回落到默认值
        assert_eq!(cfg.game.bonus_cooldown_secs, 86_400);
        assert!(cfg.admin.user_ids.is_empty());
    }
}
