use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DbConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
    #[serde(default)]
    pub app_env: Environment,
}

const fn default_max_connections() -> u32 {
    10
}

impl DbConfig {
    /// Read `DATABASE_URL`, `DB_MAX_CONNECTIONS` and `APP_ENV`, loading a
    /// `.env` file first when one exists.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
