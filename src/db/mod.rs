//! MongoDB handle for the attempt history store.

use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

const SERVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Client scoped to the configured database. Clones share the pool.
#[derive(Clone)]
pub struct Database {
    database: mongodb::Database,
}

impl Database {
    /// Fails fast when the server cannot be reached, so a misconfigured
    /// connection string is reported at startup.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::with_options(client_options(config).await?)?;
        let db = Self {
            database: client.database(&config.mongo_db_name),
        };

        db.ping().await?;
        log::info!(
            "Connected to MongoDB, using database '{}'",
            config.mongo_db_name
        );
        Ok(db)
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database.collection(name)
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

async fn client_options(config: &Config) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;

    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    // Submissions are the only writes; history reads are occasional.
    options.max_pool_size = Some(4);
    options.min_pool_size = Some(1);
    options.connect_timeout = Some(SERVER_TIMEOUT);
    options.server_selection_timeout = Some(SERVER_TIMEOUT);
    Ok(options)
}
