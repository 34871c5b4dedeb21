//! MongoDB handle plus the query helpers shared by the Mongo-backed stores.

use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::ClientOptions,
    Client, Collection,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

const APP_NAME: &str = "lingua-feed-server";
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Database {
    inner: mongodb::Database,
}

impl Database {
    /// Connects to the configured database and pings it once, so a bad URI
    /// fails at startup instead of on the first request.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let db = Self {
            inner: Client::with_options(options)?.database(&config.mongo_db_name),
        };
        db.health_check().await?;

        log::info!("Connected to MongoDB database '{}'", config.mongo_db_name);
        Ok(db)
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.inner.collection(name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.inner.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Single-row lookup. More than one match breaks the store contract and is
/// reported instead of silently picking one.
pub(crate) async fn find_unique<T>(
    collection: &Collection<T>,
    filter: Document,
    what: &str,
) -> AppResult<Option<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut rows: Vec<T> = collection.find(filter).limit(2).await?.try_collect().await?;
    if rows.len() > 1 {
        return Err(AppError::DatabaseError(format!(
            "store contract violation: more than one {} matched",
            what
        )));
    }
    Ok(rows.pop())
}
