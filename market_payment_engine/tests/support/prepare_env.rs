use log::*;
use market_payment_engine::{
    events::EventProducers,
    MarketplaceDatabase,
    OrderApi,
    PaymentGatewayClient,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("market_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    db
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub async fn setup_with<G: PaymentGatewayClient>(gateway: G, producers: EventProducers) -> OrderApi<SqliteDatabase, G> {
    let db = new_test_db().await;
    OrderApi::new(db, gateway, producers)
}

pub async fn setup<G: PaymentGatewayClient>(gateway: G) -> OrderApi<SqliteDatabase, G> {
    setup_with(gateway, EventProducers::default()).await
}

pub async fn tear_down<G>(mut api: OrderApi<SqliteDatabase, G>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}
