use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod currency;
mod db;
mod docs;
mod error;
mod mail;
mod model;
mod payroll;
mod provider;
mod routes;
mod store;
mod utils;

use crate::config::{Config, ExpenseSource};
use crate::currency::{CurrencyConverter, CurrencyService};
use crate::db::init_db;
use crate::docs::ApiDoc;
use crate::mail::{LogMailer, Mailer, RelayMailer};
use crate::payroll::{
    CommitProcessor, ExpenseAggregator, MailDispatcher, MailPolicy, PayrollCache, PayrollService,
    SettlementComposer,
};
use crate::provider::{BasecampProvider, ExpenseProvider, NocoDbProvider};
use crate::store::MySqlStore;

#[get("/")]
async fn index() -> impl Responder {
    "Payroll service"
}

fn build_service(config: &Config, store: Arc<MySqlStore>) -> PayrollService {
    let converter: Arc<dyn CurrencyConverter> = Arc::new(CurrencyService::new(
        config.currency_api_key.clone(),
        config.production,
    ));

    let provider: Arc<dyn ExpenseProvider> = match &config.expenses {
        ExpenseSource::Basecamp(cfg) => Arc::new(BasecampProvider::new(cfg.clone())),
        ExpenseSource::NocoDb(cfg) => Arc::new(NocoDbProvider::new(cfg.clone())),
    };
    info!(provider = %provider.kind(), "expense provider selected");

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => Arc::new(RelayMailer::new(url.clone())),
        None => Arc::new(LogMailer),
    };

    let cache = PayrollCache::new(store.clone());
    let composer = SettlementComposer::new(
        store.clone(),
        store.clone(),
        converter.clone(),
        ExpenseAggregator::new(provider.clone(), converter),
        config.fixed_payees.clone(),
        config.deadline,
    );
    let committer = CommitProcessor::new(
        store.clone(),
        provider,
        cache.clone(),
        MailDispatcher::new(mailer, config.mail_tick),
        MailPolicy {
            production: config.production,
            allowlist: config.mail_allowlist.clone(),
        },
        config.ledger_organization.clone(),
    );

    PayrollService::new(store, composer, cache, committer)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(production = config.production, "Server starting...");

    let pool = init_db(&config.database_url).await?;
    let service = Data::new(build_service(&config, Arc::new(MySqlStore::new(pool))));

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
