use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::alert_dispatcher::AlertDispatcher;
use crate::application::bootstrap::persistence::PersistenceHandle;
use crate::application::history_service::HistoryService;
use crate::application::position_tracker::PositionTracker;
use crate::application::quote_cache::QuoteCache;
use crate::application::trend_service::TrendService;
use crate::application::watch_pass::WatchPass;
use crate::config::Config;
use crate::domain::ports::{NotificationSink, QuoteProvider};
use crate::infrastructure::{LogNotificationSink, SmtpNotificationSink, YqlQuoteProvider};

pub struct ServicesHandle {
    pub history: Arc<HistoryService>,
    pub trends: Arc<TrendService>,
    pub quotes: Arc<QuoteCache>,
    pub tracker: Arc<PositionTracker>,
    pub dispatcher: Arc<AlertDispatcher>,
}

impl ServicesHandle {
    pub fn watch_pass(&self) -> WatchPass {
        WatchPass::new(
            self.history.clone(),
            self.trends.clone(),
            self.quotes.clone(),
            self.tracker.clone(),
            self.dispatcher.clone(),
        )
    }
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    /// Production wiring: the YQL provider and SMTP (or logging, on dry run).
    pub fn init(config: &Config, persistence: &PersistenceHandle) -> Result<ServicesHandle> {
        config.provider.validate()?;
        let provider: Arc<dyn QuoteProvider> = Arc::new(YqlQuoteProvider::new(&config.provider));

        let sink: Arc<dyn NotificationSink> = if config.mail.dry_run {
            info!("Dry run: alerts are logged, not mailed");
            Arc::new(LogNotificationSink)
        } else {
            info!(
                "Mailing alerts through {}:{}",
                config.mail.smtp_host, config.mail.smtp_port
            );
            Arc::new(SmtpNotificationSink::new(&config.mail))
        };

        Ok(Self::with_adapters(
            persistence,
            provider,
            sink,
            &config.mail.from_domain,
        ))
    }

    pub fn with_adapters(
        persistence: &PersistenceHandle,
        provider: Arc<dyn QuoteProvider>,
        sink: Arc<dyn NotificationSink>,
        from_domain: &str,
    ) -> ServicesHandle {
        let history = Arc::new(HistoryService::new(
            persistence.history_repository.clone(),
            persistence.position_repository.clone(),
            provider.clone(),
        ));
        let trends = Arc::new(TrendService::new(
            persistence.history_repository.clone(),
            persistence.trend_repository.clone(),
        ));
        let quotes = Arc::new(QuoteCache::new(
            persistence.quote_repository.clone(),
            provider,
        ));
        let tracker = Arc::new(PositionTracker::new(
            persistence.user_repository.clone(),
            persistence.position_repository.clone(),
            persistence.history_repository.clone(),
            persistence.trend_repository.clone(),
            persistence.quote_repository.clone(),
        ));
        let dispatcher = Arc::new(AlertDispatcher::new(
            persistence.position_repository.clone(),
            sink,
            from_domain,
        ));

        ServicesHandle {
            history,
            trends,
            quotes,
            tracker,
            dispatcher,
        }
    }
}
