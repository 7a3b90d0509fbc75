//! Shared fixtures for the backend integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use restock_backend::{
    config::{
        DatabaseConfig, JwtConfig, LineConfig, RestockConfig, ServerConfig, StorageBackend,
        StorageConfig,
    },
    services::notification::{LowStockNotice, NotifyError, ShortageNotice},
    services::Notifier,
    store::{MemoryStore, Stores},
    AppState, Config,
};
use shared::{NewStockItem, RequiredItem, SaveProfileInput};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

/// Notifier that keeps every batch it receives
#[derive(Default)]
pub struct RecordingNotifier {
    pub low_stock: Mutex<Vec<LowStockNotice>>,
    pub shortages: Mutex<Vec<ShortageNotice>>,
}

impl RecordingNotifier {
    pub fn low_stock_skus(&self) -> Vec<String> {
        self.low_stock.lock().unwrap().iter().map(|n| n.sku.clone()).collect()
    }

    pub fn shortage_skus(&self) -> Vec<String> {
        self.shortages.lock().unwrap().iter().map(|n| n.sku.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_low_stock(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        items: &[LowStockNotice],
    ) -> Result<(), NotifyError> {
        self.low_stock.lock().unwrap().extend_from_slice(items);
        Ok(())
    }

    async fn notify_shortage(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        items: &[ShortageNotice],
    ) -> Result<(), NotifyError> {
        self.shortages.lock().unwrap().extend_from_slice(items);
        Ok(())
    }
}

/// Notifier whose every delivery fails
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_low_stock(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        _items: &[LowStockNotice],
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("push quota exceeded".to_string()))
    }

    async fn notify_shortage(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        _items: &[ShortageNotice],
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection reset".to_string()))
    }
}

/// Notifier whose deliveries never complete
pub struct HangingNotifier;

#[async_trait]
impl Notifier for HangingNotifier {
    async fn notify_low_stock(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        _items: &[LowStockNotice],
    ) -> Result<(), NotifyError> {
        std::future::pending().await
    }

    async fn notify_shortage(
        &self,
        _owner_id: Uuid,
        _property_name: &str,
        _items: &[ShortageNotice],
    ) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

pub fn test_config(restock: RestockConfig) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 0,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        line: LineConfig::default(),
        restock,
    }
}

/// One owner scope over a fresh in-memory store
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
    pub policy: RestockConfig,
    pub owner_id: Uuid,
    pub user_id: Uuid,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RestockConfig::default())
    }

    pub fn with_policy(policy: RestockConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            test_config(policy),
            Stores::memory(store.clone()),
            notifier.clone(),
        );
        Self {
            store,
            notifier,
            state,
            policy,
            owner_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
    }

    /// Same store, owner and policy, different notifier
    pub fn with_notifier(&self, notifier: Arc<dyn Notifier>) -> AppState {
        AppState::new(
            test_config(self.policy),
            Stores::memory(self.store.clone()),
            notifier,
        )
    }

    pub async fn seed_item(&self, sku: &str, quantity: i64, alert_threshold: i64) {
        self.state
            .ledger
            .create_item(
                self.owner_id,
                NewStockItem {
                    sku: sku.to_string(),
                    name: format!("{} item", sku),
                    quantity,
                    target_level: quantity,
                    alert_threshold,
                    cost_per_unit: None,
                },
            )
            .await
            .unwrap();
    }

    pub async fn seed_property(&self, requirements: &[(&str, i64)]) -> Uuid {
        let property_id = Uuid::new_v4();
        self.state
            .properties
            .save_profile(
                self.owner_id,
                property_id,
                SaveProfileInput {
                    name: "Seaside Villa".to_string(),
                    requirements: requirements
                        .iter()
                        .map(|(sku, level)| RequiredItem::new(*sku, *level))
                        .collect(),
                },
            )
            .await
            .unwrap();
        property_id
    }

    pub async fn quantity(&self, sku: &str) -> i64 {
        self.state
            .ledger
            .require(self.owner_id, sku)
            .await
            .unwrap()
            .quantity
    }
}
