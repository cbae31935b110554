//! Shared fixtures for auth service integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use saidso_auth::AuthConfig;
use saidso_core::SaidsoResult;
use saidso_core::ports::{Notification, Notifier};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub async fn setup_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    saidso_db::run_migrations(&db).await.unwrap();
    db
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        frontend_base_url: "http://localhost:5173".into(),
        ..Default::default()
    }
}

/// Notifier double that records every dispatched message.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, Notification)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, notification: Notification) -> SaidsoResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), notification));
        Ok(())
    }
}

/// Notifier double that always fails, for upstream-error paths.
#[derive(Clone, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send(&self, _to: &str, _notification: Notification) -> SaidsoResult<()> {
        Err(saidso_core::SaidsoError::Upstream {
            service: "mailer".into(),
            message: "delivery refused".into(),
        })
    }
}
