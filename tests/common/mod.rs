//! In-memory stand-in for a MariaDB server.
//!
//! Understands just enough SQL for the router tests: `USE`, `SHOW DATABASES`, `SHOW TABLES`,
//! `DESCRIBE`, `SELECT 1 AS x`, `SELECT DATABASE()`, plus two control statements:
//! `DO SLEEP(...)` parks until [`FakeServer::wake`] and `SELECT CRASH()` panics.
//! Anything else fails with a syntax error.

#![allow(dead_code)]

use mariadb_mcp_server::config::PoolOptions;
use mariadb_mcp_server::db::{ConnectionPool, ConnectionSource, SqlSession};
use mariadb_mcp_server::error::{DbError, DbResult};
use mariadb_mcp_server::tools::{SessionState, ToolRouter};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

struct ServerState {
    databases: Mutex<BTreeMap<String, Vec<String>>>,
    statements: Mutex<Vec<String>>,
    live: AtomicUsize,
    sleepers: AtomicUsize,
    wake: Semaphore,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            databases: Mutex::default(),
            statements: Mutex::default(),
            live: AtomicUsize::default(),
            sleepers: AtomicUsize::default(),
            wake: Semaphore::new(0),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<ServerState>,
}

impl FakeServer {
    /// A server with `shop` (users, orders) and `analytics` (events).
    pub fn new() -> Self {
        let server = Self::default();
        server.add_database("shop", &["users", "orders"]);
        server.add_database("analytics", &["events"]);
        server
    }

    pub fn add_database(&self, name: &str, tables: &[&str]) {
        self.state
            .databases
            .lock()
            .unwrap()
            .insert(name.to_string(), tables.iter().map(|t| t.to_string()).collect());
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }

    /// Connections currently checked out.
    pub fn live_connections(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Sessions parked in `DO SLEEP(...)`.
    pub fn sleepers(&self) -> usize {
        self.state.sleepers.load(Ordering::SeqCst)
    }

    /// Release `n` parked sessions.
    pub fn wake(&self, n: usize) {
        self.state.wake.add_permits(n);
    }

    pub fn pool(&self, options: PoolOptions) -> Arc<ConnectionPool<FakeServer>> {
        Arc::new(ConnectionPool::new(self.clone(), options))
    }

    pub fn router(&self, options: PoolOptions) -> ToolRouter<FakeServer> {
        ToolRouter::new(self.pool(options), SessionState::new(None))
    }
}

impl ConnectionSource for FakeServer {
    type Connection = FakeSession;

    async fn checkout(&self) -> DbResult<FakeSession> {
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            state: Arc::clone(&self.state),
            current: None,
        })
    }

    async fn close(&self) {}
}

pub struct FakeSession {
    state: Arc<ServerState>,
    current: Option<String>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn rows(key: &str, values: impl IntoIterator<Item = JsonValue>) -> JsonValue {
    JsonValue::Array(
        values
            .into_iter()
            .map(|v| {
                let mut row = Map::new();
                row.insert(key.to_string(), v);
                JsonValue::Object(row)
            })
            .collect(),
    )
}

impl FakeSession {
    fn use_database(&mut self, name: &str) -> DbResult<JsonValue> {
        if self.state.databases.lock().unwrap().contains_key(name) {
            self.current = Some(name.to_string());
            Ok(json!({ "affectedRows": 0, "insertId": 0 }))
        } else {
            Err(DbError::query(
                format!("Unknown database '{name}'"),
                Some("42000".into()),
            ))
        }
    }

    fn tables(&self) -> DbResult<Vec<String>> {
        let Some(db) = &self.current else {
            return Err(DbError::query("No database selected", Some("3D000".into())));
        };
        Ok(self
            .state
            .databases
            .lock()
            .unwrap()
            .get(db)
            .cloned()
            .unwrap_or_default())
    }

    fn describe(&self, table: &str) -> DbResult<JsonValue> {
        if !self.tables()?.iter().any(|t| t == table) {
            let db = self.current.as_deref().unwrap_or_default();
            return Err(DbError::query(
                format!("Table '{db}.{table}' doesn't exist"),
                Some("42S02".into()),
            ));
        }
        Ok(json!([
            {"Field": "id", "Type": "int(11)", "Null": "NO", "Key": "PRI", "Default": null, "Extra": "auto_increment"},
            {"Field": "name", "Type": "varchar(100)", "Null": "YES", "Key": "", "Default": null, "Extra": ""}
        ]))
    }
}

impl SqlSession for FakeSession {
    async fn run(&mut self, sql: &str) -> DbResult<JsonValue> {
        self.state.statements.lock().unwrap().push(sql.to_string());
        let trimmed = sql.trim();
        let upper = trimmed.to_ascii_uppercase();

        if let Some(name) = upper.strip_prefix("USE ").map(|_| trimmed[4..].trim()) {
            return self.use_database(name);
        }
        if let Some(table) = upper.strip_prefix("DESCRIBE ").map(|_| trimmed[9..].trim()) {
            return self.describe(table);
        }

        match upper.as_str() {
            "SHOW DATABASES" => {
                let names: Vec<_> = self
                    .state
                    .databases
                    .lock()
                    .unwrap()
                    .keys()
                    .map(|k| json!(k))
                    .collect();
                Ok(rows("Database", names))
            }
            "SHOW TABLES" => {
                let key = format!("Tables_in_{}", self.current.as_deref().unwrap_or_default());
                Ok(rows(&key, self.tables()?.into_iter().map(JsonValue::String)))
            }
            "SELECT 1 AS X" => Ok(json!([{ "x": 1 }])),
            "SELECT DATABASE()" => Ok(json!([{ "DATABASE()": self.current }])),
            "SELECT CRASH()" => panic!("engine crashed"),
            _ if upper.starts_with("DO SLEEP(") => {
                self.state.sleepers.fetch_add(1, Ordering::SeqCst);
                let permit = self.state.wake.acquire().await;
                self.state.sleepers.fetch_sub(1, Ordering::SeqCst);
                permit.map_err(|_| DbError::internal("server stopped"))?.forget();
                Ok(json!({ "affectedRows": 0, "insertId": 0 }))
            }
            _ => Err(DbError::query(
                format!(
                    "You have an error in your SQL syntax; check the manual near '{trimmed}' at line 1"
                ),
                Some("42000".into()),
            )),
        }
    }
}

pub fn pool_options(limit: u32, wait: bool) -> PoolOptions {
    PoolOptions {
        connection_limit: limit,
        wait_for_connections: wait,
        ..PoolOptions::default()
    }
}

/// Build an `arguments` object from a JSON literal.
pub fn args(value: JsonValue) -> Option<serde_json::Map<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}
