//! MariaDB/MySQL driver binding.
//!
//! Wraps a lazily connecting `sqlx::MySqlPool` that is not bound to any database. Statements
//! run over the text protocol, so `USE`, `SHOW` and `DESCRIBE` work like they do in the
//! `mysql` command line client.

use crate::config::{Config, PoolOptions};
use crate::db::pool::{ConnectionSource, SqlSession};
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use futures_util::TryStreamExt;
use serde_json::{Map, Value as JsonValue, json};
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Either, MySqlPool};
use tracing::{debug, info};

/// Statements that produce a result set even when it is empty.
const ROW_RETURNING_KEYWORDS: &[&str] = &[
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "VALUES", "TABLE",
];

/// Build driver connect options from the server configuration. No database is selected.
pub fn connect_options(config: &Config) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .username(&config.db_user)
        .password(&config.db_pass)
        .charset("utf8mb4")
}

/// Connection source backed by a sqlx MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    /// Create the driver pool without opening any connection yet.
    ///
    /// Connections are opened on demand, up to `connection_limit`. The driver's own acquire
    /// timeout only bounds the network handshake: waiting for a free slot is governed by
    /// [`ConnectionPool`](crate::db::ConnectionPool).
    pub fn connect_lazy(connect: MySqlConnectOptions, options: &PoolOptions) -> Self {
        let pool = MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(options.connection_limit)
            .acquire_timeout(options.connect_timeout)
            .test_before_acquire(true)
            .connect_lazy_with(connect);
        info!(
            max_connections = options.connection_limit,
            "MySQL pool configured (lazy connect)"
        );
        Self { pool }
    }
}

impl ConnectionSource for MySqlSource {
    type Connection = MySqlSession;

    async fn checkout(&self) -> DbResult<MySqlSession> {
        let conn = self.pool.acquire().await.map_err(|e| {
            let suggestion = connection_suggestion(&e);
            let message = match &e {
                sqlx::Error::Database(db_err) => db_err.message().to_string(),
                other => other.to_string(),
            };
            DbError::connection(message, suggestion)
        })?;
        Ok(MySqlSession { conn })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// A connection borrowed from the sqlx pool. Dropping it returns it to the pool.
#[derive(Debug)]
pub struct MySqlSession {
    conn: PoolConnection<MySql>,
}

impl SqlSession for MySqlSession {
    async fn run(&mut self, sql: &str) -> DbResult<JsonValue> {
        debug!(sql = %sql, "Executing statement");

        let mut rows = Vec::new();
        let mut rows_affected = 0u64;
        let mut last_insert_id = 0u64;

        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *self.conn);
        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(done) => {
                    rows_affected += done.rows_affected();
                    if done.last_insert_id() != 0 {
                        last_insert_id = done.last_insert_id();
                    }
                }
                Either::Right(row) => rows.push(row.to_json_map()),
            }
        }

        Ok(statement_payload(sql, rows, rows_affected, last_insert_id))
    }
}

/// Shape the outcome of one statement.
///
/// Result sets become an array of row objects; anything else becomes a summary object.
pub fn statement_payload(
    sql: &str,
    rows: Vec<Map<String, JsonValue>>,
    rows_affected: u64,
    last_insert_id: u64,
) -> JsonValue {
    if !rows.is_empty() || returns_rows(sql) {
        return JsonValue::Array(rows.into_iter().map(JsonValue::Object).collect());
    }
    json!({
        "affectedRows": rows_affected,
        "insertId": last_insert_id,
    })
}

fn returns_rows(sql: &str) -> bool {
    let keyword: String = skip_leading_comments(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    ROW_RETURNING_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(&keyword))
}

/// Strip whitespace, opening parentheses and `/* */`, `--` and `#` comments before the first
/// keyword.
fn skip_leading_comments(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(body) = rest.strip_prefix("/*") {
            rest = body.split_once("*/").map_or("", |(_, after)| after);
        } else if rest.starts_with("--") || rest.starts_with('#') {
            rest = rest.split_once('\n').map_or("", |(_, after)| after);
        } else {
            return rest;
        }
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MariaDB/MySQL server is running and DB_HOST/DB_PORT are correct"
            .to_string();
    }

    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify DB_USER and DB_PASS".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    if matches!(error, sqlx::Error::PoolTimedOut) {
        return "The server did not answer in time; raise MCP_CONNECT_TIMEOUT or check the network"
            .to_string();
    }

    "Check network connectivity and database server status".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: JsonValue) -> Map<String, JsonValue> {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn test_rows_become_array() {
        let payload = statement_payload("SELECT 1 AS x", vec![row("x", json!(1))], 0, 0);
        assert_eq!(payload, json!([{ "x": 1 }]));
    }

    #[test]
    fn test_empty_select_is_empty_array() {
        let payload = statement_payload("  select * from t where 1 = 0", Vec::new(), 0, 0);
        assert_eq!(payload, json!([]));
    }

    #[test]
    fn test_parenthesized_select_returns_rows() {
        assert!(returns_rows("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_rows("show tables"));
        assert!(returns_rows("DESC users"));
    }

    #[test]
    fn test_leading_comments_are_skipped() {
        assert!(returns_rows("/* q */ SELECT * FROM t WHERE 0"));
        assert!(returns_rows("-- x\nSELECT 1"));
        assert!(returns_rows("# note\n  /* a */ /* b */ (SELECT 1)"));
        assert!(!returns_rows("/* q */ DELETE FROM t"));
        assert!(!returns_rows("/* unterminated SELECT"));
        let payload = statement_payload("/* q */ SELECT * FROM t WHERE 0", Vec::new(), 0, 0);
        assert_eq!(payload, json!([]));
    }

    #[test]
    fn test_rows_keep_column_order() {
        let mut row = Map::new();
        row.insert("name".to_string(), json!("widget"));
        row.insert("id".to_string(), json!(1));
        let payload = statement_payload("SELECT name, id FROM items", vec![row], 0, 0);
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(text, r#"[{"name":"widget","id":1}]"#);
    }

    #[test]
    fn test_write_becomes_summary() {
        let payload = statement_payload("INSERT INTO t VALUES (1)", Vec::new(), 1, 42);
        assert_eq!(payload, json!({ "affectedRows": 1, "insertId": 42 }));
    }

    #[test]
    fn test_use_becomes_summary() {
        assert!(!returns_rows("USE shop"));
        let payload = statement_payload("USE shop", Vec::new(), 0, 0);
        assert_eq!(payload["affectedRows"], 0);
    }

    #[test]
    fn test_connection_suggestion_for_closed_pool() {
        let suggestion = connection_suggestion(&sqlx::Error::PoolClosed);
        assert!(suggestion.contains("network"));
    }

    #[test]
    fn test_connect_options_use_config() {
        let config = Config {
            db_host: "db.internal".to_string(),
            db_port: 3307,
            ..Config::default()
        };
        let options = connect_options(&config);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_database(), None);
    }
}
