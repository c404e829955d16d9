//! MySQL connection adapter.
//!
//! # Responsibility
//! - Open blocking MySQL connections from [`ConnectionConfig`].
//! - Copy driver rows into owned [`ResultRow`] values.
//!
//! # Invariants
//! - Driver errors always carry a code: the server's when it reported one,
//!   otherwise the matching client (`CR_*`) code.
//! - Escaping follows the session's `NO_BACKSLASH_ESCAPES` status.
//! - No result set or cursor outlives `query_rows`.

use super::config::ConnectionConfig;
use super::{DbError, DbResult, SqlConnection, SqlEscape};
use crate::model::row::{ResultRow, SqlValue};
use log::{error, info};
use mysql::prelude::Queryable;
use mysql::{Conn, DriverError, OptsBuilder, Row, Value};
use std::io::ErrorKind;
use std::time::Instant;

const CR_UNKNOWN_ERROR: u16 = 2000;
const CR_CONN_HOST_ERROR: u16 = 2003;
const CR_SERVER_LOST: u16 = 2013;
const CR_NET_PACKET_TOO_LARGE: u16 = 2020;
const CR_MALFORMED_PACKET: u16 = 2027;

/// Blocking MySQL connection owned by one executor.
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    /// Opens a connection with the given settings.
    ///
    /// # Errors
    /// - [`DbError::Connect`] carrying the server error code (for example
    ///   1045 for rejected credentials), or a client code such as 2003 when
    ///   the server cannot be reached.
    pub fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=db_connect module=db status=start host={} port={} database={}",
            config.host, config.port, config.database
        );

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.as_str()))
            .tcp_port(config.port)
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            .db_name(Some(config.database.as_str()));

        match Conn::new(opts) {
            Ok(conn) => {
                info!(
                    "event=db_connect module=db status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                let code = driver_error_code(&err);
                error!(
                    "event=db_connect module=db status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    code,
                    err
                );
                Err(DbError::Connect {
                    code: Some(code),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Wraps an already established driver connection.
    pub fn from_conn(conn: Conn) -> Self {
        Self { conn }
    }

    /// Underlying driver connection, e.g. to change the session charset.
    pub fn inner_mut(&mut self) -> &mut Conn {
        &mut self.conn
    }

    pub fn into_inner(self) -> Conn {
        self.conn
    }
}

impl SqlEscape for MysqlConnection {
    fn escape(&self, value: &str) -> String {
        escape_for_session(value, self.conn.no_backslash_escape())
    }
}

impl SqlConnection for MysqlConnection {
    fn query_rows(&mut self, sql: &str) -> DbResult<Vec<ResultRow>> {
        let rows: Vec<Row> = self.conn.query(sql).map_err(|err| DbError::Statement {
            code: Some(driver_error_code(&err)),
            message: err.to_string(),
        })?;

        Ok(rows.iter().map(convert_row).collect())
    }
}

/// Escapes `value` the way the driver quotes text literals for a session
/// with the given `NO_BACKSLASH_ESCAPES` status, minus the outer quotes.
fn escape_for_session(value: &str, no_backslash_escape: bool) -> String {
    let literal = Value::from(value).as_sql(no_backslash_escape);
    // UTF-8 text always renders as `'...'`.
    literal[1..literal.len() - 1].to_string()
}

/// Server error code, or the libmysqlclient `CR_*` code for failures the
/// client detected itself.
fn driver_error_code(err: &mysql::Error) -> u16 {
    match err {
        mysql::Error::MySqlError(server_err) => server_err.code,
        mysql::Error::DriverError(DriverError::ConnectTimeout)
        | mysql::Error::DriverError(DriverError::CouldNotConnect(_)) => CR_CONN_HOST_ERROR,
        mysql::Error::DriverError(DriverError::PacketTooLarge) => CR_NET_PACKET_TOO_LARGE,
        mysql::Error::DriverError(DriverError::PacketOutOfSync)
        | mysql::Error::DriverError(DriverError::UnexpectedPacket)
        | mysql::Error::CodecError(_) => CR_MALFORMED_PACKET,
        mysql::Error::IoError(io_err) => match io_err.kind() {
            ErrorKind::ConnectionRefused | ErrorKind::TimedOut => CR_CONN_HOST_ERROR,
            _ => CR_SERVER_LOST,
        },
        _ => CR_UNKNOWN_ERROR,
    }
}

fn convert_row(row: &Row) -> ResultRow {
    let columns = row.columns_ref();
    let mut converted = ResultRow::new();
    for (index, column) in columns.iter().enumerate() {
        let value = row.as_ref(index).map_or(SqlValue::Null, convert_value);
        converted.push(column.name_str().into_owned(), value);
    }
    converted
}

fn convert_value(value: &Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => SqlValue::from_bytes(bytes.clone()),
        Value::Int(value) => SqlValue::Int(*value),
        Value::UInt(value) => SqlValue::UInt(*value),
        Value::Float(value) => SqlValue::Float(f64::from(*value)),
        Value::Double(value) => SqlValue::Float(*value),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            );
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            SqlValue::Text(text)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut text = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            SqlValue::Text(text)
        }
    }
}
