//! Classification of `sqlx` errors into transient and permanent failures.

/// SQLSTATE codes (outside class `08`) that indicate the server went away.
const SERVER_UNAVAILABLE_CODES: [&str; 3] = ["57P01", "57P02", "57P03"];

/// Returns true if the error signals a connectivity condition that may clear
/// up on retry.
pub fn is_transient_sqlx_error(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| is_connection_sqlstate(&code)),
        _ => false,
    }
}

fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || SERVER_UNAVAILABLE_CODES.contains(&code)
}
