use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::info;
use rusqlite::{Connection, OpenFlags};

use crate::errors::{Result, StorageContext};

/// Locator of a private, in-memory database.
pub const IN_MEMORY_LOCATOR: &str = ":memory:";

///
/// Open connections keyed by locator. A connection is opened on first request and
/// stays open until [`close_connection`](Self::close_connection).
///
/// Databases are opened read-only; `:memory:` opens a fresh, writable in-memory
/// database.
///
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: HashMap<String, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        ConnectionManager::default()
    }

    pub fn get_connection(&mut self, locator: &str) -> Result<&Connection> {
        match self.connections.entry(locator.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let conn = open_connection(locator)?;
                info!("Opened database {}", locator);
                Ok(entry.insert(conn))
            }
        }
    }

    pub fn is_open(&self, locator: &str) -> bool {
        self.connections.contains_key(locator)
    }

    ///
    /// Close and forget the connection for `locator`. Does nothing if none is open.
    ///
    pub fn close_connection(&mut self, locator: &str) -> Result<()> {
        if let Some(conn) = self.connections.remove(locator) {
            conn.close()
                .map_err(|(_, e)| e)
                .storage("closing connection")?;
            info!("Closed database {}", locator);
        }
        Ok(())
    }
}

fn open_connection(locator: &str) -> Result<Connection> {
    match locator {
        IN_MEMORY_LOCATOR => Connection::open_in_memory().storage("opening in-memory database"),
        path => Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .storage("opening database"),
    }
}
