use rusqlite::Connection;

use super::Migration;
use crate::error::Result;
use crate::storage::database::schema;

pub struct V2CodeLookup;

impl Migration for V2CodeLookup {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Index listings by the ASP's original product code"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        schema::create_code_lookup_indexes(conn)
    }
}
