use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use crate::store::CheckpointStore;
use crate::structs::checkpoint::{BlockType, Checkpoint};
use crate::utils::crc::parse_crc32;
use crate::utils::errors::StoreError;

const SELECT_CHECKPOINT: &str = "
    SELECT id, from_byte, from_bit, to_byte, block_type, crc32, len,
           header_len_bits, block_len_bits, data
    FROM HuffmanBlock
    WHERE id = ?1";

const SELECT_IDS: &str = "SELECT id FROM HuffmanBlock ORDER BY id";

/// Read-only view of a `HuffmanBlock` checkpoint table.
///
/// The producer stores the decompressed block length in `len`; the recorded
/// seed length is the length of the `data` blob itself. The connection is
/// closed when the store is dropped.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens an existing checkpoint database without write access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        log::debug!("Opening checkpoint database {}", path.as_ref().display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self { conn })
    }

    /// Wraps an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl CheckpointStore for SqliteStore {
    fn get(&self, id: i64) -> Result<Option<Checkpoint>, StoreError> {
        let row = self
            .conn
            .query_row(SELECT_CHECKPOINT, params![id], CheckpointRow::read)
            .optional()?;

        row.map(CheckpointRow::into_checkpoint).transpose()
    }

    fn ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_IDS)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }
}

struct CheckpointRow {
    id: i64,
    from_byte: i64,
    from_bit: i64,
    to_byte: Option<i64>,
    block_type: Option<String>,
    crc32: Option<String>,
    len: Option<i64>,
    header_len_bits: Option<i64>,
    block_len_bits: Option<i64>,
    data: Vec<u8>,
}

impl CheckpointRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            from_byte: row.get(1)?,
            from_bit: row.get(2)?,
            to_byte: row.get(3)?,
            block_type: row.get(4)?,
            crc32: row.get(5)?,
            len: row.get(6)?,
            header_len_bits: row.get(7)?,
            block_len_bits: row.get(8)?,
            data: row.get(9)?,
        })
    }

    fn into_checkpoint(self) -> Result<Checkpoint, StoreError> {
        let id = self.id;

        let invalid = |column: &'static str, value: String| StoreError::InvalidColumn {
            id,
            column,
            value,
        };
        let unsigned = |column: &'static str, value: i64| {
            u64::try_from(value).map_err(|_| invalid(column, value.to_string()))
        };
        let required = |column: &'static str, value: Option<i64>| {
            value.ok_or_else(|| invalid(column, "NULL".to_string()))
        };

        let from_bit = u8::try_from(self.from_bit)
            .map_err(|_| invalid("from_bit", self.from_bit.to_string()))?;
        let block_len_bits = unsigned("block_len_bits", required("block_len_bits", self.block_len_bits)?)?;
        let len_out = required("len", self.len)?;
        let len_out = usize::try_from(len_out).map_err(|_| invalid("len", len_out.to_string()))?;

        let block_type = match self.block_type {
            Some(text) => Some(text.parse::<BlockType>().map_err(|v| invalid("block_type", v))?),
            None => None,
        };
        let crc32 = match self.crc32 {
            Some(text) => Some(parse_crc32(&text).ok_or_else(|| invalid("crc32", text.clone()))?),
            None => None,
        };

        let mut checkpoint = Checkpoint::new(
            id,
            unsigned("from_byte", self.from_byte)?,
            from_bit,
            self.data,
            block_len_bits,
            len_out,
        );
        checkpoint.to_byte = self.to_byte.map(|v| unsigned("to_byte", v)).transpose()?;
        checkpoint.block_type = block_type;
        checkpoint.crc32 = crc32;
        checkpoint.header_len_bits = self
            .header_len_bits
            .map(|v| unsigned("header_len_bits", v))
            .transpose()?;

        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::extract::BlockExtractor;
    use crate::utils::crc::crc32;
    use crate::utils::deflate_writer::DeflateBitWriter;
    use crate::utils::errors::ExtractError;
    use std::io::Cursor;

    const SCHEMA: &str = "
        CREATE TABLE HuffmanBlock (
            id  INTEGER PRIMARY KEY AUTOINCREMENT,
            from_byte INTEGER NOT NULL,
            from_bit INTEGER NOT NULL,
            to_byte INTEGER NOT NULL,
            block_type TEXT NOT NULL,
            crc32 TEXT,
            len INTEGER,
            header_len_bits INTEGER,
            block_len_bits INTEGER,
            data BLOB NOT NULL
        )";

    #[allow(clippy::too_many_arguments)]
    fn insert(
        conn: &Connection,
        id: i64,
        from_byte: i64,
        from_bit: i64,
        to_byte: i64,
        crc32: Option<&str>,
        len: Option<i64>,
        block_len_bits: Option<i64>,
        data: &[u8],
    ) {
        conn.execute(
            "INSERT INTO HuffmanBlock
                (id, from_byte, from_bit, to_byte, block_type, crc32, len, header_len_bits, block_len_bits, data)
             VALUES (?1, ?2, ?3, ?4, 'fixed', ?5, ?6, 3, ?7, ?8)",
            params![id, from_byte, from_bit, to_byte, crc32, len, block_len_bits, data],
        )
        .unwrap();
    }

    fn store() -> (SqliteStore, Vec<u8>) {
        let mut w = DeflateBitWriter::new();
        w.fixed_block_header(false);
        w.literals(b"ABCD");
        w.end_of_block();
        w.fixed_block_header(true);
        w.literals(b"xy");
        w.copy(4, 4);
        w.end_of_block();
        let mut stream = w.finish();
        stream.extend_from_slice(&[0; 8]);

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let crc = format!("{:x}", crc32(b"xyCDxy"));
        insert(&conn, 1, 0, 0, 0, None, Some(4), Some(42), b"");
        insert(&conn, 2, 5, 2, 4, Some(&crc), Some(6), Some(38), b"ABCD");
        insert(&conn, 3, 10, 0, 10, None, None, None, b"xyCDxy");

        (SqliteStore::from_connection(conn), stream)
    }

    #[test]
    fn reads_producer_rows() {
        let (store, _) = store();

        let checkpoint = store.get(2).unwrap().unwrap();
        assert_eq!(checkpoint.from_byte, 5);
        assert_eq!(checkpoint.from_bit, 2);
        assert_eq!(checkpoint.to_byte, Some(4));
        assert_eq!(checkpoint.block_type, Some(BlockType::FixedHuffman));
        assert_eq!(checkpoint.crc32, Some(crc32(b"xyCDxy")));
        assert_eq!(checkpoint.header_len_bits, Some(3));
        assert_eq!(checkpoint.data, b"ABCD");
        assert_eq!(checkpoint.len, 4);
        assert_eq!(checkpoint.len_out, 6);
        assert_eq!(checkpoint.block_len_bits, 38);

        assert!(store.get(99).unwrap().is_none());
        assert_eq!(store.ids().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn unfinished_row_is_invalid() {
        let (store, _) = store();

        match store.get(3) {
            Err(StoreError::InvalidColumn { id, column, value }) => {
                assert_eq!(id, 3);
                assert_eq!(column, "block_len_bits");
                assert_eq!(value, "NULL");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn negative_offset_is_invalid() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        insert(&conn, 1, -4, 0, 0, None, Some(1), Some(8), b"");

        let store = SqliteStore::from_connection(conn);
        assert!(matches!(
            store.get(1),
            Err(StoreError::InvalidColumn {
                column: "from_byte",
                ..
            })
        ));
    }

    #[test]
    fn extracts_through_store() {
        let (store, stream) = store();
        let extractor = BlockExtractor::default();
        let mut source = Cursor::new(&stream);

        assert_eq!(extractor.extract_by_id(&store, &mut source, 1).unwrap(), b"ABCD");
        assert_eq!(extractor.extract_by_id(&store, &mut source, 2).unwrap(), b"xyCDxy");
        assert!(matches!(
            extractor.extract_by_id(&store, &mut source, 4),
            Err(ExtractError::CheckpointNotFound(4))
        ));
        assert!(matches!(
            extractor.extract_by_id(&store, &mut source, 3),
            Err(ExtractError::Store(StoreError::InvalidColumn { .. }))
        ));
    }

    #[test]
    fn missing_database() {
        let result = SqliteStore::open("/nonexistent/dir/checkpoints.sqlite");
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }
}
