use crate::loader::{read_csv, Record};
use crate::schema::{TableSchema, MOVIES, RATINGS};
use crate::transform::runtime_update_sql;
use anyhow::{anyhow, Context, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Params};
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// One result row: column name → value
pub type Row = Map<String, Value>;

/// Keys a new-movie submission must carry, in insert order
pub const NEW_MOVIE_KEYS: [&str; 5] = [
    "tconst",
    "titleType",
    "primaryTitle",
    "runtimeMinutes",
    "genres",
];

pub const LONGEST_DURATION_LIMIT: i64 = 10;
pub const TOP_RATED_THRESHOLD: f64 = 6.0;

// ============================================================================
// CANNED QUERIES
// ============================================================================

const LONGEST_DURATION_SQL: &str = "
    SELECT tconst, primaryTitle, runtimeMinutes, genres
    FROM movies
    ORDER BY runtimeMinutes DESC, tconst ASC
    LIMIT ?1";

const TOP_RATED_SQL: &str = "
    SELECT m.tconst, m.primaryTitle, m.genres, r.averageRating
    FROM movies AS m
    JOIN ratings AS r ON m.tconst = r.tconst
    WHERE r.averageRating > ?1
    ORDER BY r.averageRating ASC, m.tconst ASC";

const GENRE_SUBTOTALS_SQL: &str = "
    SELECT m.genres, m.primaryTitle, SUM(r.numVotes) AS numVotes
    FROM movies AS m
    JOIN ratings AS r ON m.tconst = r.tconst
    GROUP BY m.genres, m.primaryTitle
    ORDER BY m.genres ASC, m.primaryTitle ASC";

const INSERT_MOVIE_SQL: &str = "
    INSERT INTO movies (tconst, titleType, primaryTitle, runtimeMinutes, genres)
    VALUES (?1, ?2, ?3, ?4, ?5)";

// ============================================================================
// NEW MOVIE
// ============================================================================

/// A submitted movie row. Values are kept as the client sent them; only key
/// presence is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub tconst: Value,
    pub title_type: Value,
    pub primary_title: Value,
    pub runtime_minutes: Value,
    pub genres: Value,
}

impl NewMovie {
    /// Returns `None` unless `body` is an object holding every key in
    /// [`NEW_MOVIE_KEYS`]. Null values count as present; extra keys are ignored.
    pub fn from_json(body: &Value) -> Option<NewMovie> {
        let object = body.as_object()?;
        let [tconst, title_type, primary_title, runtime_minutes, genres] =
            NEW_MOVIE_KEYS.map(|key| object.get(key).cloned());

        Some(NewMovie {
            tconst: tconst?,
            title_type: title_type?,
            primary_title: primary_title?,
            runtime_minutes: runtime_minutes?,
            genres: genres?,
        })
    }

    fn sql_values(&self) -> [SqlValue; 5] {
        [
            json_to_sql(&self.tconst),
            json_to_sql(&self.title_type),
            json_to_sql(&self.primary_title),
            json_to_sql(&self.runtime_minutes),
            json_to_sql(&self.genres),
        ]
    }
}

// ============================================================================
// VALUE CONVERSION
// ============================================================================

/// JSON → SQLite for whole-row inserts. Nested values are stored as JSON text.
pub fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// SQLite → JSON for result rows. Non-finite reals become null.
pub fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory relational store holding the movies and ratings relations.
///
/// One connection behind a mutex; every public operation runs a single
/// statement (dataset loads excepted) while holding the lock.
pub struct MovieStore {
    conn: Mutex<Connection>,
}

impl MovieStore {
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Startup sequence: load both datasets, then apply the runtime adjustment.
    pub fn bootstrap(movies_path: &Path, ratings_path: &Path) -> Result<Self> {
        let store = Self::open_in_memory()?;

        let movies = store.load_dataset(&MOVIES, movies_path)?;
        info!(rows = movies, path = %movies_path.display(), "loaded movies");

        let ratings = store.load_dataset(&RATINGS, ratings_path)?;
        info!(rows = ratings, path = %ratings_path.display(), "loaded ratings");

        let adjusted = store.apply_runtime_adjustment()?;
        info!(rows = adjusted, "applied runtime adjustment");

        Ok(store)
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        conn.close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))
    }

    /// Replace `schema`'s relation with the contents of a CSV file.
    pub fn load_dataset(&self, schema: &TableSchema, csv_path: &Path) -> Result<usize> {
        let records = read_csv(schema, csv_path)?;
        self.replace_table(schema, &records)
    }

    /// Drop, recreate and fill a relation inside one transaction.
    pub fn replace_table(&self, schema: &TableSchema, records: &[Record]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(&schema.drop_table_sql(), [])?;
        tx.execute(&schema.create_table_sql(), [])?;

        {
            let mut stmt = tx.prepare(&schema.insert_sql())?;
            for record in records {
                stmt.execute(params_from_iter(record.iter()))
                    .with_context(|| format!("Failed to insert into '{}'", schema.name))?;
            }
        }

        tx.commit()?;
        debug!(table = schema.name, rows = records.len(), "relation replaced");

        Ok(records.len())
    }

    /// One-shot genre-based runtime update. Returns the number of rows touched.
    pub fn apply_runtime_adjustment(&self) -> Result<usize> {
        self.execute(&runtime_update_sql(), [])
    }

    /// Run a statement that returns no rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.lock()?;
        let changed = conn.execute(sql, params)?;
        Ok(changed)
    }

    /// Run a query and return its rows as column → value maps, in result order.
    pub fn fetch<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params, |row| {
                let mut map = Row::new();
                for (i, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), sql_to_json(row.get_ref(i)?));
                }
                Ok(map)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn count(&self, table: &TableSchema) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table.name),
            [],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    // ========================================================================
    // ROUTE OPERATIONS
    // ========================================================================

    /// Ten longest movies by runtime, ties by tconst.
    pub fn longest_duration_movies(&self) -> Result<Vec<Row>> {
        self.fetch(LONGEST_DURATION_SQL, [LONGEST_DURATION_LIMIT])
    }

    /// Append one movie row as submitted. No runtime adjustment is applied.
    pub fn insert_movie(&self, movie: &NewMovie) -> Result<()> {
        self.execute(INSERT_MOVIE_SQL, movie.sql_values())?;
        Ok(())
    }

    /// Movies rated above 6.0, lowest rating first.
    pub fn top_rated_movies(&self) -> Result<Vec<Row>> {
        self.fetch(TOP_RATED_SQL, [TOP_RATED_THRESHOLD])
    }

    /// Votes summed per (genres, primaryTitle), ordered by genres.
    pub fn genre_movies_with_subtotals(&self) -> Result<Vec<Row>> {
        self.fetch(GENRE_SUBTOTALS_SQL, [])
    }
}
