//! Read path for the build graph
//!
//! Kind listings, reverse reachability, and the stats aggregate.

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::graph::schema::TargetKind;

/// Node counts per kind plus the links total.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatCounters {
    pub deps: i64,
    pub sources: i64,
    pub headers: i64,
    pub objects: i64,
    pub libraries: i64,
    pub binaries: i64,
    pub inputs: i64,
}

/// Last recorded timings, read back from metadata. Milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatTimings {
    pub db_filling_ms: f64,
    pub db_loading_ms: f64,
    pub query_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Stats {
    pub counters: StatCounters,
    pub timings: StatTimings,
}

/// Compute the stats aggregate. Never cached; one round trip.
pub fn stats(conn: &Connection) -> Result<Stats> {
    let sql = "
        SELECT
            (SELECT COUNT(*) FROM links),
            (SELECT COUNT(*) FROM targets WHERE type = 1),
            (SELECT COUNT(*) FROM targets WHERE type = 2),
            (SELECT COUNT(*) FROM targets WHERE type = 3),
            (SELECT COUNT(*) FROM targets WHERE type = 4),
            (SELECT COUNT(*) FROM targets WHERE type = 5),
            (SELECT COUNT(*) FROM targets WHERE type = 6),
            (SELECT CAST(value AS REAL) FROM metadata WHERE key = 'perf_db_filling_ms'),
            (SELECT CAST(value AS REAL) FROM metadata WHERE key = 'perf_db_loading_ms'),
            (SELECT CAST(value AS REAL) FROM metadata WHERE key = 'perf_query_ms')
    ";
    let stats = conn.query_row(sql, [], |row| {
        Ok(Stats {
            counters: StatCounters {
                deps: row.get(0)?,
                sources: row.get(1)?,
                headers: row.get(2)?,
                objects: row.get(3)?,
                libraries: row.get(4)?,
                binaries: row.get(5)?,
                inputs: row.get(6)?,
            },
            timings: StatTimings {
                db_filling_ms: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                db_loading_ms: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
                query_ms: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0),
            },
        })
    })?;
    Ok(stats)
}

/// All node paths whose current kind equals `kind`.
pub fn all_of_kind(conn: &Connection, kind: TargetKind) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT path FROM targets WHERE type = ?1")?;
    let rows = stmt.query_map([kind.as_i64()], |row| row.get::<_, String>(0))?;
    let mut ret = Vec::new();
    for row in rows {
        ret.push(row?);
    }
    Ok(ret)
}

/// Reverse reachability: every node of `kind` from which some seed is
/// reachable by following links forward.
///
/// Seeds anchor on exact path equality or substring containment
/// (`LIKE '%seed%'`); the closure is computed backwards over the links
/// table in a single recursive CTE, riding the to_id index.
pub fn reachable_reverse(
    conn: &Connection,
    seeds: &[String],
    kind: TargetKind,
) -> Result<Vec<String>> {
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "WITH RECURSIVE pointed(id) AS (
            SELECT id FROM targets WHERE ",
    );
    for i in 0..seeds.len() {
        if i > 0 {
            sql.push_str(" OR ");
        }
        sql.push_str("path = ? OR path LIKE ?");
    }
    sql.push_str(
        "
            UNION
            SELECT l.from_id
            FROM links l
            JOIN pointed p ON l.to_id = p.id
        )
        SELECT DISTINCT path FROM targets
        WHERE id IN (SELECT id FROM pointed)
          AND type = ?",
    );

    let mut params: Vec<Value> = Vec::with_capacity(seeds.len() * 2 + 1);
    for seed in seeds {
        params.push(Value::Text(seed.clone()));
        params.push(Value::Text(format!("%{}%", seed)));
    }
    params.push(Value::Integer(kind.as_i64()));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), |row| row.get::<_, String>(0))?;
    let mut ret = Vec::new();
    for row in rows {
        ret.push(row?);
    }
    Ok(ret)
}
