//! SQLite-backed `GraphStore`.
//!
//! Schema setup follows the teacher's migration-safe pattern: base tables
//! created with `CREATE TABLE IF NOT EXISTS`, `PRAGMA journal_mode=WAL` for
//! concurrent readers, and `pragma_table_info` checked before any
//! `ALTER TABLE ADD COLUMN` (SQLite has no `ADD COLUMN IF NOT EXISTS`).

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::graph::{
    KnowsEdge, Layer, LayerMetrics, Person, PersonId, SimilarEdge, SimilarJobEdge,
};

use super::traits::{GraphStore, LayerProjection, OpenStore, StorageResult};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                skills_json TEXT NOT NULL DEFAULT '[]',
                job_title TEXT,
                job_title_canon TEXT,
                job_title_canon_tokens_json TEXT NOT NULL DEFAULT '[]',
                job_title_tokens_json TEXT NOT NULL DEFAULT '[]',
                company TEXT,
                worked_at_json TEXT NOT NULL DEFAULT '[]',
                attended_json TEXT NOT NULL DEFAULT '[]',
                metrics_skills_json TEXT NOT NULL DEFAULT '{}',
                metrics_job_json TEXT NOT NULL DEFAULT '{}'
            );

            CREATE INDEX IF NOT EXISTS idx_persons_job_title_canon ON persons(job_title_canon);

            CREATE TABLE IF NOT EXISTS knows_edges (
                a TEXT NOT NULL,
                b TEXT NOT NULL,
                PRIMARY KEY (a, b)
            );

            CREATE TABLE IF NOT EXISTS similar_edges (
                a TEXT NOT NULL,
                b TEXT NOT NULL,
                weight REAL NOT NULL,
                shared_skills INTEGER NOT NULL DEFAULT 0,
                jaccard REAL,
                PRIMARY KEY (a, b)
            );

            CREATE TABLE IF NOT EXISTS similar_job_edges (
                a TEXT NOT NULL,
                b TEXT NOT NULL,
                weight REAL NOT NULL,
                PRIMARY KEY (a, b)
            );
            "#,
        )?;
        Self::migrate_add_jaccard_column(conn)?;
        Ok(())
    }

    /// `jaccard` was added to `similar_edges` after the initial schema; guard
    /// with `pragma_table_info` since re-running `ADD COLUMN` errors.
    fn migrate_add_jaccard_column(conn: &Connection) -> StorageResult<()> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('similar_edges')")?;
        let has_jaccard = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .any(|name| name == "jaccard");
        if !has_jaccard {
            conn.execute("ALTER TABLE similar_edges ADD COLUMN jaccard REAL", [])?;
        }
        Ok(())
    }

    fn row_to_person(
        id: String,
        name: String,
        title: String,
        skills_json: String,
        job_title: Option<String>,
        job_title_canon: Option<String>,
        job_title_canon_tokens_json: String,
        job_title_tokens_json: String,
        company: Option<String>,
        worked_at_json: String,
        attended_json: String,
        metrics_skills_json: String,
        metrics_job_json: String,
    ) -> StorageResult<Person> {
        Ok(Person {
            id: PersonId::from(id),
            name,
            title,
            skills: serde_json::from_str(&skills_json)?,
            job_title,
            job_title_canon,
            job_title_canon_tokens: serde_json::from_str(&job_title_canon_tokens_json)?,
            job_title_tokens: serde_json::from_str(&job_title_tokens_json)?,
            company,
            worked_at: serde_json::from_str(&worked_at_json)?,
            attended: serde_json::from_str(&attended_json)?,
            metrics_skills: serde_json::from_str(&metrics_skills_json)?,
            metrics_job: serde_json::from_str(&metrics_job_json)?,
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl GraphStore for SqliteStore {
    fn upsert_person(&self, person: &Person) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO persons (
                id, name, title, skills_json, job_title, job_title_canon,
                job_title_canon_tokens_json, job_title_tokens_json, company,
                worked_at_json, attended_json, metrics_skills_json, metrics_job_json
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                skills_json = excluded.skills_json,
                job_title = excluded.job_title,
                job_title_canon = excluded.job_title_canon,
                job_title_canon_tokens_json = excluded.job_title_canon_tokens_json,
                job_title_tokens_json = excluded.job_title_tokens_json,
                company = excluded.company,
                worked_at_json = excluded.worked_at_json,
                attended_json = excluded.attended_json,
                metrics_skills_json = excluded.metrics_skills_json,
                metrics_job_json = excluded.metrics_job_json
            "#,
            params![
                person.id.as_str(),
                person.name,
                person.title,
                serde_json::to_string(&person.skills)?,
                person.job_title,
                person.job_title_canon,
                serde_json::to_string(&person.job_title_canon_tokens)?,
                serde_json::to_string(&person.job_title_tokens)?,
                person.company,
                serde_json::to_string(&person.worked_at)?,
                serde_json::to_string(&person.attended)?,
                serde_json::to_string(&person.metrics_skills)?,
                serde_json::to_string(&person.metrics_job)?,
            ],
        )?;
        Ok(())
    }

    fn get_person(&self, id: &PersonId) -> StorageResult<Option<Person>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, title, skills_json, job_title, job_title_canon, \
             job_title_canon_tokens_json, job_title_tokens_json, company, \
             worked_at_json, attended_json, metrics_skills_json, metrics_job_json \
             FROM persons WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id.as_str()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_person(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
            )?))
        } else {
            Ok(None)
        }
    }

    fn list_persons(&self) -> StorageResult<Vec<Person>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, title, skills_json, job_title, job_title_canon, \
             job_title_canon_tokens_json, job_title_tokens_json, company, \
             worked_at_json, attended_json, metrics_skills_json, metrics_job_json \
             FROM persons",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                row.get::<_, String>(11)?,
                row.get::<_, String>(12)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, title, skills, jt, jtc, jtct, jtt, company, wa, at, ms, mj) = row?;
            out.push(Self::row_to_person(
                id, name, title, skills, jt, jtc, jtct, jtt, company, wa, at, ms, mj,
            )?);
        }
        Ok(out)
    }

    fn delete_person(&self, id: &PersonId) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM persons WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    fn apply_layer_metrics(
        &self,
        layer: Layer,
        metrics: &[(PersonId, LayerMetrics)],
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let column = match layer {
            Layer::Skills => "metrics_skills_json",
            Layer::Job => "metrics_job_json",
        };
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare(&format!("UPDATE persons SET {column} = ?1 WHERE id = ?2"))?;
            for (id, m) in metrics {
                stmt.execute(params![serde_json::to_string(m)?, id.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn knows_neighbors(&self, id: &PersonId) -> StorageResult<Vec<PersonId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT a, b FROM knows_edges WHERE a = ?1 OR b = ?1")?;
        let rows = stmt.query_map(params![id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (a, b) = row?;
            let other = if a == id.as_str() { b } else { a };
            out.push(PersonId::from(other));
        }
        Ok(out)
    }

    fn add_knows(&self, edge: &KnowsEdge) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO knows_edges (a, b) VALUES (?1, ?2)",
            params![edge.a.as_str(), edge.b.as_str()],
        )?;
        Ok(())
    }

    fn shortest_knows_path(
        &self,
        src: &PersonId,
        dst: &PersonId,
        max_depth: usize,
    ) -> StorageResult<Option<Vec<PersonId>>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT a, b FROM knows_edges")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut adj: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (a, b) = row?;
            adj.entry(a.clone()).or_default().push(b.clone());
            adj.entry(b).or_default().push(a);
        }
        drop(conn);

        if src == dst {
            return Ok(Some(vec![src.clone()]));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::new();
        visited.insert(src.as_str().to_string());
        queue.push_back((src.as_str().to_string(), vec![src.as_str().to_string()]));

        while let Some((current, path)) = queue.pop_front() {
            if path.len() - 1 >= max_depth {
                continue;
            }
            if let Some(neighbors) = adj.get(&current) {
                for n in neighbors {
                    if visited.contains(n) {
                        continue;
                    }
                    let mut next_path = path.clone();
                    next_path.push(n.clone());
                    if n == dst.as_str() {
                        return Ok(Some(next_path.into_iter().map(PersonId::from).collect()));
                    }
                    visited.insert(n.clone());
                    queue.push_back((n.clone(), next_path));
                }
            }
        }
        Ok(None)
    }

    fn replace_similar_edges(&self, edges: &[SimilarEdge]) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM similar_edges", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO similar_edges (a, b, weight, shared_skills, jaccard) VALUES (?1,?2,?3,?4,?5)",
            )?;
            for e in edges {
                stmt.execute(params![
                    e.a.as_str(),
                    e.b.as_str(),
                    e.weight,
                    e.shared_skills,
                    e.jaccard
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_similar_job_edges(&self, edges: &[SimilarJobEdge]) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM similar_job_edges", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO similar_job_edges (a, b, weight) VALUES (?1,?2,?3)")?;
            for e in edges {
                stmt.execute(params![e.a.as_str(), e.b.as_str(), e.weight])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_similar_edges(&self) -> StorageResult<Vec<SimilarEdge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT a, b, weight, shared_skills, jaccard FROM similar_edges")?;
        let rows = stmt.query_map([], |row| {
            Ok(SimilarEdge {
                a: PersonId::from(row.get::<_, String>(0)?),
                b: PersonId::from(row.get::<_, String>(1)?),
                weight: row.get(2)?,
                shared_skills: row.get(3)?,
                jaccard: row.get(4)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn list_similar_job_edges(&self) -> StorageResult<Vec<SimilarJobEdge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT a, b, weight FROM similar_job_edges")?;
        let rows = stmt.query_map([], |row| {
            Ok(SimilarJobEdge {
                a: PersonId::from(row.get::<_, String>(0)?),
                b: PersonId::from(row.get::<_, String>(1)?),
                weight: row.get(2)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    fn project_layer(&self, layer: Layer, exclude_ids: &[PersonId]) -> StorageResult<LayerProjection> {
        let excluded: HashSet<&str> = exclude_ids.iter().map(|id| id.as_str()).collect();
        let raw_edges = match layer {
            Layer::Skills => self
                .list_similar_edges()?
                .into_iter()
                .map(|e| (e.a, e.b, e.weight))
                .collect::<Vec<_>>(),
            Layer::Job => self
                .list_similar_job_edges()?
                .into_iter()
                .map(|e| (e.a, e.b, e.weight))
                .collect::<Vec<_>>(),
        };

        let mut nodes: BTreeSet<PersonId> = BTreeSet::new();
        let mut edges = Vec::new();
        for (a, b, w) in raw_edges {
            if excluded.contains(a.as_str()) || excluded.contains(b.as_str()) {
                continue;
            }
            nodes.insert(a.clone());
            nodes.insert(b.clone());
            edges.push((a, b, w));
        }

        Ok(LayerProjection {
            nodes: nodes.into_iter().collect(),
            edges,
        })
    }

    fn all_skills(&self) -> StorageResult<BTreeSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT skills_json FROM persons")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = BTreeSet::new();
        for row in rows {
            let skills: BTreeSet<String> = serde_json::from_str(&row?)?;
            out.extend(skills.into_iter().map(|s| s.to_lowercase()));
        }
        Ok(out)
    }

    fn all_companies(&self) -> StorageResult<BTreeSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT company, worked_at_json FROM persons")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = BTreeSet::new();
        for row in rows {
            let (company, worked_at_json) = row?;
            if let Some(c) = company {
                if !c.trim().is_empty() {
                    out.insert(c.to_lowercase());
                }
            }
            let worked_at: BTreeSet<String> = serde_json::from_str(&worked_at_json)?;
            out.extend(worked_at.into_iter().map(|s| s.to_lowercase()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn roundtrips_a_person() {
        let s = store();
        let p = Person::new("P1", "Ada").with_skills(["python", "sql"]);
        s.upsert_person(&p).unwrap();
        let loaded = s.get_person(&PersonId::from("P1")).unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
        assert_eq!(loaded.skills.len(), 2);
    }

    #[test]
    fn knows_neighbors_sees_both_directions() {
        let s = store();
        s.add_knows(&KnowsEdge::new(PersonId::from("P1"), PersonId::from("P2")))
            .unwrap();
        assert_eq!(
            s.knows_neighbors(&PersonId::from("P1")).unwrap(),
            vec![PersonId::from("P2")]
        );
        assert_eq!(
            s.knows_neighbors(&PersonId::from("P2")).unwrap(),
            vec![PersonId::from("P1")]
        );
    }

    #[test]
    fn similar_edges_are_replaced_wholesale() {
        let s = store();
        s.replace_similar_edges(&[SimilarEdge::new(
            PersonId::from("P1"),
            PersonId::from("P2"),
            2.0,
            2,
        )])
        .unwrap();
        assert_eq!(s.list_similar_edges().unwrap().len(), 1);
        s.replace_similar_edges(&[]).unwrap();
        assert!(s.list_similar_edges().unwrap().is_empty());
    }

    #[test]
    fn shortest_path_respects_max_depth() {
        let s = store();
        s.add_knows(&KnowsEdge::new(PersonId::from("P1"), PersonId::from("P2")))
            .unwrap();
        s.add_knows(&KnowsEdge::new(PersonId::from("P2"), PersonId::from("P4")))
            .unwrap();
        let path = s
            .shortest_knows_path(&PersonId::from("P1"), &PersonId::from("P4"), 2)
            .unwrap();
        assert_eq!(
            path,
            Some(vec![
                PersonId::from("P1"),
                PersonId::from("P2"),
                PersonId::from("P4")
            ])
        );
        let too_short = s
            .shortest_knows_path(&PersonId::from("P1"), &PersonId::from("P4"), 1)
            .unwrap();
        assert_eq!(too_short, None);
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");

        {
            let s = SqliteStore::open(&path).unwrap();
            s.upsert_person(&Person::new("P1", "Ada").with_skills(["rust"])).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let loaded = reopened.get_person(&PersonId::from("P1")).unwrap().unwrap();
        assert_eq!(loaded.name, "Ada");
    }
}
