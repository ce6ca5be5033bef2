//! SQLite storage engine (embedded, no external dependencies)
//!
//! One table per entity kind. The in-memory index stays authoritative;
//! `save` rewrites every table inside a single transaction, tagging each row
//! with its position in the index (`seq`), and `reload` merges the tables
//! back in that order. This engine keeps live
//! back-references so relationship lookups never scan.

use super::index::Index;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hbnb_core::{
    Amenity, BaseFields, City, Entity, HbnbError, Kind, Place, Result, Review, State, Storage,
    User,
};
use parking_lot::RwLock;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Acquire, Sqlite, SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct DbStorage {
    pool: SqlitePool,
    index: RwLock<Index>,
    writer: Mutex<()>,
    /// Session connection shared by all requests. Checked out lazily by
    /// `save`/`reload`, used only while its lock is held, and handed back
    /// to the pool by `close`; the next user checks out a fresh one.
    session: Mutex<Option<PoolConnection<Sqlite>>>,
}

fn db_err(e: sqlx::Error) -> HbnbError {
    HbnbError::Database(e.to_string())
}

impl DbStorage {
    pub async fn open(database_path: &str) -> Result<Self> {
        info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Self::run_migrations(&pool).await?;
        info!("Database initialization complete");

        Ok(Self {
            pool,
            index: RwLock::new(Index::with_back_references()),
            writer: Mutex::new(()),
            session: Mutex::new(None),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        // No foreign-key constraints: deleting a parent leaves its
        // dependents in place.
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS states (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cities (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                state_id TEXT NOT NULL,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS amenities (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                city_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                number_rooms INTEGER NOT NULL DEFAULT 0,
                number_bathrooms INTEGER NOT NULL DEFAULT 0,
                max_guest INTEGER NOT NULL DEFAULT 0,
                price_by_night INTEGER NOT NULL DEFAULT 0,
                latitude REAL NOT NULL DEFAULT 0,
                longitude REAL NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                place_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                text TEXT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }

    /// Lock the session, checking out a connection if none is held.
    async fn session(&self) -> Result<tokio::sync::MutexGuard<'_, Option<PoolConnection<Sqlite>>>> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(self.pool.acquire().await.map_err(db_err)?);
        }
        Ok(session)
    }
}

#[async_trait]
impl Storage for DbStorage {
    fn name(&self) -> &'static str {
        "db"
    }

    fn all(&self, kind: Option<Kind>) -> Vec<Entity> {
        self.index.read().values(kind)
    }

    fn get(&self, kind: Kind, id: &str) -> Option<Entity> {
        self.index.read().get(kind, id).cloned()
    }

    fn new(&self, entity: Entity) {
        self.index.write().insert(entity);
    }

    fn delete(&self, entity: &Entity) {
        self.index.write().remove(entity.kind(), entity.id());
    }

    fn count(&self, kind: Option<Kind>) -> usize {
        self.index.read().count(kind)
    }

    fn has_back_references(&self) -> bool {
        self.index.read().has_back_references()
    }

    fn back_references(&self, parent: &Entity, kind: Kind) -> Vec<Entity> {
        self.index.read().children(parent, kind).unwrap_or_default()
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        let entities = self.index.read().values(None);

        let mut session = self.session().await?;
        let conn = session
            .as_mut()
            .ok_or_else(|| HbnbError::Storage("no database session".to_string()))?;
        let mut tx = conn.begin().await.map_err(db_err)?;

        for table in ["states", "cities", "amenities", "users", "places", "reviews"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        for (seq, entity) in entities.iter().enumerate() {
            insert_entity(&mut tx, seq as i64, entity).await?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!("Saved {} objects to database", entities.len());
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut session = self.session().await?;
        let conn = session
            .as_mut()
            .ok_or_else(|| HbnbError::Storage("no database session".to_string()))?;

        let mut entities = Vec::new();
        entities.extend(load_states(conn).await?);
        entities.extend(load_cities(conn).await?);
        entities.extend(load_amenities(conn).await?);
        entities.extend(load_users(conn).await?);
        entities.extend(load_places(conn).await?);
        entities.extend(load_reviews(conn).await?);

        entities.sort_by_key(|(seq, _)| *seq);

        info!("Loaded {} objects from database", entities.len());
        self.index
            .write()
            .replace_all(entities.into_iter().map(|(_, entity)| entity).collect::<Vec<_>>());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Dropping the connection hands it back to the pool.
        self.session.lock().await.take();
        Ok(())
    }
}

async fn insert_entity(conn: &mut SqliteConnection, seq: i64, entity: &Entity) -> Result<()> {
    let query = match entity {
        Entity::State(s) => sqlx::query(
            "INSERT INTO states (id, created_at, updated_at, name, seq) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&s.base.id)
        .bind(s.base.created_at)
        .bind(s.base.updated_at)
        .bind(&s.name)
        .bind(seq),
        Entity::City(c) => sqlx::query(
            "INSERT INTO cities (id, created_at, updated_at, state_id, name, seq) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&c.base.id)
        .bind(c.base.created_at)
        .bind(c.base.updated_at)
        .bind(&c.state_id)
        .bind(&c.name)
        .bind(seq),
        Entity::Amenity(a) => sqlx::query(
            "INSERT INTO amenities (id, created_at, updated_at, name, seq) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&a.base.id)
        .bind(a.base.created_at)
        .bind(a.base.updated_at)
        .bind(&a.name)
        .bind(seq),
        Entity::User(u) => sqlx::query(
            "INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name, seq) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&u.base.id)
        .bind(u.base.created_at)
        .bind(u.base.updated_at)
        .bind(&u.email)
        .bind(&u.password)
        .bind(&u.first_name)
        .bind(&u.last_name)
        .bind(seq),
        Entity::Place(p) => sqlx::query(
            "INSERT INTO places (id, created_at, updated_at, city_id, user_id, name, description, \
             number_rooms, number_bathrooms, max_guest, price_by_night, latitude, longitude, seq) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )
        .bind(&p.base.id)
        .bind(p.base.created_at)
        .bind(p.base.updated_at)
        .bind(&p.city_id)
        .bind(&p.user_id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.number_rooms)
        .bind(p.number_bathrooms)
        .bind(p.max_guest)
        .bind(p.price_by_night)
        .bind(p.latitude)
        .bind(p.longitude)
        .bind(seq),
        Entity::Review(r) => sqlx::query(
            "INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text, seq) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&r.base.id)
        .bind(r.base.created_at)
        .bind(r.base.updated_at)
        .bind(&r.place_id)
        .bind(&r.user_id)
        .bind(&r.text)
        .bind(seq),
    };

    query.execute(&mut *conn).await.map_err(db_err)?;
    Ok(())
}

async fn load_states(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<StateRow> = sqlx::query_as(
        "SELECT seq, id, created_at, updated_at, name FROM states ORDER BY seq, rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::State(r.into()))).collect())
}

async fn load_cities(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<CityRow> = sqlx::query_as(
        "SELECT seq, id, created_at, updated_at, state_id, name FROM cities ORDER BY seq, rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::City(r.into()))).collect())
}

async fn load_amenities(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<AmenityRow> = sqlx::query_as(
        "SELECT seq, id, created_at, updated_at, name FROM amenities ORDER BY seq, rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::Amenity(r.into()))).collect())
}

async fn load_users(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<UserRow> = sqlx::query_as(
        r#"
        SELECT seq, id, created_at, updated_at, email, password, first_name, last_name
        FROM users ORDER BY seq, rowid
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::User(r.into()))).collect())
}

async fn load_places(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<PlaceRow> = sqlx::query_as(
        r#"
        SELECT seq, id, created_at, updated_at, city_id, user_id, name, description,
               number_rooms, number_bathrooms, max_guest, price_by_night,
               latitude, longitude
        FROM places ORDER BY seq, rowid
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::Place(r.into()))).collect())
}

async fn load_reviews(conn: &mut SqliteConnection) -> Result<Vec<(i64, Entity)>> {
    let rows: Vec<ReviewRow> = sqlx::query_as(
        "SELECT seq, id, created_at, updated_at, place_id, user_id, text FROM reviews ORDER BY seq, rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(|r| (r.seq, Entity::Review(r.into()))).collect())
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct StateRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<StateRow> for State {
    fn from(r: StateRow) -> Self {
        State {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state_id: String,
    name: String,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            base: base(r.id, r.created_at, r.updated_at),
            state_id: r.state_id,
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AmenityRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    name: String,
}

impl From<AmenityRow> for Amenity {
    fn from(r: AmenityRow) -> Self {
        Amenity {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            base: base(r.id, r.created_at, r.updated_at),
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    city_id: String,
    user_id: String,
    name: String,
    description: String,
    number_rooms: i64,
    number_bathrooms: i64,
    max_guest: i64,
    price_by_night: i64,
    latitude: f64,
    longitude: f64,
}

impl From<PlaceRow> for Place {
    fn from(r: PlaceRow) -> Self {
        Place {
            base: base(r.id, r.created_at, r.updated_at),
            city_id: r.city_id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            number_rooms: r.number_rooms,
            number_bathrooms: r.number_bathrooms,
            max_guest: r.max_guest,
            price_by_night: r.price_by_night,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    seq: i64,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    place_id: String,
    user_id: String,
    text: String,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            base: base(r.id, r.created_at, r.updated_at),
            place_id: r.place_id,
            user_id: r.user_id,
            text: r.text,
        }
    }
}

fn base(id: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> BaseFields {
    BaseFields {
        id,
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbnb_core::Model;
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, DbStorage) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hbnb.db");
        let storage = DbStorage::open(path.to_str().unwrap()).await.unwrap();
        (temp_dir, storage)
    }

    fn state(name: &str) -> State {
        State::build(json!({ "name": name }).as_object().unwrap(), &[]).unwrap()
    }

    #[tokio::test]
    async fn test_reload_empty_database() {
        let (_temp, storage) = setup().await;
        storage.reload().await.unwrap();
        assert_eq!(storage.count(None), 0);
    }

    #[tokio::test]
    async fn test_save_reload_round_trip_every_kind() {
        let (temp, storage) = setup().await;
        let s = state("Hawaii");
        let city = City::build(
            json!({ "name": "Honolulu" }).as_object().unwrap(),
            &[("state_id", s.base.id.as_str())],
        )
        .unwrap();
        let user = User::build(
            json!({ "email": "k@h.i", "password": "secret" }).as_object().unwrap(),
            &[],
        )
        .unwrap();
        let place = Place::build(
            json!({
                "user_id": user.base.id,
                "name": "Beach hut",
                "number_rooms": 2,
                "latitude": 21.3,
                "longitude": -157.8
            })
            .as_object()
            .unwrap(),
            &[("city_id", city.base.id.as_str())],
        )
        .unwrap();
        let review = Review::build(
            json!({ "user_id": user.base.id, "text": "Lovely" }).as_object().unwrap(),
            &[("place_id", place.base.id.as_str())],
        )
        .unwrap();
        let amenity = Amenity::build(json!({ "name": "Pool" }).as_object().unwrap(), &[]).unwrap();

        for entity in [
            Entity::State(s),
            Entity::City(city),
            Entity::User(user),
            Entity::Place(place),
            Entity::Review(review),
            Entity::Amenity(amenity),
        ] {
            storage.new(entity);
        }
        storage.save().await.unwrap();
        storage.close().await.unwrap();

        let path = temp.path().join("hbnb.db");
        let reopened = DbStorage::open(path.to_str().unwrap()).await.unwrap();
        reopened.reload().await.unwrap();

        assert_eq!(reopened.count(None), 6);
        for kind in Kind::ALL {
            assert_eq!(reopened.all(Some(kind)), storage.all(Some(kind)));
        }
    }

    #[tokio::test]
    async fn test_delete_is_committed_by_save() {
        let (_temp, storage) = setup().await;
        let s = state("Alaska");
        let entity: Entity = s.clone().into();
        storage.new(entity.clone());
        storage.save().await.unwrap();

        storage.delete(&entity);
        // Not yet committed: reloading restores it.
        storage.reload().await.unwrap();
        assert!(storage.get(Kind::State, &s.base.id).is_some());

        storage.delete(&entity);
        storage.save().await.unwrap();
        storage.reload().await.unwrap();
        assert!(storage.get(Kind::State, &s.base.id).is_none());
    }

    #[tokio::test]
    async fn test_back_references_are_live() {
        let (_temp, storage) = setup().await;
        assert!(storage.has_back_references());

        let s = state("Vermont");
        let parent: Entity = s.clone().into();
        storage.new(parent.clone());
        assert!(storage.back_references(&parent, Kind::City).is_empty());

        let city = City::build(
            json!({ "name": "Burlington" }).as_object().unwrap(),
            &[("state_id", s.base.id.as_str())],
        )
        .unwrap();
        storage.new(city.clone().into());
        assert_eq!(
            storage.back_references(&parent, Kind::City),
            vec![Entity::City(city)]
        );
    }

    #[tokio::test]
    async fn test_close_releases_session() {
        let (_temp, storage) = setup().await;
        storage.reload().await.unwrap();
        assert!(storage.session.lock().await.is_some());

        storage.close().await.unwrap();
        assert!(storage.session.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_reload_keeps_global_order() {
        let (temp, storage) = setup().await;
        let amenity = Amenity::build(json!({ "name": "Wifi" }).as_object().unwrap(), &[]).unwrap();
        storage.new(amenity.into());
        storage.new(state("Texas").into());
        storage.new(
            Amenity::build(json!({ "name": "Sauna" }).as_object().unwrap(), &[])
                .unwrap()
                .into(),
        );
        storage.new(state("Iowa").into());

        let before: Vec<String> = storage.all(None).iter().map(Entity::key).collect();
        storage.save().await.unwrap();
        storage.reload().await.unwrap();
        let after: Vec<String> = storage.all(None).iter().map(Entity::key).collect();
        assert_eq!(after, before);

        let path = temp.path().join("hbnb.db");
        let reopened = DbStorage::open(path.to_str().unwrap()).await.unwrap();
        reopened.reload().await.unwrap();
        assert_eq!(reopened.all(None), storage.all(None));
    }

    #[tokio::test]
    async fn test_close_waits_for_session_user() {
        let (_temp, storage) = setup().await;
        let storage = std::sync::Arc::new(storage);
        for i in 0..20 {
            storage.new(state(&format!("State {}", i)).into());
        }

        let saver = {
            let storage = storage.clone();
            tokio::spawn(async move { storage.save().await })
        };
        let closer = {
            let storage = storage.clone();
            tokio::spawn(async move { storage.close().await })
        };
        saver.await.unwrap().unwrap();
        closer.await.unwrap().unwrap();

        storage.reload().await.unwrap();
        assert_eq!(storage.count(Some(Kind::State)), 20);
    }
}
