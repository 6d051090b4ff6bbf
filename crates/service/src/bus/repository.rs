use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use models::bus::NewBus;

use super::domain::{BusChanges, BusRecord};
use crate::errors::ServiceError;

#[async_trait]
pub trait BusRepository: Send + Sync {
    /// Newest first.
    async fn list(&self) -> Result<Vec<BusRecord>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError>;
    async fn create(&self, new: NewBus) -> Result<BusRecord, ServiceError>;
    /// `Ok(None)` when no row has this id.
    async fn update(&self, id: Uuid, changes: BusChanges) -> Result<Option<BusRecord>, ServiceError>;
    /// Returns the removed row, if there was one.
    async fn delete(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmBusRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl BusRepository for SeaOrmBusRepository {
    async fn list(&self) -> Result<Vec<BusRecord>, ServiceError> {
        models::bus::list_newest_first(&self.db)
            .await?
            .into_iter()
            .map(BusRecord::try_from)
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError> {
        let found = models::bus::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        found.map(BusRecord::try_from).transpose()
    }

    async fn create(&self, new: NewBus) -> Result<BusRecord, ServiceError> {
        let created = models::bus::create(&self.db, new).await?;
        BusRecord::try_from(created)
    }

    async fn update(&self, id: Uuid, changes: BusChanges) -> Result<Option<BusRecord>, ServiceError> {
        let Some(existing) = models::bus::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut am = existing.into_active_model();
        if let Some(v) = changes.name { am.name = Set(v); }
        if let Some(v) = changes.route { am.route = Set(v); }
        if let Some(v) = changes.image_url { am.image_url = Set(v); }
        if let Some(v) = changes.stops { am.stops = Set(models::bus::encode_stops(&v)?); }
        if let Some(v) = changes.status { am.status = Set(v); }
        if let Some(v) = changes.schedule { am.schedule = Set(v); }
        if let Some(v) = changes.fare { am.fare = Set(v); }
        am.updated_at = Set(Utc::now().into());

        let updated = am.update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        BusRecord::try_from(updated).map(Some)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };
        if !models::bus::hard_delete(&self.db, id).await? {
            return Ok(None);
        }
        Ok(Some(existing))
    }
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockBusRepository {
        rows: Mutex<Vec<BusRecord>>,
        fail_writes: AtomicBool,
    }

    impl MockBusRepository {
        /// Make every subsequent create/update/delete fail with a database error.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn check_writable(&self) -> Result<(), ServiceError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ServiceError::Db("injected write failure".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BusRepository for MockBusRepository {
        async fn list(&self) -> Result<Vec<BusRecord>, ServiceError> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.reverse();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn get(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
        }

        async fn create(&self, new: NewBus) -> Result<BusRecord, ServiceError> {
            self.check_writable()?;
            let now = Utc::now().into();
            let record = BusRecord {
                id: Uuid::new_v4(),
                name: new.name,
                route: new.route,
                image_url: new.image_url,
                stops: new.stops,
                status: new.status,
                schedule: new.schedule,
                fare: new.fare,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update(&self, id: Uuid, changes: BusChanges) -> Result<Option<BusRecord>, ServiceError> {
            self.check_writable()?;
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            if let Some(v) = changes.name { row.name = v; }
            if let Some(v) = changes.route { row.route = v; }
            if let Some(v) = changes.image_url { row.image_url = v; }
            if let Some(v) = changes.stops { row.stops = v; }
            if let Some(v) = changes.status { row.status = v; }
            if let Some(v) = changes.schedule { row.schedule = v; }
            if let Some(v) = changes.fare { row.fare = v; }
            row.updated_at = Utc::now().into();
            Ok(Some(row.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<Option<BusRecord>, ServiceError> {
            self.check_writable()?;
            let mut rows = self.rows.lock().unwrap();
            let idx = rows.iter().position(|r| r.id == id);
            Ok(idx.map(|i| rows.remove(i)))
        }
    }
}
