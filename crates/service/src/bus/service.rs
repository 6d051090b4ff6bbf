use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{BusForm, BusRecord};
use super::repository::BusRepository;
use crate::errors::ServiceError;
use crate::uploads::{CleanupOutcome, ImageUpload, StoredImage, UploadStore};

pub const MISSING_IMAGE_MESSAGE: &str = "Please upload a bus image";

/// Bus CRUD with the image lifecycle attached.
///
/// Every record owns at most one stored file. Replacing or deleting the record
/// releases the previous file, and a failed write removes the file stored for
/// it. File removal never fails a request.
pub struct BusService<R: BusRepository> {
    repo: Arc<R>,
    uploads: Arc<UploadStore>,
    require_image_on_create: bool,
}

impl<R: BusRepository> BusService<R> {
    pub fn new(repo: Arc<R>, uploads: Arc<UploadStore>) -> Self {
        Self { repo, uploads, require_image_on_create: false }
    }

    /// Refuse creates that carry no image instead of using the placeholder.
    pub fn require_image_on_create(mut self, require: bool) -> Self {
        self.require_image_on_create = require;
        self
    }

    pub fn uploads(&self) -> &UploadStore { &self.uploads }

    pub async fn list(&self) -> Result<Vec<BusRecord>, ServiceError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: &str) -> Result<BusRecord, ServiceError> {
        let id = parse_id(id)?;
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Bus"))
    }

    /// Validate, store the image, then persist. The stored image is discarded if persisting fails.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::bus::{BusService, domain::BusForm, repository::mock::MockBusRepository};
    /// use service::uploads::UploadStore;
    /// let uploads = Arc::new(UploadStore::from_config(&configs::UploadConfig::default()));
    /// let svc = BusService::new(Arc::new(MockBusRepository::default()), uploads);
    /// let form = BusForm {
    ///     name: Some("Route 5".into()), route: Some("A-B".into()), stops: Some("X,Y,Z".into()),
    ///     schedule: Some("hourly".into()), fare: Some("10".into()), ..BusForm::default()
    /// };
    /// let bus = tokio_test::block_on(svc.create(form, None)).unwrap();
    /// assert_eq!(bus.stops, vec!["X", "Y", "Z"]);
    /// assert_eq!(bus.image_url, "/assets/bus-placeholder.png");
    /// ```
    #[instrument(skip(self, form, image), fields(has_image = image.is_some()))]
    pub async fn create(&self, form: BusForm, image: Option<ImageUpload>) -> Result<BusRecord, ServiceError> {
        let draft = form.validate_for_create()?;

        let stored = match &image {
            Some(img) => Some(self.uploads.save(img).await?),
            None if self.require_image_on_create => {
                return Err(ServiceError::Validation(MISSING_IMAGE_MESSAGE.into()));
            }
            None => None,
        };
        let image_url = stored
            .as_ref()
            .map(|s| s.url.clone())
            .unwrap_or_else(|| self.uploads.placeholder_url().to_string());

        match self.repo.create(draft.with_image(image_url)).await {
            Ok(bus) => {
                info!(bus_id = %bus.id, image = %bus.image_url, "bus_created");
                Ok(bus)
            }
            Err(e) => {
                warn!(error = %e, "bus create failed");
                self.discard_new(stored.as_ref()).await;
                Err(e)
            }
        }
    }

    /// Partial update. Nothing is written to disk for an unknown id.
    #[instrument(skip(self, form, image), fields(has_image = image.is_some()))]
    pub async fn update(&self, id: &str, form: BusForm, image: Option<ImageUpload>) -> Result<BusRecord, ServiceError> {
        let id = parse_id(id)?;
        let mut changes = form.validate_for_update()?;
        if let Some(img) = &image {
            self.uploads.check(img)?;
        }

        let existing = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Bus"))?;

        let stored = match &image {
            Some(img) => Some(self.uploads.save(img).await?),
            None => None,
        };
        if let Some(s) = &stored {
            changes.image_url = Some(s.url.clone());
        }

        match self.repo.update(id, changes).await {
            Ok(Some(bus)) => {
                if stored.is_some() && existing.image_url != bus.image_url {
                    let outcome = self.uploads.release(&existing.image_url).await;
                    debug!(?outcome, "previous image released");
                }
                info!(bus_id = %bus.id, "bus_updated");
                Ok(bus)
            }
            Ok(None) => {
                self.discard_new(stored.as_ref()).await;
                Err(ServiceError::not_found("Bus"))
            }
            Err(e) => {
                warn!(bus_id = %id, error = %e, "bus update failed");
                self.discard_new(stored.as_ref()).await;
                Err(e)
            }
        }
    }

    /// Remove the record, then its image.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        let removed = self.repo.delete(id).await?.ok_or_else(|| ServiceError::not_found("Bus"))?;
        let outcome = self.uploads.release(&removed.image_url).await;
        info!(bus_id = %id, ?outcome, "bus_deleted");
        Ok(())
    }

    async fn discard_new(&self, stored: Option<&StoredImage>) {
        if let Some(s) = stored {
            let outcome = self.uploads.discard(s).await;
            if outcome != CleanupOutcome::Removed {
                warn!(file = %s.file_name, ?outcome, "stored image not removed after failed write");
            }
        }
    }
}

/// Ids that are not UUIDs can never match a record.
fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::not_found("Bus"))
}
