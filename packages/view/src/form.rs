//! New-report form.
//!
//! Photos are checked against their metadata when attached and only read
//! on submit. Submission validates description, location and district in
//! that order before anything is sent. A failed submit keeps every field
//! so the user can retry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clean_ninja_report_models::{District, Location};

use crate::FormError;
use crate::controller::ViewController;

/// Largest photo accepted, in bytes.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

/// Coordinates used by the demo submission when no location was set.
pub const DEMO_LOCATION: (f64, f64) = (-6.2088, 106.8456);

/// Address used by the demo submission when no location was set.
pub const DEMO_ADDRESS: &str = "Central Jakarta (Demo)";

/// A photo picked by the user.
#[async_trait]
pub trait PhotoSource: Send + Sync + std::fmt::Debug {
    /// Media type, e.g. `image/png`.
    fn mime_type(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Reads the full contents.
    async fn read(&self) -> std::io::Result<Vec<u8>>;
}

/// A photo on the local filesystem.
#[derive(Debug, Clone)]
pub struct FilePhoto {
    path: PathBuf,
    mime_type: String,
    size: u64,
}

impl FilePhoto {
    /// Stats `path` and guesses its media type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = tokio::fs::metadata(&path).await?.len();
        let mime_type = mime_type_for(&path).to_string();
        Ok(Self {
            path,
            mime_type,
            size,
        })
    }

    /// Returns the file's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PhotoSource for FilePhoto {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Guesses a media type from a file extension.
#[must_use]
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Fields of a report being composed.
#[derive(Debug, Default)]
pub struct ReportForm {
    photo: Option<Box<dyn PhotoSource>>,
    location: Option<Location>,
    district: Option<District>,
    description: String,
}

impl ReportForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a photo after checking its type and size. Nothing is read.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MediaConstraintViolation`] for non-images and
    /// files over [`MAX_PHOTO_BYTES`]. The previous photo is kept.
    pub fn attach_photo(&mut self, photo: Box<dyn PhotoSource>) -> Result<(), FormError> {
        if !photo.mime_type().starts_with("image/") {
            return Err(FormError::media("Only image files are allowed"));
        }
        if photo.size() > MAX_PHOTO_BYTES {
            return Err(FormError::media("Maximum file size is 5MB"));
        }
        self.photo = Some(photo);
        Ok(())
    }

    /// Removes the attached photo.
    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    /// Returns the attached photo.
    #[must_use]
    pub fn photo(&self) -> Option<&dyn PhotoSource> {
        self.photo.as_deref()
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the location directly.
    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    /// Returns the location.
    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Sets the district.
    pub fn set_district(&mut self, district: District) {
        self.district = Some(district);
    }

    /// Returns the district.
    #[must_use]
    pub const fn district(&self) -> Option<District> {
        self.district
    }

    /// Resolves coordinates through the backend (or the offline fallback)
    /// and fills in location, address and district.
    pub async fn detect_location(
        &mut self,
        controller: &ViewController,
        latitude: f64,
        longitude: f64,
    ) {
        let info = controller.api().verify_location(latitude, longitude).await;
        log::debug!(
            "Location ({latitude}, {longitude}) resolved to {} ({})",
            info.district,
            info.address
        );
        self.location = Some(Location {
            latitude,
            longitude,
            address: Some(info.address),
        });
        self.district = Some(info.district);
    }

    /// Checks the required fields in order.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::ValidationFailure`] naming the first missing
    /// field.
    pub fn validate(&self) -> Result<(Location, District), FormError> {
        if self.description.trim().is_empty() {
            return Err(FormError::validation("Please provide a description"));
        }
        let Some(location) = self.location.clone() else {
            return Err(FormError::validation("Please specify a location"));
        };
        let Some(district) = self.district else {
            return Err(FormError::validation("Please select a district"));
        };
        Ok((location, district))
    }

    /// Validates, reads the photo, creates the report and refreshes the
    /// list. On success the form is cleared and the new id returned.
    ///
    /// # Errors
    ///
    /// * [`FormError::ValidationFailure`] before any network call
    /// * [`FormError::PhotoRead`] if the photo cannot be read
    /// * [`FormError::Api`] if the backend call fails
    pub async fn submit(&mut self, controller: &ViewController) -> Result<String, FormError> {
        let (location, district) = self.validate()?;

        let image = match &self.photo {
            Some(photo) => Some(photo.read().await.map_err(|e| {
                log::error!("Reading photo failed: {e}");
                FormError::PhotoRead {
                    message: "Failed to read image file".to_string(),
                }
            })?),
            None => None,
        };

        let id = controller
            .api()
            .create_report(&location, district, &self.description, image)
            .await?;

        *self = Self::default();
        controller.refresh_after_mutation().await;
        Ok(id)
    }

    /// Submits with only a description, filling in a demo location and
    /// the central district if unset. The photo is not sent.
    ///
    /// # Errors
    ///
    /// * [`FormError::ValidationFailure`] if the description is empty
    /// * [`FormError::Api`] if the backend call fails
    pub async fn submit_demo(&mut self, controller: &ViewController) -> Result<String, FormError> {
        if self.description.trim().is_empty() {
            return Err(FormError::validation("Please provide a description"));
        }

        let location = self.location.clone().unwrap_or_else(|| Location {
            latitude: DEMO_LOCATION.0,
            longitude: DEMO_LOCATION.1,
            address: Some(DEMO_ADDRESS.to_string()),
        });
        let district = self.district.unwrap_or(District::Central);

        let id = controller
            .api()
            .create_report(&location, district, &self.description, None)
            .await?;

        *self = Self::default();
        controller.refresh_after_mutation().await;
        Ok(id)
    }
}
