//! Download and extraction of PRISM climate archives.
//!
//! Every raster ships as a ZIP archive holding a single GeoTIFF. The loader
//! streams the archive into the flat data folder, extracts it into a
//! per-archive subfolder, deletes the ZIP, and flattens the raster into an
//! observation table. Extracted folders are left behind for inspection
//! unless the caller clears the data folder at the start of a run.

use crate::prism::error::PrismDataError;
use crate::prism::geotiff::PrismRaster;
use crate::types::prism::{
    MissingDay, NormalType, PrismProduct, PrismRegion, PrismVariable, Resolution,
};
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::prelude::DataFrame;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::task;
use tokio_util::io::StreamReader;

const ARCHIVE_BASE: &str = "https://data.prism.oregonstate.edu";

/// Normals are not year-specific; the archive publishes them under the final
/// year of the 1991-2020 window.
const NORMALS_NOMINAL_YEAR: i32 = 2020;

const DEFAULT_DATA_DIR: &str = "PRISM Data";

/// One downloadable PRISM archive, fully determined by product, variable,
/// region, resolution and date.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveRequest {
    pub product: PrismProduct,
    pub variable: PrismVariable,
    pub region: PrismRegion,
    pub resolution: Resolution,
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
    pub normal_type: NormalType,
}

impl ArchiveRequest {
    /// Whether this request names a daily raster and therefore needs a day
    /// of month.
    pub fn requires_day(&self) -> bool {
        match self.product {
            PrismProduct::Daily => true,
            PrismProduct::Monthly => false,
            PrismProduct::Normals => self.normal_type == NormalType::Daily,
        }
    }

    /// Date token embedded in the archive filename. Daily data and daily
    /// normals fail without a day rather than guessing one.
    fn date_token(&self) -> Result<String, MissingDay> {
        match self.product {
            PrismProduct::Daily => {
                let day = self.day.ok_or(MissingDay("data"))?;
                Ok(format!("{}{:02}{day:02}", self.year, self.month))
            }
            PrismProduct::Monthly => Ok(format!("{}{:02}", self.year, self.month)),
            PrismProduct::Normals => {
                let day = match self.normal_type {
                    NormalType::Daily => {
                        let d = self.day.ok_or(MissingDay("normals"))?;
                        format!("{d:02}")
                    }
                    NormalType::Monthly => String::new(),
                };
                Ok(format!("{NORMALS_NOMINAL_YEAR}{:02}{day}_avg_30y", self.month))
            }
        }
    }

    fn file_stem(&self) -> Result<String, MissingDay> {
        Ok(format!(
            "prism_{}_{}_{}_{}",
            self.variable.code(),
            self.region.code(),
            self.resolution.grid_token(),
            self.date_token()?
        ))
    }

    /// Name of the ZIP archive on the server.
    pub fn archive_name(&self) -> Result<String, MissingDay> {
        Ok(format!("{}.zip", self.file_stem()?))
    }

    /// Name of the GeoTIFF payload inside the archive.
    pub fn raster_name(&self) -> Result<String, MissingDay> {
        Ok(format!("{}.tif", self.file_stem()?))
    }

    /// Full download URL.
    pub fn url(&self) -> Result<String, MissingDay> {
        Ok(match self.product {
            PrismProduct::Daily | PrismProduct::Monthly => format!(
                "{ARCHIVE_BASE}/time_series/{}/an/{}/{}/{}/{}/{}",
                self.region.code(),
                self.resolution.path_segment(),
                self.variable.code(),
                self.product.cadence_segment(),
                self.year,
                self.archive_name()?
            ),
            PrismProduct::Normals => format!(
                "{ARCHIVE_BASE}/normals/{}/{}/{}/{}/{}",
                self.region.code(),
                self.resolution.path_segment(),
                self.variable.code(),
                self.normal_type.path_segment(),
                self.archive_name()?
            ),
        })
    }
}

pub struct PrismDataLoader {
    client: Client,
    data_dir: PathBuf,
}

impl Default for PrismDataLoader {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl PrismDataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Deletes every archive subfolder in the data directory.
    ///
    /// This is a destructive, process-wide operation: it removes the
    /// extracted rasters of every prior run sharing the folder, regardless
    /// of which variable is being fetched, and it is not safe under
    /// concurrent invocation.
    pub async fn clear(&self) -> Result<(), PrismDataError> {
        let io_err = |e| PrismDataError::DataFolderIo(self.data_dir.clone(), e);
        if tokio::fs::metadata(&self.data_dir).await.is_err() {
            return Ok(());
        }
        let mut entries = tokio::fs::read_dir(&self.data_dir).await.map_err(io_err)?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if entry.file_type().await.map_err(io_err)?.is_dir() {
                tokio::fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| PrismDataError::DataFolderIo(path, e))?;
                removed += 1;
            }
        }
        warn!(
            "Cleared {removed} archive folder(s) from {}",
            self.data_dir.display()
        );
        Ok(())
    }

    /// Downloads, extracts and flattens one archive into an observation
    /// table with `latitude`, `longitude` and the variable column.
    pub async fn fetch_table(&self, request: ArchiveRequest) -> Result<DataFrame, PrismDataError> {
        if request.variable.is_derived() {
            return Err(PrismDataError::DerivedVariableRequested(
                request.variable.code().to_string(),
            ));
        }

        let url = request.url()?;
        let archive_name = request.archive_name()?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| PrismDataError::DataFolderIo(self.data_dir.clone(), e))?;

        let zip_path = self.data_dir.join(&archive_name);
        let extract_dir = self.data_dir.join(&archive_name);

        self.download(&url, &zip_path).await?;

        let raster_name = request.raster_name()?;
        let variable = request.variable.code().to_string();
        task::spawn_blocking(move || {
            extract_archive(&zip_path, &extract_dir)?;
            let raster_path = locate_raster(&extract_dir, &raster_name)?;
            let raster = PrismRaster::load(&raster_path)?;
            raster.to_table(&variable)
        })
        .await?
    }

    /// Streams a remote archive to disk. The ZIP is deleted again once the
    /// extraction step has run.
    async fn download(&self, url: &str, destination: &Path) -> Result<(), PrismDataError> {
        info!("Downloading {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PrismDataError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {url}: {e:?}");
                return Err(if let Some(status) = e.status() {
                    PrismDataError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    PrismDataError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| PrismDataError::DataFolderIo(destination.to_path_buf(), e))?;
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| PrismDataError::DataFolderIo(destination.to_path_buf(), e))?;
        info!("Downloaded {bytes} bytes to {}", destination.display());
        Ok(())
    }
}

/// Extracts a ZIP into its per-archive folder and removes the ZIP.
///
/// The extraction folder shares the archive's name; the ZIP is written next
/// to it, so the ZIP is unpacked through a temporary sibling rename.
fn extract_archive(zip_path: &Path, extract_dir: &Path) -> Result<(), PrismDataError> {
    let staged = zip_path.with_extension("zip.part");
    std::fs::rename(zip_path, &staged)
        .map_err(|e| PrismDataError::DataFolderIo(zip_path.to_path_buf(), e))?;

    let file = std::fs::File::open(&staged)
        .map_err(|e| PrismDataError::DataFolderIo(staged.clone(), e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| PrismDataError::Archive(staged.clone(), e))?;
    archive
        .extract(extract_dir)
        .map_err(|e| PrismDataError::Archive(staged.clone(), e))?;

    std::fs::remove_file(&staged).map_err(|e| PrismDataError::DataFolderIo(staged.clone(), e))?;
    Ok(())
}

/// Finds the raster payload: the expected filename if present, otherwise the
/// single `.tif` file in the extraction folder.
fn locate_raster(extract_dir: &Path, expected: &str) -> Result<PathBuf, PrismDataError> {
    let candidate = extract_dir.join(expected);
    if candidate.exists() {
        return Ok(candidate);
    }
    let entries = std::fs::read_dir(extract_dir)
        .map_err(|e| PrismDataError::DataFolderIo(extract_dir.to_path_buf(), e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tif") {
            return Ok(path);
        }
    }
    Err(PrismDataError::RasterNotFound(extract_dir.to_path_buf()))
}
