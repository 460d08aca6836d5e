use crate::remote::error::CatalogError;
use crate::remote::transport::ClimateListing;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use std::collections::HashMap;
use std::path::Path;

const CATALOG_FILE_NAME: &str = "climate_catalog.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Name → service id table of a climate service.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Catalog {
    ids: HashMap<String, String>,
}

impl Catalog {
    pub(crate) fn from_listings(listings: impl IntoIterator<Item = ClimateListing>) -> Self {
        Self {
            ids: listings
                .into_iter()
                .map(|listing| (listing.name, listing.id))
                .collect(),
        }
    }

    pub(crate) fn id(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn listings(&self) -> Vec<ClimateListing> {
        let mut listings: Vec<_> = self
            .ids
            .iter()
            .map(|(name, id)| ClimateListing {
                name: name.clone(),
                id: id.clone(),
            })
            .collect();
        listings.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        listings
    }

    /// Reads the catalog cached in `cache_dir`, `None` if nothing was cached yet.
    pub(crate) async fn load(cache_dir: &Path) -> Result<Option<Self>, CatalogError> {
        let cache_file = cache_dir.join(CATALOG_FILE_NAME);
        if tokio::fs::metadata(&cache_file).await.is_err() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&cache_file)
            .await
            .map_err(|e| CatalogError::CacheRead(cache_file.clone(), e))?;
        let listings = tokio::task::spawn_blocking(move || {
            bincode::serde::decode_from_slice::<Vec<ClimateListing>, _>(&bytes, BINCODE_CONFIG)
                .map(|(listings, _)| listings)
                .map_err(|e| CatalogError::CacheDecode(cache_file, Box::new(e)))
        })
        .await??;
        info!("Loaded {} cached climate listings", listings.len());
        Ok(Some(Self::from_listings(listings)))
    }

    pub(crate) async fn save(&self, cache_dir: &Path) -> Result<(), CatalogError> {
        let cache_file = cache_dir.join(CATALOG_FILE_NAME);
        let listings = self.listings();
        let bytes = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(listings, BINCODE_CONFIG)
                .map_err(|e| CatalogError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(&cache_file, &bytes)
            .await
            .map_err(|e| CatalogError::CacheWrite(cache_file.clone(), e))?;
        info!(
            "Wrote climate catalog ({} bytes) to {}",
            bytes.len(),
            cache_file.display()
        );
        Ok(())
    }
}
