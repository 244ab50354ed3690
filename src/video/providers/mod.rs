//! Video generation providers.

#[cfg(feature = "veo")]
mod veo;

#[cfg(feature = "veo")]
pub use veo::{
    HttpAssetFetcher, VeoModel, VeoService, VeoServiceBuilder, BASE_URL_ENV, DEFAULT_BASE_URL,
};
