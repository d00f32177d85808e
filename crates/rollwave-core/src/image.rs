//! Image reference resolution.
//!
//! Human-supplied references come in two shapes: an already-canonical digest
//! reference (passed through verbatim) or `namespace/name:tag`, which is
//! resolved to the digest reference recorded in the remote image stream.
//! Resolution is a read-only pre-flight check; any failure aborts the run
//! before a single target is touched.

use std::fmt;

use tracing::debug;

use crate::client::ClusterClient;
use crate::error::RolloutError;

/// Substring marking a reference as already canonical.
pub const DIGEST_MARKER: &str = "@sha256:";

/// A canonical, comparable image reference. Two locators refer to the same
/// image iff their strings match exactly. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocator(String);

impl ImageLocator {
    /// Wrap a string that is already canonical. Prefer [`resolve_image`]
    /// for anything user-supplied.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve a reference string to a canonical locator.
///
/// Digest references pass through unchanged. Tag references must have the
/// shape `namespace/name:tag` and are looked up in the remote image stream.
pub async fn resolve_image(
    client: &dyn ClusterClient,
    reference: &str,
) -> Result<ImageLocator, RolloutError> {
    if reference.contains(DIGEST_MARKER) {
        return Ok(ImageLocator::new(reference));
    }

    let Some((namespace, tag)) = reference.split_once('/') else {
        return Err(RolloutError::InvalidReferenceFormat {
            reference: reference.to_string(),
        });
    };
    if !tag.contains(':') {
        return Err(RolloutError::InvalidReferenceFormat {
            reference: reference.to_string(),
        });
    }

    let digest = client
        .resolve_image_tag(namespace, tag)
        .await
        .map_err(|source| RolloutError::Resolution {
            reference: reference.to_string(),
            source,
        })?;
    debug!(%reference, %digest, "resolved image tag");
    Ok(ImageLocator::new(digest))
}
