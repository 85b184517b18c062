//! Engine configuration.

/// Default peer limit per vdev.
pub const DEFAULT_MAX_PEERS_PER_VDEV: usize = 64;
/// Default vdev limit.
pub const DEFAULT_MAX_VDEVS: usize = 16;

/// Crypto engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Run cipher transforms in software. When off, keys only get the
    /// software flags their install request carries, and the engine frames
    /// headers/trailers for hardware to fill in.
    pub software_crypto: bool,
    /// Maximum peers per vdev; further `create_peer` calls fail with
    /// `OutOfMemory`
    pub max_peers_per_vdev: usize,
    /// Maximum vdevs
    pub max_vdevs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            software_crypto: true,
            max_peers_per_vdev: DEFAULT_MAX_PEERS_PER_VDEV,
            max_vdevs: DEFAULT_MAX_VDEVS,
        }
    }
}

impl EngineConfig {
    /// Hardware-offload configuration: no software transforms by default.
    pub fn offload() -> Self {
        Self { software_crypto: false, ..Self::default() }
    }
}
