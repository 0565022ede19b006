use serde::{Deserialize, Serialize};

/// Which render surface a host is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    Timeline,
    Minimap,
    Pyramid,
    Filmstrip,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 4] = [
        SurfaceKind::Timeline,
        SurfaceKind::Minimap,
        SurfaceKind::Pyramid,
        SurfaceKind::Filmstrip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::Minimap => "minimap",
            Self::Pyramid => "pyramid",
            Self::Filmstrip => "filmstrip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// The next surface in display order, wrapping around.
    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
