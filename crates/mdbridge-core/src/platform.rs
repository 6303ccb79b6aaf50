//! Host platform family

/// Platform family that decides probe names and how processes are spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}
