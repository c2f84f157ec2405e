use std::{fmt, str::FromStr};

use crate::preprocess::InputSize;

/// Face detection strategy used before emotion classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectorBackend {
    /// YuNet at 640x640.
    #[default]
    YuNet,
    /// YuNet at 320x320; faster, misses small faces.
    YuNetFast,
    /// No detection; the whole frame is treated as one face.
    Skip,
}

impl DetectorBackend {
    pub const ALL: [DetectorBackend; 3] = [Self::YuNet, Self::YuNetFast, Self::Skip];

    pub fn label(self) -> &'static str {
        match self {
            Self::YuNet => "yunet",
            Self::YuNetFast => "yunet-fast",
            Self::Skip => "skip",
        }
    }

    /// Detector input size, or `None` for [`DetectorBackend::Skip`].
    pub fn input_size(self) -> Option<InputSize> {
        match self {
            Self::YuNet => Some(InputSize::new(640, 640)),
            Self::YuNetFast => Some(InputSize::new(320, 320)),
            Self::Skip => None,
        }
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DetectorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.label() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown detector backend '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for backend in DetectorBackend::ALL {
            assert_eq!(backend.to_string().parse::<DetectorBackend>().unwrap(), backend);
        }
        assert_eq!(" YuNet ".parse::<DetectorBackend>().unwrap(), DetectorBackend::YuNet);
        assert!("opencv".parse::<DetectorBackend>().is_err());
    }

    #[test]
    fn default_backend_is_full_resolution_yunet() {
        assert_eq!(DetectorBackend::default(), DetectorBackend::YuNet);
        assert_eq!(DetectorBackend::YuNetFast.input_size(), Some(InputSize::new(320, 320)));
        assert_eq!(DetectorBackend::Skip.input_size(), None);
    }
}
