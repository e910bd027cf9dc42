//! Surface format detection by file name.

use std::fmt;

/// The surface encodings a decoder can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// GIFTI XML surfaces (`.gii`).
    Gifti,
    /// Mango binary surfaces (`.surf`).
    Mango,
    /// Legacy VTK polydata (`.vtk`).
    Vtk,
}

impl FormatKind {
    /// Detection order: the first kind whose predicate matches wins.
    pub const PRIORITY: [Self; 3] = [Self::Gifti, Self::Mango, Self::Vtk];

    /// File name suffix this format is recognized by.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gifti => ".gii",
            Self::Mango => ".surf",
            Self::Vtk => ".vtk",
        }
    }

    /// Whether `name` looks like a file of this format. Case-insensitive.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        name.to_ascii_lowercase().ends_with(self.extension())
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gifti => "GIFTI",
            Self::Mango => "Mango",
            Self::Vtk => "VTK",
        })
    }
}

/// Find the format of `name`, or `None` if no decoder applies.
#[must_use]
pub fn classify(name: &str) -> Option<FormatKind> {
    FormatKind::PRIORITY
        .into_iter()
        .find(|kind| kind.matches(name))
}
