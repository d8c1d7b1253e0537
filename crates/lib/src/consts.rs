//! Well-known names and fallback values.

/// File marking the project root. Its directory is the compiler's working directory.
pub const ROOT_MARKER_FILE: &str = "go.mod";

/// Manifest file, read from the same directory as [`ROOT_MARKER_FILE`].
pub const MANIFEST_FILE: &str = ".lambgo.yml";

/// Compiler binary invoked for every build.
pub const COMPILER: &str = "go";

pub const DEFAULT_OUT_DIRECTORY: &str = "tmp";
pub const DEFAULT_TARGET_OS: &str = "linux";
pub const DEFAULT_TARGET_ARCH: &str = "amd64";

/// Environment variables that select the compiler's target platform.
pub const TARGET_OS_ENV: &str = "GOOS";
pub const TARGET_ARCH_ENV: &str = "GOARCH";
