/// Annotated manifest written by `lambgo init` and shown in help output.
pub const EXAMPLE_MANIFEST: &str = r#"# Directory to use as the root for build artifacts.
# Optional, defaults to tmp.
outDirectory: tmp

# File name to use for all zipped binaries.
# Useful when using provided.al2 instead of go1.x for the Lambda runtime.
# Optional, defaults to the name of the Lambda's directory.
# zippedFileName: bootstrap

# Additional build flags passed to "go build".
# Supports shell quoting and environment variable expansion:
# $VAR, ${VAR} and ${VAR:-default}.
# buildFlags: -tags extra,tags -ldflags="-s -w"

# Override GOOS and GOARCH to cross compile for a different operating
# system or architecture. Optional, defaults to linux and amd64.
# goos: linux
# goarch: amd64

# Paths to build into Lambda zip files.
# Each path should contain a main package.
# The artifacts are built to: <outDirectory>/<buildPath>.zip
buildPaths:
  - lambdas/hello_world

# Lambdas that need their own settings.
# buildFlags replaces the default flags above; an empty string disables them.
# lambdas:
#   - path: lambdas/custom_runtime
#     buildFlags: -tags lambda.norpc
#     zippedFileName: bootstrap
"#;
