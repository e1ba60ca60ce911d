//! Build metadata generated by the build script

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version from Cargo.toml
pub fn client_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Target triple the client was compiled for
pub fn build_target() -> &'static str {
    BUILD_TARGET
}

/// One-line description used by `pgqctl version` and `--version`
pub fn long_version() -> String {
    format!(
        "{} ({}, {}, built {})",
        client_version(),
        git_hash(),
        build_target(),
        build_time()
    )
}
