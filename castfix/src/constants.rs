use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the project configuration file.
pub const CONFIG_FILENAME: &str = ".castfix.toml";

/// File extensions treated as C++ sources when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h"];

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert(".git");
        s.insert(".cache");
        s.insert("build");
        s.insert("cmake-build-debug");
        s.insert("cmake-build-release");
        s.insert("out");
        s.insert("third_party");
        s.insert("vendor");
        s.insert("node_modules");
        s.insert("target");
        s
    })
}

pub use get_default_exclude_folders as DEFAULT_EXCLUDE_FOLDERS;
