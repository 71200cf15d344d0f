/// File name of a grammar definition inside a grammar repository.
pub const GRAMMAR_FILE: &str = "grammar.js";

/// Dependency manifest that triggers a dependency install before compiling.
pub const DEPENDENCY_MANIFEST: &str = "package.json";

/// Directory names never searched for grammar definitions.
pub const DISCOVERY_EXCLUDES: &[&str] = &["node_modules", ".build", ".git"];

/// Name of the non-versioned alias directory next to the commit directories.
pub const LATEST_DIR: &str = "latest";

/// File name of the WebAssembly module inside an output directory.
pub const WASM_FILE: &str = "parser.wasm";

/// Prefix of every remote storage key.
pub const STORAGE_KEY_PREFIX: &str = "tree-sitter/parsers/tree-sitter-";

/// Parser generator executable.
pub const GENERATOR_TOOL: &str = "tree-sitter";

/// Environment variable carrying the parser ABI version for the generator.
pub const ABI_VERSION_ENV: &str = "TREE_SITTER_ABI_VERSION";

/// Environment variable overriding the embedded language catalog.
pub const CATALOG_ENV: &str = "PARSERS_CATALOG";
