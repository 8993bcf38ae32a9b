/// Map a code fence language tag to the file extension the code renderer expects.
///
/// Lookup is case-insensitive. Unknown or empty tags map to `""`; they are never an error.
pub fn extension_for_language(language: &str) -> &'static str {
    match language.trim().to_ascii_lowercase().as_str() {
        "javascript" => ".js",
        "python" => ".py",
        "java" => ".java",
        "c" => ".c",
        "cpp" => ".cpp",
        "csharp" | "c#" => ".cs",
        "go" => ".go",
        "ruby" => ".rb",
        "php" => ".php",
        "swift" => ".swift",
        "kotlin" => ".kt",
        "scala" => ".scala",
        "rust" => ".rs",
        "haskell" => ".hs",
        "dart" => ".dart",
        "typescript" => ".ts",
        "lua" => ".lua",
        "perl" => ".pl",
        "r" => ".r",
        _ => "",
    }
}
