/// Print build provenance as a small JSON object.
pub fn print_report(name: &str) {
    println!("{{");
    println!("  \"name\": \"{}\",", name);
    println!("  \"version\": \"{}\",", env!("CARGO_PKG_VERSION"));
    println!("  \"git_describe\": \"{}\",", env!("GIT_DESCRIBE"));
    println!("  \"git_hash\": \"{}\"", env!("GIT_HASH"));
    println!("}}");
}

/// One line summary used in run logs.
pub fn summary() -> String {
    format!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("GIT_DESCRIBE")
    )
}
