/// Builtin language model providers
pub mod completions;
/// Builtin embedding model providers
pub mod embeddings;

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
