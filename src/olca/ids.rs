use uuid::Uuid;

/// Deterministic object id: a name-based (v3) UUID in the OID namespace of
/// the parts, each trimmed and lower-cased, joined by `/`.
///
/// The same inputs always produce the same id, so rebuilding the archive
/// updates objects in place on import instead of duplicating them.
pub fn make_uuid<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = parts
        .into_iter()
        .map(|p| p.as_ref().trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("/");
    Uuid::new_v3(&Uuid::NAMESPACE_OID, path.as_bytes()).to_string()
}
