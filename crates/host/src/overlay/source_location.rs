// Mapping live nodes back to source positions.

use sitewright_common::path::normalize_source_path;
use sitewright_common::types::SourceLocation;
use tracing::debug;

use crate::overlay::descriptor::NodeId;

/// Upper bound on the ancestor walk when a node carries no metadata of its
/// own. Deep component trees rarely exceed this before hitting a tagged
/// ancestor.
const MAX_ANCESTOR_HOPS: usize = 32;

/// Resolves a node to the source position that produced it.
pub trait SourceResolver {
    fn resolve(&self, node: NodeId) -> Option<SourceLocation>;
}

/// Tries each resolver in order; the first hit wins. Precise per-node
/// resolvers go first, ancestor-walking fallbacks last.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn SourceResolver>>,
}

impl ChainResolver {
    pub fn new(resolvers: Vec<Box<dyn SourceResolver>>) -> Self {
        Self { resolvers }
    }
}

impl SourceResolver for ChainResolver {
    fn resolve(&self, node: NodeId) -> Option<SourceLocation> {
        self.resolvers.iter().find_map(|resolver| resolver.resolve(node))
    }
}

/// Per-node debug annotations left behind by a dev-mode bundler.
pub trait DebugMetadata {
    fn location(&self, node: NodeId) -> Option<SourceLocation>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
}

/// Resolver over bundler debug metadata: the node's own annotation when
/// present, otherwise the nearest annotated ancestor.
pub struct MetadataWalkResolver<M: DebugMetadata> {
    metadata: M,
}

impl<M: DebugMetadata> MetadataWalkResolver<M> {
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }
}

impl<M: DebugMetadata> SourceResolver for MetadataWalkResolver<M> {
    fn resolve(&self, node: NodeId) -> Option<SourceLocation> {
        let mut current = Some(node);
        for _ in 0..=MAX_ANCESTOR_HOPS {
            let id = current?;
            if let Some(location) = self.metadata.location(id) {
                if let Some(normalized) = normalize(location) {
                    return Some(normalized);
                }
                // An unusable path on this node does not end the walk.
            }
            current = self.metadata.parent(id);
        }
        None
    }
}

/// Normalize the annotated path into a project-relative one; annotations
/// pointing outside the project are discarded.
fn normalize(location: SourceLocation) -> Option<SourceLocation> {
    match normalize_source_path(&location.file_path) {
        Ok(file_path) => Some(SourceLocation { file_path, ..location }),
        Err(error) => {
            debug!(path = %location.file_path, %error, "discarding unusable source annotation");
            None
        }
    }
}
