pub mod atom;
pub mod hints;
pub mod patterns;
pub mod registry;
pub mod similarity;

pub use atom::{AtomKey, CitationAtom, extract_atoms, normalize_author_token, parse_citation_atom};
pub use hints::{TitleHints, mine_title_hints};
pub use patterns::{PatternKind, PatternTable};
pub use registry::{HINT_ACCEPT_SIMILARITY, Registry, RegistryEntry, candidates,
	select_trusted_title};
pub use similarity::title_similarity;
