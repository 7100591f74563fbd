/// Identifies one in-flight texture fetch.
///
/// Small and copyable so it can travel through an async task and come back
/// to the cache on completion without borrowing it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Request(pub u64);
