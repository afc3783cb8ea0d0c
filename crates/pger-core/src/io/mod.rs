//! IO collaborators - side effects the publish pipeline delegates to

pub mod archive;
pub mod digest;

pub use archive::{ArchiveError, Archiver, TarGzArchiver};
pub use digest::{ContentDigest, Sha256Digester, sha256_file};
