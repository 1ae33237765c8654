#[derive(Debug)]
pub enum Error {
    Internal(String),
    NoFreeFrames,
    DirectoryFull,
    EntryExists,
    EntryNotFound,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Internal(context) => write!(f, "Internal Error: {context}."),
            Error::NoFreeFrames => write!(f, "All frames are pinned, nothing to evict."),
            Error::DirectoryFull => write!(f, "Hash directory is at maximum depth."),
            Error::EntryExists => write!(f, "Entry already exists"),
            Error::EntryNotFound => write!(f, "Entry not found"),
        }
    }
}
