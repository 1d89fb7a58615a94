use std::io;

/// Error kinds a non-blocking socket loop retries on instead of failing
pub trait IoErrorExt {
    fn is_would_block(&self) -> bool;
    fn is_interrupted(&self) -> bool;
}

impl IoErrorExt for io::Error {
    #[inline]
    fn is_would_block(&self) -> bool {
        self.kind() == io::ErrorKind::WouldBlock
    }

    #[inline]
    fn is_interrupted(&self) -> bool {
        self.kind() == io::ErrorKind::Interrupted
    }
}
