//! Helpers for performing IO on message oriented files
//!
//! Factotum endpoints are message oriented: one `write(2)` carries exactly one
//! request and one `read(2)` returns exactly one reply. The helpers here keep
//! that discipline while still dealing with [io::ErrorKind::Interrupted].
//!
//! ```
//! use std::io::ErrorKind as EK;
//! use factotum_util::io::{handle_interrupted, TryIoResultKindHintExt};
//!
//! let mut ctr = 0u32;
//! let mut simulate_io = || -> std::io::Result<u32> {
//!     ctr += 1;
//!     match ctr {
//!         1 | 2 => Err(std::io::Error::new(EK::Interrupted, "signal")),
//!         _ => Ok(42),
//!     }
//! };
//! assert_eq!(handle_interrupted(&mut simulate_io).unwrap(), 42);
//!
//! let res = Err::<(), _>(std::io::Error::new(EK::WouldBlock, "later")).try_io_err_kind_hint();
//! assert!(matches!(res, Err((_, Some(EK::WouldBlock)))));
//! ```

use std::{borrow::Borrow, io};

/// Generic trait for accessing [std::io::Error::kind]
pub trait IoErrorKind {
    /// Conversion to [std::io::Error::kind]
    fn io_error_kind(&self) -> io::ErrorKind;
}

impl<T: Borrow<io::Error>> IoErrorKind for T {
    fn io_error_kind(&self) -> io::ErrorKind {
        self.borrow().kind()
    }
}

/// Generic trait for accessing [std::io::Error::kind] where it may not be present
pub trait TryIoErrorKind {
    /// Conversion to [std::io::Error::kind] where it may not be present
    fn try_io_error_kind(&self) -> Option<io::ErrorKind>;
}

impl<T: IoErrorKind> TryIoErrorKind for T {
    fn try_io_error_kind(&self) -> Option<io::ErrorKind> {
        Some(self.io_error_kind())
    }
}

/// Helper for accessing [std::io::Error::kind] in Results where it may not be present
pub trait TryIoResultKindHintExt<T>: Sized {
    /// Error type including the ErrorKind hint
    type Error;
    /// Pairs the error with its [std::io::ErrorKind], if it has one
    fn try_io_err_kind_hint(self) -> Result<T, (Self::Error, Option<io::ErrorKind>)>;
}

impl<T, E: TryIoErrorKind> TryIoResultKindHintExt<T> for Result<T, E> {
    type Error = E;
    fn try_io_err_kind_hint(self) -> Result<T, (E, Option<io::ErrorKind>)> {
        self.map_err(|e| {
            let opt_kind = e.try_io_error_kind();
            (e, opt_kind)
        })
    }
}

/// Reruns an IO operation for as long as it fails with `std::io::ErrorKind::Interrupted`.
///
/// Success and all other errors are passed through.
pub fn handle_interrupted<R, E, F>(mut iofn: F) -> Result<R, E>
where
    E: TryIoErrorKind,
    F: FnMut() -> Result<R, E>,
{
    use io::ErrorKind as E;
    loop {
        match iofn().try_io_err_kind_hint() {
            Ok(v) => return Ok(v),
            Err((_, Some(E::Interrupted))) => continue, // try again
            Err((e, _)) => return Err(e),
        };
    }
}

/// [std::io::Write] extension for message oriented files
pub trait WriteMessageExt {
    /// Writes `msg` with a single write call.
    ///
    /// A short write is reported as [io::ErrorKind::WriteZero]; the remainder
    /// is never sent as a second message.
    fn write_message(&mut self, msg: &[u8]) -> io::Result<()>;
}

impl<T: io::Write> WriteMessageExt for T {
    fn write_message(&mut self, msg: &[u8]) -> io::Result<()> {
        let written = handle_interrupted(|| self.write(msg))?;
        match written == msg.len() {
            true => Ok(()),
            false => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {written} of {} bytes", msg.len()),
            )),
        }
    }
}

/// [std::io::Read] extension for message oriented files
pub trait ReadMessageExt {
    /// Reads one message into `buf` with a single read call, returning its length
    fn read_message(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: io::Read> ReadMessageExt for T {
    fn read_message(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        handle_interrupted(|| self.read(buf))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    /// Accepts at most `cap` bytes per write
    struct Narrow {
        cap: usize,
        got: Vec<u8>,
    }

    impl Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.cap);
            self.got.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write_is_an_error() {
        let mut w = Narrow {
            cap: 4,
            got: Vec::new(),
        };
        let err = w.write_message(b"start proto=p9sk1").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(w.got, b"star");

        w.got.clear();
        w.write_message(b"read").unwrap();
        assert_eq!(w.got, b"read");
    }

    #[test]
    fn read_message_reads_once() {
        let mut src: &[u8] = b"ok user pass";
        let mut buf = [0u8; 4];
        assert_eq!(src.read_message(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"ok u");
    }
}
