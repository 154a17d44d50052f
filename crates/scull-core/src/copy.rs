//! Copies across the caller boundary
//!
//! Callers hand the store an `io::Read` source or an `io::Write` sink. A
//! copy must move the whole requested range; anything short of that is a
//! [`ScullError::CopyFault`], which is distinct from running out of data.

use crate::error::{Result, ScullError};
use std::io::{self, Read, Write};

/// Move all of `src` into `dst`
pub(crate) fn copy_out<W: Write + ?Sized>(src: &[u8], dst: &mut W) -> Result<()> {
    let mut copied = 0;
    while copied < src.len() {
        match dst.write(&src[copied..]) {
            Ok(0) => {
                return Err(fault(
                    src.len(),
                    copied,
                    io::Error::new(io::ErrorKind::WriteZero, "destination accepted no bytes"),
                ))
            }
            Ok(n) => copied += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fault(src.len(), copied, e)),
        }
    }
    Ok(())
}

/// Fill all of `dst` from `src`
pub(crate) fn copy_in<R: Read + ?Sized>(src: &mut R, dst: &mut [u8]) -> Result<()> {
    let mut copied = 0;
    while copied < dst.len() {
        match src.read(&mut dst[copied..]) {
            Ok(0) => {
                return Err(fault(
                    dst.len(),
                    copied,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "source ran dry"),
                ))
            }
            Ok(n) => copied += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fault(dst.len(), copied, e)),
        }
    }
    Ok(())
}

fn fault(expected: usize, copied: usize, source: io::Error) -> ScullError {
    tracing::debug!("Copy fault after {} of {} bytes: {}", copied, expected, source);
    ScullError::CopyFault {
        expected,
        copied,
        source,
    }
}
