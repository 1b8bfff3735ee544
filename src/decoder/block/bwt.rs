use std::mem;

use crate::error::{Error, Result};

/// Links every entry of `tt` to its successor in the original block
///
/// The low 8 bits of each entry hold the byte of the last BWT column, `counts`
/// their histogram. On return the upper 24 bits of `tt[i]` point at the entry
/// following `i`; the returned value is the start of the walk for `orig_ptr`.
pub(crate) fn link_successors(tt: &mut [u32], orig_ptr: usize, mut counts: [u32; 256]) -> u32 {
    let mut sum = 0u32;

    for count in counts.iter_mut() {
        sum += mem::replace(count, sum);
    }

    for i in 0..tt.len() {
        let b = (tt[i] & 0xff) as usize;
        tt[counts[b] as usize] |= (i as u32) << 8;
        counts[b] += 1;
    }

    tt[orig_ptr] >> 8
}

/// Invert the Burrows-Wheeler transform of `input`
///
/// `origin` is the row of the sorted rotation matrix holding the original
/// string.
///
/// ```rust
/// use archive_codecs::decoder::block::inverse_bwt;
///
/// # fn main() -> Result<(), archive_codecs::Error> {
/// assert_eq!(inverse_bwt(b"nnbaaa", 3)?, b"banana");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedHeader`] if `origin` isn't a row of the matrix
pub fn inverse_bwt(input: &[u8], origin: usize) -> Result<Vec<u8>> {
    let mut output = input.to_vec();
    inverse_bwt_in_place(&mut output, origin)?;
    Ok(output)
}

/// Same as [`inverse_bwt`], overwriting `buf` with the original string
///
/// The successor links live in a separate scratch buffer, so reading and
/// writing the same slice is safe.
pub fn inverse_bwt_in_place(buf: &mut [u8], origin: usize) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }
    if origin >= buf.len() {
        return Err(Error::MalformedHeader("bwt origin out of range"));
    }
    if buf.len() >= 1 << 24 {
        return Err(Error::UnsupportedFeature("bwt blocks of 16 MiB or more"));
    }

    let mut counts = [0u32; 256];
    let mut tt = buf
        .iter()
        .map(|&b| {
            counts[usize::from(b)] += 1;
            u32::from(b)
        })
        .collect::<Vec<_>>();

    let mut t_pos = link_successors(&mut tt, origin, counts);
    for out in buf.iter_mut() {
        t_pos = tt[t_pos as usize];
        *out = t_pos as u8;
        t_pos >>= 8;
    }

    Ok(())
}
