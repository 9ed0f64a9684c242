use std::io::{self, Read};

/// Upper bound on up-front allocation for a pull.
const MAX_RESERVE: usize = 64 * 1024;

/// Presents a bit-shifted region of a byte source as byte-aligned bytes.
///
/// DEFLATE packs bits starting from the least significant bit of each byte,
/// so output byte `i` takes the top `8 - shift` bits of input byte `i` as its
/// low bits and the bottom `shift` bits of input byte `i + 1` as its high bits.
/// Only one carried byte is kept between steps. The realigner cannot seek;
/// build a new one to start elsewhere.
///
/// # Example
///
/// ```rust
/// use seekflate::process::realign::BitRealigner;
///
/// let source: &[u8] = &[0b1010_1111, 0b0000_0101, 0xFF];
/// let mut realigner = BitRealigner::new(source, 4)?;
///
/// assert_eq!(realigner.pull(2)?, vec![0b0101_1010, 0b1111_0000]);
/// assert!(realigner.next_byte()?.is_none());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct BitRealigner<R> {
    inner: R,
    shift: u32,
    carry: Option<u8>,
    consumed: u64,
}

impl<R: Read> BitRealigner<R> {
    /// Starts realigning at bit `shift` of the next byte `inner` yields.
    pub fn new(inner: R, shift: u8) -> io::Result<Self> {
        if shift >= 8 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bit shift must be below 8, got {shift}"),
            ));
        }

        Ok(Self {
            inner,
            shift: shift as u32,
            carry: None,
            consumed: 0,
        })
    }

    pub fn shift(&self) -> u8 {
        self.shift as u8
    }

    /// Source bytes read so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Produces the next aligned byte, or `None` once the source cannot
    /// supply the bits for a whole byte.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        // Unshifted input passes through without a look-ahead byte.
        if self.shift == 0 {
            return self.read_source();
        }

        let carry = match self.carry {
            Some(carry) => carry,
            None => match self.read_source()? {
                Some(first) => first >> self.shift,
                None => return Ok(None),
            },
        };

        let Some(next) = self.read_source()? else {
            self.carry = Some(carry);
            return Ok(None);
        };

        self.carry = Some(next >> self.shift);
        Ok(Some(carry | (next << (8 - self.shift))))
    }

    /// Pulls exactly `count` aligned bytes, failing with
    /// [`io::ErrorKind::UnexpectedEof`] if the source runs out first.
    pub fn pull(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let out = self.pull_up_to(count)?;

        if out.len() < count {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "source ended after {} of {count} realigned bytes",
                    out.len()
                ),
            ));
        }

        Ok(out)
    }

    /// Pulls at most `count` aligned bytes, stopping early at source end.
    pub fn pull_up_to(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(count.min(MAX_RESERVE));

        while out.len() < count {
            match self.next_byte()? {
                Some(byte) => out.push(byte),
                None => break,
            }
        }

        Ok(out)
    }

    /// Like [`pull_up_to`](Self::pull_up_to), but once the source ends the
    /// `8 - shift` bits still carried are emitted as one last byte with zero
    /// high bits.
    pub fn pull_padded(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut out = self.pull_up_to(count)?;

        if out.len() < count {
            if let Some(carry) = self.carry.take() {
                out.push(carry);
            }
        }

        Ok(out)
    }

    fn read_source(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];

        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.consumed += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Iterator for BitRealigner<R> {
    type Item = io::Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_byte().transpose()
    }
}
